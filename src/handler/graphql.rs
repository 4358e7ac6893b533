use anyhow::Error;
use async_graphql::http::{parse_query_string, GraphiQLSource};
use async_graphql::{BatchRequest, Request as GraphQlRequest};
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde_json::json;
use tracing::{debug, warn};

use super::{json_response, AppState, HttpResponse};
use crate::graphql::TraceId;

pub const GRAPHQL_PATH: &str = "/graphql";

/// Largest POST body accepted on the GraphQL endpoint.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// GraphQL over HTTP: JSON POST (single or batched), GET with query-string
/// parameters, and GraphiQL for browsers.
pub async fn serve<B>(req: Request<B>, state: &AppState) -> Result<HttpResponse, Error>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let method = req.method().clone();
    match method {
        Method::GET => {
            let query = req.uri().query().unwrap_or("");
            if !has_query_param(query) && accepts_html(&req) {
                return Ok(graphiql());
            }
            match parse_query_string(query) {
                Ok(request) => Ok(execute(state, BatchRequest::Single(request)).await),
                Err(e) => Ok(bad_request(&e.to_string())),
            }
        }
        Method::POST => {
            let whole_body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                    warn!("Rejected GraphQL request: body over {} bytes", MAX_BODY_BYTES);
                    return Ok(json_response(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        &json!({ "errors": [{ "message": "Request body too large" }] }),
                    ));
                }
                Err(e) => return Err(anyhow::anyhow!(e)),
            };
            match serde_json::from_slice::<BatchRequest>(&whole_body) {
                Ok(batch) => Ok(execute(state, batch).await),
                Err(e) => Ok(bad_request(&format!("Invalid GraphQL request body: {}", e))),
            }
        }
        _ => {
            let mut response = json_response(
                StatusCode::METHOD_NOT_ALLOWED,
                &json!({ "errors": [{ "message": "GraphQL only supports GET and POST requests" }] }),
            );
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static("GET, POST, OPTIONS"));
            Ok(response)
        }
    }
}

fn with_context(request: GraphQlRequest, state: &AppState) -> GraphQlRequest {
    let trace_id = TraceId::new();
    debug!("[{}] operation={:?}", trace_id.0, request.operation_name);
    request.data(state.env.clone()).data(trace_id)
}

async fn execute(state: &AppState, batch: BatchRequest) -> HttpResponse {
    let batch = match batch {
        BatchRequest::Single(request) => BatchRequest::Single(with_context(request, state)),
        BatchRequest::Batch(requests) => BatchRequest::Batch(
            requests
                .into_iter()
                .map(|request| with_context(request, state))
                .collect(),
        ),
    };
    let response = state.schema.execute_batch(batch).await;
    json_response(StatusCode::OK, &response)
}

fn bad_request(message: &str) -> HttpResponse {
    warn!("Rejected GraphQL request: {}", message);
    json_response(
        StatusCode::BAD_REQUEST,
        &json!({ "errors": [{ "message": message }] }),
    )
}

fn has_query_param(query: &str) -> bool {
    url::form_urlencoded::parse(query.as_bytes()).any(|(key, _)| key == "query")
}

fn accepts_html<B>(req: &Request<B>) -> bool {
    req.headers()
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map_or(false, |accept| accept.contains("text/html"))
}

fn graphiql() -> HttpResponse {
    let page = GraphiQLSource::build()
        .endpoint(GRAPHQL_PATH)
        .title("llmgql")
        .finish();
    let mut response = Response::new(Full::new(Bytes::from(page)));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_query_param() {
        assert!(has_query_param("query=%7B__typename%7D"));
        assert!(has_query_param("operationName=x&query=y"));
        assert!(!has_query_param(""));
        assert!(!has_query_param("queryx=1"));
    }
}
