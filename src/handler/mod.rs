use std::convert::Infallible;
use std::sync::Arc;

use anyhow::Error;
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http_body_util::Full;
use hyper::body::Body;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{error, info};

use crate::config::Env;
use crate::graphql::AppSchema;
use crate::models::health::{ErrorResponse, HealthStatus};

pub mod cors;
pub mod graphql;

pub type HttpResponse = Response<Full<Bytes>>;

pub struct AppState {
    pub schema: AppSchema,
    pub env: Env,
}

impl AppState {
    pub fn new(schema: AppSchema, env: Env) -> Self {
        AppState { schema, env }
    }
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let bytes = match serde_json::to_vec(body) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            return text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    };
    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    response
}

pub fn text_response(status: StatusCode, body: &'static str) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    response
}

fn not_found() -> HttpResponse {
    json_response(StatusCode::NOT_FOUND, &ErrorResponse::new("Not Found", None))
}

fn health(env: &Env) -> HttpResponse {
    json_response(StatusCode::OK, &HealthStatus::ok(&env.environment))
}

/// Entry point for every HTTP request. Never fails: route errors turn into
/// a 500 body.
pub async fn handle<B>(req: Request<B>, state: Arc<AppState>) -> Result<HttpResponse, Infallible>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    info!("Received request: {} {}", req.method(), req.uri().path());
    let origin = req.headers().get(header::ORIGIN).cloned();

    let response = match route(req, &state).await {
        Ok(response) => response,
        Err(e) => {
            error!("Error handling request: {:?}", e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse::new("Internal Server Error", Some(e.to_string())),
            )
        }
    };
    Ok(cors::with_cors(response, origin.as_ref()))
}

async fn route<B>(req: Request<B>, state: &AppState) -> Result<HttpResponse, Error>
where
    B: Body,
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    match (&method, path.as_str()) {
        (&Method::GET, "/health") => Ok(health(&state.env)),
        (&Method::OPTIONS, _) => Ok(cors::preflight(req.headers())),
        (_, graphql::GRAPHQL_PATH) => graphql::serve(req, state).await,
        _ => Ok(not_found()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::stub::{client, StubUpstream};
    use crate::graphql::build_schema;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};

    fn test_state(url: &str) -> Arc<AppState> {
        let env = Env {
            deepseek_api_key: "ds-key".to_string(),
            openai_api_key: "oa-key".to_string(),
            environment: "test".to_string(),
            deepseek_base_url: url.to_string(),
            openai_base_url: url.to_string(),
        };
        Arc::new(AppState::new(build_schema(client()), env))
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    async fn body_json(response: HttpResponse) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_bypasses_graphql() {
        let state = test_state("http://127.0.0.1:9/chat/completions");

        let response = handle(request(Method::GET, "/health", ""), state).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["environment"], "test");
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_openai_query_end_to_end() {
        let upstream = StubUpstream::start(
            200,
            &json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": "hello"}, "finish_reason": "stop"}],
                "usage": {"prompt_tokens": 1, "completion_tokens": 1, "total_tokens": 2}
            })
            .to_string(),
        )
        .await;
        let state = test_state(&upstream.url);
        let body = json!({
            "query": "{ openaiResponse(input: \"hi\") { choices { message { content } } } }"
        });

        let response = handle(request(Method::POST, "/graphql", &body.to_string()), state)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"data": {"openaiResponse": {"choices": [{"message": {"content": "hello"}}]}}})
        );
    }

    #[tokio::test]
    async fn test_get_query_string() {
        let upstream = StubUpstream::start(401, "nope").await;
        let state = test_state(&upstream.url);
        let uri = "/graphql?query=%7B%20deepseekChat(messages%3A%20%5B%5D)%20%7B%20error%20%7D%20%7D";

        let response = handle(request(Method::GET, uri, ""), state).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"data": {"deepseekChat": {"error": "DeepSeek API Error: 401 - nope"}}})
        );
    }

    #[tokio::test]
    async fn test_batch_post() {
        let upstream = StubUpstream::start(500, "down").await;
        let state = test_state(&upstream.url);
        let body = json!([
            {"query": "{ openaiResponse(input: \"a\") { error } }"},
            {"query": "{ openaiResponse(input: \"b\") { error } }"}
        ]);

        let response = handle(request(Method::POST, "/graphql", &body.to_string()), state)
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[1]["data"]["openaiResponse"]["error"], "OpenAI API Error: 500 - down");
        assert_eq!(upstream.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_query_is_graphql_error() {
        let state = test_state("http://127.0.0.1:9/chat/completions");
        let body = json!({"query": "{ openaiResponse { id } "});

        let response = handle(request(Method::POST, "/graphql", &body.to_string()), state)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(!body["errors"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let state = test_state("http://127.0.0.1:9/chat/completions");

        let response = handle(request(Method::POST, "/graphql", "{not json"), state)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["errors"][0]["message"].is_string());
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let upstream = StubUpstream::start(200, "{}").await;
        let state = test_state(&upstream.url);
        let padding = " ".repeat(graphql::MAX_BODY_BYTES);
        let body = format!(r#"{{"query": "{{ openaiResponse(input: \"hi\") {{ error }} }}"}}{}"#, padding);

        let response = handle(request(Method::POST, "/graphql", &body), state)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        let body = body_json(response).await;
        assert_eq!(body["errors"][0]["message"], "Request body too large");
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn test_graphiql_for_browsers() {
        let state = test_state("http://127.0.0.1:9/chat/completions");
        let req = Request::builder()
            .method(Method::GET)
            .uri("/graphql")
            .header(header::ACCEPT, "text/html,application/xhtml+xml")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = handle(req, state).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert!(String::from_utf8_lossy(&bytes).contains("graphiql"));
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let state = test_state("http://127.0.0.1:9/chat/completions");

        let response = handle(request(Method::GET, "/nope", ""), state.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle(request(Method::POST, "/health", ""), state.clone()).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = handle(request(Method::DELETE, "/graphql", ""), state).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let state = test_state("http://127.0.0.1:9/chat/completions");
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/graphql")
            .header(header::ORIGIN, "https://app.example.com")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Full::new(Bytes::new()))
            .unwrap();

        let response = handle(req, state.clone()).await.unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");

        let response = handle(request(Method::GET, "/health", ""), state).await.unwrap();
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
