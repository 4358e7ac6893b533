use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Error};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use reqwest::Client;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::{get_host, get_port, Env};
use crate::graphql::build_schema;
use crate::handler::{graphql::GRAPHQL_PATH, handle, AppState};

pub async fn start_server(state: Arc<AppState>) -> Result<(), Error> {
    let host = get_host();
    let port = get_port();
    let listener = TcpListener::bind((host.as_str(), port))
        .await
        .with_context(|| format!("could not bind {}:{}", host, port))?;
    let addr: SocketAddr = listener.local_addr()?;
    info!("Listening on http://{}{}", addr, GRAPHQL_PATH);
    serve(listener, state).await
}

/// Accept loop. A failed accept is logged and skipped; only the listener
/// going away ends the server.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<(), Error> {
    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Error accepting connection: {}", e);
                continue;
            }
        };
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::task::spawn(async move {
            if let Err(err) = http1::Builder::new()
                .serve_connection(io, service_fn(move |req| handle(req, state.clone())))
                .await
            {
                error!("Error serving connection: {:?}", err);
            }
        });
    }
}

pub async fn run() -> Result<(), Error> {
    let env = Env::load()?;
    info!("Environment: {}", env.environment);
    let schema = build_schema(Client::new());
    start_server(Arc::new(AppState::new(schema, env))).await
}
