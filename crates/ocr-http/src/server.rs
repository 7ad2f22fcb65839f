//! The transport: a raw `hyper` 1.x server. No router crate — there are
//! three fixed routes, matched by hand in [`route`].

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::config::ServerConfig;
use crate::handlers::{self, AppState};

async fn read_body(req: Request<Incoming>) -> Result<Bytes, Infallible> {
    Ok(req
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default())
}

async fn route(
    state: Arc<AppState>,
    req: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let body = read_body(req).await?;

    let json = match (method, path.as_str()) {
        (Method::POST, "/image-sync") => handlers::handle_image_sync(&state, body).await,
        (Method::POST, "/image") => handlers::handle_image_submit(&state, body).await,
        (Method::GET, "/image") => handlers::handle_image_get(&state, body).await,
        _ => handlers::not_found(),
    };

    let status = StatusCode::from_u16(json.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let payload = serde_json::to_vec(&json.body).unwrap_or_default();

    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(payload)))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::new()))))
}

/// Accept connections until the process is killed, spawning one task per
/// connection — the same shape as every other `hyper`-direct server in
/// this stack.
pub async fn run(config: ServerConfig, state: Arc<AppState>) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let state = state.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| route(state.clone(), req));
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                tracing::debug!(%peer_addr, error = %err, "connection closed with error");
            }
        });
    }
}
