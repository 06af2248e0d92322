//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router around a [`MockResponder`]
//! - Dispatch the two upload paths to the registry (raw body or multipart file)
//! - Send every other request, whatever its method, to canned response resolution
//! - Serve with graceful shutdown on Ctrl+C

use axum::{
    extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

use crate::error::CannedError;
use crate::responder::MockResponder;

/// Build the router with all middleware layers.
pub fn build_router(responder: Arc<MockResponder>) -> Router {
    let body_limit = responder.settings().max_upload_bytes;
    Router::new()
        .fallback(dispatch)
        .with_state(responder)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

/// HTTP server for the canned responder.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(responder: Arc<MockResponder>) -> Self {
        Self {
            router: build_router(responder),
        }
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

/// Route a request to an upload or to response resolution.
async fn dispatch(State(responder): State<Arc<MockResponder>>, request: Request) -> Response {
    let path = decode_path(request.uri().path());
    let settings = responder.settings();

    let result = if path == settings.upload_path {
        upload_body(&responder, request).await
    } else if path == settings.upload_file_path {
        upload_file(&responder, request).await
    } else {
        let method = request.method().as_str().to_string();
        responder.respond(&method, &path).await
    };

    result.unwrap_or_else(IntoResponse::into_response)
}

/// Percent-decode a request path, keeping it raw when it is not valid UTF-8.
fn decode_path(raw: &str) -> String {
    match urlencoding::decode(raw) {
        Ok(decoded) => decoded.into_owned(),
        Err(err) => {
            debug!(path = %raw, error = %err, "Request path is not UTF-8 once decoded");
            raw.to_string()
        }
    }
}

async fn upload_body(
    responder: &MockResponder,
    request: Request,
) -> Result<Response, CannedError> {
    let limit = responder.settings().max_upload_bytes;
    let payload = axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(|e| CannedError::UploadTransport(e.to_string()))?;

    responder.upload(&payload).await?;
    Ok(StatusCode::OK.into_response())
}

async fn upload_file(
    responder: &MockResponder,
    request: Request,
) -> Result<Response, CannedError> {
    let field_name = responder.settings().upload_field.as_str();
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| CannedError::UploadTransport(e.body_text()))?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| CannedError::UploadTransport(e.body_text()))?
    {
        if field.name() != Some(field_name) {
            debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }
        let payload = field
            .bytes()
            .await
            .map_err(|e| CannedError::UploadTransport(e.body_text()))?;

        responder.upload(&payload).await?;
        return Ok(StatusCode::OK.into_response());
    }

    Err(CannedError::UploadTransport(format!(
        "missing multipart field {:?}",
        field_name
    )))
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    }
}
