//! Request handling on top of the registry.
//!
//! Resolves requests to canned responses, renders them (headers, simulated
//! latency, status and body) and keeps request counters.

use crate::config::{CannedResponse, GlobalSettings};
use crate::error::CannedError;
use crate::registry::Registry;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Serves canned responses from a shared registry.
pub struct MockResponder {
    registry: Arc<Registry>,
    settings: GlobalSettings,
    /// Total requests resolved.
    requests_total: AtomicU64,
    /// Requests answered with a canned response.
    requests_matched: AtomicU64,
    /// Requests with no canned response.
    requests_unmatched: AtomicU64,
    uploads_accepted: AtomicU64,
    uploads_rejected: AtomicU64,
}

impl MockResponder {
    /// Create a responder serving from the given registry.
    pub fn new(registry: Arc<Registry>, settings: GlobalSettings) -> Self {
        Self {
            registry,
            settings,
            requests_total: AtomicU64::new(0),
            requests_matched: AtomicU64::new(0),
            requests_unmatched: AtomicU64::new(0),
            uploads_accepted: AtomicU64::new(0),
            uploads_rejected: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn settings(&self) -> &GlobalSettings {
        &self.settings
    }

    /// Get total requests processed.
    pub fn total_requests(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    /// Get total requests matched.
    pub fn total_matched(&self) -> u64 {
        self.requests_matched.load(Ordering::Relaxed)
    }

    /// Get total requests unmatched.
    pub fn total_unmatched(&self) -> u64 {
        self.requests_unmatched.load(Ordering::Relaxed)
    }

    pub fn total_uploads_accepted(&self) -> u64 {
        self.uploads_accepted.load(Ordering::Relaxed)
    }

    pub fn total_uploads_rejected(&self) -> u64 {
        self.uploads_rejected.load(Ordering::Relaxed)
    }

    /// Log request and upload counters.
    pub async fn log_summary(&self) {
        let responses = self.registry.len().await;
        info!(
            requests = self.total_requests(),
            matched = self.total_matched(),
            unmatched = self.total_unmatched(),
            uploads_accepted = self.total_uploads_accepted(),
            uploads_rejected = self.total_uploads_rejected(),
            responses,
            "Canned responder summary"
        );
    }

    /// Store an uploaded JSON payload.
    pub async fn upload(&self, payload: &[u8]) -> Result<(), CannedError> {
        match self.registry.store(payload).await {
            Ok(()) => {
                self.uploads_accepted.fetch_add(1, Ordering::Relaxed);
                let total = self.registry.len().await;
                info!(bytes = payload.len(), total, "Canned responses uploaded");
                Ok(())
            }
            Err(err) => {
                self.uploads_rejected.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "Rejected canned responses upload");
                Err(err)
            }
        }
    }

    /// Answer a request with its canned response.
    pub async fn respond(&self, method: &str, path: &str) -> Result<Response, CannedError> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);

        match self.registry.resolve_with_kind(method, path).await {
            Some((response, kind)) => {
                self.requests_matched.fetch_add(1, Ordering::Relaxed);
                if self.settings.log_matches {
                    info!(
                        method = %method,
                        path = %path,
                        endpoint = %response.endpoint,
                        kind = ?kind,
                        code = %response.code,
                        "Request matched canned response"
                    );
                }
                render(response).await
            }
            None => {
                self.requests_unmatched.fetch_add(1, Ordering::Relaxed);
                if self.settings.log_unmatched {
                    warn!(method = %method, path = %path, "No canned response found");
                }
                Err(CannedError::NotFound {
                    method: method.to_string(),
                    path: path.to_string(),
                })
            }
        }
    }
}

/// Render a canned response, sleeping first when it carries a timeout.
pub async fn render(response: CannedResponse) -> Result<Response, CannedError> {
    let headers = response_headers(&response);

    if let Some(delay) = response.delay()?.filter(|d| !d.is_zero()) {
        info!(
            endpoint = %response.endpoint,
            delay_secs = delay.as_secs(),
            "Waiting before responding"
        );
        tokio::time::sleep(delay).await;
    }

    let status = response.status_code()?;
    let mut rendered = (status, response.body).into_response();
    rendered.headers_mut().extend(headers);
    Ok(rendered)
}

fn response_headers(response: &CannedResponse) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(response.headers.len());
    for (name, value) in &response.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => {
                warn!(
                    endpoint = %response.endpoint,
                    header = %name,
                    "Skipping invalid response header"
                );
            }
        }
    }
    debug!(count = headers.len(), "Applied response headers");
    headers
}
