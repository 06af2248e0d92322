//! Ordered, lock-protected store of canned responses.
//!
//! At most one entry exists per (endpoint, method, pattern) triple. Uploading
//! a known triple replaces its code, body, headers and timeout in place;
//! a new triple is appended. Order decides which entry answers a request.

use crate::config::{CannedResponse, ResponseBatch};
use crate::error::CannedError;
use crate::matcher::{find_match, CompiledResponse, MatchKind};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

/// Outcome of upserting a single response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Appended,
    /// Number of existing entries overwritten.
    Updated(usize),
}

/// Registry of canned responses.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<Vec<CompiledResponse>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a JSON batch and upsert its responses in order.
    ///
    /// Records are validated and applied one at a time: the first invalid
    /// record aborts the batch, and records before it stay applied.
    pub async fn store(&self, payload: &[u8]) -> Result<(), CannedError> {
        let batch = ResponseBatch::from_slice(payload)?;

        let mut entries = self.entries.write().await;
        for response in batch.responses {
            let compiled = CompiledResponse::compile(response)?;
            let outcome = upsert(&mut entries, compiled);
            debug!(outcome = ?outcome, total = entries.len(), "Stored canned response");
        }
        Ok(())
    }

    /// Read a responses file and store its contents.
    pub async fn store_file(&self, path: &Path) -> Result<(), CannedError> {
        let payload = tokio::fs::read(path)
            .await
            .map_err(|source| CannedError::ResponsesFile {
                path: path.to_path_buf(),
                source,
            })?;
        self.store(&payload).await
    }

    /// Find the response for a request.
    ///
    /// Returns a copy so the lock is released before the caller renders it.
    pub async fn resolve(&self, method: &str, path: &str) -> Option<CannedResponse> {
        self.resolve_with_kind(method, path)
            .await
            .map(|(response, _)| response)
    }

    pub(crate) async fn resolve_with_kind(
        &self,
        method: &str,
        path: &str,
    ) -> Option<(CannedResponse, MatchKind)> {
        let entries = self.entries.read().await;
        find_match(&entries, method, path).map(|result| {
            debug!(
                index = result.index,
                kind = ?result.kind,
                endpoint = %result.entry.response.endpoint,
                "Resolved canned response"
            );
            (result.entry.response.clone(), result.kind)
        })
    }

    /// Number of stored responses.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Copy of all stored responses, in matching order.
    pub async fn snapshot(&self) -> Vec<CannedResponse> {
        self.entries
            .read()
            .await
            .iter()
            .map(|entry| entry.response.clone())
            .collect()
    }
}

fn upsert(entries: &mut Vec<CompiledResponse>, incoming: CompiledResponse) -> Upsert {
    let key = incoming.response.key();
    let mut updated = 0;
    for entry in entries.iter_mut() {
        if entry.response.key() == key {
            entry.response.replace_with(&incoming.response);
            updated += 1;
        }
    }
    if updated > 0 {
        Upsert::Updated(updated)
    } else {
        entries.push(incoming);
        Upsert::Appended
    }
}
