//! Configuration for the canned responder.
//!
//! Defines the server settings and the upload payload carrying canned responses.

use crate::error::CannedError;
use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for the responder process.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Responses file loaded once before accepting requests
    #[serde(default)]
    pub responses_file: Option<PathBuf>,

    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,
}

fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8888))
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            responses_file: None,
            settings: GlobalSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.settings.validate()
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Log all matched responses
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log unmatched requests
    #[serde(default = "default_true")]
    pub log_unmatched: bool,

    /// Path accepting a raw JSON upload body
    #[serde(default = "default_upload_path")]
    pub upload_path: String,

    /// Path accepting a multipart file upload
    #[serde(default = "default_upload_file_path")]
    pub upload_file_path: String,

    /// Multipart field holding the uploaded file
    #[serde(default = "default_upload_field")]
    pub upload_field: String,

    /// Body limit for both upload paths
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

fn default_true() -> bool {
    true
}

fn default_upload_path() -> String {
    "/canned/upload".to_string()
}

fn default_upload_file_path() -> String {
    "/canned/upload/file".to_string()
}

fn default_upload_field() -> String {
    "responses".to_string()
}

fn default_max_upload_bytes() -> usize {
    2 * 1024 * 1024
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
            upload_path: default_upload_path(),
            upload_file_path: default_upload_file_path(),
            upload_field: default_upload_field(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl GlobalSettings {
    /// Validate the settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        for path in [&self.upload_path, &self.upload_file_path] {
            if !path.starts_with('/') {
                anyhow::bail!("Upload path must start with '/': {:?}", path);
            }
        }
        if self.upload_path == self.upload_file_path {
            anyhow::bail!("Upload paths must differ, both are {:?}", self.upload_path);
        }
        if self.upload_field.is_empty() {
            anyhow::bail!("Upload field cannot be empty");
        }
        if self.max_upload_bytes == 0 {
            anyhow::bail!("max_upload_bytes must be greater than zero");
        }
        Ok(())
    }
}

/// Upload payload: a batch of canned responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseBatch {
    #[serde(default, deserialize_with = "null_as_default")]
    pub responses: Vec<CannedResponse>,
}

impl ResponseBatch {
    /// Decode a batch from raw JSON bytes.
    pub fn from_slice(payload: &[u8]) -> Result<Self, CannedError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

/// A single canned response.
///
/// Numeric fields are carried as strings, exactly as they are uploaded, and
/// parsed on demand by [`CannedResponse::status_code`] and
/// [`CannedResponse::delay`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CannedResponse {
    /// Literal request path
    #[serde(default, deserialize_with = "null_as_default")]
    pub endpoint: String,

    /// Regular expression matched against the request path
    #[serde(
        default,
        rename = "regex",
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub pattern: String,

    /// Request method, compared case-sensitively
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,

    /// Response status code
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,

    /// Delay in whole seconds before the body is sent
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub timeout: String,
}

/// Decode JSON `null` as the type's empty value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity of a canned response within the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseKey<'a> {
    pub endpoint: &'a str,
    pub method: &'a str,
    pub pattern: &'a str,
}

impl CannedResponse {
    /// Validate the fields checked before a response is stored.
    ///
    /// Checks run in a fixed order and stop at the first violation.
    pub fn validate(&self) -> Result<(), CannedError> {
        self.status_code()?;
        if self.endpoint.is_empty() {
            return Err(CannedError::MissingEndpoint);
        }
        if self.method.is_empty() {
            return Err(CannedError::MissingMethod);
        }
        self.delay()?;
        Ok(())
    }

    /// Parse the status code.
    pub fn status_code(&self) -> Result<StatusCode, CannedError> {
        let invalid = || CannedError::InvalidStatusCode {
            code: self.code.clone(),
        };
        let code: u16 = self.code.parse().map_err(|_| invalid())?;
        StatusCode::from_u16(code).map_err(|_| invalid())
    }

    /// Parse the delay, `None` when no timeout is set.
    pub fn delay(&self) -> Result<Option<Duration>, CannedError> {
        if self.timeout.is_empty() {
            return Ok(None);
        }
        let secs: u64 = self
            .timeout
            .parse()
            .map_err(|_| CannedError::InvalidDelay {
                timeout: self.timeout.clone(),
            })?;
        Ok(Some(Duration::from_secs(secs)))
    }

    /// Compile the path pattern, `None` when no pattern is set.
    pub fn compile_pattern(&self) -> Result<Option<Regex>, CannedError> {
        if self.pattern.is_empty() {
            return Ok(None);
        }
        Regex::new(&self.pattern)
            .map(Some)
            .map_err(|source| CannedError::InvalidPattern {
                pattern: self.pattern.clone(),
                source,
            })
    }

    /// The (endpoint, method, pattern) triple used for upserts.
    pub fn key(&self) -> ResponseKey<'_> {
        ResponseKey {
            endpoint: &self.endpoint,
            method: &self.method,
            pattern: &self.pattern,
        }
    }

    /// Overwrite the replaceable fields with those of `other`.
    pub fn replace_with(&mut self, other: &CannedResponse) {
        self.code.clone_from(&other.code);
        self.body.clone_from(&other.body);
        self.headers.clone_from(&other.headers);
        self.timeout.clone_from(&other.timeout);
    }
}
