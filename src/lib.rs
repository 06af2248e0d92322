//! Canned Responder
//!
//! A configurable mock HTTP responder for integration tests. Clients upload
//! canned responses keyed by endpoint and method, and the server replays them
//! on matching requests.
//!
//! # Features
//!
//! - **Upserts**: Re-uploading an (endpoint, method, regex) triple replaces it in place
//! - **Ordered Matching**: First registered response wins; literal endpoint
//!   and method equality, or an unanchored regex on the path
//! - **Latency Simulation**: Per-response delay in whole seconds
//! - **Uploads**: Raw JSON body or multipart file upload, plus a startup file
//!
//! # Example Upload
//!
//! ```json
//! {
//!   "responses": [
//!     {
//!       "endpoint": "/dummy/ep1",
//!       "regex": "/dummy/ep[0-9]+",
//!       "method": "GET",
//!       "code": "200",
//!       "body": "hello",
//!       "headers": {"Content-Type": "text/plain"},
//!       "timeout": "3"
//!     }
//!   ]
//! }
//! ```

pub mod config;
pub mod error;
pub mod matcher;
pub mod registry;
pub mod responder;
pub mod server;

pub use config::{CannedResponse, ServerConfig};
pub use error::CannedError;
pub use registry::Registry;
pub use responder::MockResponder;
pub use server::HttpServer;
