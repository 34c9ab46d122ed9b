//! # Attache HTTP Client
//!
//! A thin HTTP client for sending file uploads to remote endpoints.
//!
//! ## Features
//!
//! - **Multipart Bodies**: Streaming multipart/form-data via reqwest
//! - **Auth Helpers**: Bearer, basic and API key headers
//! - **Timeouts**: Per-request and client-wide timeout configuration
//! - **Progress**: Byte-level upload progress with rounded percentages
//! - **Connection Pooling**: Efficient connection reuse
//!
//! Requests are sent exactly once. Failures are classified as timeouts or
//! connection errors; non-2xx responses are returned as ordinary responses
//! for the caller to interpret.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use attache_http_client::{HttpClient, HttpClientConfig, multipart};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpClient::new(HttpClientConfig::default())?;
//!
//!     let form = multipart::Form::new()
//!         .part("file", multipart::Part::bytes(b"hello".to_vec()).file_name("hello.txt"));
//!
//!     let response = client
//!         .post("https://uploads.example.com/files")
//!         .bearer_auth("token")
//!         .multipart(form)
//!         .timeout(Duration::from_secs(30))
//!         .send()
//!         .await?;
//!
//!     println!("Status: {}", response.status());
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
mod progress;
mod request;
mod response;

pub use client::HttpClient;
pub use config::{HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use progress::{
    DEFAULT_CHUNK_SIZE, ProgressFn, ProgressTracker, UploadProgress, chunked, progress_channel,
    track,
};
pub use request::RequestBuilder;
pub use response::Response;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use reqwest::{Body, multipart};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use attache_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::error::{HttpClientError, Result};
    pub use crate::progress::{ProgressFn, UploadProgress, progress_channel};
    pub use crate::request::RequestBuilder;
    pub use crate::response::Response;
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
