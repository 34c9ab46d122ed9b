//! File upload pipeline for Attache
//!
//! This module provides:
//! - Pre-flight file validation (size, type)
//! - Multipart HTTP upload transport with pluggable auth and response parsing
//! - Inline data URI fallback
//! - The [`Uploader`] that sequences them
//!
//! # Quick Start
//!
//! ```no_run
//! use attache_config::PartialUploadConfig;
//! use attache_storage::*;
//!
//! # async fn example() -> std::result::Result<(), UploadError> {
//! let uploader = Uploader::new()?;
//! let file = UploadedFile::from_bytes(b"file data".to_vec(), "notes.txt");
//!
//! let options = UploadOptions::new()
//!     .remote(true)
//!     .config(PartialUploadConfig::new().endpoint_url("https://uploads.example.com"))
//!     .on_error(|err, _| eprintln!("remote upload failed: {err}"));
//!
//! // A remote URL, or a data URI if the remote upload failed.
//! let reference = uploader.upload(&file, &options).await?;
//! println!("Stored at: {}", reference);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod fallback;
pub mod file;
pub mod multipart;
pub mod response;
pub mod transport;
pub mod uploader;
pub mod validation;

pub use error::*;
pub use fallback::*;
pub use file::*;
pub use multipart::*;
pub use response::*;
pub use transport::*;
pub use uploader::*;
pub use validation::*;
