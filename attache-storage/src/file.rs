//! Uploaded file types.

use attache_http_client::{DEFAULT_CHUNK_SIZE, chunked};
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use mime::Mime;
use std::io;
use std::path::{Path, PathBuf};
use tokio_util::io::ReaderStream;

use crate::{Result, UploadError};

/// Information about a file to upload.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    /// Original file name.
    pub name: Option<String>,
    /// File extension.
    pub extension: Option<String>,
    /// Declared MIME type.
    pub content_type: Option<Mime>,
    /// File size in bytes.
    pub size: u64,
}

impl FileInfo {
    fn named(name: Option<String>, size: u64) -> Self {
        let extension = name.as_deref().and_then(extension_of);
        let content_type = name
            .as_deref()
            .and_then(|n| mime_guess::from_path(n).first());

        Self {
            name,
            extension,
            content_type,
            size,
        }
    }
}

/// Where the file contents live.
#[derive(Debug, Clone)]
pub enum FileData {
    /// Contents held in memory.
    Bytes(Bytes),
    /// Contents read from disk on demand.
    Path(PathBuf),
}

/// A file handed to the upload pipeline.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// File information.
    pub info: FileInfo,
    /// File data.
    pub data: FileData,
}

impl UploadedFile {
    /// Create an unnamed in-memory file.
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            info: FileInfo {
                size: data.len() as u64,
                ..Default::default()
            },
            data: FileData::Bytes(data),
        }
    }

    /// Create from raw bytes with a name. The MIME type is guessed from the name.
    pub fn from_bytes(data: impl Into<Bytes>, name: impl Into<String>) -> Self {
        let data = data.into();
        Self {
            info: FileInfo::named(Some(name.into()), data.len() as u64),
            data: FileData::Bytes(data),
        }
    }

    /// Create a file backed by a path on disk.
    ///
    /// Only the metadata is read here; contents are streamed when uploaded.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| UploadError::FileRead(format!("{}: {}", path.display(), e)))?;
        if !metadata.is_file() {
            return Err(UploadError::FileRead(format!(
                "{}: not a regular file",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string());

        Ok(Self {
            info: FileInfo::named(name, metadata.len()),
            data: FileData::Path(path.to_path_buf()),
        })
    }

    /// Get the file name.
    pub fn name(&self) -> Option<&str> {
        self.info.name.as_deref()
    }

    /// Get the file extension.
    pub fn extension(&self) -> Option<&str> {
        self.info.extension.as_deref()
    }

    /// Get the content type.
    pub fn content_type(&self) -> Option<&Mime> {
        self.info.content_type.as_ref()
    }

    /// Get the content type as a string.
    pub fn content_type_str(&self) -> Option<String> {
        self.info.content_type.as_ref().map(|ct| ct.to_string())
    }

    /// Get the file size.
    pub fn size(&self) -> u64 {
        self.info.size
    }

    /// Check if the file is empty.
    pub fn is_empty(&self) -> bool {
        self.info.size == 0
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: Mime) -> Self {
        self.info.content_type = Some(content_type);
        self
    }

    /// Clear the declared content type.
    pub fn without_content_type(mut self) -> Self {
        self.info.content_type = None;
        self
    }

    /// Read the whole file into memory.
    pub async fn read_bytes(&self) -> io::Result<Bytes> {
        match &self.data {
            FileData::Bytes(bytes) => Ok(bytes.clone()),
            FileData::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
        }
    }

    /// Stream the file contents in chunks.
    pub(crate) async fn stream(&self) -> Result<BoxStream<'static, io::Result<Bytes>>> {
        match &self.data {
            FileData::Bytes(bytes) => Ok(chunked(bytes.clone(), DEFAULT_CHUNK_SIZE).boxed()),
            FileData::Path(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .map_err(|e| UploadError::FileRead(format!("{}: {}", path.display(), e)))?;
                Ok(ReaderStream::with_capacity(file, DEFAULT_CHUNK_SIZE).boxed())
            }
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_string())
}
