//! Inline fallback encoding.

use async_trait::async_trait;
use base64::Engine;
use mime::Mime;

use crate::{FALLBACK_CONTENT_TYPE, Result, UploadError, UploadedFile};

/// Produces a self-contained reference when no remote one is available.
#[async_trait]
pub trait FallbackEncoder: Send + Sync {
    /// Encode the file into a reference string.
    async fn encode(&self, file: &UploadedFile) -> Result<String>;
}

/// Encodes files as `data:<type>;base64,<payload>` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataUriEncoder;

#[async_trait]
impl FallbackEncoder for DataUriEncoder {
    async fn encode(&self, file: &UploadedFile) -> Result<String> {
        let bytes = file
            .read_bytes()
            .await
            .map_err(|e| UploadError::FileRead(e.to_string()))?;
        let media_type = file.content_type().map(media_type);
        Ok(to_data_uri(media_type.as_deref(), &bytes))
    }
}

// Data URI media types carry no whitespace: `text/plain;charset=utf-8`.
fn media_type(mime: &Mime) -> String {
    mime.params().fold(mime.essence_str().to_string(), |mut out, (name, value)| {
        out.push(';');
        out.push_str(name.as_str());
        out.push('=');
        out.push_str(value.as_str());
        out
    })
}

/// Build a base64 data URI for `bytes`.
pub fn to_data_uri(content_type: Option<&str>, bytes: &[u8]) -> String {
    let content_type = content_type
        .filter(|ct| !ct.is_empty())
        .unwrap_or(FALLBACK_CONTENT_TYPE);
    format!(
        "data:{};base64,{}",
        content_type,
        base64::engine::general_purpose::STANDARD.encode(bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_encodes_declared_type() {
        let file = UploadedFile::from_bytes(Bytes::from("hello"), "hello.txt");
        let uri = DataUriEncoder.encode(&file).await.unwrap();

        assert_eq!(uri, "data:text/plain;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn test_parameters_are_joined_without_spaces() {
        let file = UploadedFile::from_bytes(Bytes::from("hello"), "hello.txt")
            .with_content_type("text/plain; charset=utf-8".parse().unwrap());
        let uri = DataUriEncoder.encode(&file).await.unwrap();

        assert_eq!(uri, "data:text/plain;charset=utf-8;base64,aGVsbG8=");
    }

    #[tokio::test]
    async fn test_untyped_file_uses_octet_stream() {
        let file = UploadedFile::new(Bytes::from_static(&[0xff, 0x00]));
        let uri = DataUriEncoder.encode(&file).await.unwrap();

        assert_eq!(uri, "data:application/octet-stream;base64,/wA=");
    }

    #[tokio::test]
    async fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.png");
        std::fs::write(&path, b"png").unwrap();
        let file = UploadedFile::from_path(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();

        let err = DataUriEncoder.encode(&file).await.unwrap_err();
        assert!(matches!(err, UploadError::FileRead(_)));
        assert!(err.to_string().starts_with("Failed to read file"));
    }
}
