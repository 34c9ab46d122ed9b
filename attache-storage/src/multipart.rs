//! Multipart form construction for uploads.

use attache_config::UploadConfig;
use attache_http_client::multipart::{Form, Part};
use attache_http_client::{Body, ProgressFn, track};

use crate::{Result, UploadError, UploadedFile};

/// Content type sent when the file declares none.
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Build the multipart body for one upload.
///
/// Field order: the file under `file_field_name`, then `filename`, `type`
/// and `size`, then every additional form field in configured order.
/// When `progress` is set, each body chunk read by the connection is
/// reported to it.
pub async fn build_form(
    file: &UploadedFile,
    config: &UploadConfig,
    progress: Option<ProgressFn>,
) -> Result<Form> {
    let stream = file.stream().await?;
    let body = match progress {
        Some(observer) => Body::wrap_stream(track(stream, Some(file.size()), observer)),
        None => Body::wrap_stream(stream),
    };

    let filename = file.name().unwrap_or_default().to_string();
    let declared_type = file.content_type_str().unwrap_or_default();
    let part_type = if declared_type.is_empty() {
        FALLBACK_CONTENT_TYPE
    } else {
        declared_type.as_str()
    };

    let part = Part::stream_with_length(body, file.size())
        .file_name(filename.clone())
        .mime_str(part_type)
        .map_err(|e| UploadError::Configuration(format!("invalid content type: {}", e)))?;

    let mut form = Form::new()
        .part(config.file_field_name.clone(), part)
        .text("filename", filename)
        .text("type", declared_type)
        .text("size", file.size().to_string());

    for (name, value) in config.additional_form_fields.iter() {
        form = form.text(name.to_string(), value.to_string());
    }

    Ok(form)
}
