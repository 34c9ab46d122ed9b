//! Turning a successful upload response into an [`UploadResult`].

use attache_config::{DEFAULT_URL_FIELD, ResponseFormat, UploadConfig};
use attache_http_client::Response;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::{Result, UploadError, UploadedFile};

/// Descriptive metadata a server may echo back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileMetadata {
    pub filename: Option<String>,
    pub size: Option<u64>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub uploaded_at: Option<String>,
}

/// Outcome of a remote upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    /// The reference every caller may rely on.
    pub reference_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<FileMetadata>,
}

impl UploadResult {
    /// A result carrying only a reference.
    pub fn new(reference_url: impl Into<String>) -> Self {
        Self {
            reference_url: reference_url.into(),
            id: None,
            metadata: None,
        }
    }
}

/// Caller-supplied reading of a `custom` format body. Replaces the
/// dotted-path lookup; `None` means the body carries no reference.
pub type ResponseParser = Arc<dyn Fn(&Value, &UploadedFile) -> Option<UploadResult> + Send + Sync>;

/// Parse a 2xx response according to `config.response_format`.
///
/// `custom` bodies go to `parser` when one is given.
pub fn parse_response(
    response: &Response,
    config: &UploadConfig,
    file: &UploadedFile,
    parser: Option<&ResponseParser>,
) -> Result<UploadResult> {
    match config.response_format {
        ResponseFormat::Text => {
            let body = response.text().map_err(UploadError::from)?;
            let reference = body.trim();
            if reference.is_empty() {
                return Err(UploadError::InvalidResponseFormat(
                    "empty response body".into(),
                ));
            }
            Ok(UploadResult::new(reference))
        }
        ResponseFormat::Json => {
            let value: Value = response.json().map_err(UploadError::from)?;
            let Value::Object(object) = value else {
                return Err(UploadError::InvalidResponseFormat(
                    "expected a JSON object".into(),
                ));
            };
            from_object(&object, config, file)
        }
        ResponseFormat::Custom => {
            let value: Value = response.json().map_err(UploadError::from)?;
            if let Some(parser) = parser {
                return parser(&value, file)
                    .filter(|result| !result.reference_url.is_empty())
                    .ok_or_else(|| {
                        UploadError::InvalidResponseFormat(
                            "response parser found no reference".into(),
                        )
                    });
            }
            let reference = lookup_path(&value, &config.url_response_field)
                .and_then(non_empty_str)
                .map(String::from);
            let id = value.get("id").and_then(id_string);
            finish(reference, id, None, config, file)
        }
    }
}

fn from_object(
    object: &Map<String, Value>,
    config: &UploadConfig,
    file: &UploadedFile,
) -> Result<UploadResult> {
    let field = config.url_response_field.as_str();
    let reference = if field != DEFAULT_URL_FIELD {
        object.get(field).and_then(non_empty_str)
    } else {
        None
    }
    .or_else(|| object.get(DEFAULT_URL_FIELD).and_then(non_empty_str))
    .map(String::from);

    let id = object.get("id").and_then(id_string);
    let metadata = object
        .get("metadata")
        .and_then(|m| serde_json::from_value::<FileMetadata>(m.clone()).ok());

    finish(reference, id, metadata, config, file)
}

fn finish(
    reference: Option<String>,
    id: Option<String>,
    metadata: Option<FileMetadata>,
    config: &UploadConfig,
    file: &UploadedFile,
) -> Result<UploadResult> {
    let reference = match reference {
        Some(reference) => reference,
        None => match (&config.reference_template, &id) {
            (Some(template), Some(id)) => fill_template(template, id, file.name().unwrap_or_default()),
            _ => {
                return Err(UploadError::InvalidResponseFormat(format!(
                    "response has no `{}` field",
                    config.url_response_field
                )));
            }
        },
    };

    Ok(UploadResult {
        reference_url: reference,
        id,
        metadata,
    })
}

/// Substitute `{id}` and `{filename}` in a reference template.
pub fn fill_template(template: &str, id: &str, filename: &str) -> String {
    template.replace("{id}", id).replace("{filename}", filename)
}

/// Resolve a dot-separated path such as `data.secure_url`.
fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_lookup_path() {
        let value = json!({"data": {"secure_url": "https://c/x", "items": [{"u": "a"}]}});

        assert_eq!(lookup_path(&value, "data.secure_url"), Some(&json!("https://c/x")));
        assert_eq!(lookup_path(&value, "data.items.0.u"), Some(&json!("a")));
        assert_eq!(lookup_path(&value, "data.missing"), None);
    }

    #[test]
    fn test_fill_template() {
        assert_eq!(
            fill_template("https://www.dropbox.com/s/{id}/{filename}", "abc", "a.png"),
            "https://www.dropbox.com/s/abc/a.png"
        );
    }

    #[test]
    fn test_object_prefers_configured_field() {
        let object = json!({"url": "https://canonical", "location": "https://custom", "id": 7})
            .as_object()
            .cloned()
            .unwrap();
        let config = UploadConfig {
            url_response_field: "location".into(),
            ..Default::default()
        };
        let file = UploadedFile::from_bytes(&b"x"[..], "x.txt");

        let result = from_object(&object, &config, &file).unwrap();
        assert_eq!(result.reference_url, "https://custom");
        assert_eq!(result.id.as_deref(), Some("7"));
    }

    #[test]
    fn test_object_falls_back_to_canonical_field() {
        let object = json!({"url": "https://canonical"}).as_object().cloned().unwrap();
        let config = UploadConfig {
            url_response_field: "location".into(),
            ..Default::default()
        };
        let file = UploadedFile::new(&b"x"[..]);

        let result = from_object(&object, &config, &file).unwrap();
        assert_eq!(result.reference_url, "https://canonical");
    }

    #[test]
    fn test_template_used_when_url_missing() {
        let object = json!({"id": "file-1", "metadata": {"size": 3, "type": "text/plain"}})
            .as_object()
            .cloned()
            .unwrap();
        let config = UploadConfig {
            reference_template: Some("https://drive.google.com/file/d/{id}/view".into()),
            ..Default::default()
        };
        let file = UploadedFile::from_bytes(&b"abc"[..], "a.txt");

        let result = from_object(&object, &config, &file).unwrap();
        assert_eq!(result.reference_url, "https://drive.google.com/file/d/file-1/view");
        let metadata = result.metadata.unwrap();
        assert_eq!(metadata.size, Some(3));
        assert_eq!(metadata.content_type.as_deref(), Some("text/plain"));
    }

    #[test]
    fn test_missing_reference_is_invalid() {
        let object = json!({"ok": true}).as_object().cloned().unwrap();
        let file = UploadedFile::new(&b"x"[..]);

        let err = from_object(&object, &UploadConfig::default(), &file).unwrap_err();
        assert!(matches!(err, UploadError::InvalidResponseFormat(_)));
    }

    #[test]
    fn test_bad_metadata_is_dropped() {
        let object = json!({"url": "https://x", "metadata": "not an object"})
            .as_object()
            .cloned()
            .unwrap();
        let file = UploadedFile::new(&b"x"[..]);

        let result = from_object(&object, &UploadConfig::default(), &file).unwrap();
        assert!(result.metadata.is_none());
    }
}
