// Upload configuration types

use crate::FieldMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Default byte ceiling for uploads (10 MiB).
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default transport timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default multipart field carrying the file bytes.
pub const DEFAULT_FILE_FIELD: &str = "file";

/// Canonical response field holding the reference URL.
pub const DEFAULT_URL_FIELD: &str = "url";

/// Default HTTP method.
pub const DEFAULT_METHOD: &str = "POST";

/// How the credential in `api_key` is presented to the endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `X-API-Key: <key>`
    ApiKey,
    /// `Authorization: Basic <base64(key)>`
    Basic,
    /// No header; the caller supplies credentials through extra headers.
    Custom,
}

/// How a successful response body is turned into an upload result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// JSON object with a `url` field (or the configured field).
    #[default]
    Json,
    /// The trimmed body is the reference URL.
    Text,
    /// JSON document; the reference is found at the configured field path.
    Custom,
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "json",
            Self::Text => "text",
            Self::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// The effective configuration for a single upload attempt.
///
/// Built fresh for every call by the resolver and never shared between
/// uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadConfig {
    /// Target endpoint. Must be non-empty before a transport attempt.
    pub endpoint_url: Option<String>,
    /// Credential material, applied according to `auth_scheme`.
    pub api_key: Option<String>,
    /// Byte ceiling; `None` disables the size check.
    pub max_file_size: Option<u64>,
    /// MIME types or `category/*` wildcards. Empty allows everything.
    pub allowed_types: Vec<String>,
    /// Transport timeout; `None` waits indefinitely.
    pub timeout_ms: Option<u64>,
    /// Whether upload progress notifications are produced.
    pub enable_progress: bool,
    /// Headers applied after authentication, in order.
    pub extra_headers: FieldMap,
    pub http_method: String,
    pub file_field_name: String,
    /// Extra multipart fields appended after the descriptive ones.
    pub additional_form_fields: FieldMap,
    pub response_format: ResponseFormat,
    pub url_response_field: String,
    pub auth_scheme: AuthScheme,
    /// Reference built from `{id}` / `{filename}` when the response has no URL.
    pub reference_template: Option<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            endpoint_url: None,
            api_key: None,
            max_file_size: Some(DEFAULT_MAX_FILE_SIZE),
            allowed_types: Vec::new(),
            timeout_ms: Some(DEFAULT_TIMEOUT_MS),
            enable_progress: false,
            extra_headers: FieldMap::new(),
            http_method: DEFAULT_METHOD.to_string(),
            file_field_name: DEFAULT_FILE_FIELD.to_string(),
            additional_form_fields: FieldMap::new(),
            response_format: ResponseFormat::default(),
            url_response_field: DEFAULT_URL_FIELD.to_string(),
            auth_scheme: AuthScheme::default(),
            reference_template: None,
        }
    }
}

impl UploadConfig {
    /// The endpoint, if one is configured and non-blank.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Whether a transport attempt can be made.
    pub fn has_endpoint(&self) -> bool {
        self.endpoint().is_some()
    }

    /// The credential, if one is configured and non-empty.
    pub fn credential(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }

    /// Overlay every field `partial` sets. Headers and form fields merge key by key.
    pub fn apply(&mut self, partial: &PartialUploadConfig) {
        if let Some(url) = &partial.endpoint_url {
            self.endpoint_url = Some(url.clone());
        }
        if let Some(key) = &partial.api_key {
            self.api_key = Some(key.clone());
        }
        if let Some(max) = partial.max_file_size {
            self.max_file_size = Some(max);
        }
        if let Some(types) = &partial.allowed_types {
            self.allowed_types = types.clone();
        }
        if let Some(ms) = partial.timeout_ms {
            self.timeout_ms = Some(ms);
        }
        if let Some(enabled) = partial.enable_progress {
            self.enable_progress = enabled;
        }
        self.extra_headers.merge_headers(&partial.extra_headers);
        if let Some(method) = &partial.http_method {
            self.http_method = method.clone();
        }
        if let Some(field) = &partial.file_field_name {
            self.file_field_name = field.clone();
        }
        self.additional_form_fields
            .merge(&partial.additional_form_fields);
        if let Some(format) = partial.response_format {
            self.response_format = format;
        }
        if let Some(field) = &partial.url_response_field {
            self.url_response_field = field.clone();
        }
        if let Some(scheme) = partial.auth_scheme {
            self.auth_scheme = scheme;
        }
        if let Some(template) = &partial.reference_template {
            self.reference_template = Some(template.clone());
        }
    }
}

/// A configuration layer in which every field is optional.
///
/// Ambient defaults, provider presets and call-site overrides are all
/// expressed as partial configs and stacked onto [`UploadConfig::default`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PartialUploadConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_file_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_types: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_progress: Option<bool>,
    #[serde(skip_serializing_if = "FieldMap::is_empty")]
    pub extra_headers: FieldMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_field_name: Option<String>,
    #[serde(skip_serializing_if = "FieldMap::is_empty")]
    pub additional_form_fields: FieldMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_response_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_scheme: Option<AuthScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_template: Option<String>,
}

impl PartialUploadConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer `other` on top of this one; fields set in `other` win.
    pub fn merge(&mut self, other: &PartialUploadConfig) {
        fn take<T: Clone>(slot: &mut Option<T>, value: &Option<T>) {
            if value.is_some() {
                *slot = value.clone();
            }
        }

        take(&mut self.endpoint_url, &other.endpoint_url);
        take(&mut self.api_key, &other.api_key);
        take(&mut self.max_file_size, &other.max_file_size);
        take(&mut self.allowed_types, &other.allowed_types);
        take(&mut self.timeout_ms, &other.timeout_ms);
        take(&mut self.enable_progress, &other.enable_progress);
        self.extra_headers.merge_headers(&other.extra_headers);
        take(&mut self.http_method, &other.http_method);
        take(&mut self.file_field_name, &other.file_field_name);
        self.additional_form_fields
            .merge(&other.additional_form_fields);
        take(&mut self.response_format, &other.response_format);
        take(&mut self.url_response_field, &other.url_response_field);
        take(&mut self.auth_scheme, &other.auth_scheme);
        take(&mut self.reference_template, &other.reference_template);
    }

    /// Whether this layer names an endpoint.
    pub fn has_endpoint(&self) -> bool {
        self.endpoint_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    pub fn allowed_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_types = Some(types.into_iter().map(Into::into).collect());
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = Some(ms);
        self
    }

    pub fn enable_progress(mut self, enabled: bool) -> Self {
        self.enable_progress = Some(enabled);
        self
    }

    /// Add an extra request header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert_header(name, value);
        self
    }

    pub fn http_method(mut self, method: impl Into<String>) -> Self {
        self.http_method = Some(method.into());
        self
    }

    pub fn file_field_name(mut self, name: impl Into<String>) -> Self {
        self.file_field_name = Some(name.into());
        self
    }

    /// Add an extra multipart form field.
    pub fn form_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.additional_form_fields.insert(name, value);
        self
    }

    pub fn response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    pub fn url_response_field(mut self, field: impl Into<String>) -> Self {
        self.url_response_field = Some(field.into());
        self
    }

    pub fn auth_scheme(mut self, scheme: AuthScheme) -> Self {
        self.auth_scheme = Some(scheme);
        self
    }

    pub fn reference_template(mut self, template: impl Into<String>) -> Self {
        self.reference_template = Some(template.into());
        self
    }
}
