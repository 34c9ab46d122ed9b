// Ambient (environment-derived) upload settings

use crate::{EnvLoader, FieldMap, PartialUploadConfig, Result};
use crate::upload::{DEFAULT_MAX_FILE_SIZE, DEFAULT_TIMEOUT_MS};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Setting names, relative to the `RTE_` prefix.
pub mod keys {
    pub const UPLOAD_URL: &str = "UPLOAD_URL";
    pub const API_KEY: &str = "API_KEY";
    pub const MAX_FILE_SIZE: &str = "MAX_FILE_SIZE";
    pub const UPLOAD_TIMEOUT: &str = "UPLOAD_TIMEOUT";
    pub const ENABLE_PROGRESS: &str = "ENABLE_PROGRESS";
    pub const ALLOWED_TYPES: &str = "ALLOWED_TYPES";
    pub const CUSTOM_HEADERS: &str = "CUSTOM_HEADERS";
}

/// A read-only snapshot of the ambient upload settings.
///
/// Taken once per resolution so that a single upload never observes the
/// environment changing underneath it. The capture instant is part of the
/// snapshot; presets that stamp dates read it from here.
#[derive(Debug, Clone)]
pub struct AmbientSettings {
    vars: HashMap<String, String>,
    captured_at: DateTime<Utc>,
}

impl AmbientSettings {
    /// Snapshot the `RTE_*` variables of the current process.
    pub fn from_env() -> Self {
        Self {
            vars: EnvLoader::default().load(),
            captured_at: Utc::now(),
        }
    }

    /// Snapshot the process environment layered over a dotenv file.
    ///
    /// Values already present in the process environment win.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self> {
        let loader = EnvLoader::default();
        let mut vars = loader.load_file(path)?;
        vars.extend(loader.load());

        Ok(Self {
            vars,
            captured_at: Utc::now(),
        })
    }

    /// Build a snapshot from explicit `(name, value)` pairs.
    ///
    /// Names are given without the `RTE_` prefix.
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into().to_uppercase(), v.into()))
                .collect(),
            captured_at: Utc::now(),
        }
    }

    /// An empty snapshot.
    pub fn empty() -> Self {
        Self::from_vars(Vec::<(String, String)>::new())
    }

    /// Pin the capture instant.
    pub fn captured_at(mut self, instant: DateTime<Utc>) -> Self {
        self.captured_at = instant;
        self
    }

    pub fn capture_time(&self) -> DateTime<Utc> {
        self.captured_at
    }

    /// Look up a setting by its unprefixed name. Empty values count as unset.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars
            .get(&key.to_uppercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The configuration layer described by the generic settings.
    ///
    /// Malformed values are dropped with a warning; resolution never fails.
    pub fn defaults(&self) -> PartialUploadConfig {
        let mut config = PartialUploadConfig {
            endpoint_url: self.var(keys::UPLOAD_URL).map(String::from),
            api_key: self.var(keys::API_KEY).map(String::from),
            max_file_size: Some(
                self.parse_number(keys::MAX_FILE_SIZE)
                    .unwrap_or(DEFAULT_MAX_FILE_SIZE),
            ),
            timeout_ms: Some(
                self.parse_number(keys::UPLOAD_TIMEOUT)
                    .unwrap_or(DEFAULT_TIMEOUT_MS),
            ),
            enable_progress: Some(self.var(keys::ENABLE_PROGRESS) == Some("true")),
            ..Default::default()
        };

        if let Some(types) = self.var(keys::ALLOWED_TYPES) {
            config.allowed_types = Some(parse_type_list(types));
        }

        if let Some(raw) = self.var(keys::CUSTOM_HEADERS) {
            match parse_headers(raw) {
                Ok(headers) => config.extra_headers = headers,
                Err(reason) => {
                    warn!(setting = "RTE_CUSTOM_HEADERS", %reason, "Ignoring malformed custom headers");
                }
            }
        }

        config
    }

    fn parse_number(&self, key: &str) -> Option<u64> {
        let raw = self.var(key)?;
        match raw.trim().parse::<u64>() {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(setting = %format!("RTE_{}", key), value = %raw, error = %e, "Ignoring malformed numeric setting");
                None
            }
        }
    }
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self::empty()
    }
}

/// Split a comma-separated MIME list, trimming entries and dropping blanks.
pub fn parse_type_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a JSON object of header names to values, keeping key order.
///
/// Scalar values are stringified; nested values are rejected.
pub fn parse_headers(raw: &str) -> std::result::Result<FieldMap, String> {
    let value: serde_json::Value = serde_json::from_str(raw).map_err(|e| e.to_string())?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object".to_string())?;

    let mut headers = FieldMap::new();
    for (name, value) in object {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => return Err(format!("header {} must be a string", name)),
        };
        headers.insert_header(name.as_str(), value);
    }

    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .with_writer(move || writer.clone())
            .finish();

        let value = tracing::subscriber::with_default(subscriber, f);
        (value, logs.contents())
    }

    #[test]
    fn test_defaults_without_settings() {
        let config = AmbientSettings::empty().defaults();

        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.max_file_size, Some(10 * 1024 * 1024));
        assert_eq!(config.timeout_ms, Some(30_000));
        assert_eq!(config.enable_progress, Some(false));
        assert_eq!(config.allowed_types, None);
        assert!(config.extra_headers.is_empty());
    }

    #[test]
    fn test_defaults_from_settings() {
        let ambient = AmbientSettings::from_vars([
            ("UPLOAD_URL", "https://api.example.com/upload"),
            ("API_KEY", "test-api-key"),
            ("MAX_FILE_SIZE", "5242880"),
            ("UPLOAD_TIMEOUT", "60000"),
            ("ENABLE_PROGRESS", "true"),
            ("ALLOWED_TYPES", "image/jpeg, image/png ,,application/pdf"),
            ("CUSTOM_HEADERS", r#"{"X-Custom-Header":"custom-value","X-Retry":3}"#),
        ]);

        let config = ambient.defaults();

        assert_eq!(config.endpoint_url.as_deref(), Some("https://api.example.com/upload"));
        assert_eq!(config.api_key.as_deref(), Some("test-api-key"));
        assert_eq!(config.max_file_size, Some(5_242_880));
        assert_eq!(config.timeout_ms, Some(60_000));
        assert_eq!(config.enable_progress, Some(true));
        assert_eq!(
            config.allowed_types,
            Some(vec![
                "image/jpeg".to_string(),
                "image/png".to_string(),
                "application/pdf".to_string()
            ])
        );
        let headers: Vec<_> = config.extra_headers.iter().collect();
        assert_eq!(
            headers,
            vec![("X-Custom-Header", "custom-value"), ("X-Retry", "3")]
        );
    }

    #[test]
    fn test_invalid_custom_headers_are_dropped() {
        let ambient = AmbientSettings::from_vars([
            ("UPLOAD_URL", "https://api.example.com/upload"),
            ("CUSTOM_HEADERS", "invalid-json"),
        ]);

        let config = ambient.defaults();

        assert!(config.extra_headers.is_empty());
        assert_eq!(config.endpoint_url.as_deref(), Some("https://api.example.com/upload"));
    }

    #[test]
    fn test_invalid_custom_headers_emit_warning() {
        let ambient = AmbientSettings::from_vars([("CUSTOM_HEADERS", "{not json")]);

        let (config, logs) = with_captured_logs(|| ambient.defaults());

        assert!(config.extra_headers.is_empty());
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("Ignoring malformed custom headers"), "{logs}");
        assert!(logs.contains("RTE_CUSTOM_HEADERS"), "{logs}");
    }

    #[test]
    fn test_valid_custom_headers_log_nothing() {
        let ambient = AmbientSettings::from_vars([("CUSTOM_HEADERS", r#"{"X-A":"1"}"#)]);

        let (_, logs) = with_captured_logs(|| ambient.defaults());

        assert!(logs.is_empty(), "{logs}");
    }

    #[test]
    fn test_non_object_headers_are_dropped() {
        assert!(parse_headers(r#"["a","b"]"#).is_err());
        assert!(parse_headers(r#"{"X-Nested":{"a":1}}"#).is_err());
    }

    #[test]
    fn test_malformed_numbers_use_defaults() {
        let ambient = AmbientSettings::from_vars([
            ("MAX_FILE_SIZE", "ten megabytes"),
            ("UPLOAD_TIMEOUT", "-1"),
        ]);

        let config = ambient.defaults();

        assert_eq!(config.max_file_size, Some(DEFAULT_MAX_FILE_SIZE));
        assert_eq!(config.timeout_ms, Some(DEFAULT_TIMEOUT_MS));
    }

    #[test]
    fn test_progress_flag_requires_true() {
        let ambient = AmbientSettings::from_vars([("ENABLE_PROGRESS", "1")]);
        assert_eq!(ambient.defaults().enable_progress, Some(false));
    }

    #[test]
    fn test_var_lookup_is_case_insensitive_and_skips_empty() {
        let ambient = AmbientSettings::from_vars([("upload_url", ""), ("api_key", "k")]);

        assert_eq!(ambient.var("UPLOAD_URL"), None);
        assert_eq!(ambient.var("api_key"), Some("k"));
    }
}
