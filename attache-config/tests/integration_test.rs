//! Integration tests for attache-config

use attache_config::*;
use std::env;
use std::io::Write;

#[test]
fn test_env_loader_with_prefix() {
    let loader = EnvLoader::new(Some("ATTACHE_IT".to_string()));

    unsafe {
        env::set_var("ATTACHE_IT_UPLOAD_URL", "https://it.example.com");
    }

    let vars = loader.load();
    assert_eq!(
        vars.get("UPLOAD_URL").map(String::as_str),
        Some("https://it.example.com")
    );

    // Cleanup
    unsafe {
        env::remove_var("ATTACHE_IT_UPLOAD_URL");
    }
}

#[test]
fn test_env_loader_missing_var() {
    let loader = EnvLoader::new(Some("ATTACHE_IT_MISSING".to_string()));

    assert!(loader.load().is_empty());
}

#[test]
fn test_resolution_from_env_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "RTE_GCP_UPLOAD_URL=https://storage.example.com/bucket").unwrap();
    writeln!(file, "RTE_GCP_API_KEY=gcp-key").unwrap();
    writeln!(file, "RTE_MAX_FILE_SIZE=2048").unwrap();
    writeln!(file, "RTE_ALLOWED_TYPES=image/png, image/*,").unwrap();
    writeln!(file, r#"RTE_CUSTOM_HEADERS={{"X-B":"2","X-A":"1"}}"#).unwrap();
    writeln!(file, "UNRELATED=1").unwrap();

    let ambient = AmbientSettings::from_env_file(file.path()).unwrap();
    let config = resolve_preset(
        &PresetRegistry::builtin(),
        "gcp",
        &PresetOptions::new(),
        &ambient,
    );

    assert_eq!(config.endpoint(), Some("https://storage.example.com/bucket"));
    assert_eq!(config.credential(), Some("gcp-key"));
    assert_eq!(config.max_file_size, Some(2048));
    assert_eq!(config.allowed_types, vec!["image/png", "image/*"]);

    let headers: Vec<_> = config.extra_headers.iter().collect();
    assert_eq!(
        headers,
        vec![
            ("X-B", "2"),
            ("X-A", "1"),
            ("x-goog-meta-uploaded-by", "attache")
        ]
    );
}

#[test]
fn test_malformed_env_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "NOT A VALID LINE 'unterminated").unwrap();

    let result = AmbientSettings::from_env_file(file.path());
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_config_from_json() {
    let config: UploadConfig = serde_json::from_str(
        r#"{
            "endpointUrl": "https://up.example.com",
            "authScheme": "apikey",
            "responseFormat": "text",
            "extraHeaders": {"X-Z": "z", "X-A": "a"}
        }"#,
    )
    .unwrap();

    assert_eq!(config.auth_scheme, AuthScheme::ApiKey);
    assert_eq!(config.response_format, ResponseFormat::Text);
    assert_eq!(config.http_method, DEFAULT_METHOD);
    assert_eq!(config.max_file_size, Some(DEFAULT_MAX_FILE_SIZE));
    assert_eq!(
        config.extra_headers.iter().map(|(k, _)| k).collect::<Vec<_>>(),
        vec!["X-Z", "X-A"]
    );
}

#[test]
fn test_config_error_display() {
    let err = ConfigError::ParseError("RTE_CUSTOM_HEADERS".to_string());
    let display = format!("{}", err);
    assert!(display.contains("RTE_CUSTOM_HEADERS"));
}
