// Provider presets
//
// A preset is a named function from caller options to a configuration layer
// seeding the conventions of one storage backend. New backends register a
// preset; the resolver itself never branches on provider names.

use crate::{AmbientSettings, ConfigError, FieldMap, PartialUploadConfig};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

const GIB: u64 = 1024 * 1024 * 1024;
const MIB: u64 = 1024 * 1024;

/// Built-in storage providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CloudProvider {
    /// Generic object storage with a public-read ACL header.
    Aws,
    /// Object storage tagging uploads with metadata headers.
    Gcp,
    /// Block-blob storage.
    Azure,
    /// Asset-management service.
    Cloudinary,
    /// Consumer drive storage.
    GoogleDrive,
    /// File-sync storage.
    Dropbox,
    ICloud,
    /// Any endpoint following the generic conventions.
    Custom,
}

impl CloudProvider {
    pub const ALL: [CloudProvider; 8] = [
        Self::Aws,
        Self::Gcp,
        Self::Azure,
        Self::Cloudinary,
        Self::GoogleDrive,
        Self::Dropbox,
        Self::ICloud,
        Self::Custom,
    ];

    /// Registry name of the provider.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aws => "aws",
            Self::Gcp => "gcp",
            Self::Azure => "azure",
            Self::Cloudinary => "cloudinary",
            Self::GoogleDrive => "googledrive",
            Self::Dropbox => "dropbox",
            Self::ICloud => "icloud",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CloudProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.name() == lower)
            .ok_or_else(|| ConfigError::UnknownProvider(s.to_string()))
    }
}

/// Caller options handed to a preset.
///
/// `overrides` always win over whatever the preset seeds; `params` carry
/// provider-specific knobs such as a target folder.
#[derive(Debug, Clone, Default)]
pub struct PresetOptions {
    pub overrides: PartialUploadConfig,
    pub params: HashMap<String, String>,
}

impl PresetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overrides(mut self, overrides: PartialUploadConfig) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    fn param_value(&self, key: &str) -> Option<&str> {
        self.params
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Everything a preset may read.
pub struct PresetContext<'a> {
    pub options: &'a PresetOptions,
    pub ambient: &'a AmbientSettings,
}

impl PresetContext<'_> {
    /// Explicit credential, else the named ambient setting.
    pub fn credential(&self, ambient_key: &str) -> Option<String> {
        self.options
            .overrides
            .api_key
            .clone()
            .or_else(|| self.ambient.var(ambient_key).map(String::from))
    }

    /// Named ambient endpoint, else `fallback`.
    pub fn endpoint(&self, ambient_key: &str, fallback: Option<&str>) -> Option<String> {
        self.ambient
            .var(ambient_key)
            .or(fallback)
            .map(String::from)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.options.param_value(key)
    }
}

/// Uniform preset signature.
pub type PresetFn = Arc<dyn Fn(&PresetContext<'_>) -> PartialUploadConfig + Send + Sync>;

/// Named registry of provider presets.
#[derive(Clone, Default)]
pub struct PresetRegistry {
    presets: HashMap<String, PresetFn>,
}

impl PresetRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every [`CloudProvider`] preset.
    pub fn builtin() -> Self {
        Self::new()
            .with(CloudProvider::Aws.name(), aws)
            .with(CloudProvider::Gcp.name(), gcp)
            .with(CloudProvider::Azure.name(), azure)
            .with(CloudProvider::Cloudinary.name(), cloudinary)
            .with(CloudProvider::GoogleDrive.name(), google_drive)
            .with(CloudProvider::Dropbox.name(), dropbox)
            .with(CloudProvider::ICloud.name(), icloud)
            .with(CloudProvider::Custom.name(), custom)
    }

    /// Register (or replace) a preset.
    pub fn register<F>(&mut self, name: impl Into<String>, preset: F)
    where
        F: Fn(&PresetContext<'_>) -> PartialUploadConfig + Send + Sync + 'static,
    {
        self.presets.insert(name.into().to_lowercase(), Arc::new(preset));
    }

    /// Builder-style [`PresetRegistry::register`].
    pub fn with<F>(mut self, name: impl Into<String>, preset: F) -> Self
    where
        F: Fn(&PresetContext<'_>) -> PartialUploadConfig + Send + Sync + 'static,
    {
        self.register(name, preset);
        self
    }

    pub fn get(&self, name: &str) -> Option<&PresetFn> {
        self.presets.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.presets.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for PresetRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresetRegistry")
            .field("presets", &self.names())
            .finish()
    }
}

// Built-in presets

fn seeded(
    ctx: &PresetContext<'_>,
    url_key: &str,
    default_url: Option<&str>,
    key_var: &str,
) -> PartialUploadConfig {
    PartialUploadConfig {
        endpoint_url: ctx.endpoint(url_key, default_url),
        api_key: ctx.credential(key_var),
        ..Default::default()
    }
}

fn bearer(headers: &mut FieldMap, key: Option<&str>) {
    if let Some(key) = key {
        headers.insert_header("Authorization", format!("Bearer {}", key));
    }
}

fn aws(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    seeded(ctx, "AWS_UPLOAD_URL", None, "AWS_ACCESS_KEY").header("x-amz-acl", "public-read")
}

fn gcp(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    seeded(ctx, "GCP_UPLOAD_URL", None, "GCP_API_KEY")
        .header("x-goog-meta-uploaded-by", "attache")
}

fn azure(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    seeded(ctx, "AZURE_UPLOAD_URL", None, "AZURE_ACCESS_KEY")
        .header("x-ms-blob-type", "BlockBlob")
}

fn cloudinary(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    seeded(ctx, "CLOUDINARY_UPLOAD_URL", None, "CLOUDINARY_API_KEY")
        .header("X-Requested-With", "XMLHttpRequest")
}

fn google_drive(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    let mut config = seeded(
        ctx,
        "GOOGLEDRIVE_UPLOAD_URL",
        Some("https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart"),
        "GOOGLEDRIVE_API_KEY",
    )
    .max_file_size(15 * GIB)
    .reference_template("https://drive.google.com/file/d/{id}/view");

    bearer(&mut config.extra_headers, config.api_key.as_deref());

    if let Some(folder) = ctx.param("folderId") {
        config.additional_form_fields.insert("parents", folder);
    }
    if let Some(description) = ctx.param("description") {
        config.additional_form_fields.insert("description", description);
    }

    config
}

fn dropbox(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    let mut config = seeded(
        ctx,
        "DROPBOX_UPLOAD_URL",
        Some("https://content.dropboxapi.com/2/files/upload"),
        "DROPBOX_ACCESS_TOKEN",
    )
    .max_file_size(150 * MIB)
    .reference_template("https://www.dropbox.com/s/{id}/{filename}");

    bearer(&mut config.extra_headers, config.api_key.as_deref());

    let path = ctx.param("path").map(String::from).unwrap_or_else(|| {
        format!(
            "/attache-uploads/{}",
            ctx.ambient.capture_time().timestamp_millis()
        )
    });
    let autorename = ctx.param("autorename").map(|v| v != "false").unwrap_or(true);
    let arg = serde_json::json!({
        "path": path,
        "mode": ctx.param("mode").unwrap_or("add"),
        "autorename": autorename,
    });
    config
        .extra_headers
        .insert_header("Dropbox-API-Arg", arg.to_string());

    config
}

fn icloud(ctx: &PresetContext<'_>) -> PartialUploadConfig {
    let mut config = seeded(ctx, "ICLOUD_UPLOAD_URL", None, "ICLOUD_API_KEY").max_file_size(50 * MIB);

    bearer(&mut config.extra_headers, config.api_key.as_deref());

    let key_id = ctx.param("keyId").or_else(|| ctx.ambient.var("ICLOUD_KEY_ID"));
    if let Some(key_id) = key_id {
        config
            .extra_headers
            .insert_header("X-Apple-CloudKit-Request-KeyID", key_id);
    }
    config.extra_headers.insert_header(
        "X-Apple-CloudKit-Request-ISO8601Date",
        ctx.ambient.capture_time().to_rfc3339(),
    );

    let container = ctx
        .param("containerId")
        .or_else(|| ctx.ambient.var("ICLOUD_CONTAINER_ID"));
    if let Some(container) = container {
        config.additional_form_fields.insert("containerId", container);
    }
    config
        .additional_form_fields
        .insert("zoneName", ctx.param("zoneName").unwrap_or("_defaultZone"));
    config
        .additional_form_fields
        .insert("recordType", ctx.param("recordType").unwrap_or("AttacheUpload"));

    config
}

fn custom(_ctx: &PresetContext<'_>) -> PartialUploadConfig {
    // The generic ambient layer already carries RTE_UPLOAD_URL / RTE_API_KEY.
    PartialUploadConfig::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn run(provider: CloudProvider, options: &PresetOptions, ambient: &AmbientSettings) -> PartialUploadConfig {
        let registry = PresetRegistry::builtin();
        let preset = registry.get(provider.name()).unwrap();
        preset(&PresetContext { options, ambient })
    }

    #[test]
    fn test_provider_names_round_trip() {
        for provider in CloudProvider::ALL {
            assert_eq!(provider.name().parse::<CloudProvider>().unwrap(), provider);
        }
        assert!("GoogleDrive".parse::<CloudProvider>().is_ok());
        assert!(matches!(
            "ftp".parse::<CloudProvider>(),
            Err(ConfigError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_builtin_registry_has_every_provider() {
        let registry = PresetRegistry::builtin();
        assert_eq!(registry.names().len(), CloudProvider::ALL.len());
        assert!(registry.contains("AWS"));
    }

    #[test]
    fn test_aws_seed() {
        let ambient = AmbientSettings::from_vars([
            ("AWS_UPLOAD_URL", "https://bucket.s3.amazonaws.com"),
            ("AWS_ACCESS_KEY", "aws-key"),
        ]);
        let config = run(CloudProvider::Aws, &PresetOptions::new(), &ambient);

        assert_eq!(config.endpoint_url.as_deref(), Some("https://bucket.s3.amazonaws.com"));
        assert_eq!(config.api_key.as_deref(), Some("aws-key"));
        assert_eq!(config.extra_headers.get_header("x-amz-acl"), Some("public-read"));
    }

    #[test]
    fn test_google_drive_seed() {
        let options = PresetOptions::new()
            .overrides(PartialUploadConfig::new().api_key("drive-token"))
            .param("folderId", "folder-1");
        let config = run(CloudProvider::GoogleDrive, &options, &AmbientSettings::empty());

        assert_eq!(
            config.endpoint_url.as_deref(),
            Some("https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart")
        );
        assert_eq!(config.max_file_size, Some(15 * GIB));
        assert_eq!(
            config.extra_headers.get_header("authorization"),
            Some("Bearer drive-token")
        );
        assert_eq!(config.additional_form_fields.get("parents"), Some("folder-1"));
        assert!(config.extra_headers.get_header("content-type").is_none());
    }

    #[test]
    fn test_dropbox_seed_uses_snapshot_clock() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let ambient = AmbientSettings::from_vars([("DROPBOX_ACCESS_TOKEN", "dbx")]).captured_at(instant);
        let config = run(CloudProvider::Dropbox, &PresetOptions::new(), &ambient);

        assert_eq!(config.max_file_size, Some(150 * MIB));
        let arg: serde_json::Value =
            serde_json::from_str(config.extra_headers.get_header("Dropbox-API-Arg").unwrap()).unwrap();
        assert_eq!(arg["path"], format!("/attache-uploads/{}", instant.timestamp_millis()));
        assert_eq!(arg["mode"], "add");
        assert_eq!(arg["autorename"], true);
    }

    #[test]
    fn test_icloud_seed() {
        let ambient = AmbientSettings::from_vars([
            ("ICLOUD_API_KEY", "ck"),
            ("ICLOUD_KEY_ID", "key-1"),
        ]);
        let config = run(CloudProvider::ICloud, &PresetOptions::new(), &ambient);

        assert_eq!(config.max_file_size, Some(50 * MIB));
        assert_eq!(
            config.extra_headers.get_header("X-Apple-CloudKit-Request-KeyID"),
            Some("key-1")
        );
        assert_eq!(config.additional_form_fields.get("zoneName"), Some("_defaultZone"));
        assert_eq!(config.additional_form_fields.get("containerId"), None);
    }

    #[test]
    fn test_custom_registration() {
        let mut registry = PresetRegistry::new();
        registry.register("Minio", |_ctx: &PresetContext<'_>| {
            PartialUploadConfig::new().endpoint_url("http://localhost:9000/upload")
        });

        let preset = registry.get("minio").unwrap();
        let config = preset(&PresetContext {
            options: &PresetOptions::new(),
            ambient: &AmbientSettings::empty(),
        });
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:9000/upload"));
    }
}
