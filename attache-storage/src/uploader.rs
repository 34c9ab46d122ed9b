//! Upload orchestration with inline fallback.
//!
//! For each file the [`Uploader`] picks one of two paths:
//!
//! - **Inline**: remote upload is disabled or has no usable endpoint. The
//!   file is encoded by the [`FallbackEncoder`] and nothing is reported as
//!   an error.
//! - **Remote**: the configuration is resolved, the file is validated and
//!   handed to the [`UploadTransport`]. On success the success hook fires.
//!   On any failure the error hook fires first; the file is then encoded
//!   inline when `fallback_on_error` is set, otherwise the error is
//!   returned.
//!
//! Batches are processed strictly one file at a time.

use attache_config::{
    AmbientSettings, PartialUploadConfig, PresetOptions, PresetRegistry, UploadConfig,
    resolve_config, resolve_preset,
};
use attache_http_client::{ProgressFn, UploadProgress};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    DataUriEncoder, FallbackEncoder, HttpTransport, Result, UploadError, UploadTransport,
    UploadedFile, validate,
};

/// Called with the remote reference and the uploaded file.
pub type SuccessFn = Arc<dyn Fn(&str, &UploadedFile) + Send + Sync>;

/// Called with the failure and the file it happened to.
pub type ErrorFn = Arc<dyn Fn(&UploadError, &UploadedFile) + Send + Sync>;

/// Per-call upload options.
#[derive(Clone)]
pub struct UploadOptions {
    remote: bool,
    config: Option<PartialUploadConfig>,
    provider: Option<(String, PresetOptions)>,
    fallback_on_error: bool,
    on_progress: Option<ProgressFn>,
    on_success: Option<SuccessFn>,
    on_error: Option<ErrorFn>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            remote: false,
            config: None,
            provider: None,
            fallback_on_error: true,
            on_progress: None,
            on_success: None,
            on_error: None,
        }
    }
}

impl UploadOptions {
    /// Inline-only options: remote upload disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the remote path.
    pub fn remote(mut self, enabled: bool) -> Self {
        self.remote = enabled;
        self
    }

    /// Explicit configuration overrides.
    ///
    /// Combined with a provider, these take precedence over the preset.
    pub fn config(mut self, config: PartialUploadConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Resolve the configuration through a named provider preset.
    pub fn provider(mut self, name: impl Into<String>, options: PresetOptions) -> Self {
        self.provider = Some((name.into(), options));
        self
    }

    /// Encode inline when the remote path fails. Defaults to `true`.
    pub fn fallback_on_error(mut self, enabled: bool) -> Self {
        self.fallback_on_error = enabled;
        self
    }

    /// Observe upload progress. Only used when progress is enabled in the
    /// resolved configuration.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// Use an existing progress observer, such as one from
    /// [`progress_channel`](attache_http_client::progress_channel).
    pub fn progress_observer(mut self, observer: ProgressFn) -> Self {
        self.on_progress = Some(observer);
        self
    }

    /// Called after a successful remote upload.
    pub fn on_success<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &UploadedFile) + Send + Sync + 'static,
    {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Called whenever the remote path fails, including when the fallback
    /// later succeeds.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&UploadError, &UploadedFile) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Whether the remote path is enabled.
    pub fn is_remote(&self) -> bool {
        self.remote
    }
}

impl std::fmt::Debug for UploadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOptions")
            .field("remote", &self.remote)
            .field("provider", &self.provider.as_ref().map(|(name, _)| name))
            .field("has_config", &self.config.is_some())
            .field("fallback_on_error", &self.fallback_on_error)
            .finish_non_exhaustive()
    }
}

/// Upload pipeline entry point.
#[derive(Clone)]
pub struct Uploader {
    transport: Arc<dyn UploadTransport>,
    encoder: Arc<dyn FallbackEncoder>,
    presets: Arc<PresetRegistry>,
    ambient: Option<Arc<AmbientSettings>>,
}

impl Uploader {
    /// HTTP transport, data URI fallback, built-in presets, and a fresh
    /// environment snapshot per call.
    ///
    /// Fails with `Configuration` when the HTTP client cannot be built.
    pub fn new() -> Result<Self> {
        Ok(Self::from_transport(HttpTransport::new()?))
    }

    /// Same defaults as [`Uploader::new`] around a caller-supplied transport.
    pub fn from_transport(transport: impl UploadTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
            encoder: Arc::new(DataUriEncoder),
            presets: Arc::new(PresetRegistry::builtin()),
            ambient: None,
        }
    }

    /// Replace the fallback encoder.
    pub fn with_encoder(mut self, encoder: impl FallbackEncoder + 'static) -> Self {
        self.encoder = Arc::new(encoder);
        self
    }

    /// Replace the preset registry.
    pub fn with_presets(mut self, presets: PresetRegistry) -> Self {
        self.presets = Arc::new(presets);
        self
    }

    /// Use a fixed ambient snapshot instead of reading the environment.
    pub fn with_ambient(mut self, ambient: AmbientSettings) -> Self {
        self.ambient = Some(Arc::new(ambient));
        self
    }

    fn snapshot(&self) -> Arc<AmbientSettings> {
        match &self.ambient {
            Some(ambient) => ambient.clone(),
            None => Arc::new(AmbientSettings::from_env()),
        }
    }

    /// Resolve the effective configuration, if the options describe one.
    pub fn resolve(&self, options: &UploadOptions) -> Option<UploadConfig> {
        let ambient = self.snapshot();
        match (&options.provider, &options.config) {
            (Some((name, preset_options)), explicit) => {
                let mut preset_options = preset_options.clone();
                if let Some(explicit) = explicit {
                    preset_options.overrides.merge(explicit);
                }
                Some(resolve_preset(&self.presets, name, &preset_options, &ambient))
            }
            (None, Some(explicit)) => Some(resolve_config(&ambient, explicit)),
            (None, None) => None,
        }
    }

    /// Upload one file and return its reference: a remote URL or a data URI.
    pub async fn upload(&self, file: &UploadedFile, options: &UploadOptions) -> Result<String> {
        if !options.remote {
            debug!(file = ?file.name(), "Remote upload disabled, encoding inline");
            return self.encoder.encode(file).await;
        }

        let config = match self.resolve(options) {
            Some(config) if config.has_endpoint() => config,
            _ => {
                debug!(file = ?file.name(), "No upload endpoint configured, encoding inline");
                return self.encoder.encode(file).await;
            }
        };

        match self.attempt(file, &config, options).await {
            Ok(reference) => {
                info!(file = ?file.name(), "File uploaded");
                if let Some(on_success) = &options.on_success {
                    on_success(&reference, file);
                }
                Ok(reference)
            }
            Err(err) => {
                warn!(file = ?file.name(), error = %err, "Remote upload failed");
                notify_error(options, &err, file);

                if options.fallback_on_error {
                    debug!(file = ?file.name(), "Falling back to inline encoding");
                    self.encoder.encode(file).await
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Upload files one after another. A failure does not stop the batch.
    pub async fn upload_all(
        &self,
        files: &[UploadedFile],
        options: &UploadOptions,
    ) -> Vec<Result<String>> {
        let mut results = Vec::with_capacity(files.len());
        for file in files {
            results.push(self.upload(file, options).await);
        }
        results
    }

    async fn attempt(
        &self,
        file: &UploadedFile,
        config: &UploadConfig,
        options: &UploadOptions,
    ) -> Result<String> {
        validate(file, config)?;
        let result = self
            .transport
            .send(file, config, options.on_progress.clone())
            .await?;
        Ok(result.reference_url)
    }
}

fn notify_error(options: &UploadOptions, err: &UploadError, file: &UploadedFile) {
    let Some(on_error) = &options.on_error else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| on_error(err, file))).is_err() {
        warn!(file = ?file.name(), "Upload error hook panicked");
    }
}
