// Attache - attachment upload pipeline for document editors
//
// Resolves where an attachment should live, validates it, uploads it to a
// remote endpoint and falls back to an inline data URI when the remote path
// is unavailable or fails.

// Re-export the pipeline
pub use attache_storage::*;

// Re-export member crates
pub use attache_config;
pub use attache_http_client;
pub use attache_storage;

pub use attache_config::{
    AmbientSettings, AuthScheme, CloudProvider, FieldMap, PartialUploadConfig, PresetOptions,
    PresetRegistry, ResponseFormat, UploadConfig, resolve_config, resolve_preset,
};
pub use attache_http_client::{ProgressFn, UploadProgress, progress_channel};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        AmbientSettings,
        AuthScheme,
        CloudProvider,
        DataUriEncoder,
        FallbackEncoder,
        FieldMap,
        FileValidator,
        HttpTransport,
        PartialUploadConfig,
        PresetOptions,
        PresetRegistry,
        ResponseFormat,
        UploadConfig,
        UploadError,
        UploadOptions,
        UploadProgress,
        UploadResult,
        UploadTransport,
        UploadedFile,
        Uploader,
        ValidationError,
        progress_channel,
    };
}
