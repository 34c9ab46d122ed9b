// Upload configuration for Attache
//
// Resolves the effective configuration of one upload from ambient
// (environment-derived) settings, provider presets and call-site overrides.

pub mod ambient;
pub mod env;
pub mod error;
pub mod fields;
pub mod preset;
pub mod resolver;
pub mod upload;

pub use ambient::AmbientSettings;
pub use env::EnvLoader;
pub use error::{ConfigError, Result};
pub use fields::FieldMap;
pub use preset::{CloudProvider, PresetContext, PresetFn, PresetOptions, PresetRegistry};
pub use resolver::{resolve_config, resolve_preset};
pub use upload::{
    AuthScheme, PartialUploadConfig, ResponseFormat, UploadConfig, DEFAULT_FILE_FIELD,
    DEFAULT_MAX_FILE_SIZE, DEFAULT_METHOD, DEFAULT_TIMEOUT_MS, DEFAULT_URL_FIELD,
};
