// Configuration resolution
//
// Layers, lowest precedence first:
//   built-in defaults -> ambient settings -> provider preset -> caller overrides
// Scalars are replaced field by field; header and form-field maps merge key
// by key. Resolution performs no I/O and is deterministic for a given
// ambient snapshot.
//
// Named providers never inherit the generic ambient endpoint or API key;
// only the `custom` preset reads those.

use crate::{
    AmbientSettings, CloudProvider, PartialUploadConfig, PresetContext, PresetOptions,
    PresetRegistry, UploadConfig,
};
use tracing::debug;

/// Resolve explicit overrides against the ambient snapshot.
pub fn resolve_config(ambient: &AmbientSettings, explicit: &PartialUploadConfig) -> UploadConfig {
    layered(&ambient.defaults(), explicit)
}

fn layered(defaults: &PartialUploadConfig, explicit: &PartialUploadConfig) -> UploadConfig {
    let mut config = UploadConfig::default();
    config.apply(defaults);
    config.apply(explicit);
    config
}

/// Resolve a named provider preset, with `options.overrides` taking precedence.
///
/// Unknown provider names resolve through the `custom` preset.
pub fn resolve_preset(
    registry: &PresetRegistry,
    provider: &str,
    options: &PresetOptions,
    ambient: &AmbientSettings,
) -> UploadConfig {
    let custom = CloudProvider::Custom.name();
    let (name, preset) = match registry.get(provider) {
        Some(preset) => (provider, Some(preset)),
        None => {
            debug!(provider = %provider, "Unknown provider, using custom preset");
            (custom, registry.get(custom))
        }
    };

    let mut layer = match preset {
        Some(preset) => preset(&PresetContext { options, ambient }),
        None => PartialUploadConfig::default(),
    };
    layer.merge(&options.overrides);

    let mut defaults = ambient.defaults();
    if !name.eq_ignore_ascii_case(custom) {
        defaults.endpoint_url = None;
        defaults.api_key = None;
    }

    layered(&defaults, &layer)
}
