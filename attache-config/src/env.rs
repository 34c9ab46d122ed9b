// Environment variable loading

use crate::{ConfigError, Result};
use std::collections::HashMap;
use std::env;
use std::path::Path;

/// Prefix shared by every ambient upload setting.
pub const DEFAULT_PREFIX: &str = "RTE";

/// Environment variable loader
pub struct EnvLoader {
    prefix: Option<String>,
}

impl EnvLoader {
    /// Create a new environment loader
    pub fn new(prefix: Option<String>) -> Self {
        Self { prefix }
    }

    /// Load all matching environment variables.
    ///
    /// Keys are returned upper-cased with the prefix and its separator
    /// stripped, so `RTE_UPLOAD_URL` becomes `UPLOAD_URL`.
    pub fn load(&self) -> HashMap<String, String> {
        self.collect(env::vars())
    }

    /// Load matching variables from a dotenv file without touching the
    /// process environment.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<HashMap<String, String>> {
        let iter = dotenvy::from_path_iter(path.as_ref()).map_err(map_dotenv_error)?;

        let mut pairs = Vec::new();
        for item in iter {
            pairs.push(item.map_err(map_dotenv_error)?);
        }

        Ok(self.collect(pairs))
    }

    fn collect<I>(&self, vars: I) -> HashMap<String, String>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut config = HashMap::new();

        for (key, value) in vars {
            match self.prefix {
                Some(ref prefix) => {
                    if let Some(rest) = key.strip_prefix(prefix.as_str())
                        && let Some(trimmed) = rest.strip_prefix('_')
                        && !trimmed.is_empty()
                    {
                        config.insert(trimmed.to_uppercase(), value);
                    }
                }
                None => {
                    config.insert(key.to_uppercase(), value);
                }
            }
        }

        config
    }
}

impl Default for EnvLoader {
    fn default() -> Self {
        Self::new(Some(DEFAULT_PREFIX.to_string()))
    }
}

fn map_dotenv_error(err: dotenvy::Error) -> ConfigError {
    match err {
        dotenvy::Error::Io(e) => ConfigError::IoError(e),
        dotenvy::Error::LineParse(line, index) => {
            ConfigError::ParseError(format!("invalid line at {}: {}", index, line))
        }
        other => ConfigError::LoadError(other.to_string()),
    }
}
