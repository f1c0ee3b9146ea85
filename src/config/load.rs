//! Configuration loading from files.
//!
//! The YAML file is the base layer; `CAPREF__`-prefixed environment
//! variables are layered on top (`__` separates nested keys).

use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};

use super::{ConfigError, DEFAULT_CONFIG_FILE, ENV_PREFIX, RootConfig, format_root_error};

/// Resolve the config file argument against the working directory,
/// defaulting to `capref.yaml`.
pub fn resolve_config_path(config_file: Option<&Path>) -> Result<PathBuf, ConfigError> {
    let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    if config_file.is_relative() {
        Ok(std::env::current_dir()
            .map_err(ConfigError::CwdFailure)?
            .join(config_file))
    } else {
        Ok(config_file.to_path_buf())
    }
}

impl RootConfig {
    /// Load the config from a file path
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::Validation(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        let settings = config::Config::builder()
            .add_source(File::new(path_str, FileFormat::Yaml))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: RootConfig = settings.try_deserialize().map_err(format_root_error)?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }
}
