//! Configuration loading and types for capref.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)
//! - Per-page caption overrides from front matter (`overrides`)

mod load;
mod overrides;
mod types;

pub use load::resolve_config_path;
// Re-export all types for convenient access
pub use overrides::{CaptionOverrides, IdentifierOverrides};
pub use types::{CaptionConfig, IdentifierConfig, MarkdownConfig, Position, RootConfig, SiteConfig};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "capref.yaml";

/// Prefix of environment variables that override config values,
/// e.g. `CAPREF__CAPTION__FIGURE__START_INDEX=10`.
pub const ENV_PREFIX: &str = "CAPREF";

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("config path is not valid UTF-8: {}", .0.display())]
    EncodePath(std::path::PathBuf),

    #[error("{0}")]
    Validation(String),
}

/// Turn a deserialization error into a message that says what to fix.
fn format_root_error(e: config::ConfigError) -> ConfigError {
    let msg = e.to_string();

    if msg.contains("missing field `site`") {
        return ConfigError::Validation(
            "invalid config: 'site' is required\n\nExample:\n  site:\n    name: My Docs"
                .to_string(),
        );
    }
    if msg.contains("missing field `name`") {
        return ConfigError::Validation(
            "invalid config: missing required 'site.name' field".to_string(),
        );
    }
    if msg.contains("unknown variant") && msg.contains("position") {
        return ConfigError::Validation(format!(
            "invalid config: caption position must be 'top' or 'bottom' ({msg})"
        ));
    }

    ConfigError::Load(e)
}
