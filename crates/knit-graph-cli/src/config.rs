//! Configuration file loading for the CLI
//!
//! This module handles finding and loading TOML configuration files
//! from various locations (explicit path, local directory, system directory).

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use knit_graph::config::AppConfig;

/// Configuration-related errors for CLI
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(String),

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    Read(#[from] io::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Find and load configuration from various locations
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Local project directory (knit-graph/config.toml)
/// 3. Platform-specific config directory
/// 4. Default config if none found
///
/// # Arguments
///
/// * `explicit_path` - Optional explicit path to config file
///
/// # Errors
///
/// Returns error if:
/// - Explicit path is provided but file doesn't exist
/// - Config file exists but cannot be parsed or holds invalid values
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, ConfigError> {
    // 1. Try the explicitly provided path first if available
    if let Some(path) = explicit_path {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    // 2. Try the local project directory
    let local_config = Path::new("knit-graph/config.toml");
    if local_config.exists() {
        info!(path = local_config.display().to_string(); "Loading configuration from local path");
        return load_config_file(local_config);
    }

    // 3. Try the platform-specific config directory
    if let Some(proj_dirs) = ProjectDirs::from("com", "knitfab", "knit-graph") {
        let system_config = proj_dirs.config_dir().join("config.toml");

        if system_config.exists() {
            info!(path = system_config.display().to_string(); "Loading configuration from system path");
            return load_config_file(system_config);
        }

        debug!(path = system_config.display().to_string(); "System configuration file not found");
    } else {
        debug!("Could not determine platform-specific config directory");
    }

    // 4. If no config is found, return default config
    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

/// Load configuration from a TOML file
///
/// # Errors
///
/// Returns error if:
/// - File doesn't exist
/// - File cannot be read
/// - TOML parsing fails
/// - A layout value is out of range
fn load_config_file(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &AppConfig) -> Result<(), ConfigError> {
    let layout = config.layout();
    let positive = [
        ("layout.default_width", layout.default_width()),
        ("layout.default_height", layout.default_height()),
    ];
    for (name, value) in positive {
        if !(value.is_finite() && value > 0.0) {
            return Err(ConfigError::Validation(format!(
                "{name} must be a positive number, got {value}"
            )));
        }
    }

    let non_negative = [
        ("layout.node_spacing", layout.node_spacing()),
        ("layout.component_spacing", layout.component_spacing()),
        ("layout.rank_separation_ratio", layout.rank_separation_ratio()),
    ];
    for (name, value) in non_negative {
        if !(value.is_finite() && value >= 0.0) {
            return Err(ConfigError::Validation(format!(
                "{name} must not be negative, got {value}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{io::Write, num::NonZeroUsize};

    use tempfile::NamedTempFile;

    use knit_graph::traversal::Direction;

    use super::*;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(content.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn test_load_explicit_config() {
        let file = write_config(
            r#"
            [traversal]
            direction = "upstream"
            max_depth = 3

            [layout]
            node_spacing = 20.0
            default_height = 120.0
            "#,
        );

        let config = load_config(Some(file.path())).expect("valid config");

        assert_eq!(config.traversal().direction(), Direction::Upstream);
        assert_eq!(config.traversal().max_depth(), NonZeroUsize::new(3));
        assert_eq!(config.layout().node_spacing(), 20.0);
        assert_eq!(config.layout().default_height(), 120.0);
        assert_eq!(config.layout().default_width(), 500.0);
    }

    #[test]
    fn test_missing_explicit_config() {
        let err = load_config(Some("does/not/exist.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile(_)));
    }

    #[test]
    fn test_invalid_toml() {
        let file = write_config("[layout\nnode_spacing = ");

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_negative_spacing_rejected() {
        let file = write_config("[layout]\nnode_spacing = -5.0\n");

        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("layout.node_spacing"));
    }
}
