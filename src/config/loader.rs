//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::HostConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<HostConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: HostConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_file_is_io_error() {
        let result = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[web\nhttp_port = ]").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[web]\nhttp_port = 8080").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.web.http_port, Some(8080));
        assert_eq!(config.web.max_form_size_bytes, 600_000);
        assert!(!config.is_https_configured());
    }

    #[test]
    fn invalid_semantics_are_validation_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[web]\nhttps_port = 8443").unwrap();

        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
