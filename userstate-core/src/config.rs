//! Configuration for user lifecycle tracking

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default window within which repeat provider foreground reports are suppressed
pub const DEFAULT_PROVIDER_REPORT_INTERVAL_MS: u64 = 60_000;

/// Settings shared by every tracked user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStateConfig {
    /// Emit a debug trace on every state transition
    #[serde(default)]
    pub trace_transitions: bool,

    /// Minimum gap between foreground reports for the same provider
    #[serde(default = "default_provider_report_interval_ms")]
    pub provider_report_interval_ms: u64,
}

fn default_provider_report_interval_ms() -> u64 {
    DEFAULT_PROVIDER_REPORT_INTERVAL_MS
}

impl Default for UserStateConfig {
    fn default() -> Self {
        Self {
            trace_transitions: false,
            provider_report_interval_ms: DEFAULT_PROVIDER_REPORT_INTERVAL_MS,
        }
    }
}

impl UserStateConfig {
    /// Parse config from a TOML string
    pub fn parse(toml_content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_content)?)
    }

    /// Load config from a TOML file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Load config, falling back to defaults if the file is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Using default user state config");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = UserStateConfig::default();
        assert!(!config.trace_transitions);
        assert_eq!(config.provider_report_interval_ms, 60_000);
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let config = UserStateConfig::parse("").unwrap();
        assert_eq!(config, UserStateConfig::default());
    }

    #[test]
    fn test_parse_partial() {
        let config = UserStateConfig::parse("trace_transitions = true").unwrap();
        assert!(config.trace_transitions);
        assert_eq!(config.provider_report_interval_ms, 60_000);
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let result = UserStateConfig::parse("provider_report_interval_ms = \"soon\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "provider_report_interval_ms = 1000").unwrap();

        let config = UserStateConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.provider_report_interval_ms, 1000);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        assert!(matches!(
            UserStateConfig::load_from_file(&path),
            Err(ConfigError::Read { .. })
        ));
        assert_eq!(
            UserStateConfig::load_or_default(&path),
            UserStateConfig::default()
        );
    }
}
