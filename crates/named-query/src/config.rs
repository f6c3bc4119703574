//! Registry configuration loaded from environment variables.

use std::path::PathBuf;

use crate::{QueryRegistry, Result};

/// Where named-query files live and whether they are used at all.
///
/// Reads from environment variables:
/// - `DAO_ENABLE_SQL_FILE` — `true`/`1` switches the registry on (default: off)
/// - `DAO_PATH` — root directory of the query files (default: `"db/"`)
/// - `DAO_SQL_EXTENSION` — file extension to scan for (default: `"toml"`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedQueryConfig {
    pub enabled: bool,
    pub path: PathBuf,
    pub extension: String,
}

impl NamedQueryConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: std::env::var("DAO_ENABLE_SQL_FILE")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.enabled),
            path: std::env::var("DAO_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.path),
            extension: std::env::var("DAO_SQL_EXTENSION").unwrap_or(defaults.extension),
        }
    }

    /// Builds the registry when enabled.
    ///
    /// Returns `Ok(None)` when named-query files are switched off; callers
    /// that later ask for a statement get [`crate::RegistryError::Disabled`].
    pub fn load_registry(&self) -> Result<Option<QueryRegistry>> {
        if !self.enabled {
            tracing::info!("named query files disabled");
            return Ok(None);
        }
        QueryRegistry::load(&self.path, &self.extension).map(Some)
    }
}

impl Default for NamedQueryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: PathBuf::from("db/"),
            extension: "toml".to_string(),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = NamedQueryConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.path, PathBuf::from("db/"));
        assert_eq!(config.extension, "toml");
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("true"));
        assert!(parse_flag(" TRUE "));
        assert!(parse_flag("1"));
        assert!(!parse_flag("false"));
        assert!(!parse_flag(""));
    }

    #[test]
    fn test_disabled_config_loads_nothing() {
        let config = NamedQueryConfig {
            path: PathBuf::from("/definitely/not/here"),
            ..Default::default()
        };
        assert!(config.load_registry().unwrap().is_none());
    }
}
