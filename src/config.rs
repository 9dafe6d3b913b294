//! Configuration from qail-db2.toml.
//!
//! ```toml
//! [dialect]
//! supports_native_pagination = false
//! placeholder_style = "numbered"
//! allow_digest_substitution = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::capabilities::DialectCapabilities;
use crate::error::{Db2Error, Db2Result};

pub const CONFIG_FILE: &str = "qail-db2.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Capability overrides on top of the DB2 defaults
    #[serde(default)]
    pub dialect: DialectCapabilities,
}

impl Config {
    pub fn from_toml(content: &str) -> Db2Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Db2Result<Self> {
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load from `explicit`, else `./qail-db2.toml`, else the user config
    /// directory, else built-in defaults.
    pub fn load(explicit: Option<&Path>) -> Db2Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Db2Error::Config(format!("{} not found", path.display())));
            }
            return Self::from_file(path);
        }
        for candidate in Self::search_paths() {
            if candidate.exists() {
                return Self::from_file(&candidate);
            }
        }
        tracing::debug!("No configuration file found, using DB2 defaults");
        Ok(Self::default())
    }

    /// Candidate locations in lookup order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(CONFIG_FILE)];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("qail-db2").join("config.toml"));
        }
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::PlaceholderStyle;

    #[test]
    fn test_dialect_section_overrides_defaults() {
        let config = Config::from_toml(
            "[dialect]\nsupports_native_pagination = false\nplaceholder_style = \"numbered\"\n",
        )
        .unwrap();
        assert!(!config.dialect.supports_native_pagination);
        assert_eq!(config.dialect.placeholder_style, PlaceholderStyle::Numbered);
        assert_eq!(config.dialect.rownum_alias, "__ROWNUM");
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_section_rejected() {
        assert!(matches!(Config::from_toml("[postgres]\nurl = \"x\"\n"), Err(Db2Error::Toml(_))));
    }

    #[test]
    fn test_explicit_missing_path() {
        let err = Config::load(Some(Path::new("/nonexistent/qail-db2.toml"))).unwrap_err();
        assert!(matches!(err, Db2Error::Config(_)));
    }
}
