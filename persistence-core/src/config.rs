//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: `PERSISTENCE_`, `__` between nested keys)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/persistence-core/{service_name}/config.toml
//! 4. System directory: /etc/persistence-core/{service_name}/config.toml
//! 5. Default values
//!
//! ```toml
//! [logging]
//! level = "persistence_core=debug,info"
//! format = "pretty"
//!
//! [search]
//! search_mode = "anywhere"
//! case_sensitive = false
//! max_results = 100
//! ```

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::repository::SearchMode;

const ENV_PREFIX: &str = "PERSISTENCE_";
const APP_DIR: &str = "persistence-core";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Defaults for search parameters built with
    /// [`SearchParameters::from_config`](crate::repository::SearchParameters::from_config)
    #[serde(default)]
    pub search: SearchConfig,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. "info" or "persistence_core=debug"
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

/// Search defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default = "default_true")]
    pub case_sensitive: bool,

    /// Default page size; unlimited when absent
    #[serde(default)]
    pub max_results: Option<u64>,

    #[serde(default)]
    pub cacheable: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_mode: SearchMode::Equals,
            case_sensitive: true,
            max_results: None,
            cacheable: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is taken from the running binary.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| APP_DIR.to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!(path = %path.display(), "Loading configuration");
                figment = figment.merge(Toml::file(path));
            }
        }

        let config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file, bypassing the search paths
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        Ok(config)
    }

    /// Candidate config files, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(APP_DIR);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Ok(path) = xdg_dirs.place_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(APP_DIR)
                .join(service_name)
                .join("config.toml"),
        );
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use std::io::Write;

    // Loading reads PERSISTENCE_* variables; every test that loads runs inside
    // a Jail so env changes in one test cannot leak into another.

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.search.search_mode, SearchMode::Equals);
        assert!(config.search.case_sensitive);
        assert!(config.search.max_results.is_none());
    }

    #[test]
    fn test_load_from_file() {
        Jail::expect_with(|_jail| {
            let mut file = tempfile::NamedTempFile::new().map_err(|e| e.to_string())?;
            writeln!(
                file,
                "[logging]\nformat = \"compact\"\n\n[search]\nsearch_mode = \"starting_like\"\nmax_results = 25"
            )
            .map_err(|e| e.to_string())?;

            let config = Config::load_from(file.path()).map_err(|e| e.to_string())?;
            assert_eq!(config.logging.format, LogFormat::Compact);
            assert_eq!(config.logging.level, "info");
            assert_eq!(config.search.search_mode, SearchMode::StartingLike);
            assert_eq!(config.search.max_results, Some(25));
            assert!(config.search.case_sensitive);
            Ok(())
        });
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        Jail::expect_with(|jail| {
            let config =
                Config::load_from(jail.directory().join("absent.toml")).map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_value_is_a_config_error() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\nsearch_mode = \"fuzzy\"")?;

            let error = Config::load_from("config.toml").unwrap_err();
            assert!(matches!(error, crate::error::Error::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\nsearch_mode = \"ending_like\"")?;
            jail.set_env("PERSISTENCE_SEARCH__SEARCH_MODE", "anywhere");
            jail.set_env("PERSISTENCE_LOGGING__LEVEL", "debug");

            let config = Config::load_from("config.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.search.search_mode, SearchMode::Anywhere);
            assert_eq!(config.logging.level, "debug");
            Ok(())
        });
    }

    #[test]
    fn test_load_for_service_reads_working_directory() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[search]\ncacheable = true")?;

            let config = Config::load_for_service("orders").map_err(|e| e.to_string())?;
            assert!(config.search.cacheable);
            Ok(())
        });
    }
}
