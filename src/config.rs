//! Runtime configuration.
//!
//! Resolution order, lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config PATH`)
//! 3. `ASDB_*` environment variables (a `.env` file is honoured)
//! 4. command-line flags, applied by the caller
//!
//! ```toml
//! db_path = "/data/asdb/catalog.db"
//! page_size = 50
//! fasta_line_width = 80
//! results_url = "https://antismash-db.secondarymetabolites.org/output"
//! available_limit = 20
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::render::{DEFAULT_RESULTS_URL, RenderOptions, fasta};

pub const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    ParseToml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Catalog database; falls back to the platform data directory.
    pub db_path: Option<PathBuf>,
    /// Rows per page when a request does not say.
    pub page_size: usize,
    pub fasta_line_width: usize,
    /// Base URL for per-region result pages in cluster exports.
    pub results_url: String,
    /// Maximum number of suggestions from `available`.
    pub available_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            page_size: 50,
            fasta_line_width: fasta::DEFAULT_LINE_WIDTH,
            results_url: DEFAULT_RESULTS_URL.to_string(),
            available_limit: 20,
        }
    }
}

impl SearchConfig {
    /// Load from `path` (or the default location when `None`), then apply
    /// environment overrides. A missing default file is not an error; a
    /// missing explicit file is.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config file");
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Override fields from `ASDB_*` environment variables. Unparsable
    /// numbers are ignored.
    pub fn apply_env(&mut self) {
        if let Ok(path) = dotenvy::var("ASDB_DB") {
            self.db_path = Some(PathBuf::from(path));
        }

        if let Ok(val) = dotenvy::var("ASDB_PAGE_SIZE")
            && let Ok(n) = val.parse::<usize>()
        {
            self.page_size = n;
        }

        if let Ok(val) = dotenvy::var("ASDB_FASTA_LINE_WIDTH")
            && let Ok(n) = val.parse::<usize>()
        {
            self.fasta_line_width = n;
        }

        if let Ok(url) = dotenvy::var("ASDB_RESULTS_URL") {
            self.results_url = url;
        }

        if let Ok(val) = dotenvy::var("ASDB_AVAILABLE_LIMIT")
            && let Ok(n) = val.parse::<usize>()
        {
            self.available_limit = n;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Validation("page_size must be positive".into()));
        }
        if self.results_url.trim().is_empty() {
            return Err(ConfigError::Validation("results_url must not be empty".into()));
        }
        Ok(())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            line_width: self.fasta_line_width,
            results_url: self.results_url.clone(),
        }
    }
}

/// `<config_dir>/config.toml` for this application, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "antismash", "asdb-search")
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_KEYS: [&str; 5] = [
        "ASDB_DB",
        "ASDB_PAGE_SIZE",
        "ASDB_FASTA_LINE_WIDTH",
        "ASDB_RESULTS_URL",
        "ASDB_AVAILABLE_LIMIT",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            // SAFETY: tests touching the environment are serialized.
            unsafe { std::env::remove_var(key) };
        }
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = SearchConfig::from_toml("page_size = 10\n").unwrap();
        assert_eq!(cfg.page_size, 10);
        assert_eq!(cfg.fasta_line_width, 80);
        assert_eq!(cfg.results_url, DEFAULT_RESULTS_URL);
    }

    #[test]
    fn malformed_toml_is_reported() {
        let err = SearchConfig::from_toml("page_size = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::ParseToml(_)));
    }

    #[test]
    #[serial]
    fn env_overrides_file_values() {
        clear_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "page_size = 10\nfasta_line_width = 60\n").unwrap();
        unsafe {
            std::env::set_var("ASDB_PAGE_SIZE", "25");
            std::env::set_var("ASDB_FASTA_LINE_WIDTH", "not-a-number");
        }
        let cfg = SearchConfig::load(Some(&path)).unwrap();
        clear_env();
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.fasta_line_width, 60);
    }

    #[test]
    #[serial]
    fn explicit_missing_file_is_an_error() {
        clear_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let err = SearchConfig::load(Some(&tmp.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    #[serial]
    fn zero_page_size_fails_validation() {
        clear_env();
        unsafe { std::env::set_var("ASDB_PAGE_SIZE", "0") };
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "").unwrap();
        let err = SearchConfig::load(Some(&path)).unwrap_err();
        clear_env();
        assert!(matches!(err, ConfigError::Validation(_)));
    }
}
