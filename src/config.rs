//! Corpus configuration with layered resolution.
//!
//! Resolution order (highest priority first):
//! 1. CLI flags (applied via `apply_cli_overrides`)
//! 2. Environment variables (`MIMIC_*`)
//! 3. An explicit config file passed by the caller
//! 4. User config (`~/.mimic/config.toml`)
//! 5. Compiled defaults

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "mimic";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming the MIMIC-III SQLite database.
pub const ENV_DB: &str = "MIMIC_DB";
/// Environment variable naming the parse cache directory.
pub const ENV_CACHE_DIR: &str = "MIMIC_CACHE_DIR";
/// Environment variable with the number of pre-warm workers.
pub const ENV_WORKERS: &str = "MIMIC_WORKERS";

/// Default `tracing` filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "mimic=info,mimic_lib=info,warn"
}

/// Get the application data directory (`~/.mimic/`).
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".mimic")
}

/// Default directory holding cached admission and note parses.
pub fn default_cache_dir() -> PathBuf {
    app_data_dir().join("cache")
}

fn user_config_path() -> PathBuf {
    app_data_dir().join("config.toml")
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid config {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Invalid value for {field}: {message}")]
    ValidationFailed { field: String, message: String },

    #[error("No database configured (set database.path, MIMIC_DB or --db)")]
    MissingDatabase,
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path to the MIMIC-III SQLite database file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory of the disk-backed stashes.
    pub dir: Option<PathBuf>,
    /// Worker threads used when pre-warming the cache.
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Note category (i.e. `Radiology`) to section extractor name.  Entries
    /// replace the compiled mapping for the same category.
    pub categories: BTreeMap<String, String>,
    /// Create only unsectioned notes.
    pub default_only: Option<bool>,
}

/// How section text is split into paragraphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphStrategy {
    /// Blank line separated blocks.
    Whitespace,
    #[default]
    Chunking,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParagraphConfig {
    pub factory: Option<ParagraphStrategy>,
    pub min_sent_len: Option<usize>,
    pub min_list_norm_matches: Option<usize>,
    pub max_sent_list_len: Option<usize>,
    pub include_section_headers: Option<bool>,
    pub filter_sent_text: Option<BTreeSet<String>>,
}

/// Top-level configuration aggregating all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MimicConfig {
    pub database: DatabaseConfig,
    pub cache: CacheConfig,
    pub notes: NotesConfig,
    pub paragraph: ParagraphConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub db_path: Option<PathBuf>,
    pub cache_dir: Option<PathBuf>,
    pub workers: Option<usize>,
}

// ═══════════════════════════════════════════════════════════
// Resolution
// ═══════════════════════════════════════════════════════════

impl MimicConfig {
    /// Load configuration with layered resolution.
    pub fn load(
        config_file: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let user_path = user_config_path();
        if user_path.exists() {
            Self::merge_toml_file(&mut config, &user_path)?;
        }

        if let Some(path) = config_file {
            Self::merge_toml_file(&mut config, path)?;
        }

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;

        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;
        tracing::debug!(?config, "Resolved configuration");
        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    fn merge_toml_file(config: &mut MimicConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        let file_config: MimicConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; only values set in `other` win.
    fn merge(base: &mut MimicConfig, other: &MimicConfig) {
        if other.database.path.is_some() {
            base.database.path = other.database.path.clone();
        }
        if other.cache.dir.is_some() {
            base.cache.dir = other.cache.dir.clone();
        }
        if other.cache.workers.is_some() {
            base.cache.workers = other.cache.workers;
        }
        for (category, extractor) in &other.notes.categories {
            base.notes
                .categories
                .insert(category.clone(), extractor.clone());
        }
        if other.notes.default_only.is_some() {
            base.notes.default_only = other.notes.default_only;
        }

        let (bp, op) = (&mut base.paragraph, &other.paragraph);
        if op.factory.is_some() {
            bp.factory = op.factory;
        }
        if op.min_sent_len.is_some() {
            bp.min_sent_len = op.min_sent_len;
        }
        if op.min_list_norm_matches.is_some() {
            bp.min_list_norm_matches = op.min_list_norm_matches;
        }
        if op.max_sent_list_len.is_some() {
            bp.max_sent_list_len = op.max_sent_list_len;
        }
        if op.include_section_headers.is_some() {
            bp.include_section_headers = op.include_section_headers;
        }
        if op.filter_sent_text.is_some() {
            bp.filter_sent_text = op.filter_sent_text.clone();
        }
    }

    /// Apply `MIMIC_*` overrides read through `lookup`.
    pub fn apply_env_overrides(
        config: &mut MimicConfig,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(db) = lookup(ENV_DB) {
            config.database.path = Some(PathBuf::from(db));
        }
        if let Some(dir) = lookup(ENV_CACHE_DIR) {
            config.cache.dir = Some(PathBuf::from(dir));
        }
        if let Some(workers) = lookup(ENV_WORKERS) {
            let n = workers
                .trim()
                .parse::<usize>()
                .map_err(|e| ConfigError::ValidationFailed {
                    field: ENV_WORKERS.to_string(),
                    message: e.to_string(),
                })?;
            config.cache.workers = Some(n);
        }
        Ok(())
    }

    pub fn apply_cli_overrides(config: &mut MimicConfig, cli: &CliOverrides) {
        if cli.db_path.is_some() {
            config.database.path = cli.db_path.clone();
        }
        if cli.cache_dir.is_some() {
            config.cache.dir = cli.cache_dir.clone();
        }
        if cli.workers.is_some() {
            config.cache.workers = cli.workers;
        }
    }

    pub fn validate(config: &MimicConfig) -> Result<(), ConfigError> {
        if config.cache.workers == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "cache.workers".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if config.paragraph.max_sent_list_len == Some(0) {
            return Err(ConfigError::ValidationFailed {
                field: "paragraph.max_sent_list_len".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    // ── Resolved values ──────────────────────────────────

    pub fn db_path(&self) -> Result<&Path, ConfigError> {
        self.database
            .path
            .as_deref()
            .ok_or(ConfigError::MissingDatabase)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.cache.dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Worker count, defaulting to the available parallelism.
    pub fn workers(&self) -> usize {
        self.cache.workers.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}
