//! Configuration loading for the blind index.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! Config file lives at ~/.config/blindex/config.toml.

use std::path::PathBuf;

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::TypesError;

/// Tokenizer tuning.
///
/// The prefix expansion (`prefix_chars` for terms of at least
/// `prefix_trigger_chars`) is a recall aid for compound words. Lengths are
/// counted in Unicode scalar values, not bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerSettings {
    /// Runs shorter than this are dropped.
    #[serde(default = "default_min_term_chars")]
    pub min_term_chars: usize,

    /// Runs longer than this are truncated before hashing.
    #[serde(default = "default_max_term_chars")]
    pub max_term_chars: usize,

    /// Terms at least this long also emit a prefix term.
    #[serde(default = "default_prefix_trigger_chars")]
    pub prefix_trigger_chars: usize,

    /// Length of the emitted prefix term.
    #[serde(default = "default_prefix_chars")]
    pub prefix_chars: usize,
}

fn default_min_term_chars() -> usize {
    3
}

fn default_max_term_chars() -> usize {
    128
}

fn default_prefix_trigger_chars() -> usize {
    8
}

fn default_prefix_chars() -> usize {
    6
}

impl Default for TokenizerSettings {
    fn default() -> Self {
        Self {
            min_term_chars: default_min_term_chars(),
            max_term_chars: default_max_term_chars(),
            prefix_trigger_chars: default_prefix_trigger_chars(),
            prefix_chars: default_prefix_chars(),
        }
    }
}

impl TokenizerSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_term_chars == 0 {
            return Err("min_term_chars must be > 0".to_string());
        }
        if self.min_term_chars > self.max_term_chars {
            return Err(format!(
                "min_term_chars ({}) must not exceed max_term_chars ({})",
                self.min_term_chars, self.max_term_chars
            ));
        }
        if self.prefix_chars == 0 || self.prefix_chars >= self.prefix_trigger_chars {
            return Err(format!(
                "prefix_chars must be in 1..prefix_trigger_chars, got {} (trigger {})",
                self.prefix_chars, self.prefix_trigger_chars
            ));
        }
        Ok(())
    }
}

/// Caps on unique hashes. Reaching a cap truncates silently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitSettings {
    /// Unique hashes kept per document.
    #[serde(default = "default_max_document_tokens")]
    pub max_document_tokens: usize,

    /// Unique hashes kept per query.
    #[serde(default = "default_max_query_tokens")]
    pub max_query_tokens: usize,
}

fn default_max_document_tokens() -> usize {
    20_000
}

fn default_max_query_tokens() -> usize {
    32
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_document_tokens: default_max_document_tokens(),
            max_query_tokens: default_max_query_tokens(),
        }
    }
}

impl LimitSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_document_tokens == 0 {
            return Err("max_document_tokens must be > 0".to_string());
        }
        if self.max_query_tokens == 0 {
            return Err("max_query_tokens must be > 0".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB index directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Deployment-wide secret the HMAC key is derived from.
    /// Loaded from env (BLINDEX_SECRET_KEY) or file, never written back out.
    #[serde(default, skip_serializing)]
    pub secret_key: Option<SecretString>,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Documents selected per backfill batch
    #[serde(default = "default_backfill_batch_size")]
    pub backfill_batch_size: usize,

    /// How long a reindex waits for another in-flight reindex of the same document
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    #[serde(default)]
    pub tokenizer: TokenizerSettings,

    #[serde(default)]
    pub limits: LimitSettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "blindex")
        .map(|p| p.data_local_dir().join("index"))
        .unwrap_or_else(|| PathBuf::from("./blindex-index"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_backfill_batch_size() -> usize {
    50
}

fn default_lock_timeout_ms() -> u64 {
    1_000
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            secret_key: None,
            log_level: default_log_level(),
            backfill_batch_size: default_backfill_batch_size(),
            lock_timeout_ms: default_lock_timeout_ms(),
            tokenizer: TokenizerSettings::default(),
            limits: LimitSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/blindex/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (BLINDEX_*, nested keys joined with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, TypesError> {
        let config_dir = ProjectDirs::from("", "", "blindex")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("backfill_batch_size", default_backfill_batch_size() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .set_default("lock_timeout_ms", default_lock_timeout_ms() as i64)
            .map_err(|e| TypesError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // BLINDEX_BACKFILL_BATCH_SIZE, BLINDEX_SECRET_KEY, BLINDEX_TOKENIZER__PREFIX_CHARS, ...
        builder = builder.add_source(
            Environment::with_prefix("BLINDEX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| TypesError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| TypesError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), TypesError> {
        if self.backfill_batch_size == 0 {
            return Err(TypesError::Config(
                "backfill_batch_size must be > 0".to_string(),
            ));
        }
        self.tokenizer.validate().map_err(TypesError::Config)?;
        self.limits.validate().map_err(TypesError::Config)?;
        Ok(())
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(dirs) = BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}
