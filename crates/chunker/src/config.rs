use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_TOKEN_LIMIT: usize = 4000;
pub const DEFAULT_MAX_SINGLE_FILE_SIZE: u64 = 4 * BYTES_PER_MIB;
pub const DEFAULT_MAX_TOTAL_FILES_SIZE: u64 = 4 * BYTES_PER_MIB;
pub const DEFAULT_MAX_FILES_PER_CHUNK: usize = 10;

pub const TOKEN_LIMIT_ENV: &str = "PROMPT_CHUNK_TOKEN_LIMIT";
pub const MAX_SINGLE_FILE_SIZE_MB_ENV: &str = "PROMPT_CHUNK_MAX_SINGLE_FILE_SIZE_MB";
pub const MAX_TOTAL_FILES_SIZE_MB_ENV: &str = "PROMPT_CHUNK_MAX_TOTAL_FILES_SIZE_MB";
pub const MAX_FILES_ENV: &str = "PROMPT_CHUNK_MAX_FILES";
pub const SPLIT_STRATEGY_ENV: &str = "PROMPT_CHUNK_SPLIT_STRATEGY";

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Limits applied while packing input into chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum tokens of text in one chunk
    pub token_limit: usize,

    /// Files larger than this (bytes) are dropped, inclusive bound
    pub max_single_file_size: u64,

    /// Cumulative file size cap (bytes) within one chunk
    pub max_total_files_size: u64,

    /// Maximum number of files in one chunk
    pub max_files_per_chunk: usize,

    /// How a single text above the token limit is broken up
    pub split_strategy: SplitStrategy,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            token_limit: DEFAULT_TOKEN_LIMIT,
            max_single_file_size: DEFAULT_MAX_SINGLE_FILE_SIZE,
            max_total_files_size: DEFAULT_MAX_TOTAL_FILES_SIZE,
            max_files_per_chunk: DEFAULT_MAX_FILES_PER_CHUNK,
            split_strategy: SplitStrategy::default(),
        }
    }
}

impl ChunkerConfig {
    /// Read limits from `PROMPT_CHUNK_*` environment variables.
    ///
    /// Missing or unparsable values fall back to the defaults. File sizes are
    /// given in MiB.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ChunkerConfig::from_env`] over an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            token_limit: parse_setting(
                TOKEN_LIMIT_ENV,
                lookup(TOKEN_LIMIT_ENV).as_deref(),
                defaults.token_limit,
            ),
            max_single_file_size: parse_mib_setting(
                MAX_SINGLE_FILE_SIZE_MB_ENV,
                lookup(MAX_SINGLE_FILE_SIZE_MB_ENV).as_deref(),
                defaults.max_single_file_size,
            ),
            max_total_files_size: parse_mib_setting(
                MAX_TOTAL_FILES_SIZE_MB_ENV,
                lookup(MAX_TOTAL_FILES_SIZE_MB_ENV).as_deref(),
                defaults.max_total_files_size,
            ),
            max_files_per_chunk: parse_setting(
                MAX_FILES_ENV,
                lookup(MAX_FILES_ENV).as_deref(),
                defaults.max_files_per_chunk,
            ),
            split_strategy: parse_setting(
                SPLIT_STRATEGY_ENV,
                lookup(SPLIT_STRATEGY_ENV).as_deref(),
                defaults.split_strategy,
            ),
        }
    }

    /// Parse a TOML document; absent keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| ChunkerError::invalid_config(e.to_string()))
    }

    /// Load a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    #[must_use]
    pub const fn with_token_limit(mut self, token_limit: usize) -> Self {
        self.token_limit = token_limit;
        self
    }

    #[must_use]
    pub const fn with_max_single_file_size(mut self, bytes: u64) -> Self {
        self.max_single_file_size = bytes;
        self
    }

    #[must_use]
    pub const fn with_max_total_files_size(mut self, bytes: u64) -> Self {
        self.max_total_files_size = bytes;
        self
    }

    #[must_use]
    pub const fn with_max_files_per_chunk(mut self, max_files: usize) -> Self {
        self.max_files_per_chunk = max_files;
        self
    }

    #[must_use]
    pub const fn with_split_strategy(mut self, strategy: SplitStrategy) -> Self {
        self.split_strategy = strategy;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.token_limit == 0 {
            return Err("token_limit must be > 0".to_string());
        }

        Ok(())
    }
}

/// Convert a MiB count to bytes, saturating
#[must_use]
pub const fn mib_to_bytes(mib: u64) -> u64 {
    mib.saturating_mul(BYTES_PER_MIB)
}

fn parse_setting<T: std::str::FromStr>(name: &str, raw: Option<&str>, default_value: T) -> T {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return default_value;
    };
    match value.parse::<T>() {
        Ok(parsed) => parsed,
        Err(_) => {
            log::warn!("Ignoring invalid {name}={value:?}, using default");
            default_value
        }
    }
}

fn parse_mib_setting(name: &str, raw: Option<&str>, default_bytes: u64) -> u64 {
    let Some(value) = raw.map(str::trim).filter(|v| !v.is_empty()) else {
        return default_bytes;
    };
    match value.parse::<u64>() {
        Ok(mib) => mib_to_bytes(mib),
        Err(_) => {
            log::warn!("Ignoring invalid {name}={value:?}, using default");
            default_bytes
        }
    }
}

/// Strategy for breaking up a single text that exceeds the token limit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Greedy packing of whitespace-delimited words
    #[default]
    Words,

    /// Cut after newlines or `,` `}` `]` where possible, then after whitespace.
    /// Pieces concatenate back to the exact input.
    Natural,
}

impl SplitStrategy {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Words => "words",
            Self::Natural => "natural",
        }
    }
}

impl std::str::FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "words" | "word" => Ok(Self::Words),
            "natural" => Ok(Self::Natural),
            other => Err(format!("unknown split strategy: {other}")),
        }
    }
}
