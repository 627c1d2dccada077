use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// CacheConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_file_ttl")]
    pub file_ttl_secs: u64,
    #[serde(default = "default_command_ttl")]
    pub command_ttl_secs: u64,
    #[serde(default = "default_search_ttl")]
    pub search_ttl_secs: u64,
    /// Files larger than this are never cached.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// First word of a shell command must be one of these to be cacheable.
    #[serde(default = "default_safe_commands")]
    pub safe_commands: Vec<String>,
    /// Commands mentioning any of these (case-insensitive) are never cached.
    #[serde(default = "default_volatile_keywords")]
    pub volatile_keywords: Vec<String>,
}

fn default_file_ttl() -> u64 {
    300
}

fn default_command_ttl() -> u64 {
    60
}

fn default_search_ttl() -> u64 {
    600
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_safe_commands() -> Vec<String> {
    ["ls", "find", "grep", "wc", "cat", "head", "tail"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_volatile_keywords() -> Vec<String> {
    ["date", "time", "ps", "top", "df"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            file_ttl_secs: default_file_ttl(),
            command_ttl_secs: default_command_ttl(),
            search_ttl_secs: default_search_ttl(),
            max_file_bytes: default_max_file_bytes(),
            safe_commands: default_safe_commands(),
            volatile_keywords: default_volatile_keywords(),
        }
    }
}

// ---------------------------------------------------------------------------
// LoggingConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Refresh `logs/token_summary.txt` every N tool uses in a day's log.
    #[serde(default = "default_token_summary_interval")]
    pub token_summary_interval: usize,
}

fn default_token_summary_interval() -> usize {
    10
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            token_summary_interval: default_token_summary_interval(),
        }
    }
}

// ---------------------------------------------------------------------------
// CostConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostConfig {
    #[serde(default = "default_usd_per_million")]
    pub usd_per_million_tokens: f64,
}

fn default_usd_per_million() -> f64 {
    3.0
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            usd_per_million_tokens: default_usd_per_million(),
        }
    }
}

impl CostConfig {
    pub fn estimate(&self, tokens: u64) -> f64 {
        tokens as f64 * self.usd_per_million_tokens / 1_000_000.0
    }
}

// ---------------------------------------------------------------------------
// TranscriptConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptConfig {
    /// Base directory holding per-project JSONL transcripts.
    /// Defaults to `~/.claude/projects`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub cost: CostConfig,
    #[serde(default)]
    pub transcripts: TranscriptConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    /// Hooks must never fail on a bad config file; fall back to defaults.
    pub fn load_or_default(root: &Path) -> Self {
        match Self::load(root) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable {}", paths::CONFIG_FILE);
                Self::default()
            }
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
