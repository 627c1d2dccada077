use chrono::NaiveDate;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const LOGS_DIR: &str = "logs";
pub const CLAUDE_DIR: &str = ".claude";
pub const CACHE_DIR: &str = ".claude/cache";
pub const CLAUDE_LOGS_DIR: &str = ".claude/logs";
pub const ARCHIVE_DIR: &str = ".claude/logs/archive";

pub const PRPS_DIR: &str = "PRPs";
pub const AI_DOCS_DIR: &str = "PRPs/ai_docs";

pub const CONFIG_FILE: &str = ".claude/prp.yaml";
pub const OPTIMIZATION_DISABLED_FLAG: &str = ".claude/.optimization_disabled";

pub const SUMMARY_MD: &str = "CONVERSATION_SUMMARY.md";
pub const SUMMARY_JSON: &str = "CONVERSATION_SUMMARY.json";
pub const TOKEN_SUMMARY_FILE: &str = "token_summary.txt";

// Daily log prefixes: `<prefix>_YYYY-MM-DD.json`
pub const TOOL_USAGE_LOG: &str = "tool_usage";
pub const USER_PROMPTS_LOG: &str = "user_prompts";
pub const COMPACT_EVENTS_LOG: &str = "compact_events";
pub const STOP_EVENTS_LOG: &str = "stop_events";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn logs_dir(root: &Path) -> PathBuf {
    root.join(LOGS_DIR)
}

pub fn daily_log_path(root: &Path, prefix: &str, date: NaiveDate) -> PathBuf {
    logs_dir(root).join(format!("{prefix}_{}.json", date.format("%Y-%m-%d")))
}

pub fn token_summary_path(root: &Path) -> PathBuf {
    logs_dir(root).join(TOKEN_SUMMARY_FILE)
}

pub fn cache_dir(root: &Path) -> PathBuf {
    root.join(CACHE_DIR)
}

pub fn claude_logs_dir(root: &Path) -> PathBuf {
    root.join(CLAUDE_LOGS_DIR)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

/// `.claude/logs/archive/conversation_<session>_<stamp>.md`
pub fn archive_log_path(root: &Path, session_id: &str, stamp: &str) -> PathBuf {
    archive_dir(root).join(format!("conversation_{session_id}_{stamp}.md"))
}

pub fn ai_docs_dir(root: &Path) -> PathBuf {
    root.join(AI_DOCS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn optimization_flag_path(root: &Path) -> PathBuf {
    root.join(OPTIMIZATION_DISABLED_FLAG)
}

/// True when the sentinel file switching off caching and prompt rewriting exists.
pub fn optimization_disabled(root: &Path) -> bool {
    optimization_flag_path(root).exists()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
