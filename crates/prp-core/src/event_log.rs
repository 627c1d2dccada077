//! Daily JSON event logs under `logs/`.
//!
//! Every log file is a JSON array. Appending reads the whole array (a missing
//! or corrupt file counts as empty), pushes one record, and rewrites the file.
//! There is no locking; the host runs hooks one at a time.

use crate::error::Result;
use crate::{io, paths};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolUsageRecord {
    pub timestamp: String,
    pub session_id: String,
    pub tool_name: String,
    pub success: bool,
}

/// One submitted prompt. Baseline records (optimizations switched off) carry
/// only the original prompt and its length.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptRecord {
    pub timestamp: String,
    pub session_id: String,
    pub original_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_prompt: Option<String>,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub original_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressed_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_savings: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_simple_query: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization_applied: Option<bool>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optimization_disabled: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub baseline_mode: bool,
}

impl PromptRecord {
    pub fn is_baseline(&self) -> bool {
        self.optimization_disabled || self.baseline_mode
    }
}

/// Lifecycle events without a payload of their own (pre-compact, stop).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub timestamp: String,
    pub session_id: String,
    pub hook_event_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

// ---------------------------------------------------------------------------
// Append / load
// ---------------------------------------------------------------------------

/// Append `record` to the JSON array at `path`. Returns the new length.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<usize> {
    let mut entries = load_raw(path);
    entries.push(serde_json::to_value(record)?);
    io::write_json(path, &entries)?;
    Ok(entries.len())
}

fn load_raw(path: &Path) -> Vec<Value> {
    match io::read_json::<Vec<Value>>(path) {
        Ok(entries) => entries.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "discarding unreadable log");
            Vec::new()
        }
    }
}

/// Records from `path` that deserialize as `T`; anything else is skipped.
pub fn load<T: for<'de> Deserialize<'de>>(path: &Path) -> Vec<T> {
    load_raw(path)
        .into_iter()
        .filter_map(|v| serde_json::from_value(v).ok())
        .collect()
}

/// Today's file for a daily log, in local time.
pub fn today_path(root: &Path, prefix: &str) -> PathBuf {
    paths::daily_log_path(root, prefix, Local::now().date_naive())
}

/// Prompt records from the last `days` daily files, oldest day first.
pub fn load_prompt_history(root: &Path, today: NaiveDate, days: u32) -> Vec<PromptRecord> {
    let mut all = Vec::new();
    for offset in (0..days).rev() {
        let Some(date) = today.checked_sub_days(chrono::Days::new(u64::from(offset))) else {
            continue;
        };
        let path = paths::daily_log_path(root, paths::USER_PROMPTS_LOG, date);
        if path.exists() {
            all.extend(load::<PromptRecord>(&path));
        }
    }
    all
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
