//! Reader for the host's native JSONL conversation transcripts.
//!
//! Transcripts live under `~/.claude/projects/<mangled-cwd>/<session>.jsonl`,
//! one JSON object per line. Lines are read leniently: anything that fails to
//! parse is skipped with a warning.

use crate::config::{Config, CostConfig};
use crate::error::{PrpError, Result};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Message bodies longer than this are cut in rendered logs.
pub const MAX_RENDERED_CONTENT: usize = 2000;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_creation_input_tokens: u64,
    #[serde(default)]
    pub cache_read_input_tokens: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenTotals {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub cache_creation_input_tokens: u64,
    pub cache_read_input_tokens: u64,
    pub total: u64,
}

impl TokenTotals {
    fn add(&mut self, usage: &Usage) {
        self.input_tokens = self.input_tokens.saturating_add(usage.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(usage.output_tokens);
        self.cache_creation_input_tokens = self
            .cache_creation_input_tokens
            .saturating_add(usage.cache_creation_input_tokens);
        self.cache_read_input_tokens = self
            .cache_read_input_tokens
            .saturating_add(usage.cache_read_input_tokens);
        self.total = self
            .input_tokens
            .saturating_add(self.output_tokens)
            .saturating_add(self.cache_creation_input_tokens)
            .saturating_add(self.cache_read_input_tokens);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub timestamp: Option<String>,
    pub role: Option<String>,
    /// Text blocks joined with spaces; tool blocks become `[TOOL: name]` / `[TOOL_RESULT]`.
    pub content: String,
    #[serde(rename = "type")]
    pub entry_type: Option<String>,
    pub uuid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<Usage>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    pub session_id: Option<String>,
    pub messages: Vec<TranscriptMessage>,
    pub total_tokens: TokenTotals,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub project_path: Option<String>,
    pub git_branch: Option<String>,
}

impl Conversation {
    pub fn from_entries(entries: &[Value]) -> Self {
        let mut conv = Conversation::default();
        let text = |entry: &Value, key: &str| entry.get(key).and_then(Value::as_str).map(String::from);

        for entry in entries {
            if conv.session_id.is_none() {
                conv.session_id = text(entry, "sessionId");
            }
            if conv.project_path.is_none() {
                conv.project_path = text(entry, "cwd");
            }
            if conv.git_branch.is_none() {
                conv.git_branch = text(entry, "gitBranch");
            }

            // RFC 3339 strings with a shared offset order lexicographically.
            if let Some(ts) = text(entry, "timestamp") {
                if conv.start_time.as_ref().map_or(true, |s| ts < *s) {
                    conv.start_time = Some(ts.clone());
                }
                if conv.end_time.as_ref().map_or(true, |e| ts > *e) {
                    conv.end_time = Some(ts);
                }
            }

            let Some(msg) = entry.get("message").filter(|m| m.is_object()) else {
                continue;
            };
            let token_usage = msg
                .get("usage")
                .and_then(|u| serde_json::from_value::<Usage>(u.clone()).ok());
            if let Some(usage) = &token_usage {
                conv.total_tokens.add(usage);
            }
            conv.messages.push(TranscriptMessage {
                timestamp: text(entry, "timestamp"),
                role: text(msg, "role"),
                content: flatten_content(msg.get("content").unwrap_or(&Value::Null)),
                entry_type: text(entry, "type"),
                uuid: text(entry, "uuid"),
                token_usage,
            });
        }
        conv
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn estimate_cost(&self, cost: &CostConfig) -> f64 {
        cost.estimate(self.total_tokens.total)
    }

    /// Per-tool `tool_use` counts across assistant messages in raw entries.
    pub fn tool_counts(entries: &[Value]) -> Vec<(String, usize)> {
        let mut counts: std::collections::BTreeMap<String, usize> = Default::default();
        for entry in entries {
            let msg = message_of(entry);
            if msg.get("role").and_then(Value::as_str) != Some("assistant") {
                continue;
            }
            let Some(blocks) = msg.get("content").and_then(Value::as_array) else {
                continue;
            };
            for block in blocks {
                if block.get("type").and_then(Value::as_str) == Some("tool_use") {
                    let name = block.get("name").and_then(Value::as_str).unwrap_or("unknown");
                    *counts.entry(name.to_string()).or_default() += 1;
                }
            }
        }
        let mut sorted: Vec<_> = counts.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }
}

/// The message object of a transcript entry; bare messages are their own.
pub fn message_of(entry: &Value) -> &Value {
    entry.get("message").filter(|m| m.is_object()).unwrap_or(entry)
}

/// Readable text of a message `content` field (string or block list).
pub fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| match block.get("type").and_then(Value::as_str) {
                Some("text") => Some(
                    block
                        .get("text")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                ),
                Some("tool_use") => Some(format!(
                    "[TOOL: {}]",
                    block.get("name").and_then(Value::as_str).unwrap_or("unknown_tool")
                )),
                Some("tool_result") => Some("[TOOL_RESULT]".to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" "),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Locating and parsing transcripts
// ---------------------------------------------------------------------------

/// `~/.claude/projects`, unless the config names another base.
pub fn projects_base(config: &Config) -> Result<PathBuf> {
    if let Some(p) = &config.transcripts.projects_path {
        return Ok(p.clone());
    }
    let home = home::home_dir().ok_or(PrpError::HomeNotFound)?;
    Ok(home.join(".claude").join("projects"))
}

/// Directory name the host uses for a project: every character other than
/// ASCII letters, digits, and `-` becomes `-`.
pub fn project_dir_name(cwd: &Path) -> String {
    cwd.to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect()
}

fn modified(path: &Path) -> SystemTime {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .unwrap_or(SystemTime::UNIX_EPOCH)
}

fn newest_jsonl(dir: &Path) -> Option<PathBuf> {
    std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|ext| ext == "jsonl").unwrap_or(false))
        .max_by_key(|p| modified(p))
}

/// [`locate`] using the configured (or home-derived) projects base.
pub fn locate_for(config: &Config, cwd: &Path) -> Result<PathBuf> {
    locate(&projects_base(config)?, cwd)
}

/// Newest transcript for `cwd`: its own project directory first, then the
/// newest transcript of any project under `base`.
pub fn locate(base: &Path, cwd: &Path) -> Result<PathBuf> {
    let own = base.join(project_dir_name(cwd));
    if let Some(found) = newest_jsonl(&own) {
        return Ok(found);
    }
    let fallback = std::fs::read_dir(base)
        .ok()
        .into_iter()
        .flatten()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .filter_map(|dir| newest_jsonl(&dir))
        .max_by_key(|p| modified(p));
    fallback.ok_or_else(|| PrpError::TranscriptNotFound(base.display().to_string()))
}

/// Locate, read, and fold the newest transcript for `cwd`.
pub fn load_current(config: &Config, cwd: &Path) -> Result<(PathBuf, Conversation)> {
    let path = locate_for(config, cwd)?;
    let entries = parse_jsonl(&path)?;
    Ok((path, Conversation::from_entries(&entries)))
}

/// Parse a JSONL file, skipping blank and malformed lines.
pub fn parse_jsonl(path: &Path) -> Result<Vec<Value>> {
    let data = std::fs::read_to_string(path)?;
    let mut entries = Vec::new();
    for (idx, line) in data.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(line) {
            Ok(v) => entries.push(v),
            Err(e) => {
                tracing::warn!(line = idx + 1, path = %path.display(), error = %e, "malformed transcript line");
            }
        }
    }
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// `1234567` → `"1,234,567"`.
pub fn with_commas(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn display_time(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

/// Lines of the short block used for `logs/token_summary.txt` and
/// `transcript --summary`.
pub fn summary_lines(conv: &Conversation, cost: &CostConfig) -> Vec<String> {
    vec![
        format!("Session: {}", conv.session_id.as_deref().unwrap_or("Unknown")),
        format!("Messages: {}", conv.message_count()),
        format!("Total Tokens: {}", with_commas(conv.total_tokens.total)),
        format!("Estimated Cost: ${:.6}", conv.estimate_cost(cost)),
    ]
}

pub fn summary_text(conv: &Conversation, cost: &CostConfig) -> String {
    summary_lines(conv, cost).join("\n")
}

/// Full markdown conversation log.
pub fn render_log(conv: &Conversation, cost: &CostConfig) -> String {
    let or_unknown = |v: &Option<String>| v.clone().unwrap_or_else(|| "Unknown".to_string());
    let tokens = &conv.total_tokens;
    let mut out = Vec::new();

    out.push("# Conversation Log".to_string());
    out.push(format!("Session ID: {}", or_unknown(&conv.session_id)));
    out.push(format!("Project: {}", or_unknown(&conv.project_path)));
    out.push(format!("Git Branch: {}", or_unknown(&conv.git_branch)));
    out.push(format!("Start Time: {}", or_unknown(&conv.start_time)));
    out.push(format!("End Time: {}", or_unknown(&conv.end_time)));
    out.push(String::new());

    out.push("## Token Usage Summary".to_string());
    out.push(format!("- Input Tokens: {}", with_commas(tokens.input_tokens)));
    out.push(format!("- Output Tokens: {}", with_commas(tokens.output_tokens)));
    out.push(format!(
        "- Cache Creation: {}",
        with_commas(tokens.cache_creation_input_tokens)
    ));
    out.push(format!("- Cache Read: {}", with_commas(tokens.cache_read_input_tokens)));
    out.push(format!("- **Total Tokens: {}**", with_commas(tokens.total)));
    out.push(format!("- **Estimated Cost: ${:.6}**", conv.estimate_cost(cost)));
    out.push(String::new());

    out.push(format!("## Conversation ({} messages)", conv.message_count()));
    out.push(String::new());

    for (i, msg) in conv.messages.iter().enumerate() {
        let when = msg
            .timestamp
            .as_deref()
            .map(display_time)
            .unwrap_or_else(|| "Unknown".to_string());
        let role = msg.role.as_deref().unwrap_or("unknown").to_uppercase();
        out.push(format!("### Message {} - {role} [{when}]", i + 1));
        if let Some(usage) = &msg.token_usage {
            out.push(format!(
                "*Tokens: {} in + {} out*",
                usage.input_tokens, usage.output_tokens
            ));
        }
        out.push(String::new());

        let total_chars = msg.content.chars().count();
        if total_chars > MAX_RENDERED_CONTENT {
            let cut: String = msg.content.chars().take(MAX_RENDERED_CONTENT).collect();
            out.push(format!("{cut}..."));
            out.push(format!("*[Content truncated - {total_chars} total characters]*"));
        } else {
            out.push(msg.content.clone());
        }
        out.push(String::new());
        out.push("---".to_string());
        out.push(String::new());
    }

    out.join("\n")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
