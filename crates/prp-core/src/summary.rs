//! Conversation summary for handing a project over to the next session.
//!
//! The summary is rebuilt from the latest transcript on every run and merged
//! with the previous document by plain concatenation, so the file grows into
//! a history of sessions.

use crate::error::Result;
use crate::transcript::{self, Conversation};
use crate::{io, paths};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

pub const NO_TRANSCRIPT: &str = "No conversation file found for analysis.";
pub const NO_MESSAGES: &str = "No messages found in conversation file.";

const MAX_TOPICS: usize = 10;
const OVERVIEW_MARKER: &str = "## Overview";

const PHASE_WORDS: &[&str] = &["implement", "create", "build", "add"];
const ACCOMPLISHMENT_WORDS: &[&str] = &["perfect", "great", "excellent", "works", "good"];
const ISSUE_WORDS: &[&str] = &["error", "issue", "problem", "not working", "fix"];

// ---------------------------------------------------------------------------
// Conversation analysis
// ---------------------------------------------------------------------------

/// Text of a user entry: the string content, or the first block's `text`.
fn user_text(entry: &Value) -> Option<String> {
    let msg = transcript::message_of(entry);
    if msg.get("role").and_then(Value::as_str) != Some("user") {
        return None;
    }
    match msg.get("content") {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Array(blocks)) => blocks.first().map(|b| match b {
            Value::Object(_) => b.get("text").and_then(Value::as_str).unwrap_or("").to_string(),
            other => other.to_string(),
        }),
        _ => None,
    }
}

fn prefix_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// First sentence (at most 100 chars) of each user message over 20 chars.
pub fn extract_topics(entries: &[Value]) -> Vec<String> {
    entries
        .iter()
        .filter_map(user_text)
        .filter(|text| text.chars().count() > 20)
        .filter_map(|text| {
            let first = text.split('.').next().unwrap_or("");
            let topic = prefix_chars(first, 100).trim().to_string();
            (topic.chars().count() > 10).then_some(topic)
        })
        .take(MAX_TOPICS)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlowAnalysis {
    pub phases: Vec<String>,
    pub accomplishments: Vec<String>,
    pub issues: Vec<String>,
}

/// Bucket user messages into phases, accomplishments, and issues.
///
/// A substantial request (over 50 chars) mentioning one of the phase words
/// opens a new phase. Praise counts as an accomplishment only after more
/// than two entries in the current phase.
pub fn analyze_flow(entries: &[Value]) -> FlowAnalysis {
    let mut flow = FlowAnalysis::default();
    let mut current_phase: Option<String> = None;
    let mut phase_len = 0usize;

    for entry in entries {
        if let Some(text) = user_text(entry) {
            let lowered = text.to_lowercase();

            if contains_any(&lowered, PHASE_WORDS) && text.chars().count() > 50 {
                let phase = prefix_chars(&text, 100).trim().to_string();
                flow.phases.push(phase.clone());
                current_phase = Some(phase);
                phase_len = 0;
            }

            if contains_any(&lowered, ACCOMPLISHMENT_WORDS) && phase_len > 2 {
                flow.accomplishments.push(
                    current_phase
                        .clone()
                        .unwrap_or_else(|| "Task completed".to_string()),
                );
            }

            if contains_any(&lowered, ISSUE_WORDS) {
                flow.issues.push(prefix_chars(&text, 150).trim().to_string());
            }
        }
        phase_len += 1;
    }
    flow
}

// ---------------------------------------------------------------------------
// Git working-tree changes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FileChanges {
    pub created: Vec<String>,
    pub modified: Vec<String>,
    pub deleted: Vec<String>,
}

impl FileChanges {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Parse `git status --porcelain` output. Untracked files count as created.
pub fn parse_porcelain(output: &str) -> FileChanges {
    let mut changes = FileChanges::default();
    for line in output.lines() {
        if line.len() < 4 {
            continue;
        }
        let (status, path) = (&line[..2], line[3..].to_string());
        if status.contains('A') || status == "??" {
            changes.created.push(path);
        } else if status.contains('M') {
            changes.modified.push(path);
        } else if status.contains('D') {
            changes.deleted.push(path);
        }
    }
    changes
}

/// Working-tree changes under `root`; empty when git is missing or `root`
/// is not a repository.
pub fn git_changes(root: &Path) -> FileChanges {
    let output = std::process::Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(root)
        .output();
    match output {
        Ok(out) if out.status.success() => parse_porcelain(&String::from_utf8_lossy(&out.stdout)),
        Ok(out) => {
            tracing::debug!(status = %out.status, "git status failed");
            FileChanges::default()
        }
        Err(e) => {
            tracing::debug!(error = %e, "git not available");
            FileChanges::default()
        }
    }
}

/// Guess what a newly created file is for from its name.
pub fn file_purpose(path: &str) -> &'static str {
    if path.contains("hook") {
        "Hook for automatic triggering"
    } else if path.contains("script") {
        "Utility script"
    } else if path.contains("command") {
        "Slash command definition"
    } else if path.ends_with(".md") {
        "Documentation and user guidance"
    } else if path.ends_with(".json") || path.ends_with(".yaml") || path.ends_with(".toml") {
        "Configuration and settings"
    } else if path.ends_with(".sh") {
        "Setup and installation script"
    } else {
        "Project file"
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionSummary {
    pub markdown: String,
    pub message_count: usize,
    pub session_id: String,
}

fn push_list(out: &mut Vec<String>, heading: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    out.push(format!("### {heading}"));
    for item in items {
        out.push(format!("- {item}"));
    }
    out.push(String::new());
}

/// Build the summary for `transcript_path` (or the placeholder note when
/// there is none). `root` is the project the git changes are read from.
pub fn generate(
    root: &Path,
    transcript_path: Option<&Path>,
    trigger: &str,
    now: DateTime<Local>,
) -> SessionSummary {
    let Some(path) = transcript_path else {
        return SessionSummary {
            markdown: NO_TRANSCRIPT.to_string(),
            message_count: 0,
            session_id: "unknown".to_string(),
        };
    };
    let session_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string());

    let entries = match transcript::parse_jsonl(path) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, path = %path.display(), "could not read transcript");
            Vec::new()
        }
    };
    if entries.is_empty() {
        return SessionSummary {
            markdown: NO_MESSAGES.to_string(),
            message_count: 0,
            session_id,
        };
    }

    let conv = Conversation::from_entries(&entries);
    let markdown = render(
        root,
        &conv,
        &entries,
        &git_changes(root),
        trigger,
        now,
    );
    SessionSummary {
        markdown,
        message_count: entries.len(),
        session_id,
    }
}

/// The markdown body of a summary.
pub fn render(
    root: &Path,
    conv: &Conversation,
    entries: &[Value],
    changes: &FileChanges,
    trigger: &str,
    now: DateTime<Local>,
) -> String {
    let stamp = now.format("%Y-%m-%d %H:%M:%S").to_string();
    let tokens = &conv.total_tokens;
    let mut out = Vec::new();

    out.push(format!("# Project Summary - {stamp}"));
    out.push(String::new());
    out.push("*For next session context - what was built and what you need to know*".to_string());
    out.push(String::new());

    out.push(OVERVIEW_MARKER.to_string());
    out.push(String::new());
    out.push(format!("- Project: `{}`", root.display()));
    out.push(format!(
        "- Session: `{}`",
        conv.session_id.as_deref().unwrap_or("unknown")
    ));
    if let Some(branch) = &conv.git_branch {
        out.push(format!("- Git branch: `{branch}`"));
    }
    out.push(format!("- Messages: {}", conv.message_count()));
    out.push(format!(
        "- Tokens: {} ({} in, {} out, {} cache)",
        transcript::with_commas(tokens.total),
        transcript::with_commas(tokens.input_tokens),
        transcript::with_commas(tokens.output_tokens),
        transcript::with_commas(
            tokens.cache_creation_input_tokens + tokens.cache_read_input_tokens
        ),
    ));
    out.push(String::new());

    out.push("## Tools Used".to_string());
    out.push(String::new());
    let tools = Conversation::tool_counts(entries);
    if tools.is_empty() {
        out.push("- None recorded".to_string());
    }
    for (name, count) in tools {
        out.push(format!("- **{name}**: {count}"));
    }
    out.push(String::new());

    let topics: Vec<String> = extract_topics(entries)
        .into_iter()
        .filter(|t| t.chars().count() > 30 && !t.starts_with('<'))
        .take(3)
        .collect();
    if !topics.is_empty() {
        out.push("## Recent User Requests Addressed".to_string());
        out.push(String::new());
        for (i, topic) in topics.iter().enumerate() {
            out.push(format!("{}. {topic}", i + 1));
        }
        out.push(String::new());
    }

    let flow = analyze_flow(entries);
    if flow != FlowAnalysis::default() {
        out.push("## Session Flow".to_string());
        out.push(String::new());
        push_list(&mut out, "Phases", &flow.phases);
        push_list(&mut out, "Accomplishments", &flow.accomplishments);
        push_list(&mut out, "Issues Raised", &flow.issues);
    }

    out.push("## Key Files Created/Modified".to_string());
    out.push(String::new());
    if changes.is_empty() {
        out.push("- No working-tree changes detected".to_string());
        out.push(String::new());
    } else {
        let created: Vec<String> = changes
            .created
            .iter()
            .map(|f| format!("**`{f}`** - {}", file_purpose(f)))
            .collect();
        let modified: Vec<String> = changes.modified.iter().map(|f| format!("**`{f}`**")).collect();
        let deleted: Vec<String> = changes.deleted.iter().map(|f| format!("`{f}`")).collect();
        push_list(&mut out, "New Components", &created);
        push_list(&mut out, "Modified Files", &modified);
        push_list(&mut out, "Deleted Files", &deleted);
    }

    out.push("---".to_string());
    out.push(format!("*Generated automatically at {stamp} via {trigger} trigger*"));
    out.push(String::new());
    out.join("\n")
}

fn after_overview(doc: &str) -> &str {
    doc.split_once(OVERVIEW_MARKER).map(|(_, rest)| rest).unwrap_or(doc)
}

/// Concatenate the new summary with the previous document.
pub fn merge(new_summary: &str, existing: Option<&str>, now: DateTime<Local>) -> String {
    let Some(existing) = existing.filter(|e| !e.is_empty()) else {
        return new_summary.to_string();
    };
    let stamp = now.format("%Y-%m-%d %H:%M:%S");
    format!(
        "# Conversation Summary - Updated {stamp}\n\n\
         *This summary tracks the evolution of the conversation across multiple updates*\n\n\
         ## Latest Session Update\n\n\
         {}\n\n\
         ---\n\n\
         ## Previous Session History\n\n\
         {}\n\n\
         ---\n\n\
         *Summary file updated automatically by the prp logging hooks*\n",
        after_overview(new_summary),
        after_overview(existing),
    )
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryFormat {
    #[default]
    Markdown,
    Json,
    Both,
}

impl SummaryFormat {
    fn markdown(self) -> bool {
        matches!(self, SummaryFormat::Markdown | SummaryFormat::Both)
    }

    fn json(self) -> bool {
        matches!(self, SummaryFormat::Json | SummaryFormat::Both)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub timestamp: String,
    pub trigger: String,
    pub summary: String,
    pub project_root: String,
    pub message_count: usize,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WrittenSummary {
    /// The merged document.
    pub content: String,
    pub markdown_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

/// Merge `summary` into `.claude/logs/<output_file>` and/or append it to the
/// JSON history, per `format`.
pub fn write(
    root: &Path,
    output_file: &str,
    summary: &SessionSummary,
    format: SummaryFormat,
    trigger: &str,
    now: DateTime<Local>,
) -> Result<WrittenSummary> {
    let dir = paths::claude_logs_dir(root);
    io::ensure_dir(&dir)?;
    let md_path = dir.join(output_file);

    let existing = match std::fs::read_to_string(&md_path) {
        Ok(s) => Some(s),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(error = %e, path = %md_path.display(), "could not read existing summary");
            None
        }
    };
    let content = merge(&summary.markdown, existing.as_deref(), now);

    let mut written = WrittenSummary {
        content,
        markdown_path: None,
        json_path: None,
    };

    if format.markdown() {
        io::atomic_write(&md_path, written.content.as_bytes())?;
        written.markdown_path = Some(md_path);
    }

    if format.json() {
        let json_path = dir.join(paths::SUMMARY_JSON);
        // Older histories may hold a single object instead of an array.
        let mut history: Vec<Value> = match io::read_json::<Value>(&json_path) {
            Ok(Some(Value::Array(items))) => items,
            Ok(Some(obj @ Value::Object(_))) => vec![obj],
            Ok(_) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable summary history");
                Vec::new()
            }
        };
        let record = SummaryRecord {
            timestamp: now.to_rfc3339(),
            trigger: trigger.to_string(),
            summary: written.content.clone(),
            project_root: root.display().to_string(),
            message_count: summary.message_count,
            session_id: summary.session_id.clone(),
        };
        history.push(serde_json::to_value(&record)?);
        io::write_json(&json_path, &history)?;
        written.json_path = Some(json_path);
    }

    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
