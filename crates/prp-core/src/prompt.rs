//! Prompt compression and simple-query routing hints.

use crate::cache::ResultCache;
use chrono::{Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Prompts longer than this (after trimming) are never "simple".
pub const SIMPLE_QUERY_MAX_CHARS: usize = 200;

/// How far back the file cache is consulted for context hints.
pub const CONTEXT_WINDOW_SECS: i64 = 300;

/// Maximum number of cached files mentioned in a context hint.
pub const CONTEXT_MAX_FILES: usize = 3;

const CONTEXT_KEYWORDS: &[&str] = &[
    "implement", "create", "build", "modify", "update", "fix", "refactor",
];

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

static SIMPLE_PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
static COMPRESSION_RULES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();

fn simple_patterns() -> &'static [Regex] {
    SIMPLE_PATTERNS.get_or_init(|| {
        [
            r"(?i)^(what|how|why|when|where|who)\s+.*\?$",
            r"(?i)^(is|are|can|will|would|should)\s+.*\?$",
            r"(?i)^(explain|define|describe)\s+.*$",
            r"(?i)^(help|show|tell)\s+(me\s+)?.*$",
            r"(?i)^\w+\s*\+\s*\w+$",
            r"(?i)^ls$|^pwd$|^date$",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

// Applied in order. Whitespace collapses first, so the blank-line rule only
// fires on input the first rule left alone.
fn compression_rules() -> &'static [(Regex, &'static str)] {
    COMPRESSION_RULES.get_or_init(|| {
        [
            (r"\s+", " "),
            (r"(?m)\n\s*\n\s*\n+", "\n\n"),
            (r"(very|really|quite|extremely|incredibly)\s+", ""),
            (r"\b(um|uh|well|you know|like)\b\s*", ""),
        ]
        .iter()
        .map(|(p, r)| (Regex::new(p).unwrap(), *r))
        .collect()
    })
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// True when `text` looks like a short question or one-word command that a
/// smaller model could answer.
pub fn classify(text: &str) -> bool {
    let cleaned = text.trim().to_lowercase();
    if cleaned.chars().count() > SIMPLE_QUERY_MAX_CHARS {
        return false;
    }
    simple_patterns().iter().any(|re| re.is_match(&cleaned))
}

/// One pass of the substitution rules, then trim. Never lengthens the input.
pub fn compress(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in compression_rules() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out.trim().to_string()
}

/// Re-apply [`compress`] until the output stops changing.
pub fn compress_fully(text: &str) -> String {
    let mut current = compress(text);
    loop {
        let next = compress(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

pub fn should_add_context(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CONTEXT_KEYWORDS.iter().any(|k| lowered.contains(k))
}

/// A short list of recently cached files, or an empty string when there are none.
pub fn cached_context(cache: &ResultCache) -> String {
    let recent = cache.recent_files(Duration::seconds(CONTEXT_WINDOW_SECS), Utc::now());
    if recent.is_empty() {
        return String::new();
    }
    let mut context = String::from("\n\nRecent file context (cached):\n");
    for file in recent.iter().take(CONTEXT_MAX_FILES) {
        context.push_str(&format!("- {} ({} chars)\n", file.path, file.size));
    }
    context
}

// ---------------------------------------------------------------------------
// PromptAnalysis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    pub compressed_prompt: String,
    pub original_length: usize,
    pub compressed_length: usize,
    pub token_savings: usize,
    /// Percentage of characters removed, two decimals.
    pub compression_ratio: f64,
    pub is_simple_query: bool,
    pub should_add_context: bool,
}

impl PromptAnalysis {
    pub fn optimization_applied(&self) -> bool {
        self.token_savings > 0
    }
}

pub fn analyze(text: &str) -> PromptAnalysis {
    let compressed = compress(text);
    let original_length = text.chars().count();
    let compressed_length = compressed.chars().count();
    let token_savings = original_length.saturating_sub(compressed_length);
    let compression_ratio = if original_length > 0 {
        (token_savings as f64 / original_length as f64 * 10_000.0).round() / 100.0
    } else {
        0.0
    };
    PromptAnalysis {
        compressed_prompt: compressed,
        original_length,
        compressed_length,
        token_savings,
        compression_ratio,
        is_simple_query: classify(text),
        should_add_context: should_add_context(text),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Descriptor;
    use crate::config::CacheConfig;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn simple_questions_classify_true() {
        for text in [
            "What is a closure?",
            "  how do I exit vim?  ",
            "Is this thread safe?",
            "explain lifetimes",
            "show me the config",
            "2 + 2",
            "pwd",
        ] {
            assert!(classify(text), "expected simple: {text}");
        }
    }

    #[test]
    fn long_or_open_prompts_classify_false() {
        let paragraph = "word ".repeat(60);
        assert_eq!(paragraph.len(), 300);
        assert!(!classify(&paragraph));

        let long_question = format!("what {}?", "x".repeat(250));
        assert!(!classify(&long_question));

        assert!(!classify("Refactor the parser to use a state machine"));
        assert!(!classify("what is this"));
    }

    #[test]
    fn compress_strips_filler_and_whitespace() {
        assert_eq!(
            compress("um   could you   really help  with this"),
            "could you help with this"
        );
        assert_eq!(compress("it is very\n\n\n\nfast"), "it is fast");
        assert_eq!(compress("  padded  "), "padded");
    }

    #[test]
    fn compress_is_case_sensitive_for_fillers() {
        assert_eq!(compress("Well, fine"), "Well, fine");
    }

    #[test]
    fn compress_never_grows() {
        for text in [
            "",
            " ",
            "a",
            "like like like",
            "you know, I really really want this",
            "tabs\tand\nnewlines\r\n",
            "ünïcödé   very   wörds",
            "well",
        ] {
            let out = compress(text);
            assert!(
                out.chars().count() <= text.chars().count(),
                "grew: {text:?} -> {out:?}"
            );
        }
    }

    #[test]
    fn compress_fully_reaches_fixed_point() {
        let once = compress("like um well stuff");
        let full = compress_fully("like um well stuff");
        assert_eq!(compress(&full), full);
        assert!(full.len() <= once.len());
    }

    #[test]
    fn context_keywords() {
        assert!(should_add_context("Please IMPLEMENT the cache"));
        assert!(should_add_context("fix the bug"));
        assert!(!should_add_context("what is a monad?"));
    }

    #[test]
    fn analysis_numbers() {
        let a = analyze("um  hello");
        assert_eq!(a.compressed_prompt, "hello");
        assert_eq!(a.original_length, 9);
        assert_eq!(a.compressed_length, 5);
        assert_eq!(a.token_savings, 4);
        assert!((a.compression_ratio - 44.44).abs() < 1e-9);
        assert!(a.optimization_applied());

        let empty = analyze("");
        assert_eq!(empty.compression_ratio, 0.0);
        assert!(!empty.optimization_applied());
    }

    #[test]
    fn cached_context_lists_recent_files() {
        let dir = TempDir::new().unwrap();
        let cache = ResultCache::new(dir.path(), CacheConfig::default());
        assert_eq!(cached_context(&cache), "");

        let file = dir.path().join("lib.rs");
        std::fs::write(&file, "fn main() {}").unwrap();
        let path = file.to_string_lossy().into_owned();
        cache.store(&Descriptor::File { path: path.clone() }, json!("fn main() {}"));

        let context = cached_context(&cache);
        assert!(context.starts_with("\n\nRecent file context (cached):\n"));
        assert!(context.contains(&format!("- {path} (12 chars)")));
    }
}
