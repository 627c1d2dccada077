//! Lookup-keyed result cache for read-only tool calls.
//!
//! Each [`CacheKind`] owns one JSON map under `.claude/cache/`, keyed by a
//! value derived from the call's [`Descriptor`]. An entry is a hit while it is
//! younger than the kind's TTL. Stale entries are never evicted; they are
//! overwritten the next time the same key is stored.
//!
//! Every cache-file error is logged and treated as a miss. Nothing here may
//! make a wrapped tool call fail.

use crate::config::CacheConfig;
use crate::error::Result;
use crate::{io, paths};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

// ---------------------------------------------------------------------------
// CacheKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    FileRead,
    ShellCommand,
    PatternSearch,
}

impl CacheKind {
    pub fn file_name(self) -> &'static str {
        match self {
            CacheKind::FileRead => "file_cache.json",
            CacheKind::ShellCommand => "command_cache.json",
            CacheKind::PatternSearch => "search_cache.json",
        }
    }

    /// Label reported back to the host in `cache_source`.
    pub fn source(self) -> &'static str {
        match self {
            CacheKind::FileRead => "file_cache",
            CacheKind::ShellCommand => "command_cache",
            CacheKind::PatternSearch => "search_cache",
        }
    }

    pub fn ttl(self, config: &CacheConfig) -> Duration {
        let secs = match self {
            CacheKind::FileRead => config.file_ttl_secs,
            CacheKind::ShellCommand => config.command_ttl_secs,
            CacheKind::PatternSearch => config.search_ttl_secs,
        };
        Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX / 1000))
    }
}

// ---------------------------------------------------------------------------
// Descriptor
// ---------------------------------------------------------------------------

/// The fields identifying one cacheable tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Descriptor {
    File { path: String },
    Command { command: String },
    Search { pattern: String, path: String },
}

impl Descriptor {
    pub fn kind(&self) -> CacheKind {
        match self {
            Descriptor::File { .. } => CacheKind::FileRead,
            Descriptor::Command { .. } => CacheKind::ShellCommand,
            Descriptor::Search { .. } => CacheKind::PatternSearch,
        }
    }

    /// Map a host tool call onto a descriptor. Returns `None` for tools the
    /// cache does not cover, or calls missing the identifying field.
    pub fn from_tool_call(tool_name: &str, tool_input: &Value) -> Option<Self> {
        let field = |key: &str| tool_input.get(key).and_then(Value::as_str);
        match tool_name {
            "Read" => {
                // Windowed reads return a slice of the file; only whole-file
                // reads share a key.
                if tool_input.get("offset").is_some_and(|v| !v.is_null())
                    || tool_input.get("limit").is_some_and(|v| !v.is_null())
                {
                    return None;
                }
                let path = field("file_path")?;
                (!path.is_empty()).then(|| Descriptor::File {
                    path: path.to_string(),
                })
            }
            "Bash" => Some(Descriptor::Command {
                command: field("command").unwrap_or("").to_string(),
            }),
            "Grep" | "Glob" => Some(Descriptor::Search {
                pattern: field("pattern").unwrap_or("").to_string(),
                path: field("path").unwrap_or(".").to_string(),
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CacheEntry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    /// RFC 3339; naive timestamps written by older tooling are read as local time.
    pub timestamp: String,
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl CacheEntry {
    pub fn stored_at(&self) -> Option<DateTime<Utc>> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(&self.timestamp) {
            return Some(ts.with_timezone(&Utc));
        }
        let naive = NaiveDateTime::parse_from_str(&self.timestamp, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        Local
            .from_local_datetime(&naive)
            .single()
            .map(|ts| ts.with_timezone(&Utc))
    }

    pub fn is_fresh(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match self.stored_at() {
            Some(stored) => now - stored < ttl,
            None => false,
        }
    }
}

type CacheMap = BTreeMap<String, CacheEntry>;

/// A file-cache entry young enough to be mentioned as prompt context.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentFile {
    pub path: String,
    pub stored_at: DateTime<Utc>,
    pub size: usize,
}

// ---------------------------------------------------------------------------
// ResultCache
// ---------------------------------------------------------------------------

pub struct ResultCache {
    root: PathBuf,
    dir: PathBuf,
    config: CacheConfig,
}

impl ResultCache {
    pub fn new(root: &Path, config: CacheConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            dir: paths::cache_dir(root),
            config,
        }
    }

    fn cache_path(&self, kind: CacheKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    /// Derive the cache key, or `None` when the call must not be cached.
    pub fn key_for(&self, descriptor: &Descriptor) -> Option<String> {
        match descriptor {
            Descriptor::File { path } => {
                let meta = std::fs::metadata(self.resolve(path)).ok()?;
                if !meta.is_file() || meta.len() > self.config.max_file_bytes {
                    return None;
                }
                let mtime = meta
                    .modified()
                    .ok()?
                    .duration_since(UNIX_EPOCH)
                    .ok()?
                    .as_nanos();
                Some(format!("{path}_{mtime}_{}", meta.len()))
            }
            Descriptor::Command { command } => {
                if !self.is_safe_command(command) {
                    return None;
                }
                Some(sha256_hex(command))
            }
            Descriptor::Search { pattern, path } => {
                if pattern.is_empty() {
                    return None;
                }
                Some(sha256_hex(&format!("{pattern}_{path}")))
            }
        }
    }

    /// Read-only allow-list check on the first word, plus a volatile-keyword veto.
    pub fn is_safe_command(&self, command: &str) -> bool {
        let Some(first) = command.split_whitespace().next() else {
            return false;
        };
        if !self.config.safe_commands.iter().any(|c| c == first) {
            return false;
        }
        let lowered = command.to_lowercase();
        !self
            .config
            .volatile_keywords
            .iter()
            .any(|k| lowered.contains(k.as_str()))
    }

    pub fn lookup(&self, descriptor: &Descriptor) -> Option<Value> {
        self.lookup_at(descriptor, Utc::now())
    }

    pub fn lookup_at(&self, descriptor: &Descriptor, now: DateTime<Utc>) -> Option<Value> {
        let kind = descriptor.kind();
        let key = self.key_for(descriptor)?;
        let map = self.load(kind);
        let entry = map.get(&key)?;
        if entry.is_fresh(kind.ttl(&self.config), now) {
            tracing::debug!(kind = kind.source(), %key, "cache hit");
            Some(entry.result.clone())
        } else {
            tracing::debug!(kind = kind.source(), %key, "cache entry expired");
            None
        }
    }

    pub fn store(&self, descriptor: &Descriptor, result: Value) {
        self.store_at(descriptor, result, Utc::now());
    }

    pub fn store_at(&self, descriptor: &Descriptor, result: Value, now: DateTime<Utc>) {
        let kind = descriptor.kind();
        let Some(key) = self.key_for(descriptor) else {
            return;
        };
        let mut map = self.load(kind);
        let file_path = match descriptor {
            Descriptor::File { path } => Some(path.clone()),
            _ => None,
        };
        map.insert(
            key,
            CacheEntry {
                timestamp: now.to_rfc3339(),
                result,
                file_path,
            },
        );
        if let Err(e) = io::write_json(&self.cache_path(kind), &map) {
            tracing::warn!(error = %e, file = kind.file_name(), "failed to write cache");
        }
    }

    fn try_load(&self, kind: CacheKind) -> Result<CacheMap> {
        Ok(io::read_json(&self.cache_path(kind))?.unwrap_or_default())
    }

    fn load(&self, kind: CacheKind) -> CacheMap {
        self.try_load(kind).unwrap_or_else(|e| {
            tracing::debug!(error = %e, file = kind.file_name(), "unreadable cache, treating as empty");
            CacheMap::new()
        })
    }

    /// File-cache entries stored within `window` of `now`, newest first.
    pub fn recent_files(&self, window: Duration, now: DateTime<Utc>) -> Vec<RecentFile> {
        let mut recent: Vec<RecentFile> = self
            .load(CacheKind::FileRead)
            .into_values()
            .filter_map(|entry| {
                let path = entry.file_path.clone()?;
                let stored_at = entry.stored_at()?;
                if now - stored_at >= window {
                    return None;
                }
                let size = entry.result.as_str().map(|s| s.chars().count()).unwrap_or(0);
                Some(RecentFile {
                    path,
                    stored_at,
                    size,
                })
            })
            .collect();
        recent.sort_by(|a, b| b.stored_at.cmp(&a.stored_at));
        recent
    }
}

fn sha256_hex(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

// ---------------------------------------------------------------------------
// Host payload shapes
// ---------------------------------------------------------------------------

/// The payload handed to the host in place of the real tool's output.
pub fn short_circuit_response(kind: CacheKind, result: &Value) -> Value {
    match kind {
        CacheKind::FileRead => json!({
            "success": true,
            "content": result,
            "cached": true,
            "cache_source": kind.source(),
        }),
        CacheKind::ShellCommand => json!({
            "success": true,
            "stdout": result.get("stdout").cloned().unwrap_or_else(|| json!("")),
            "stderr": result.get("stderr").cloned().unwrap_or_else(|| json!("")),
            "cached": true,
            "cache_source": kind.source(),
        }),
        CacheKind::PatternSearch => json!({
            "success": true,
            "result": result,
            "cached": true,
            "cache_source": kind.source(),
        }),
    }
}

/// Extract what is worth caching from a finished tool call's response.
pub fn result_from_response(kind: CacheKind, tool_response: &Value) -> Option<Value> {
    match kind {
        CacheKind::FileRead => tool_response
            .get("content")
            .or_else(|| tool_response.get("file").and_then(|f| f.get("content")))
            .filter(|v| v.is_string())
            .cloned(),
        CacheKind::ShellCommand => {
            let stdout = tool_response.get("stdout")?.as_str()?;
            let stderr = tool_response.get("stderr").and_then(Value::as_str).unwrap_or("");
            Some(json!({ "stdout": stdout, "stderr": stderr }))
        }
        CacheKind::PatternSearch => (!tool_response.is_null()).then(|| tool_response.clone()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
