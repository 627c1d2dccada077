//! Hook payloads exchanged with the host.
//!
//! The host writes one JSON object to stdin per invocation. Every field is
//! optional; absent fields fall back to `"unknown"` or the empty string when a
//! record needs them.

use crate::error::{PrpError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// HookInput
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tool_input: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub tool_response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook_event_name: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stop_hook_active: bool,
    /// Fields this crate does not interpret, echoed back untouched when the
    /// payload is re-emitted.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl HookInput {
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(PrpError::InvalidInput(
                "expected a JSON object on stdin".to_string(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or("unknown")
    }

    pub fn tool_name(&self) -> &str {
        self.tool_name.as_deref().unwrap_or("unknown")
    }

    pub fn prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or("")
    }

    pub fn cwd(&self) -> &str {
        self.cwd.as_deref().unwrap_or("")
    }

    pub fn event_name_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.hook_event_name.as_deref().unwrap_or(fallback)
    }

    /// `tool_response.success`, defaulting to true for non-object responses
    /// or a missing flag.
    pub fn tool_succeeded(&self) -> bool {
        match &self.tool_response {
            Value::Object(map) => map.get("success").and_then(Value::as_bool).unwrap_or(true),
            _ => true,
        }
    }
}

// ---------------------------------------------------------------------------
// HookOutcome
// ---------------------------------------------------------------------------

/// What a hook tells the host once it has run.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Let the host continue as normal.
    Proceed,
    /// Let the host continue using this rewritten payload.
    Modified(Value),
    /// Skip the real tool and use this payload as its result.
    Block(Value),
}

impl HookOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            HookOutcome::Block(_) => 1,
            HookOutcome::Proceed | HookOutcome::Modified(_) => 0,
        }
    }

    pub fn stdout_payload(&self) -> Option<&Value> {
        match self {
            HookOutcome::Proceed => None,
            HookOutcome::Modified(v) | HookOutcome::Block(v) => Some(v),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_object_parses_with_defaults() {
        let input = HookInput::parse("{}").unwrap();
        assert_eq!(input.session_id(), "unknown");
        assert_eq!(input.tool_name(), "unknown");
        assert_eq!(input.prompt(), "");
        assert!(input.tool_succeeded());
        assert!(!input.stop_hook_active);
    }

    #[test]
    fn non_object_rejected() {
        assert!(HookInput::parse("[1,2]").is_err());
        assert!(HookInput::parse("not json").is_err());
    }

    #[test]
    fn tool_success_flag() {
        let input = HookInput::parse(
            r#"{"tool_name":"Bash","tool_response":{"success":false}}"#,
        )
        .unwrap();
        assert!(!input.tool_succeeded());

        let input = HookInput::parse(r#"{"tool_response":"plain text"}"#).unwrap();
        assert!(input.tool_succeeded());
    }

    #[test]
    fn unknown_fields_survive_reserialization() {
        let input = HookInput::parse(
            r#"{"prompt":"hi","transcript_path":"/tmp/t.jsonl","session_id":"s1"}"#,
        )
        .unwrap();
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(value["transcript_path"], json!("/tmp/t.jsonl"));
        assert_eq!(value["session_id"], json!("s1"));
        assert!(value.get("tool_input").is_none());
    }

    #[test]
    fn outcome_exit_codes() {
        assert_eq!(HookOutcome::Proceed.exit_code(), 0);
        assert_eq!(HookOutcome::Modified(json!({})).exit_code(), 0);
        assert_eq!(HookOutcome::Block(json!({})).exit_code(), 1);
        assert!(HookOutcome::Proceed.stdout_payload().is_none());
    }
}
