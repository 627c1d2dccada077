#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

fn prp(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("prp").unwrap();
    // HOME points at the tempdir so no real transcripts are ever read.
    cmd.current_dir(dir.path())
        .env("PRP_ROOT", dir.path())
        .env("HOME", dir.path())
        .env_remove("RUST_LOG");
    cmd
}

fn hook(dir: &TempDir, name: &str, payload: &Value) -> assert_cmd::assert::Assert {
    prp(dir)
        .args(["hook", name])
        .write_stdin(payload.to_string())
        .assert()
}

fn disable_optimization(dir: &TempDir) {
    prp(dir).args(["optimize", "off"]).assert().success();
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn today_log(dir: &TempDir, prefix: &str) -> std::path::PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d");
    dir.path().join("logs").join(format!("{prefix}_{date}.json"))
}

// ---------------------------------------------------------------------------
// hook input handling
// ---------------------------------------------------------------------------

#[test]
fn hooks_accept_empty_object() {
    let dir = TempDir::new().unwrap();
    for name in ["pre-tool-use", "post-tool-use", "user-prompt-submit", "pre-compact", "stop"] {
        hook(&dir, name, &json!({})).success();
    }
}

#[test]
fn rust_log_enables_debug_output() {
    let dir = TempDir::new().unwrap();
    prp(&dir)
        .env("RUST_LOG", "debug")
        .args(["hook", "pre-tool-use"])
        .write_stdin("{}")
        .assert()
        .success()
        .stderr(predicate::str::contains("running hook"));

    prp(&dir)
        .args(["hook", "pre-tool-use"])
        .write_stdin("{}")
        .assert()
        .success()
        .stderr(predicate::str::contains("running hook").not());
}

#[test]
fn hooks_never_fail_on_invalid_json() {
    let dir = TempDir::new().unwrap();
    prp(&dir)
        .args(["hook", "pre-tool-use"])
        .write_stdin("{not json")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ---------------------------------------------------------------------------
// result cache through pre/post tool use
// ---------------------------------------------------------------------------

fn read_call(dir: &TempDir) -> Value {
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "hello cache").unwrap();
    json!({
        "session_id": "s1",
        "tool_name": "Read",
        "tool_input": {"file_path": file.to_string_lossy()},
    })
}

fn with_response(call: &Value, response: Value) -> Value {
    let mut payload = call.clone();
    payload["tool_response"] = response;
    payload
}

#[test]
fn repeated_read_is_served_from_cache() {
    let dir = TempDir::new().unwrap();
    let call = read_call(&dir);

    hook(&dir, "pre-tool-use", &call).success();
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"file": {"content": "hello cache"}})),
    )
    .success();

    let out = hook(&dir, "pre-tool-use", &call)
        .code(1)
        .get_output()
        .stdout
        .clone();
    let response: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(response["cached"], json!(true));
    assert_eq!(response["cache_source"], json!("file_cache"));
    assert_eq!(response["content"], json!("hello cache"));
}

#[test]
fn modified_file_is_a_cache_miss() {
    let dir = TempDir::new().unwrap();
    let call = read_call(&dir);
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"content": "hello cache"})),
    )
    .success();

    std::fs::write(dir.path().join("notes.txt"), "hello cache, now longer").unwrap();
    hook(&dir, "pre-tool-use", &call).success();
}

#[test]
fn cache_is_bypassed_when_optimization_disabled() {
    let dir = TempDir::new().unwrap();
    let call = read_call(&dir);
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"content": "hello cache"})),
    )
    .success();

    disable_optimization(&dir);
    hook(&dir, "pre-tool-use", &call)
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn unsafe_commands_are_never_cached() {
    let dir = TempDir::new().unwrap();
    let call = json!({"tool_name": "Bash", "tool_input": {"command": "rm -rf build"}});
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"stdout": "", "stderr": ""})),
    )
    .success();
    hook(&dir, "pre-tool-use", &call).success();
}

#[test]
fn safe_command_output_is_replayed() {
    let dir = TempDir::new().unwrap();
    let call = json!({"tool_name": "Bash", "tool_input": {"command": "ls -la"}});
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"stdout": "Cargo.toml\n", "stderr": ""})),
    )
    .success();
    hook(&dir, "pre-tool-use", &call)
        .code(1)
        .stdout(predicate::str::contains("Cargo.toml"));
}

#[test]
fn failed_tool_results_are_not_cached() {
    let dir = TempDir::new().unwrap();
    let call = json!({"tool_name": "Grep", "tool_input": {"pattern": "fn main"}});
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"success": false, "error": "boom"})),
    )
    .success();
    hook(&dir, "pre-tool-use", &call).success();

    let log = read_json(&today_log(&dir, "tool_usage"));
    assert_eq!(log[0]["tool_name"], json!("Grep"));
    assert_eq!(log[0]["success"], json!(false));
}

#[test]
fn token_summary_refreshes_every_interval() {
    let dir = TempDir::new().unwrap();
    write_transcript(&dir);
    let summary = dir.path().join("logs/token_summary.txt");
    let call = json!({"tool_name": "Write", "tool_input": {"file_path": "a.txt"}});

    for _ in 0..9 {
        hook(&dir, "post-tool-use", &call).success();
    }
    assert!(!summary.exists());

    hook(&dir, "post-tool-use", &call).success();
    let text = std::fs::read_to_string(&summary).unwrap();
    assert!(text.contains("Last Updated"));
    assert!(text.contains("1,500"));
}

#[test]
fn token_summary_interval_zero_never_writes() {
    let dir = TempDir::new().unwrap();
    write_transcript(&dir);
    std::fs::write(
        dir.path().join(".claude/prp.yaml"),
        "logging:\n  token_summary_interval: 0\n",
    )
    .unwrap();
    let call = json!({"tool_name": "Write", "tool_input": {"file_path": "a.txt"}});

    for _ in 0..10 {
        hook(&dir, "post-tool-use", &call).success();
    }
    assert!(!dir.path().join("logs/token_summary.txt").exists());
    assert_eq!(
        read_json(&today_log(&dir, "tool_usage")).as_array().unwrap().len(),
        10
    );
}

// ---------------------------------------------------------------------------
// user-prompt-submit
// ---------------------------------------------------------------------------

#[test]
fn verbose_prompt_is_rewritten_and_logged() {
    let dir = TempDir::new().unwrap();
    let prompt = "please    make this    really   very   quite   fast,   um,   well   like   now";
    let out = hook(&dir, "user-prompt-submit", &json!({"session_id": "s1", "prompt": prompt}))
        .success()
        .get_output()
        .stdout
        .clone();
    let modified: Value = serde_json::from_slice(&out).unwrap();
    let rewritten = modified["prompt"].as_str().unwrap();
    assert!(rewritten.len() < prompt.len());
    assert_eq!(modified["session_id"], json!("s1"));

    let log = read_json(&today_log(&dir, "user_prompts"));
    assert_eq!(log[0]["original_prompt"], json!(prompt));
    assert_eq!(log[0]["optimization_applied"], json!(true));
}

#[test]
fn payload_timestamp_is_logged() {
    let dir = TempDir::new().unwrap();
    let stamp = "2020-01-02T03:04:05+00:00";
    hook(
        &dir,
        "user-prompt-submit",
        &json!({"prompt": "what is this?", "timestamp": stamp}),
    )
    .success();
    disable_optimization(&dir);
    hook(
        &dir,
        "user-prompt-submit",
        &json!({"prompt": "and this?", "timestamp": stamp}),
    )
    .success();

    let log = read_json(&today_log(&dir, "user_prompts"));
    assert_eq!(log[0]["timestamp"], json!(stamp));
    assert_eq!(log[1]["timestamp"], json!(stamp));
    assert_eq!(log[1]["baseline_mode"], json!(true));
}

#[test]
fn prompt_without_timestamp_gets_current_time() {
    let dir = TempDir::new().unwrap();
    hook(&dir, "user-prompt-submit", &json!({"prompt": "hello"})).success();
    let log = read_json(&today_log(&dir, "user_prompts"));
    let logged = log[0]["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(logged).is_ok());
}

#[test]
fn short_prompt_passes_through() {
    let dir = TempDir::new().unwrap();
    hook(&dir, "user-prompt-submit", &json!({"prompt": "what is this?"}))
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Simple query"));
}

#[test]
fn baseline_mode_logs_without_rewriting() {
    let dir = TempDir::new().unwrap();
    disable_optimization(&dir);
    hook(
        &dir,
        "user-prompt-submit",
        &json!({"prompt": "make   this   really   very   fast   please   now"}),
    )
    .success()
    .stdout(predicate::str::is_empty())
    .stderr(predicate::str::contains("baseline mode"));

    let log = read_json(&today_log(&dir, "user_prompts"));
    assert_eq!(log[0]["baseline_mode"], json!(true));
    assert_eq!(log[0]["optimization_disabled"], json!(true));
    assert!(log[0].get("compressed_prompt").is_none());
}

// ---------------------------------------------------------------------------
// pre-compact and stop
// ---------------------------------------------------------------------------

#[test]
fn pre_compact_records_event_and_writes_summary() {
    let dir = TempDir::new().unwrap();
    hook(&dir, "pre-compact", &json!({"session_id": "s1"})).success();

    let events = read_json(&today_log(&dir, "compact_events"));
    assert_eq!(events[0]["hook_event_name"], json!("PreCompact"));
    assert_eq!(events[0]["action"], json!("conversation_summary_generated"));

    let summary =
        std::fs::read_to_string(dir.path().join(".claude/logs/CONVERSATION_SUMMARY.md")).unwrap();
    assert!(summary.contains("No conversation file found"));
}

fn write_transcript(dir: &TempDir) {
    let project = dir
        .path()
        .to_string_lossy()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>();
    let transcripts = dir.path().join(".claude/projects").join(project);
    std::fs::create_dir_all(&transcripts).unwrap();
    let lines = [
        json!({"type": "user", "sessionId": "abc", "timestamp": "2026-01-01T10:00:00Z",
               "message": {"role": "user", "content": "fix the parser"}}),
        json!({"type": "assistant", "timestamp": "2026-01-01T10:00:05Z",
               "message": {"role": "assistant", "content": [{"type": "text", "text": "done"}],
                           "usage": {"input_tokens": 1200, "output_tokens": 300}}}),
    ];
    let body: Vec<String> = lines.iter().map(Value::to_string).collect();
    std::fs::write(transcripts.join("abc.jsonl"), body.join("\n")).unwrap();
}

#[test]
fn stop_records_event_and_archives_transcript() {
    let dir = TempDir::new().unwrap();
    write_transcript(&dir);

    hook(&dir, "stop", &json!({"session_id": "abc"})).success();

    let events = read_json(&today_log(&dir, "stop_events"));
    assert_eq!(events[0]["hook_event_name"], json!("Stop"));

    let archived: Vec<_> = std::fs::read_dir(dir.path().join(".claude/logs/archive"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(archived.len(), 1);
    assert!(archived[0].starts_with("conversation_abc_"));
}

#[test]
fn stop_reentry_does_nothing() {
    let dir = TempDir::new().unwrap();
    hook(&dir, "stop", &json!({"stop_hook_active": true})).success();
    assert!(!today_log(&dir, "stop_events").exists());
}

// ---------------------------------------------------------------------------
// summary
// ---------------------------------------------------------------------------

#[test]
fn summary_twice_keeps_history() {
    let dir = TempDir::new().unwrap();
    prp(&dir).arg("summary").assert().success();
    prp(&dir)
        .args(["summary", "--format", "both"])
        .assert()
        .success()
        .stdout(predicate::str::contains("CONVERSATION SUMMARY"));

    let md =
        std::fs::read_to_string(dir.path().join(".claude/logs/CONVERSATION_SUMMARY.md")).unwrap();
    assert!(md.contains("Latest Session Update"));
    assert!(md.contains("Previous Session History"));

    let history = read_json(&dir.path().join(".claude/logs/CONVERSATION_SUMMARY.json"));
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["trigger"], json!("manual"));
}

// ---------------------------------------------------------------------------
// report
// ---------------------------------------------------------------------------

#[test]
fn report_separates_baseline_and_optimized() {
    let dir = TempDir::new().unwrap();
    hook(
        &dir,
        "user-prompt-submit",
        &json!({"prompt": "please   make   this   really   fast"}),
    )
    .success();
    disable_optimization(&dir);
    hook(&dir, "user-prompt-submit", &json!({"prompt": "and this too"})).success();

    let out = prp(&dir)
        .args(["report", "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let analysis: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(analysis["total_prompts"], json!(2));
    assert_eq!(analysis["baseline_prompts"], json!(1));
    assert_eq!(analysis["optimized_prompts"], json!(1));

    prp(&dir)
        .arg("report")
        .assert()
        .success()
        .stdout(predicate::str::contains("Token Optimization Effectiveness Report"));
}

#[test]
fn report_with_no_logs_still_renders() {
    let dir = TempDir::new().unwrap();
    prp(&dir)
        .args(["report", "--days", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Last 3 days"));
}

// ---------------------------------------------------------------------------
// stack
// ---------------------------------------------------------------------------

fn react_project(dir: &TempDir) {
    std::fs::write(
        dir.path().join("package.json"),
        r#"{"dependencies": {"react": "^18.0.0"}, "devDependencies": {"typescript": "^5"}}"#,
    )
    .unwrap();
}

#[test]
fn stack_detect_finds_react() {
    let dir = TempDir::new().unwrap();
    react_project(&dir);
    prp(&dir)
        .args(["stack", "detect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("React"));
}

#[test]
fn stack_detect_empty_project() {
    let dir = TempDir::new().unwrap();
    prp(&dir)
        .args(["stack", "detect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No known technologies"));
}

#[test]
fn stack_docs_create_keeps_existing_files() {
    let dir = TempDir::new().unwrap();
    react_project(&dir);
    let docs = dir.path().join("PRPs/ai_docs");
    std::fs::create_dir_all(&docs).unwrap();
    std::fs::write(docs.join("react-hooks-patterns.md"), "mine").unwrap();

    prp(&dir)
        .args(["stack", "docs", "--create"])
        .assert()
        .success()
        .stdout(predicate::str::contains("react-component-patterns.md"));

    assert_eq!(
        std::fs::read_to_string(docs.join("react-hooks-patterns.md")).unwrap(),
        "mine"
    );
    assert!(docs.join("react-typescript-conventions.md").exists());
}

#[test]
fn stack_docs_without_create_writes_nothing() {
    let dir = TempDir::new().unwrap();
    react_project(&dir);
    prp(&dir).args(["stack", "docs"]).assert().success();
    assert!(!dir.path().join("PRPs/ai_docs").exists());
}

// ---------------------------------------------------------------------------
// scaffold, validate, show
// ---------------------------------------------------------------------------

#[test]
fn scaffold_new_creates_layout() {
    let dir = TempDir::new().unwrap();
    prp(&dir)
        .args(["scaffold", "new", "A todo service"])
        .assert()
        .success();
    assert!(dir.path().join("claude.md").exists());
    assert!(dir.path().join("initial.md").exists());
    for sub in ["PRPs", "src", "docs", "tests", "scripts"] {
        assert!(dir.path().join(sub).is_dir(), "missing {sub}");
    }
    let claude = std::fs::read_to_string(dir.path().join("claude.md")).unwrap();
    assert!(claude.contains("A todo service"));
}

#[test]
fn scaffold_enhance_keeps_existing_claude_md() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("claude.md"), "existing rules").unwrap();
    std::fs::create_dir(dir.path().join("src")).unwrap();

    prp(&dir)
        .args(["scaffold", "enhance", "Add search"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    assert_eq!(
        std::fs::read_to_string(dir.path().join("claude.md")).unwrap(),
        "existing rules"
    );
    let template = dir.path().join("PRPs/enhancement_template.md");
    prp(&dir)
        .arg("validate")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"));
}

#[test]
fn validate_reports_missing_sections() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("draft.md"), "## Overview\n\nstuff\n").unwrap();
    prp(&dir)
        .args(["validate", "draft.md"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("## Requirements"))
        .stdout(predicate::str::contains("## Implementation Notes"));
}

#[test]
fn validate_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    prp(&dir)
        .args(["validate", "nope.md"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PRP file not found"));
}

#[test]
fn show_warns_but_prints() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("draft.md"), "# Draft\nbody text\n").unwrap();
    prp(&dir)
        .args(["show", "draft.md"])
        .assert()
        .success()
        .stdout(predicate::str::contains("body text"))
        .stderr(predicate::str::contains("missing required sections"));
}

// ---------------------------------------------------------------------------
// optimize and config
// ---------------------------------------------------------------------------

#[test]
fn optimize_toggle_cycle() {
    let dir = TempDir::new().unwrap();
    let flag = dir.path().join(".claude/.optimization_disabled");

    prp(&dir)
        .args(["optimize", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Optimizations enabled"));

    prp(&dir).args(["optimize", "off"]).assert().success();
    assert!(flag.exists());
    prp(&dir).args(["optimize", "off"]).assert().success();

    prp(&dir)
        .args(["optimize", "status", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    prp(&dir).args(["optimize", "on"]).assert().success();
    assert!(!flag.exists());
}

#[test]
fn config_init_then_show() {
    let dir = TempDir::new().unwrap();
    prp(&dir).args(["config", "init"]).assert().success();
    assert!(dir.path().join(".claude/prp.yaml").exists());

    prp(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache.file_ttl_secs"))
        .stdout(predicate::str::contains("300"));

    prp(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
}

#[test]
fn configured_ttl_is_honored() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
    std::fs::write(
        dir.path().join(".claude/prp.yaml"),
        "cache:\n  command_ttl_secs: 0\n",
    )
    .unwrap();
    let call = json!({"tool_name": "Bash", "tool_input": {"command": "ls"}});
    hook(
        &dir,
        "post-tool-use",
        &with_response(&call, json!({"stdout": "a\n", "stderr": ""})),
    )
    .success();
    std::thread::sleep(std::time::Duration::from_millis(20));
    hook(&dir, "pre-tool-use", &call).success();
}
