use crate::root;
use anyhow::Context;
use chrono::Local;
use clap::Subcommand;
use prp_core::cache::{self, Descriptor, ResultCache};
use prp_core::config::Config;
use prp_core::event_log::{self, PromptRecord, SessionEvent, ToolUsageRecord};
use prp_core::hook::{HookInput, HookOutcome};
use prp_core::summary::{self, SummaryFormat};
use prp_core::{io, paths, prompt, transcript};
use std::io::Read;
use std::path::Path;

/// Prompts are only rewritten when compression saves more than this many chars.
const REWRITE_MIN_SAVINGS: usize = 10;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum HookSubcommand {
    /// Serve cached results for repeatable reads, commands, and searches
    PreToolUse,
    /// Log the tool call and record its result in the cache
    PostToolUse,
    /// Log and compress the submitted prompt
    UserPromptSubmit,
    /// Log the compaction and refresh the conversation summary
    PreCompact,
    /// Log the stop and archive the conversation
    Stop,
}

impl HookSubcommand {
    fn name(&self) -> &'static str {
        match self {
            HookSubcommand::PreToolUse => "pre-tool-use",
            HookSubcommand::PostToolUse => "post-tool-use",
            HookSubcommand::UserPromptSubmit => "user-prompt-submit",
            HookSubcommand::PreCompact => "pre-compact",
            HookSubcommand::Stop => "stop",
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run a hook and return its process exit code. Nothing here fails the host:
/// unreadable input and handler errors are reported on stderr and the hook
/// exits 0.
pub fn run(explicit_root: Option<&Path>, subcmd: HookSubcommand) -> i32 {
    let name = subcmd.name();

    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        eprintln!("{name} hook: failed to read stdin: {e}");
        return 0;
    }
    let input = match HookInput::parse(&raw) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{name} hook: {e}");
            return 0;
        }
    };

    let root = root::resolve_hook_root(explicit_root, input.cwd());
    tracing::debug!(hook = name, root = %root.display(), "running hook");

    let outcome = match dispatch(&root, &subcmd, &input) {
        Ok(outcome) => outcome,
        Err(e) => {
            eprintln!("{name} hook error: {e:#}");
            HookOutcome::Proceed
        }
    };

    if let Some(payload) = outcome.stdout_payload() {
        println!("{payload}");
    }
    outcome.exit_code()
}

fn dispatch(
    root: &Path,
    subcmd: &HookSubcommand,
    input: &HookInput,
) -> anyhow::Result<HookOutcome> {
    match subcmd {
        HookSubcommand::PreToolUse => pre_tool_use(root, input),
        HookSubcommand::PostToolUse => post_tool_use(root, input),
        HookSubcommand::UserPromptSubmit => user_prompt_submit(root, input),
        HookSubcommand::PreCompact => pre_compact(root, input),
        HookSubcommand::Stop => stop(root, input),
    }
}

fn now_rfc3339() -> String {
    Local::now().to_rfc3339()
}

// ---------------------------------------------------------------------------
// pre-tool-use
// ---------------------------------------------------------------------------

fn pre_tool_use(root: &Path, input: &HookInput) -> anyhow::Result<HookOutcome> {
    if paths::optimization_disabled(root) {
        return Ok(HookOutcome::Proceed);
    }
    let Some(descriptor) = Descriptor::from_tool_call(input.tool_name(), &input.tool_input)
    else {
        return Ok(HookOutcome::Proceed);
    };

    let config = Config::load_or_default(root);
    let cache = ResultCache::new(root, config.cache);
    match cache.lookup(&descriptor) {
        Some(result) => {
            let kind = descriptor.kind();
            eprintln!("Cache hit ({}) for {}", kind.source(), input.tool_name());
            Ok(HookOutcome::Block(cache::short_circuit_response(kind, &result)))
        }
        None => Ok(HookOutcome::Proceed),
    }
}

// ---------------------------------------------------------------------------
// post-tool-use
// ---------------------------------------------------------------------------

fn post_tool_use(root: &Path, input: &HookInput) -> anyhow::Result<HookOutcome> {
    let config = Config::load_or_default(root);

    let record = ToolUsageRecord {
        timestamp: now_rfc3339(),
        session_id: input.session_id().to_string(),
        tool_name: input.tool_name().to_string(),
        success: input.tool_succeeded(),
    };
    let path = event_log::today_path(root, paths::TOOL_USAGE_LOG);
    let count = event_log::append(&path, &record).context("failed to write tool usage log")?;

    let interval = config.logging.token_summary_interval;
    if interval > 0 && count % interval == 0 {
        refresh_token_summary(root, &config);
    }

    if record.success && !paths::optimization_disabled(root) {
        let descriptor = Descriptor::from_tool_call(input.tool_name(), &input.tool_input);
        if let Some(descriptor) = descriptor {
            let kind = descriptor.kind();
            if let Some(result) = cache::result_from_response(kind, &input.tool_response) {
                ResultCache::new(root, config.cache).store(&descriptor, result);
            }
        }
    }

    Ok(HookOutcome::Proceed)
}

fn refresh_token_summary(root: &Path, config: &Config) {
    let conv = match transcript::load_current(config, root) {
        Ok((_, conv)) => conv,
        Err(e) => {
            tracing::debug!(error = %e, "skipping token summary");
            return;
        }
    };
    let rule = "-".repeat(40);
    let text = format!(
        "Last Updated: {}\n{rule}\n{}\n{rule}\nLog Location: {}\n",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        transcript::summary_text(&conv, &config.cost),
        paths::logs_dir(root).display(),
    );
    if let Err(e) = io::atomic_write(&paths::token_summary_path(root), text.as_bytes()) {
        tracing::warn!(error = %e, "failed to write token summary");
    }
}

// ---------------------------------------------------------------------------
// user-prompt-submit
// ---------------------------------------------------------------------------

fn user_prompt_submit(root: &Path, input: &HookInput) -> anyhow::Result<HookOutcome> {
    let text = input.prompt();
    let log_path = event_log::today_path(root, paths::USER_PROMPTS_LOG);
    let mut record = PromptRecord {
        timestamp: input.timestamp.clone().unwrap_or_else(now_rfc3339),
        session_id: input.session_id().to_string(),
        original_prompt: text.to_string(),
        cwd: input.cwd().to_string(),
        original_length: text.chars().count(),
        ..Default::default()
    };

    if paths::optimization_disabled(root) {
        record.optimization_disabled = true;
        record.baseline_mode = true;
        if let Err(e) = event_log::append(&log_path, &record) {
            eprintln!("Warning: could not write to prompt log: {e}");
        }
        eprintln!("Optimization disabled - baseline mode");
        return Ok(HookOutcome::Proceed);
    }

    let analysis = prompt::analyze(text);
    record.compressed_prompt = Some(analysis.compressed_prompt.clone());
    record.compressed_length = Some(analysis.compressed_length);
    record.token_savings = Some(analysis.token_savings);
    record.is_simple_query = Some(analysis.is_simple_query);
    record.compression_ratio = Some(analysis.compression_ratio);
    record.optimization_applied = Some(analysis.optimization_applied());
    if let Err(e) = event_log::append(&log_path, &record) {
        eprintln!("Warning: could not write to prompt log: {e}");
    }

    let mut rewritten = analysis.compressed_prompt.clone();
    if analysis.should_add_context {
        let config = Config::load_or_default(root);
        rewritten.push_str(&prompt::cached_context(&ResultCache::new(root, config.cache)));
    }

    if analysis.token_savings > 0 {
        eprintln!("Prompt optimized: {} chars saved", analysis.token_savings);
    }
    if analysis.is_simple_query {
        eprintln!("Simple query detected - consider a smaller model");
    }

    if analysis.token_savings > REWRITE_MIN_SAVINGS {
        let mut modified = input.clone();
        modified.prompt = Some(rewritten);
        return Ok(HookOutcome::Modified(serde_json::to_value(&modified)?));
    }
    Ok(HookOutcome::Proceed)
}

// ---------------------------------------------------------------------------
// pre-compact
// ---------------------------------------------------------------------------

fn pre_compact(root: &Path, input: &HookInput) -> anyhow::Result<HookOutcome> {
    let event = SessionEvent {
        timestamp: now_rfc3339(),
        session_id: input.session_id().to_string(),
        hook_event_name: input.event_name_or("PreCompact").to_string(),
        action: Some("conversation_summary_generated".to_string()),
    };
    event_log::append(&event_log::today_path(root, paths::COMPACT_EVENTS_LOG), &event)
        .context("failed to write compact event")?;

    eprintln!("Generating conversation summary before compacting...");
    let config = Config::load_or_default(root);
    let transcript_path = match transcript::locate_for(&config, root) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::debug!(error = %e, "no transcript for summary");
            None
        }
    };
    let now = Local::now();
    let generated = summary::generate(root, transcript_path.as_deref(), "pre-compact", now);
    let written = summary::write(
        root,
        paths::SUMMARY_MD,
        &generated,
        SummaryFormat::Markdown,
        "pre-compact",
        now,
    )
    .context("failed to write conversation summary")?;
    if let Some(path) = written.markdown_path {
        eprintln!("Conversation summary written to {}", path.display());
    }
    Ok(HookOutcome::Proceed)
}

// ---------------------------------------------------------------------------
// stop
// ---------------------------------------------------------------------------

fn stop(root: &Path, input: &HookInput) -> anyhow::Result<HookOutcome> {
    if input.stop_hook_active {
        return Ok(HookOutcome::Proceed);
    }

    let event = SessionEvent {
        timestamp: now_rfc3339(),
        session_id: input.session_id().to_string(),
        hook_event_name: input.event_name_or("Stop").to_string(),
        action: None,
    };
    event_log::append(&event_log::today_path(root, paths::STOP_EVENTS_LOG), &event)
        .context("failed to write stop event")?;

    eprintln!("Archiving conversation with token usage...");
    let config = Config::load_or_default(root);
    let conv = match transcript::load_current(&config, root) {
        Ok((_, conv)) => conv,
        Err(e) => {
            eprintln!("Nothing to archive: {e}");
            return Ok(HookOutcome::Proceed);
        }
    };
    let session = conv
        .session_id
        .clone()
        .unwrap_or_else(|| input.session_id().to_string());
    let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let path = paths::archive_log_path(root, &session, &stamp);
    io::atomic_write(&path, transcript::render_log(&conv, &config.cost).as_bytes())
        .context("failed to write conversation archive")?;
    eprintln!("Conversation archived to {}", path.display());
    Ok(HookOutcome::Proceed)
}
