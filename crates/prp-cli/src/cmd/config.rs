use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use prp_core::config::Config;
use prp_core::paths;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Print the effective configuration
    Show,
    /// Write .claude/prp.yaml with default values if it does not exist
    Init,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Init => init(root),
    }
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    if json {
        return print_json(&config);
    }
    let cache = &config.cache;
    let rows = vec![
        vec!["cache.file_ttl_secs".into(), cache.file_ttl_secs.to_string()],
        vec!["cache.command_ttl_secs".into(), cache.command_ttl_secs.to_string()],
        vec!["cache.search_ttl_secs".into(), cache.search_ttl_secs.to_string()],
        vec!["cache.max_file_bytes".into(), cache.max_file_bytes.to_string()],
        vec!["cache.safe_commands".into(), cache.safe_commands.join(" ")],
        vec!["cache.volatile_keywords".into(), cache.volatile_keywords.join(" ")],
        vec![
            "logging.token_summary_interval".into(),
            config.logging.token_summary_interval.to_string(),
        ],
        vec![
            "cost.usd_per_million_tokens".into(),
            config.cost.usd_per_million_tokens.to_string(),
        ],
        vec![
            "transcripts.projects_path".into(),
            config
                .transcripts
                .projects_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "~/.claude/projects".into()),
        ],
    ];
    print_table(&["KEY", "VALUE"], rows);
    Ok(())
}

fn init(root: &Path) -> anyhow::Result<()> {
    let path = paths::config_path(root);
    if path.exists() {
        println!("{} already exists", paths::CONFIG_FILE);
        return Ok(());
    }
    Config::default().save(root).context("failed to write config")?;
    println!("Wrote {}", paths::CONFIG_FILE);
    Ok(())
}
