use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use prp_core::{io, paths};
use std::path::Path;

#[derive(Subcommand)]
pub enum OptimizeSubcommand {
    /// Enable prompt compression and result caching
    On,
    /// Disable both; prompts are still logged in baseline mode
    Off,
    /// Show whether optimizations are enabled
    Status,
}

pub fn run(root: &Path, subcmd: OptimizeSubcommand, json: bool) -> anyhow::Result<()> {
    let flag = paths::optimization_flag_path(root);
    match subcmd {
        OptimizeSubcommand::On => {
            if flag.exists() {
                std::fs::remove_file(&flag)
                    .with_context(|| format!("failed to remove {}", flag.display()))?;
            }
        }
        OptimizeSubcommand::Off => {
            io::write_if_missing(&flag, b"").context("failed to write optimization flag")?;
        }
        OptimizeSubcommand::Status => {}
    }

    let enabled = !paths::optimization_disabled(root);
    if json {
        return print_json(&serde_json::json!({ "enabled": enabled }));
    }
    if enabled {
        println!("Optimizations enabled");
    } else {
        println!("Optimizations disabled (baseline mode)");
    }
    Ok(())
}
