use crate::output::print_json;
use anyhow::Context;
use chrono::Local;
use clap::Subcommand;
use prp_core::scaffold::{self, ScaffoldReport};
use std::path::Path;

#[derive(Subcommand)]
pub enum ScaffoldSubcommand {
    /// Lay out a new project: claude.md, initial.md, PRPs/, src/, docs/, tests/, scripts/
    New {
        /// What the project is for
        description: String,
    },

    /// Add enhancement documents to an existing project
    Enhance {
        /// The enhancement being planned
        description: String,
    },
}

pub fn run(root: &Path, subcmd: ScaffoldSubcommand, json: bool) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let report = match subcmd {
        ScaffoldSubcommand::New { description } => {
            scaffold::new_project(root, &description, today).context("failed to scaffold project")?
        }
        ScaffoldSubcommand::Enhance { description } => {
            scaffold::enhance_project(root, &description, today)
                .context("failed to write enhancement documents")?
        }
    };

    if json {
        return print_json(&report);
    }
    print_report(root, &report);
    Ok(())
}

fn print_report(root: &Path, report: &ScaffoldReport) {
    let rel = |p: &Path| p.strip_prefix(root).unwrap_or(p).display().to_string();
    for path in &report.written {
        println!("created  {}", rel(path));
    }
    for path in &report.skipped {
        println!("kept     {} (already exists)", rel(path));
    }
    for path in &report.dirs {
        println!("dir      {}/", rel(path));
    }
}
