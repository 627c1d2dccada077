use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use prp_core::stack::{self, Category};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum StackSubcommand {
    /// List the technologies detected in the project root
    Detect,

    /// Suggest PRPs/ai_docs pattern documents for the detected stack
    Docs {
        /// Write templates for suggestions that do not exist yet
        #[arg(long)]
        create: bool,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: StackSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StackSubcommand::Detect => detect(root, json),
        StackSubcommand::Docs { create } => docs(root, create, json),
    }
}

// ---------------------------------------------------------------------------
// detect
// ---------------------------------------------------------------------------

fn detect(root: &Path, json: bool) -> anyhow::Result<()> {
    let detected = stack::scan(root);
    if json {
        return print_json(&detected);
    }
    if detected.is_empty() {
        println!("No known technologies detected.");
        return Ok(());
    }
    println!("Detected Technology Stack:");
    for category in Category::ALL {
        let labels: Vec<&str> = detected.get(category).collect();
        if !labels.is_empty() {
            println!("  {category}: {}", labels.join(", "));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// docs
// ---------------------------------------------------------------------------

fn docs(root: &Path, create: bool, json: bool) -> anyhow::Result<()> {
    let detected = stack::scan(root);
    let suggestions = stack::suggest_docs(&detected);

    let created = if create {
        stack::create_docs(root, &suggestions).context("failed to create ai_docs")?
    } else {
        Vec::new()
    };

    if json {
        let value = serde_json::json!({
            "stack": detected,
            "suggestions": suggestions,
            "created": created,
        });
        return print_json(&value);
    }

    if suggestions.is_empty() {
        println!("No specific ai_docs suggestions. Consider creating:");
        for name in stack::GENERAL_DOCS {
            println!("  - PRPs/ai_docs/{name}");
        }
        return Ok(());
    }

    println!("Suggested ai_docs:");
    for name in &suggestions {
        println!("  - PRPs/ai_docs/{name}");
    }

    if create {
        println!("\nCreated {} ai_docs files:", created.len());
        for path in &created {
            println!("  - {}", path.display());
        }
    } else {
        println!("\nRun `prp stack docs --create` to write templates for these files.");
    }
    Ok(())
}
