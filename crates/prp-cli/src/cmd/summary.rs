use crate::output::print_json;
use anyhow::Context;
use chrono::Local;
use clap::ValueEnum;
use prp_core::config::Config;
use prp_core::summary::{self, SummaryFormat};
use prp_core::transcript;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryFormatArg {
    Markdown,
    Json,
    Both,
}

impl From<SummaryFormatArg> for SummaryFormat {
    fn from(arg: SummaryFormatArg) -> Self {
        match arg {
            SummaryFormatArg::Markdown => SummaryFormat::Markdown,
            SummaryFormatArg::Json => SummaryFormat::Json,
            SummaryFormatArg::Both => SummaryFormat::Both,
        }
    }
}

pub fn run(
    root: &Path,
    output_file: &str,
    format: SummaryFormatArg,
    trigger: &str,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load_or_default(root);
    let transcript_path = match transcript::locate_for(&config, root) {
        Ok(path) => Some(path),
        Err(e) => {
            tracing::info!(error = %e, "summarizing without a transcript");
            None
        }
    };

    let now = Local::now();
    let generated = summary::generate(root, transcript_path.as_deref(), trigger, now);
    let written = summary::write(root, output_file, &generated, format.into(), trigger, now)
        .context("failed to write summary")?;

    if json {
        return print_json(&written);
    }

    if let Some(path) = &written.markdown_path {
        println!("Summary written to: {}", path.display());
    }
    if let Some(path) = &written.json_path {
        println!("JSON data appended to: {}", path.display());
    }
    if trigger == "manual" {
        let rule = "=".repeat(60);
        println!("\n{rule}\nCONVERSATION SUMMARY\n{rule}");
        println!("{}", written.content);
    }
    Ok(())
}
