use crate::output::print_json;
use anyhow::Context;
use prp_core::config::Config;
use prp_core::{io, transcript};
use std::path::{Path, PathBuf};

pub fn run(
    root: &Path,
    projects_path: Option<PathBuf>,
    output: Option<&Path>,
    summary_only: bool,
    json: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load_or_default(root);
    if projects_path.is_some() {
        config.transcripts.projects_path = projects_path;
    }

    let (path, conv) =
        transcript::load_current(&config, root).context("failed to load transcript")?;
    tracing::info!(path = %path.display(), "loaded transcript");

    if json {
        return print_json(&conv);
    }

    let text = if summary_only {
        transcript::summary_text(&conv, &config.cost)
    } else {
        transcript::render_log(&conv, &config.cost)
    };

    match output {
        Some(out) => {
            io::atomic_write(out, text.as_bytes())
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Conversation log written to: {}", out.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
