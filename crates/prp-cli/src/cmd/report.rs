use crate::output::print_json;
use anyhow::Context;
use chrono::Local;
use prp_core::config::Config;
use prp_core::{event_log, io, report, transcript};
use std::path::Path;

pub fn run(root: &Path, days: u32, output: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let now = Local::now();
    let records = event_log::load_prompt_history(root, now.date_naive(), days);
    let analysis = report::analyze(&records);

    if json {
        return print_json(&analysis);
    }

    let config = Config::load_or_default(root);
    let session = match transcript::load_current(&config, root) {
        Ok((_, conv)) => Some(conv.total_tokens),
        Err(e) => {
            tracing::debug!(error = %e, "report without session token usage");
            None
        }
    };
    let text = report::render(&analysis, days, session.as_ref(), &config.cost, now);

    match output {
        Some(out) => {
            io::atomic_write(out, text.as_bytes())
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report saved to: {}", out.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}
