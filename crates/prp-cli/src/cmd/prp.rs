use crate::output::print_json;
use anyhow::Context;
use prp_core::prp;
use std::path::{Path, PathBuf};

fn resolve(root: &Path, file: &Path) -> PathBuf {
    if file.is_absolute() || file.exists() {
        file.to_path_buf()
    } else {
        root.join(file)
    }
}

/// Fails when any required section is missing.
pub fn validate(root: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let path = resolve(root, file);
    let content = prp::read(&path).context("failed to read PRP")?;
    let missing = prp::validate(&content);

    if json {
        print_json(&serde_json::json!({
            "file": path,
            "valid": missing.is_empty(),
            "missing_sections": missing,
        }))?;
    } else if missing.is_empty() {
        println!("PRP structure is valid: {}", path.display());
    } else {
        println!("PRP missing required sections:");
        for section in &missing {
            println!("  - {section}");
        }
    }

    if !missing.is_empty() {
        anyhow::bail!(
            "{} is missing {} required section(s)",
            path.display(),
            missing.len()
        );
    }
    Ok(())
}

/// Print the document, warning about missing sections first.
pub fn show(root: &Path, file: &Path) -> anyhow::Result<()> {
    let path = resolve(root, file);
    let content = prp::read(&path).context("failed to read PRP")?;
    let missing = prp::validate(&content);
    if !missing.is_empty() {
        eprintln!("Warning: PRP missing required sections:");
        for section in &missing {
            eprintln!("  - {section}");
        }
    }
    println!("{content}");
    Ok(())
}
