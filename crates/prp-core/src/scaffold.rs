//! Project scaffolding: the starter documents and directory layout for a new
//! project, or the enhancement documents for an existing one.

use crate::error::Result;
use crate::{io, paths};
use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const CLAUDE_MD: &str = "claude.md";
pub const INITIAL_MD: &str = "initial.md";
pub const ENHANCEMENT_TEMPLATE: &str = "enhancement_template.md";

const NEW_PROJECT_DIRS: &[&str] = &[
    "PRPs/templates",
    "PRPs/examples",
    "PRPs/ai_docs",
    "src",
    "docs",
    "tests",
    "scripts",
];

const IGNORED_ENTRIES: &[&str] = &[".git", ".gitignore"];

/// What a scaffolding run touched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScaffoldReport {
    pub written: Vec<PathBuf>,
    /// Files left alone because they already existed.
    pub skipped: Vec<PathBuf>,
    pub dirs: Vec<PathBuf>,
}

impl ScaffoldReport {
    fn file(&mut self, path: PathBuf, content: &str) -> Result<()> {
        if io::write_if_missing(&path, content.as_bytes())? {
            self.written.push(path);
        } else {
            tracing::info!(path = %path.display(), "keeping existing file");
            self.skipped.push(path);
        }
        Ok(())
    }
}

/// Top-level entries of `root`, excluding git metadata. Directories carry a
/// trailing slash.
pub fn top_level_entries(root: &Path) -> Result<Vec<String>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if IGNORED_ENTRIES.contains(&name.as_str()) {
            continue;
        }
        if entry.file_type()?.is_dir() {
            entries.push(format!("{name}/"));
        } else {
            entries.push(name);
        }
    }
    entries.sort();
    Ok(entries)
}

fn tree_listing(root: &Path, entries: &[String]) -> String {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());
    let mut out = format!("{name}/\n");
    for (i, entry) in entries.iter().enumerate() {
        let branch = if i + 1 == entries.len() { "└── " } else { "├── " };
        out.push_str(branch);
        out.push_str(entry);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// New project
// ---------------------------------------------------------------------------

fn new_claude_md(description: &str, today: NaiveDate) -> String {
    format!(
        r#"# Project Development Guide

## Project Overview
**Project Goal:** {description}

## Project Context
- **Project Type:** New Development
- **Start Date:** {today}
- **Development Approach:** PRP (Product Requirement Prompt) System

## Development Workflow
1. Describe each feature as a PRP under `PRPs/`
2. Keep framework notes in `PRPs/ai_docs/`
3. Validate a PRP with `prp validate PRPs/<feature>.md` before starting work
"#
    )
}

fn new_initial_md(description: &str) -> String {
    format!(
        r#"# Project Initialization

## Project Description
**Goal:** {description}

## First Steps
1. Detect the stack with `prp stack detect`
2. Create pattern docs with `prp stack docs --create`
3. Write the first PRP under `PRPs/`
"#
    )
}

/// Lay out a fresh project under `root`. Existing files are never touched.
pub fn new_project(root: &Path, description: &str, today: NaiveDate) -> Result<ScaffoldReport> {
    let mut report = ScaffoldReport::default();

    if !top_level_entries(root).map(|e| e.is_empty()).unwrap_or(true) {
        tracing::warn!(root = %root.display(), "scaffolding a new project into a non-empty directory");
    }

    report.file(root.join(CLAUDE_MD), &new_claude_md(description, today))?;
    report.file(root.join(INITIAL_MD), &new_initial_md(description))?;

    for dir in NEW_PROJECT_DIRS {
        let path = root.join(dir);
        io::ensure_dir(&path)?;
        report.dirs.push(path);
    }
    Ok(report)
}

// ---------------------------------------------------------------------------
// Existing project
// ---------------------------------------------------------------------------

fn enhance_claude_md(root: &Path, description: &str, today: NaiveDate, listing: &str) -> String {
    format!(
        r#"# Project Enhancement Guide

## Project Overview
This is an existing project that needs enhancement and development.

## Current State
- Project location: {location}
- Analysis date: {today}

## Enhancement Goals
**User Request:** {description}

## Project Structure
```
{listing}```

## Development Guidelines
1. **Preserve Existing Functionality**: Maintain current features while adding new ones
2. **Incremental Enhancement**: Build upon existing codebase
3. **Code Quality**: Follow existing patterns and conventions
4. **Testing**: Ensure new features don't break existing functionality
"#,
        location = root.display(),
    )
}

fn enhance_initial_md(description: &str) -> String {
    format!(
        r#"# Project Enhancement Initialization

## Project Context
This document initializes the enhancement process for an existing project.

## Enhancement Request
**User Description:** {description}

## Analysis Required
1. **Current Architecture Review**
2. **Feature Gap Analysis**
3. **Technical Debt Assessment**
4. **Enhancement Priority Definition**
"#
    )
}

const ENHANCEMENT_TEMPLATE_BODY: &str = r#"# PRP Template for Existing Project

## Overview
**Description:** [Describe the enhancement needed]

## Current State Analysis
- **Existing Components:** [List relevant existing components]
- **Integration Points:** [Where this enhancement connects to existing code]
- **Dependencies:** [What existing features this depends on]

## Requirements
1. **Functional Requirements:**
   - [Requirement 1]
   - [Requirement 2]

2. **Technical Requirements:**
   - [Technical requirement 1]
   - [Technical requirement 2]

3. **Integration Requirements:**
   - [How it integrates with existing features]
   - [Backward compatibility needs]

## All Needed Context
- [Files, docs, and `PRPs/ai_docs/` entries to read first]

## Success Criteria
- [ ] [Criterion 1]
- [ ] [Criterion 2]

## Implementation Notes
[Any specific implementation considerations for existing codebase]
"#;

/// Write the enhancement documents for the existing project at `root`.
pub fn enhance_project(root: &Path, description: &str, today: NaiveDate) -> Result<ScaffoldReport> {
    let mut report = ScaffoldReport::default();

    let entries = top_level_entries(root)?;
    if entries.is_empty() {
        tracing::warn!(root = %root.display(), "enhancing an empty directory");
    }
    let listing = tree_listing(root, &entries);

    report.file(
        root.join(CLAUDE_MD),
        &enhance_claude_md(root, description, today, &listing),
    )?;
    report.file(root.join(INITIAL_MD), &enhance_initial_md(description))?;

    let prps = root.join(paths::PRPS_DIR);
    io::ensure_dir(&prps)?;
    report.dirs.push(prps.clone());
    report.file(prps.join(ENHANCEMENT_TEMPLATE), ENHANCEMENT_TEMPLATE_BODY)?;

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prp;
    use tempfile::TempDir;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    #[test]
    fn new_project_layout() {
        let dir = TempDir::new().unwrap();
        let report = new_project(dir.path(), "A task tracker", day()).unwrap();
        assert_eq!(report.written.len(), 2);
        for d in NEW_PROJECT_DIRS {
            assert!(dir.path().join(d).is_dir(), "missing {d}");
        }
        let claude = std::fs::read_to_string(dir.path().join(CLAUDE_MD)).unwrap();
        assert!(claude.contains("**Project Goal:** A task tracker"));
        assert!(claude.contains("**Start Date:** 2026-05-04"));
    }

    #[test]
    fn new_project_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CLAUDE_MD), "custom").unwrap();
        let report = new_project(dir.path(), "x", day()).unwrap();
        assert_eq!(report.skipped, vec![dir.path().join(CLAUDE_MD)]);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(CLAUDE_MD)).unwrap(),
            "custom"
        );
    }

    #[test]
    fn enhance_lists_project_tree() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::create_dir(dir.path().join(".git")).unwrap();
        std::fs::write(dir.path().join("package.json"), "{}").unwrap();
        std::fs::write(dir.path().join("README.md"), "# T").unwrap();

        assert_eq!(
            top_level_entries(dir.path()).unwrap(),
            vec!["README.md", "package.json", "src/"]
        );

        let report = enhance_project(dir.path(), "add auth", day()).unwrap();
        assert_eq!(report.written.len(), 3);
        let claude = std::fs::read_to_string(dir.path().join(CLAUDE_MD)).unwrap();
        assert!(claude.contains("**User Request:** add auth"));
        assert!(claude.contains("├── README.md\n├── package.json\n└── src/\n"));
        assert!(!claude.contains(".git"));
    }

    #[test]
    fn enhance_keeps_existing_initial() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(INITIAL_MD), "mine").unwrap();
        let report = enhance_project(dir.path(), "x", day()).unwrap();
        assert!(report.skipped.contains(&dir.path().join(INITIAL_MD)));
        assert_eq!(
            std::fs::read_to_string(dir.path().join(INITIAL_MD)).unwrap(),
            "mine"
        );
    }

    #[test]
    fn enhancement_template_is_a_valid_prp() {
        assert!(prp::validate(ENHANCEMENT_TEMPLATE_BODY).is_empty());
    }
}
