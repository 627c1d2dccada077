//! Product Requirement Prompt documents.

use crate::error::{PrpError, Result};
use std::path::Path;

/// Headings every PRP must carry.
pub const REQUIRED_SECTIONS: &[&str] = &[
    "## Overview",
    "## Requirements",
    "## All Needed Context",
    "## Implementation Notes",
];

/// Required headings missing from `content`, in declaration order.
pub fn validate(content: &str) -> Vec<&'static str> {
    REQUIRED_SECTIONS
        .iter()
        .copied()
        .filter(|section| !content.contains(section))
        .collect()
}

pub fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => PrpError::PrpNotFound(path.display().to_string()),
        _ => PrpError::Io(e),
    })
}
