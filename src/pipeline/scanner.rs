use crate::error::PipelineError;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// One not-yet-processed document observed in the inbox. The name is
/// the processing key: artifact and archive paths both derive from it.
#[derive(Debug, Clone)]
pub struct InboxDocument {
    pub name: String,
    pub content: String,
}

/// Finite snapshot of the inbox at scan time.
///
/// Unreadable entries land in `skipped` instead of failing the scan; an
/// empty inbox yields an empty batch, not an error.
#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub documents: Vec<InboxDocument>,
    pub skipped: Vec<PipelineError>,
}

pub fn scan(inbox_dir: &Path, suffix: &str) -> Result<ScanOutcome> {
    let mut out = ScanOutcome::default();

    let entries = fs::read_dir(inbox_dir)
        .with_context(|| format!("failed to read inbox {}", inbox_dir.display()))?;

    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                // The failing entry has no name to report.
                out.skipped.push(PipelineError::ScanRead {
                    name: "<unknown>".to_string(),
                    reason: err.to_string(),
                });
                continue;
            }
        };
        let path = entry.path();
        // Sub-locations (the archive included) are never documents.
        if !path.is_file() {
            continue;
        }

        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            continue;
        };
        if !name.ends_with(suffix) {
            continue;
        }

        match fs::read_to_string(&path) {
            Ok(content) => out.documents.push(InboxDocument {
                name: name.to_string(),
                content,
            }),
            Err(err) => out.skipped.push(PipelineError::ScanRead {
                name: name.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    out.documents.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}
