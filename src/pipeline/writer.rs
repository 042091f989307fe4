use crate::error::PipelineError;
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Derive the artifact name for a document: strip the recognized suffix,
/// append `_processed.json`. `invoice.txt` always maps to
/// `invoice_processed.json`, regardless of content.
pub fn artifact_name(document_name: &str, suffix: &str) -> String {
    let base = document_name
        .strip_suffix(suffix)
        .unwrap_or(document_name);
    format!("{base}_processed.json")
}

fn persistence_failed(name: &str, reason: impl ToString) -> PipelineError {
    PipelineError::PersistenceFailed {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Persist an extraction result as the document's JSON artifact.
///
/// The write goes through a temp file in the output directory and lands
/// with a rename, so a crash mid-write never leaves a partial artifact at
/// the final path. A rerun with the same name overwrites the prior
/// artifact.
pub fn save(
    output_dir: &Path,
    document_name: &str,
    suffix: &str,
    result: &Value,
) -> Result<PathBuf, PipelineError> {
    let target = output_dir.join(artifact_name(document_name, suffix));

    let mut tmp = NamedTempFile::new_in(output_dir)
        .map_err(|err| persistence_failed(document_name, err))?;
    let body = serde_json::to_string_pretty(result)
        .map_err(|err| persistence_failed(document_name, err))?;
    tmp.write_all(body.as_bytes())
        .and_then(|_| tmp.write_all(b"\n"))
        .map_err(|err| persistence_failed(document_name, err))?;
    tmp.persist(&target)
        .map_err(|err| persistence_failed(document_name, err))?;

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::{artifact_name, save};
    use serde_json::json;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn artifact_name_strips_suffix() {
        assert_eq!(artifact_name("invoice.txt", ".txt"), "invoice_processed.json");
        assert_eq!(
            artifact_name("2026-q1-report.txt", ".txt"),
            "2026-q1-report_processed.json"
        );
    }

    #[test]
    fn artifact_name_tolerates_missing_suffix() {
        assert_eq!(artifact_name("invoice", ".txt"), "invoice_processed.json");
    }

    #[test]
    fn save_writes_the_full_mapping() {
        let tmp = tempdir().expect("tempdir");
        let result = json!({"vendor_name": "John Doe", "total_amount": 500});

        let path = save(tmp.path(), "test_invoice.txt", ".txt", &result).expect("save");

        assert_eq!(
            path.file_name().and_then(|s| s.to_str()),
            Some("test_invoice_processed.json")
        );
        let raw = fs::read_to_string(&path).expect("read artifact");
        let parsed: serde_json::Value = serde_json::from_str(&raw).expect("parse artifact");
        assert_eq!(parsed, result);
    }

    #[test]
    fn save_overwrites_prior_artifact() {
        let tmp = tempdir().expect("tempdir");
        save(tmp.path(), "doc.txt", ".txt", &json!({"v": 1})).expect("first save");
        let path = save(tmp.path(), "doc.txt", ".txt", &json!({"v": 2})).expect("second save");

        let parsed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("parse");
        assert_eq!(parsed, json!({"v": 2}));

        let count = fs::read_dir(tmp.path())
            .expect("read dir")
            .filter(|e| e.as_ref().map(|e| e.path().is_file()).unwrap_or(false))
            .count();
        assert_eq!(count, 1);
    }
}
