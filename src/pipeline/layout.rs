use crate::error::PipelineError;
use crate::pipeline::paths::DocflowPaths;
use std::fs;
use std::path::Path;

fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(PipelineError::StorageUnavailable {
            path: path.display().to_string(),
            reason: "exists but is not a directory".to_string(),
        });
    }
    fs::create_dir_all(path).map_err(|err| PipelineError::StorageUnavailable {
        path: path.display().to_string(),
        reason: err.to_string(),
    })
}

/// Create every storage location the pipeline touches.
///
/// Idempotent: repeated calls against an existing layout are no-ops.
pub fn ensure_layout(paths: &DocflowPaths) -> Result<(), PipelineError> {
    ensure_dir(&paths.inbox_dir)?;
    ensure_dir(&paths.output_dir)?;
    ensure_dir(&paths.archive_dir)?;
    ensure_dir(&paths.logs_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_layout;
    use crate::pipeline::paths::DocflowPaths;
    use tempfile::tempdir;

    fn paths_under(root: &std::path::Path) -> DocflowPaths {
        let inbox_dir = root.join("inbox");
        DocflowPaths {
            docflow_home: root.to_path_buf(),
            archive_dir: inbox_dir.join("archive"),
            inbox_dir,
            output_dir: root.join("output"),
            logs_dir: root.join("logs"),
        }
    }

    #[test]
    fn creates_all_locations_and_is_repeatable() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_under(tmp.path());

        ensure_layout(&paths).expect("first ensure");
        ensure_layout(&paths).expect("second ensure");

        assert!(paths.inbox_dir.is_dir());
        assert!(paths.output_dir.is_dir());
        assert!(paths.archive_dir.is_dir());
        assert!(paths.logs_dir.is_dir());
    }

    #[test]
    fn fails_when_a_location_is_a_file() {
        let tmp = tempdir().expect("tempdir");
        let paths = paths_under(tmp.path());
        std::fs::write(&paths.inbox_dir, "not a directory").expect("write file");

        assert!(ensure_layout(&paths).is_err());
    }
}
