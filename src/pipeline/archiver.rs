use crate::error::PipelineError;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

fn archive_failed(name: &str, reason: impl ToString) -> PipelineError {
    PipelineError::ArchiveFailed {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

fn move_file(name: &str, from: &Path, to: &Path) -> Result<(), PipelineError> {
    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(rename_err) => {
            if matches!(
                rename_err.kind(),
                ErrorKind::CrossesDevices | ErrorKind::PermissionDenied
            ) {
                // Copy first, remove only once the copy is in place, so the
                // source survives a failure partway through.
                fs::copy(from, to).map_err(|err| archive_failed(name, err))?;
                fs::remove_file(from).map_err(|err| archive_failed(name, err))?;
                Ok(())
            } else {
                Err(archive_failed(name, rename_err))
            }
        }
    }
}

/// Move a fully processed document out of the active inbox into the
/// archive sub-location, preserving its name. Terminal state for the
/// document: the scanner never sees it again.
pub fn archive(
    inbox_dir: &Path,
    archive_dir: &Path,
    document_name: &str,
) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(archive_dir).map_err(|err| archive_failed(document_name, err))?;

    let source = inbox_dir.join(document_name);
    let target = archive_dir.join(document_name);
    move_file(document_name, &source, &target)?;
    Ok(target)
}
