use thiserror::Error;

/// Failure taxonomy for the intake pipeline.
///
/// Only `StorageUnavailable` is fatal; every other variant is scoped to a
/// single inbox entry, which stays in place and is reconsidered on the
/// next scan cycle.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: String, reason: String },
    #[error("failed to read inbox entry {name}: {reason}")]
    ScanRead { name: String, reason: String },
    #[error("extraction failed for {name}: {reason}")]
    ExtractionFailed { name: String, reason: String },
    #[error("failed to persist result for {name}: {reason}")]
    PersistenceFailed { name: String, reason: String },
    #[error("failed to archive {name}: {reason}")]
    ArchiveFailed { name: String, reason: String },
}

impl PipelineError {
    /// Pipeline stage a failure belongs to, as it appears in the audit log.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::StorageUnavailable { .. } => "layout",
            Self::ScanRead { .. } => "scan",
            Self::ExtractionFailed { .. } => "extract",
            Self::PersistenceFailed { .. } => "persist",
            Self::ArchiveFailed { .. } => "archive",
        }
    }
}
