use crate::error::PipelineError;
use crate::extract::Extractor;
use crate::pipeline::audit;
use crate::pipeline::archiver;
use crate::pipeline::config::DocflowConfig;
use crate::pipeline::paths::DocflowPaths;
use crate::pipeline::scanner;
use crate::pipeline::writer;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Lifecycle states of one document, in pipeline order. `Failed` absorbs
/// a document at whatever stage broke; the document stays in the inbox
/// and is retried on the next scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    Discovered,
    Extracted,
    Persisted,
    Archived,
    Failed,
}

impl DocumentState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::Extracted => "extracted",
            Self::Persisted => "persisted",
            Self::Archived => "archived",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    pub name: String,
    pub state: DocumentState,
    pub artifact_path: Option<String>,
    pub archive_path: Option<String>,
    /// Stage that failed (audit phase name) and the failure itself.
    pub failed_stage: Option<&'static str>,
    pub error: Option<String>,
}

impl DocumentOutcome {
    fn discovered(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: DocumentState::Discovered,
            artifact_path: None,
            archive_path: None,
            failed_stage: None,
            error: None,
        }
    }

    fn fail(mut self, err: PipelineError) -> Self {
        self.state = DocumentState::Failed;
        self.failed_stage = Some(err.stage());
        self.error = Some(err.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct CycleOutcome {
    pub scanned: usize,
    pub skipped_entries: usize,
    pub archived: usize,
    pub failed: usize,
    pub outcomes: Vec<DocumentOutcome>,
}

const IDLE_SLICE: Duration = Duration::from_millis(250);

/// Audit logging is observability, not pipeline state: a failed append
/// must never take a batch down with it.
fn record(paths: &DocflowPaths, phase: &str, status: &str, message: &str) {
    if let Err(err) = audit::append_event(paths, phase, status, message) {
        eprintln!("docflow audit warning: phase={phase} err={err:#}");
    }
}

fn process_document(
    paths: &DocflowPaths,
    cfg: &DocflowConfig,
    extractor: &dyn Extractor,
    doc: &scanner::InboxDocument,
) -> DocumentOutcome {
    let mut outcome = DocumentOutcome::discovered(&doc.name);

    let result = match extractor.extract(&cfg.extract.instruction, &doc.content) {
        Ok(result) => result,
        Err(err) => {
            return outcome.fail(PipelineError::ExtractionFailed {
                name: doc.name.clone(),
                reason: format!("{err:#}"),
            });
        }
    };
    outcome.state = DocumentState::Extracted;

    let artifact = match writer::save(&paths.output_dir, &doc.name, &cfg.scanner.suffix, &result) {
        Ok(path) => path,
        Err(err) => return outcome.fail(err),
    };
    outcome.state = DocumentState::Persisted;
    outcome.artifact_path = Some(artifact.display().to_string());

    // Archiving only ever happens after the artifact landed; a failure
    // here leaves both the artifact and the inbox copy in place.
    match archiver::archive(&paths.inbox_dir, &paths.archive_dir, &doc.name) {
        Ok(archived) => {
            outcome.state = DocumentState::Archived;
            outcome.archive_path = Some(archived.display().to_string());
            outcome
        }
        Err(err) => outcome.fail(err),
    }
}

/// Run one scan-and-process cycle: every readable document in the inbox
/// is driven through extract → persist → archive, failures isolated per
/// document.
pub fn run_cycle(
    paths: &DocflowPaths,
    cfg: &DocflowConfig,
    extractor: &dyn Extractor,
) -> Result<CycleOutcome> {
    let batch = scanner::scan(&paths.inbox_dir, &cfg.scanner.suffix)?;

    let mut cycle = CycleOutcome {
        scanned: batch.documents.len(),
        skipped_entries: batch.skipped.len(),
        ..CycleOutcome::default()
    };

    for skipped in &batch.skipped {
        record(paths, skipped.stage(), "skipped", &skipped.to_string());
    }

    for doc in &batch.documents {
        record(paths, "discover", "ok", &doc.name);

        let outcome = process_document(paths, cfg, extractor, doc);
        match outcome.state {
            DocumentState::Archived => {
                cycle.archived += 1;
                record(
                    paths,
                    "archive",
                    "ok",
                    &format!(
                        "name={} artifact={} archive={}",
                        outcome.name,
                        outcome.artifact_path.as_deref().unwrap_or("-"),
                        outcome.archive_path.as_deref().unwrap_or("-"),
                    ),
                );
            }
            _ => {
                cycle.failed += 1;
                record(
                    paths,
                    outcome.failed_stage.unwrap_or("pipeline"),
                    "degraded",
                    outcome.error.as_deref().unwrap_or("unknown failure"),
                );
            }
        }
        cycle.outcomes.push(outcome);
    }

    if cycle.scanned > 0 || cycle.skipped_entries > 0 {
        record(
            paths,
            "batch",
            if cycle.failed == 0 { "ok" } else { "degraded" },
            &format!(
                "scanned={} archived={} failed={} skipped={}",
                cycle.scanned, cycle.archived, cycle.failed, cycle.skipped_entries
            ),
        );
    }

    Ok(cycle)
}

fn idle_wait(interval: Duration, stop: &AtomicBool) {
    let mut remaining = interval;
    while !stop.load(Ordering::Relaxed) && !remaining.is_zero() {
        let slice = remaining.min(IDLE_SLICE);
        thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}

/// Polling loop: rescan until `stop` is raised. An empty scan idles for
/// the configured interval; a non-empty batch is followed by an
/// immediate rescan.
pub fn run_loop(
    paths: &DocflowPaths,
    cfg: &DocflowConfig,
    extractor: &dyn Extractor,
    stop: &AtomicBool,
) -> Result<()> {
    let interval = Duration::from_secs(cfg.watcher.poll_interval_secs);

    while !stop.load(Ordering::Relaxed) {
        let cycle = run_cycle(paths, cfg, extractor)?;
        if cycle.scanned == 0 {
            idle_wait(interval, stop);
        }
    }
    Ok(())
}
