use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs;
use std::fs::File;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::commands::CommandReport;
use crate::extract;
use crate::pipeline::config::load_config;
use crate::pipeline::layout::ensure_layout;
use crate::pipeline::orchestrator::{self, CycleOutcome};
use crate::pipeline::paths::resolve_paths;

pub const WATCH_LOCK_FILE: &str = "docflow-watch.lock";

/// Raised by SIGTERM/SIGINT; the loop finishes the document in flight
/// and exits between cycles.
static STOP: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn handle_stop_signal(_signal: nix::libc::c_int) {
    STOP.store(true, Ordering::Relaxed);
}

#[cfg(unix)]
fn install_stop_handlers() -> Result<()> {
    use nix::sys::signal::{SigHandler, Signal, signal};

    let handler = SigHandler::Handler(handle_stop_signal);
    unsafe {
        signal(Signal::SIGTERM, handler).context("failed to install SIGTERM handler")?;
        signal(Signal::SIGINT, handler).context("failed to install SIGINT handler")?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn install_stop_handlers() -> Result<()> {
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct WatchOptions {
    pub once: bool,
}

fn acquire_watch_lock(lock_dir: &std::path::Path) -> Result<File> {
    fs::create_dir_all(lock_dir)
        .with_context(|| format!("failed to create {}", lock_dir.display()))?;
    let lock_path = lock_dir.join(WATCH_LOCK_FILE);
    let mut file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;

    file.try_lock_exclusive().with_context(|| {
        format!(
            "another docflow watch holds {}; stop it first",
            lock_path.display()
        )
    })?;

    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(file)
}

fn report_cycle(report: &mut CommandReport, cycle: &CycleOutcome) {
    report.detail(format!("scanned={}", cycle.scanned));
    report.detail(format!("archived={}", cycle.archived));
    report.detail(format!("failed={}", cycle.failed));
    report.detail(format!("skipped_entries={}", cycle.skipped_entries));
    for outcome in &cycle.outcomes {
        match &outcome.error {
            None => report.detail(format!(
                "document={} state={} artifact={}",
                outcome.name,
                outcome.state.as_str(),
                outcome.artifact_path.as_deref().unwrap_or("-"),
            )),
            Some(error) => report.detail(format!(
                "document={} state={} error={}",
                outcome.name,
                outcome.state.as_str(),
                error
            )),
        }
    }
}

pub fn run(opts: &WatchOptions) -> Result<CommandReport> {
    let mut report = CommandReport::new("watch");

    let paths = resolve_paths()?;
    let cfg = load_config()?;
    ensure_layout(&paths)?;
    let extractor = extract::resolve_extractor(&cfg.extract)?;

    report.detail(format!("inbox={}", paths.inbox_dir.display()));
    report.detail(format!("output={}", paths.output_dir.display()));
    report.detail(format!("archive={}", paths.archive_dir.display()));
    report.detail(format!("extractor={}", extractor.label()));

    // Exclusive lock enforces the single-consumer model; a second watcher
    // (or a concurrent --once run) would race the same inbox entries.
    let _lock = acquire_watch_lock(&paths.logs_dir)?;

    if opts.once {
        let cycle = orchestrator::run_cycle(&paths, &cfg, extractor.as_ref())?;
        report_cycle(&mut report, &cycle);
        return Ok(report);
    }

    report.detail(format!(
        "watching inbox, poll_interval_secs={}",
        cfg.watcher.poll_interval_secs
    ));
    install_stop_handlers()?;
    orchestrator::run_loop(&paths, &cfg, extractor.as_ref(), &STOP)?;
    report.detail("watch loop stopped");
    Ok(report)
}
