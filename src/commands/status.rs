use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::commands::CommandReport;
use crate::pipeline::config::load_config;
use crate::pipeline::paths::resolve_paths;

fn count_files_with_suffix(dir: &Path, suffix: Option<&str>) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .filter(|entry| {
            let path = entry.path();
            if !path.is_file() {
                return false;
            }
            match suffix {
                None => true,
                Some(suffix) => path
                    .file_name()
                    .and_then(|s| s.to_str())
                    .is_some_and(|name| name.ends_with(suffix)),
            }
        })
        .count()
}

pub fn run() -> Result<CommandReport> {
    let mut report = CommandReport::new("status");
    let paths = resolve_paths()?;
    let cfg = load_config()?;

    report.detail(format!("home={}", paths.docflow_home.display()));
    report.detail(format!("inbox={}", paths.inbox_dir.display()));
    report.detail(format!("output={}", paths.output_dir.display()));
    report.detail(format!("archive={}", paths.archive_dir.display()));
    report.detail(format!("logs={}", paths.logs_dir.display()));
    report.detail(format!("suffix={}", cfg.scanner.suffix));
    report.detail(format!(
        "poll_interval_secs={}",
        cfg.watcher.poll_interval_secs
    ));

    report.detail(format!(
        "pending={}",
        count_files_with_suffix(&paths.inbox_dir, Some(&cfg.scanner.suffix))
    ));
    report.detail(format!(
        "processed={}",
        count_files_with_suffix(&paths.output_dir, Some(".json"))
    ));
    report.detail(format!(
        "archived={}",
        count_files_with_suffix(&paths.archive_dir, None)
    ));

    Ok(report)
}
