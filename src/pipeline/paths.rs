use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Resolved storage locations for one pipeline instance.
///
/// The archive is deliberately nested under the inbox root (the scanner
/// skips it by path) so a single directory tree carries the whole
/// document lifecycle.
#[derive(Debug, Clone)]
pub struct DocflowPaths {
    pub docflow_home: PathBuf,
    pub inbox_dir: PathBuf,
    pub output_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<DocflowPaths> {
    let home = required_home_dir()?;
    let docflow_home = env_or_default_path("DOCFLOW_HOME", home.join("docflow"));

    let inbox_dir = env_or_default_path("DOCFLOW_INBOX_DIR", docflow_home.join("inbox"));
    let output_dir = env_or_default_path("DOCFLOW_OUTPUT_DIR", docflow_home.join("output"));
    let archive_dir = inbox_dir.join("archive");
    let logs_dir = env_or_default_path("DOCFLOW_LOGS_DIR", docflow_home.join("logs"));

    Ok(DocflowPaths {
        docflow_home,
        inbox_dir,
        output_dir,
        archive_dir,
        logs_dir,
    })
}
