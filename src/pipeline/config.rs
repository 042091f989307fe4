use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Name suffix an inbox entry must carry to count as a document.
    pub suffix: String,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            suffix: ".txt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub poll_interval_secs: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Provider alias: `auto`, `gemini`, `openai-compatible`, or `command`.
    pub provider: String,
    pub model: String,
    /// Task instruction prepended to every document sent out for extraction.
    pub instruction: String,
}

pub const DEFAULT_INSTRUCTION: &str = "You are a data extraction agent. \
Extract every business-relevant field from the document below and return \
strictly valid JSON: a single object of key/value pairs. Do not include \
commentary or markdown fences.";

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            provider: "auto".to_string(),
            model: String::new(),
            instruction: DEFAULT_INSTRUCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DocflowConfig {
    pub scanner: ScannerConfig,
    pub watcher: WatcherConfig,
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialDocflowConfig {
    scanner: Option<ScannerConfig>,
    watcher: Option<WatcherConfig>,
    extract: Option<ExtractConfig>,
}

fn env_or_u64(var: &str, fallback: u64) -> u64 {
    match env::var(var) {
        Ok(v) => v.trim().parse::<u64>().ok().unwrap_or(fallback),
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &DocflowConfig) -> Result<()> {
    let suffix = cfg.scanner.suffix.trim();
    if suffix.is_empty() || !suffix.starts_with('.') || suffix.len() < 2 {
        return Err(anyhow!(
            "invalid scanner suffix {:?}: must start with `.` and name an extension",
            cfg.scanner.suffix
        ));
    }
    if cfg.watcher.poll_interval_secs == 0 {
        return Err(anyhow!(
            "invalid watcher poll interval: must be >= 1 second"
        ));
    }
    if cfg.extract.instruction.trim().is_empty() {
        return Err(anyhow!("invalid extract instruction: cannot be empty"));
    }
    match cfg.extract.provider.trim() {
        "auto" | "gemini" | "openai-compatible" | "command" => Ok(()),
        other => Err(anyhow!(
            "invalid extract provider {other:?}: use `auto`, `gemini`, `openai-compatible`, or `command`"
        )),
    }
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("DOCFLOW_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let config = dirs::config_dir()?;
    Some(config.join("docflow").join("docflow.toml"))
}

fn merge_file_config(base: &mut DocflowConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialDocflowConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse docflow config {}: {err}", path.display()))?;
    if let Some(scanner) = parsed.scanner {
        base.scanner = scanner;
    }
    if let Some(watcher) = parsed.watcher {
        base.watcher = watcher;
    }
    if let Some(extract) = parsed.extract {
        base.extract = extract;
    }
    Ok(())
}

pub fn load_config() -> Result<DocflowConfig> {
    let mut cfg = DocflowConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.scanner.suffix = env_or_string("DOCFLOW_SCAN_SUFFIX", &cfg.scanner.suffix);
    cfg.watcher.poll_interval_secs =
        env_or_u64("DOCFLOW_POLL_INTERVAL_SECS", cfg.watcher.poll_interval_secs);
    cfg.extract.provider = env_or_string("DOCFLOW_EXTRACT_PROVIDER", &cfg.extract.provider);
    cfg.extract.model = env_or_string("DOCFLOW_EXTRACT_MODEL", &cfg.extract.model);
    cfg.extract.instruction =
        env_or_string("DOCFLOW_EXTRACT_INSTRUCTION", &cfg.extract.instruction);

    validate(&cfg)?;
    Ok(cfg)
}
