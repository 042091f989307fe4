pub mod command;
pub mod gemini;
pub mod openai_compat;

use crate::pipeline::config::ExtractConfig;
use anyhow::{Context, Result};
use serde_json::Value;
use std::env;
use std::time::Duration;

pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// External extraction capability: raw document content in, structured
/// mapping out. Providers do not retry; a failure leaves the document in
/// the inbox for the next scan cycle.
pub trait Extractor {
    fn label(&self) -> &'static str;
    fn extract(&self, instruction: &str, content: &str) -> Result<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Provider {
    Gemini,
    OpenAiCompatible,
    Command,
}

fn env_non_empty(var: &str) -> Option<String> {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => Some(v.trim().to_string()),
        _ => None,
    }
}

fn parse_provider_alias(raw: &str) -> Option<Provider> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "gemini" | "google" => Some(Provider::Gemini),
        "openai-compatible" | "compatible" | "openai" => Some(Provider::OpenAiCompatible),
        "command" => Some(Provider::Command),
        _ => None,
    }
}

fn infer_provider_from_model(model: &str) -> Option<Provider> {
    let lower = model.trim().to_ascii_lowercase();
    if lower.starts_with("gemini-") {
        return Some(Provider::Gemini);
    }
    if lower.starts_with("gpt-") || lower.starts_with("deepseek-") {
        return Some(Provider::OpenAiCompatible);
    }
    None
}

fn first_available_provider() -> Option<Provider> {
    if env_non_empty("DOCFLOW_EXTRACT_CMD").is_some() {
        return Some(Provider::Command);
    }
    if env_non_empty("GEMINI_API_KEY").is_some() || env_non_empty("GOOGLE_API_KEY").is_some() {
        return Some(Provider::Gemini);
    }
    if env_non_empty("AI_API_KEY").is_some() || env_non_empty("OPENAI_API_KEY").is_some() {
        return Some(Provider::OpenAiCompatible);
    }
    None
}

fn default_model_for_provider(provider: Provider) -> &'static str {
    match provider {
        Provider::Gemini => "gemini-1.5-flash",
        Provider::OpenAiCompatible => "gpt-4.1-mini",
        Provider::Command => "",
    }
}

fn resolve_api_key(provider: Provider) -> Result<String> {
    let key = match provider {
        Provider::Gemini => env_non_empty("GEMINI_API_KEY")
            .or_else(|| env_non_empty("GOOGLE_API_KEY"))
            .or_else(|| env_non_empty("AI_API_KEY")),
        Provider::OpenAiCompatible => {
            env_non_empty("AI_API_KEY").or_else(|| env_non_empty("OPENAI_API_KEY"))
        }
        Provider::Command => return Ok(String::new()),
    };
    key.with_context(|| format!("no API key configured for provider {provider:?}"))
}

fn resolve_compatible_base_url() -> String {
    env_non_empty("AI_BASE_URL").unwrap_or_else(|| "https://api.openai.com".to_string())
}

/// Pick the extractor for this process: explicit provider from config,
/// otherwise inferred from the model name or whichever credentials are
/// present.
pub fn resolve_extractor(cfg: &ExtractConfig) -> Result<Box<dyn Extractor>> {
    let provider = match cfg.provider.trim() {
        "auto" | "" => infer_provider_from_model(&cfg.model)
            .or_else(first_available_provider)
            .context(
                "no extraction provider configured; set GEMINI_API_KEY, AI_API_KEY, \
                 or DOCFLOW_EXTRACT_CMD",
            )?,
        alias => parse_provider_alias(alias)
            .with_context(|| format!("unknown extraction provider alias {alias:?}"))?,
    };

    let model = if cfg.model.trim().is_empty() {
        default_model_for_provider(provider).to_string()
    } else {
        cfg.model.trim().to_string()
    };

    Ok(match provider {
        Provider::Gemini => Box::new(gemini::GeminiExtractor {
            api_key: resolve_api_key(provider)?,
            model,
        }),
        Provider::OpenAiCompatible => Box::new(openai_compat::OpenAiCompatExtractor {
            api_key: resolve_api_key(provider)?,
            model,
            base_url: resolve_compatible_base_url(),
        }),
        Provider::Command => Box::new(command::CommandExtractor {
            program: env_non_empty("DOCFLOW_EXTRACT_CMD")
                .context("DOCFLOW_EXTRACT_CMD is required for the command provider")?,
        }),
    })
}

/// Recover a JSON object from model output. Models fence or preface the
/// payload often enough that a raw parse alone is not reliable.
pub fn parse_result_json(raw: &str) -> Result<Value> {
    let trimmed = raw.trim();

    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_start())
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed);

    if let Ok(value) = serde_json::from_str::<Value>(unfenced)
        && value.is_object()
    {
        return Ok(value);
    }

    let start = unfenced.find('{');
    let end = unfenced.rfind('}');
    if let (Some(start), Some(end)) = (start, end)
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&unfenced[start..=end])
        && value.is_object()
    {
        return Ok(value);
    }

    anyhow::bail!("extractor response is not a JSON object")
}
