use crate::extract::{Extractor, REQUEST_TIMEOUT, parse_result_json};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;

pub struct OpenAiCompatExtractor {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

fn extract_completion_text(json: &Value) -> Option<String> {
    json.get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

impl Extractor for OpenAiCompatExtractor {
    fn label(&self) -> &'static str {
        "openai-compatible"
    }

    fn extract(&self, instruction: &str, content: &str) -> Result<Value> {
        let base = self.base_url.trim_end_matches('/');
        let url = format!("{base}/v1/chat/completions");
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": instruction},
                {"role": "user", "content": content}
            ],
            "temperature": 0.2
        });

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let response = client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()?;
        if !response.status().is_success() {
            anyhow::bail!(
                "openai-compatible call failed with status {}",
                response.status()
            );
        }

        let json: Value = response.json()?;
        let text = extract_completion_text(&json)
            .context("openai-compatible response missing text content")?;
        parse_result_json(&text)
    }
}
