use crate::extract::{Extractor, REQUEST_TIMEOUT, parse_result_json};
use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;

pub struct GeminiExtractor {
    pub api_key: String,
    pub model: String,
}

impl Extractor for GeminiExtractor {
    fn label(&self) -> &'static str {
        "gemini"
    }

    fn extract(&self, instruction: &str, content: &str) -> Result<Value> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let prompt = format!("{instruction}\n\nInput Text:\n{content}");
        let payload = serde_json::json!({
            "contents": [
                {
                    "parts": [
                        {"text": prompt}
                    ]
                }
            ]
        });

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        let response = client.post(&url).json(&payload).send()?;
        if !response.status().is_success() {
            anyhow::bail!("gemini call failed with status {}", response.status());
        }
        let json: Value = response.json()?;
        let text = json
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(|v| v.get("content"))
            .and_then(|v| v.get("parts"))
            .and_then(Value::as_array)
            .and_then(|parts| parts.first())
            .and_then(|v| v.get("text"))
            .and_then(Value::as_str)
            .context("gemini response missing text content")?;

        parse_result_json(text)
    }
}
