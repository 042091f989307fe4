use crate::extract::{Extractor, parse_result_json};
use anyhow::{Context, Result};
use serde_json::Value;
use std::io::Write;
use std::process::{Command, Stdio};

/// Extraction via a local subprocess: the instruction is passed as the
/// single argument, the document content on stdin, and stdout must be a
/// JSON object. Used for offline setups and as the test stub.
pub struct CommandExtractor {
    pub program: String,
}

impl Extractor for CommandExtractor {
    fn label(&self) -> &'static str {
        "command"
    }

    fn extract(&self, instruction: &str, content: &str) -> Result<Value> {
        let mut child = Command::new(&self.program)
            .arg(instruction)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to run extract command {}", self.program))?;

        // Feed stdin from its own thread; writing inline deadlocks once
        // the child fills the stdout pipe before draining its input.
        let mut stdin = child
            .stdin
            .take()
            .context("extract command stdin unavailable")?;
        let payload = content.to_string();
        let feeder = std::thread::spawn(move || stdin.write_all(payload.as_bytes()));

        let out = child.wait_with_output()?;
        // A closed stdin (child exited early) is reported via the exit
        // status, not the broken pipe.
        let _ = feeder.join();
        if !out.status.success() {
            anyhow::bail!(
                "extract command {} failed: {}",
                self.program,
                String::from_utf8_lossy(&out.stderr).trim()
            );
        }

        parse_result_json(&String::from_utf8_lossy(&out.stdout))
    }
}
