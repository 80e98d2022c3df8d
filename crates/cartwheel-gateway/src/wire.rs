use anyhow::{bail, Result};
use serde_json::Value;
use tracing::warn;

use cartwheel_pipeline::{RunEvent, RunResult};

/// Serializes one event as a self-delimited NDJSON record.
///
/// Encoding failures are swallowed into an error record; this is a
/// best-effort notification channel, not a reliable delivery channel.
pub fn encode_event_line(event: &RunEvent) -> String {
    let mut line = serde_json::to_string(event).unwrap_or_else(|error| {
        warn!("failed to encode run event: {error}");
        "{\"type\":\"error\",\"error\":\"event serialization failed\"}".to_string()
    });
    line.push('\n');
    line
}

#[derive(Debug, Default)]
/// Public struct `NdjsonEventDecoder` used across Cartwheel components.
///
/// Incremental consumer-side decoder: buffers raw bytes, splits on newline
/// boundaries, parses each line independently. A line that fails to parse is
/// logged and skipped without aborting the read.
pub struct NdjsonEventDecoder {
    line_buffer: String,
}

impl NdjsonEventDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_chunk(&mut self, chunk: &[u8]) -> Vec<RunEvent> {
        self.line_buffer
            .push_str(&String::from_utf8_lossy(chunk));

        let mut events = Vec::new();
        while let Some(pos) = self.line_buffer.find('\n') {
            let line = self.line_buffer[..pos].trim_end_matches('\r').to_string();
            self.line_buffer.drain(..=pos);
            if let Some(event) = parse_event_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flushes a final record that arrived without a trailing delimiter.
    pub fn finish(&mut self) -> Option<RunEvent> {
        let line = std::mem::take(&mut self.line_buffer);
        parse_event_line(line.trim())
    }
}

fn parse_event_line(line: &str) -> Option<RunEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<RunEvent>(trimmed) {
        Ok(event) => Some(event),
        Err(error) => {
            warn!("skipping malformed event record: {error}");
            None
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Public struct `StreamedRunOutcome` used across Cartwheel components.
pub struct StreamedRunOutcome {
    pub progress: Vec<String>,
    pub result: Option<RunResult>,
    pub error: Option<String>,
}

impl StreamedRunOutcome {
    pub fn is_terminated(&self) -> bool {
        self.result.is_some() || self.error.is_some()
    }

    pub fn apply(&mut self, event: RunEvent) {
        if self.is_terminated() {
            warn!("ignoring event received after terminal");
            return;
        }
        match event {
            RunEvent::Progress { message } => self.progress.push(message),
            RunEvent::Result { data } => self.result = Some(data),
            RunEvent::Error { error } => self.error = Some(error),
        }
    }
}

/// Folds a decoded event sequence into its observable outcome.
pub fn collect_run_events(events: impl IntoIterator<Item = RunEvent>) -> StreamedRunOutcome {
    let mut outcome = StreamedRunOutcome::default();
    for event in events {
        outcome.apply(event);
    }
    outcome
}

/// Fallback buffered delivery: one JSON object body. A non-2xx status means
/// the body's `error` field carries the failure reason.
pub fn decode_buffered_response(status: u16, body: &[u8]) -> Result<RunResult> {
    if !(200..300).contains(&status) {
        let reason = serde_json::from_slice::<Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .get("error")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("request failed with status {status}"));
        bail!(reason);
    }

    let result = serde_json::from_slice::<RunResult>(body)?;
    Ok(result)
}
