use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::warn;

use crate::types::RunEvent;

/// Progress seam handed to the pipeline; each call reports intent for one
/// step.
pub type ProgressHandler = Arc<dyn Fn(String) + Send + Sync>;

/// Creates the single-producer event conduit for one run.
pub fn run_event_channel() -> (RunEventSender, mpsc::UnboundedReceiver<RunEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        RunEventSender {
            tx,
            terminal_sent: Arc::new(AtomicBool::new(false)),
        },
        rx,
    )
}

#[derive(Clone)]
/// Public struct `RunEventSender` used across Cartwheel components.
///
/// Enforces the event ordering contract: progress records are dropped once a
/// terminal has been sent, and only the first terminal is delivered. Send
/// failures are swallowed; the conduit is a best-effort notification channel.
pub struct RunEventSender {
    tx: mpsc::UnboundedSender<RunEvent>,
    terminal_sent: Arc<AtomicBool>,
}

impl RunEventSender {
    pub fn send_progress(&self, message: impl Into<String>) {
        if self.terminal_sent.load(Ordering::Acquire) {
            warn!("dropping progress event emitted after terminal");
            return;
        }
        let _ = self.tx.send(RunEvent::Progress {
            message: message.into(),
        });
    }

    pub fn send_terminal(&self, event: RunEvent) {
        if !event.is_terminal() {
            warn!("dropping non-terminal event passed to send_terminal");
            return;
        }
        if self.terminal_sent.swap(true, Ordering::AcqRel) {
            warn!("dropping duplicate terminal event");
            return;
        }
        let _ = self.tx.send(event);
    }

    pub fn progress_handler(&self) -> ProgressHandler {
        let sender = self.clone();
        Arc::new(move |message: String| sender.send_progress(message))
    }
}

#[derive(Clone, Default)]
/// Public struct `ProgressLog` used across Cartwheel components.
///
/// The buffered realization's side list: progress messages accumulate here
/// (and are logged) instead of streaming individually.
pub struct ProgressLog {
    entries: Arc<Mutex<Vec<String>>>,
}

impl ProgressLog {
    pub fn handler(&self) -> ProgressHandler {
        let entries = Arc::clone(&self.entries);
        Arc::new(move |message: String| {
            tracing::info!("{message}");
            if let Ok(mut entries) = entries.lock() {
                entries.push(message);
            }
        })
    }

    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}
