//! Per-call session state for the console flow.

use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

use crate::turn::CUSTOMER_GREETING;

/// One simulated phone call, from greeting to hang-up. The history is
/// append-only for the lifetime of the session.
pub struct CallSession {
    pub session_id: String,
    pub context: String,
    pub behavior: Option<String>,
    pub chat_history: String,
}

impl CallSession {
    pub fn new(session_id: &str, context: String, behavior: Option<String>) -> Self {
        Self {
            session_id: session_id.to_string(),
            context,
            behavior,
            chat_history: String::new(),
        }
    }

    /// Records the customer picking up the phone.
    pub fn record_greeting(&mut self) {
        self.chat_history
            .push_str(&format!("Customer: {}\n", CUSTOMER_GREETING));
    }

    /// Appends one completed agent→customer exchange.
    pub fn record_exchange(&mut self, agent_message: &str, customer_reply: &str) {
        self.chat_history
            .push_str(&format!("Agent: {}\nCustomer: {}\n", agent_message, customer_reply));
    }

    /// Writes the literal accumulated history to
    /// `transcript_{session_id}_{YYYYMMDD_HHMMSS}.txt` under `dir`.
    pub fn save_transcript(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("transcript_{}_{}.txt", self.session_id, timestamp));
        fs::write(&path, self.chat_history.as_bytes())?;
        Ok(path)
    }
}
