//! Event types for newline-delimited JSON output.
//!
//! Some CLI tools report progress as one JSON object per line. The bridge
//! only cares about terminal `item.completed` events carrying an
//! `agent_message`; everything else, including lines that are not JSON at
//! all, is noise to be skipped.

use serde::{Deserialize, Serialize};

/// Item carried by an `item.completed` event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventItem {
    /// Final assistant message text.
    AgentMessage {
        /// The message text.
        text: String,
    },
    /// Catch-all for item types the bridge does not interpret.
    #[serde(other)]
    Unknown,
}

/// One event in a newline-delimited JSON stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CliEvent {
    /// An item finished; may carry the completion text.
    #[serde(rename = "item.completed")]
    ItemCompleted {
        /// The completed item.
        item: EventItem,
    },
    /// Catch-all for event types the bridge does not interpret.
    #[serde(other)]
    Unknown,
}

impl CliEvent {
    /// Non-empty agent message text, if this event carries one.
    #[must_use]
    pub fn agent_message(&self) -> Option<&str> {
        match self {
            Self::ItemCompleted {
                item: EventItem::AgentMessage { text },
            } if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

/// Extract the final agent message from an event stream.
///
/// Scans line by line; lines that fail to parse as JSON are skipped, as are
/// parsed events of the wrong shape. Among matching events the last message
/// wins, since earlier agent messages are intermediate drafts. Returns
/// `None` when no event matches; that is a fallthrough, not an error.
#[must_use]
pub fn extract_agent_message(stdout: &str) -> Option<String> {
    let mut last = None;
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Ok(event) = serde_json::from_str::<CliEvent>(line) else {
            continue;
        };
        if let Some(text) = event.agent_message() {
            last = Some(text.trim().to_string());
        }
    }
    last
}
