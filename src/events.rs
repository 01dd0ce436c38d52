use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AgentError;

/// The contract events the agent tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SocialAnnouncement,
    GuessCommitted,
    GuessRevealed,
    JackpotWon,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::SocialAnnouncement,
        EventKind::GuessCommitted,
        EventKind::GuessRevealed,
        EventKind::JackpotWon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SocialAnnouncement => "SocialAnnouncement",
            EventKind::GuessCommitted => "GuessCommitted",
            EventKind::GuessRevealed => "GuessRevealed",
            EventKind::JackpotWon => "JackpotWon",
        }
    }
}

/// A decoded contract event. Immutable once read; consumed exactly once by the
/// monitoring task that queried it.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub fields: HashMap<String, String>,
    pub block_height: u64,
}

impl Event {
    pub fn new(kind: EventKind, block_height: u64) -> Self {
        Self { kind, fields: HashMap::new(), block_height }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    /// Required-field accessor; absence is a per-event classification error.
    pub fn field(&self, name: &str) -> Result<&str, AgentError> {
        self.fields.get(name).map(|v| v.as_str()).ok_or_else(|| {
            AgentError::Classification(format!(
                "{} event at height {} missing field {}",
                self.kind.as_str(),
                self.block_height,
                name
            ))
        })
    }

    pub fn field_bool(&self, name: &str) -> Result<bool, AgentError> {
        match self.field(name)? {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            other => Err(AgentError::Classification(format!(
                "{} field {} is not a bool: {}",
                self.kind.as_str(),
                name,
                other
            ))),
        }
    }
}

/// Point-in-time read of the contract's aggregate state. Fetched fresh per
/// read; no staleness guarantee beyond "as of the call".
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct JackpotSnapshot {
    /// Jackpot in whole S tokens (converted from wei by the chain client).
    pub jackpot_s: f64,
    pub total_guesses: u64,
    pub unique_players: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_is_classification_error() {
        let ev = Event::new(EventKind::GuessRevealed, 7);
        let err = ev.field("guess").unwrap_err();
        assert_eq!(err.kind(), "classification");
        assert!(err.to_string().contains("height 7"));
    }

    #[test]
    fn test_field_bool_parses() {
        let ev = Event::new(EventKind::GuessRevealed, 1)
            .with_field("won", "false")
            .with_field("odd", "maybe");
        assert!(!ev.field_bool("won").unwrap());
        assert!(ev.field_bool("odd").is_err());
    }
}
