//! Pure event classification: raw contract events in, reaction intents out.
//!
//! No I/O happens here. The monitoring task fetches whatever snapshot state a
//! decision needs and passes it in, so every rule below can be tested as a
//! plain function.

use sha2::{Digest, Sha256};

use crate::error::AgentError;
use crate::events::{Event, EventKind, JackpotSnapshot};
use crate::message::{milestone_message, nice_try_message, OutboundMessage};

/// A decided-but-not-yet-executed side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum ReactionIntent {
    /// Hand the message to the notifier.
    Publish(OutboundMessage),
    /// Log-only observation, no outbound side effect.
    Observe { event: &'static str, detail: String },
}

/// Deterministic sampling gate for guess commentary. Seedable so tests can
/// force both branches; sha256 keeps the decision stable across processes,
/// unlike the language's generic hasher.
#[derive(Debug, Clone, Copy)]
pub struct GuessSampler {
    pub seed: u64,
    pub modulus: u64,
    pub min_len: usize,
}

impl GuessSampler {
    pub fn new(seed: u64, modulus: u64, min_len: usize) -> Self {
        Self { seed, modulus: modulus.max(1), min_len }
    }

    /// Stable 64-bit digest of the guess under this sampler's seed.
    pub fn digest(&self, guess: &str) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_be_bytes());
        hasher.update(guess.as_bytes());
        let out = hasher.finalize();
        u64::from_be_bytes(out[..8].try_into().unwrap())
    }

    /// True for roughly 1-in-modulus guesses. A sampling policy, not a
    /// correctness filter.
    pub fn selects(&self, guess: &str) -> bool {
        self.digest(guess) % self.modulus == 0
    }
}

/// Classify one event into zero or more reaction intents.
///
/// `snapshot` carries the fresh aggregate state for rules that need it
/// (milestone check, milestone copy). Errors are per-event: the caller logs
/// and moves on to the rest of the batch.
pub fn classify(
    event: &Event,
    snapshot: Option<&JackpotSnapshot>,
    sampler: &GuessSampler,
) -> Result<Vec<ReactionIntent>, AgentError> {
    match event.kind {
        EventKind::SocialAnnouncement => {
            let announcement_type = event.field("announcementType")?;
            let message = event.field("message")?;
            Ok(vec![ReactionIntent::Publish(OutboundMessage::compose(
                announcement_type,
                message,
            ))])
        }
        EventKind::GuessCommitted => {
            let snap = snapshot.ok_or_else(|| {
                AgentError::Classification(format!(
                    "GuessCommitted at height {} classified without a snapshot",
                    event.block_height
                ))
            })?;
            if snap.total_guesses % 10 == 0 {
                Ok(vec![ReactionIntent::Publish(milestone_message(snap))])
            } else {
                Ok(vec![])
            }
        }
        EventKind::GuessRevealed => {
            let won = event.field_bool("won")?;
            let guess = event.field("guess")?;
            if !won && guess.chars().count() > sampler.min_len && sampler.selects(guess) {
                Ok(vec![ReactionIntent::Publish(nice_try_message(guess))])
            } else {
                Ok(vec![])
            }
        }
        EventKind::JackpotWon => {
            // The contract already emits the SocialAnnouncement for a win;
            // this kind is observed for the record only.
            let winner = event.field("winner")?;
            let amount = event.field("amount")?;
            let guess = event.field("guess")?;
            Ok(vec![ReactionIntent::Observe {
                event: "jackpot_won",
                detail: format!("winner={} amount={} guess={}", winner, amount, guess),
            }])
        }
    }
}
