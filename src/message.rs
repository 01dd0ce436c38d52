//! Outbound message construction: canned descriptions, templates, truncation.
//!
//! Everything here is a pure function of its inputs so the copy can be unit
//! tested without touching the chain or the notifier.

use crate::events::JackpotSnapshot;

/// Hard cap on a published message.
pub const MAX_MESSAGE_LEN: usize = 280;
const ELLIPSIS: &str = "...";

const HASHTAGS: &str = "\n\n#100xJackpot #SonicNetwork #Blockchain #CryptoGames";

/// A decided-but-not-yet-sent social post. Ephemeral; built and discarded per
/// reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub category: String,
    pub body: String,
}

impl OutboundMessage {
    /// Compose a post from an announcement category and a raw message: known
    /// categories get their canned lead-in, the hashtag block is appended, and
    /// the result is truncated to the cap.
    pub fn compose(category: &str, message: &str) -> Self {
        let body = match describe(category) {
            Some(desc) => format!("{}\n\n{}{}", desc, message, HASHTAGS),
            None => format!("{}{}", message, HASHTAGS),
        };
        Self { category: category.to_string(), body: truncate(&body) }
    }
}

/// Canned lead-ins for announcement types the contract is known to emit.
fn describe(announcement_type: &str) -> Option<&'static str> {
    match announcement_type {
        "NEW_SECRET" => Some("A new secret word has been set in the 100x Jackpot game! Can you guess it?"),
        "JACKPOT_FUNDED" => Some("The 100x Jackpot just got bigger! More prizes to win!"),
        "JACKPOT_WON" => Some("🚨 We have a WINNER! 🚨 Someone just cracked the secret word!"),
        "NEW_HINT" => Some("A new hint is available to help you guess the secret word!"),
        "LARGE_BATCH" => Some("Just processed a lot of tokens! The jackpot is growing fast!"),
        _ => None,
    }
}

/// Truncate to MAX_MESSAGE_LEN characters. When over the cap the first 277
/// characters survive verbatim and the marker fills the rest.
pub fn truncate(body: &str) -> String {
    let chars: Vec<char> = body.chars().collect();
    if chars.len() <= MAX_MESSAGE_LEN {
        return body.to_string();
    }
    let keep = MAX_MESSAGE_LEN - ELLIPSIS.len();
    let mut out: String = chars[..keep].iter().collect();
    out.push_str(ELLIPSIS);
    out
}

pub fn milestone_message(snap: &JackpotSnapshot) -> OutboundMessage {
    OutboundMessage::compose(
        "GUESS_MILESTONE",
        &format!(
            "We've reached {} guesses from {} players! Current jackpot: {:.2} S. \
             Will you be the one to crack the secret?",
            snap.total_guesses, snap.unique_players, snap.jackpot_s
        ),
    )
}

pub fn nice_try_message(guess: &str) -> OutboundMessage {
    OutboundMessage::compose(
        "INTERESTING_GUESS",
        &format!(
            "Someone just guessed '{}' - nice try but not the secret word! \
             The jackpot continues to grow! Take a hint and try your luck!",
            guess
        ),
    )
}

pub fn daily_summary_message(snap: &JackpotSnapshot) -> OutboundMessage {
    OutboundMessage::compose(
        "DAILY_SUMMARY",
        &format!(
            "📊 Daily 100x Jackpot Update 📊\n\n\
             Current Jackpot: {:.2} S\n\
             Total Guesses: {}\n\
             Unique Players: {}\n\n\
             Will today be the day someone cracks the secret word? \
             Buy 100x tokens and take your chance!",
            snap.jackpot_s, snap.total_guesses, snap.unique_players
        ),
    )
}

/// Fixed engagement rotation for the on-chain update. Selection by day of
/// month keeps the rotation deterministic and reproducible.
pub const ENGAGEMENT_TEMPLATE_COUNT: u32 = 3;

pub fn engagement_text(day_of_month: u32, snap: &JackpotSnapshot) -> String {
    match day_of_month % ENGAGEMENT_TEMPLATE_COUNT {
        0 => format!(
            "It's game time! The 100x Jackpot stands at {:.2} S. Can you guess the secret word?",
            snap.jackpot_s
        ),
        1 => format!(
            "Feeling lucky? Our jackpot is now {:.2} S! Buy some 100x tokens and make your guess!",
            snap.jackpot_s
        ),
        _ => format!(
            "100x Challenge: Guess the secret word and win {:.2} S! Hints are available!",
            snap.jackpot_s
        ),
    }
}
