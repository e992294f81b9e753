//! Core protocol types for Throwdown's wire format.
//!
//! Every message on the socket is a JSON object with a `type` field that
//! names the message, plus the fields for that message:
//!
//! ```text
//! {"type": "round_start", "round": 2, "timeout_secs": 15}
//! ```
//!
//! Both directions are modelled as closed enums ([`ServerMessage`],
//! [`ClientMessage`]) so a frame is decoded exactly once, at the transport
//! boundary, and everything above it matches on variants instead of
//! probing for fields.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Gestures
// ---------------------------------------------------------------------------

/// A gesture the local player can submit for a round.
///
/// Serialized in lowercase (`"rock"`, `"paper"`, `"scissors"`), which is
/// what the server expects inside `choice` messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// All gestures, in display order.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// The wire spelling of this gesture.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rock => "rock",
            Self::Paper => "paper",
            Self::Scissors => "scissors",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Choice {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rock" | "r" => Ok(Self::Rock),
            "paper" | "p" => Ok(Self::Paper),
            "scissors" | "s" => Ok(Self::Scissors),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown choice {other:?}"
            ))),
        }
    }
}

/// A gesture as revealed by the server after a round resolves.
///
/// Unlike [`Choice`], a reveal can be `"none"`: the player didn't submit
/// anything before the round deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reveal {
    Rock,
    Paper,
    Scissors,
    None,
}

impl Reveal {
    /// The submitted gesture, or `None` if the player timed out.
    pub fn choice(self) -> Option<Choice> {
        match self {
            Self::Rock => Some(Choice::Rock),
            Self::Paper => Some(Choice::Paper),
            Self::Scissors => Some(Choice::Scissors),
            Self::None => None,
        }
    }
}

impl From<Choice> for Reveal {
    fn from(choice: Choice) -> Self {
        match choice {
            Choice::Rock => Self::Rock,
            Choice::Paper => Self::Paper,
            Choice::Scissors => Self::Scissors,
        }
    }
}

impl fmt::Display for Reveal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.choice() {
            Some(choice) => choice.fmt(f),
            None => f.write_str("none"),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Who took a round, from the receiving player's point of view.
///
/// Taken verbatim from the server; the client never works this out itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundWinner {
    You,
    Opponent,
    Draw,
}

/// How a match ended for the receiving player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Win,
    Loss,
    Draw,
}

/// The opponent as announced in `match_found`.
///
/// The server names the rating field `elo`; `rating` is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpponentInfo {
    pub username: String,
    #[serde(alias = "elo")]
    pub rating: i32,
}

/// Payload of a `round_result` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// The round this result belongs to (1-based).
    pub round: u32,
    pub your_choice: Reveal,
    pub opponent_choice: Reveal,
    pub winner: RoundWinner,
    /// Running match score after this round.
    pub your_score: u32,
    pub opponent_score: u32,
}

/// Payload of a `match_complete` message.
///
/// `elo_change` and `new_elo` are only present for ranked matches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub result: MatchResult,
    pub your_score: u32,
    pub opponent_score: u32,
    #[serde(default)]
    pub elo_change: Option<i32>,
    #[serde(default)]
    pub new_elo: Option<i32>,
}

impl MatchOutcome {
    /// Returns `true` if the match adjusted the player's rating.
    pub fn is_rated(&self) -> bool {
        self.elo_change.is_some() || self.new_elo.is_some()
    }
}

// ---------------------------------------------------------------------------
// ServerMessage: server → client
// ---------------------------------------------------------------------------

/// Every message the match server can push to a client.
///
/// `#[serde(tag = "type", rename_all = "snake_case")]` produces internally
/// tagged JSON with snake_case names, e.g. `RoundStart` becomes
/// `{"type": "round_start", ...}`. A frame with an unknown tag fails to
/// decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The server put us in the matchmaking queue.
    Queued,

    /// An opponent was paired with us; a match is starting.
    MatchFound {
        opponent: OpponentInfo,
        /// Server-side match identifier, when the server sends one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },

    /// A round is open for choices until `timeout_secs` elapse.
    RoundStart { round: u32, timeout_secs: u32 },

    /// The opponent locked in a gesture for the current round.
    OpponentChose,

    /// The server resolved a round.
    RoundResult(RoundOutcome),

    /// The server ended the match.
    MatchComplete(MatchOutcome),

    /// The opponent left mid-match.
    OpponentDisconnected,

    /// The server rejected something we did.
    Error { message: String },
}

impl ServerMessage {
    /// The wire name of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::MatchFound { .. } => "match_found",
            Self::RoundStart { .. } => "round_start",
            Self::OpponentChose => "opponent_chose",
            Self::RoundResult(_) => "round_result",
            Self::MatchComplete(_) => "match_complete",
            Self::OpponentDisconnected => "opponent_disconnected",
            Self::Error { .. } => "error",
        }
    }
}

// ---------------------------------------------------------------------------
// ClientMessage: client → server
// ---------------------------------------------------------------------------

/// Every message a client can send to the match server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter matchmaking. Guests are always matched casually.
    JoinQueue { ranked: bool },

    /// Leave matchmaking before a match is found.
    LeaveQueue,

    /// Lock in a gesture for the current round.
    Choice { choice: Choice },
}

impl ClientMessage {
    /// The wire name of this message, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::JoinQueue { .. } => "join_queue",
            Self::LeaveQueue => "leave_queue",
            Self::Choice { .. } => "choice",
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
