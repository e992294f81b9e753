//! Session types: the data the presentation layer renders.
//!
//! A "session" is the client's view of one queue-and-match cycle. It
//! tracks:
//! - WHERE we are in the cycle (`Phase`)
//! - WHO we're playing (`OpponentInfo`)
//! - WHAT has happened so far (score, move history, outcomes)
//!
//! Nothing in this module changes state on its own; see
//! [`SessionMachine`](crate::SessionMachine) for the transitions.

use std::fmt;

use throwdown_protocol::{
    Choice, MatchOutcome, OpponentInfo, Reveal, RoundOutcome, RoundWinner,
};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for session behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Countdown shown before the server's first `round_start` arrives,
    /// and restored on reset.
    ///
    /// Default: 15 seconds, matching the server's round timeout.
    pub default_round_secs: u32,

    /// Playing without an identity token. Guests can only queue for
    /// casual matches.
    pub guest: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_round_secs: 15,
            guest: false,
        }
    }
}

impl SessionConfig {
    /// A default config for a guest player.
    pub fn guest() -> Self {
        Self {
            guest: true,
            ..Default::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where the session is in the queue-and-match cycle.
///
/// ```text
///   Idle ──(join)──→ Queued ──(match_found)──→ Playing ⇄ RoundResolved
///    ↑                 │                           │          │
///    └─────(leave)─────┘                           └──(match_complete)──→ MatchComplete
///
///   any ──(error / opponent_disconnected)──→ Failed ──(reset)──→ Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// Not in a queue or match.
    #[default]
    Idle,
    /// Waiting for the server to pair us with an opponent.
    Queued,
    /// A round is open and choices are being collected.
    Playing,
    /// The current round has a result; waiting for the next `round_start`.
    RoundResolved,
    /// The match is over and `match_outcome` is set.
    MatchComplete,
    /// Something ended the session abnormally; see `failure`.
    Failed,
}

impl Phase {
    /// Returns `true` while paired with an opponent and the match is still
    /// running.
    pub fn in_match(self) -> bool {
        matches!(self, Self::Playing | Self::RoundResolved)
    }

    /// Lowercase name, for logs and display.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Queued => "queued",
            Self::Playing => "playing",
            Self::RoundResolved => "round_resolved",
            Self::MatchComplete => "match_complete",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Score and history
// ---------------------------------------------------------------------------

/// Rounds won by each side in the current match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Score {
    pub mine: u32,
    pub opponent: u32,
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.mine, self.opponent)
    }
}

/// One resolved round in the move history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MoveRecord {
    pub round: u32,
    pub my_choice: Reveal,
    pub opponent_choice: Reveal,
    /// The server's verdict, never recomputed locally.
    pub outcome: RoundWinner,
}

impl From<&RoundOutcome> for MoveRecord {
    fn from(outcome: &RoundOutcome) -> Self {
        Self {
            round: outcome.round,
            my_choice: outcome.your_choice,
            opponent_choice: outcome.opponent_choice,
            outcome: outcome.winner,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Everything the UI needs to render the session.
///
/// Snapshots of this struct are what the client publishes; they are plain
/// data and safe to clone and keep around.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    /// Whether the current queue entry or match is ranked. `None` outside
    /// a queue cycle.
    pub ranked: Option<bool>,
    /// Present from `match_found` onwards.
    pub opponent: Option<OpponentInfo>,
    /// Server-assigned match id, if the server sent one.
    pub session_id: Option<String>,
    /// 1-based round number; 1 before the first match starts.
    pub current_round: u32,
    /// Client-side estimate of the time left to choose. Cosmetic only.
    pub seconds_remaining: u32,
    pub my_pending_choice: Option<Choice>,
    pub opponent_has_chosen: bool,
    pub last_round_outcome: Option<RoundOutcome>,
    pub match_outcome: Option<MatchOutcome>,
    pub score: Score,
    /// Resolved rounds, one entry per round, ascending.
    pub move_history: Vec<MoveRecord>,
    /// Human-readable reason the session failed. Set only in
    /// [`Phase::Failed`].
    pub failure: Option<String>,
}

impl SessionState {
    /// A fresh idle state.
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            phase: Phase::Idle,
            ranked: None,
            opponent: None,
            session_id: None,
            current_round: 1,
            seconds_remaining: config.default_round_secs,
            my_pending_choice: None,
            opponent_has_chosen: false,
            last_round_outcome: None,
            match_outcome: None,
            score: Score::default(),
            move_history: Vec::new(),
            failure: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.phase == Phase::Failed
    }

    /// Whether a choice can be submitted right now.
    pub fn can_choose(&self) -> bool {
        self.phase == Phase::Playing && self.my_pending_choice.is_none()
    }

    /// Whether the local countdown should be ticking.
    pub fn countdown_active(&self) -> bool {
        self.phase == Phase::Playing && self.seconds_remaining > 0
    }

    /// The history entry for `round`, if that round has been resolved.
    pub fn history_entry(&self, round: u32) -> Option<&MoveRecord> {
        self.move_history
            .binary_search_by_key(&round, |r| r.round)
            .ok()
            .map(|i| &self.move_history[i])
    }

    /// Inserts `record`, replacing any existing entry for the same round
    /// and keeping the history sorted.
    pub(crate) fn upsert_history(&mut self, record: MoveRecord) {
        match self
            .move_history
            .binary_search_by_key(&record.round, |r| r.round)
        {
            Ok(i) => self.move_history[i] = record,
            Err(i) => self.move_history.insert(i, record),
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}
