//! The session state machine.
//!
//! [`SessionMachine`] is the only thing that mutates a [`SessionState`].
//! It reacts to three kinds of event:
//!
//! - **server messages** via [`apply`](SessionMachine::apply)
//! - **countdown ticks** via [`advance`](SessionMachine::advance)
//! - **player intents** via [`join_queue`](SessionMachine::join_queue),
//!   [`leave_queue`](SessionMachine::leave_queue),
//!   [`submit_choice`](SessionMachine::submit_choice) and
//!   [`reset`](SessionMachine::reset)
//!
//! Events that don't fit the current phase are ignored rather than
//! reported: a late `round_start` after the match ended, a double-clicked
//! choice button, or a leave request when we aren't queued are all normal
//! in a real-time game.
//!
//! Intents return the [`ClientMessage`] that should go to the server. The
//! machine never sends anything itself.

use throwdown_protocol::{
    Choice, ClientMessage, MatchOutcome, OpponentInfo, RoundOutcome, ServerMessage,
};
use tracing::{debug, info};

use crate::session::{MoveRecord, Phase, Score, SessionConfig, SessionState};

/// Failure text shown when the opponent leaves mid-match.
const OPPONENT_DISCONNECTED: &str = "Opponent disconnected";

/// Drives a [`SessionState`] through the queue-and-match cycle.
#[derive(Debug, Clone)]
pub struct SessionMachine {
    config: SessionConfig,
    state: SessionState,
}

impl SessionMachine {
    /// Creates a machine in [`Phase::Idle`].
    pub fn new(config: SessionConfig) -> Self {
        let state = SessionState::new(&config);
        Self { config, state }
    }

    /// The current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    // -----------------------------------------------------------------------
    // Intents
    // -----------------------------------------------------------------------

    /// Enters the matchmaking queue.
    ///
    /// Only valid from [`Phase::Idle`]. Guests are always queued for casual
    /// play regardless of `ranked`.
    pub fn join_queue(&mut self, ranked: bool) -> Option<ClientMessage> {
        if self.state.phase != Phase::Idle {
            self.ignore_intent("join_queue");
            return None;
        }

        let ranked = ranked && !self.config.guest;
        self.state = SessionState::new(&self.config);
        self.state.phase = Phase::Queued;
        self.state.ranked = Some(ranked);

        info!(ranked, "joining queue");
        Some(ClientMessage::JoinQueue { ranked })
    }

    /// Leaves the matchmaking queue. Only valid from [`Phase::Queued`].
    pub fn leave_queue(&mut self) -> Option<ClientMessage> {
        if self.state.phase != Phase::Queued {
            self.ignore_intent("leave_queue");
            return None;
        }

        self.state.phase = Phase::Idle;
        self.state.ranked = None;
        self.state.score = Score::default();
        self.state.move_history.clear();

        info!("left queue");
        Some(ClientMessage::LeaveQueue)
    }

    /// Submits a gesture for the current round.
    ///
    /// The first call per round returns the message to send. Later calls in
    /// the same round, and calls outside [`Phase::Playing`], return `None`.
    pub fn submit_choice(&mut self, choice: Choice) -> Option<ClientMessage> {
        if !self.state.can_choose() {
            self.ignore_intent("submit_choice");
            return None;
        }

        self.state.my_pending_choice = Some(choice);
        debug!(round = self.state.current_round, %choice, "choice submitted");
        Some(ClientMessage::Choice { choice })
    }

    /// Returns to a fresh [`Phase::Idle`] state from anywhere, including
    /// [`Phase::Failed`]. Nothing is sent to the server.
    pub fn reset(&mut self) {
        let from = self.state.phase;
        self.state = SessionState::new(&self.config);
        info!(%from, "session reset");
    }

    // -----------------------------------------------------------------------
    // Server messages
    // -----------------------------------------------------------------------

    /// Applies one server message.
    ///
    /// Returns `false` if the message was ignored because it doesn't fit
    /// the current phase (or the session has failed).
    pub fn apply(&mut self, message: ServerMessage) -> bool {
        let phase = self.state.phase;
        if phase == Phase::Failed {
            debug!(kind = message.kind(), "session failed, ignoring message");
            return false;
        }

        match (phase, message) {
            (Phase::Queued, ServerMessage::Queued) => {
                debug!("queue entry confirmed");
                true
            }
            (Phase::Queued, ServerMessage::MatchFound { opponent, session_id }) => {
                self.start_match(opponent, session_id);
                true
            }
            (
                phase,
                ServerMessage::RoundStart {
                    round,
                    timeout_secs,
                },
            ) if phase.in_match() => self.start_round(round, timeout_secs),
            (Phase::Playing, ServerMessage::OpponentChose) => {
                self.state.opponent_has_chosen = true;
                true
            }
            (phase, ServerMessage::RoundResult(outcome)) if phase.in_match() => {
                self.resolve_round(outcome);
                true
            }
            (phase, ServerMessage::MatchComplete(outcome)) if phase.in_match() => {
                self.complete_match(outcome);
                true
            }
            (_, ServerMessage::OpponentDisconnected) => {
                self.fail(OPPONENT_DISCONNECTED.to_owned());
                true
            }
            (_, ServerMessage::Error { message }) => {
                self.fail(message);
                true
            }
            (phase, message) => {
                debug!(%phase, kind = message.kind(), "ignoring message for current phase");
                false
            }
        }
    }

    // -----------------------------------------------------------------------
    // Countdown
    // -----------------------------------------------------------------------

    /// Advances the countdown by `secs` whole seconds.
    ///
    /// Only runs while [`Phase::Playing`]; saturates at zero. Reaching zero
    /// does not resolve the round, only `round_result` does. Returns
    /// `true` if the countdown changed.
    pub fn advance(&mut self, secs: u64) -> bool {
        if !self.state.countdown_active() || secs == 0 {
            return false;
        }
        let secs = u32::try_from(secs).unwrap_or(u32::MAX);
        self.state.seconds_remaining = self.state.seconds_remaining.saturating_sub(secs);
        if self.state.seconds_remaining == 0 {
            debug!(round = self.state.current_round, "countdown reached zero");
        }
        true
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> bool {
        self.advance(1)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn start_match(&mut self, opponent: OpponentInfo, session_id: Option<String>) {
        info!(
            opponent = %opponent.username,
            rating = opponent.rating,
            ranked = self.state.ranked.unwrap_or(false),
            "match found"
        );
        let state = &mut self.state;
        state.phase = Phase::Playing;
        state.opponent = Some(opponent);
        state.session_id = session_id;
        state.current_round = 1;
        state.seconds_remaining = self.config.default_round_secs;
        state.my_pending_choice = None;
        state.opponent_has_chosen = false;
        state.last_round_outcome = None;
        state.match_outcome = None;
        state.score = Score::default();
        state.move_history.clear();
    }

    fn start_round(&mut self, round: u32, timeout_secs: u32) -> bool {
        if round < self.state.current_round {
            debug!(
                round,
                current = self.state.current_round,
                "ignoring stale round_start"
            );
            return false;
        }

        debug!(round, timeout_secs, "round started");
        let state = &mut self.state;
        state.phase = Phase::Playing;
        state.current_round = round;
        state.seconds_remaining = timeout_secs;
        state.my_pending_choice = None;
        state.opponent_has_chosen = false;
        state.last_round_outcome = None;
        true
    }

    fn resolve_round(&mut self, outcome: RoundOutcome) {
        debug!(
            round = outcome.round,
            winner = ?outcome.winner,
            your_score = outcome.your_score,
            opponent_score = outcome.opponent_score,
            "round resolved"
        );
        let state = &mut self.state;
        state.phase = Phase::RoundResolved;
        state.score = Score {
            mine: outcome.your_score,
            opponent: outcome.opponent_score,
        };
        state.upsert_history(MoveRecord::from(&outcome));
        state.last_round_outcome = Some(outcome);
    }

    fn complete_match(&mut self, outcome: MatchOutcome) {
        info!(
            result = ?outcome.result,
            your_score = outcome.your_score,
            opponent_score = outcome.opponent_score,
            elo_change = ?outcome.elo_change,
            "match complete"
        );
        self.state.phase = Phase::MatchComplete;
        self.state.match_outcome = Some(outcome);
    }

    fn fail(&mut self, reason: String) {
        info!(phase = %self.state.phase, %reason, "session failed");
        self.state.phase = Phase::Failed;
        self.state.failure = Some(reason);
    }

    fn ignore_intent(&self, intent: &'static str) {
        debug!(phase = %self.state.phase, intent, "ignoring intent for current phase");
    }
}

impl Default for SessionMachine {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
