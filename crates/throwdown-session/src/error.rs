//! Error types for the session layer.

/// Errors that can occur while setting up a session.
///
/// Gameplay itself never errors: invalid intents and stale messages are
/// ignored, and server-reported failures live in
/// [`SessionState::failure`](crate::SessionState::failure).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The identity provider hasn't decided yet whether the player is
    /// signed in. Connecting now could wrongly connect as a guest.
    #[error("identity is not resolved yet")]
    IdentityPending,
}
