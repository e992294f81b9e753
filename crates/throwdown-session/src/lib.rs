//! Match session state for Throwdown.
//!
//! This crate is the client's model of a match in progress:
//!
//! 1. **State**: everything the UI renders ([`SessionState`], [`Phase`],
//!    [`Score`], [`MoveRecord`])
//! 2. **Transitions**: how server messages, countdown ticks, and player
//!    intents change that state ([`SessionMachine`])
//! 3. **Identity**: who we connect as ([`IdentityProvider`] trait)
//!
//! The machine is synchronous and owns no I/O. Intents return the
//! [`ClientMessage`](throwdown_protocol::ClientMessage) to transmit, if
//! any, and the caller decides how to deliver it.
//!
//! # How it fits in the stack
//!
//! ```text
//! Client driver (above)  ← feeds events in, publishes snapshots out
//!     ↕
//! Session layer (this crate)  ← phase guards, scores, move history
//!     ↕
//! Protocol layer (below)  ← ServerMessage, ClientMessage, Choice
//! ```

#![allow(async_fn_in_trait)]

mod auth;
mod error;
mod machine;
mod session;

pub use auth::{Identity, IdentityProvider, StaticIdentity};
pub use error::SessionError;
pub use machine::SessionMachine;
pub use session::{MoveRecord, Phase, Score, SessionConfig, SessionState};
