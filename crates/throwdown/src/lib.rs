//! # Throwdown
//!
//! Client engine for real-time best-of-N rock/paper/scissors.
//!
//! Throwdown connects to a match server over WebSocket, keeps a single
//! authoritative [`SessionState`] up to date as the server reports
//! matchmaking and round results, and publishes snapshots of it for a UI
//! to render. The UI only ever sends intents: join or leave the queue,
//! pick a gesture, reset.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use throwdown::prelude::*;
//!
//! # async fn run() -> Result<(), ThrowdownError> {
//! throwdown::logging::init();
//!
//! let config = ClientConfig::from_env()?;
//! let client = ThrowdownClient::connect(&config, &StaticIdentity::guest()).await?;
//!
//! client.join_queue(false);
//! let mut updates = client.subscribe();
//! while updates.changed().await.is_ok() {
//!     let state = updates.borrow_and_update().clone();
//!     if state.can_choose() {
//!         client.submit_choice(Choice::Rock);
//!     }
//!     if state.phase == Phase::MatchComplete || state.is_failed() {
//!         break;
//!     }
//! }
//! client.shutdown();
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod logging;

pub use client::{ServerConnection, ThrowdownClient};
pub use config::ClientConfig;
pub use error::ThrowdownError;

pub use throwdown_protocol as protocol;
pub use throwdown_session as session;
pub use throwdown_tick as tick;
pub use throwdown_transport as transport;

/// Everything needed to drive a match from a UI.
pub mod prelude {
    pub use crate::{ClientConfig, ThrowdownClient, ThrowdownError};
    pub use throwdown_protocol::{
        Choice, MatchOutcome, MatchResult, OpponentInfo, Reveal, RoundOutcome, RoundWinner,
    };
    pub use throwdown_session::{
        Identity, IdentityProvider, MoveRecord, Phase, Score, SessionConfig, SessionState,
        StaticIdentity,
    };
}
