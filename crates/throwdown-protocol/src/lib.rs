//! Wire protocol for Throwdown.
//!
//! This crate defines the vocabulary the client and the match server speak:
//!
//! - **Types** ([`ServerMessage`], [`ClientMessage`], [`Choice`], etc.):
//!   the tagged JSON messages that travel over the socket.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (raw frames) and the
//! session state machine (match semantics). It knows nothing about
//! connections or phases, only how messages are shaped.
//!
//! ```text
//! Transport (bytes) → Protocol (ServerMessage) → Session (SessionState)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Choice, ClientMessage, MatchOutcome, MatchResult, OpponentInfo, Reveal,
    RoundOutcome, RoundWinner, ServerMessage,
};

/// Path of the game socket on the match server.
///
/// Clients connect to `{endpoint}{ENDPOINT_PATH}`, appending the identity
/// token as a `token` query parameter when they have one.
pub const ENDPOINT_PATH: &str = "/ws";
