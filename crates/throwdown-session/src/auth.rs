//! Identity hook: who the client connects as.
//!
//! Throwdown doesn't sign anyone in. Whatever does (an OAuth flow, a
//! stored JWT, a settings file) implements [`IdentityProvider`] and hands
//! over an opaque token, or says the player is a guest. The token is
//! forwarded to the server untouched.

use std::future::Future;

/// The outcome of asking the identity provider who the player is.
#[derive(Clone, PartialEq, Eq)]
pub enum Identity {
    /// Sign-in state is still loading. Don't connect yet.
    Pending,
    /// Not signed in; play as a guest (casual matches only).
    Guest,
    /// Signed in with this opaque token.
    Token(String),
}

impl Identity {
    /// The token, if signed in.
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::Token(token) => Some(token),
            _ => None,
        }
    }

    /// Returns `true` for guest sessions.
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    /// Returns `true` while sign-in state is unknown.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("Pending"),
            Self::Guest => f.write_str("Guest"),
            Self::Token(_) => f.write_str("Token(<redacted>)"),
        }
    }
}

/// Supplies the player's identity before a connection is opened.
///
/// # Example
///
/// ```rust
/// use throwdown_session::{Identity, IdentityProvider};
///
/// /// Reads a token from the environment, falling back to guest play.
/// struct EnvIdentity;
///
/// impl IdentityProvider for EnvIdentity {
///     async fn identity(&self) -> Identity {
///         match std::env::var("THROWDOWN_TOKEN") {
///             Ok(token) if !token.is_empty() => Identity::Token(token),
///             _ => Identity::Guest,
///         }
///     }
/// }
/// ```
pub trait IdentityProvider: Send + Sync + 'static {
    /// Resolves the current identity.
    fn identity(&self) -> impl Future<Output = Identity> + Send;
}

/// An [`IdentityProvider`] that always returns the same identity.
#[derive(Debug, Clone)]
pub struct StaticIdentity(pub Identity);

impl StaticIdentity {
    /// A signed-in identity.
    pub fn token(token: impl Into<String>) -> Self {
        Self(Identity::Token(token.into()))
    }

    /// A guest identity.
    pub fn guest() -> Self {
        Self(Identity::Guest)
    }
}

impl IdentityProvider for StaticIdentity {
    async fn identity(&self) -> Identity {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accessors() {
        assert_eq!(Identity::Token("t".into()).token(), Some("t"));
        assert!(Identity::Guest.is_guest());
        assert!(Identity::Pending.is_pending());
        assert_eq!(Identity::Guest.token(), None);
    }

    #[test]
    fn test_identity_debug_hides_token() {
        let shown = format!("{:?}", Identity::Token("secret".into()));
        assert!(!shown.contains("secret"));
    }

    #[tokio::test]
    async fn test_static_identity_returns_its_identity() {
        assert_eq!(StaticIdentity::guest().identity().await, Identity::Guest);
        assert_eq!(
            StaticIdentity::token("abc").identity().await,
            Identity::Token("abc".into())
        );
    }
}
