//! Connection parameters: where to connect and as whom.

use throwdown_protocol::ENDPOINT_PATH;

use crate::TransportError;

/// Everything needed to open a game connection.
///
/// `token` is the opaque identity token from the identity provider. It is
/// never inspected, only forwarded as the `token` query parameter.
/// `allow_anonymous` must be set explicitly for guest play: with no token
/// and `allow_anonymous == false` the transport refuses to connect at all,
/// which keeps a client from connecting as a guest while its login state
/// is still being resolved.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectParams {
    /// Base server URL, e.g. `ws://127.0.0.1:8080`.
    pub endpoint: String,
    /// Identity token, if the player is signed in.
    pub token: Option<String>,
    /// Whether connecting without a token is permitted.
    pub allow_anonymous: bool,
}

impl ConnectParams {
    /// Parameters for a signed-in player.
    pub fn authenticated(
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: Some(token.into()),
            allow_anonymous: false,
        }
    }

    /// Parameters for a guest (no token).
    pub fn guest(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            allow_anonymous: true,
        }
    }

    /// The token, treating an empty string as absent.
    fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns `true` if this connection would carry no identity.
    pub fn is_anonymous(&self) -> bool {
        self.token().is_none()
    }

    /// Builds the socket URL: `{endpoint}/ws` or `{endpoint}/ws?token=...`.
    ///
    /// # Errors
    /// - [`TransportError::IdentityRequired`]: no token and anonymous
    ///   connections not allowed
    /// - [`TransportError::InvalidEndpoint`]: not a `ws://`/`wss://` URL
    pub fn url(&self) -> Result<String, TransportError> {
        let base = self.base()?;
        match self.token() {
            Some(token) => Ok(format!(
                "{base}{ENDPOINT_PATH}?token={}",
                urlencoding::encode(token)
            )),
            None if self.allow_anonymous => Ok(format!("{base}{ENDPOINT_PATH}")),
            None => Err(TransportError::IdentityRequired),
        }
    }

    /// The socket URL with the token masked, for logs.
    pub fn redacted_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        if self.token().is_some() {
            format!("{base}{ENDPOINT_PATH}?token=<redacted>")
        } else {
            format!("{base}{ENDPOINT_PATH}")
        }
    }

    fn base(&self) -> Result<&str, TransportError> {
        let base = self.endpoint.trim().trim_end_matches('/');
        let scheme_ok = base.starts_with("ws://") || base.starts_with("wss://");
        let host_present = base
            .split_once("://")
            .is_some_and(|(_, rest)| !rest.is_empty());
        if scheme_ok && host_present {
            Ok(base)
        } else {
            Err(TransportError::InvalidEndpoint(self.endpoint.clone()))
        }
    }
}

// Hand-written so the token never ends up in debug logs.
impl std::fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectParams")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token().map(|_| "<redacted>"))
            .field("allow_anonymous", &self.allow_anonymous)
            .finish()
    }
}
