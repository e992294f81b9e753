//! Client configuration, from code or from the environment.

use throwdown_session::SessionConfig;

use crate::ThrowdownError;

/// Environment variable holding the server base URL.
pub const ENV_SERVER_URL: &str = "THROWDOWN_SERVER_URL";
/// Environment variable allowing or forbidding guest connections.
pub const ENV_ALLOW_GUEST: &str = "THROWDOWN_ALLOW_GUEST";
/// Environment variable overriding the initial round countdown.
pub const ENV_ROUND_TIMEOUT_SECS: &str = "THROWDOWN_ROUND_TIMEOUT_SECS";

const DEFAULT_ENDPOINT: &str = "ws://127.0.0.1:8080";

/// Everything [`ThrowdownClient::connect`](crate::ThrowdownClient::connect)
/// needs besides an identity.
///
/// # Example
///
/// ```rust
/// use throwdown::ClientConfig;
///
/// let config = ClientConfig::new("wss://play.example.com")
///     .allow_guest(false)
///     .round_secs(10);
/// assert_eq!(config.session.default_round_secs, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base server URL (`ws://` or `wss://`). `/ws` is appended when
    /// connecting.
    pub endpoint: String,
    /// Whether to connect without a token when the identity provider says
    /// the player is a guest.
    pub allow_guest: bool,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            allow_guest: true,
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Default settings pointed at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn allow_guest(mut self, allow: bool) -> Self {
        self.allow_guest = allow;
        self
    }

    /// Sets the countdown shown before the server's first `round_start`.
    pub fn round_secs(mut self, secs: u32) -> Self {
        self.session.default_round_secs = secs;
        self
    }

    /// Reads `THROWDOWN_SERVER_URL`, `THROWDOWN_ALLOW_GUEST` and
    /// `THROWDOWN_ROUND_TIMEOUT_SECS`, falling back to defaults for unset
    /// variables.
    ///
    /// # Errors
    /// [`ThrowdownError::Config`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, ThrowdownError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ThrowdownError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(ENV_SERVER_URL) {
            let url = url.trim();
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(ThrowdownError::Config(format!(
                    "{ENV_SERVER_URL} must be a ws:// or wss:// URL, got {url:?}"
                )));
            }
            config.endpoint = url.to_owned();
        }

        if let Some(value) = lookup(ENV_ALLOW_GUEST) {
            config.allow_guest = parse_bool(&value).ok_or_else(|| {
                ThrowdownError::Config(format!(
                    "{ENV_ALLOW_GUEST} must be true or false, got {value:?}"
                ))
            })?;
        }

        if let Some(value) = lookup(ENV_ROUND_TIMEOUT_SECS) {
            config.session.default_round_secs = value
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ThrowdownError::Config(format!(
                        "{ENV_ROUND_TIMEOUT_SECS} must be a positive number of seconds, got {value:?}"
                    ))
                })?;
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.endpoint, "ws://127.0.0.1:8080");
        assert!(config.allow_guest);
        assert_eq!(config.session.default_round_secs, 15);
    }

    #[test]
    fn test_from_lookup_reads_all_variables() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_SERVER_URL, "wss://play.example.com"),
            (ENV_ALLOW_GUEST, "no"),
            (ENV_ROUND_TIMEOUT_SECS, " 20 "),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, "wss://play.example.com");
        assert!(!config.allow_guest);
        assert_eq!(config.session.default_round_secs, 20);
    }

    #[test]
    fn test_from_lookup_rejects_http_url() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_SERVER_URL, "http://h")])).unwrap_err();
        assert!(matches!(err, ThrowdownError::Config(_)));
    }

    #[test]
    fn test_from_lookup_rejects_bad_bool_and_zero_timeout() {
        assert!(ClientConfig::from_lookup(lookup(&[(ENV_ALLOW_GUEST, "maybe")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(ENV_ROUND_TIMEOUT_SECS, "0")])).is_err());
        assert!(ClientConfig::from_lookup(lookup(&[(ENV_ROUND_TIMEOUT_SECS, "soon")])).is_err());
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::new("ws://a")
            .endpoint("ws://b")
            .allow_guest(false)
            .round_secs(5);
        assert_eq!(config.endpoint, "ws://b");
        assert!(!config.allow_guest);
        assert_eq!(config.session.default_round_secs, 5);
    }
}
