//! API keys for outbound metadata services.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

/// An API key held in zeroize-on-drop memory.
///
/// `Debug` never prints the key, so it stays out of logs and out of the
/// debug output of [`EngineConfig`](crate::EngineConfig).
pub struct ApiKey(SecretBox<str>);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Parse a key from configuration. Surrounding whitespace is dropped and
    /// a blank value means "no key".
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self::new(trimmed))
    }

    /// The raw key, for the request header only.
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for ApiKey {
    fn clone(&self) -> Self {
        Self::new(self.expose())
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(<{} chars>)", self.expose().chars().count())
    }
}
