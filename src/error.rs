#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// No response reached us: connect failure, timeout, DNS, TLS.
    #[error("network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Structured failure response from the platform (`code != 0` envelope,
    /// or an OAuth error code from the token endpoint).
    #[error("platform error {code}: {message}")]
    Protocol {
        code: String,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Inbound callback state did not match the issued anti-forgery token.
    /// The authorization attempt is dead; a new one must be started.
    #[error("authorization state mismatch")]
    StateMismatch,

    /// Melodia does not issue refresh tokens in this integration.
    #[error("token refresh is not supported; restart authorization")]
    RefreshUnsupported,

    /// Credential store read/write failed.
    #[error("credential store error: {0}")]
    Store(String),

    /// Missing or invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A validated-by-construction value was given invalid input
    /// (empty access token, malformed music id).
    #[error("invalid {what}: {detail}")]
    InvalidValue { what: &'static str, detail: String },
}

impl Error {
    /// Build a protocol error from a platform code and message.
    pub(crate) fn protocol(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }
}
