use url::Url;

use crate::error::Error;

/// Which gateway backs the API surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiMode {
    /// Real HTTP calls against the Melodia business API.
    #[default]
    Live,
    /// In-process simulation with canned responses and artificial latency.
    Simulated,
}

impl std::str::FromStr for ApiMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "simulated" | "mock" => Ok(Self::Simulated),
            other => Err(Error::Config(format!(
                "MELODIA_API_MODE must be 'live' or 'simulated', got {other:?}"
            ))),
        }
    }
}

/// Melodia `OAuth2` + API configuration.
///
/// Required fields are constructor parameters — no runtime "missing field"
/// errors.
///
/// ```rust,ignore
/// use melodia_ads::Config;
///
/// let config = Config::new("my-client-id", "my-secret", "https://my-app.com/callback".parse()?);
/// // Optional overrides via chaining:
/// let config = config.with_auth_url("https://sandbox.melodia.com/oauth/authorize".parse()?);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    pub(crate) client_id: String,
    pub(crate) client_secret: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) api_base_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) scopes: Vec<String>,
    pub(crate) mode: ApiMode,
}

impl Config {
    /// Create a new configuration with the required fields.
    #[must_use]
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: Url,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri,
            auth_url: "https://ads.melodia.com/oauth/authorize"
                .parse()
                .expect("valid default URL"),
            token_url: "https://business-api.melodia.com/oauth/access_token"
                .parse()
                .expect("valid default URL"),
            api_base_url: "https://business-api.melodia.com/v1/"
                .parse()
                .expect("valid default URL"),
            scopes: vec!["ad.manage".into(), "music.read".into()],
            mode: ApiMode::Live,
        }
    }

    /// Create configuration from environment variables.
    ///
    /// # Required env vars
    /// - `MELODIA_CLIENT_ID`: OAuth2 client ID
    /// - `MELODIA_CLIENT_SECRET`: OAuth2 client secret (trusted process only)
    /// - `MELODIA_REDIRECT_URI`: OAuth2 callback URI (must be a valid URL)
    ///
    /// # Optional env vars
    /// - `MELODIA_AUTH_URL`: override the authorization endpoint
    /// - `MELODIA_TOKEN_URL`: override the token exchange endpoint
    /// - `MELODIA_API_BASE_URL`: override the business API base
    /// - `MELODIA_SCOPES`: comma-separated OAuth2 scopes
    /// - `MELODIA_API_MODE`: `live` (default) or `simulated`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required env vars are missing or URLs are
    /// invalid.
    pub fn from_env() -> Result<Self, Error> {
        let client_id = std::env::var("MELODIA_CLIENT_ID")
            .map_err(|_| Error::Config("MELODIA_CLIENT_ID is required".into()))?;
        let client_secret = std::env::var("MELODIA_CLIENT_SECRET")
            .map_err(|_| Error::Config("MELODIA_CLIENT_SECRET is required".into()))?;
        let redirect_uri: Url = std::env::var("MELODIA_REDIRECT_URI")
            .map_err(|_| Error::Config("MELODIA_REDIRECT_URI is required".into()))?
            .parse()
            .map_err(|e| Error::Config(format!("MELODIA_REDIRECT_URI: {e}")))?;

        let mut config = Self::new(client_id, client_secret, redirect_uri);

        if let Ok(url_str) = std::env::var("MELODIA_AUTH_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("MELODIA_AUTH_URL: {e}")))?;
            config = config.with_auth_url(url);
        }
        if let Ok(url_str) = std::env::var("MELODIA_TOKEN_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("MELODIA_TOKEN_URL: {e}")))?;
            config = config.with_token_url(url);
        }
        if let Ok(url_str) = std::env::var("MELODIA_API_BASE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("MELODIA_API_BASE_URL: {e}")))?;
            config = config.with_api_base_url(url);
        }
        if let Ok(scopes) = std::env::var("MELODIA_SCOPES") {
            config = config.with_scopes(scopes.split(',').map(|s| s.trim().to_string()).collect());
        }
        if let Ok(mode) = std::env::var("MELODIA_API_MODE") {
            config = config.with_mode(mode.parse()?);
        }

        Ok(config)
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token exchange endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Override the business API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: Url) -> Self {
        self.api_base_url = url;
        self
    }

    /// Override the OAuth2 scopes (default: `["ad.manage", "music.read"]`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Select live or simulated API mode.
    #[must_use]
    pub fn with_mode(mut self, mode: ApiMode) -> Self {
        self.mode = mode;
        self
    }

    /// `OAuth2` client ID.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Authorization endpoint URL.
    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Token exchange endpoint URL.
    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    /// Business API base URL.
    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    /// `OAuth2` redirect URI.
    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// Requested `OAuth2` scopes.
    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    /// Selected API mode.
    #[must_use]
    pub fn mode(&self) -> ApiMode {
        self.mode
    }
}
