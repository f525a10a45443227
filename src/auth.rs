use std::future::Future;

use serde::Deserialize;
use url::Url;

use crate::config::Config;
use crate::credential::{now_epoch_ms, AccessToken, AdvertiserId, Credential};
use crate::error::Error;
use crate::gateway::ApiEnvelope;
use crate::verifier::StateVerifier;

/// The authorization handshake: building the outbound redirect and trading
/// the returned code for a credential. Seam between the session layer and
/// the platform; [`AuthClient`] is the production implementation.
pub trait AuthorizationFlow: Send + Sync {
    /// Begin an authorization attempt: issue a fresh anti-forgery state
    /// token through `verifier` and build the redirect request.
    fn begin_authorization(&self, verifier: &StateVerifier) -> AuthorizationRequest;

    /// Exchange an authorization code for a fresh credential.
    fn exchange_code(&self, code: &str) -> impl Future<Output = Result<Credential, Error>> + Send;

    /// Renew a credential from its refresh token.
    ///
    /// Melodia does not support refresh in this integration; implementations
    /// fail fast with [`Error::RefreshUnsupported`] and callers restart the
    /// full authorization flow.
    fn refresh_credential(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<Credential, Error>> + Send;
}

/// Authorization redirect request: where to send the operator, and the state
/// token the callback must echo. Navigation is the embedder's side effect —
/// nothing after it in the same flow is guaranteed to run.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: String,
    pub state: String,
}

/// `OAuth2` authorization client for the Melodia platform.
///
/// The exchange carries `client_secret`, so this type belongs in a trusted
/// process only.
pub struct AuthClient {
    config: Config,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }
}

/// Success payload of the token-exchange envelope.
#[derive(Debug, Deserialize)]
struct TokenPayload {
    access_token: AccessToken,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
    #[serde(default)]
    advertiser_id: Option<AdvertiserId>,
}

impl AuthorizationFlow for AuthClient {
    /// Build the redirect URL with `client_id`, `state`, `redirect_uri`, and
    /// the comma-joined scope list. The freshly issued state token replaces
    /// any prior one in `verifier`.
    fn begin_authorization(&self, verifier: &StateVerifier) -> AuthorizationRequest {
        let state = verifier.issue();
        let scope = self.config.scopes().join(",");

        let mut url: Url = self.config.auth_url().clone();
        url.query_pairs_mut()
            .append_pair("client_id", self.config.client_id())
            .append_pair("state", &state)
            .append_pair("redirect_uri", self.config.redirect_uri().as_str())
            .append_pair("scope", &scope);

        AuthorizationRequest {
            url: url.into(),
            state,
        }
    }

    /// POST to the token endpoint with query-string-encoded
    /// `client_id`, `client_secret`, `auth_code`.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] on network failure; [`Error::Protocol`] when the
    /// envelope's `code != 0`. On success the credential is stamped with the
    /// local wall-clock issue instant.
    async fn exchange_code(&self, code: &str) -> Result<Credential, Error> {
        let response = self
            .http
            .post(self.config.token_url().clone())
            .query(&[
                ("client_id", self.config.client_id()),
                ("client_secret", self.config.client_secret.as_str()),
                ("auth_code", code),
            ])
            .send()
            .await?;

        let envelope: ApiEnvelope = response.json().await?;
        let payload: TokenPayload = envelope.into_data()?;

        Ok(Credential {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_in_secs: payload.expires_in,
            issued_at_epoch_ms: now_epoch_ms(),
            advertiser_id: payload.advertiser_id,
        })
    }

    async fn refresh_credential(&self, _refresh_token: &str) -> Result<Credential, Error> {
        tracing::warn!("credential refresh attempted; Melodia does not support refresh tokens");
        Err(Error::RefreshUnsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> AuthClient {
        AuthClient::new(Config::new(
            "test-client",
            "test-secret",
            "https://example.com/callback".parse().unwrap(),
        ))
    }

    #[test]
    fn test_authorization_url_parameters() {
        let verifier = StateVerifier::new();
        let req = client().begin_authorization(&verifier);

        let url: Url = req.url.parse().unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().collect();
        assert_eq!(pairs["client_id"], "test-client");
        assert_eq!(pairs["redirect_uri"], "https://example.com/callback");
        assert_eq!(pairs["scope"], "ad.manage,music.read");
        assert_eq!(pairs["state"], req.state.as_str());
        assert_eq!(req.state.len(), 64);
    }

    #[test]
    fn test_begin_authorization_stores_verifiable_state() {
        let verifier = StateVerifier::new();
        let req = client().begin_authorization(&verifier);
        assert!(verifier.consume_and_verify(&req.state));
    }

    #[test]
    fn test_authorization_state_unique_per_attempt() {
        let verifier = StateVerifier::new();
        let c = client();
        let req1 = c.begin_authorization(&verifier);
        let req2 = c.begin_authorization(&verifier);
        assert_ne!(req1.state, req2.state);
        // Only the most recent attempt's state is live.
        assert!(!verifier.consume_and_verify(&req1.state));
        let req3 = c.begin_authorization(&verifier);
        assert!(verifier.consume_and_verify(&req3.state));
    }

    #[tokio::test]
    async fn refresh_always_fails_fast() {
        let err = client().refresh_credential("rft.anything").await.unwrap_err();
        assert!(matches!(err, Error::RefreshUnsupported));
    }
}
