//! Top-level session state machine: `login / callback / authenticated /
//! logout`, composing the credential store, the authorization flow, and the
//! gateway. Every failure surfaces as a classified [`ErrorDescriptor`] —
//! raw platform codes never leave this module.

use std::sync::Arc;

use crate::auth::{AuthClient, AuthorizationFlow, AuthorizationRequest};
use crate::classify::{classify, classify_callback_error, ErrorDescriptor};
use crate::config::Config;
use crate::credential::{AccessToken, AdvertiserProfile, Credential};
use crate::error::Error;
use crate::gateway::{AdsApi, Gateway};
use crate::store::{CredentialStore, MemoryCredentialStore};
use crate::verifier::StateVerifier;

/// Session state, owned exclusively by the [`SessionManager`]. Collaborators
/// receive the current token by value, never the mutable state.
#[derive(Debug, Clone)]
pub enum SessionState {
    /// Bootstrap or an authorization attempt is in progress.
    Loading,
    Unauthenticated,
    Authenticated {
        credential: Credential,
        profile: AdvertiserProfile,
    },
    /// An authorization attempt failed; carries the classified descriptor
    /// for display. Dismissed back to `Unauthenticated`.
    Failed(ErrorDescriptor),
}

impl SessionState {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }
}

/// Query parameters delivered on the inbound authorization redirect.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse from the redirect-back URL's raw query string.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "code" => params.code = Some(value.into_owned()),
                "state" => params.state = Some(value.into_owned()),
                "error" => params.error = Some(value.into_owned()),
                "error_description" => params.error_description = Some(value.into_owned()),
                _ => {}
            }
        }
        params
    }
}

/// The session orchestrator.
///
/// Generic over its three seams: the credential store, the authorization
/// flow, and the gateway. [`from_config`](SessionManager::from_config) wires
/// the production combination.
pub struct SessionManager<S, X, G> {
    store: S,
    flow: X,
    gateway: Arc<G>,
    verifier: StateVerifier,
    state: SessionState,
}

impl SessionManager<MemoryCredentialStore, AuthClient, Gateway> {
    /// Production wiring: in-memory store, HTTP authorization client, and
    /// the gateway selected by the config's mode switch. Use
    /// [`new`](SessionManager::new) to plug a durable store.
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        let gateway = Gateway::from_config(&config);
        Self::new(MemoryCredentialStore::new(), AuthClient::new(config), gateway)
    }
}

impl<S, X, G> SessionManager<S, X, G>
where
    S: CredentialStore,
    X: AuthorizationFlow,
    G: AdsApi,
{
    /// Starts in `Loading`; call [`bootstrap`](Self::bootstrap) to resolve.
    #[must_use]
    pub fn new(store: S, flow: X, gateway: G) -> Self {
        Self {
            store,
            flow,
            gateway: Arc::new(gateway),
            verifier: StateVerifier::new(),
            state: SessionState::Loading,
        }
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The current bearer token, when authenticated.
    #[must_use]
    pub fn access_token(&self) -> Option<&AccessToken> {
        match &self.state {
            SessionState::Authenticated { credential, .. } => Some(&credential.access_token),
            _ => None,
        }
    }

    /// Shared handle to the gateway, for callers issuing their own
    /// authenticated operations (ad creation, music checks).
    #[must_use]
    pub fn gateway(&self) -> Arc<G> {
        Arc::clone(&self.gateway)
    }

    /// Resolve the initial `Loading` state from the credential store.
    ///
    /// A stored credential that is expired, unreadable, or whose profile
    /// cannot be fetched is treated as corrupt: discarded, not retried, and
    /// the session lands in `Unauthenticated` without a visible error.
    pub async fn bootstrap(&mut self) -> &SessionState {
        self.state = SessionState::Loading;

        let credential = match self.store.load() {
            Ok(Some(credential)) => credential,
            Ok(None) => {
                self.state = SessionState::Unauthenticated;
                return &self.state;
            }
            Err(e) => {
                tracing::warn!(error = %e, "credential store unreadable; discarding");
                self.discard_stored_credential();
                self.state = SessionState::Unauthenticated;
                return &self.state;
            }
        };

        if !credential.is_valid() {
            tracing::debug!("stored credential expired; discarding");
            self.discard_stored_credential();
            self.state = SessionState::Unauthenticated;
            return &self.state;
        }

        match self.gateway.get_advertiser_profile(&credential.access_token).await {
            Ok(profile) => {
                self.state = SessionState::Authenticated { credential, profile };
            }
            Err(e) => {
                tracing::warn!(error = %e, "stored credential unusable; discarding");
                self.discard_stored_credential();
                self.state = SessionState::Unauthenticated;
            }
        }
        &self.state
    }

    /// Start an authorization attempt: returns the redirect request for the
    /// embedder to navigate to, and enters `Loading`.
    ///
    /// No-op guard: returns `None` if an attempt is already in flight.
    pub fn login(&mut self) -> Option<AuthorizationRequest> {
        if matches!(self.state, SessionState::Loading) {
            tracing::debug!("login ignored; authorization already in progress");
            return None;
        }
        self.state = SessionState::Loading;
        Some(self.flow.begin_authorization(&self.verifier))
    }

    /// Complete the handshake from the inbound redirect parameters.
    ///
    /// State verification is one-shot and happens before anything else; on a
    /// mismatch no token exchange is attempted. Every failure lands in
    /// `Failed` with a classified descriptor.
    pub async fn handle_callback(&mut self, params: CallbackParams) -> &SessionState {
        if let Some(error) = &params.error {
            let description = params.error_description.as_deref();
            tracing::warn!(error = %error, "authorization error from platform");
            self.state = SessionState::Failed(classify_callback_error(error, description));
            return &self.state;
        }

        let Some(code) = params.code else {
            tracing::warn!("callback arrived without an authorization code");
            self.state = SessionState::Failed(classify_callback_error("missing_code", None));
            return &self.state;
        };

        // A missing state parameter is verified as an empty candidate: it
        // burns the stored token and fails, exactly like a mismatch.
        let candidate = params.state.unwrap_or_default();
        if !self.verifier.consume_and_verify(&candidate) {
            tracing::warn!("authorization state mismatch; rejecting callback");
            self.state = SessionState::Failed(classify(&Error::StateMismatch));
            return &self.state;
        }

        self.complete_exchange(&code).await;
        &self.state
    }

    /// [`handle_callback`](Self::handle_callback) for embedders that have
    /// already split the query into code and state.
    pub async fn complete_callback(
        &mut self,
        code: impl Into<String>,
        state: impl Into<String>,
    ) -> &SessionState {
        self.handle_callback(CallbackParams {
            code: Some(code.into()),
            state: Some(state.into()),
            ..CallbackParams::default()
        })
        .await
    }

    async fn complete_exchange(&mut self, code: &str) {
        let credential = match self.flow.exchange_code(code).await {
            Ok(credential) => credential,
            Err(e) => {
                tracing::error!(error = %e, "token exchange failed");
                self.state = SessionState::Failed(classify(&e));
                return;
            }
        };

        if let Err(e) = self.store.save(&credential) {
            // The in-memory session still works; it just won't survive a
            // restart.
            tracing::warn!(error = %e, "failed to persist credential");
        }

        match self.gateway.get_advertiser_profile(&credential.access_token).await {
            Ok(profile) => {
                tracing::info!(advertiser = %profile.advertiser_id, "login successful");
                self.state = SessionState::Authenticated { credential, profile };
            }
            Err(e) => {
                tracing::error!(error = %e, "advertiser profile fetch failed");
                self.state = SessionState::Failed(classify(&e));
            }
        }
    }

    /// Acknowledge a `Failed` state, returning to `Unauthenticated`.
    pub fn dismiss_failure(&mut self) {
        if matches!(self.state, SessionState::Failed(_)) {
            self.state = SessionState::Unauthenticated;
        }
    }

    /// Clear the stored credential and reset to `Unauthenticated`.
    /// Side-effect only; a store failure is logged, never surfaced.
    pub fn logout(&mut self) {
        self.discard_stored_credential();
        self.state = SessionState::Unauthenticated;
        tracing::info!("logged out");
    }

    fn discard_stored_credential(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "failed to clear credential store");
        }
    }
}
