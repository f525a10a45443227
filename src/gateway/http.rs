use serde::Deserialize;
use serde_json::json;
use url::Url;

use super::{simulate_upload, AdsApi, ApiEnvelope, BusinessError, CreateAdOutcome, MusicValidation, UploadedFile};
use crate::credential::{AccessToken, AdId, AdvertiserProfile, MusicId};
use crate::error::Error;

const ACCESS_TOKEN_HEADER: &str = "Access-Token";

/// Live gateway against the Melodia business API.
pub struct HttpGateway {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway rooted at `base_url` (trailing slash significant for
    /// path joins).
    #[must_use]
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("API base URL cannot address {path}: {e}")))
    }

    async fn get_envelope(&self, token: &AccessToken, path: &str) -> Result<ApiEnvelope, Error> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .header(ACCESS_TOKEN_HEADER, token.as_str())
            .send()
            .await?;
        Ok(response.json().await?)
    }

    async fn post_envelope(
        &self,
        token: &AccessToken,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<ApiEnvelope, Error> {
        let response = self
            .http
            .post(self.endpoint(path)?)
            .header(ACCESS_TOKEN_HEADER, token.as_str())
            .json(body)
            .send()
            .await?;
        Ok(response.json().await?)
    }
}

impl AdsApi for HttpGateway {
    async fn get_advertiser_profile(&self, token: &AccessToken) -> Result<AdvertiserProfile, Error> {
        self.get_envelope(token, "advertiser/info").await?.into_data()
    }

    async fn validate_music_id(
        &self,
        token: &AccessToken,
        music_id: &str,
    ) -> Result<MusicValidation, Error> {
        let body = json!({ "music_id": music_id });
        self.post_envelope(token, "music/validate", &body)
            .await?
            .into_data()
    }

    async fn create_ad(
        &self,
        token: &AccessToken,
        draft: &crate::form::AdDraft,
    ) -> Result<CreateAdOutcome, Error> {
        let body = json!({
            "campaign_name": draft.campaign_name,
            "objective": draft.objective,
            "ad_text": draft.ad_text,
            "call_to_action": draft.call_to_action,
            "music_id": draft.music_selection.music_id(),
        });
        let envelope = self.post_envelope(token, "ad/create", &body).await?;

        // A non-zero envelope here is the platform refusing the ad, which is
        // an expected outcome of submission; return it as a value.
        if envelope.code != 0 {
            tracing::info!(code = envelope.code, "ad creation rejected by platform");
            return Ok(CreateAdOutcome::Rejected(BusinessError {
                code: envelope.code.to_string(),
                message: envelope.message,
            }));
        }

        #[derive(Deserialize)]
        struct Payload {
            ad_id: AdId,
        }
        let payload: Payload = envelope.into_data()?;
        Ok(CreateAdOutcome::Created { ad_id: payload.ad_id })
    }

    async fn upload_music_file(
        &self,
        _token: &AccessToken,
        file: &UploadedFile,
    ) -> Result<MusicId, Error> {
        // The platform exposes no upload endpoint in this integration; the
        // upload path is simulated even in live mode.
        Ok(simulate_upload(file).await)
    }
}
