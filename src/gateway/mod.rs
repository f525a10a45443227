//! Authenticated operations against the Melodia business API.
//!
//! [`AdsApi`] is the seam between the session layer and the wire:
//! [`HttpGateway`] talks to the platform, [`MockGateway`] simulates it.
//! Expected business outcomes (an unknown music id, a rejected ad) are
//! values, not errors — only transport and protocol failures are `Err`, so
//! callers route everything through [`classify`](crate::classify::classify)
//! without a catch-based control path.

mod http;
mod mock;

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::credential::{AccessToken, AdId, AdvertiserProfile, MusicId};
use crate::error::Error;
use crate::form::AdDraft;

pub use http::HttpGateway;
pub use mock::MockGateway;

/// Structured business failure from the platform, carried as a value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BusinessError {
    pub code: String,
    pub message: String,
}

impl From<BusinessError> for Error {
    fn from(e: BusinessError) -> Self {
        Error::protocol(e.code, e.message)
    }
}

/// Result of a remote music-id check. "Not found" is an expected outcome of
/// validation, so it arrives as `valid: false` with an attached error rather
/// than as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MusicValidation {
    pub valid: bool,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub error: Option<BusinessError>,
}

/// Result of an ad-creation submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateAdOutcome {
    Created { ad_id: AdId },
    /// The platform refused the ad (rate limiting, policy, quota). Route the
    /// carried error through the classifier for display.
    Rejected(BusinessError),
}

/// Reference to a local audio file picked for upload. Only metadata travels
/// through validation; the byte stream is the embedder's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

/// Authenticated Melodia business API operations.
///
/// Every operation takes an [`AccessToken`], which is non-empty by
/// construction. Transport failures surface uniformly as
/// [`Error::Transport`].
pub trait AdsApi: Send + Sync {
    /// Fetch the advertiser profile bound to the token.
    fn get_advertiser_profile(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<AdvertiserProfile, Error>> + Send;

    /// Check whether a music id refers to a usable track.
    fn validate_music_id(
        &self,
        token: &AccessToken,
        music_id: &str,
    ) -> impl Future<Output = Result<MusicValidation, Error>> + Send;

    /// Submit an ad-creation request. Business-level rejection comes back as
    /// [`CreateAdOutcome::Rejected`], never as `Err`.
    fn create_ad(
        &self,
        token: &AccessToken,
        draft: &AdDraft,
    ) -> impl Future<Output = Result<CreateAdOutcome, Error>> + Send;

    /// Upload a music file and return its fresh id.
    ///
    /// Known limitation: the upload path is simulated (fixed latency,
    /// generated id) and does not check the token against the platform.
    fn upload_music_file(
        &self,
        token: &AccessToken,
        file: &UploadedFile,
    ) -> impl Future<Output = Result<MusicId, Error>> + Send;
}

/// Gateway selected at runtime by the config's
/// [`ApiMode`](crate::config::ApiMode).
pub enum Gateway {
    Http(HttpGateway),
    Mock(MockGateway),
}

impl Gateway {
    #[must_use]
    pub fn from_config(config: &crate::config::Config) -> Self {
        match config.mode() {
            crate::config::ApiMode::Live => Self::Http(HttpGateway::new(config.api_base_url().clone())),
            crate::config::ApiMode::Simulated => Self::Mock(MockGateway::new()),
        }
    }
}

impl AdsApi for Gateway {
    async fn get_advertiser_profile(&self, token: &AccessToken) -> Result<AdvertiserProfile, Error> {
        match self {
            Self::Http(g) => g.get_advertiser_profile(token).await,
            Self::Mock(g) => g.get_advertiser_profile(token).await,
        }
    }

    async fn validate_music_id(
        &self,
        token: &AccessToken,
        music_id: &str,
    ) -> Result<MusicValidation, Error> {
        match self {
            Self::Http(g) => g.validate_music_id(token, music_id).await,
            Self::Mock(g) => g.validate_music_id(token, music_id).await,
        }
    }

    async fn create_ad(&self, token: &AccessToken, draft: &AdDraft) -> Result<CreateAdOutcome, Error> {
        match self {
            Self::Http(g) => g.create_ad(token, draft).await,
            Self::Mock(g) => g.create_ad(token, draft).await,
        }
    }

    async fn upload_music_file(
        &self,
        token: &AccessToken,
        file: &UploadedFile,
    ) -> Result<MusicId, Error> {
        match self {
            Self::Http(g) => g.upload_music_file(token, file).await,
            Self::Mock(g) => g.upload_music_file(token, file).await,
        }
    }
}

/// The platform's uniform response envelope: `code != 0` denotes failure,
/// `data` carries the payload on success.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope {
    pub(crate) code: i64,
    #[serde(default)]
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) data: Option<serde_json::Value>,
}

impl ApiEnvelope {
    /// Split into the platform's failure/success halves without consuming
    /// the payload shape: `Err` carries the raw envelope data for the
    /// classifier.
    pub(crate) fn into_result(self) -> Result<Option<serde_json::Value>, Error> {
        if self.code != 0 {
            return Err(Error::Protocol {
                code: self.code.to_string(),
                message: self.message,
                data: self.data,
            });
        }
        Ok(self.data)
    }

    /// Decode the success payload as `T`. A missing or malformed payload is
    /// a protocol-shaped failure (the classifier files it under Unknown).
    pub(crate) fn into_data<T: DeserializeOwned>(self) -> Result<T, Error> {
        let data = self
            .into_result()?
            .ok_or_else(|| Error::protocol("missing_data", "response envelope carried no data"))?;
        serde_json::from_value(data)
            .map_err(|e| Error::protocol("malformed_data", format!("unexpected payload: {e}")))
    }
}

/// Simulated upload shared by both gateways: fixed latency, then a freshly
/// generated 15-digit id. Does not inspect the token.
pub(crate) async fn simulate_upload(file: &UploadedFile) -> MusicId {
    use rand::Rng;

    tracing::debug!(file = %file.file_name, size = file.size_bytes, "simulating music upload");
    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;

    let mut rng = rand::rng();
    let mut digits = String::with_capacity(15);
    digits.push(char::from(b'1' + rng.random_range(0..9u8)));
    for _ in 0..14 {
        digits.push(char::from(b'0' + rng.random_range(0..10u8)));
    }
    digits.parse().expect("generated digits form a valid music id")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_failure_carries_code_message_and_data() {
        let envelope: ApiEnvelope = serde_json::from_str(
            r#"{"code": 40100, "message": "token expired", "data": {"code": "expired_token"}}"#,
        )
        .unwrap();
        match envelope.into_result() {
            Err(Error::Protocol { code, message, data }) => {
                assert_eq!(code, "40100");
                assert_eq!(message, "token expired");
                assert_eq!(data.unwrap()["code"], "expired_token");
            }
            other => panic!("expected protocol error, got {other:?}"),
        }
    }

    #[test]
    fn envelope_success_decodes_payload() {
        let envelope: ApiEnvelope =
            serde_json::from_str(r#"{"code": 0, "message": "OK", "data": {"ad_id": "123"}}"#)
                .unwrap();
        #[derive(Deserialize)]
        struct Payload {
            ad_id: String,
        }
        let payload: Payload = envelope.into_data().unwrap();
        assert_eq!(payload.ad_id, "123");
    }

    #[test]
    fn envelope_success_without_data_is_protocol_shaped() {
        let envelope: ApiEnvelope = serde_json::from_str(r#"{"code": 0, "message": "OK"}"#).unwrap();
        assert!(matches!(
            envelope.into_data::<serde_json::Value>(),
            Err(Error::Protocol { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_upload_yields_well_formed_id() {
        let file = UploadedFile {
            file_name: "jingle.mp3".into(),
            mime_type: "audio/mpeg".into(),
            size_bytes: 1024,
        };
        let id = simulate_upload(&file).await;
        assert!(MusicId::is_valid_format(id.as_str()));
    }
}
