use std::time::Duration;

use rand::Rng;

use super::{simulate_upload, AdsApi, BusinessError, CreateAdOutcome, MusicValidation, UploadedFile};
use crate::credential::{AccessToken, AdId, AdvertiserId, AdvertiserProfile, MusicId};
use crate::error::Error;

/// Canned music catalog: (music id, title, artist).
const CATALOG: &[(&str, &str, &str)] = &[
    ("7012345678901", "Neon Nights", "The Wavelengths"),
    ("7098765432109", "Golden Hour", "Mara Quinn"),
    ("7011223344556", "Paper Planes at Dawn", "Civic Echo"),
];

/// A track that exists but is not licensed for advertising use.
const UNAVAILABLE_MUSIC_ID: &str = "6600000000000";

/// In-process simulation of the Melodia business API.
///
/// Responses are canned and deterministic apart from generated identifiers.
/// Each operation waits `latency` first so callers exercise the same async
/// timing they would against the real platform.
pub struct MockGateway {
    latency: Duration,
    rate_limited: bool,
    profile: AdvertiserProfile,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self {
            latency: Duration::from_millis(300),
            rate_limited: false,
            profile: AdvertiserProfile {
                advertiser_id: AdvertiserId("7000000000".into()),
                advertiser_name: "Melodia Demo Advertiser".into(),
            },
        }
    }
}

impl MockGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the simulated per-call latency.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make `create_ad` report a simulated rate-limit rejection.
    #[must_use]
    pub fn with_rate_limiting(mut self, limited: bool) -> Self {
        self.rate_limited = limited;
        self
    }

    /// Override the canned advertiser profile.
    #[must_use]
    pub fn with_profile(mut self, profile: AdvertiserProfile) -> Self {
        self.profile = profile;
        self
    }
}

impl AdsApi for MockGateway {
    async fn get_advertiser_profile(&self, _token: &AccessToken) -> Result<AdvertiserProfile, Error> {
        tokio::time::sleep(self.latency).await;
        Ok(self.profile.clone())
    }

    async fn validate_music_id(
        &self,
        _token: &AccessToken,
        music_id: &str,
    ) -> Result<MusicValidation, Error> {
        tokio::time::sleep(self.latency).await;

        if let Some((_, title, artist)) = CATALOG.iter().find(|(id, _, _)| *id == music_id) {
            return Ok(MusicValidation {
                valid: true,
                title: Some((*title).into()),
                artist: Some((*artist).into()),
                error: None,
            });
        }

        let error = if music_id == UNAVAILABLE_MUSIC_ID {
            BusinessError {
                code: "music_unavailable".into(),
                message: "Music is unavailable for advertising use".into(),
            }
        } else {
            BusinessError {
                code: "40001".into(),
                message: "Invalid music id".into(),
            }
        };
        Ok(MusicValidation {
            valid: false,
            title: None,
            artist: None,
            error: Some(error),
        })
    }

    async fn create_ad(
        &self,
        _token: &AccessToken,
        _draft: &crate::form::AdDraft,
    ) -> Result<CreateAdOutcome, Error> {
        tokio::time::sleep(self.latency).await;

        if self.rate_limited {
            return Ok(CreateAdOutcome::Rejected(BusinessError {
                code: "40002".into(),
                message: "Rate limit exceeded".into(),
            }));
        }

        let mut rng = rand::rng();
        let mut id = String::from("17");
        for _ in 0..14 {
            id.push(char::from(b'0' + rng.random_range(0..10u8)));
        }
        Ok(CreateAdOutcome::Created { ad_id: AdId(id) })
    }

    async fn upload_music_file(
        &self,
        _token: &AccessToken,
        file: &UploadedFile,
    ) -> Result<MusicId, Error> {
        Ok(simulate_upload(file).await)
    }
}
