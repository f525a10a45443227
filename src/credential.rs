use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Validity buffer: a credential is treated as expired five minutes early so
/// requests started just before expiry don't fail mid-flight.
pub const EXPIRY_BUFFER_MS: i64 = 300_000;

/// Melodia advertiser account identifier (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct AdvertiserId(pub String);

/// Identifier of a created ad (opaque string).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into)]
#[serde(transparent)]
pub struct AdId(pub String);

/// Bearer access token, guaranteed non-empty by construction.
///
/// Every gateway operation takes an `AccessToken`, so "called with an empty
/// token" is unrepresentable. Use `AccessToken::try_from(string)` or
/// `"tok".parse::<AccessToken>()` to create one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccessToken(String);

impl AccessToken {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for AccessToken {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for AccessToken {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.is_empty() {
            Err(Error::InvalidValue {
                what: "access token",
                detail: "must not be empty".into(),
            })
        } else {
            Ok(Self(s))
        }
    }
}

impl From<AccessToken> for String {
    fn from(t: AccessToken) -> Self {
        t.0
    }
}

/// Validated Melodia music identifier (10–20 ASCII digits).
///
/// Holding a `MusicId` proves the format is correct; remote validation of
/// whether the track actually exists is a separate gateway call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MusicId(String);

impl MusicId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `s` has the music-id shape (10–20 digits).
    #[must_use]
    pub fn is_valid_format(s: &str) -> bool {
        (10..=20).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
    }
}

impl std::fmt::Display for MusicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for MusicId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s.to_owned())
    }
}

impl TryFrom<String> for MusicId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if MusicId::is_valid_format(&s) {
            Ok(Self(s))
        } else {
            Err(Error::InvalidValue {
                what: "music id",
                detail: format!("expected 10-20 digits, got {s:?}"),
            })
        }
    }
}

impl From<MusicId> for String {
    fn from(m: MusicId) -> Self {
        m.0
    }
}

/// Bearer credential obtained from the token exchange.
///
/// Immutable after creation: a renewed credential is a brand-new value that
/// replaces the old one wholesale, never a field update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to `issued_at_epoch_ms`.
    pub expires_in_secs: i64,
    /// Wall-clock issue instant, stamped locally at exchange time.
    pub issued_at_epoch_ms: i64,
    #[serde(default)]
    pub advertiser_id: Option<AdvertiserId>,
}

impl Credential {
    /// Absolute expiry instant in epoch milliseconds.
    #[must_use]
    pub fn expires_at_epoch_ms(&self) -> i64 {
        self.issued_at_epoch_ms + self.expires_in_secs * 1000
    }

    /// Whether the credential is usable at `now_ms`, applying the
    /// five-minute early-expiry buffer. The buffer edge itself is invalid.
    #[must_use]
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        now_ms < self.expires_at_epoch_ms() - EXPIRY_BUFFER_MS
    }

    /// [`is_valid_at`](Self::is_valid_at) against the system clock.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(now_epoch_ms())
    }
}

/// Current wall-clock time in epoch milliseconds.
#[must_use]
pub fn now_epoch_ms() -> i64 {
    (time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Advertiser account profile, fetched after authentication and replaced
/// wholesale on each successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvertiserProfile {
    pub advertiser_id: AdvertiserId,
    pub advertiser_name: String,
}
