//! Maps raw failures onto a closed set of user-facing error descriptors.
//!
//! Raw platform codes and machine messages never reach the operator:
//! everything the gateway or authorization client can produce passes through
//! [`classify`] (or [`classify_callback_error`] for inbound redirect errors)
//! before display. Classification is total — an unclassifiable input lands
//! in [`ErrorKind::Unknown`], it never panics or propagates.

use crate::error::Error;

/// Closed taxonomy of user-facing failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport-level failure: no response reached us.
    Network,
    /// The client ID/secret pair was rejected.
    InvalidCredentials,
    /// The session or grant has expired; re-authentication fixes it.
    ExpiredSession,
    /// The authorized account lacks the required permissions.
    MissingPermissions,
    /// The operation is not available in the account's region.
    GeoRestricted,
    /// The platform throttled the request.
    RateLimited,
    /// The referenced music identifier is not valid.
    InvalidMusicId,
    /// The referenced music exists but cannot be used.
    MusicUnavailable,
    /// The callback's anti-forgery state did not match.
    StateMismatch,
    /// The operator declined authorization at the platform.
    AuthorizationDenied,
    /// The callback arrived without an authorization code.
    MissingAuthCode,
    /// Anything we cannot place more precisely.
    Unknown,
}

/// User-facing representation of a failure: what happened, what to do about
/// it, and whether a retry action should be offered.
///
/// Pure derived data — recomputed from the raw error at display time, never
/// persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorDescriptor {
    pub kind: ErrorKind,
    pub title: String,
    pub message: String,
    pub instruction: String,
    pub retryable: bool,
}

impl ErrorDescriptor {
    fn new(
        kind: ErrorKind,
        title: &str,
        message: impl Into<String>,
        instruction: &str,
        retryable: bool,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            instruction: instruction.into(),
            retryable,
        }
    }
}

const FALLBACK_MESSAGE: &str = "Something went wrong while talking to Melodia.";
const RESTART_INSTRUCTION: &str = "Restart the sign-in process from the beginning.";

/// Platform codes recognized by the classifier. Matching is first-rule-wins
/// in the order of the `classify` dispatch below.
mod codes {
    pub const INVALID_CLIENT: &str = "invalid_client";
    pub const INVALID_GRANT: &str = "invalid_grant";
    pub const EXPIRED_TOKEN: &str = "expired_token";
    pub const UNAUTHORIZED_CLIENT: &str = "unauthorized_client";
    pub const INSUFFICIENT_PERMISSIONS: &str = "insufficient_permissions";
    pub const GEO_RESTRICTED: &str = "geo_restricted";
    pub const RATE_LIMITED_NUMERIC: &str = "40002";
    pub const TOO_MANY_REQUESTS: &str = "too_many_requests";
    pub const INVALID_MUSIC_ID_NUMERIC: &str = "40001";
    pub const INVALID_MUSIC_ID: &str = "invalid_music_id";
    pub const MUSIC_UNAVAILABLE: &str = "music_unavailable";
}

/// Classify a raw failure into a user-facing descriptor.
///
/// Dispatch order matters: the first matching rule wins. Protocol errors are
/// matched on their code first, then on well-known message substrings
/// (case-insensitive), because the platform is inconsistent about which of
/// the two carries the signal.
#[must_use]
pub fn classify(error: &Error) -> ErrorDescriptor {
    match error {
        Error::Transport(e) if e.is_decode() => ErrorDescriptor::new(
            ErrorKind::Unknown,
            "Unexpected response",
            FALLBACK_MESSAGE,
            "Try again. If this keeps happening, contact support.",
            true,
        ),
        Error::Transport(_) => ErrorDescriptor::new(
            ErrorKind::Network,
            "Connection problem",
            "We couldn't reach Melodia.",
            "Check your connection and try again.",
            true,
        ),
        Error::Protocol { code, message, data } => classify_protocol(code, message, data.as_ref()),
        Error::StateMismatch => ErrorDescriptor::new(
            ErrorKind::StateMismatch,
            "Sign-in could not be verified",
            "The sign-in response didn't match the request we sent, so it was rejected.",
            RESTART_INSTRUCTION,
            true,
        ),
        Error::RefreshUnsupported => ErrorDescriptor::new(
            ErrorKind::ExpiredSession,
            "Session expired",
            "Your Melodia session can't be renewed automatically.",
            "Sign in again to continue.",
            true,
        ),
        _ => ErrorDescriptor::new(
            ErrorKind::Unknown,
            "Something went wrong",
            FALLBACK_MESSAGE,
            "Try again. If this keeps happening, contact support.",
            true,
        ),
    }
}

fn classify_protocol(
    code: &str,
    message: &str,
    data: Option<&serde_json::Value>,
) -> ErrorDescriptor {
    let lower = message.to_ascii_lowercase();
    // Business codes are sometimes nested in the envelope's data payload.
    let embedded_code = data
        .and_then(|d| d.get("code"))
        .and_then(|c| c.as_str())
        .unwrap_or_default();

    if code == codes::INVALID_CLIENT {
        ErrorDescriptor::new(
            ErrorKind::InvalidCredentials,
            "Invalid client credentials",
            "Melodia rejected this application's client ID or secret.",
            "Fix the client configuration before trying again.",
            false,
        )
    } else if code == codes::INVALID_GRANT
        || code == codes::EXPIRED_TOKEN
        || embedded_code == codes::EXPIRED_TOKEN
    {
        ErrorDescriptor::new(
            ErrorKind::ExpiredSession,
            "Session expired",
            "Your Melodia session has expired.",
            "Sign in again to continue.",
            true,
        )
    } else if code == codes::UNAUTHORIZED_CLIENT || code == codes::INSUFFICIENT_PERMISSIONS {
        ErrorDescriptor::new(
            ErrorKind::MissingPermissions,
            "Missing permissions",
            "Your Melodia account doesn't have permission for this operation.",
            "Ask the advertiser account owner to grant access.",
            false,
        )
    } else if code == codes::GEO_RESTRICTED || lower.contains("region") || lower.contains("geo") {
        ErrorDescriptor::new(
            ErrorKind::GeoRestricted,
            "Not available in your region",
            "This operation isn't available for your account's region.",
            "Contact Melodia support if you believe this is wrong.",
            false,
        )
    } else if code == codes::RATE_LIMITED_NUMERIC
        || code == codes::TOO_MANY_REQUESTS
        || lower.contains("rate limit")
    {
        ErrorDescriptor::new(
            ErrorKind::RateLimited,
            "Too many requests",
            "Melodia is limiting requests from this account right now.",
            "Wait a moment before resubmitting.",
            true,
        )
    } else if code == codes::INVALID_MUSIC_ID_NUMERIC
        || code == codes::INVALID_MUSIC_ID
        || lower.contains("invalid music")
    {
        ErrorDescriptor::new(
            ErrorKind::InvalidMusicId,
            "Music not recognized",
            "The music ID you entered wasn't recognized by Melodia.",
            "Double-check the ID and try again.",
            true,
        )
    } else if code == codes::MUSIC_UNAVAILABLE
        || (lower.contains("music") && lower.contains("unavailable"))
    {
        ErrorDescriptor::new(
            ErrorKind::MusicUnavailable,
            "Music unavailable",
            "That track exists but can't be used in ads.",
            "Pick a different track and try again.",
            true,
        )
    } else {
        let shown = if message.is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message.to_string()
        };
        ErrorDescriptor::new(
            ErrorKind::Unknown,
            "Something went wrong",
            shown,
            "Try again. If this keeps happening, contact support.",
            true,
        )
    }
}

/// Classify an error code delivered on the inbound authorization redirect.
///
/// All four shapes are recoverable by starting a fresh authorization attempt,
/// so every descriptor here is retryable with a restart instruction.
#[must_use]
pub fn classify_callback_error(code: &str, description: Option<&str>) -> ErrorDescriptor {
    match code {
        "access_denied" => ErrorDescriptor::new(
            ErrorKind::AuthorizationDenied,
            "Authorization declined",
            "You declined to authorize this application on Melodia.",
            RESTART_INSTRUCTION,
            true,
        ),
        "missing_code" => ErrorDescriptor::new(
            ErrorKind::MissingAuthCode,
            "Sign-in incomplete",
            "Melodia redirected back without an authorization code.",
            RESTART_INSTRUCTION,
            true,
        ),
        "invalid_state" => ErrorDescriptor::new(
            ErrorKind::StateMismatch,
            "Sign-in could not be verified",
            "The sign-in response didn't match the request we sent, so it was rejected.",
            RESTART_INSTRUCTION,
            true,
        ),
        _ => ErrorDescriptor::new(
            ErrorKind::Unknown,
            "Sign-in failed",
            description
                .filter(|d| !d.is_empty())
                .unwrap_or("Melodia reported a sign-in problem.")
                .to_string(),
            RESTART_INSTRUCTION,
            true,
        ),
    }
}
