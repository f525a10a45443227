#![doc = include_str!("../README.md")]

pub mod auth;
pub mod classify;
pub mod config;
pub mod credential;
pub mod debounce;
pub mod error;
pub mod form;
pub mod gateway;
pub mod session;
pub mod store;
pub mod verifier;

// Re-exports for convenient access
pub use auth::{AuthClient, AuthorizationFlow, AuthorizationRequest};
pub use classify::{classify, classify_callback_error, ErrorDescriptor, ErrorKind};
pub use config::{ApiMode, Config};
pub use credential::{AccessToken, AdId, AdvertiserId, AdvertiserProfile, Credential, MusicId};
pub use debounce::{MusicCheck, MusicCheckDebouncer};
pub use error::Error;
pub use form::{
    validate_draft, AdDraft, CallToAction, FieldErrors, FormField, MusicSelection, Objective,
};
pub use gateway::{
    AdsApi, BusinessError, CreateAdOutcome, Gateway, HttpGateway, MockGateway, MusicValidation,
    UploadedFile,
};
pub use session::{CallbackParams, SessionManager, SessionState};
pub use store::{CredentialStore, JsonFileCredentialStore, MemoryCredentialStore};
pub use verifier::StateVerifier;
