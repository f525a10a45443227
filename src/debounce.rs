use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::classify::{classify, ErrorDescriptor};
use crate::credential::AccessToken;
use crate::gateway::{AdsApi, MusicValidation};

/// Quiet period after the last edit before a remote check is issued.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Outcome of a debounced music check, tagged with the input it was issued
/// for. Errors arrive pre-classified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MusicCheck {
    pub music_id: String,
    pub outcome: Result<MusicValidation, ErrorDescriptor>,
}

/// Debounced remote music-id validation.
///
/// Each [`input_changed`](Self::input_changed) supersedes any pending or
/// in-flight check: the superseded check either never issues its request
/// (still inside the quiet period) or has its response discarded on arrival.
/// Only the most recent input's response can ever be observed on the
/// [`subscribe`](Self::subscribe) channel.
pub struct MusicCheckDebouncer<G> {
    gateway: Arc<G>,
    token: AccessToken,
    quiet_period: Duration,
    generation: Arc<AtomicU64>,
    tx: watch::Sender<Option<MusicCheck>>,
}

impl<G: AdsApi + 'static> MusicCheckDebouncer<G> {
    #[must_use]
    pub fn new(gateway: Arc<G>, token: AccessToken) -> Self {
        Self::with_quiet_period(gateway, token, DEFAULT_QUIET_PERIOD)
    }

    #[must_use]
    pub fn with_quiet_period(gateway: Arc<G>, token: AccessToken, quiet_period: Duration) -> Self {
        let (tx, _) = watch::channel(None);
        Self {
            gateway,
            token,
            quiet_period,
            generation: Arc::new(AtomicU64::new(0)),
            tx,
        }
    }

    /// Observe check results. The channel holds `None` until the first
    /// un-superseded check completes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<MusicCheck>> {
        self.tx.subscribe()
    }

    /// Record a new input value. Must be called on a tokio runtime.
    ///
    /// An empty input cancels any pending check and clears the observable
    /// result without issuing a request.
    pub fn input_changed(&self, music_id: impl Into<String>) {
        let music_id = music_id.into();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        if music_id.is_empty() {
            let _ = self.tx.send(None);
            return;
        }

        let gateway = Arc::clone(&self.gateway);
        let token = self.token.clone();
        let quiet_period = self.quiet_period;
        let latest = Arc::clone(&self.generation);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if latest.load(Ordering::SeqCst) != generation {
                // Superseded inside the quiet period; never issue the call.
                return;
            }

            let result = gateway.validate_music_id(&token, &music_id).await;

            if latest.load(Ordering::SeqCst) != generation {
                // Superseded while in flight; discard the response.
                tracing::debug!(music_id = %music_id, "discarding superseded music check");
                return;
            }

            let outcome = result.map_err(|e| classify(&e));
            let _ = tx.send(Some(MusicCheck { music_id, outcome }));
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::credential::{AdvertiserProfile, MusicId};
    use crate::error::Error;
    use crate::form::AdDraft;
    use crate::gateway::{CreateAdOutcome, UploadedFile};

    /// Records every validation call; answers "valid" after `delay`.
    struct RecordingApi {
        delay: Duration,
        calls: Mutex<Vec<String>>,
    }

    impl RecordingApi {
        fn new(delay: Duration) -> Self {
            Self {
                delay,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl AdsApi for RecordingApi {
        async fn get_advertiser_profile(&self, _: &AccessToken) -> Result<AdvertiserProfile, Error> {
            unreachable!("not used in debounce tests")
        }

        async fn validate_music_id(
            &self,
            _: &AccessToken,
            music_id: &str,
        ) -> Result<MusicValidation, Error> {
            self.calls.lock().unwrap().push(music_id.to_string());
            tokio::time::sleep(self.delay).await;
            Ok(MusicValidation {
                valid: true,
                title: Some(format!("Track {music_id}")),
                artist: None,
                error: None,
            })
        }

        async fn create_ad(&self, _: &AccessToken, _: &AdDraft) -> Result<CreateAdOutcome, Error> {
            unreachable!("not used in debounce tests")
        }

        async fn upload_music_file(&self, _: &AccessToken, _: &UploadedFile) -> Result<MusicId, Error> {
            unreachable!("not used in debounce tests")
        }
    }

    fn token() -> AccessToken {
        "act.debounce".parse().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_edits_issue_one_check_for_the_final_value() {
        let api = Arc::new(RecordingApi::new(Duration::ZERO));
        let debouncer = MusicCheckDebouncer::new(Arc::clone(&api), token());
        let mut rx = debouncer.subscribe();

        debouncer.input_changed("1111111111");
        debouncer.input_changed("2222222222");
        debouncer.input_changed("3333333333");

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(api.calls(), vec!["3333333333".to_string()]);
        let check = rx.borrow_and_update().clone().expect("a result arrived");
        assert_eq!(check.music_id, "3333333333");
        assert!(check.outcome.unwrap().valid);
    }

    #[tokio::test(start_paused = true)]
    async fn edits_spaced_past_the_quiet_period_each_issue_a_check() {
        let api = Arc::new(RecordingApi::new(Duration::ZERO));
        let debouncer = MusicCheckDebouncer::new(Arc::clone(&api), token());

        debouncer.input_changed("1111111111");
        tokio::time::sleep(Duration::from_millis(600)).await;
        debouncer.input_changed("2222222222");
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert_eq!(
            api.calls(),
            vec!["1111111111".to_string(), "2222222222".to_string()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_response_is_discarded_when_superseded() {
        // Validation takes a full second, so the first request is in flight
        // when the second edit lands.
        let api = Arc::new(RecordingApi::new(Duration::from_millis(1000)));
        let debouncer = MusicCheckDebouncer::new(Arc::clone(&api), token());
        let mut rx = debouncer.subscribe();

        debouncer.input_changed("1111111111");
        tokio::time::sleep(Duration::from_millis(600)).await; // request 1 now in flight
        debouncer.input_changed("2222222222");

        // Request 1 arrives at t=1500 and must be discarded, not published.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(rx.borrow_and_update().is_none());

        // Request 2 arrives at t=2100 and is published.
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(api.calls().len(), 2);
        let check = rx.borrow_and_update().clone().expect("final result arrived");
        assert_eq!(check.music_id, "2222222222");
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_cancels_and_clears() {
        let api = Arc::new(RecordingApi::new(Duration::ZERO));
        let debouncer = MusicCheckDebouncer::new(Arc::clone(&api), token());
        let mut rx = debouncer.subscribe();

        debouncer.input_changed("1111111111");
        debouncer.input_changed("");
        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(api.calls().is_empty());
        assert!(rx.borrow_and_update().is_none());
    }
}
