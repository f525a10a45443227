use std::sync::Mutex;

use rand::Rng;

/// One-shot anti-forgery state token for the authorization flow.
///
/// At most one token is valid at a time: [`issue`](StateVerifier::issue)
/// overwrites any prior value, and [`consume_and_verify`]
/// (StateVerifier::consume_and_verify) deletes the stored token regardless
/// of the match outcome, so a replayed callback can never verify twice.
#[derive(Debug, Default)]
pub struct StateVerifier {
    stored: Mutex<Option<String>>,
}

impl StateVerifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate and store a fresh state token (32 random bytes, hex-encoded
    /// to 64 characters), replacing any previously issued token.
    pub fn issue(&self) -> String {
        let token = generate_state();
        *self.stored.lock().expect("state lock poisoned") = Some(token.clone());
        token
    }

    /// One-shot verification: removes the stored token unconditionally and
    /// returns whether `candidate` matched it. No stored token means false —
    /// absence is a verification failure, never "skip verification".
    pub fn consume_and_verify(&self, candidate: &str) -> bool {
        let stored = self.stored.lock().expect("state lock poisoned").take();
        match stored {
            Some(expected) => expected == candidate,
            None => false,
        }
    }
}

/// Generates a cryptographically random state parameter.
///
/// Returns a 64-character hex string (32 random bytes).
#[must_use]
pub fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::rng().random();
    hex::encode(random_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_length_and_charset() {
        let state = generate_state();
        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_state_uniqueness() {
        let s1 = generate_state();
        let s2 = generate_state();
        assert_ne!(s1, s2, "states should be unique");
    }

    #[test]
    fn matching_candidate_verifies_once() {
        let verifier = StateVerifier::new();
        let token = verifier.issue();
        assert!(verifier.consume_and_verify(&token));
        // One-shot: the same token never verifies a second time.
        assert!(!verifier.consume_and_verify(&token));
    }

    #[test]
    fn mismatch_consumes_the_stored_token() {
        let verifier = StateVerifier::new();
        let token = verifier.issue();
        assert!(!verifier.consume_and_verify("forged"));
        // The real token was burned by the failed attempt.
        assert!(!verifier.consume_and_verify(&token));
    }

    #[test]
    fn absence_is_failure() {
        let verifier = StateVerifier::new();
        assert!(!verifier.consume_and_verify("anything"));
    }

    #[test]
    fn reissue_overwrites_prior_token() {
        let verifier = StateVerifier::new();
        let first = verifier.issue();
        let second = verifier.issue();
        assert!(!verifier.consume_and_verify(&first));
        // The failed check above consumed the slot; second is gone too.
        assert!(!verifier.consume_and_verify(&second));

        let third = verifier.issue();
        assert!(verifier.consume_and_verify(&third));
    }
}
