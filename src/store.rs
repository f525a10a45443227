use std::path::PathBuf;
use std::sync::Mutex;

use crate::credential::Credential;
use crate::error::Error;

/// Durable persistence of the bearer credential.
///
/// The store holds at most one credential, serialized as JSON under a single
/// key. It survives process restarts but not an explicit
/// [`clear`](CredentialStore::clear) (logout). Writes are last-writer-wins;
/// concurrent writers sharing one store are not coordinated.
///
/// # Example
///
/// ```rust,ignore
/// impl CredentialStore for MyVaultStore {
///     fn load(&self) -> Result<Option<Credential>, Error> {
///         self.vault.read("melodia_credential")
///     }
///     // ...
/// }
/// ```
pub trait CredentialStore: Send + Sync {
    /// Read the stored credential, if any.
    fn load(&self) -> Result<Option<Credential>, Error>;

    /// Persist `credential`, replacing any prior value wholesale.
    fn save(&self, credential: &Credential) -> Result<(), Error>;

    /// Remove the stored credential. Removing an empty store succeeds.
    fn clear(&self) -> Result<(), Error>;
}

/// In-memory store: scoped to the process lifetime. Useful for tests and
/// short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, Error> {
        Ok(self.slot.lock().expect("store lock poisoned").clone())
    }

    fn save(&self, credential: &Credential) -> Result<(), Error> {
        *self.slot.lock().expect("store lock poisoned") = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), Error> {
        *self.slot.lock().expect("store lock poisoned") = None;
        Ok(())
    }
}

/// File-backed store: one JSON document at a fixed path.
///
/// A missing file reads as "no credential". A file that exists but does not
/// parse reads as a [`Error::Store`] — bootstrap treats that as a corrupt
/// credential and discards it.
#[derive(Debug)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl CredentialStore for JsonFileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, Error> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Store(format!("read {}: {e}", self.path.display()))),
        };
        let credential = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Store(format!("parse {}: {e}", self.path.display())))?;
        Ok(Some(credential))
    }

    fn save(&self, credential: &Credential) -> Result<(), Error> {
        let json = serde_json::to_vec(credential)
            .map_err(|e| Error::Store(format!("serialize credential: {e}")))?;
        std::fs::write(&self.path, json)
            .map_err(|e| Error::Store(format!("write {}: {e}", self.path.display())))
    }

    fn clear(&self) -> Result<(), Error> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Store(format!("remove {}: {e}", self.path.display()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::AdvertiserId;

    fn credential() -> Credential {
        Credential {
            access_token: "act.round-trip".parse().unwrap(),
            refresh_token: Some("rft.unused".into()),
            expires_in_secs: 86400,
            issued_at_epoch_ms: 1_700_000_000_000,
            advertiser_id: Some(AdvertiserId("7788990011".into())),
        }
    }

    #[test]
    fn memory_round_trip() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());

        let c = credential();
        store.save(&c).unwrap();
        assert_eq!(store.load().unwrap(), Some(c));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("credential.json"));
        assert!(store.load().unwrap().is_none());

        let c = credential();
        store.save(&c).unwrap();
        assert_eq!(store.load().unwrap(), Some(c.clone()));

        // A second save replaces wholesale.
        let newer = Credential {
            issued_at_epoch_ms: c.issued_at_epoch_ms + 1000,
            ..c
        };
        store.save(&newer).unwrap();
        assert_eq!(store.load().unwrap(), Some(newer));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn file_store_reports_corrupt_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credential.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = JsonFileCredentialStore::new(path);
        assert!(matches!(store.load(), Err(Error::Store(_))));
    }
}
