use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::UserProfile;

use super::storage::{MemoryStorage, Storage};

/// Storage key holding the raw bearer token
const TOKEN_KEY: &str = "fbisdevoptics.token";

/// Storage key holding the serialized user profile
const USER_KEY: &str = "fbisdevoptics.user";

/// Token and profile of an authenticated session. Always stored and removed together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub user: UserProfile,
}

/// Sole owner of the persisted credential.
///
/// All operations are serialized against each other, so a reader never sees
/// the token of one credential paired with the profile of another. Outside
/// this crate the store is read-only; only the session manager and the
/// interceptor change it.
pub struct CredentialStore {
    storage: Box<dyn Storage>,
    lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            lock: Mutex::new(()),
        }
    }

    /// Store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Persist `credential`, replacing any previous one.
    pub(crate) fn save(&self, credential: &Credential) -> Result<()> {
        let user = serde_json::to_string(&credential.user).context("Failed to serialize user profile")?;
        let _guard = self.guard();
        self.storage
            .set(&[(TOKEN_KEY, credential.token.as_str()), (USER_KEY, user.as_str())])
            .context("Failed to save credential")?;
        debug!(user_id = %credential.user.id, "Credential saved");
        Ok(())
    }

    /// Load the stored credential. Missing, incomplete or unparseable data all read as `None`.
    pub fn load(&self) -> Option<Credential> {
        let _guard = self.guard();
        self.read()
    }

    /// Remove the stored credential and return what was there.
    /// Clearing an empty store is fine and returns `None`.
    pub(crate) fn take(&self) -> Result<Option<Credential>> {
        let _guard = self.guard();
        let previous = self.read();
        self.remove_entries()?;
        Ok(previous)
    }

    /// Clear the store only if it still holds `token`.
    ///
    /// Returns `true` if a credential was removed. Of several callers racing
    /// with the same token, exactly one gets `true`.
    pub(crate) fn clear_if_token(&self, token: &str) -> Result<bool> {
        let _guard = self.guard();
        match self.read() {
            Some(current) if current.token == token => {
                self.remove_entries()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The mutex guards no data of its own, so a poisoned lock is still usable.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove_entries(&self) -> Result<()> {
        self.storage
            .remove(&[TOKEN_KEY, USER_KEY])
            .context("Failed to clear credential")
    }

    fn read(&self) -> Option<Credential> {
        let token = match self.storage.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                return None;
            }
        };
        let user = match self.storage.get(USER_KEY) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Failed to read stored user profile");
                return None;
            }
        };

        match (token, user) {
            (None, None) => None,
            (Some(token), Some(raw)) if !token.is_empty() => {
                match serde_json::from_str::<UserProfile>(&raw) {
                    Ok(user) => Some(Credential { token, user }),
                    Err(e) => {
                        warn!(error = %e, "Stored user profile is corrupted, ignoring credential");
                        None
                    }
                }
            }
            _ => {
                warn!("Stored credential is incomplete, ignoring it");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use anyhow::anyhow;

    use super::*;
    use crate::auth::storage::FileStorage;
    use crate::models::Role;

    fn credential(token: &str, role: Role) -> Credential {
        Credential {
            token: token.to_string(),
            user: UserProfile {
                id: "u1".to_string(),
                full_name: "Ann".to_string(),
                email: "a@b.com".to_string(),
                role,
            },
        }
    }

    /// Shares one MemoryStorage between a store and the test body.
    struct SharedStorage(Arc<MemoryStorage>);

    impl Storage for SharedStorage {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, entries: &[(&str, &str)]) -> Result<()> {
            self.0.set(entries)
        }
        fn remove(&self, keys: &[&str]) -> Result<()> {
            self.0.remove(keys)
        }
    }

    /// Accepts the first write and fails every one after it.
    pub(crate) struct FailingAfterFirstWrite {
        inner: MemoryStorage,
        writes: Mutex<u32>,
    }

    impl FailingAfterFirstWrite {
        pub(crate) fn new() -> Self {
            Self {
                inner: MemoryStorage::new(),
                writes: Mutex::new(0),
            }
        }
    }

    impl Storage for FailingAfterFirstWrite {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.inner.get(key)
        }
        fn set(&self, entries: &[(&str, &str)]) -> Result<()> {
            let mut writes = self.writes.lock().map_err(|_| anyhow!("poisoned"))?;
            *writes += 1;
            if *writes > 1 {
                return Err(anyhow!("disk full"));
            }
            self.inner.set(entries)
        }
        fn remove(&self, keys: &[&str]) -> Result<()> {
            self.inner.remove(keys)
        }
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = CredentialStore::in_memory();
        let saved = credential("t1", Role::Manager);
        store.save(&saved).expect("save succeeds");
        assert_eq!(store.load(), Some(saved));
    }

    #[test]
    fn test_save_overwrites_previous() {
        let store = CredentialStore::in_memory();
        store.save(&credential("t1", Role::Viewer)).expect("save succeeds");
        store.save(&credential("t2", Role::Admin)).expect("save succeeds");
        let loaded = store.load().expect("credential present");
        assert_eq!(loaded.token, "t2");
        assert_eq!(loaded.user.role, Role::Admin);
    }

    #[test]
    fn test_clear_then_load_is_absent() {
        let store = CredentialStore::in_memory();
        store.save(&credential("t1", Role::Analyst)).expect("save succeeds");
        store.take().expect("clear succeeds");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = CredentialStore::in_memory();
        assert_eq!(store.take().expect("clearing an empty store is fine"), None);
        assert_eq!(store.take().expect("and so is doing it twice"), None);
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_take_returns_previous() {
        let store = CredentialStore::in_memory();
        let saved = credential("t1", Role::Viewer);
        store.save(&saved).expect("save succeeds");
        assert_eq!(store.take().expect("take succeeds"), Some(saved));
        assert_eq!(store.take().expect("take succeeds"), None);
    }

    #[test]
    fn test_clear_if_token_matches_once() {
        let store = CredentialStore::in_memory();
        store.save(&credential("t1", Role::Viewer)).expect("save succeeds");
        assert!(store.clear_if_token("t1").expect("clear succeeds"));
        assert!(!store.clear_if_token("t1").expect("second clear is a no-op"));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_clear_if_token_ignores_newer_credential() {
        let store = CredentialStore::in_memory();
        store.save(&credential("new", Role::Viewer)).expect("save succeeds");
        assert!(!store.clear_if_token("old").expect("clear succeeds"));
        assert_eq!(store.load().map(|c| c.token), Some("new".to_string()));
    }

    #[test]
    fn test_corrupted_profile_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set(&[(TOKEN_KEY, "t1"), (USER_KEY, "{\"id\": 42")])
            .expect("seed storage");
        let store = CredentialStore::new(SharedStorage(storage));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_half_written_credential_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(&[(TOKEN_KEY, "t1")]).expect("seed storage");
        let store = CredentialStore::new(SharedStorage(storage.clone()));
        assert_eq!(store.load(), None);

        storage.remove(&[TOKEN_KEY]).expect("remove token");
        let user = serde_json::to_string(&credential("t1", Role::Viewer).user).expect("serialize");
        storage.set(&[(USER_KEY, user.as_str())]).expect("seed profile only");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_empty_token_reads_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        let user = serde_json::to_string(&credential("t1", Role::Viewer).user).expect("serialize");
        storage
            .set(&[(TOKEN_KEY, ""), (USER_KEY, user.as_str())])
            .expect("seed storage");
        let store = CredentialStore::new(SharedStorage(storage));
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_unknown_role_survives_reload() {
        let store = CredentialStore::in_memory();
        store
            .save(&credential("t1", Role::Unrecognized("auditor".to_string())))
            .expect("save succeeds");
        let loaded = store.load().expect("credential present");
        assert_eq!(loaded.user.role, Role::Unrecognized("auditor".to_string()));
    }

    #[test]
    fn test_failed_save_keeps_prior_value() {
        let store = CredentialStore::new(FailingAfterFirstWrite::new());
        let first = credential("t1", Role::Viewer);
        store.save(&first).expect("first save succeeds");
        assert!(store.save(&credential("t2", Role::Admin)).is_err());
        assert_eq!(store.load(), Some(first));
    }

    #[test]
    fn test_file_backed_store_survives_restart() {
        let dir = tempfile::tempdir().expect("tempdir");
        let saved = credential("t1", Role::Manager);
        CredentialStore::new(FileStorage::new(dir.path().to_path_buf()))
            .save(&saved)
            .expect("save succeeds");

        let restarted = CredentialStore::new(FileStorage::new(dir.path().to_path_buf()));
        assert_eq!(restarted.load(), Some(saved));
    }

    #[test]
    fn test_file_backed_store_layout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = FileStorage::new(dir.path().to_path_buf());
        let path = storage.path();
        CredentialStore::new(storage)
            .save(&credential("t1", Role::Viewer))
            .expect("save succeeds");

        let raw = std::fs::read_to_string(path).expect("storage file exists");
        let doc: serde_json::Value = serde_json::from_str(&raw).expect("storage is JSON");
        assert_eq!(doc["fbisdevoptics.token"], "t1");
        let user: serde_json::Value = serde_json::from_str(
            doc["fbisdevoptics.user"].as_str().expect("profile stored as a string"),
        )
        .expect("profile is JSON");
        assert_eq!(user["fullName"], "Ann");
    }
}
