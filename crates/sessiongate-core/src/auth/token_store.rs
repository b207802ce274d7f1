//! The single bearer-token slot.
//!
//! `TokenStore` never fails: when no storage backend is available every
//! operation is a no-op and `get` returns `None`. Backend errors are logged
//! and treated the same way for that call.
//!
//! An empty token is never a session: storing one clears the slot, and an
//! empty stored value reads back as `None`, whichever backend is in use.

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::{debug, warn};

use crate::config::{Config, TokenStorageKind, APP_NAME};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "auth_token";

/// A key/value slot the token store can persist into.
pub trait TokenStorage: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key inside a directory, holding the raw value.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl TokenStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(contents))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create directory {}", self.dir.display()))?;
        let path = self.path(key);

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = std::fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(value.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            std::fs::write(&path, value)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Key used to check that the keychain keeps what is written to it.
const PERSISTENCE_CHECK_KEY: &str = "persistence_check";

/// OS keychain entry per key, under the application's service name.
pub struct KeyringStorage {
    service: String,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(APP_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    /// Write a value through one entry and read it back through another.
    ///
    /// Fails when no platform keychain is compiled in or reachable: the
    /// fallback credential store forgets everything between entries.
    pub fn check_persistence(&self) -> Result<()> {
        let value = format!("{}-{}", self.service, std::process::id());
        self.write(PERSISTENCE_CHECK_KEY, &value)?;
        let read_back = self.read(PERSISTENCE_CHECK_KEY);
        if let Err(e) = self.remove(PERSISTENCE_CHECK_KEY) {
            debug!(error = %e, "Failed to remove keychain check entry");
        }
        match read_back? {
            Some(stored) if stored == value => Ok(()),
            _ => anyhow::bail!("Keychain did not keep a stored value"),
        }
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStorage for KeyringStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

/// Process-local slot.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<(String, String)>>,
}

impl TokenStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        Ok(slot
            .as_ref()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.clone()))
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        *slot = Some((key.to_string(), value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
        if slot.as_ref().is_some_and(|(k, _)| k == key) {
            *slot = None;
        }
        Ok(())
    }
}

/// Persists and retrieves the single bearer token.
pub struct TokenStore {
    backend: Option<Box<dyn TokenStorage>>,
}

impl TokenStore {
    pub fn new(backend: Box<dyn TokenStorage>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// A store with no persistent storage behind it.
    pub fn unavailable() -> Self {
        Self { backend: None }
    }

    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryStorage::default()))
    }

    /// Keychain-backed store, or unavailable when the keychain does not
    /// persist values.
    pub fn keyring(service: &str) -> Self {
        let storage = KeyringStorage::with_service(service);
        match storage.check_persistence() {
            Ok(()) => Self::new(Box::new(storage)),
            Err(e) => {
                warn!(error = %e, service, "Keychain unusable, token storage unavailable");
                Self::unavailable()
            }
        }
    }

    /// Pick the backend named by the configuration.
    pub fn from_config(config: &Config) -> Self {
        match config.token_storage {
            TokenStorageKind::Keyring => Self::keyring(APP_NAME),
            TokenStorageKind::File => match config.data_dir() {
                Ok(dir) => Self::new(Box::new(FileStorage::new(dir))),
                Err(e) => {
                    warn!(error = %e, "No data directory, token storage unavailable");
                    Self::unavailable()
                }
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    pub fn get(&self) -> Option<String> {
        let backend = self.backend.as_ref()?;
        match backend.read(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read token");
                None
            }
        }
    }

    /// Last write wins. Storing an empty token clears the slot.
    pub fn set(&self, token: &str) {
        let Some(backend) = self.backend.as_ref() else {
            debug!("Token storage unavailable, not persisting token");
            return;
        };
        if token.is_empty() {
            debug!("Empty token, clearing instead");
            self.clear();
            return;
        }
        if let Err(e) = backend.write(TOKEN_KEY, token) {
            warn!(error = %e, "Failed to store token");
        }
    }

    pub fn clear(&self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        if let Err(e) = backend.remove(TOKEN_KEY) {
            warn!(error = %e, "Failed to clear token");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_contract(store: &TokenStore) {
        for token in [
            "abc",
            "eyJhbGciOiJIUzI1NiJ9.payload.sig",
            "with space",
            "ü-unicode",
            "tok\n",
            "crlf\r\n",
            " padded ",
        ] {
            store.set(token);
            assert_eq!(store.get().as_deref(), Some(token));
            assert!(store.is_authenticated());
        }
        store.clear();
        assert_eq!(store.get(), None);
        assert!(!store.is_authenticated());

        store.set("abc");
        store.set("");
        assert_eq!(store.get(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_memory_store_contract() {
        assert_contract(&TokenStore::in_memory());
    }

    #[test]
    fn test_file_store_contract() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Box::new(FileStorage::new(dir.path().join("data"))));
        assert_contract(&store);
    }

    #[test]
    fn test_keyring_store_contract_when_available() {
        let store = TokenStore::keyring("sessiongate-test");
        if store.is_available() {
            assert_contract(&store);
        } else {
            store.set("abc");
            assert_eq!(store.get(), None);
        }
    }

    #[test]
    #[ignore = "needs an OS keychain"]
    fn test_keyring_backend_keeps_token() {
        let storage = KeyringStorage::with_service("sessiongate-test");
        storage.check_persistence().unwrap();
        assert_contract(&TokenStore::new(Box::new(storage)));
    }

    #[test]
    fn test_empty_stored_value_is_no_session() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(TOKEN_KEY), "").unwrap();
        let store = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
        assert_eq!(store.get(), None);
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_last_write_wins() {
        let store = TokenStore::in_memory();
        store.set("first");
        store.set("second");
        assert_eq!(store.get().as_deref(), Some("second"));
    }

    #[test]
    fn test_unavailable_store_is_noop() {
        let store = TokenStore::unavailable();
        assert!(!store.is_available());
        store.set("abc");
        assert_eq!(store.get(), None);
        assert!(!store.is_authenticated());
        store.clear();
    }

    #[test]
    fn test_clear_on_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
        store.clear();
        assert!(!store.is_authenticated());
    }

    #[test]
    fn test_file_store_holds_raw_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
        store.set("raw-token");
        let on_disk = std::fs::read_to_string(dir.path().join(TOKEN_KEY)).unwrap();
        assert_eq!(on_disk, "raw-token");
    }

    #[cfg(unix)]
    #[test]
    fn test_file_store_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
        store.set("raw-token");
        let mode = std::fs::metadata(dir.path().join(TOKEN_KEY))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_store_reads_through_to_backend() {
        let dir = tempfile::tempdir().unwrap();
        let first = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));
        let second = TokenStore::new(Box::new(FileStorage::new(dir.path().to_path_buf())));

        first.set("shared");
        assert_eq!(second.get().as_deref(), Some("shared"));
        second.clear();
        assert!(!first.is_authenticated());
    }
}
