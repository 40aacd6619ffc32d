// Persistent token stores
//
// Both backends file the bearer token under `AUTH_TOKEN_KEY` and never
// surface errors: failures are logged and reads fall back to "no token",
// which the session treats as logged out.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use mobius_api::{AUTH_TOKEN_KEY, MemoryTokenStore, TokenStore};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::{TokenBackend, data_dir};

/// Keyring service name all entries are filed under.
pub const KEYRING_SERVICE: &str = "mobius";

/// Open the token store a profile is configured for.
pub fn open_token_store(profile_name: &str, backend: TokenBackend) -> Arc<dyn TokenStore> {
    debug!(profile = profile_name, %backend, "opening token store");
    match backend {
        TokenBackend::Keyring => Arc::new(KeyringTokenStore::new(profile_name)),
        TokenBackend::File => Arc::new(FileTokenStore::for_profile(profile_name)),
        TokenBackend::Memory => Arc::new(MemoryTokenStore::new()),
    }
}

// ── File ────────────────────────────────────────────────────────────

/// JSON key/value file, one per profile.
///
/// The file is rewritten whole on every change; unknown keys are kept.
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// `<data dir>/tokens/<profile>.json`
    pub fn for_profile(profile_name: &str) -> Self {
        Self::new(data_dir().join("tokens").join(format!("{profile_name}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> BTreeMap<String, String> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read token file");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %self.path.display(), error = %e, "token file is not a JSON object");
            BTreeMap::new()
        })
    }

    fn write_map(&self, map: &BTreeMap<String, String>) {
        if let Err(e) = write_private(&self.path, map) {
            warn!(path = %self.path.display(), error = %e, "cannot write token file");
        }
    }
}

/// Write `map` to `path`, never letting the token hit a world-readable file.
///
/// New files are created `0600`; an existing file is narrowed to `0600`
/// before the token is written into it.
fn write_private(path: &Path, map: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let body = serde_json::to_string_pretty(map).map_err(std::io::Error::other)?;

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(body.as_bytes())?;
    file.sync_all()
}

impl TokenStore for FileTokenStore {
    fn get(&self) -> Option<SecretString> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.read_map()
            .remove(AUTH_TOKEN_KEY)
            .map(SecretString::from)
    }

    fn set(&self, token: SecretString) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map();
        map.insert(AUTH_TOKEN_KEY.into(), token.expose_secret().to_owned());
        self.write_map(&map);
    }

    fn clear(&self) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.read_map();
        if map.remove(AUTH_TOKEN_KEY).is_none() {
            return;
        }
        if map.is_empty() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %self.path.display(), error = %e, "cannot remove token file");
                }
            }
        } else {
            self.write_map(&map);
        }
    }
}

// ── Keyring ─────────────────────────────────────────────────────────

/// OS credential store entry `mobius` / `<profile>/auth_token`.
pub struct KeyringTokenStore {
    user: String,
}

impl KeyringTokenStore {
    pub fn new(profile_name: &str) -> Self {
        Self {
            user: format!("{profile_name}/{AUTH_TOKEN_KEY}"),
        }
    }

    /// Keyring account name for this profile.
    pub fn user(&self) -> &str {
        &self.user
    }

    fn entry(&self) -> Option<keyring::Entry> {
        keyring::Entry::new(KEYRING_SERVICE, &self.user)
            .inspect_err(|e| warn!(user = %self.user, error = %e, "keyring unavailable"))
            .ok()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self) -> Option<SecretString> {
        match self.entry()?.get_password() {
            Ok(token) => Some(SecretString::from(token)),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(user = %self.user, error = %e, "cannot read token from keyring");
                None
            }
        }
    }

    fn set(&self, token: SecretString) {
        let Some(entry) = self.entry() else {
            return;
        };
        if let Err(e) = entry.set_password(token.expose_secret()) {
            warn!(user = %self.user, error = %e, "cannot store token in keyring");
        }
    }

    fn clear(&self) {
        let Some(entry) = self.entry() else {
            return;
        };
        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {}
            Err(e) => warn!(user = %self.user, error = %e, "cannot remove token from keyring"),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokens").join("default.json");

        let store = FileTokenStore::new(&path);
        assert!(store.get().is_none());

        store.set(SecretString::from("abc123"));
        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.get().unwrap().expose_secret(), "abc123");

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["auth_token"], "abc123");

        reopened.clear();
        assert!(store.get().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn file_store_keeps_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, r#"{"theme":"dark","auth_token":"old"}"#).unwrap();

        let store = FileTokenStore::new(&path);
        assert_eq!(store.get().unwrap().expose_secret(), "old");

        store.clear();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("theme"));
        assert!(!raw.contains("auth_token"));
    }

    #[test]
    fn corrupt_file_reads_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileTokenStore::new(&path);
        assert!(store.get().is_none());

        store.set(SecretString::from("fresh"));
        assert_eq!(store.get().unwrap().expose_secret(), "fresh");
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        FileTokenStore::new(&path).set(SecretString::from("x"));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn loose_existing_file_is_narrowed_before_write() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        FileTokenStore::new(&path).set(SecretString::from("x"));

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(
            FileTokenStore::new(&path).get().unwrap().expose_secret(),
            "x"
        );
    }

    #[test]
    fn keyring_entry_is_named_per_profile() {
        assert_eq!(KeyringTokenStore::new("lab").user(), "lab/auth_token");
    }

    #[test]
    fn memory_backend_starts_empty() {
        let store = open_token_store("default", TokenBackend::Memory);
        assert!(store.get().is_none());
        store.set(SecretString::from("t"));
        assert_eq!(store.get().unwrap().expose_secret(), "t");
    }
}
