//! Stored OAuth credentials.
//!
//! The store is a JSON object mapping an account key to a credential record:
//!
//! ```json
//! {
//!   "user": {
//!     "access_token": "ya29...",
//!     "refresh_token": "1//0g...",
//!     "expiration_time_milliseconds": 1700000000000
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use drivetoken_core::Expiry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{TokenError, TokenResult};

/// A persisted OAuth credential for one account.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(rename = "expiration_time_milliseconds")]
    pub expires_at: Expiry,
}

impl StoredCredential {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: impl Into<Expiry>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at: expires_at.into(),
        }
    }

    /// Returns true if the access token expired strictly before `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_expired_at(now)
    }

    /// A copy carrying a new access token and expiry, keeping the refresh token.
    pub fn refreshed(&self, access_token: impl Into<String>, expires_at: Expiry) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: self.refresh_token.clone(),
            expires_at,
        }
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("access_token", &redact(&self.access_token))
            .field("refresh_token", &redact(&self.refresh_token))
            .field("expires_at", &self.expires_at.to_local())
            .finish()
    }
}

/// Shortens a secret for logging: the first few characters and its length.
pub(crate) fn redact(secret: &str) -> String {
    let prefix: String = secret.chars().take(6).collect();
    format!("{}…({} chars)", prefix, secret.chars().count())
}

/// File-backed credential store.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the credential stored under `key`.
    ///
    /// # Errors
    ///
    /// `ResourceMissing` if the store cannot be read. `Deserialization` if the
    /// bytes are not a credential map or `key` has no complete record.
    pub fn load(&self, key: &str) -> TokenResult<StoredCredential> {
        let mut records = self.read_all()?;
        let credential = records.remove(key).ok_or_else(|| {
            TokenError::deserialization(format!(
                "no credential stored under '{}' in {}",
                key,
                self.path.display()
            ))
        })?;
        let credential: StoredCredential = serde_json::from_value(credential).map_err(|e| {
            TokenError::deserialization(format!(
                "credential '{}' in {} is not a stored credential record",
                key,
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!(key, credential = ?credential, "loaded stored credential");
        Ok(credential)
    }

    /// Stores `credential` under `key`, keeping every other record.
    ///
    /// Writes a temp file then renames it over the store. On Unix the temp
    /// file is created owner-only, so the tokens are never readable by others.
    pub fn save(&self, key: &str, credential: &StoredCredential) -> TokenResult<()> {
        let mut records = match self.read_all() {
            Ok(records) => records,
            Err(_) if !self.path.exists() => BTreeMap::new(),
            Err(e) => return Err(e),
        };
        let value = serde_json::to_value(credential).map_err(|e| {
            TokenError::persistence("failed to serialize credential").with_source(e)
        })?;
        records.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    TokenError::persistence(format!(
                        "failed to create credential directory {}",
                        parent.display()
                    ))
                    .with_source(e)
                })?;
            }
        }

        let content = serde_json::to_string_pretty(&records).map_err(|e| {
            TokenError::persistence("failed to serialize credential store").with_source(e)
        })?;
        let temp_path = self.path.with_extension("json.tmp");
        write_private(&temp_path, content.as_bytes()).map_err(|e| {
            TokenError::persistence(format!("failed to write {}", temp_path.display()))
                .with_source(e)
        })?;
        fs::rename(&temp_path, &self.path).map_err(|e| {
            TokenError::persistence(format!("failed to replace {}", self.path.display()))
                .with_source(e)
        })?;

        debug!(key, path = %self.path.display(), "saved stored credential");
        Ok(())
    }

    fn read_all(&self) -> TokenResult<BTreeMap<String, serde_json::Value>> {
        let bytes = fs::read(&self.path).map_err(|e| {
            let message = if e.kind() == ErrorKind::NotFound {
                format!("credential store {} not found", self.path.display())
            } else {
                format!("failed to read credential store {}", self.path.display())
            };
            TokenError::resource_missing(message).with_source(e)
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            TokenError::deserialization(format!(
                "credential store {} is not a JSON object",
                self.path.display()
            ))
            .with_source(e)
        })
    }
}

/// Creates `path` afresh and writes `bytes` to it, owner-only on Unix.
///
/// A leftover file from an interrupted save is removed first so its
/// permissions are not inherited.
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e),
        _ => {}
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
