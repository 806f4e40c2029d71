//! Process-wide wiring of the Google components.

use std::sync::Arc;

use tracing::debug;

use crate::config::GoogleConfig;
use crate::drive::{FileSearch, FileUpload};
use crate::error::{TokenError, TokenResult};
use crate::provider::AccessTokenProvider;

/// Everything a caller needs to talk to Google Drive.
///
/// Build one at startup and pass it (or a clone) to whoever needs it. All
/// components share a single HTTP connection pool.
#[derive(Debug, Clone)]
pub struct DriveContext {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: GoogleConfig,
    token_provider: AccessTokenProvider,
    file_search: FileSearch,
    file_upload: FileUpload,
}

impl DriveContext {
    /// Validates `config` and builds the shared transport and components.
    pub fn new(config: GoogleConfig) -> TokenResult<Self> {
        config.validate().map_err(TokenError::resource_missing)?;

        let http_client = config.http_client()?;
        let token_provider = AccessTokenProvider::new(&config, http_client.clone());
        let file_search = FileSearch::new(http_client, config.drive_files_url.clone());
        let file_upload = FileUpload::new(config.drive_target.clone());

        debug!(
            store = %config.credentials_stored.display(),
            account = %config.account,
            "drive context ready"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                token_provider,
                file_search,
                file_upload,
            }),
        })
    }

    pub fn config(&self) -> &GoogleConfig {
        &self.inner.config
    }

    pub fn token_provider(&self) -> &AccessTokenProvider {
        &self.inner.token_provider
    }

    pub fn file_search(&self) -> &FileSearch {
        &self.inner.file_search
    }

    pub fn file_upload(&self) -> &FileUpload {
        &self.inner.file_upload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{CredentialStore, StoredCredential};
    use chrono::{Duration, Utc};

    #[test]
    fn invalid_config_is_rejected() {
        let config = GoogleConfig::new("a", "b").with_account("");
        assert!(DriveContext::new(config).is_err());
    }

    #[tokio::test]
    async fn clones_share_components() {
        let dir = tempfile::tempdir().unwrap();
        let stored = dir.path().join("store.json");
        CredentialStore::new(&stored)
            .save(
                "user",
                &StoredCredential::new("ya29.ctx", "1//r", Utc::now() + Duration::hours(1)),
            )
            .unwrap();

        let context = DriveContext::new(
            GoogleConfig::new(&stored, dir.path().join("secret.json")).with_drive_target("f1"),
        )
        .unwrap();
        let clone = context.clone();

        assert!(std::ptr::eq(context.token_provider(), clone.token_provider()));
        assert_eq!(clone.file_upload().target(), Some("f1"));

        let token = clone.token_provider().get_access_token().await.unwrap();
        assert_eq!(token.as_str(), "ya29.ctx");
    }
}
