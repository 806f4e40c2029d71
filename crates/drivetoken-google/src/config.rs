//! Configuration for the Google token provider and Drive stubs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{TokenError, TokenResult};

/// Google's OAuth 2.0 token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Drive v3 `files` collection.
pub const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

/// OAuth client secret issued for this application.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
}

/// Structure of Google's client secret JSON document.
///
/// Accepts the Cloud Console layout with an `installed` (or `web`) section, as
/// well as a flat layout with `client_id`/`client_secret` at the root.
#[derive(Debug, Deserialize)]
struct ClientSecretFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
}

impl OAuthCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Loads the client secret document at `path`.
    ///
    /// # Errors
    ///
    /// `ResourceMissing` if the file cannot be read, `Deserialization` if it
    /// does not contain a client id and secret.
    pub fn from_file(path: impl AsRef<Path>) -> TokenResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TokenError::resource_missing(format!(
                "failed to read client secret {}",
                path.display()
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses a client secret JSON document.
    ///
    /// `{"installed": {"client_id": "...", "client_secret": "..."}}` is the
    /// layout Google issues for desktop clients.
    pub fn from_json(json: &str) -> TokenResult<Self> {
        let file: ClientSecretFile = serde_json::from_str(json).map_err(|e| {
            TokenError::deserialization("failed to parse client secret JSON").with_source(e)
        })?;

        if let Some(creds) = file.installed.or(file.web) {
            return Ok(Self::new(creds.client_id, creds.client_secret));
        }

        match (file.client_id, file.client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(Self::new(client_id, client_secret)),
            _ => Err(TokenError::deserialization(
                "client secret must contain an 'installed' or 'web' section, or root-level client_id/client_secret",
            )),
        }
    }

    /// Checks that neither value is empty.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id is required");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret is required");
        }
        Ok(())
    }
}

/// What happens to a freshly refreshed access token.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefreshPersistence {
    /// Return it to the caller only. Every call after expiry refreshes again.
    #[default]
    Discard,
    /// Write the new access token and its expiry back to the credential store.
    WriteBack,
}

/// Configuration for [`DriveContext`](crate::DriveContext) and its components.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// Path to the stored credential JSON map.
    pub credentials_stored: PathBuf,

    /// Path to the client secret JSON document.
    pub credentials_json: PathBuf,

    /// Key of the credential record inside the store.
    ///
    /// Defaults to `"user"`.
    pub account: String,

    pub persistence: RefreshPersistence,

    /// File or folder identifier handed to the Drive stubs.
    pub drive_target: Option<String>,

    /// TCP connect timeout.
    pub connect_timeout: Duration,

    /// Overall request timeout. Deliberately generous.
    pub request_timeout: Duration,

    /// Token endpoint. Only overridden in tests.
    pub token_url: String,

    /// Drive `files` endpoint. Only overridden in tests.
    pub drive_files_url: String,

    /// User agent string for API requests.
    pub user_agent: String,
}

impl GoogleConfig {
    pub const DEFAULT_ACCOUNT: &'static str = "user";
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
    pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30 * 60;

    pub fn new(credentials_stored: impl Into<PathBuf>, credentials_json: impl Into<PathBuf>) -> Self {
        Self {
            credentials_stored: credentials_stored.into(),
            credentials_json: credentials_json.into(),
            account: Self::DEFAULT_ACCOUNT.to_string(),
            persistence: RefreshPersistence::default(),
            drive_target: None,
            connect_timeout: Duration::from_secs(Self::DEFAULT_CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(Self::DEFAULT_REQUEST_TIMEOUT_SECS),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            drive_files_url: DRIVE_FILES_URL.to_string(),
            user_agent: format!("drivetoken/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Default location of the credential store,
    /// `~/.local/share/drivetoken/StoredCredential.json`.
    pub fn default_credentials_stored() -> PathBuf {
        Self::default_data_dir().join("StoredCredential.json")
    }

    /// Default location of the client secret, `~/.local/share/drivetoken/client_secret.json`.
    pub fn default_credentials_json() -> PathBuf {
        Self::default_data_dir().join("client_secret.json")
    }

    fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivetoken")
    }

    pub fn with_account(mut self, account: impl Into<String>) -> Self {
        self.account = account.into();
        self
    }

    pub fn with_persistence(mut self, persistence: RefreshPersistence) -> Self {
        self.persistence = persistence;
        self
    }

    pub fn with_drive_target(mut self, target: impl Into<String>) -> Self {
        self.drive_target = Some(target.into());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_token_url(mut self, url: impl Into<String>) -> Self {
        self.token_url = url.into();
        self
    }

    pub fn with_drive_files_url(mut self, url: impl Into<String>) -> Self {
        self.drive_files_url = url.into();
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.account.is_empty() {
            return Err("account key must not be empty".to_string());
        }
        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err("timeouts must be greater than zero".to_string());
        }
        for (name, value) in [
            ("token_url", &self.token_url),
            ("drive_files_url", &self.drive_files_url),
        ] {
            url::Url::parse(value).map_err(|e| format!("invalid {}: {}", name, e))?;
        }
        Ok(())
    }

    /// Builds the HTTP transport shared by every component.
    ///
    /// Proxies from the environment are ignored.
    pub fn http_client(&self) -> TokenResult<reqwest::Client> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .timeout(self.request_timeout)
            .user_agent(&self.user_agent)
            .no_proxy()
            .build()
            .map_err(|e| TokenError::network("failed to build HTTP client").with_source(e))
    }
}
