//! Access-token acquisition.
//!
//! [`AccessTokenProvider::get_access_token`] reads the stored credential on
//! every call. While the stored token is still valid it is returned as is;
//! once it has expired the refresh token is exchanged for a new one.
//!
//! Refreshes are single-flight: callers that find the credential expired
//! while another refresh is already running wait for it and receive its
//! result instead of sending their own request.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use drivetoken_core::Expiry;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use crate::config::{GoogleConfig, OAuthCredentials, RefreshPersistence};
use crate::credential::{CredentialStore, StoredCredential, redact};
use crate::error::{TokenError, TokenResult};
use crate::oauth::OAuthClient;

/// Lifetime assumed for a refreshed token when the endpoint omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Where an [`AccessToken`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenOrigin {
    /// The stored credential was still valid.
    Cached,
    /// Obtained from the token endpoint by this call or a concurrent one.
    Refreshed,
}

/// A bearer token for the Drive API.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    value: String,
    origin: TokenOrigin,
}

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn into_string(self) -> String {
        self.value
    }

    pub fn origin(&self) -> TokenOrigin {
        self.origin
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("value", &redact(&self.value))
            .field("origin", &self.origin)
            .finish()
    }
}

/// Result of the last completed refresh, shared with callers that waited on it.
#[derive(Debug, Default)]
struct RefreshSlot {
    last: Option<String>,
}

/// Produces currently valid access tokens from a stored credential.
pub struct AccessTokenProvider {
    store: CredentialStore,
    account: String,
    client_secret_path: PathBuf,
    persistence: RefreshPersistence,
    oauth: OAuthClient,
    refresh: Mutex<RefreshSlot>,
    /// Bumped every time a refresh completes successfully.
    generation: AtomicU64,
}

impl AccessTokenProvider {
    /// Creates a provider that sends refresh requests through `http_client`.
    pub fn new(config: &GoogleConfig, http_client: reqwest::Client) -> Self {
        Self {
            store: CredentialStore::new(&config.credentials_stored),
            account: config.account.clone(),
            client_secret_path: config.credentials_json.clone(),
            persistence: config.persistence,
            oauth: OAuthClient::new(http_client, config.token_url.clone()),
            refresh: Mutex::new(RefreshSlot::default()),
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> &CredentialStore {
        &self.store
    }

    /// Returns a currently valid access token.
    ///
    /// No request is sent while the stored credential is unexpired. An
    /// expiry equal to the current instant still counts as valid.
    ///
    /// # Errors
    ///
    /// Any failure to read the store or client secret, to reach the token
    /// endpoint, or to make sense of its answer. Nothing is retried.
    #[instrument(skip(self), fields(account = %self.account))]
    pub async fn get_access_token(&self) -> TokenResult<AccessToken> {
        let credential = self.store.load(&self.account)?;
        let now = Utc::now();

        debug!(expires_at = %credential.expires_at.to_local(), "checking stored credential");

        if !credential.is_expired_at(now) {
            debug!(
                remaining_secs = credential.expires_at.remaining_at(now).num_seconds(),
                "stored access token still valid"
            );
            return Ok(AccessToken {
                value: credential.access_token,
                origin: TokenOrigin::Cached,
            });
        }

        let observed = self.generation.load(Ordering::Acquire);
        let mut slot = self.refresh.lock().await;

        // A refresh finished while we were waiting for the lock.
        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(ref token) = slot.last {
                debug!("sharing result of concurrent refresh");
                return Ok(AccessToken {
                    value: token.clone(),
                    origin: TokenOrigin::Refreshed,
                });
            }
        }

        let token = self.refresh(&credential).await?;
        slot.last = Some(token.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);

        Ok(AccessToken {
            value: token,
            origin: TokenOrigin::Refreshed,
        })
    }

    async fn refresh(&self, credential: &StoredCredential) -> TokenResult<String> {
        info!(
            expired_at = %credential.expires_at.to_local(),
            "stored access token expired, refreshing"
        );

        let secret = OAuthCredentials::from_file(&self.client_secret_path)?;
        secret.validate().map_err(|reason| {
            TokenError::deserialization(format!(
                "client secret {}: {}",
                self.client_secret_path.display(),
                reason
            ))
        })?;
        let response = self
            .oauth
            .refresh_token(&credential.refresh_token, &secret)
            .await?;

        if self.persistence == RefreshPersistence::WriteBack {
            let expires_in = response.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
            let expires_at = Expiry::after(Utc::now(), expires_in).map_err(|e| {
                TokenError::malformed_response("token response carried an unusable expires_in")
                    .with_source(e)
            })?;
            let updated = credential.refreshed(&response.access_token, expires_at);
            self.store.save(&self.account, &updated)?;
            info!(expires_at = %updated.expires_at.to_local(), "stored refreshed credential");
        }

        Ok(response.access_token)
    }
}

impl fmt::Debug for AccessTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessTokenProvider")
            .field("store", &self.store.path())
            .field("account", &self.account)
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TokenErrorCode;
    use chrono::Duration;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use std::path::Path;

    struct Fixture {
        _dir: tempfile::TempDir,
        config: GoogleConfig,
    }

    impl Fixture {
        fn new(server_url: &str, expires_at: chrono::DateTime<Utc>) -> Self {
            let dir = tempfile::tempdir().unwrap();
            let stored = dir.path().join("StoredCredential.json");
            let secret = dir.path().join("client_secret.json");

            write_credential(&stored, expires_at);
            std::fs::write(
                &secret,
                r#"{"installed": {"client_id": "cid.apps.googleusercontent.com", "client_secret": "csecret"}}"#,
            )
            .unwrap();

            let config = GoogleConfig::new(stored, secret)
                .with_token_url(format!("{}/token", server_url));
            Self { _dir: dir, config }
        }

        fn provider(&self) -> AccessTokenProvider {
            AccessTokenProvider::new(&self.config, reqwest::Client::new())
        }
    }

    fn write_credential(path: &Path, expires_at: chrono::DateTime<Utc>) {
        let cred = StoredCredential::new("ya29.stored", "1//refresh", expires_at);
        CredentialStore::new(path).save("user", &cred).unwrap();
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    async fn token_endpoint(server: &mut mockito::Server, hits: usize) -> mockito::Mock {
        server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "refresh_token".into()),
                mockito::Matcher::UrlEncoded("refresh_token".into(), "1//refresh".into()),
                mockito::Matcher::UrlEncoded(
                    "client_id".into(),
                    "cid.apps.googleusercontent.com".into(),
                ),
                mockito::Matcher::UrlEncoded("client_secret".into(), "csecret".into()),
            ]))
            .with_header("content-encoding", "gzip")
            .with_body(gzip(br#"{"access_token":"T","expires_in":3600}"#))
            .expect(hits)
            .create_async()
            .await
    }

    #[tokio::test]
    async fn unexpired_credential_is_returned_without_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let fixture = Fixture::new(&server.url(), Utc::now() + Duration::hours(1));

        let token = fixture.provider().get_access_token().await.unwrap();

        assert_eq!(token.as_str(), "ya29.stored");
        assert_eq!(token.origin(), TokenOrigin::Cached);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn sequential_cached_reads_agree() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let fixture = Fixture::new(&server.url(), Utc::now() + Duration::hours(1));
        let provider = fixture.provider();

        let first = provider.get_access_token().await.unwrap();
        let second = provider.get_access_token().await.unwrap();

        assert_eq!(first, second);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn expired_credential_is_refreshed_once() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 1).await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));

        let token = fixture.provider().get_access_token().await.unwrap();

        assert_eq!(token.as_str(), "T");
        assert_eq!(token.origin(), TokenOrigin::Refreshed);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn discard_mode_refreshes_on_every_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 2).await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        let provider = fixture.provider();

        provider.get_access_token().await.unwrap();
        provider.get_access_token().await.unwrap();

        let stored = provider.store().load("user").unwrap();
        assert_eq!(stored.access_token, "ya29.stored");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn write_back_mode_persists_refreshed_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 1).await;
        let mut fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        fixture.config.persistence = RefreshPersistence::WriteBack;
        let provider = fixture.provider();

        let first = provider.get_access_token().await.unwrap();
        let second = provider.get_access_token().await.unwrap();

        assert_eq!(first.origin(), TokenOrigin::Refreshed);
        assert_eq!(second.origin(), TokenOrigin::Cached);
        assert_eq!(second.as_str(), "T");

        let stored = provider.store().load("user").unwrap();
        assert_eq!(stored.refresh_token, "1//refresh");
        assert!(!stored.is_expired_at(Utc::now()));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn write_back_rejects_unrepresentable_expires_in() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_body(r#"{"access_token":"T","expires_in":9223372036854775807}"#)
            .create_async()
            .await;
        let mut fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        fixture.config.persistence = RefreshPersistence::WriteBack;
        let provider = fixture.provider();

        let err = provider.get_access_token().await.unwrap_err();
        assert_eq!(err.code(), TokenErrorCode::MalformedResponse);
        assert!(std::error::Error::source(&err).is_some());

        let stored = provider.store().load("user").unwrap();
        assert_eq!(stored.access_token, "ya29.stored");
    }

    #[tokio::test]
    async fn concurrent_expired_callers_share_one_refresh() {
        let mut server = mockito::Server::new_async().await;
        let mock = token_endpoint(&mut server, 1).await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        let provider = fixture.provider();

        let (a, b) = tokio::join!(provider.get_access_token(), provider.get_access_token());

        assert_eq!(a.unwrap().as_str(), "T");
        assert_eq!(b.unwrap().as_str(), "T");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_access_token_in_response_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/token")
            .with_header("content-encoding", "gzip")
            .with_body(gzip(br#"{"expires_in":3600}"#))
            .create_async()
            .await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));

        let err = fixture.provider().get_access_token().await.unwrap_err();
        assert_eq!(err.code(), TokenErrorCode::MalformedResponse);
        assert!(std::error::Error::source(&err).is_some());
    }

    #[tokio::test]
    async fn missing_store_fails_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        std::fs::remove_file(&fixture.config.credentials_stored).unwrap();

        let err = fixture.provider().get_access_token().await.unwrap_err();
        assert_eq!(err.code(), TokenErrorCode::ResourceMissing);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn missing_client_secret_fails_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        std::fs::remove_file(&fixture.config.credentials_json).unwrap();

        let err = fixture.provider().get_access_token().await.unwrap_err();
        assert_eq!(err.code(), TokenErrorCode::ResourceMissing);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_client_secret_fails_before_network() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("POST", mockito::Matcher::Any).expect(0).create_async().await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        std::fs::write(
            &fixture.config.credentials_json,
            r#"{"installed": {"client_id": "cid.apps.googleusercontent.com", "client_secret": ""}}"#,
        )
        .unwrap();

        let err = fixture.provider().get_access_token().await.unwrap_err();
        assert_eq!(err.code(), TokenErrorCode::Deserialization);
        assert!(err.message().contains("client_secret"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn failed_refresh_is_not_shared() {
        let mut server = mockito::Server::new_async().await;
        let failing = server
            .mock("POST", "/token")
            .with_status(500)
            .with_body("{}")
            .expect(2)
            .create_async()
            .await;
        let fixture = Fixture::new(&server.url(), Utc::now() - Duration::minutes(5));
        let provider = fixture.provider();

        assert!(provider.get_access_token().await.is_err());
        assert!(provider.get_access_token().await.is_err());
        failing.assert_async().await;
    }

    #[test]
    fn debug_redacts_token() {
        let token = AccessToken {
            value: "ya29.secretvalue".to_string(),
            origin: TokenOrigin::Cached,
        };
        assert!(!format!("{:?}", token).contains("secretvalue"));
    }
}
