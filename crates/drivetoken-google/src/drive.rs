//! Google Drive API v3 stubs.
//!
//! [`FileSearch`] calls `files.list` and hands back the raw response body.
//! [`FileUpload`] does not talk to Drive yet; it returns its payload.

use reqwest::header::AUTHORIZATION;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Errors from the Drive stubs.
#[derive(Debug, Error)]
pub enum DriveError {
    #[error("access token must not be empty")]
    EmptyToken,

    #[error("upload payload must not be empty")]
    EmptyPayload,

    #[error("drive request failed")]
    Request(#[from] reqwest::Error),
}

pub type DriveResult<T> = Result<T, DriveError>;

/// `GET /drive/v3/files` with a bearer token.
#[derive(Debug, Clone)]
pub struct FileSearch {
    http_client: reqwest::Client,
    files_url: String,
}

impl FileSearch {
    pub fn new(http_client: reqwest::Client, files_url: impl Into<String>) -> Self {
        Self {
            http_client,
            files_url: files_url.into(),
        }
    }

    /// Lists files visible to `access_token` and returns the body unparsed.
    ///
    /// The body is returned whatever the status code; only transport
    /// failures are errors.
    #[instrument(skip_all, fields(url = %self.files_url))]
    pub async fn list_raw(&self, access_token: &str) -> DriveResult<String> {
        if access_token.is_empty() {
            return Err(DriveError::EmptyToken);
        }

        let response = self
            .http_client
            .get(&self.files_url)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        info!(status = %status, "drive files.list responded");
        debug!(body = %body, "drive files.list body");
        Ok(body)
    }
}

/// Placeholder for Drive uploads.
#[derive(Debug, Clone, Default)]
pub struct FileUpload {
    target: Option<String>,
}

impl FileUpload {
    pub fn new(target: Option<String>) -> Self {
        Self { target }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Returns `payload` unchanged.
    pub fn apply(&self, payload: String) -> DriveResult<String> {
        if payload.is_empty() {
            return Err(DriveError::EmptyPayload);
        }
        debug!(
            target = ?self.target,
            bytes = payload.len(),
            "upload not implemented, passing payload through"
        );
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_sends_bearer_and_returns_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/drive/v3/files")
            .match_header("authorization", "Bearer ya29.token")
            .with_header("content-type", "application/json")
            .with_body(r#"{"kind":"drive#fileList","files":[]}"#)
            .expect(1)
            .create_async()
            .await;

        let search = FileSearch::new(
            reqwest::Client::new(),
            format!("{}/drive/v3/files", server.url()),
        );
        let body = search.list_raw("ya29.token").await.unwrap();

        assert_eq!(body, r#"{"kind":"drive#fileList","files":[]}"#);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_returns_error_bodies_verbatim() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/files")
            .with_status(401)
            .with_body(r#"{"error":{"code":401}}"#)
            .create_async()
            .await;

        let search = FileSearch::new(reqwest::Client::new(), format!("{}/files", server.url()));
        let body = search.list_raw("expired").await.unwrap();
        assert!(body.contains("401"));
    }

    #[tokio::test]
    async fn list_rejects_empty_token() {
        let search = FileSearch::new(reqwest::Client::new(), "http://127.0.0.1:9/files");
        assert!(matches!(
            search.list_raw("").await,
            Err(DriveError::EmptyToken)
        ));
    }

    #[test]
    fn upload_passes_payload_through() {
        let upload = FileUpload::new(Some("folder-1".to_string()));
        assert_eq!(upload.target(), Some("folder-1"));
        assert_eq!(upload.apply("radio.m4a".to_string()).unwrap(), "radio.m4a");
    }

    #[test]
    fn upload_rejects_empty_payload() {
        let upload = FileUpload::default();
        assert!(matches!(
            upload.apply(String::new()),
            Err(DriveError::EmptyPayload)
        ));
    }
}
