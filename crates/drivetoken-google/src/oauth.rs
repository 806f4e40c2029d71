//! Refresh-token exchange against Google's OAuth 2.0 token endpoint.
//!
//! The request is a form POST with `grant_type=refresh_token`; Google answers
//! with a (usually gzip-compressed) JSON body carrying the new access token.

use std::io::Read;

use flate2::read::GzDecoder;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE, HeaderMap};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::OAuthCredentials;
use crate::credential::redact;
use crate::error::{TokenError, TokenResult};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=UTF-8";

/// Leading bytes of every gzip member.
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Error body Google returns alongside a non-2xx status.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Performs refresh-token exchanges.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    http_client: reqwest::Client,
    token_url: String,
}

impl OAuthClient {
    pub fn new(http_client: reqwest::Client, token_url: impl Into<String>) -> Self {
        Self {
            http_client,
            token_url: token_url.into(),
        }
    }

    /// Exchanges `refresh_token` for a new access token.
    ///
    /// # Errors
    ///
    /// `Network` if the request cannot be sent or the body cannot be read,
    /// `MalformedResponse` for a non-2xx status, an undecodable body, or a
    /// missing/empty `access_token`.
    #[instrument(skip_all, fields(url = %self.token_url))]
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
        credentials: &OAuthCredentials,
    ) -> TokenResult<TokenResponse> {
        let body = refresh_form_body(refresh_token, credentials);

        let response = self
            .http_client
            .post(&self.token_url)
            .header(ACCEPT_ENCODING, "gzip")
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| TokenError::network("token refresh request failed").with_source(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let raw = response.bytes().await.map_err(|e| {
            TokenError::network("failed to read token refresh response").with_source(e)
        })?;
        info!(status = %status, bytes = raw.len(), "token endpoint responded");

        let body = decode_body(&headers, &raw);

        if !status.is_success() {
            // An error body that fails to inflate is still worth showing.
            let body = body.unwrap_or_else(|_| raw.to_vec());
            let detail = match serde_json::from_slice::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => String::from_utf8_lossy(&body).into_owned(),
            };
            return Err(TokenError::malformed_response(format!(
                "token refresh failed ({}): {}",
                status, detail
            )));
        }

        let body = body?;
        let token: TokenResponse = serde_json::from_slice(&body).map_err(|e| {
            TokenError::malformed_response("invalid token response").with_source(e)
        })?;
        if token.access_token.is_empty() {
            return Err(TokenError::malformed_response(
                "token response carried an empty access_token",
            ));
        }

        debug!(
            access_token = %redact(&token.access_token),
            expires_in = ?token.expires_in,
            token_type = ?token.token_type,
            scope = ?token.scope,
            "refreshed access token"
        );
        Ok(token)
    }
}

/// Builds the `grant_type=refresh_token` form body.
///
/// Each value is percent-encoded on its own so secrets containing `&`, `=`
/// or `+` survive the trip.
pub fn refresh_form_body(refresh_token: &str, credentials: &OAuthCredentials) -> String {
    let params = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token),
        ("client_id", credentials.client_id.as_str()),
        ("client_secret", credentials.client_secret.as_str()),
    ];

    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Inflates a gzip body; other bodies are returned unchanged.
///
/// Gzip is detected from `Content-Encoding` or, failing that, the magic bytes.
fn decode_body(headers: &HeaderMap, raw: &[u8]) -> TokenResult<Vec<u8>> {
    let declared = headers
        .get(CONTENT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.eq_ignore_ascii_case("gzip"));

    if !declared && !raw.starts_with(&GZIP_MAGIC) {
        return Ok(raw.to_vec());
    }

    let mut decoded = Vec::new();
    GzDecoder::new(raw).read_to_end(&mut decoded).map_err(|e| {
        TokenError::malformed_response("failed to decompress token response").with_source(e)
    })?;
    Ok(decoded)
}
