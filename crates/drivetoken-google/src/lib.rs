//! Google OAuth2 access tokens and Drive API stubs.
//!
//! - [`AccessTokenProvider`] - returns the stored access token while it is
//!   valid and exchanges the refresh token once it has expired
//! - [`CredentialStore`] - the JSON file holding [`StoredCredential`]s
//! - [`FileSearch`] / [`FileUpload`] - thin Drive v3 stubs
//! - [`DriveContext`] - builds all of the above once and shares them
//!
//! # Example
//!
//! ```ignore
//! use drivetoken_google::{DriveContext, GoogleConfig};
//!
//! let context = DriveContext::new(GoogleConfig::new(
//!     "/var/lib/radio/StoredCredential.json",
//!     "/var/lib/radio/client_secret.json",
//! ))?;
//!
//! let token = context.token_provider().get_access_token().await?;
//! let listing = context.file_search().list_raw(token.as_str()).await?;
//! ```

pub mod config;
pub mod context;
pub mod credential;
pub mod drive;
pub mod error;
pub mod oauth;
pub mod provider;

pub use config::{GoogleConfig, OAuthCredentials, RefreshPersistence};
pub use context::DriveContext;
pub use credential::{CredentialStore, StoredCredential};
pub use drive::{DriveError, DriveResult, FileSearch, FileUpload};
pub use error::{TokenError, TokenErrorCode, TokenResult};
pub use oauth::{OAuthClient, TokenResponse};
pub use provider::{AccessToken, AccessTokenProvider, TokenOrigin};
