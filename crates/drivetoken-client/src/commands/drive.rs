//! `drivetoken search` and `drivetoken upload`

use std::io::Write;

use drivetoken_google::DriveContext;
use tracing::debug;

use crate::error::ClientResult;

/// Lists Drive files with a fresh token and prints the raw response.
pub async fn search(context: &DriveContext, out: &mut impl Write) -> ClientResult<()> {
    let token = context.token_provider().get_access_token().await?;
    debug!(origin = ?token.origin(), "listing drive files");

    let body = context.file_search().list_raw(token.as_str()).await?;
    writeln!(out, "{}", body)?;
    Ok(())
}

/// Runs `payload` through the upload stub and prints what it returns.
pub fn upload(context: &DriveContext, payload: String, out: &mut impl Write) -> ClientResult<()> {
    let result = context.file_upload().apply(payload)?;
    writeln!(out, "{}", result)?;
    Ok(())
}
