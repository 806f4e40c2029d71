//! `drivetoken token`

use std::io::Write;

use drivetoken_google::{DriveContext, TokenOrigin};

use crate::error::ClientResult;

/// Prints a currently valid access token.
pub async fn run(context: &DriveContext, verbose: bool, out: &mut impl Write) -> ClientResult<()> {
    let token = context.token_provider().get_access_token().await?;

    if verbose {
        let origin = match token.origin() {
            TokenOrigin::Cached => "cached",
            TokenOrigin::Refreshed => "refreshed",
        };
        writeln!(out, "# account: {}", context.config().account)?;
        writeln!(out, "# origin: {}", origin)?;
    }
    writeln!(out, "{}", token.as_str())?;
    Ok(())
}
