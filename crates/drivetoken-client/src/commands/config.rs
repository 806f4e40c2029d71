//! Configuration commands.

use std::io::Write;
use std::path::Path;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// Dumps the loaded configuration as TOML.
pub fn dump(config: &ClientConfig, path: &Path, out: &mut impl Write) -> ClientResult<()> {
    let toml_str = toml::to_string_pretty(config)
        .map_err(|e| ClientError::Config(format!("failed to serialize config: {}", e)))?;
    writeln!(out, "# config.toml ({})", path.display())?;
    writeln!(out, "{}", toml_str)?;
    Ok(())
}

/// Resolves the provider settings and reports whether the files they name exist.
///
/// Missing files are reported but do not fail validation; they may be
/// created later.
pub fn validate(config: &ClientConfig, out: &mut impl Write) -> ClientResult<()> {
    let provider = config.provider_config().map_err(ClientError::Config)?;

    for (label, path) in [
        ("credential store", &provider.credentials_stored),
        ("client secret", &provider.credentials_json),
    ] {
        let state = if path.is_file() { "found" } else { "missing" };
        writeln!(out, "{}: {} ({})", label, path.display(), state)?;
    }
    writeln!(out, "account: {}", provider.account)?;
    writeln!(out, "persistence: {:?}", provider.persistence)?;
    writeln!(out, "Configuration is valid.")?;
    Ok(())
}

/// Shows the configuration file path.
pub fn path(path: &Path, out: &mut impl Write) -> ClientResult<()> {
    writeln!(out, "config: {}", path.display())?;
    Ok(())
}
