//! Secret references in configuration values.
//!
//! `pass::entry` reads the first line of `pass show entry`, `env::NAME`
//! reads an environment variable, and any other value is taken literally.

use std::process::Command;

/// A configuration value split into its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef<'a> {
    Pass(&'a str),
    Env(&'a str),
    Literal(&'a str),
}

impl<'a> SecretRef<'a> {
    pub fn parse(value: &'a str) -> Self {
        if let Some(entry) = value.strip_prefix("pass::") {
            Self::Pass(entry)
        } else if let Some(name) = value.strip_prefix("env::") {
            Self::Env(name)
        } else {
            Self::Literal(value)
        }
    }

    /// Looks the value up.
    pub fn resolve(self) -> Result<String, String> {
        match self {
            Self::Pass(entry) => from_pass(entry),
            Self::Env(name) => std::env::var(name)
                .map_err(|_| format!("environment variable `{}` is not set", name)),
            Self::Literal(value) => Ok(value.to_string()),
        }
    }
}

/// Shorthand for `SecretRef::parse(value).resolve()`.
pub fn resolve(value: &str) -> Result<String, String> {
    SecretRef::parse(value).resolve()
}

fn from_pass(entry: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", entry])
        .output()
        .map_err(|e| format!("could not run `pass show {}`: {}", entry, e))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {}` exited with {}: {}",
            entry,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` printed nothing", entry))
}
