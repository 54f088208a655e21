//! Credential bootstrapping: materialize the service-account key file from
//! the GOOGLE_CREDENTIALS environment variable on first run.
//!
//! Runs once at startup before the listener binds. A malformed or missing
//! credential blob is fatal; the relay cannot operate without it.

use anyhow::{Context, Result};
use std::path::Path;

/// Outcome of the bootstrap: the key file was already on disk, or it was
/// written from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Existing,
    Written,
}

/// Validate a raw credential blob: must parse as a JSON object carrying a
/// numeric-like `client_id` (a JSON number, or a string that parses as one).
pub fn validate_credentials(raw: &str) -> Result<()> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .context("GOOGLE_CREDENTIALS must be a JSON-stringified object")?;
    let client_id = value
        .get("client_id")
        .context("GOOGLE_CREDENTIALS is missing the client_id field")?;
    let numeric = match client_id {
        serde_json::Value::Number(_) => true,
        serde_json::Value::String(s) => s.trim().parse::<f64>().is_ok(),
        _ => false,
    };
    if !numeric {
        anyhow::bail!("GOOGLE_CREDENTIALS client_id must be a numeric identifier");
    }
    Ok(())
}

/// Ensure the key file exists at `path`. When it already does, leave it
/// untouched. Otherwise validate `env_value` (the raw GOOGLE_CREDENTIALS
/// text) and write it verbatim. Errors before the write leave no file behind.
pub fn ensure_key_file(path: &Path, env_value: Option<&str>) -> Result<BootstrapOutcome> {
    if path.exists() {
        return Ok(BootstrapOutcome::Existing);
    }
    let raw = env_value.context(
        "GOOGLE_CREDENTIALS must be set when the credential key file does not exist",
    )?;
    validate_credentials(raw)?;
    std::fs::write(path, raw)
        .with_context(|| format!("writing credentials to {}", path.display()))?;
    Ok(BootstrapOutcome::Written)
}
