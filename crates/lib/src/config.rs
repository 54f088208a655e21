//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatrelay/config.json`) and
//! environment. The space map and port live here rather than as process-wide
//! globals; the server takes a `Config` at startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Relay server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Credential bootstrap settings.
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// Google Chat settings (spaces, token, endpoint).
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Server bind and port settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// Port for the HTTP listener (default 8080).
    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_server_bind")]
    pub bind: String,
}

fn default_server_port() -> u16 {
    8080
}

fn default_server_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_server_port(),
            bind: default_server_bind(),
        }
    }
}

/// Credential bootstrap settings (where the service-account key is written).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsConfig {
    /// Path of the service-account key file. Created from GOOGLE_CREDENTIALS
    /// on first run when missing; reused on subsequent runs.
    #[serde(default = "default_key_file")]
    pub key_file: PathBuf,
}

fn default_key_file() -> PathBuf {
    PathBuf::from("google_credentials.json")
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            key_file: default_key_file(),
        }
    }
}

/// Google Chat settings: named spaces, default destination, token, endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Human-readable space name → Chat space id.
    #[serde(default = "default_spaces")]
    pub spaces: HashMap<String, String>,

    /// Space name (key of `spaces`) that relayed requests are posted to.
    #[serde(default = "default_space")]
    pub default_space: String,

    /// Bearer token for the Chat API. Overridden by GOOGLE_CHAT_TOKEN env.
    pub token: Option<String>,

    /// Override the Chat API base URL (for tests or custom endpoints).
    pub api_base: Option<String>,
}

fn default_spaces() -> HashMap<String, String> {
    let mut spaces = HashMap::new();
    spaces.insert("dylan".to_string(), "xTiBLgAAAAE".to_string());
    spaces.insert("kyle".to_string(), "iuAuLgAAAAE".to_string());
    spaces
}

fn default_space() -> String {
    "kyle".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            spaces: default_spaces(),
            default_space: default_space(),
            token: None,
            api_base: None,
        }
    }
}

/// Resolve the Chat API token: env GOOGLE_CHAT_TOKEN overrides config.
pub fn resolve_chat_token(config: &Config) -> Option<String> {
    std::env::var("GOOGLE_CHAT_TOKEN")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            config
                .chat
                .token
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Map a space name through the configured space map. `None` uses the
/// configured default space. Unknown names are an error listing known names.
pub fn resolve_space(config: &Config, name: Option<&str>) -> Result<String> {
    let name = name.unwrap_or(&config.chat.default_space);
    config.chat.spaces.get(name).cloned().ok_or_else(|| {
        let mut known: Vec<&str> = config.chat.spaces.keys().map(|s| s.as_str()).collect();
        known.sort_unstable();
        anyhow::anyhow!(
            "unknown space \"{}\" (known spaces: {})",
            name,
            known.join(", ")
        )
    })
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHATRELAY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chatrelay").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the default path (or CHATRELAY_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_server_port_and_bind() {
        let s = ServerConfig::default();
        assert_eq!(s.port, 8080);
        assert_eq!(s.bind, "127.0.0.1");
    }

    #[test]
    fn default_spaces_resolve() {
        let config = Config::default();
        assert_eq!(resolve_space(&config, None).unwrap(), "iuAuLgAAAAE");
        assert_eq!(resolve_space(&config, Some("dylan")).unwrap(), "xTiBLgAAAAE");
    }

    #[test]
    fn unknown_space_names_known_ones() {
        let config = Config::default();
        let err = resolve_space(&config, Some("nobody")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("nobody"), "got: {}", msg);
        assert!(msg.contains("dylan") && msg.contains("kyle"), "got: {}", msg);
    }

    #[test]
    fn empty_config_file_parses_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.chat.default_space, "kyle");
        assert_eq!(
            config.credentials.key_file,
            PathBuf::from("google_credentials.json")
        );
    }

    #[test]
    fn partial_config_overrides_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "server": { "port": 80 }, "chat": { "defaultSpace": "dylan" } }"#,
        )
        .unwrap();
        assert_eq!(config.server.port, 80);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.chat.default_space, "dylan");
    }
}
