use std::{
    env,
    path::{Path, PathBuf},
};

use dirs_next::config_dir;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Settings for the default reqwest transport.
///
/// Loaded from `COURIER_CONFIG_PATH` or `<config dir>/courier/client.json`;
/// a missing or unreadable file yields the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Joined in front of relative (`/path`) request URLs.
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    pub default_headers: IndexMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_secs: 30,
            connect_timeout_secs: 30,
            user_agent: format!("courier/{}; {}", env!("CARGO_PKG_VERSION"), env::consts::OS),
            default_headers: IndexMap::new(),
        }
    }
}

impl ClientConfig {
    pub fn load() -> Self {
        let mut config = Self::load_from_path(&default_config_path());
        if let Ok(base_url) = env::var("COURIER_BASE_URL")
            && !base_url.trim().is_empty()
        {
            config.base_url = Some(base_url);
        }
        config
    }

    pub fn load_from_path(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return ClientConfig::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring invalid client config");
                ClientConfig::default()
            }
        }
    }

    /// Resolves a request URL against [`ClientConfig::base_url`] when it is relative.
    pub fn resolve_url(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if url.starts_with('/') => format!("{}{}", base.trim_end_matches('/'), url),
            _ => url.to_string(),
        }
    }
}

/// Get the default path for the client configuration file.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var("COURIER_CONFIG_PATH")
        && !path.trim().is_empty()
    {
        return PathBuf::from(path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("courier")
        .join("client.json")
}
