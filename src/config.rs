//! Application configuration.
//!
//! Every server-facing default (base URL, language, device profile, client
//! certificate paths) is an explicit config value rather than a global, so
//! tests and alternate deployments can point the client elsewhere.
//!
//! Configuration is stored at `~/.config/mealcard/config.json`; missing
//! fields fall back to the compiled-in defaults.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/cache directory paths
pub const APP_NAME: &str = "mealcard";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Client certificate / key file names looked up in the config directory.
const CLIENT_CERT_FILE: &str = "client.crt.pem";
const CLIENT_KEY_FILE: &str = "client.key.pem";

fn default_base_url() -> String {
    "https://sodexows.mo2o.com".to_string()
}

fn default_lang() -> String {
    "en".to_string()
}

fn default_device_uid() -> String {
    "device_uid".to_string()
}

fn default_os() -> i64 {
    0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_device_uid")]
    pub device_uid: String,
    #[serde(default = "default_os")]
    pub os: i64,
    /// Mutual-TLS client certificate (PEM). Attached to every request when
    /// both paths are set.
    #[serde(default)]
    pub client_cert: Option<PathBuf>,
    #[serde(default)]
    pub client_key: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            lang: default_lang(),
            device_uid: default_device_uid(),
            os: default_os(),
            client_cert: None,
            client_key: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };

        // Pick up cert/key dropped next to the config file unless the
        // config names them explicitly.
        if config.client_cert.is_none() && config.client_key.is_none() {
            if let Some(parent) = path.parent() {
                let cert = parent.join(CLIENT_CERT_FILE);
                let key = parent.join(CLIENT_KEY_FILE);
                if cert.exists() && key.exists() {
                    config.client_cert = Some(cert);
                    config.client_key = Some(key);
                }
            }
        }

        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
