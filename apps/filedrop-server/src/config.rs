//! Server configuration management.
//!
//! Configuration is stored as TOML at `$FILEDROP_CONFIG` if set, otherwise
//! `~/.config/filedrop/server.toml`.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "FILEDROP_CONFIG";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Where uploads are written and what GET lists.
    #[serde(default = "default_downloads_dir")]
    pub downloads_dir: String,

    /// Address both servers bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP upload server port.
    #[serde(default = "default_http_port")]
    pub http_port: u16,

    /// WebSocket push server port (0 = auto-assign).
    #[serde(default = "default_push_port")]
    pub push_port: u16,

    /// Minimum gap between progress events for one file, in milliseconds.
    #[serde(default = "default_notification_interval_ms")]
    pub notification_interval_ms: u64,

    /// Owner reported in directory listings.
    #[serde(default = "default_owner")]
    pub owner: String,
}

fn default_downloads_dir() -> String {
    "./downloads".into()
}

fn default_host() -> String {
    "0.0.0.0".into()
}

fn default_http_port() -> u16 {
    3000
}

fn default_push_port() -> u16 {
    3001
}

fn default_notification_interval_ms() -> u64 {
    200
}

fn default_owner() -> String {
    std::env::var("USER").unwrap_or_default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            downloads_dir: default_downloads_dir(),
            host: default_host(),
            http_port: default_http_port(),
            push_port: default_push_port(),
            notification_interval_ms: default_notification_interval_ms(),
            owner: default_owner(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not found.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&config_path())
    }

    /// Loads from `path`, writing the defaults there if it does not exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration read");
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Saves the configuration to `path`.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // Restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    pub fn host_addr(&self) -> anyhow::Result<IpAddr> {
        self.host
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid host {:?}: {e}", self.host))
    }

    pub fn notification_interval(&self) -> Duration {
        Duration::from_millis(self.notification_interval_ms)
    }
}

/// Returns the configuration file path.
fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
    PathBuf::from(home)
        .join(".config")
        .join("filedrop")
        .join("server.toml")
}
