use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bondscan_bluez::PlatformSettings;

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bluetooth: BluetoothConfig,
    pub ui: UiConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BluetoothConfig {
    /// Ask for consent before the first scan.
    pub require_scan_permission: bool,
    pub discovery_timeout_secs: u64,
    pub dbus_timeout_secs: u64,
    pub pair_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UiConfig {
    pub tick_ms: u64,
    pub toast_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    pub dir: PathBuf,
    pub file_prefix: String,
    pub level: String,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            require_scan_permission: true,
            discovery_timeout_secs: 12,
            dbus_timeout_secs: 30,
            pair_timeout_secs: 60,
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            toast_secs: 3,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        let dir = dirs::state_dir()
            .or_else(dirs::cache_dir)
            .unwrap_or_else(std::env::temp_dir)
            .join("bondscan");
        Self {
            dir,
            file_prefix: "bondscan.log".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bondscan")
            .join("config.toml")
    }

    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(toml::from_str(&content)?),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // Create default config if not found
                let config = Self::default();
                if let Some(parent) = path.parent() {
                    let _ = fs::create_dir_all(parent);
                }
                let _ = fs::write(path, toml::to_string_pretty(&config)?);
                Ok(config)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn platform_settings(&self) -> PlatformSettings {
        PlatformSettings {
            dbus_timeout: Duration::from_secs(self.bluetooth.dbus_timeout_secs),
            pair_timeout: Duration::from_secs(self.bluetooth.pair_timeout_secs),
            discovery_timeout: Duration::from_secs(self.bluetooth.discovery_timeout_secs),
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.ui.tick_ms.max(10))
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_secs(self.ui.toast_secs)
    }
}
