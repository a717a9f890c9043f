//! Slot configuration
//!
//! Maps each controller slot to a serial device and baud rate. Stored as
//! TOML under the user's config directory:
//!
//! ```toml
//! [transport]
//! read_timeout_ms = 500
//!
//! [[controllers]]
//! enabled = true
//! serial = "ttyACM0"
//! baud = 115200
//! ```
//!
//! Missing files degrade to the defaults (four disabled slots on
//! `ttyACM0`..`ttyACM3` at 115200 baud) instead of failing startup.

use crate::link::SLOT_COUNT;
use crate::transport::{SessionSettings, DEFAULT_BAUD_RATE};
use color_eyre::{eyre::eyre, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "serial-input";
const CONFIG_FILE: &str = "config.toml";

/// One controller slot
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Device name as listed by enumeration, e.g. `ttyACM0`
    #[serde(default)]
    pub serial: String,
    #[serde(default = "default_baud")]
    pub baud: u32,
}

impl ControllerConfig {
    pub fn for_slot(slot: usize) -> Self {
        Self {
            enabled: false,
            serial: format!("ttyACM{slot}"),
            baud: DEFAULT_BAUD_RATE,
        }
    }

    /// Enabled with a device name and a non-zero rate
    pub fn is_active(&self) -> bool {
        self.enabled && !self.serial.is_empty() && self.baud != 0
    }
}

/// Transport tuning shared by all slots
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct TransportConfig {
    /// Deadline for one response read; unset blocks indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_timeout_ms: Option<u64>,

    /// Directory scanned for device nodes instead of `/dev`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_dir: Option<PathBuf>,
}

impl TransportConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            read_deadline: self.read_timeout_ms.map(Duration::from_millis),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct PluginConfig {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default = "default_controllers")]
    pub controllers: Vec<ControllerConfig>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        Self {
            transport: TransportConfig::default(),
            controllers: default_controllers(),
        }
    }
}

impl PluginConfig {
    /// `<config dir>/serial-input/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let mut path = dirs::config_dir().ok_or_else(|| eyre!("No config directory found"))?;
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

        if config.controllers.len() > SLOT_COUNT {
            warn!(
                "Config lists {} controllers, only the first {} are used",
                config.controllers.len(),
                SLOT_COUNT
            );
        }
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Loads `path`, writing the default config there first if it is missing
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, writing defaults", path.display());
            let config = Self::default();
            config.save(path)?;
            return Ok(config);
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| eyre!("Failed to create config directory: {}", e))?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| eyre!("Failed to serialize config: {}", e))?;
        std::fs::write(path, content)
            .map_err(|e| eyre!("Failed to write config file {}: {}", path.display(), e))?;
        info!("Config saved to {}", path.display());
        Ok(())
    }

    pub fn controller(&self, slot: usize) -> Option<&ControllerConfig> {
        self.controllers.get(slot)
    }
}

fn default_baud() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_controllers() -> Vec<ControllerConfig> {
    (0..SLOT_COUNT).map(ControllerConfig::for_slot).collect()
}
