//! System presets and cartridge slots, loaded from TOML.
//!
//! ```toml
//! preset = "apple1"
//!
//! [timing]
//! frame_interval_ms = 20
//!
//! [[cartridges]]
//! name = "WOZMON"
//! path = "roms/wozmon.rom"
//!
//! [[presets]]
//! name = "apple1"
//! ucase = true
//! write_protect = true
//! text_color = 10
//! cartridges = [0]
//! ```

use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cartridge::Cartridge;
use crate::machine::DEFAULT_TEXT_COLOR;
use crate::scheduler::Timing;

pub const DEFAULT_PRESET: &str = "default";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown preset '{0}'")]
    UnknownPreset(String),

    #[error("preset '{preset}' refers to missing cartridge slot {slot}")]
    UnknownSlot { preset: String, slot: usize },
}

/// A named machine setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preset {
    pub name: String,
    pub ucase: bool,
    pub write_protect: bool,
    pub text_color: u8,
    pub auto_update: bool,
    /// Indices into [`SystemConfig::cartridges`], loaded in this order.
    pub cartridges: Vec<usize>,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRESET.to_string(),
            ucase: true,
            write_protect: false,
            text_color: DEFAULT_TEXT_COLOR,
            auto_update: true,
            cartridges: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeSlot {
    pub name: String,
    /// Relative paths resolve against the config file's directory.
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// Preset applied at startup.
    pub preset: String,
    pub timing: Timing,
    pub cartridges: Vec<CartridgeSlot>,
    pub presets: Vec<Preset>,
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            preset: DEFAULT_PRESET.to_string(),
            timing: Timing::default(),
            cartridges: Vec::new(),
            presets: vec![Preset::default()],
            base_dir: None,
        }
    }
}

impl SystemConfig {
    pub fn preset(&self, name: &str) -> Result<&Preset, ConfigError> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownPreset(name.to_string()))
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Read the cartridges a preset lists, in preset order. Every slot index
    /// is checked before any file is touched.
    pub fn cartridges_for(&self, preset: &Preset) -> Result<Vec<Cartridge>, ConfigError> {
        let slots = preset
            .cartridges
            .iter()
            .map(|&slot| {
                self.cartridges
                    .get(slot)
                    .ok_or_else(|| ConfigError::UnknownSlot {
                        preset: preset.name.clone(),
                        slot,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        slots
            .into_iter()
            .map(|slot| {
                let path = self.resolve(&slot.path);
                let mut cart = Cartridge::from_file(&path)
                    .map_err(|source| ConfigError::Io { path, source })?;
                cart.name.clone_from(&slot.name);
                Ok(cart)
            })
            .collect()
    }
}

pub fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("neo6502").join("system.toml");
        }
    }

    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("neo6502").join("system.toml");
    }

    if let Some(home) = std::env::var_os("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join("neo6502")
            .join("system.toml");
    }

    PathBuf::from("system.toml")
}

pub fn parse(text: &str, path: &Path) -> Result<SystemConfig, ConfigError> {
    let mut cfg: SystemConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    cfg.base_dir = path.parent().map(Path::to_path_buf);
    Ok(cfg)
}

pub fn load_from_file(path: &Path) -> Result<SystemConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Loaded system config from {}", path.display());
    parse(&text, path)
}

pub fn to_toml(cfg: &SystemConfig) -> String {
    toml::to_string_pretty(cfg).unwrap_or_default()
}
