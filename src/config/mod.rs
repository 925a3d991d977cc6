//! Configuration management for the headless shell
//!
//! Settings come from three layers: built-in defaults, an optional TOML
//! file, and the environment (`WAYLAND_DISPLAY`, `XDG_RUNTIME_DIR`,
//! `XDG_SEAT`). Command-line flags are applied on top by the binary.

use anyhow::{Context, Result};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::headless::OutputInfo;

/// Highest `tizen_policy` version the server implements.
pub const MAX_POLICY_VERSION: u32 = 7;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeadlessConfig {
    /// Socket and runtime directory
    #[serde(default)]
    pub general: GeneralConfig,

    /// The single default seat
    #[serde(default)]
    pub seat: SeatConfig,

    /// Advertised protocol versions
    #[serde(default)]
    pub shell: ShellConfig,

    /// Headless outputs
    #[serde(default = "default_outputs")]
    pub outputs: Vec<OutputConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Name of the listening socket inside the runtime directory
    pub socket_name: String,

    /// Directory holding the socket; exported as `XDG_RUNTIME_DIR` when unset
    pub runtime_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SeatConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShellConfig {
    /// `zxdg_shell_v6` global version
    pub xdg_shell_version: u32,

    /// `tizen_policy` global version (1..=7)
    pub policy_version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputConfig {
    pub name: String,
    pub width: u32,
    pub height: u32,

    /// Refresh rate in millihertz
    #[serde(default = "OutputConfig::default_refresh")]
    pub refresh_mhz: u32,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            seat: SeatConfig::default(),
            shell: ShellConfig::default(),
            outputs: default_outputs(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            socket_name: "wayland-0".to_string(),
            runtime_dir: PathBuf::from("/run"),
        }
    }
}

impl Default for SeatConfig {
    fn default() -> Self {
        Self {
            name: "seat0".to_string(),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            xdg_shell_version: 1,
            policy_version: MAX_POLICY_VERSION,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            name: "HEADLESS-1".to_string(),
            width: 1920,
            height: 1080,
            refresh_mhz: Self::default_refresh(),
        }
    }
}

impl OutputConfig {
    fn default_refresh() -> u32 {
        60_000
    }

    pub fn to_info(&self) -> OutputInfo {
        OutputInfo {
            name: self.name.clone(),
            width: self.width,
            height: self.height,
            refresh_mhz: self.refresh_mhz,
        }
    }
}

fn default_outputs() -> Vec<OutputConfig> {
    vec![OutputConfig::default()]
}

/// Source of environment variables, so overrides can be tested without
/// touching the process environment.
pub trait Environment {
    fn var(&self, key: &str) -> Option<String>;
    fn set_var(&mut self, key: &str, value: &str);
}

/// The real process environment.
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn set_var(&mut self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }
}

impl HeadlessConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let rest = path.strip_prefix("~").unwrap_or(path);
            Path::new(&home).join(rest)
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: HeadlessConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;
        debug!("Configuration loaded from {}", expanded_path.display());

        Ok(config)
    }

    /// Apply `WAYLAND_DISPLAY`, `XDG_RUNTIME_DIR` and `XDG_SEAT`. The runtime
    /// directory is exported when the environment does not define one.
    pub fn apply_env(&mut self, env: &mut dyn Environment) {
        if let Some(socket) = env.var("WAYLAND_DISPLAY") {
            self.general.socket_name = socket;
        }

        match env.var("XDG_RUNTIME_DIR") {
            Some(dir) => self.general.runtime_dir = PathBuf::from(dir),
            None => {
                let dir = self.general.runtime_dir.to_string_lossy().into_owned();
                info!("XDG_RUNTIME_DIR not set, exporting {}", dir);
                env.set_var("XDG_RUNTIME_DIR", &dir);
            }
        }

        if let Some(seat) = env.var("XDG_SEAT") {
            self.seat.name = seat;
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.general.socket_name.is_empty() {
            anyhow::bail!("Invalid socket_name: must not be empty");
        }

        if self.general.socket_name.contains('/') {
            anyhow::bail!(
                "Invalid socket_name '{}': must be a bare name inside runtime_dir",
                self.general.socket_name
            );
        }

        if self.seat.name.is_empty() {
            anyhow::bail!("Invalid seat name: must not be empty");
        }

        if self.shell.xdg_shell_version != 1 {
            anyhow::bail!(
                "Invalid xdg_shell_version {}: only version 1 is supported",
                self.shell.xdg_shell_version
            );
        }

        if !(1..=MAX_POLICY_VERSION).contains(&self.shell.policy_version) {
            anyhow::bail!(
                "Invalid policy_version {}: must be between 1 and {}",
                self.shell.policy_version,
                MAX_POLICY_VERSION
            );
        }

        if self.outputs.is_empty() {
            anyhow::bail!("At least one output must be configured");
        }

        for output in &self.outputs {
            if output.width == 0 || output.height == 0 {
                anyhow::bail!("Invalid output '{}': zero-sized", output.name);
            }
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests;
