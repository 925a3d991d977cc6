//! Unit tests for configuration module
//!
//! Tests parsing, validation, environment overrides and round-tripping.

use super::*;
use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use tempfile::tempdir;

#[derive(Default)]
struct FakeEnv(HashMap<String, String>);

impl FakeEnv {
    fn with(vars: &[(&str, &str)]) -> Self {
        Self(
            vars.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl Environment for FakeEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn set_var(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }
}

#[test]
fn test_default_configuration_is_valid() {
    let config = HeadlessConfig::default();
    assert!(config.validate().is_ok());

    assert_eq!(config.general.socket_name, "wayland-0");
    assert_eq!(config.general.runtime_dir, PathBuf::from("/run"));
    assert_eq!(config.seat.name, "seat0");
    assert_eq!(config.shell.xdg_shell_version, 1);
    assert_eq!(config.shell.policy_version, 7);
    assert_eq!(config.outputs.len(), 1);
    assert_eq!(config.outputs[0].width, 1920);
    assert_eq!(config.outputs[0].refresh_mhz, 60_000);
}

#[test]
fn test_empty_file_uses_defaults() -> Result<()> {
    let config: HeadlessConfig = toml::from_str("")?;
    assert_eq!(config, HeadlessConfig::default());
    Ok(())
}

#[test]
fn test_configuration_from_file() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("headless.toml");

    let test_config = r#"
[general]
socket_name = "wayland-test"
runtime_dir = "/tmp/headless"

[seat]
name = "seat1"

[shell]
policy_version = 5

[[outputs]]
name = "HEADLESS-A"
width = 1280
height = 720

[[outputs]]
name = "HEADLESS-B"
width = 640
height = 480
refresh_mhz = 30000
"#;
    fs::write(&file_path, test_config)?;

    let config = HeadlessConfig::load(&file_path)?;
    assert_eq!(config.general.socket_name, "wayland-test");
    assert_eq!(config.general.runtime_dir, PathBuf::from("/tmp/headless"));
    assert_eq!(config.seat.name, "seat1");
    assert_eq!(config.shell.xdg_shell_version, 1);
    assert_eq!(config.shell.policy_version, 5);
    assert_eq!(config.outputs.len(), 2);
    assert_eq!(config.outputs[0].refresh_mhz, 60_000);
    assert_eq!(config.outputs[1].refresh_mhz, 30_000);

    Ok(())
}

#[test]
fn test_missing_file_is_an_error() {
    let err = HeadlessConfig::load("/nonexistent/headless.toml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_malformed_file_is_an_error() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("broken.toml");
    fs::write(&file_path, "[general\nsocket_name = ")?;

    let err = HeadlessConfig::load(&file_path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_validation_rejects_bad_values() {
    let mut config = HeadlessConfig::default();
    config.general.socket_name.clear();
    assert!(config.validate().is_err());

    let mut config = HeadlessConfig::default();
    config.general.socket_name = "nested/wayland-0".to_string();
    assert!(config.validate().is_err());

    let mut config = HeadlessConfig::default();
    config.seat.name.clear();
    assert!(config.validate().is_err());

    let mut config = HeadlessConfig::default();
    config.shell.xdg_shell_version = 2;
    assert!(config.validate().is_err());

    for version in [0, 8] {
        let mut config = HeadlessConfig::default();
        config.shell.policy_version = version;
        assert!(config.validate().is_err());
    }

    let mut config = HeadlessConfig::default();
    config.outputs.clear();
    assert!(config.validate().is_err());

    let mut config = HeadlessConfig::default();
    config.outputs[0].height = 0;
    assert!(config.validate().is_err());
}

#[test]
fn test_load_validates() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("invalid.toml");
    fs::write(&file_path, "[shell]\npolicy_version = 9\n")?;

    assert!(HeadlessConfig::load(&file_path).is_err());
    Ok(())
}

#[test]
fn test_environment_overrides() {
    let mut config = HeadlessConfig::default();
    let mut env = FakeEnv::with(&[
        ("WAYLAND_DISPLAY", "wayland-7"),
        ("XDG_RUNTIME_DIR", "/run/user/1000"),
        ("XDG_SEAT", "seat9"),
    ]);

    config.apply_env(&mut env);
    assert_eq!(config.general.socket_name, "wayland-7");
    assert_eq!(config.general.runtime_dir, PathBuf::from("/run/user/1000"));
    assert_eq!(config.seat.name, "seat9");
}

#[test]
fn test_runtime_dir_exported_when_absent() {
    let mut config = HeadlessConfig::default();
    let mut env = FakeEnv::default();

    config.apply_env(&mut env);
    assert_eq!(env.var("XDG_RUNTIME_DIR").as_deref(), Some("/run"));
    assert_eq!(config.general.socket_name, "wayland-0");
    assert_eq!(config.seat.name, "seat0");
}

#[test]
fn test_save_and_reload() -> Result<()> {
    let dir = tempdir()?;
    let file_path = dir.path().join("saved.toml");

    let mut original = HeadlessConfig::default();
    original.seat.name = "seat2".to_string();
    original.outputs.push(OutputConfig {
        name: "HEADLESS-2".to_string(),
        width: 800,
        height: 600,
        refresh_mhz: 75_000,
    });
    original.save(&file_path)?;

    let reloaded = HeadlessConfig::load(&file_path)?;
    assert_eq!(reloaded, original);
    Ok(())
}

#[test]
fn test_output_info_conversion() {
    let info = OutputConfig::default().to_info();
    assert_eq!(info.name, "HEADLESS-1");
    assert_eq!((info.width, info.height), (1920, 1080));
}
