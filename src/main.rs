//! # headless-shell
//!
//! Headless Wayland display server exposing `zxdg_shell_v6` and
//! `tizen_policy` to clients, with no rendering or input devices.

use anyhow::Result;
use clap::Parser;
use headless_shell::config::ProcessEnv;
use headless_shell::{HeadlessConfig, HeadlessServer};
use log::info;

#[derive(Parser)]
#[command(name = "headless-shell")]
#[command(about = "Headless Wayland display server with window-policy shell")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Socket name inside the runtime directory (overrides WAYLAND_DISPLAY)
    #[arg(short, long)]
    socket: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    info!("🚀 Starting headless-shell");
    info!(
        "📄 Version: {} ({}, built {})",
        headless_shell::VERSION,
        headless_shell::GIT_COMMIT,
        headless_shell::BUILD_DATE
    );

    let mut config = match &cli.config {
        Some(path) => {
            let config = HeadlessConfig::load(path)?;
            info!("✅ Configuration loaded from: {}", path);
            config
        }
        None => {
            info!("📋 Using default configuration");
            HeadlessConfig::default()
        }
    };

    config.apply_env(&mut ProcessEnv);
    if let Some(socket) = cli.socket {
        config.general.socket_name = socket;
    }
    config.validate()?;

    let server = HeadlessServer::new(&config)?;
    server.run()?;

    info!("👋 headless-shell stopped");
    Ok(())
}
