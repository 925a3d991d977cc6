//! # Headless Shell
//!
//! Shell and window-policy layer of a headless Wayland display server.
//!
//! ## Architecture
//!
//! - `engine`: the compositor object API the shell consumes, plus the
//!   in-memory headless engine
//! - `shell`: surface role state machine, deferred reconciliation of the
//!   focus/top/top-visible views, and visibility notifications
//! - `input`: keyboard focus routing for the default seat
//! - `debug`: introspection of published focus and top changes
//! - `protocol`: wire bind points (`wl_compositor`, `zxdg_shell_v6`,
//!   `tizen_policy`)
//! - `server`: display, socket and calloop event loop
//! - `config`: configuration parsing and environment overrides
//!
//! ## Usage
//!
//! ```rust,no_run
//! use headless_shell::{HeadlessConfig, HeadlessServer};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = HeadlessConfig::default();
//!     let server = HeadlessServer::new(&config)?;
//!     server.run()
//! }
//! ```

pub mod config;
pub mod debug;
pub mod engine;
pub mod input;
pub mod protocol;
pub mod server;
pub mod shell;

pub use config::HeadlessConfig;
pub use debug::DebugTracker;
pub use engine::{Compositor, HeadlessCompositor};
pub use input::InputRouter;
pub use server::{HeadlessServer, ServerState};
pub use shell::{Shell, ShellError};

pub use anyhow::{Context, Error, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
pub const BUILD_DATE: &str = env!("BUILD_DATE");
pub const GIT_COMMIT: &str = env!("GIT_COMMIT");
