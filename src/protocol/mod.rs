//! Wire protocol bind points
//!
//! `Dispatch` implementations that translate client requests into engine
//! and shell calls on [`ServerState`](crate::server::ServerState):
//!
//! - `compositor`: `wl_compositor`, `wl_surface`, `wl_region`, `wl_shm`
//! - `xdg_shell`: `zxdg_shell_v6` and its surface, toplevel and popup objects
//! - `policy`: `tizen_policy`, `tizen_visibility`, `tizen_position`
//!
//! Every handler that mutates the engine drains its events into the shell
//! before returning, so the shell sees changes in request order.

use crate::shell::{ErrorClass, ShellError};
use log::warn;
use wayland_server::protocol::wl_surface::WlSurface;
use wayland_server::Resource;

pub mod compositor;
pub mod policy;
pub mod tizen;
pub mod xdg_shell;
pub mod xdg_v6;

pub use compositor::SurfaceData;

/// Codes of the `wl_display.error` enum. The display object lives in the
/// backend, so no generated enum is available for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DisplayError {
    InvalidObject = 0,
    InvalidMethod = 1,
    NoMemory = 2,
    Implementation = 3,
}

impl From<DisplayError> for u32 {
    fn from(error: DisplayError) -> u32 {
        error as u32
    }
}

/// Post a `wl_display` level error against `resource`. The client is
/// disconnected.
pub(crate) fn post_display_error<I: Resource>(resource: &I, code: DisplayError, message: &str) {
    warn!("{:?} on {}: {}", code, resource.id(), message);
    resource.post_error(code, message);
}

/// Surface a shell error to the client according to its class. `code` is
/// the interface-specific error posted for protocol violations.
pub(crate) fn report_shell_error<I: Resource>(resource: &I, error: &ShellError, code: u32) {
    match error.class() {
        ErrorClass::ProtocolViolation => {
            warn!("Protocol violation on {}: {}", resource.id(), error);
            resource.post_error(code, error.to_string());
        }
        ErrorClass::ResourceExhaustion => {
            warn!("Out of resources on {}: {}", resource.id(), error);
            resource.post_error(DisplayError::NoMemory, error.to_string());
        }
        ErrorClass::InternalInconsistency => {
            warn!("Dropped request on {}: {}", resource.id(), error);
        }
    }
}

/// Shell-side surface identity behind a `wl_surface` argument.
pub(crate) fn surface_id(surface: &WlSurface) -> Option<crate::engine::SurfaceId> {
    surface.data::<SurfaceData>().map(|data| data.id)
}
