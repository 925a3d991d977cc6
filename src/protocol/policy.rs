//! `tizen_policy` bind point
//!
//! Visibility, activation and focus-skip requests reach the shell. The
//! remaining stacking, geometry and aux-hint requests are accepted without
//! effect; a few reply with a fixed acknowledgement. Sub-surface requests are
//! rejected as unsupported.

use log::{debug, trace};
use wayland_server::protocol::{wl_subsurface, wl_surface::WlSurface};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use super::tizen::{tizen_policy, tizen_position, tizen_subsurface_watcher, tizen_visibility};
use super::{post_display_error, report_shell_error, surface_id, DisplayError};
use crate::engine::SurfaceId;
use crate::server::ServerState;
use crate::shell::{ResourceKey, ShellError, ShellGlobal, Visibility, VisibilitySink};

const SUBSURFACE_UNSUPPORTED: &str = "headless server does not support tizen_subsurface";

/// User data of a bound `tizen_policy`.
#[derive(Debug)]
pub struct PolicyData {
    key: ResourceKey,
}

/// User data of a `tizen_visibility`. `key` is `None` for an object whose
/// surface argument was rejected.
#[derive(Debug)]
pub struct VisibilityData {
    surface: SurfaceId,
    key: Option<ResourceKey>,
}

impl VisibilitySink for tizen_visibility::TizenVisibility {
    fn send(&self, visibility: Visibility) {
        self.notify(visibility.wire_value());
    }
}

impl GlobalDispatch<tizen_policy::TizenPolicy, ()> for ServerState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<tizen_policy::TizenPolicy>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let key = state.shell.global_bound(ShellGlobal::Policy);
        data_init.init(resource, PolicyData { key });
    }
}

/// Resolve a surface argument, posting an error when it is foreign.
fn policy_surface(
    resource: &tizen_policy::TizenPolicy,
    surface: &WlSurface,
) -> Option<SurfaceId> {
    let id = surface_id(surface);
    if id.is_none() {
        post_display_error(
            resource,
            DisplayError::InvalidObject,
            "wl_surface is not backed by this compositor",
        );
    }
    id
}

fn report(resource: &tizen_policy::TizenPolicy, result: Result<(), ShellError>) {
    if let Err(err) = result {
        report_shell_error(resource, &err, DisplayError::InvalidObject.into());
    }
}

impl Dispatch<tizen_policy::TizenPolicy, PolicyData> for ServerState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &tizen_policy::TizenPolicy,
        request: tizen_policy::Request,
        _data: &PolicyData,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            tizen_policy::Request::GetVisibility { id, surface } => {
                let Some(surface) = policy_surface(resource, &surface) else {
                    data_init.init(
                        id,
                        VisibilityData {
                            surface: SurfaceId(0),
                            key: None,
                        },
                    );
                    return;
                };
                let key = state.shell.allocate_key();
                let visibility = data_init.init(
                    id,
                    VisibilityData {
                        surface,
                        key: Some(key),
                    },
                );
                let result = state
                    .shell
                    .bind_visibility(surface, key, Box::new(visibility));
                if result.is_ok() {
                    debug!("{} bound visibility {}", surface, key);
                }
                report(resource, result);
            }
            tizen_policy::Request::GetPosition { id, .. } => {
                data_init.init(id, ());
            }
            tizen_policy::Request::Activate { surface } => {
                if let Some(surface) = policy_surface(resource, &surface) {
                    let result = state.shell.activate(&mut state.engine, surface);
                    report(resource, result);
                }
            }
            tizen_policy::Request::SetFocusSkip { surface } => {
                if let Some(surface) = policy_surface(resource, &surface) {
                    let result = state.shell.set_focus_skip(surface, true);
                    report(resource, result);
                }
            }
            tizen_policy::Request::UnsetFocusSkip { surface } => {
                if let Some(surface) = policy_surface(resource, &surface) {
                    let result = state.shell.set_focus_skip(surface, false);
                    report(resource, result);
                }
            }
            tizen_policy::Request::GetConformant { surface } => {
                resource.conformant(&surface, 0);
            }
            tizen_policy::Request::UnsetTransientFor { child_id } => {
                resource.transient_for_done(child_id);
            }
            tizen_policy::Request::SetWindowScreenMode { surface, mode } => {
                resource.window_screen_mode_done(&surface, mode, 0);
            }
            tizen_policy::Request::GetSubsurface { id, .. } => {
                data_init.init(id, ());
                post_display_error(
                    resource,
                    DisplayError::Implementation,
                    SUBSURFACE_UNSUPPORTED,
                );
            }
            tizen_policy::Request::GetSubsurfaceWatcher { id, .. } => {
                data_init.init(id, ());
                post_display_error(
                    resource,
                    DisplayError::Implementation,
                    SUBSURFACE_UNSUPPORTED,
                );
            }
            tizen_policy::Request::Destroy => {}
            _ => trace!("Ignored policy request on {}", resource.id()),
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &tizen_policy::TizenPolicy,
        data: &PolicyData,
    ) {
        state.shell.global_unbound(ShellGlobal::Policy, data.key);
    }
}

impl Dispatch<tizen_visibility::TizenVisibility, VisibilityData> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &tizen_visibility::TizenVisibility,
        _request: tizen_visibility::Request,
        _data: &VisibilityData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &tizen_visibility::TizenVisibility,
        data: &VisibilityData,
    ) {
        if let Some(key) = data.key {
            state.shell.visibility_resource_destroyed(data.surface, key);
        }
    }
}

impl Dispatch<tizen_position::TizenPosition, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &tizen_position::TizenPosition,
        _request: tizen_position::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<tizen_subsurface_watcher::TizenSubsurfaceWatcher, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &tizen_subsurface_watcher::TizenSubsurfaceWatcher,
        _request: tizen_subsurface_watcher::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

impl Dispatch<wl_subsurface::WlSubsurface, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &wl_subsurface::WlSubsurface,
        _request: wl_subsurface::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}
