//! `zxdg_shell_v6` bind point
//!
//! Lifecycle and role semantics only. Toplevel and popup requests that
//! would drive window-manager policy are accepted without effect.

use log::{debug, trace};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use super::xdg_v6::{
    zxdg_popup_v6, zxdg_positioner_v6, zxdg_shell_v6, zxdg_surface_v6, zxdg_toplevel_v6,
};
use super::{post_display_error, report_shell_error, surface_id, DisplayError};
use crate::engine::SurfaceId;
use crate::server::ServerState;
use crate::shell::{ResourceKey, RoleKind, ShellError, ShellGlobal};

/// User data of a bound `zxdg_shell_v6`.
#[derive(Debug)]
pub struct XdgShellData {
    key: ResourceKey,
}

/// User data of a `zxdg_surface_v6`. `key` is `None` for an object whose
/// creation failed; such objects are inert.
#[derive(Debug)]
pub struct XdgSurfaceData {
    surface: SurfaceId,
    key: Option<ResourceKey>,
}

/// User data of a toplevel or popup role object.
#[derive(Debug)]
pub struct XdgRoleData {
    surface: SurfaceId,
    key: Option<ResourceKey>,
}

impl GlobalDispatch<zxdg_shell_v6::ZxdgShellV6, ()> for ServerState {
    fn bind(
        state: &mut Self,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<zxdg_shell_v6::ZxdgShellV6>,
        _global_data: &(),
        data_init: &mut DataInit<'_, Self>,
    ) {
        let key = state.shell.global_bound(ShellGlobal::XdgShell);
        data_init.init(resource, XdgShellData { key });
    }
}

impl Dispatch<zxdg_shell_v6::ZxdgShellV6, XdgShellData> for ServerState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &zxdg_shell_v6::ZxdgShellV6,
        request: zxdg_shell_v6::Request,
        _data: &XdgShellData,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            zxdg_shell_v6::Request::CreatePositioner { id } => {
                data_init.init(id, ());
            }
            zxdg_shell_v6::Request::GetXdgSurface { id, surface } => {
                let Some(surface) = surface_id(&surface) else {
                    data_init.init(
                        id,
                        XdgSurfaceData {
                            surface: SurfaceId(0),
                            key: None,
                        },
                    );
                    post_display_error(
                        resource,
                        DisplayError::InvalidObject,
                        "wl_surface is not backed by this compositor",
                    );
                    return;
                };

                let result = state.shell.attach_shell_surface(&mut state.engine, surface);
                state.dispatch_engine_events();
                match result {
                    Ok(key) => {
                        data_init.init(
                            id,
                            XdgSurfaceData {
                                surface,
                                key: Some(key),
                            },
                        );
                    }
                    Err(err) => {
                        data_init.init(id, XdgSurfaceData { surface, key: None });
                        report_shell_error(resource, &err, zxdg_shell_v6::Error::Role.into());
                    }
                }
            }
            zxdg_shell_v6::Request::Pong { serial } => {
                trace!("Pong {} from {}", serial, resource.id());
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &zxdg_shell_v6::ZxdgShellV6,
        data: &XdgShellData,
    ) {
        state.shell.global_unbound(ShellGlobal::XdgShell, data.key);
    }
}

impl Dispatch<zxdg_positioner_v6::ZxdgPositionerV6, ()> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        _resource: &zxdg_positioner_v6::ZxdgPositionerV6,
        _request: zxdg_positioner_v6::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
    }
}

fn role_error_code(err: &ShellError) -> u32 {
    match err {
        ShellError::NotConstructed { .. } => zxdg_surface_v6::Error::NotConstructed.into(),
        _ => zxdg_surface_v6::Error::AlreadyConstructed.into(),
    }
}

impl Dispatch<zxdg_surface_v6::ZxdgSurfaceV6, XdgSurfaceData> for ServerState {
    fn request(
        state: &mut Self,
        _client: &Client,
        resource: &zxdg_surface_v6::ZxdgSurfaceV6,
        request: zxdg_surface_v6::Request,
        data: &XdgSurfaceData,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, Self>,
    ) {
        let surface = data.surface;
        match request {
            zxdg_surface_v6::Request::GetToplevel { id } => {
                let result = match data.key {
                    Some(key) => state.shell.assign_toplevel_role(surface, key),
                    None => Err(ShellError::NotConstructed { surface }),
                };
                match result {
                    Ok(key) => {
                        let toplevel = data_init.init(
                            id,
                            XdgRoleData {
                                surface,
                                key: Some(key),
                            },
                        );
                        toplevel.configure(0, 0, Vec::new());
                        resource.configure(state.next_serial());
                    }
                    Err(err) => {
                        data_init.init(id, XdgRoleData { surface, key: None });
                        report_shell_error(resource, &err, role_error_code(&err));
                    }
                }
            }
            zxdg_surface_v6::Request::GetPopup { id, .. } => {
                let result = match data.key {
                    Some(key) => state.shell.assign_popup_role(surface, key),
                    None => Err(ShellError::NotConstructed { surface }),
                };
                match result {
                    Ok(key) => {
                        let popup = data_init.init(
                            id,
                            XdgRoleData {
                                surface,
                                key: Some(key),
                            },
                        );
                        popup.configure(0, 0, 0, 0);
                        resource.configure(state.next_serial());
                    }
                    Err(err) => {
                        data_init.init(id, XdgRoleData { surface, key: None });
                        report_shell_error(resource, &err, role_error_code(&err));
                    }
                }
            }
            zxdg_surface_v6::Request::SetWindowGeometry { .. } => {}
            zxdg_surface_v6::Request::AckConfigure { serial } => {
                if let Some(key) = data.key {
                    state.shell.ack_configure(surface, key, serial);
                }
            }
            _ => {}
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &zxdg_surface_v6::ZxdgSurfaceV6,
        data: &XdgSurfaceData,
    ) {
        if let Some(key) = data.key {
            state
                .shell
                .shell_surface_resource_destroyed(&mut state.engine, data.surface, key);
            state.dispatch_engine_events();
        }
    }
}

impl Dispatch<zxdg_toplevel_v6::ZxdgToplevelV6, XdgRoleData> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &zxdg_toplevel_v6::ZxdgToplevelV6,
        request: zxdg_toplevel_v6::Request,
        data: &XdgRoleData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        match request {
            zxdg_toplevel_v6::Request::SetTitle { title } => {
                debug!("{} title '{}'", data.surface, title);
            }
            zxdg_toplevel_v6::Request::SetAppId { app_id } => {
                debug!("{} app_id '{}'", data.surface, app_id);
            }
            zxdg_toplevel_v6::Request::Destroy => {}
            _ => trace!("Ignored toplevel request on {}", resource.id()),
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &zxdg_toplevel_v6::ZxdgToplevelV6,
        data: &XdgRoleData,
    ) {
        role_destroyed(state, data, RoleKind::Toplevel);
    }
}

impl Dispatch<zxdg_popup_v6::ZxdgPopupV6, XdgRoleData> for ServerState {
    fn request(
        _state: &mut Self,
        _client: &Client,
        resource: &zxdg_popup_v6::ZxdgPopupV6,
        request: zxdg_popup_v6::Request,
        _data: &XdgRoleData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, Self>,
    ) {
        if let zxdg_popup_v6::Request::Grab { serial, .. } = request {
            trace!("Ignored popup grab {} on {}", serial, resource.id());
        }
    }

    fn destroyed(
        state: &mut Self,
        _client: wayland_server::backend::ClientId,
        _resource: &zxdg_popup_v6::ZxdgPopupV6,
        data: &XdgRoleData,
    ) {
        role_destroyed(state, data, RoleKind::Popup);
    }
}

fn role_destroyed(state: &mut ServerState, data: &XdgRoleData, kind: RoleKind) {
    let Some(key) = data.key else {
        return;
    };
    trace!("{:?} object {} of {} destroyed", kind, key, data.surface);
    state
        .shell
        .role_resource_destroyed(&mut state.engine, data.surface, key);
    state.dispatch_engine_events();
}
