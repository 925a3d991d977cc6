//! Per-surface shell companion record

use crate::engine::{SurfaceId, ViewId};
use bitflags::bitflags;
use std::fmt;

/// Handle the shell hands out for every wire object it tracks. Wire objects
/// keep the key in their user data; the shell re-validates it on each use so
/// a stale object can never reach a newer association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceKey(pub(crate) u64);

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "res#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleKind {
    Toplevel,
    Popup,
}

/// A role together with the wire object that holds it. Having no binding is
/// the "no role" state, so a role can never exist without its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleBinding {
    pub kind: RoleKind,
    pub resource: ResourceKey,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PendingUpdates: u32 {
        const SURFACE_TYPE_CHANGED = 1 << 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    Unobscured,
    #[default]
    FullyObscured,
}

impl Visibility {
    /// Value carried by `tizen_visibility.notify`.
    pub fn wire_value(self) -> u32 {
        match self {
            Visibility::Unobscured => 0,
            Visibility::FullyObscured => 2,
        }
    }
}

/// Outbound end of a bound visibility object.
pub trait VisibilitySink {
    fn send(&self, visibility: Visibility);
}

pub(crate) struct VisibilityBinding {
    pub key: ResourceKey,
    pub sink: Box<dyn VisibilitySink>,
}

/// Shell-side companion of one compositor surface.
pub struct ShellSurface {
    pub(crate) surface: SurfaceId,
    pub(crate) view: Option<ViewId>,
    pub(crate) role: Option<RoleBinding>,
    /// The `zxdg_surface_v6` object wrapping this surface.
    pub(crate) shell_resource: Option<ResourceKey>,
    pub(crate) pending_updates: PendingUpdates,
    pub(crate) visibility: Visibility,
    pub(crate) visibility_resource: Option<VisibilityBinding>,
    pub(crate) skip_focus: bool,
    pub(crate) last_ack_configure: Option<u32>,
    pub(crate) commit_subscribed: bool,
}

impl ShellSurface {
    pub(crate) fn new(surface: SurfaceId) -> Self {
        Self {
            surface,
            view: None,
            role: None,
            shell_resource: None,
            pending_updates: PendingUpdates::empty(),
            visibility: Visibility::FullyObscured,
            visibility_resource: None,
            skip_focus: false,
            last_ack_configure: None,
            commit_subscribed: false,
        }
    }

    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    pub fn view(&self) -> Option<ViewId> {
        self.view
    }

    pub fn role(&self) -> Option<RoleKind> {
        self.role.map(|binding| binding.kind)
    }

    pub fn role_binding(&self) -> Option<RoleBinding> {
        self.role
    }

    pub fn shell_resource(&self) -> Option<ResourceKey> {
        self.shell_resource
    }

    pub fn pending_updates(&self) -> PendingUpdates {
        self.pending_updates
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn visibility_resource(&self) -> Option<ResourceKey> {
        self.visibility_resource.as_ref().map(|binding| binding.key)
    }

    pub fn skip_focus(&self) -> bool {
        self.skip_focus
    }

    pub fn last_ack_configure(&self) -> Option<u32> {
        self.last_ack_configure
    }

    pub fn commit_subscribed(&self) -> bool {
        self.commit_subscribed
    }

    /// Record an acknowledged configure serial. Serials wrap, so "newer" is
    /// judged on the signed distance from the last one.
    pub(crate) fn record_ack(&mut self, serial: u32) -> bool {
        match self.last_ack_configure {
            Some(last) if (serial.wrapping_sub(last) as i32) <= 0 => false,
            _ => {
                self.last_ack_configure = Some(serial);
                true
            }
        }
    }
}

impl fmt::Debug for ShellSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellSurface")
            .field("surface", &self.surface)
            .field("view", &self.view)
            .field("role", &self.role)
            .field("shell_resource", &self.shell_resource)
            .field("pending_updates", &self.pending_updates)
            .field("visibility", &self.visibility)
            .field("visibility_resource", &self.visibility_resource())
            .field("skip_focus", &self.skip_focus)
            .field("last_ack_configure", &self.last_ack_configure)
            .finish()
    }
}
