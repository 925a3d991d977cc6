//! Shell and window-policy core
//!
//! Owns one [`ShellSurface`] companion per compositor surface, drives the
//! role state machine (none, toplevel, popup) from wire requests and engine
//! events, and derives the focus, topmost and topmost-visible views in a
//! single deferred pass (see [`Shell::reconcile`]).
//!
//! Every mutator only requests reconciliation; nothing recomputes inline.

use crate::engine::{Compositor, EngineEvent, SurfaceId, ViewId};
use log::{debug, trace, warn};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub mod error;
pub mod reconcile;
pub mod scheduler;
pub mod surface;
pub mod visibility;

pub use error::{ErrorClass, ShellError, ShellResult};
pub use reconcile::StackState;
pub use scheduler::{IdleSource, LoopIdle, ManualIdle, ReconcileScheduler};
pub use surface::{
    PendingUpdates, ResourceKey, RoleBinding, RoleKind, ShellSurface, Visibility, VisibilitySink,
};

/// Role string the shell stamps on every surface it wraps.
pub const XDG_SURFACE_ROLE: &str = "xdg_surface";

/// Collaborator told about published focus and topmost changes.
pub trait ViewObserver {
    fn on_top_view_changed(&mut self, engine: &mut dyn Compositor, view: Option<ViewId>);
    fn on_focus_view_changed(&mut self, engine: &mut dyn Compositor, view: Option<ViewId>);
    /// A view left the engine. Cached references to it must be dropped.
    fn on_view_removed(&mut self, _view: ViewId) {}
}

impl<T: ViewObserver + ?Sized> ViewObserver for Rc<RefCell<T>> {
    fn on_top_view_changed(&mut self, engine: &mut dyn Compositor, view: Option<ViewId>) {
        self.borrow_mut().on_top_view_changed(engine, view);
    }

    fn on_focus_view_changed(&mut self, engine: &mut dyn Compositor, view: Option<ViewId>) {
        self.borrow_mut().on_focus_view_changed(engine, view);
    }

    fn on_view_removed(&mut self, view: ViewId) {
        self.borrow_mut().on_view_removed(view);
    }
}

/// Globals whose per-client bind the shell keeps a back-reference to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellGlobal {
    XdgShell,
    Policy,
}

pub struct Shell {
    surfaces: HashMap<SurfaceId, ShellSurface>,
    focus: Option<ViewId>,
    top_mapped: Option<ViewId>,
    top_visible: Option<ViewId>,
    scheduler: ReconcileScheduler,
    observers: Vec<Box<dyn ViewObserver>>,
    xdg_shell_resource: Option<ResourceKey>,
    policy_resource: Option<ResourceKey>,
    next_key: u64,
}

impl Shell {
    pub fn new(idle: Box<dyn IdleSource>) -> Self {
        Self {
            surfaces: HashMap::new(),
            focus: None,
            top_mapped: None,
            top_visible: None,
            scheduler: ReconcileScheduler::new(idle),
            observers: Vec::new(),
            xdg_shell_resource: None,
            policy_resource: None,
            next_key: 0,
        }
    }

    pub fn add_observer(&mut self, observer: Box<dyn ViewObserver>) {
        self.observers.push(observer);
    }

    /// Fresh identity for a wire object the shell will track.
    pub fn allocate_key(&mut self) -> ResourceKey {
        self.next_key += 1;
        ResourceKey(self.next_key)
    }

    pub fn focus(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn top_mapped(&self) -> Option<ViewId> {
        self.top_mapped
    }

    pub fn top_visible(&self) -> Option<ViewId> {
        self.top_visible
    }

    pub fn surface(&self, surface: SurfaceId) -> Option<&ShellSurface> {
        self.surfaces.get(&surface)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn reconciliation_pending(&self) -> bool {
        self.scheduler.is_pending()
    }

    pub fn request_reconciliation(&mut self) {
        self.scheduler.request();
    }

    // Global binds

    pub fn global_bound(&mut self, global: ShellGlobal) -> ResourceKey {
        let key = self.allocate_key();
        match global {
            ShellGlobal::XdgShell => self.xdg_shell_resource = Some(key),
            ShellGlobal::Policy => self.policy_resource = Some(key),
        }
        debug!("Bound {:?} as {}", global, key);
        key
    }

    /// Clears the back-reference only. Objects created through the global
    /// stay valid until their own destruction.
    pub fn global_unbound(&mut self, global: ShellGlobal, key: ResourceKey) {
        let slot = match global {
            ShellGlobal::XdgShell => &mut self.xdg_shell_resource,
            ShellGlobal::Policy => &mut self.policy_resource,
        };
        if *slot == Some(key) {
            *slot = None;
            debug!("Unbound {:?} {}", global, key);
        }
    }

    pub fn bound_global(&self, global: ShellGlobal) -> Option<ResourceKey> {
        match global {
            ShellGlobal::XdgShell => self.xdg_shell_resource,
            ShellGlobal::Policy => self.policy_resource,
        }
    }

    // Engine events

    pub fn dispatch_engine_events(&mut self, engine: &mut dyn Compositor) {
        while let Some(event) = engine.poll_event() {
            self.handle_engine_event(engine, event);
        }
    }

    pub fn handle_engine_event(&mut self, engine: &mut dyn Compositor, event: EngineEvent) {
        trace!("Engine event {:?}", event);
        match event {
            EngineEvent::SurfaceAdded(surface) => self.create_surface_companion(surface),
            EngineEvent::SurfaceRemoved(surface) => self.on_surface_removed(engine, surface),
            EngineEvent::ViewRemoved(view) => self.on_view_removed(view),
            EngineEvent::SurfaceCommitted(surface) => self.on_surface_commit(engine, surface),
        }
    }

    pub fn create_surface_companion(&mut self, surface: SurfaceId) {
        if self.surfaces.contains_key(&surface) {
            warn!("{} already has a shell companion", surface);
            return;
        }
        self.surfaces.insert(surface, ShellSurface::new(surface));
        debug!("Shell companion created for {}", surface);
    }

    /// Detach every wire object from the companion, destroy its view and
    /// drop the record. Late requests on those objects find no companion.
    pub fn on_surface_removed(&mut self, engine: &mut dyn Compositor, surface: SurfaceId) {
        let Some(mut companion) = self.surfaces.remove(&surface) else {
            warn!("Removed {} had no shell companion", surface);
            return;
        };

        if let Some(view) = companion.view.take() {
            engine.destroy_view(view);
        }
        debug!(
            "Shell companion released for {} (role={:?}, shell object={:?})",
            surface,
            companion.role(),
            companion.shell_resource
        );

        self.request_reconciliation();
    }

    pub fn on_view_removed(&mut self, view: ViewId) {
        if self.top_mapped == Some(view) {
            self.top_mapped = None;
        }
        if self.top_visible == Some(view) {
            self.top_visible = None;
        }
        if self.focus == Some(view) {
            self.focus = None;
        }
        for companion in self.surfaces.values_mut() {
            if companion.view == Some(view) {
                companion.view = None;
            }
        }
        for observer in &mut self.observers {
            observer.on_view_removed(view);
        }
        self.request_reconciliation();
    }

    /// Map or unmap the view after a role change, once the client commits.
    pub fn on_surface_commit(&mut self, engine: &mut dyn Compositor, surface: SurfaceId) {
        let Some(companion) = self.surfaces.get_mut(&surface) else {
            warn!("Commit on {} without shell companion", surface);
            return;
        };
        if !companion.commit_subscribed {
            return;
        }

        if companion.pending_updates.contains(PendingUpdates::SURFACE_TYPE_CHANGED) {
            if let Some(view) = companion.view {
                if companion.role.is_some() {
                    engine.map_view(view);
                } else {
                    engine.unmap_view(view);
                }
                debug!(
                    "{} type changed: {} role={:?}",
                    surface,
                    view,
                    companion.role()
                );
            }
        }
        companion.pending_updates = PendingUpdates::empty();

        self.request_reconciliation();
    }

    // Shell surface lifecycle

    /// Wrap `surface` in a shell surface object: create its view, bind the
    /// view to the surface, subscribe to commits and stamp the role string.
    /// Partial work is rolled back on failure.
    pub fn attach_shell_surface(
        &mut self,
        engine: &mut dyn Compositor,
        surface: SurfaceId,
    ) -> ShellResult<ResourceKey> {
        if !self.surfaces.contains_key(&surface) {
            if !engine.has_surface(surface) {
                return Err(ShellError::MissingCompanion { surface });
            }
            warn!("{} reached the shell before its add event", surface);
            self.create_surface_companion(surface);
        }
        let key = self.allocate_key();
        let companion = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ShellError::MissingCompanion { surface })?;

        if companion.shell_resource.is_some() {
            return Err(ShellError::AlreadyConstructed { surface });
        }

        let view = engine
            .add_view()
            .ok_or(ShellError::ViewAllocation { surface })?;
        if !engine.view_set_surface(view, surface) {
            engine.destroy_view(view);
            return Err(ShellError::NoView { surface });
        }
        if !engine.set_surface_role(surface, XDG_SURFACE_ROLE) {
            engine.destroy_view(view);
            let role = engine.surface_role(surface).unwrap_or_default().to_string();
            return Err(ShellError::SurfaceRole { surface, role });
        }

        companion.view = Some(view);
        companion.commit_subscribed = true;
        companion.shell_resource = Some(key);
        debug!("{} wrapped as {} with {}", surface, key, view);
        Ok(key)
    }

    /// The outer shell surface object went away. The view is unmapped and
    /// destroyed and reconciliation requested before the handle is cleared.
    pub fn shell_surface_resource_destroyed(
        &mut self,
        engine: &mut dyn Compositor,
        surface: SurfaceId,
        key: ResourceKey,
    ) {
        let Some(companion) = self.surfaces.get_mut(&surface) else {
            debug!("{} for {} outlived its companion", key, surface);
            return;
        };
        if companion.shell_resource != Some(key) {
            debug!("Stale shell surface {} for {}", key, surface);
            return;
        }

        if let Some(view) = companion.view.take() {
            engine.unmap_view(view);
            engine.destroy_view(view);
        }
        companion.commit_subscribed = false;
        companion.skip_focus = false;
        companion.visibility = Visibility::FullyObscured;
        companion.pending_updates |= PendingUpdates::SURFACE_TYPE_CHANGED;
        self.request_reconciliation();

        if let Some(companion) = self.surfaces.get_mut(&surface) {
            companion.shell_resource = None;
        }
        debug!("Shell surface {} of {} destroyed", key, surface);
    }

    pub fn assign_toplevel_role(
        &mut self,
        surface: SurfaceId,
        shell_resource: ResourceKey,
    ) -> ShellResult<ResourceKey> {
        self.assign_role(surface, shell_resource, RoleKind::Toplevel)
    }

    /// Parent and positioner carry no geometry here and are not taken.
    pub fn assign_popup_role(
        &mut self,
        surface: SurfaceId,
        shell_resource: ResourceKey,
    ) -> ShellResult<ResourceKey> {
        self.assign_role(surface, shell_resource, RoleKind::Popup)
    }

    fn assign_role(
        &mut self,
        surface: SurfaceId,
        shell_resource: ResourceKey,
        kind: RoleKind,
    ) -> ShellResult<ResourceKey> {
        let key = self.allocate_key();
        let companion = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ShellError::MissingCompanion { surface })?;
        if companion.shell_resource != Some(shell_resource) {
            return Err(ShellError::NotConstructed { surface });
        }
        if let Some(existing) = companion.role {
            warn!(
                "{} asked for {:?} while holding {:?}",
                surface, kind, existing.kind
            );
            return Err(ShellError::RoleConflict { surface });
        }

        companion.role = Some(RoleBinding {
            kind,
            resource: key,
        });
        companion.pending_updates |= PendingUpdates::SURFACE_TYPE_CHANGED;
        debug!("{} assigned {:?} role as {}", surface, kind, key);
        Ok(key)
    }

    /// The toplevel or popup object went away. A toplevel's view is unmapped
    /// at once, a popup's on its next commit. Safe on a companion that is
    /// already gone or whose role moved on.
    pub fn role_resource_destroyed(
        &mut self,
        engine: &mut dyn Compositor,
        surface: SurfaceId,
        key: ResourceKey,
    ) {
        let Some(companion) = self.surfaces.get_mut(&surface) else {
            debug!("Role object {} for {} outlived its companion", key, surface);
            return;
        };
        let kind = match companion.role {
            Some(binding) if binding.resource == key => binding.kind,
            _ => {
                debug!("Stale role object {} for {}", key, surface);
                return;
            }
        };

        // A popup stays mapped until the next commit applies the change
        let unmapped = match (kind, companion.view) {
            (RoleKind::Toplevel, Some(view)) => {
                engine.unmap_view(view);
                true
            }
            _ => false,
        };
        companion.role = None;
        companion.pending_updates |= PendingUpdates::SURFACE_TYPE_CHANGED;
        debug!("{:?} object {} of {} destroyed", kind, key, surface);

        if unmapped {
            self.request_reconciliation();
        }
    }

    pub fn ack_configure(&mut self, surface: SurfaceId, shell_resource: ResourceKey, serial: u32) {
        let Some(companion) = self.surfaces.get_mut(&surface) else {
            debug!("ack_configure on detached {}", surface);
            return;
        };
        if companion.shell_resource != Some(shell_resource) {
            return;
        }
        if !companion.record_ack(serial) {
            trace!("{} acked stale serial {}", surface, serial);
        }
    }

    // Policy requests

    /// Raise the surface's view to the top of the stack.
    pub fn activate(&mut self, engine: &mut dyn Compositor, surface: SurfaceId) -> ShellResult<()> {
        let companion = self
            .surfaces
            .get(&surface)
            .ok_or(ShellError::MissingCompanion { surface })?;
        let Some(view) = companion.view else {
            warn!("activate on {} without a view", surface);
            return Ok(());
        };
        engine.stack_top(view);
        debug!("Activated {} ({})", surface, view);
        self.request_reconciliation();
        Ok(())
    }

    pub fn set_focus_skip(&mut self, surface: SurfaceId, skip: bool) -> ShellResult<()> {
        let companion = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ShellError::MissingCompanion { surface })?;
        if companion.skip_focus == skip {
            return Ok(());
        }
        companion.skip_focus = skip;
        debug!("{} skip_focus={}", surface, skip);
        self.request_reconciliation();
        Ok(())
    }

    /// Cancel a pending pass. Companions stay until their surfaces go.
    pub fn shutdown(&mut self) {
        self.scheduler.shutdown();
        self.observers.clear();
        debug!("Shell shut down with {} companions", self.surfaces.len());
    }
}

#[cfg(test)]
mod tests;
