//! Unit tests for the shell core
//!
//! Drives the shell through the headless engine with a manual idle source,
//! so each test decides exactly when the deferred pass runs.

use super::*;
use crate::engine::headless::OutputInfo;
use crate::engine::{HeadlessCompositor, OutputId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Published {
    Top(Option<ViewId>),
    Focus(Option<ViewId>),
}

struct Recorder(Rc<RefCell<Vec<Published>>>);

impl ViewObserver for Recorder {
    fn on_top_view_changed(&mut self, _engine: &mut dyn Compositor, view: Option<ViewId>) {
        self.0.borrow_mut().push(Published::Top(view));
    }

    fn on_focus_view_changed(&mut self, _engine: &mut dyn Compositor, view: Option<ViewId>) {
        self.0.borrow_mut().push(Published::Focus(view));
    }
}

#[derive(Clone, Default)]
struct RecordingSink(Rc<RefCell<Vec<Visibility>>>);

impl VisibilitySink for RecordingSink {
    fn send(&self, visibility: Visibility) {
        self.0.borrow_mut().push(visibility);
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    surface: SurfaceId,
    shell_key: ResourceKey,
    role_key: ResourceKey,
    view: ViewId,
}

struct Harness {
    engine: HeadlessCompositor,
    shell: Shell,
    idle: ManualIdle,
    published: Rc<RefCell<Vec<Published>>>,
    output: OutputId,
}

impl Harness {
    fn new() -> Self {
        Self::with_engine(HeadlessCompositor::new())
    }

    fn with_engine(mut engine: HeadlessCompositor) -> Self {
        let output = engine.add_output(OutputInfo {
            name: "HEADLESS-1".to_string(),
            width: 1920,
            height: 1080,
            refresh_mhz: 60_000,
        });
        engine.clear_damage();

        let idle = ManualIdle::new();
        let published = Rc::new(RefCell::new(Vec::new()));
        let mut shell = Shell::new(Box::new(idle.clone()));
        shell.add_observer(Box::new(Recorder(published.clone())));

        Self {
            engine,
            shell,
            idle,
            published,
            output,
        }
    }

    fn pump(&mut self) {
        self.shell.dispatch_engine_events(&mut self.engine);
    }

    /// Run the deferred pass if one is pending, like the event loop would.
    fn run_idle(&mut self) {
        self.pump();
        if self.shell.reconciliation_pending() {
            self.shell.reconcile(&mut self.engine);
        }
        self.pump();
    }

    fn new_surface(&mut self) -> SurfaceId {
        let surface = self.engine.create_surface();
        self.pump();
        surface
    }

    fn commit(&mut self, surface: SurfaceId) {
        self.engine.commit_surface(surface);
        self.pump();
    }

    fn window(&mut self, kind: RoleKind, buffer: bool) -> Window {
        let surface = self.new_surface();
        let shell_key = self
            .shell
            .attach_shell_surface(&mut self.engine, surface)
            .unwrap();
        let role_key = match kind {
            RoleKind::Toplevel => self.shell.assign_toplevel_role(surface, shell_key),
            RoleKind::Popup => self.shell.assign_popup_role(surface, shell_key),
        }
        .unwrap();
        if buffer {
            self.engine.attach_buffer(surface, true);
        }
        self.commit(surface);
        let view = self.shell.surface(surface).unwrap().view().unwrap();
        Window {
            surface,
            shell_key,
            role_key,
            view,
        }
    }

    fn toplevel(&mut self, buffer: bool) -> Window {
        self.window(RoleKind::Toplevel, buffer)
    }

    fn take_published(&self) -> Vec<Published> {
        std::mem::take(&mut *self.published.borrow_mut())
    }

    fn bind_sink(&mut self, surface: SurfaceId) -> (RecordingSink, ResourceKey) {
        let sink = RecordingSink::default();
        let key = self.shell.allocate_key();
        self.shell
            .bind_visibility(surface, key, Box::new(sink.clone()))
            .unwrap();
        (sink, key)
    }
}

#[test]
fn test_companion_follows_surface_lifecycle() {
    let mut h = Harness::new();
    let surface = h.new_surface();
    assert!(h.shell.surface(surface).is_some());

    h.engine.destroy_surface(surface);
    h.pump();
    assert!(h.shell.surface(surface).is_none());
    assert_eq!(h.shell.surface_count(), 0);
}

#[test]
fn test_commit_maps_view_after_role_assignment() {
    let mut h = Harness::new();
    let surface = h.new_surface();
    let shell_key = h.shell.attach_shell_surface(&mut h.engine, surface).unwrap();
    let view = h.shell.surface(surface).unwrap().view().unwrap();
    assert_eq!(h.engine.view_surface(view), Some(surface));
    assert_eq!(h.engine.surface_role(surface), Some(XDG_SURFACE_ROLE));

    h.shell.assign_toplevel_role(surface, shell_key).unwrap();
    assert!(h
        .shell
        .surface(surface)
        .unwrap()
        .pending_updates()
        .contains(PendingUpdates::SURFACE_TYPE_CHANGED));
    assert!(!h.engine.view_is_mapped(view));

    h.commit(surface);
    assert!(h.engine.view_is_mapped(view));
    assert!(h.shell.surface(surface).unwrap().pending_updates().is_empty());
    assert!(h.shell.reconciliation_pending());
}

#[test]
fn test_role_destruction_then_commit_unmaps() {
    let mut h = Harness::new();
    let w = h.toplevel(true);
    h.run_idle();
    assert!(h.engine.view_is_mapped(w.view));

    h.shell
        .role_resource_destroyed(&mut h.engine, w.surface, w.role_key);
    assert!(!h.engine.view_is_mapped(w.view));
    assert!(h.shell.surface(w.surface).unwrap().role().is_none());

    h.commit(w.surface);
    assert!(!h.engine.view_is_mapped(w.view));

    // The view survives until the outer object goes
    assert_eq!(h.shell.surface(w.surface).unwrap().view(), Some(w.view));
}

#[test]
fn test_popup_role_destruction_unmaps_on_next_commit() {
    let mut h = Harness::new();
    let w = h.window(RoleKind::Popup, false);
    h.run_idle();
    assert!(h.engine.view_is_mapped(w.view));

    h.shell
        .role_resource_destroyed(&mut h.engine, w.surface, w.role_key);
    assert!(h.engine.view_is_mapped(w.view));
    assert!(h.shell.surface(w.surface).unwrap().role().is_none());
    assert!(!h.shell.reconciliation_pending());

    h.commit(w.surface);
    assert!(!h.engine.view_is_mapped(w.view));
    assert!(h.shell.reconciliation_pending());
    h.run_idle();
    assert_eq!(h.shell.top_mapped(), None);
}

#[test]
fn test_role_exclusivity() {
    let mut h = Harness::new();
    let w = h.window(RoleKind::Popup, false);

    let err = h
        .shell
        .assign_toplevel_role(w.surface, w.shell_key)
        .unwrap_err();
    assert_eq!(err, ShellError::RoleConflict { surface: w.surface });
    assert_eq!(err.class(), ErrorClass::ProtocolViolation);

    let binding = h.shell.surface(w.surface).unwrap().role_binding().unwrap();
    assert_eq!(binding.kind, RoleKind::Popup);
    assert_eq!(binding.resource, w.role_key);
}

#[test]
fn test_role_can_be_reassigned_after_destruction() {
    let mut h = Harness::new();
    let w = h.toplevel(false);
    h.shell
        .role_resource_destroyed(&mut h.engine, w.surface, w.role_key);

    let popup = h.shell.assign_popup_role(w.surface, w.shell_key).unwrap();
    assert_ne!(popup, w.role_key);
    h.commit(w.surface);
    assert!(h.engine.view_is_mapped(w.view));
}

#[test]
fn test_role_requires_live_shell_object() {
    let mut h = Harness::new();
    let w = h.toplevel(false);
    h.shell
        .shell_surface_resource_destroyed(&mut h.engine, w.surface, w.shell_key);

    let err = h
        .shell
        .assign_popup_role(w.surface, w.shell_key)
        .unwrap_err();
    assert_eq!(err, ShellError::NotConstructed { surface: w.surface });
}

#[test]
fn test_second_shell_object_is_rejected() {
    let mut h = Harness::new();
    let w = h.toplevel(false);
    let views = h.engine.view_count();

    let err = h
        .shell
        .attach_shell_surface(&mut h.engine, w.surface)
        .unwrap_err();
    assert_eq!(err, ShellError::AlreadyConstructed { surface: w.surface });
    assert_eq!(h.engine.view_count(), views);
}

#[test]
fn test_attach_on_unknown_surface() {
    let mut h = Harness::new();
    let err = h
        .shell
        .attach_shell_surface(&mut h.engine, SurfaceId(999))
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::ProtocolViolation);
    assert_eq!(err.surface(), SurfaceId(999));
}

#[test]
fn test_attach_rolls_back_on_foreign_role() {
    let mut h = Harness::new();
    let surface = h.new_surface();
    assert!(h.engine.set_surface_role(surface, "subsurface"));

    let err = h
        .shell
        .attach_shell_surface(&mut h.engine, surface)
        .unwrap_err();
    assert_eq!(
        err,
        ShellError::SurfaceRole {
            surface,
            role: "subsurface".to_string()
        }
    );
    assert_eq!(h.engine.view_count(), 0);
    let companion = h.shell.surface(surface).unwrap();
    assert!(companion.view().is_none());
    assert!(companion.shell_resource().is_none());
    assert!(!companion.commit_subscribed());
}

#[test]
fn test_view_exhaustion_is_resource_error() {
    let mut h = Harness::with_engine(HeadlessCompositor::with_view_limit(1));
    h.toplevel(false);
    let surface = h.new_surface();

    let err = h
        .shell
        .attach_shell_surface(&mut h.engine, surface)
        .unwrap_err();
    assert_eq!(err.class(), ErrorClass::ResourceExhaustion);
    assert!(h.shell.surface(surface).unwrap().shell_resource().is_none());
}

#[test]
fn test_stacking_tie_break() {
    let mut h = Harness::new();
    // New views enter at the front, so create back to front
    let c = h.toplevel(true);
    let b = h.toplevel(false);
    let a = h.toplevel(false);
    h.shell.set_focus_skip(a.surface, true).unwrap();
    h.run_idle();

    assert_eq!(h.engine.views(), vec![a.view, b.view, c.view]);
    assert_eq!(h.shell.top_mapped(), Some(a.view));
    assert_eq!(h.shell.focus(), Some(b.view));
    assert_eq!(h.shell.top_visible(), Some(c.view));
}

#[test]
fn test_burst_publishes_each_change_once() {
    let mut h = Harness::new();
    h.toplevel(true);
    h.toplevel(true);
    let front = h.toplevel(true);
    assert_eq!(h.idle.scheduled(), 1);

    h.run_idle();
    assert_eq!(
        h.take_published(),
        vec![
            Published::Top(Some(front.view)),
            Published::Focus(Some(front.view)),
        ]
    );
    assert!(!h.shell.reconciliation_pending());

    // Same final state after another burst: nothing published
    h.commit(front.surface);
    h.commit(front.surface);
    h.run_idle();
    assert!(h.take_published().is_empty());
}

#[test]
fn test_top_change_damages_every_output() {
    let mut h = Harness::new();
    let second = h.engine.add_output(OutputInfo {
        name: "HEADLESS-2".to_string(),
        width: 800,
        height: 600,
        refresh_mhz: 60_000,
    });
    h.engine.clear_damage();

    h.toplevel(false);
    h.run_idle();
    assert!(h.engine.output_damaged(h.output));
    assert!(h.engine.output_damaged(second));

    h.engine.clear_damage();
    h.run_idle();
    assert!(!h.engine.output_damaged(h.output));
}

#[test]
fn test_focus_skip_moves_focus() {
    let mut h = Harness::new();
    let back = h.toplevel(false);
    let front = h.toplevel(false);
    h.run_idle();
    h.take_published();

    h.shell.set_focus_skip(front.surface, true).unwrap();
    h.run_idle();
    assert_eq!(h.shell.focus(), Some(back.view));
    assert_eq!(h.shell.top_mapped(), Some(front.view));
    assert_eq!(h.take_published(), vec![Published::Focus(Some(back.view))]);

    // Repeating the request changes nothing
    h.shell.set_focus_skip(front.surface, true).unwrap();
    assert!(!h.shell.reconciliation_pending());
}

#[test]
fn test_activate_raises_and_swaps_visibility() {
    let mut h = Harness::new();
    let back = h.toplevel(true);
    let front = h.toplevel(true);
    let (back_sink, _) = h.bind_sink(back.surface);
    let (front_sink, _) = h.bind_sink(front.surface);
    h.run_idle();
    assert_eq!(*front_sink.0.borrow(), vec![Visibility::Unobscured]);
    assert!(back_sink.0.borrow().is_empty());

    h.shell.activate(&mut h.engine, back.surface).unwrap();
    h.run_idle();

    assert_eq!(h.engine.views()[0], back.view);
    assert_eq!(h.shell.top_visible(), Some(back.view));
    assert_eq!(
        *front_sink.0.borrow(),
        vec![Visibility::Unobscured, Visibility::FullyObscured]
    );
    assert_eq!(*back_sink.0.borrow(), vec![Visibility::Unobscured]);
}

#[test]
fn test_activate_without_view_is_harmless() {
    let mut h = Harness::new();
    let surface = h.new_surface();
    h.shell.activate(&mut h.engine, surface).unwrap();
    assert!(!h.shell.reconciliation_pending());

    let err = h.shell.activate(&mut h.engine, SurfaceId(4242)).unwrap_err();
    assert_eq!(err, ShellError::MissingCompanion { surface: SurfaceId(4242) });
}

#[test]
fn test_set_visibility_is_idempotent() {
    let mut h = Harness::new();
    let surface = h.new_surface();
    let (sink, _) = h.bind_sink(surface);

    assert!(h.shell.set_visibility(surface, Visibility::Unobscured));
    assert!(!h.shell.set_visibility(surface, Visibility::Unobscured));
    assert_eq!(*sink.0.borrow(), vec![Visibility::Unobscured]);
}

#[test]
fn test_late_visibility_bind_flushes_current_state() {
    let mut h = Harness::new();
    let w = h.toplevel(true);
    h.run_idle();
    assert_eq!(
        h.shell.surface(w.surface).unwrap().visibility(),
        Visibility::Unobscured
    );

    let (sink, _) = h.bind_sink(w.surface);
    assert_eq!(*sink.0.borrow(), vec![Visibility::Unobscured]);

    let hidden = h.toplevel(false);
    let (quiet, _) = h.bind_sink(hidden.surface);
    assert!(quiet.0.borrow().is_empty());
}

#[test]
fn test_unmapped_view_becomes_fully_obscured() {
    let mut h = Harness::new();
    let w = h.toplevel(true);
    let (sink, _) = h.bind_sink(w.surface);
    h.run_idle();

    h.shell
        .role_resource_destroyed(&mut h.engine, w.surface, w.role_key);
    h.run_idle();

    assert_eq!(h.shell.top_visible(), None);
    assert_eq!(
        *sink.0.borrow(),
        vec![Visibility::Unobscured, Visibility::FullyObscured]
    );
}

#[test]
fn test_visibility_object_destruction_is_keyed() {
    let mut h = Harness::new();
    let surface = h.new_surface();
    let (_first, first_key) = h.bind_sink(surface);
    let (second, second_key) = h.bind_sink(surface);

    // The replaced object going away must not unbind the live one
    h.shell.visibility_resource_destroyed(surface, first_key);
    assert_eq!(
        h.shell.surface(surface).unwrap().visibility_resource(),
        Some(second_key)
    );
    h.shell.set_visibility(surface, Visibility::Unobscured);
    assert_eq!(*second.0.borrow(), vec![Visibility::Unobscured]);

    h.shell.visibility_resource_destroyed(surface, second_key);
    assert!(h.shell.surface(surface).unwrap().visibility_resource().is_none());
}

#[test]
fn test_outer_destruction_tears_down_before_clearing() {
    let mut h = Harness::new();
    let w = h.toplevel(true);
    h.shell.set_focus_skip(w.surface, true).unwrap();
    h.run_idle();
    h.take_published();

    h.shell
        .shell_surface_resource_destroyed(&mut h.engine, w.surface, w.shell_key);
    h.pump();

    assert!(h.engine.views().is_empty());
    assert!(h.shell.reconciliation_pending());
    // Cached slots drop the removed view before the pass runs
    assert_eq!(h.shell.top_mapped(), None);
    assert_eq!(h.shell.top_visible(), None);

    let companion = h.shell.surface(w.surface).unwrap();
    assert!(companion.shell_resource().is_none());
    assert!(companion.view().is_none());
    assert!(!companion.skip_focus());
    assert!(!companion.commit_subscribed());
    assert_eq!(companion.visibility(), Visibility::FullyObscured);
    assert!(companion
        .pending_updates()
        .contains(PendingUpdates::SURFACE_TYPE_CHANGED));

    // Late calls through the dead objects are harmless
    h.shell.ack_configure(w.surface, w.shell_key, 99);
    assert_eq!(h.shell.surface(w.surface).unwrap().last_ack_configure(), None);
    h.shell
        .shell_surface_resource_destroyed(&mut h.engine, w.surface, w.shell_key);
    h.shell
        .role_resource_destroyed(&mut h.engine, w.surface, w.role_key);
    assert!(h.shell.surface(w.surface).unwrap().role().is_none());

    h.commit(w.surface);
    h.run_idle();
    assert!(h.take_published().is_empty());
}

#[test]
fn test_surface_removal_detaches_everything() {
    let mut h = Harness::new();
    let w = h.toplevel(true);
    let (sink, vis_key) = h.bind_sink(w.surface);
    h.run_idle();
    h.take_published();

    h.engine.destroy_surface(w.surface);
    h.pump();

    assert!(h.shell.surface(w.surface).is_none());
    assert!(h.engine.views().is_empty());
    assert_eq!(h.shell.focus(), None);

    h.shell
        .role_resource_destroyed(&mut h.engine, w.surface, w.role_key);
    h.shell
        .shell_surface_resource_destroyed(&mut h.engine, w.surface, w.shell_key);
    h.shell.visibility_resource_destroyed(w.surface, vis_key);

    h.run_idle();
    // The caches were already cleared, so the pass has nothing to publish
    assert!(h.take_published().is_empty());
    assert_eq!(*sink.0.borrow(), vec![Visibility::Unobscured]);
}

#[test]
fn test_ack_configure_records_serial() {
    let mut h = Harness::new();
    let w = h.toplevel(false);
    h.shell.ack_configure(w.surface, w.shell_key, 5);
    h.shell.ack_configure(w.surface, w.shell_key, 3);
    assert_eq!(
        h.shell.surface(w.surface).unwrap().last_ack_configure(),
        Some(5)
    );
}

#[test]
fn test_global_unbind_only_clears_matching_key() {
    let mut h = Harness::new();
    let first = h.shell.global_bound(ShellGlobal::Policy);
    let second = h.shell.global_bound(ShellGlobal::Policy);

    h.shell.global_unbound(ShellGlobal::Policy, first);
    assert_eq!(h.shell.bound_global(ShellGlobal::Policy), Some(second));

    h.shell.global_unbound(ShellGlobal::Policy, second);
    assert_eq!(h.shell.bound_global(ShellGlobal::Policy), None);
    assert_eq!(h.shell.bound_global(ShellGlobal::XdgShell), None);
}

#[test]
fn test_shutdown_cancels_pending_pass() {
    let mut h = Harness::new();
    h.toplevel(false);
    assert!(h.shell.reconciliation_pending());

    h.shell.shutdown();
    assert!(!h.shell.reconciliation_pending());
    assert_eq!(h.idle.cancelled(), 1);
}
