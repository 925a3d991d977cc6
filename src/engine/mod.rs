//! Compositor engine interface
//!
//! The shell never owns surfaces, views or outputs. It reaches them through
//! the narrow [`Compositor`] API below and learns about object lifecycle by
//! draining [`EngineEvent`]s. [`HeadlessCompositor`] is the in-memory engine
//! the server runs on.

use std::fmt;

pub mod headless;

pub use headless::HeadlessCompositor;

macro_rules! engine_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

engine_id!(
    /// Identity of a compositor surface. Never reused within one engine.
    SurfaceId,
    "surface"
);
engine_id!(
    /// Identity of a stackable view.
    ViewId,
    "view"
);
engine_id!(
    /// Identity of an output target.
    OutputId,
    "output"
);

/// Object lifecycle notifications produced by the engine, drained in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    SurfaceAdded(SurfaceId),
    SurfaceRemoved(SurfaceId),
    ViewRemoved(ViewId),
    SurfaceCommitted(SurfaceId),
}

/// Object, output and keyboard API the shell consumes.
pub trait Compositor {
    /// Views in stacking order, front first.
    fn views(&self) -> Vec<ViewId>;
    fn outputs(&self) -> Vec<OutputId>;
    /// Mark the whole area of `output` as damaged.
    fn damage_output(&mut self, output: OutputId);

    fn has_surface(&self, surface: SurfaceId) -> bool;
    fn surface_has_buffer(&self, surface: SurfaceId) -> bool;
    fn surface_role(&self, surface: SurfaceId) -> Option<&str>;
    /// Assign a role string. Fails when the surface is unknown or carries a
    /// different role already.
    fn set_surface_role(&mut self, surface: SurfaceId, role: &'static str) -> bool;

    /// Create an unmapped view at the front of the stack. `None` when the
    /// engine cannot allocate another one.
    fn add_view(&mut self) -> Option<ViewId>;
    fn destroy_view(&mut self, view: ViewId);
    fn view_set_surface(&mut self, view: ViewId, surface: SurfaceId) -> bool;
    fn view_surface(&self, view: ViewId) -> Option<SurfaceId>;
    fn view_is_mapped(&self, view: ViewId) -> bool;
    fn map_view(&mut self, view: ViewId);
    fn unmap_view(&mut self, view: ViewId);
    fn stack_top(&mut self, view: ViewId);

    fn keyboard_leave(&mut self, view: ViewId);
    fn keyboard_enter(&mut self, view: ViewId);
    fn keyboard_set_focus(&mut self, view: Option<ViewId>);

    fn poll_event(&mut self) -> Option<EngineEvent>;
}
