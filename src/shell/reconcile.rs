//! The deferred reconciliation pass

use super::{Shell, Visibility};
use crate::engine::{Compositor, ViewId};
use log::{debug, trace, warn};

/// Focus, topmost and topmost-visible views derived from the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StackState {
    pub top: Option<ViewId>,
    pub focus: Option<ViewId>,
    pub top_visible: Option<ViewId>,
}

impl StackState {
    fn resolved(&self) -> bool {
        self.top.is_some() && self.focus.is_some() && self.top_visible.is_some()
    }
}

impl Shell {
    pub fn stack_state(&self) -> StackState {
        StackState {
            top: self.top_mapped,
            focus: self.focus,
            top_visible: self.top_visible,
        }
    }

    /// One front-to-back walk of the view stack. Unmapped views are skipped
    /// and marked fully obscured; the first mapped view wins each slot.
    fn scan_stack(&mut self, engine: &dyn Compositor) -> StackState {
        let mut next = StackState::default();

        for view in engine.views() {
            let Some(surface) = engine.view_surface(view) else {
                warn!("Reconcile: {} has no surface", view);
                continue;
            };
            let Some(companion) = self.surfaces.get(&surface) else {
                trace!("Reconcile: {} of {} is not a shell view", view, surface);
                continue;
            };
            let skip_focus = companion.skip_focus;

            if !engine.view_is_mapped(view) {
                self.set_visibility(surface, Visibility::FullyObscured);
                continue;
            }

            if next.top.is_none() {
                next.top = Some(view);
            }
            if next.focus.is_none() && !skip_focus {
                next.focus = Some(view);
            }
            if next.top_visible.is_none() && engine.surface_has_buffer(surface) {
                next.top_visible = Some(view);
            }
            if next.resolved() {
                break;
            }
        }

        next
    }

    /// Recompute the stack state and publish each changed slot exactly once.
    pub fn reconcile(&mut self, engine: &mut dyn Compositor) {
        self.scheduler.begin_pass();

        let previous = self.stack_state();
        let next = self.scan_stack(engine);

        if next.top != previous.top {
            debug!("Top view {:?} -> {:?}", previous.top, next.top);
            self.top_mapped = next.top;
            for observer in &mut self.observers {
                observer.on_top_view_changed(engine, next.top);
            }
            for output in engine.outputs() {
                engine.damage_output(output);
            }
        }

        if next.focus != previous.focus {
            debug!("Focus view {:?} -> {:?}", previous.focus, next.focus);
            self.focus = next.focus;
            for observer in &mut self.observers {
                observer.on_focus_view_changed(engine, next.focus);
            }
        }

        if next.top_visible != previous.top_visible {
            debug!(
                "Top visible view {:?} -> {:?}",
                previous.top_visible, next.top_visible
            );
            if let Some(surface) = previous.top_visible.and_then(|v| engine.view_surface(v)) {
                self.set_visibility(surface, Visibility::FullyObscured);
            }
            if let Some(surface) = next.top_visible.and_then(|v| engine.view_surface(v)) {
                self.set_visibility(surface, Visibility::Unobscured);
            }
            self.top_visible = next.top_visible;
        }
    }
}
