//! Input routing for the single default seat
//!
//! Follows the shell's published focus and topmost views: keyboard focus
//! moves with leave/enter pairs on the engine keyboard, and the key router
//! always knows which views should receive routed keys.

use crate::config::SeatConfig;
use crate::engine::{Compositor, ViewId};
use crate::shell::ViewObserver;
use log::{debug, info};

/// Destinations for routed key events.
#[derive(Debug, Default)]
pub struct KeyRouter {
    focus: Option<ViewId>,
    top: Option<ViewId>,
}

impl KeyRouter {
    pub fn set_focus_view(&mut self, view: Option<ViewId>) {
        self.focus = view;
    }

    pub fn set_top_view(&mut self, view: Option<ViewId>) {
        self.top = view;
    }

    pub fn focus_view(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn top_view(&self) -> Option<ViewId> {
        self.top
    }
}

#[derive(Debug)]
pub struct InputRouter {
    seat_name: String,
    focus: Option<ViewId>,
    top: Option<ViewId>,
    key_router: KeyRouter,
}

impl InputRouter {
    pub fn new(config: &SeatConfig) -> Self {
        info!("⌨️  Input router on seat '{}'", config.name);
        Self {
            seat_name: config.name.clone(),
            focus: None,
            top: None,
            key_router: KeyRouter::default(),
        }
    }

    pub fn seat_name(&self) -> &str {
        &self.seat_name
    }

    pub fn focus_view(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn top_view(&self) -> Option<ViewId> {
        self.top
    }

    pub fn key_router(&self) -> &KeyRouter {
        &self.key_router
    }

    pub fn shutdown(&mut self) {
        debug!("Input router on '{}' shut down", self.seat_name);
        self.focus = None;
        self.top = None;
        self.key_router = KeyRouter::default();
    }
}

impl ViewObserver for InputRouter {
    fn on_focus_view_changed(&mut self, engine: &mut dyn Compositor, view: Option<ViewId>) {
        if self.focus != view {
            if let Some(old) = self.focus {
                engine.keyboard_leave(old);
            }
            engine.keyboard_set_focus(view);
            if let Some(new) = view {
                engine.keyboard_enter(new);
            }
            debug!("Seat '{}' keyboard focus {:?} -> {:?}", self.seat_name, self.focus, view);
            self.focus = view;
        }
        self.key_router.set_focus_view(view);
    }

    fn on_top_view_changed(&mut self, _engine: &mut dyn Compositor, view: Option<ViewId>) {
        if self.top == view {
            return;
        }
        self.top = view;
        self.key_router.set_top_view(view);
    }

    fn on_view_removed(&mut self, view: ViewId) {
        // The engine already dropped keyboard focus from a destroyed view
        if self.focus == Some(view) {
            self.focus = None;
            self.key_router.set_focus_view(None);
        }
        if self.top == Some(view) {
            self.top = None;
            self.key_router.set_top_view(None);
        }
    }
}
