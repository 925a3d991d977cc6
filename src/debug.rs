//! Introspection of published focus and topmost changes

use crate::engine::{Compositor, ViewId};
use crate::shell::ViewObserver;
use log::debug;
use std::collections::VecDeque;

const HISTORY_LIMIT: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugChange {
    Focus(Option<ViewId>),
    Top(Option<ViewId>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugRecord {
    pub sequence: u64,
    pub change: DebugChange,
}

#[derive(Debug, Default)]
pub struct DebugTracker {
    focus: Option<ViewId>,
    top: Option<ViewId>,
    sequence: u64,
    history: VecDeque<DebugRecord>,
}

impl DebugTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus_view(&self) -> Option<ViewId> {
        self.focus
    }

    pub fn top_view(&self) -> Option<ViewId> {
        self.top
    }

    /// Oldest first, at most 256 entries.
    pub fn history(&self) -> impl Iterator<Item = &DebugRecord> {
        self.history.iter()
    }

    fn record(&mut self, change: DebugChange) {
        self.sequence += 1;
        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(DebugRecord {
            sequence: self.sequence,
            change,
        });
        debug!("[debug #{}] {:?}", self.sequence, change);
    }
}

impl ViewObserver for DebugTracker {
    fn on_top_view_changed(&mut self, _engine: &mut dyn Compositor, view: Option<ViewId>) {
        self.top = view;
        self.record(DebugChange::Top(view));
    }

    fn on_focus_view_changed(&mut self, _engine: &mut dyn Compositor, view: Option<ViewId>) {
        self.focus = view;
        self.record(DebugChange::Focus(view));
    }

    // The shell drops a removed view from its slots without publishing, so
    // the cleared slots are recorded here.
    fn on_view_removed(&mut self, view: ViewId) {
        if self.top == Some(view) {
            self.top = None;
            self.record(DebugChange::Top(None));
        }
        if self.focus == Some(view) {
            self.focus = None;
            self.record(DebugChange::Focus(None));
        }
    }
}
