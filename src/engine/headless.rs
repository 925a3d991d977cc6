//! In-memory compositor engine
//!
//! Tracks surfaces, a view stack, outputs and a single keyboard without any
//! rendering. Every lifecycle change is queued as an [`EngineEvent`] for the
//! shell to drain.

use super::{Compositor, EngineEvent, OutputId, SurfaceId, ViewId};
use log::{debug, trace, warn};
use std::collections::{HashMap, VecDeque};

/// Static description of a headless output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub refresh_mhz: u32,
}

#[derive(Debug)]
struct OutputRecord {
    id: OutputId,
    info: OutputInfo,
    damaged: bool,
}

#[derive(Debug, Default)]
struct SurfaceRecord {
    role: Option<&'static str>,
    /// `Some(attached)` once the client attached since the last commit.
    pending_buffer: Option<bool>,
    has_buffer: bool,
}

#[derive(Debug)]
struct ViewRecord {
    id: ViewId,
    surface: Option<SurfaceId>,
    mapped: bool,
}

/// Keyboard traffic produced for the focused client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    Enter(ViewId),
    Leave(ViewId),
}

#[derive(Debug, Default)]
pub struct HeadlessCompositor {
    next_id: u64,
    surfaces: HashMap<SurfaceId, SurfaceRecord>,
    /// Front of the stack first.
    views: Vec<ViewRecord>,
    outputs: Vec<OutputRecord>,
    keyboard_focus: Option<ViewId>,
    keyboard_events: Vec<KeyboardEvent>,
    events: VecDeque<EngineEvent>,
    view_limit: Option<usize>,
}

impl HeadlessCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse to allocate more than `limit` live views.
    pub fn with_view_limit(limit: usize) -> Self {
        Self {
            view_limit: Some(limit),
            ..Self::default()
        }
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn add_output(&mut self, info: OutputInfo) -> OutputId {
        let id = OutputId(self.allocate_id());
        debug!(
            "Headless output {} '{}' {}x{}@{}mHz",
            id, info.name, info.width, info.height, info.refresh_mhz
        );
        self.outputs.push(OutputRecord {
            id,
            info,
            damaged: true,
        });
        id
    }

    pub fn output_info(&self, output: OutputId) -> Option<&OutputInfo> {
        self.outputs
            .iter()
            .find(|o| o.id == output)
            .map(|o| &o.info)
    }

    pub fn output_damaged(&self, output: OutputId) -> bool {
        self.outputs
            .iter()
            .any(|o| o.id == output && o.damaged)
    }

    /// Clear the damage flag of every output, as a repaint would.
    pub fn clear_damage(&mut self) {
        for output in &mut self.outputs {
            output.damaged = false;
        }
    }

    pub fn create_surface(&mut self) -> SurfaceId {
        let id = SurfaceId(self.allocate_id());
        self.surfaces.insert(id, SurfaceRecord::default());
        self.events.push_back(EngineEvent::SurfaceAdded(id));
        trace!("Created {}", id);
        id
    }

    pub fn destroy_surface(&mut self, surface: SurfaceId) {
        if self.surfaces.remove(&surface).is_none() {
            warn!("Destroying unknown {}", surface);
            return;
        }
        self.events.push_back(EngineEvent::SurfaceRemoved(surface));
        trace!("Destroyed {}", surface);
    }

    /// Record a pending buffer attachment; `false` detaches.
    pub fn attach_buffer(&mut self, surface: SurfaceId, attached: bool) {
        if let Some(record) = self.surfaces.get_mut(&surface) {
            record.pending_buffer = Some(attached);
        }
    }

    pub fn commit_surface(&mut self, surface: SurfaceId) {
        let Some(record) = self.surfaces.get_mut(&surface) else {
            warn!("Commit on unknown {}", surface);
            return;
        };
        if let Some(attached) = record.pending_buffer.take() {
            record.has_buffer = attached;
        }
        self.events.push_back(EngineEvent::SurfaceCommitted(surface));
    }

    pub fn keyboard_focus(&self) -> Option<ViewId> {
        self.keyboard_focus
    }

    pub fn take_keyboard_events(&mut self) -> Vec<KeyboardEvent> {
        std::mem::take(&mut self.keyboard_events)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    fn view_mut(&mut self, view: ViewId) -> Option<&mut ViewRecord> {
        self.views.iter_mut().find(|v| v.id == view)
    }

    fn view(&self, view: ViewId) -> Option<&ViewRecord> {
        self.views.iter().find(|v| v.id == view)
    }
}

impl Compositor for HeadlessCompositor {
    fn views(&self) -> Vec<ViewId> {
        self.views.iter().map(|v| v.id).collect()
    }

    fn outputs(&self) -> Vec<OutputId> {
        self.outputs.iter().map(|o| o.id).collect()
    }

    fn damage_output(&mut self, output: OutputId) {
        if let Some(record) = self.outputs.iter_mut().find(|o| o.id == output) {
            record.damaged = true;
        }
    }

    fn has_surface(&self, surface: SurfaceId) -> bool {
        self.surfaces.contains_key(&surface)
    }

    fn surface_has_buffer(&self, surface: SurfaceId) -> bool {
        self.surfaces
            .get(&surface)
            .map(|s| s.has_buffer)
            .unwrap_or(false)
    }

    fn surface_role(&self, surface: SurfaceId) -> Option<&str> {
        self.surfaces.get(&surface).and_then(|s| s.role)
    }

    fn set_surface_role(&mut self, surface: SurfaceId, role: &'static str) -> bool {
        match self.surfaces.get_mut(&surface) {
            Some(record) => match record.role {
                Some(existing) => existing == role,
                None => {
                    record.role = Some(role);
                    true
                }
            },
            None => false,
        }
    }

    fn add_view(&mut self) -> Option<ViewId> {
        if let Some(limit) = self.view_limit {
            if self.views.len() >= limit {
                warn!("View limit {} reached", limit);
                return None;
            }
        }
        let id = ViewId(self.allocate_id());
        self.views.insert(
            0,
            ViewRecord {
                id,
                surface: None,
                mapped: false,
            },
        );
        Some(id)
    }

    fn destroy_view(&mut self, view: ViewId) {
        let Some(index) = self.views.iter().position(|v| v.id == view) else {
            return;
        };
        self.views.remove(index);
        if self.keyboard_focus == Some(view) {
            self.keyboard_focus = None;
        }
        self.events.push_back(EngineEvent::ViewRemoved(view));
        trace!("Destroyed {}", view);
    }

    fn view_set_surface(&mut self, view: ViewId, surface: SurfaceId) -> bool {
        if !self.surfaces.contains_key(&surface) {
            return false;
        }
        match self.view_mut(view) {
            Some(record) => {
                record.surface = Some(surface);
                true
            }
            None => false,
        }
    }

    fn view_surface(&self, view: ViewId) -> Option<SurfaceId> {
        self.view(view).and_then(|v| v.surface)
    }

    fn view_is_mapped(&self, view: ViewId) -> bool {
        self.view(view).map(|v| v.mapped).unwrap_or(false)
    }

    fn map_view(&mut self, view: ViewId) {
        if let Some(record) = self.view_mut(view) {
            record.mapped = true;
        }
    }

    fn unmap_view(&mut self, view: ViewId) {
        if let Some(record) = self.view_mut(view) {
            record.mapped = false;
        }
    }

    fn stack_top(&mut self, view: ViewId) {
        if let Some(index) = self.views.iter().position(|v| v.id == view) {
            let record = self.views.remove(index);
            self.views.insert(0, record);
        }
    }

    fn keyboard_leave(&mut self, view: ViewId) {
        self.keyboard_events.push(KeyboardEvent::Leave(view));
    }

    fn keyboard_enter(&mut self, view: ViewId) {
        self.keyboard_events.push(KeyboardEvent::Enter(view));
    }

    fn keyboard_set_focus(&mut self, view: Option<ViewId>) {
        self.keyboard_focus = view;
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }
}
