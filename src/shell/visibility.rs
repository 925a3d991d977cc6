//! Visibility notifications for the policy protocol

use super::surface::VisibilityBinding;
use super::{ResourceKey, Shell, ShellError, ShellResult, Visibility, VisibilitySink};
use crate::engine::SurfaceId;
use log::{debug, trace, warn};

impl Shell {
    /// Update the cached visibility and notify a bound object. Returns
    /// whether a notification went out.
    pub fn set_visibility(&mut self, surface: SurfaceId, visibility: Visibility) -> bool {
        let Some(companion) = self.surfaces.get_mut(&surface) else {
            warn!("Visibility for {} without shell companion", surface);
            return false;
        };
        if companion.visibility == visibility {
            trace!("{} already {:?}", surface, visibility);
            return false;
        }

        companion.visibility = visibility;
        debug!("{} visibility {:?}", surface, visibility);
        match &companion.visibility_resource {
            Some(binding) => {
                binding.sink.send(visibility);
                true
            }
            None => false,
        }
    }

    /// Bind a visibility object under `key` (from [`Shell::allocate_key`]).
    /// A non-default state is sent right away so a late binder sees the
    /// current value.
    pub fn bind_visibility(
        &mut self,
        surface: SurfaceId,
        key: ResourceKey,
        sink: Box<dyn VisibilitySink>,
    ) -> ShellResult<()> {
        let companion = self
            .surfaces
            .get_mut(&surface)
            .ok_or(ShellError::MissingCompanion { surface })?;

        if companion.visibility != Visibility::FullyObscured {
            sink.send(companion.visibility);
        }
        if let Some(previous) = companion.visibility_resource.replace(VisibilityBinding { key, sink }) {
            debug!("{} visibility object {} replaced", surface, previous.key);
        }
        Ok(())
    }

    pub fn visibility_resource_destroyed(&mut self, surface: SurfaceId, key: ResourceKey) {
        let Some(companion) = self.surfaces.get_mut(&surface) else {
            return;
        };
        if companion.visibility_resource.as_ref().map(|b| b.key) == Some(key) {
            companion.visibility_resource = None;
            debug!("{} visibility object {} destroyed", surface, key);
        }
    }
}
