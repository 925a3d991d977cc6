//! Shell error taxonomy

use crate::engine::SurfaceId;
use thiserror::Error;

/// How an error surfaces to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed client request. The client gets a protocol error.
    ProtocolViolation,
    /// Allocation failure. The client gets a "no memory" signal.
    ResourceExhaustion,
    /// Teardown raced a late event. Logged and dropped.
    InternalInconsistency,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ShellError {
    #[error("{surface} already has a live role object")]
    RoleConflict { surface: SurfaceId },

    #[error("{surface} has no shell companion")]
    MissingCompanion { surface: SurfaceId },

    #[error("{surface} already has a live shell surface object")]
    AlreadyConstructed { surface: SurfaceId },

    #[error("{surface} already carries role '{role}'")]
    SurfaceRole { surface: SurfaceId, role: String },

    #[error("{surface} has no shell surface object")]
    NotConstructed { surface: SurfaceId },

    #[error("failed to allocate a view for {surface}")]
    ViewAllocation { surface: SurfaceId },

    #[error("failed to bind a view to {surface}")]
    NoView { surface: SurfaceId },
}

impl ShellError {
    pub fn class(&self) -> ErrorClass {
        match self {
            ShellError::RoleConflict { .. }
            | ShellError::MissingCompanion { .. }
            | ShellError::AlreadyConstructed { .. }
            | ShellError::SurfaceRole { .. }
            | ShellError::NotConstructed { .. } => ErrorClass::ProtocolViolation,
            ShellError::ViewAllocation { .. } => ErrorClass::ResourceExhaustion,
            ShellError::NoView { .. } => ErrorClass::InternalInconsistency,
        }
    }

    pub fn surface(&self) -> SurfaceId {
        match self {
            ShellError::RoleConflict { surface }
            | ShellError::MissingCompanion { surface }
            | ShellError::AlreadyConstructed { surface }
            | ShellError::SurfaceRole { surface, .. }
            | ShellError::NotConstructed { surface }
            | ShellError::ViewAllocation { surface }
            | ShellError::NoView { surface } => *surface,
        }
    }
}

pub type ShellResult<T> = std::result::Result<T, ShellError>;
