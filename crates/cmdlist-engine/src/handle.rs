//! Opaque ids handed out by devices and collaborators.
//!
//! All handles are plain `u32` newtypes. Their numbering is owned by whoever
//! created them; comparing handles from different creators is meaningless.

use std::fmt;

/// Logical shader program id, as known to the program collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramId(pub u32);

/// Compiled program handle returned by the program collaborator.
///
/// A reload produces new handles for the same [`ProgramId`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramHandle(pub u32);

/// Framebuffer object owned by a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferId(pub u32);

/// Captured pipeline state object.
///
/// Driver-backed and host-simulated state objects live in separate id spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateObjectId(pub u32);

/// Device-resident copy of a token stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenBufferId(pub u32);

/// Driver-compiled command list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CommandListId(pub u32);

impl fmt::Display for StateObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

impl fmt::Display for FramebufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fbo#{}", self.0)
    }
}
