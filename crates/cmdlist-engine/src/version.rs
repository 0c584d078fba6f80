//! Change versions gating compiled replay data.

/// Snapshot of the two invalidation counters.
///
/// Compiled tokens, segments and command lists are valid iff the version they
/// were built against equals the live version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ChangeVersion {
    /// Bumped on every shader program reload.
    pub program: u32,
    /// Bumped whenever a render target's backing textures are replaced.
    pub target: u32,
}

impl ChangeVersion {
    pub const fn new(program: u32, target: u32) -> Self {
        Self { program, target }
    }

    #[inline]
    pub fn program_changed(self, live: ChangeVersion) -> bool {
        self.program != live.program
    }

    #[inline]
    pub fn target_changed(self, live: ChangeVersion) -> bool {
        self.target != live.target
    }
}

/// Owner of the live [`ChangeVersion`].
///
/// Counters only move forward. Collaborators bump them; the replay subsystem
/// only ever reads [`ChangeTracker::current`].
#[derive(Debug, Default)]
pub struct ChangeTracker {
    current: ChangeVersion,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn current(&self) -> ChangeVersion {
        self.current
    }

    pub fn bump_program(&mut self) -> ChangeVersion {
        self.current.program = self.current.program.wrapping_add(1);
        self.current
    }

    pub fn bump_target(&mut self) -> ChangeVersion {
        self.current.target = self.current.target.wrapping_add(1);
        self.current
    }
}
