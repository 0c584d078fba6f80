//! Shader program collaborator.
//!
//! Program compilation lives outside this crate. The replay subsystem only
//! needs to map logical ids to current handles and to know whether the last
//! reload succeeded.

use crate::handle::{ProgramHandle, ProgramId};
use crate::version::ChangeTracker;

pub trait ProgramSource {
    /// Current handle for a logical program.
    fn program(&self, id: ProgramId) -> ProgramHandle;

    /// False while any program failed to compile.
    fn programs_valid(&self) -> bool;
}

/// Fixed table of program handles indexed by [`ProgramId`].
#[derive(Debug, Clone)]
pub struct ProgramSet {
    handles: Vec<ProgramHandle>,
    valid: bool,
}

impl ProgramSet {
    pub fn new(handles: Vec<ProgramHandle>) -> Self {
        Self {
            handles,
            valid: true,
        }
    }

    /// Installs freshly compiled handles and bumps the program version.
    pub fn reload(&mut self, handles: Vec<ProgramHandle>, tracker: &mut ChangeTracker) {
        debug_assert_eq!(
            handles.len(),
            self.handles.len(),
            "a reload must provide a handle for every program"
        );
        self.handles = handles;
        self.valid = true;
        let version = tracker.bump_program();
        log::info!("programs reloaded, program version {}", version.program);
    }

    /// Marks the set invalid, e.g. after a failed compile.
    pub fn invalidate(&mut self) {
        self.valid = false;
    }
}

impl ProgramSource for ProgramSet {
    fn program(&self, id: ProgramId) -> ProgramHandle {
        self.handles
            .get(id.0 as usize)
            .copied()
            .unwrap_or_else(|| panic!("no program registered for {id:?}"))
    }

    fn programs_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_swaps_handles_and_bumps_version() {
        let mut tracker = ChangeTracker::new();
        let mut set = ProgramSet::new(vec![ProgramHandle(1), ProgramHandle(2)]);
        set.invalidate();
        assert!(!set.programs_valid());

        set.reload(vec![ProgramHandle(3), ProgramHandle(4)], &mut tracker);
        assert!(set.programs_valid());
        assert_eq!(set.program(ProgramId(1)), ProgramHandle(4));
        assert_eq!(tracker.current().program, 1);
    }
}
