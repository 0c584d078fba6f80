use std::collections::HashMap;

use crate::device::Device;
use crate::handle::StateObjectId;
use crate::token::PrimitiveMode;

use super::{GraphicsState, StateDiff};

#[derive(Debug, Clone)]
struct HostState {
    state: GraphicsState,
    mode: PrimitiveMode,
}

/// Host-side state objects with cached transitions.
///
/// Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct StateSystem {
    states: Vec<Option<HostState>>,
    transitions: HashMap<(StateObjectId, StateObjectId), StateDiff>,
}

impl StateSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates an empty state object.
    pub fn generate(&mut self) -> StateObjectId {
        self.states.push(None);
        StateObjectId(self.states.len() as u32)
    }

    /// Stores a snapshot and drops any cached transition touching `id`.
    pub fn set(&mut self, id: StateObjectId, state: GraphicsState, mode: PrimitiveMode) {
        let slot = self.slot_mut(id);
        *slot = Some(HostState { state, mode });
        self.transitions.retain(|(from, to), _| *from != id && *to != id);
    }

    pub fn get(&self, id: StateObjectId) -> Option<&GraphicsState> {
        self.slot(id).as_ref().map(|s| &s.state)
    }

    pub fn mode(&self, id: StateObjectId) -> Option<PrimitiveMode> {
        self.slot(id).as_ref().map(|s| s.mode)
    }

    /// Precomputes the diff from `from` to `to`.
    pub fn prepare_transition(&mut self, from: StateObjectId, to: StateObjectId) {
        let diff = StateDiff::between(self.expect_state(from), self.expect_state(to));
        log::trace!("prepared {from} -> {to}: {} changes", diff.len());
        self.transitions.insert((from, to), diff);
    }

    pub fn transition(&self, from: StateObjectId, to: StateObjectId) -> Option<&StateDiff> {
        self.transitions.get(&(from, to))
    }

    /// Applies `to`, assuming the device currently holds `from`.
    ///
    /// Uses a prepared transition when there is one. With no `from`, the
    /// full state is applied.
    pub fn apply(&self, device: &mut dyn Device, to: StateObjectId, from: Option<StateObjectId>) {
        match from {
            Some(from) if from == to => {}
            Some(from) => match self.transition(from, to) {
                Some(diff) => diff.apply(device),
                None => StateDiff::between(self.expect_state(from), self.expect_state(to)).apply(device),
            },
            None => StateDiff::full(self.expect_state(to)).apply(device),
        }
    }

    fn expect_state(&self, id: StateObjectId) -> &GraphicsState {
        self.get(id)
            .unwrap_or_else(|| panic!("{id} used before it was captured"))
    }

    fn slot(&self, id: StateObjectId) -> &Option<HostState> {
        id.0
            .checked_sub(1)
            .and_then(|i| self.states.get(i as usize))
            .unwrap_or_else(|| panic!("{id} was not generated by this state system"))
    }

    fn slot_mut(&mut self, id: StateObjectId) -> &mut Option<HostState> {
        id.0
            .checked_sub(1)
            .and_then(|i| self.states.get_mut(i as usize))
            .unwrap_or_else(|| panic!("{id} was not generated by this state system"))
    }
}
