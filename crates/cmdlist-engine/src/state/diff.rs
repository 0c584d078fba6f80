use crate::device::Device;
use crate::handle::ProgramHandle;

use super::{GraphicsState, MAX_VERTEX_ATTRIBUTES, VertexAttribute};

/// Fixed-function toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    DepthTest,
    CullFace,
}

/// One field-level state update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    UseProgram(Option<ProgramHandle>),
    SetCapability(Capability, bool),
    SetAttribute(u32, Option<VertexAttribute>),
    SetVertexStride(u32),
}

impl StateChange {
    pub fn apply(&self, device: &mut dyn Device) {
        match *self {
            StateChange::UseProgram(program) => device.use_program(program),
            StateChange::SetCapability(cap, enabled) => device.set_capability(cap, enabled),
            StateChange::SetAttribute(location, attr) => device.set_vertex_attribute(location, attr),
            StateChange::SetVertexStride(stride) => device.set_vertex_stride(stride),
        }
    }
}

/// Ordered list of changes turning one state into another.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StateDiff {
    changes: Vec<StateChange>,
}

impl StateDiff {
    /// Only the fields that differ between `from` and `to`.
    pub fn between(from: &GraphicsState, to: &GraphicsState) -> Self {
        let mut changes = Vec::new();

        if from.program != to.program {
            changes.push(StateChange::UseProgram(to.program));
        }
        if from.depth_test != to.depth_test {
            changes.push(StateChange::SetCapability(Capability::DepthTest, to.depth_test));
        }
        if from.cull_face != to.cull_face {
            changes.push(StateChange::SetCapability(Capability::CullFace, to.cull_face));
        }
        for location in 0..MAX_VERTEX_ATTRIBUTES {
            if from.attributes[location] != to.attributes[location] {
                changes.push(StateChange::SetAttribute(location as u32, to.attributes[location]));
            }
        }
        if from.vertex_stride != to.vertex_stride {
            changes.push(StateChange::SetVertexStride(to.vertex_stride));
        }

        Self { changes }
    }

    /// Every field of `to`, for when the current state is unknown.
    pub fn full(to: &GraphicsState) -> Self {
        let mut changes = vec![
            StateChange::UseProgram(to.program),
            StateChange::SetCapability(Capability::DepthTest, to.depth_test),
            StateChange::SetCapability(Capability::CullFace, to.cull_face),
        ];
        for (location, attr) in to.attributes.iter().enumerate() {
            changes.push(StateChange::SetAttribute(location as u32, *attr));
        }
        changes.push(StateChange::SetVertexStride(to.vertex_stride));
        Self { changes }
    }

    #[inline]
    pub fn changes(&self) -> &[StateChange] {
        &self.changes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn apply(&self, device: &mut dyn Device) {
        for change in &self.changes {
            change.apply(device);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::default_vertex_layout;

    fn state(program: u32) -> GraphicsState {
        GraphicsState {
            program: Some(ProgramHandle(program)),
            depth_test: true,
            cull_face: true,
            attributes: default_vertex_layout(),
            vertex_stride: 32,
        }
    }

    #[test]
    fn diff_of_program_swap_is_one_change() {
        let diff = StateDiff::between(&state(1), &state(2));
        assert_eq!(diff.changes(), &[StateChange::UseProgram(Some(ProgramHandle(2)))]);
    }

    #[test]
    fn identical_states_have_empty_diff() {
        assert!(StateDiff::between(&state(1), &state(1)).is_empty());
    }

    #[test]
    fn full_covers_every_field() {
        let diff = StateDiff::full(&state(1));
        assert_eq!(diff.len(), 3 + MAX_VERTEX_ATTRIBUTES + 1);
    }

    #[test]
    fn diff_to_default_disables_everything() {
        let diff = StateDiff::between(&state(1), &GraphicsState::default());
        assert!(diff.changes().contains(&StateChange::UseProgram(None)));
        assert!(diff
            .changes()
            .contains(&StateChange::SetCapability(Capability::DepthTest, false)));
        assert!(diff.changes().contains(&StateChange::SetAttribute(0, None)));
    }
}
