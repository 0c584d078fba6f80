use crate::device::{CommandListExt, Device};
use crate::scene::{PipelineVariant, VariantStates};
use crate::token::PrimitiveMode;

use super::StateSystem;

/// State objects for the two variants, however they are realized.
pub trait PipelineState {
    fn states(&self) -> VariantStates;

    /// Snapshots the device's current state as `variant`.
    fn capture(&mut self, device: &mut dyn Device, variant: PipelineVariant, mode: PrimitiveMode);

    /// Called once after every variant was captured.
    fn prepare_transitions(&mut self) {}
}

/// Opaque state objects compiled by the driver.
#[derive(Debug)]
pub struct DriverStates {
    states: VariantStates,
}

impl DriverStates {
    pub fn create(ext: &mut dyn CommandListExt) -> Self {
        let simple = ext.create_state();
        let geometry = ext.create_state();
        Self {
            states: VariantStates { simple, geometry },
        }
    }
}

impl PipelineState for DriverStates {
    fn states(&self) -> VariantStates {
        self.states
    }

    fn capture(&mut self, device: &mut dyn Device, variant: PipelineVariant, mode: PrimitiveMode) {
        let id = self.states.get(variant);
        let ext = device
            .command_list()
            .expect("driver states are only created on devices with command-list support");
        ext.capture_state(id, mode);
    }
}

/// Field-by-field snapshots with precomputed transitions both ways.
#[derive(Debug)]
pub struct HostStates {
    system: StateSystem,
    states: VariantStates,
}

impl Default for HostStates {
    fn default() -> Self {
        Self::new()
    }
}

impl HostStates {
    pub fn new() -> Self {
        let mut system = StateSystem::new();
        let simple = system.generate();
        let geometry = system.generate();
        Self {
            system,
            states: VariantStates { simple, geometry },
        }
    }

    #[inline]
    pub fn system(&self) -> &StateSystem {
        &self.system
    }
}

impl PipelineState for HostStates {
    fn states(&self) -> VariantStates {
        self.states
    }

    fn capture(&mut self, device: &mut dyn Device, variant: PipelineVariant, mode: PrimitiveMode) {
        let state = device.read_state();
        self.system.set(self.states.get(variant), state, mode);
    }

    fn prepare_transitions(&mut self) {
        let VariantStates { simple, geometry } = self.states;
        self.system.prepare_transition(simple, geometry);
        self.system.prepare_transition(geometry, simple);
    }
}
