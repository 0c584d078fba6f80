use crate::device::Device;
use crate::handle::FramebufferId;
use crate::program::ProgramSource;
use crate::scene::{PipelineVariant, policy};
use crate::token::PrimitiveMode;

use super::{
    Capability, MAX_VERTEX_ATTRIBUTES, PipelineState, VERTEX_STRIDE, default_vertex_layout,
};

/// Depth test, back-face culling and the interleaved vertex layout.
pub fn apply_scene_defaults(device: &mut dyn Device) {
    device.set_capability(Capability::DepthTest, true);
    device.set_capability(Capability::CullFace, true);
    for (location, attr) in default_vertex_layout().into_iter().enumerate() {
        device.set_vertex_attribute(location as u32, attr);
    }
    device.set_vertex_stride(VERTEX_STRIDE);
}

/// Undoes [`apply_scene_defaults`] and unbinds the program, leaving the
/// device in [`GraphicsState::default`](super::GraphicsState).
pub fn reset_scene_defaults(device: &mut dyn Device) {
    device.use_program(None);
    for location in 0..MAX_VERTEX_ATTRIBUTES {
        device.set_vertex_attribute(location as u32, None);
    }
    device.set_vertex_stride(0);
    device.set_capability(Capability::DepthTest, false);
    device.set_capability(Capability::CullFace, false);
}

/// Captures both pipeline variants into every backend in `targets`.
///
/// Each variant is captured with the scene defaults applied and its program
/// bound; transitions are prepared afterwards. Device state is reset when
/// done.
pub fn capture_variants(
    device: &mut dyn Device,
    programs: &dyn ProgramSource,
    framebuffer: FramebufferId,
    mode: PrimitiveMode,
    targets: &mut [&mut dyn PipelineState],
) {
    device.bind_framebuffer(Some(framebuffer));
    apply_scene_defaults(device);

    for variant in PipelineVariant::ALL {
        device.use_program(Some(programs.program(policy(variant).program)));
        for target in targets.iter_mut() {
            target.capture(device, variant, mode);
        }
    }

    for target in targets.iter_mut() {
        target.prepare_transitions();
    }

    reset_scene_defaults(device);
    device.bind_framebuffer(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RecordingDevice;
    use crate::handle::ProgramHandle;
    use crate::state::GraphicsState;

    #[test]
    fn reset_returns_to_default_state() {
        let mut device = RecordingDevice::new();
        apply_scene_defaults(&mut device);
        device.use_program(Some(ProgramHandle(3)));
        assert_eq!(device.read_state().vertex_stride, VERTEX_STRIDE);

        reset_scene_defaults(&mut device);
        assert_eq!(device.read_state(), GraphicsState::default());
    }
}
