use crate::device::Device;
use crate::scene::{
    OBJECT_INDEX_TYPE, OBJECT_UNIFORM_SLOT, SCENE_UNIFORM_SLOT, SCENE_UNIFORM_STAGES,
    VERTEX_BINDING, policy,
};
use crate::state::{apply_scene_defaults, reset_scene_defaults};
use crate::version::ChangeVersion;

use super::backend::{ReplayBackend, ReplayData};
use super::{DrawMode, FrameContext, ReplayStats};

/// Conventional per-object bind-and-draw.
///
/// Issues the same binds in the same order as the token stream encodes them,
/// with programs switched directly instead of through state objects.
#[derive(Debug, Default)]
pub(crate) struct DirectBackend;

impl ReplayBackend for DirectBackend {
    fn mode(&self) -> DrawMode {
        DrawMode::Direct
    }

    fn prepare(
        &mut self,
        _device: &mut dyn Device,
        _data: &ReplayData<'_>,
        _version: ChangeVersion,
        _fresh: bool,
        _stats: &mut ReplayStats,
    ) {
    }

    fn replay(&mut self, device: &mut dyn Device, data: &ReplayData<'_>, frame: &FrameContext<'_>) {
        let bindings = &data.scene.bindings;

        device.bind_framebuffer(Some(frame.framebuffer));
        apply_scene_defaults(device);

        for &stage in SCENE_UNIFORM_STAGES {
            device.bind_uniform(stage, SCENE_UNIFORM_SLOT, bindings.scene_uniform);
        }

        let mut last_program = None;
        for (i, object) in data.scene.objects.iter().enumerate() {
            let policy = policy(object.variant);
            let program = frame.programs.program(policy.program);
            if last_program != Some(program) || !data.config.filter_states {
                device.use_program(Some(program));
                last_program = Some(program);
            }

            device.bind_vertex_buffer(VERTEX_BINDING, object.vertex);
            device.bind_index_buffer(OBJECT_INDEX_TYPE, object.index);
            let range = bindings.object_uniform(i);
            for &stage in policy.object_uniform_stages {
                device.bind_uniform(stage, OBJECT_UNIFORM_SLOT, range);
            }
            device.draw_indexed(data.config.primitive, object.index_count);
        }

        reset_scene_defaults(device);
    }
}
