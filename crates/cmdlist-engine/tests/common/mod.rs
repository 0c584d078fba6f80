//! Shared helpers for `cmdlist-engine` integration tests.

use cmdlist_engine::address::RenderTarget;
use cmdlist_engine::device::{BufferAllocator, RecordingDevice};
use cmdlist_engine::program::ProgramSet;
use cmdlist_engine::replay::{DrawMode, FrameContext, ReplayConfig, TokenRenderer};
use cmdlist_engine::scene::generate::{SceneBuffers, SceneParams, build_scene};
use cmdlist_engine::scene::Scene;
use cmdlist_engine::version::ChangeTracker;

#[allow(dead_code)]
pub fn require_wgpu() -> bool {
    let Ok(raw) = std::env::var("CMDLIST_REQUIRE_WGPU") else {
        return false;
    };

    let v = raw.trim();
    v == "1"
        || v.eq_ignore_ascii_case("true")
        || v.eq_ignore_ascii_case("yes")
        || v.eq_ignore_ascii_case("on")
}

#[allow(dead_code)]
pub fn skip_or_panic(test_name: &str, reason: &str) {
    if require_wgpu() {
        panic!("CMDLIST_REQUIRE_WGPU is enabled but {test_name} cannot run: {reason}");
    }
    eprintln!("skipping {test_name}: {reason}");
}

/// A recording device with a generated scene, two programs and a pinned
/// render target.
#[allow(dead_code)]
pub struct Fixture {
    pub device: RecordingDevice,
    pub tracker: ChangeTracker,
    pub programs: ProgramSet,
    pub target: RenderTarget,
    pub scene: Scene,
    pub buffers: SceneBuffers,
}

#[allow(dead_code)]
impl Fixture {
    pub fn new(command_list: bool, objects: usize) -> Self {
        let mut device = if command_list {
            RecordingDevice::with_command_list()
        } else {
            RecordingDevice::new()
        };

        let programs = ProgramSet::new(vec![device.create_program(), device.create_program()]);
        let framebuffer = device.create_framebuffer();
        let target = RenderTarget::new(device.addresses_mut(), framebuffer, 640, 480);

        let params = SceneParams {
            objects,
            ..SceneParams::default()
        };
        let (scene, buffers) = build_scene(&mut device, &params);

        Self {
            device,
            tracker: ChangeTracker::new(),
            programs,
            target,
            scene,
            buffers,
        }
    }

    pub fn renderer(&mut self, config: ReplayConfig) -> TokenRenderer {
        TokenRenderer::new(&mut self.device, self.scene.clone(), &self.programs, config)
            .expect("renderer setup failed")
    }

    pub fn renderer_in(&mut self, mode: DrawMode) -> TokenRenderer {
        self.renderer(ReplayConfig {
            initial_mode: mode,
            ..ReplayConfig::default()
        })
    }

    /// Replays one frame against the fixture's live version and target.
    pub fn draw(&mut self, renderer: &mut TokenRenderer) {
        let frame = FrameContext {
            programs: &self.programs,
            version: self.tracker.current(),
            framebuffer: self.target.framebuffer(),
        };
        renderer.replay(&mut self.device, &frame);
    }

    /// Replays one frame and returns only its binds and draws.
    pub fn draw_work(&mut self, renderer: &mut TokenRenderer) -> Vec<cmdlist_engine::device::DeviceCommand> {
        self.device.clear_log();
        self.draw(renderer);
        self.device.draw_work()
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let framebuffer = self.device.create_framebuffer();
        self.target.resize(
            self.device.addresses_mut(),
            &mut self.tracker,
            framebuffer,
            width,
            height,
        );
    }

    pub fn reload_programs(&mut self) {
        let handles = vec![self.device.create_program(), self.device.create_program()];
        self.programs.reload(handles, &mut self.tracker);
    }
}
