mod common;

use cmdlist_engine::device::DeviceCommand;
use cmdlist_engine::program::ProgramSource;
use cmdlist_engine::replay::DrawMode;
use cmdlist_engine::scene::{PipelineVariant, policy};

use common::Fixture;

fn drawn_programs(work: &[DeviceCommand]) -> Vec<u32> {
    work.iter()
        .filter_map(|c| match c {
            DeviceCommand::DrawIndexed { state, .. } => state.program.map(|p| p.0),
            _ => None,
        })
        .collect()
}

#[test]
fn resize_relinks_without_recapture() {
    let mut fx = Fixture::new(true, 48);
    let mut renderer = fx.renderer_in(DrawMode::BufferReplay);
    fx.draw(&mut renderer);

    let states: Vec<_> = renderer
        .sequence()
        .unwrap()
        .segments()
        .iter()
        .map(|s| s.state)
        .collect();
    let snapshots: Vec<_> = states
        .iter()
        .map(|&id| fx.device.captured_state(id).cloned())
        .collect();
    let bytes = renderer.sequence().unwrap().stream().clone();
    let captures = fx.device.counters().state_captures;

    fx.resize(1280, 720);
    fx.draw(&mut renderer);

    let stats = renderer.stats();
    assert_eq!(stats.captures, 1);
    assert_eq!(stats.relinks, 1);
    assert_eq!(stats.rebuilds, 2);
    assert_eq!(stats.token_uploads, 1);
    assert_eq!(fx.device.counters().state_captures, captures);
    assert_eq!(fx.device.counters().token_uploads, 1);

    let sequence = renderer.sequence().unwrap();
    assert_eq!(sequence.stream(), &bytes);
    assert!(sequence
        .segments()
        .iter()
        .all(|s| s.framebuffer == fx.target.framebuffer()));
    for (id, before) in states.iter().zip(&snapshots) {
        assert_eq!(fx.device.captured_state(*id).cloned(), *before);
    }
    assert_eq!(fx.device.bound_framebuffer(), Some(fx.target.framebuffer()));
}

#[test]
fn resize_recompiles_the_command_list() {
    let mut fx = Fixture::new(true, 20);
    let mut renderer = fx.renderer_in(DrawMode::HardwareList);
    fx.draw(&mut renderer);
    fx.draw(&mut renderer);
    assert_eq!(renderer.stats().list_compiles, 1);

    fx.resize(320, 200);
    fx.draw(&mut renderer);

    assert_eq!(renderer.stats().list_compiles, 2);
    assert_eq!(fx.device.counters().list_compiles, 2);
    assert_eq!(fx.device.counters().list_calls, 3);
    assert_eq!(renderer.stats().captures, 1);
    assert_eq!(fx.device.bound_framebuffer(), Some(fx.target.framebuffer()));
}

#[test]
fn reload_recaptures_and_draws_with_new_programs() {
    for mode in [DrawMode::HardwareList, DrawMode::BufferReplay, DrawMode::SoftwareEmulation] {
        let mut fx = Fixture::new(true, 32);
        let mut renderer = fx.renderer_in(mode);
        let before = drawn_programs(&fx.draw_work(&mut renderer));

        fx.reload_programs();
        let after = drawn_programs(&fx.draw_work(&mut renderer));

        let expected: Vec<u32> = fx
            .scene
            .objects
            .iter()
            .map(|o| fx.programs.program(policy(o.variant).program).0)
            .collect();
        assert_eq!(after, expected, "{mode}");
        assert_ne!(before, after, "{mode}");

        let stats = renderer.stats();
        assert_eq!(stats.captures, 2, "{mode}");
        assert_eq!(stats.relinks, 1, "{mode}");
        // The token bytes never embed program handles.
        assert!(stats.token_uploads <= 1, "{mode}");
    }
}

#[test]
fn reload_keeps_state_ids_stable() {
    let mut fx = Fixture::new(true, 24);
    let mut renderer = fx.renderer_in(DrawMode::BufferReplay);
    fx.draw(&mut renderer);
    let segments = renderer.sequence().unwrap().segments().to_vec();

    fx.reload_programs();
    fx.draw(&mut renderer);

    assert_eq!(renderer.sequence().unwrap().segments(), segments.as_slice());
    let geometry = fx.programs.program(policy(PipelineVariant::GeometryStage).program);
    let captured_geometry = segments.iter().find_map(|s| {
        fx.device
            .captured_state(s.state)
            .filter(|state| state.program == Some(geometry))
    });
    assert!(captured_geometry.is_some());
}

#[test]
fn invalidate_rebuilds_identical_data() {
    let mut fx = Fixture::new(true, 40);
    let mut renderer = fx.renderer_in(DrawMode::BufferReplay);
    let reference = fx.draw_work(&mut renderer);
    let sequence = renderer.sequence().unwrap().clone();

    renderer.invalidate();
    let work = fx.draw_work(&mut renderer);

    assert_eq!(renderer.sequence().unwrap(), &sequence);
    assert_eq!(work, reference);
    let stats = renderer.stats();
    assert_eq!(stats.captures, 2);
    assert_eq!(stats.relinks, 0);
    assert_eq!(stats.token_uploads, 2);
}

#[test]
fn invalid_programs_skip_frames() {
    let mut fx = Fixture::new(true, 16);
    let mut renderer = fx.renderer_in(DrawMode::HardwareList);
    fx.draw(&mut renderer);

    fx.programs.invalidate();
    let work = fx.draw_work(&mut renderer);
    assert!(work.is_empty());
    assert!(fx.device.log().is_empty());

    let stats = renderer.stats();
    assert_eq!(stats.frames, 1);
    assert_eq!(stats.skipped_frames, 1);
    assert_eq!(stats.rebuilds, 1);

    fx.reload_programs();
    fx.draw(&mut renderer);
    let stats = renderer.stats();
    assert_eq!(stats.frames, 2);
    assert_eq!(stats.captures, 2);
}

#[test]
fn combined_change_recaptures_once() {
    let mut fx = Fixture::new(false, 16);
    let mut renderer = fx.renderer_in(DrawMode::SoftwareEmulation);
    fx.draw(&mut renderer);

    fx.resize(100, 100);
    fx.reload_programs();
    fx.draw(&mut renderer);
    fx.draw(&mut renderer);

    let stats = renderer.stats();
    assert_eq!(stats.captures, 2);
    assert_eq!(stats.rebuilds, 2);
    assert_eq!(stats.frames, 3);
    assert!(renderer
        .emulated_segments()
        .iter()
        .all(|s| s.framebuffer == fx.target.framebuffer()));
}

#[test]
fn switching_modes_after_resize_uses_current_target() {
    let mut fx = Fixture::new(true, 16);
    let mut renderer = fx.renderer_in(DrawMode::SoftwareEmulation);
    fx.draw(&mut renderer);
    fx.resize(64, 64);
    fx.draw(&mut renderer);

    renderer
        .select_backend(&mut fx.device, DrawMode::BufferReplay)
        .unwrap();
    fx.draw(&mut renderer);

    assert_eq!(renderer.stats().token_uploads, 1);
    assert_eq!(fx.device.bound_framebuffer(), Some(fx.target.framebuffer()));
}

#[test]
fn leaving_list_mode_deletes_the_list() {
    let mut fx = Fixture::new(true, 16);
    let mut renderer = fx.renderer_in(DrawMode::HardwareList);
    fx.draw(&mut renderer);
    assert_eq!(fx.device.live_command_lists(), 1);

    for _ in 0..4 {
        renderer
            .select_backend(&mut fx.device, DrawMode::BufferReplay)
            .unwrap();
        fx.draw(&mut renderer);
        assert_eq!(fx.device.live_command_lists(), 0);

        renderer
            .select_backend(&mut fx.device, DrawMode::HardwareList)
            .unwrap();
        fx.draw(&mut renderer);
        assert_eq!(fx.device.live_command_lists(), 1);
    }

    renderer.release(&mut fx.device);
    assert_eq!(fx.device.live_command_lists(), 0);
    assert!(fx
        .device
        .log()
        .iter()
        .any(|c| matches!(c, DeviceCommand::DeleteList(_))));
}
