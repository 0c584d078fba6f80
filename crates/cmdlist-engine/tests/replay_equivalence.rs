mod common;

use cmdlist_engine::device::{DeviceCommand, RecordingDevice};
use cmdlist_engine::program::{ProgramSet, ProgramSource};
use cmdlist_engine::replay::{DrawMode, ReplayConfig, SelectError, TokenRenderer};
use cmdlist_engine::scene::{PipelineVariant, policy};
use cmdlist_engine::state::GraphicsState;
use cmdlist_engine::token::{PrimitiveMode, ShaderStage};

use common::Fixture;

fn draws(work: &[DeviceCommand]) -> usize {
    work.iter()
        .filter(|c| matches!(c, DeviceCommand::DrawIndexed { .. }))
        .count()
}

#[test]
fn every_mode_issues_identical_draw_work() {
    let mut fx = Fixture::new(true, 96);
    let mut renderer = fx.renderer_in(DrawMode::Direct);
    assert_eq!(renderer.supported_modes(), DrawMode::ALL.to_vec());

    let reference = fx.draw_work(&mut renderer);
    assert_eq!(draws(&reference), 96);

    for mode in DrawMode::ALL {
        renderer.select_backend(&mut fx.device, mode).unwrap();
        // Twice: once right after preparation, once steady-state.
        for _ in 0..2 {
            let work = fx.draw_work(&mut renderer);
            assert_eq!(work, reference, "{mode} diverged from direct replay");
        }
    }
    assert_eq!(renderer.stats().frames, 9);
}

#[test]
fn unfiltered_sequences_draw_the_same() {
    let mut fx = Fixture::new(true, 40);
    let config = ReplayConfig {
        filter_states: false,
        ..ReplayConfig::default()
    };
    let mut renderer = fx.renderer(config);
    let reference = fx.draw_work(&mut renderer);

    for mode in [DrawMode::HardwareList, DrawMode::BufferReplay, DrawMode::SoftwareEmulation] {
        renderer.select_backend(&mut fx.device, mode).unwrap();
        assert_eq!(fx.draw_work(&mut renderer), reference, "{mode}");
    }
    assert_eq!(renderer.sequence().unwrap().segments().len(), 40);
}

#[test]
fn draws_run_with_their_variant_program() {
    let mut fx = Fixture::new(true, 64);
    let programs = fx.programs.clone();
    let mut renderer = fx.renderer_in(DrawMode::HardwareList);
    let work = fx.draw_work(&mut renderer);

    let expected: Vec<_> = fx
        .scene
        .objects
        .iter()
        .map(|o| {
            let id = policy(o.variant).program;
            Some(programs.program(id))
        })
        .collect();
    let actual: Vec<_> = work
        .iter()
        .filter_map(|c| match c {
            DeviceCommand::DrawIndexed { state, .. } => Some(state.program),
            _ => None,
        })
        .collect();
    assert_eq!(actual, expected);
}

#[test]
fn geometry_stage_binds_follow_the_variant() {
    let mut fx = Fixture::new(false, 50);
    let mut renderer = fx.renderer_in(DrawMode::SoftwareEmulation);
    let work = fx.draw_work(&mut renderer);

    let geometry_binds = work
        .iter()
        .filter(|c| {
            matches!(
                c,
                DeviceCommand::BindUniform {
                    stage: ShaderStage::Geometry,
                    slot: 1,
                    ..
                }
            )
        })
        .count();
    let geometry_objects = fx
        .scene
        .objects
        .iter()
        .filter(|o| o.variant == PipelineVariant::GeometryStage)
        .count();
    assert!(geometry_objects > 0);
    assert_eq!(geometry_binds, geometry_objects);
}

#[test]
fn hardware_modes_need_the_extension() {
    let mut fx = Fixture::new(false, 8);
    let mut renderer = fx.renderer_in(DrawMode::Direct);

    assert!(!renderer.command_list_supported());
    assert_eq!(
        renderer.supported_modes(),
        vec![DrawMode::Direct, DrawMode::SoftwareEmulation]
    );
    assert_eq!(
        renderer.select_backend(&mut fx.device, DrawMode::HardwareList),
        Err(SelectError::Unsupported(DrawMode::HardwareList))
    );
    assert_eq!(
        renderer.select_backend(&mut fx.device, DrawMode::BufferReplay),
        Err(SelectError::Unsupported(DrawMode::BufferReplay))
    );
    // A rejected switch leaves the active mode alone.
    assert_eq!(renderer.mode(), DrawMode::Direct);
    assert_eq!(draws(&fx.draw_work(&mut renderer)), 8);
}

#[test]
fn setup_rejects_unavailable_initial_mode() {
    let mut fx = Fixture::new(false, 4);
    let result = TokenRenderer::new(
        &mut fx.device,
        fx.scene.clone(),
        &fx.programs,
        ReplayConfig {
            initial_mode: DrawMode::HardwareList,
            ..ReplayConfig::default()
        },
    );
    assert!(result.is_err());
}

#[test]
fn setup_rejects_invalid_programs() {
    let mut device = RecordingDevice::new();
    let mut programs = ProgramSet::new(vec![device.create_program(), device.create_program()]);
    programs.invalidate();
    let fx = Fixture::new(false, 4);

    let err = TokenRenderer::new(&mut device, fx.scene, &programs, ReplayConfig::default())
        .err()
        .expect("invalid programs must fail setup");
    assert!(err.to_string().contains("invalid"));
}

#[test]
fn direct_and_emulated_leave_the_same_state() {
    for mode in [DrawMode::Direct, DrawMode::SoftwareEmulation] {
        let mut fx = Fixture::new(false, 16);
        let mut renderer = fx.renderer_in(mode);
        fx.draw(&mut renderer);

        let state = cmdlist_engine::device::Device::read_state(&fx.device);
        assert_eq!(state, GraphicsState::default(), "{mode}");
    }
}

#[test]
fn empty_scene_binds_scene_uniforms_only() {
    let mut fx = Fixture::new(true, 0);
    let mut reference = None;
    for mode in DrawMode::ALL {
        let mut renderer = fx.renderer_in(mode);
        let work = fx.draw_work(&mut renderer);
        assert_eq!(draws(&work), 0, "{mode}");
        assert_eq!(work.len(), 3, "{mode}");
        match &reference {
            None => reference = Some(work),
            Some(r) => assert_eq!(&work, r, "{mode}"),
        }
        renderer.release(&mut fx.device);
    }
}

#[test]
fn primitive_mode_flows_into_every_draw() {
    let mut fx = Fixture::new(true, 12);
    let mut renderer = fx.renderer(ReplayConfig {
        initial_mode: DrawMode::BufferReplay,
        primitive: PrimitiveMode::Lines,
        ..ReplayConfig::default()
    });
    let work = fx.draw_work(&mut renderer);
    assert!(work.iter().all(|c| match c {
        DeviceCommand::DrawIndexed { mode, .. } => *mode == PrimitiveMode::Lines,
        _ => true,
    }));
}

#[test]
fn emulated_segment_switch_applies_only_the_program() {
    let mut fx = Fixture::new(false, 64);
    let mut renderer = fx.renderer_in(DrawMode::SoftwareEmulation);
    fx.device.clear_log();
    fx.draw(&mut renderer);

    let segments = renderer.emulated_segments().len();
    assert!(segments > 2, "scene should alternate variants");

    let log = fx.device.log();
    let is_draw = |c: &DeviceCommand| matches!(c, DeviceCommand::DrawIndexed { .. });
    let first = log.iter().position(is_draw).unwrap();
    let last = log.iter().rposition(is_draw).unwrap();

    let switches: Vec<_> = log[first..last]
        .iter()
        .filter(|c| {
            matches!(
                c,
                DeviceCommand::UseProgram(_)
                    | DeviceCommand::SetCapability(..)
                    | DeviceCommand::SetVertexAttribute(..)
                    | DeviceCommand::SetVertexStride(_)
            )
        })
        .collect();

    // Both variants share fixed-function state and layout; only the program
    // differs, so every boundary is exactly one program bind.
    assert_eq!(switches.len(), segments - 1);
    let simple = fx.programs.program(policy(PipelineVariant::Simple).program);
    let geometry = fx.programs.program(policy(PipelineVariant::GeometryStage).program);
    for pair in switches.windows(2) {
        let (DeviceCommand::UseProgram(Some(a)), DeviceCommand::UseProgram(Some(b))) = (pair[0], pair[1]) else {
            panic!("segment switch applied more than the program: {pair:?}");
        };
        assert_ne!(a, b);
        assert!([simple, geometry].contains(a) && [simple, geometry].contains(b));
    }
    assert!(matches!(switches[0], DeviceCommand::UseProgram(Some(_))));
}
