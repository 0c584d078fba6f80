use std::time::{Duration, Instant};

use anyhow::{Context, Result, ensure};
use clap::Parser;

use cmdlist_engine::address::RenderTarget;
use cmdlist_engine::device::{BufferAllocator, DeviceCommand, RecordingDevice};
use cmdlist_engine::logging::{LoggingConfig, init_logging};
use cmdlist_engine::program::ProgramSet;
use cmdlist_engine::replay::{DrawMode, FrameContext, ReplayConfig, TokenRenderer};
use cmdlist_engine::scene::generate::{SceneParams, build_scene};
use cmdlist_engine::version::ChangeTracker;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay a generated scene through every draw mode")]
struct Options {
    /// Objects in the generated scene.
    #[arg(long, default_value_t = SceneParams::default().objects)]
    objects: usize,
    /// Frames replayed per draw mode.
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..))]
    frames: u32,
    /// Break segments at every object instead of merging equal states.
    #[arg(long)]
    no_filter: bool,
    /// Run without the command-list extension.
    #[arg(long)]
    no_hw: bool,
}

struct Bench {
    device: RecordingDevice,
    tracker: ChangeTracker,
    programs: ProgramSet,
    target: RenderTarget,
}

impl Bench {
    fn frame(&mut self, renderer: &mut TokenRenderer) {
        let frame = FrameContext {
            programs: &self.programs,
            version: self.tracker.current(),
            framebuffer: self.target.framebuffer(),
        };
        renderer.replay(&mut self.device, &frame);
    }

    /// Replays `frames` frames; returns the draw work of the last one.
    fn run(&mut self, renderer: &mut TokenRenderer, frames: u32) -> (Duration, Vec<DeviceCommand>) {
        let started = Instant::now();
        for _ in 0..frames {
            self.device.clear_log();
            self.frame(renderer);
        }
        (started.elapsed(), self.device.draw_work())
    }

    fn resize(&mut self, width: u32, height: u32) {
        let framebuffer = self.device.create_framebuffer();
        self.target.resize(
            self.device.addresses_mut(),
            &mut self.tracker,
            framebuffer,
            width,
            height,
        );
    }

    fn reload(&mut self) {
        let handles = vec![self.device.create_program(), self.device.create_program()];
        self.programs.reload(handles, &mut self.tracker);
    }
}

fn main() -> Result<()> {
    println!();
    println!("  ╔════════════════════════════════════════╗");
    println!("  ║        CMDLIST REPLAY BENCH v0.1       ║");
    println!("  ║   token streams  ·  state objects      ║");
    println!("  ╚════════════════════════════════════════╝");
    println!();

    init_logging(LoggingConfig::default());
    let options = Options::parse();

    let mut device = if options.no_hw {
        RecordingDevice::new()
    } else {
        RecordingDevice::with_command_list()
    };
    let programs = ProgramSet::new(vec![device.create_program(), device.create_program()]);
    let framebuffer = device.create_framebuffer();
    let target = RenderTarget::new(device.addresses_mut(), framebuffer, 1280, 720);
    let (scene, _buffers) = build_scene(
        &mut device,
        &SceneParams {
            objects: options.objects,
            ..SceneParams::default()
        },
    );

    let mut bench = Bench {
        device,
        tracker: ChangeTracker::new(),
        programs,
        target,
    };

    let config = ReplayConfig {
        filter_states: !options.no_filter,
        ..ReplayConfig::default()
    };
    let mut renderer = TokenRenderer::new(&mut bench.device, scene, &bench.programs, config)
        .context("failed to set up token replay")?;

    bench.frame(&mut renderer);
    if let Some(sequence) = renderer.sequence() {
        println!(
            "  scene: {} objects, {} token bytes, {} segments",
            options.objects,
            sequence.stream().len(),
            sequence.segments().len()
        );
    }
    println!();

    let mut reference: Option<Vec<DeviceCommand>> = None;
    println!("  {:<20} {:>12} {:>12}", "mode", "total", "per frame");
    for mode in renderer.supported_modes() {
        renderer
            .select_backend(&mut bench.device, mode)
            .with_context(|| format!("switching to {mode}"))?;

        let (elapsed, work) = bench.run(&mut renderer, options.frames);
        match &reference {
            None => reference = Some(work),
            Some(expected) => ensure!(
                &work == expected,
                "{mode} replay diverged from {}",
                DrawMode::Direct
            ),
        }

        println!(
            "  {:<20} {:>12.2?} {:>12.2?}",
            mode.name(),
            elapsed,
            elapsed / options.frames
        );
    }
    println!();

    // Re-link after a resize, then recapture after a program reload.
    bench.resize(1920, 1080);
    let (resized, _) = bench.run(&mut renderer, 1);
    bench.reload();
    let (reloaded, _) = bench.run(&mut renderer, 1);

    let stats = renderer.stats();
    println!("  resize frame     {resized:>12.2?}");
    println!("  reload frame     {reloaded:>12.2?}");
    if let Some(last) = stats.last_rebuild {
        println!("  last rebuild     {last:>12.2?}");
    }
    println!();
    println!(
        "  frames {}  rebuilds {}  captures {}  relinks {}",
        stats.frames, stats.rebuilds, stats.captures, stats.relinks
    );
    println!(
        "  token uploads {}  list compiles {}  draws {}",
        stats.token_uploads,
        stats.list_compiles,
        bench.device.counters().draws
    );
    println!();

    renderer.release(&mut bench.device);
    log::info!("bench finished after {} frames", stats.frames);
    Ok(())
}
