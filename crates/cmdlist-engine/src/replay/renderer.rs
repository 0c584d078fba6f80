use std::time::Instant;

use anyhow::{Context, Result};

use crate::device::Device;
use crate::handle::FramebufferId;
use crate::program::ProgramSource;
use crate::scene::{Scene, SegmentBuilder, Segment, TokenSequence, VariantStates};
use crate::state::{DriverStates, HostStates, PipelineState, capture_variants};
use crate::token::TokenFormat;
use crate::version::ChangeVersion;

use super::backend::{ReplayBackend, ReplayData};
use super::buffer::BufferBackend;
use super::direct::DirectBackend;
use super::emulated::EmulatedBackend;
use super::list::ListBackend;
use super::{DrawMode, ReplayConfig, ReplayStats, SelectError};

/// Per-frame inputs from the frame driver.
#[derive(Clone, Copy)]
pub struct FrameContext<'a> {
    pub programs: &'a dyn ProgramSource,
    /// Live version; compared against what the compiled data was built for.
    pub version: ChangeVersion,
    /// Current render target.
    pub framebuffer: FramebufferId,
}

/// Owns the token sequence, the captured state objects and the active draw
/// strategy.
///
/// Nothing is rebuilt eagerly. `replay` compares the frame's version with
/// the one the data was built for and, on mismatch, rebuilds in-line:
/// - program change: recapture both variants, then re-link segments
/// - target change only: re-link segments to the new framebuffer
/// - after [`TokenRenderer::invalidate`]: recapture and re-encode everything
///
/// The active backend is then brought up to date before it replays.
pub struct TokenRenderer {
    scene: Scene,
    config: ReplayConfig,
    format: TokenFormat,

    driver: Option<DriverStates>,
    host: HostStates,

    sequence: Option<TokenSequence>,
    emulated: Vec<Segment>,
    data_version: Option<ChangeVersion>,

    backend: Box<dyn ReplayBackend>,
    backend_version: Option<ChangeVersion>,

    stats: ReplayStats,
}

impl TokenRenderer {
    /// Detects command-list support and creates the state objects.
    ///
    /// Fails if programs are invalid or `config.initial_mode` can't run on
    /// `device`.
    pub fn new(
        device: &mut dyn Device,
        scene: Scene,
        programs: &dyn ProgramSource,
        config: ReplayConfig,
    ) -> Result<Self> {
        anyhow::ensure!(
            programs.programs_valid(),
            "cannot set up token replay while shader programs are invalid"
        );

        let (format, driver) = match device.command_list() {
            Some(ext) => (ext.token_format(), Some(DriverStates::create(ext))),
            None => (TokenFormat::generic(), None),
        };
        log::info!(
            "command-list support: {}",
            if driver.is_some() { "yes" } else { "no, hardware modes disabled" }
        );

        let mut renderer = Self {
            scene,
            config,
            format,
            driver,
            host: HostStates::new(),
            sequence: None,
            emulated: Vec::new(),
            data_version: None,
            backend: Box::new(DirectBackend),
            backend_version: None,
            stats: ReplayStats::default(),
        };

        renderer
            .select_backend(device, config.initial_mode)
            .context("initial draw mode is not available")?;

        Ok(renderer)
    }

    #[inline]
    pub fn mode(&self) -> DrawMode {
        self.backend.mode()
    }

    #[inline]
    pub fn command_list_supported(&self) -> bool {
        self.driver.is_some()
    }

    pub fn supports(&self, mode: DrawMode) -> bool {
        !mode.requires_command_list() || self.command_list_supported()
    }

    pub fn supported_modes(&self) -> Vec<DrawMode> {
        DrawMode::ALL
            .into_iter()
            .filter(|m| self.supports(*m))
            .collect()
    }

    /// Switches strategy. The new backend is prepared on the next replay.
    pub fn select_backend(&mut self, device: &mut dyn Device, mode: DrawMode) -> Result<(), SelectError> {
        if !self.supports(mode) {
            log::warn!("draw mode '{mode}' is unavailable on this device");
            return Err(SelectError::Unsupported(mode));
        }
        if mode == self.backend.mode() && self.backend_version.is_some() {
            return Ok(());
        }

        self.backend.release(device);
        self.backend = match mode {
            DrawMode::Direct => Box::new(DirectBackend),
            DrawMode::HardwareList => Box::new(ListBackend::default()),
            DrawMode::BufferReplay => Box::new(BufferBackend::default()),
            DrawMode::SoftwareEmulation => Box::new(EmulatedBackend::default()),
        };
        self.backend_version = None;
        log::info!("draw mode: {mode}");
        Ok(())
    }

    /// Forces a full rebuild on the next replay.
    pub fn invalidate(&mut self) {
        self.data_version = None;
        self.backend_version = None;
        log::debug!("token replay invalidated");
    }

    /// Draws one frame with the active strategy.
    ///
    /// Frames are skipped while programs are invalid; nothing is rebuilt.
    pub fn replay(&mut self, device: &mut dyn Device, frame: &FrameContext<'_>) {
        if !frame.programs.programs_valid() {
            self.stats.skipped_frames += 1;
            log::warn!("programs invalid, frame skipped");
            return;
        }

        self.ensure_current(device, frame);

        let sequence = self
            .sequence
            .as_ref()
            .expect("ensure_current builds the sequence");
        assert!(
            sequence.segments()[0].framebuffer == frame.framebuffer,
            "framebuffer changed to {} without a target version bump",
            frame.framebuffer
        );

        let data = ReplayData {
            scene: &self.scene,
            sequence,
            emulated: &self.emulated,
            host: self.host.system(),
            config: &self.config,
        };
        self.backend.replay(device, &data, frame);
        self.stats.frames += 1;
    }

    #[inline]
    pub fn stats(&self) -> ReplayStats {
        self.stats
    }

    /// Current sequence, once the first replay has built it.
    pub fn sequence(&self) -> Option<&TokenSequence> {
        self.sequence.as_ref()
    }

    /// Segments as executed by the software path.
    pub fn emulated_segments(&self) -> &[Segment] {
        &self.emulated
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Frees backend-owned device objects.
    pub fn release(&mut self, device: &mut dyn Device) {
        self.backend.release(device);
        self.backend_version = None;
    }

    fn canonical_states(&self) -> VariantStates {
        match &self.driver {
            Some(driver) => driver.states(),
            None => self.host.states(),
        }
    }

    fn ensure_current(&mut self, device: &mut dyn Device, frame: &FrameContext<'_>) {
        let live = frame.version;

        if self.data_version != Some(live) {
            let started = Instant::now();
            let program_changed = self.data_version.is_none_or(|v| v.program_changed(live));

            if program_changed {
                self.capture(device, frame);
            }

            // State ids survive recapture, so an existing sequence only needs
            // its framebuffer references refreshed.
            let relink = self.data_version.is_some() && self.sequence.is_some();
            if relink {
                if let Some(sequence) = self.sequence.as_mut() {
                    sequence.retarget(frame.framebuffer);
                }
                self.stats.relinks += 1;
            } else {
                let sequence = SegmentBuilder::new(self.format, self.canonical_states(), frame.framebuffer)
                    .filter_states(self.config.filter_states)
                    .primitive(self.config.primitive)
                    .build(&self.scene);
                self.sequence = Some(sequence);
            }

            let sequence = self
                .sequence
                .as_ref()
                .expect("sequence was just built or re-linked");
            self.emulated = match &self.driver {
                Some(driver) => sequence.remapped(&driver.states(), &self.host.states()),
                None => sequence.segments().to_vec(),
            };

            self.data_version = Some(live);
            self.stats.rebuilds += 1;
            let elapsed = started.elapsed();
            self.stats.last_rebuild = Some(elapsed);
            log::debug!(
                "rebuilt replay data for {live:?} in {elapsed:?} (recaptured: {program_changed})"
            );
        }

        if self.backend_version != Some(live) {
            let fresh = self.backend_version.is_none();
            let sequence = self
                .sequence
                .as_ref()
                .expect("shared data is rebuilt before the backend");
            let data = ReplayData {
                scene: &self.scene,
                sequence,
                emulated: &self.emulated,
                host: self.host.system(),
                config: &self.config,
            };
            self.backend
                .prepare(device, &data, live, fresh, &mut self.stats);
            self.backend_version = Some(live);
        }
    }

    fn capture(&mut self, device: &mut dyn Device, frame: &FrameContext<'_>) {
        let mut targets: Vec<&mut dyn PipelineState> = vec![&mut self.host];
        if let Some(driver) = self.driver.as_mut() {
            targets.push(driver);
        }
        capture_variants(
            device,
            frame.programs,
            frame.framebuffer,
            self.config.primitive,
            &mut targets,
        );
        self.stats.captures += 1;
        log::debug!("captured pipeline states");
    }
}
