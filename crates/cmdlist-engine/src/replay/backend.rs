use crate::device::Device;
use crate::scene::{Scene, Segment, TokenSequence};
use crate::state::StateSystem;
use crate::version::ChangeVersion;

use super::{DrawMode, FrameContext, ReplayConfig, ReplayStats};

/// Read-only view of the renderer's current data.
pub(crate) struct ReplayData<'a> {
    pub scene: &'a Scene,
    pub sequence: &'a TokenSequence,
    /// Segments rewritten to host state ids.
    pub emulated: &'a [Segment],
    pub host: &'a StateSystem,
    pub config: &'a ReplayConfig,
}

/// One draw strategy.
pub(crate) trait ReplayBackend {
    fn mode(&self) -> DrawMode;

    /// Brings backend-owned data up to `version`.
    ///
    /// `fresh` is set when the backend holds nothing usable, i.e. right after
    /// selection or an explicit invalidation.
    fn prepare(
        &mut self,
        device: &mut dyn Device,
        data: &ReplayData<'_>,
        version: ChangeVersion,
        fresh: bool,
        stats: &mut ReplayStats,
    );

    /// Issues one frame of draws.
    fn replay(&mut self, device: &mut dyn Device, data: &ReplayData<'_>, frame: &FrameContext<'_>);

    /// Frees device objects before the backend is dropped.
    fn release(&mut self, _device: &mut dyn Device) {}
}
