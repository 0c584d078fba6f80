use std::time::Duration;

/// Counters kept by [`TokenRenderer`](super::TokenRenderer).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Frames replayed.
    pub frames: u64,
    /// Frames skipped because programs were invalid.
    pub skipped_frames: u64,
    /// Shared-data rebuilds, full or partial.
    pub rebuilds: u64,
    /// Times both variants were captured.
    pub captures: u64,
    /// Rebuilds that only re-linked segment references.
    pub relinks: u64,
    /// Token buffer uploads by the buffer backend.
    pub token_uploads: u64,
    /// Command list compiles by the list backend.
    pub list_compiles: u64,
    /// Wall time of the most recent rebuild.
    pub last_rebuild: Option<Duration>,
}
