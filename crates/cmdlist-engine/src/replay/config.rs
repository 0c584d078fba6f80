use crate::token::PrimitiveMode;

use super::DrawMode;

/// Replay settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayConfig {
    /// Merge consecutive objects sharing a state object into one segment,
    /// and skip redundant program binds on the direct path.
    ///
    /// Turning this off breaks segments at every object.
    pub filter_states: bool,

    /// Mode selected at construction.
    pub initial_mode: DrawMode,

    /// Primitive mode of every draw and of every captured state object.
    pub primitive: PrimitiveMode,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            filter_states: true,
            initial_mode: DrawMode::Direct,
            primitive: PrimitiveMode::Triangles,
        }
    }
}
