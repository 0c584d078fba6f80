//! Pipeline state snapshots, diffs and the two state-object backends.
//!
//! A [`GraphicsState`] is the host-visible subset of fixed-function and
//! program state the scene depends on. [`StateSystem`] stores snapshots and
//! precomputed transitions for the software path; [`PipelineState`] hides
//! whether state objects are driver-compiled or host-simulated.

mod capture;
mod diff;
mod graphics;
mod pipeline;
mod system;

pub use capture::{apply_scene_defaults, capture_variants, reset_scene_defaults};
pub use diff::{Capability, StateChange, StateDiff};
pub use graphics::{
    ATTRIB_NORMAL, ATTRIB_POS, ATTRIB_UV, GraphicsState, MAX_VERTEX_ATTRIBUTES, VERTEX_STRIDE,
    VertexAttribute, VertexFormat, default_vertex_layout,
};
pub use pipeline::{DriverStates, HostStates, PipelineState};
pub use system::StateSystem;
