//! Scene description and token sequence construction.
//!
//! The scene is a fixed, ordered list of objects, each drawn with one of two
//! pipeline variants. [`SegmentBuilder`] turns it into a [`TokenSequence`]:
//! the token bytes plus the segments cutting them at state-object changes.

mod builder;
pub mod generate;
mod object;
mod policy;
mod sequence;

pub use builder::{SegmentBuilder, VariantStates};
pub use object::{ObjectRecord, PipelineVariant, Scene, SceneBindings, UNIFORM_ALIGNMENT, uniform_aligned};
pub use policy::{
    OBJECT_INDEX_TYPE, OBJECT_UNIFORM_SLOT, SCENE_UNIFORM_SLOT, SCENE_UNIFORM_STAGES, VERTEX_BINDING,
    VariantPolicy, policy,
};
pub use sequence::{Segment, TokenSequence};
