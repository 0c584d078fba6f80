//! Per-variant binding policy.
//!
//! Which stages consume the per-object uniform block is scene business logic:
//! the geometry-stage variant reads it in its geometry shader, the simple
//! variant does not. It is kept as a table, one entry per known variant.

use crate::handle::ProgramId;
use crate::token::{IndexType, ShaderStage};

use super::PipelineVariant;

pub const SCENE_UNIFORM_SLOT: u16 = 0;
pub const OBJECT_UNIFORM_SLOT: u16 = 1;
pub const VERTEX_BINDING: u32 = 0;
pub const OBJECT_INDEX_TYPE: IndexType = IndexType::U32;

/// Stages the global scene block is bound for.
pub const SCENE_UNIFORM_STAGES: &[ShaderStage] =
    &[ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantPolicy {
    pub variant: PipelineVariant,
    /// Logical program drawing this variant.
    pub program: ProgramId,
    /// Stages the per-object block is bound for, in emission order.
    pub object_uniform_stages: &'static [ShaderStage],
}

const POLICIES: [VariantPolicy; 2] = [
    VariantPolicy {
        variant: PipelineVariant::Simple,
        program: ProgramId(0),
        object_uniform_stages: &[ShaderStage::Vertex, ShaderStage::Fragment],
    },
    VariantPolicy {
        variant: PipelineVariant::GeometryStage,
        program: ProgramId(1),
        object_uniform_stages: &[ShaderStage::Vertex, ShaderStage::Fragment, ShaderStage::Geometry],
    },
];

pub fn policy(variant: PipelineVariant) -> &'static VariantPolicy {
    match variant {
        PipelineVariant::Simple => &POLICIES[0],
        PipelineVariant::GeometryStage => &POLICIES[1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_geometry_variant_binds_geometry_stage() {
        assert!(!policy(PipelineVariant::Simple)
            .object_uniform_stages
            .contains(&ShaderStage::Geometry));
        assert!(policy(PipelineVariant::GeometryStage)
            .object_uniform_stages
            .contains(&ShaderStage::Geometry));
    }

    #[test]
    fn table_is_keyed_by_variant() {
        for v in PipelineVariant::ALL {
            assert_eq!(policy(v).variant, v);
        }
        assert_ne!(
            policy(PipelineVariant::Simple).program,
            policy(PipelineVariant::GeometryStage).program
        );
    }
}
