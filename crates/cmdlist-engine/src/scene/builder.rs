use crate::handle::{FramebufferId, StateObjectId};
use crate::token::{PrimitiveMode, Token, TokenEncoder, TokenFormat};

use super::policy::{
    OBJECT_INDEX_TYPE, OBJECT_UNIFORM_SLOT, SCENE_UNIFORM_SLOT, SCENE_UNIFORM_STAGES,
    VERTEX_BINDING, policy,
};
use super::{PipelineVariant, Scene, Segment, TokenSequence};

/// State objects for the two pipeline variants, in one id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VariantStates {
    pub simple: StateObjectId,
    pub geometry: StateObjectId,
}

impl VariantStates {
    #[inline]
    pub fn get(&self, variant: PipelineVariant) -> StateObjectId {
        match variant {
            PipelineVariant::Simple => self.simple,
            PipelineVariant::GeometryStage => self.geometry,
        }
    }

    pub fn variant_of(&self, state: StateObjectId) -> Option<PipelineVariant> {
        PipelineVariant::ALL.into_iter().find(|v| self.get(*v) == state)
    }

    /// Maps `state` from this id space into `to`.
    ///
    /// Panics if `state` is not one of ours.
    pub fn translate(&self, state: StateObjectId, to: &VariantStates) -> StateObjectId {
        let variant = self
            .variant_of(state)
            .unwrap_or_else(|| panic!("{state} does not belong to {self:?}"));
        to.get(variant)
    }
}

/// Builds a [`TokenSequence`] from a scene.
///
/// Token layout: the scene uniform block for every stage in
/// [`SCENE_UNIFORM_STAGES`], then per object the vertex buffer, index buffer,
/// per-object uniform block (one token per stage of the variant policy) and
/// the draw.
#[derive(Debug, Clone)]
pub struct SegmentBuilder {
    format: TokenFormat,
    states: VariantStates,
    framebuffer: FramebufferId,
    filter_states: bool,
    primitive: PrimitiveMode,
}

impl SegmentBuilder {
    pub fn new(format: TokenFormat, states: VariantStates, framebuffer: FramebufferId) -> Self {
        Self {
            format,
            states,
            framebuffer,
            filter_states: true,
            primitive: PrimitiveMode::Triangles,
        }
    }

    /// With filtering off, every object starts a new segment.
    pub fn filter_states(mut self, enabled: bool) -> Self {
        self.filter_states = enabled;
        self
    }

    pub fn primitive(mut self, mode: PrimitiveMode) -> Self {
        self.primitive = mode;
        self
    }

    pub fn build(&self, scene: &Scene) -> TokenSequence {
        let bindings = &scene.bindings;
        let mut encoder = TokenEncoder::with_capacity(self.format, estimate_bytes(scene));
        let mut segments = Vec::new();

        for &stage in SCENE_UNIFORM_STAGES {
            encoder.encode(&Token::BindUniform {
                slot: SCENE_UNIFORM_SLOT,
                stage,
                range: bindings.scene_uniform,
            });
        }

        let mut start = 0;
        let mut last: Option<StateObjectId> = None;

        for (i, object) in scene.objects.iter().enumerate() {
            let needed = self.states.get(object.variant);

            if let Some(current) = last {
                if current != needed || !self.filter_states {
                    let offset = encoder.offset();
                    segments.push(self.segment(start, offset, current));
                    start = offset;
                }
            }
            last = Some(needed);

            encoder.encode(&Token::BindVertexBuffer {
                binding: VERTEX_BINDING,
                address: object.vertex,
            });
            encoder.encode(&Token::BindIndexBuffer {
                index_type: OBJECT_INDEX_TYPE,
                address: object.index,
            });
            let range = bindings.object_uniform(i);
            for &stage in policy(object.variant).object_uniform_stages {
                encoder.encode(&Token::BindUniform {
                    slot: OBJECT_UNIFORM_SLOT,
                    stage,
                    range,
                });
            }
            encoder.encode(&Token::DrawIndexed {
                count: object.index_count,
                mode: self.primitive,
            });
        }

        // The final run is always closed; an empty scene still yields one
        // segment holding the scene uniform tokens.
        let end = encoder.offset();
        let state = last.unwrap_or(self.states.simple);
        segments.push(self.segment(start, end, state));

        let sequence = TokenSequence::new(encoder.finish(), segments);
        log::debug!(
            "built token sequence: {} objects, {} bytes, {} segments",
            scene.len(),
            sequence.stream().len(),
            sequence.segments().len()
        );
        sequence
    }

    fn segment(&self, start: usize, end: usize, state: StateObjectId) -> Segment {
        Segment {
            offset: start,
            size: end - start,
            state,
            framebuffer: self.framebuffer,
        }
    }
}

/// Upper bound on the encoded size, so the encoder allocates once.
fn estimate_bytes(scene: &Scene) -> usize {
    use crate::token::{
        AttributeAddressRecord, DrawElementsRecord, ElementAddressRecord, UniformAddressRecord,
    };
    let per_object = AttributeAddressRecord::SIZE_BYTES
        + ElementAddressRecord::SIZE_BYTES
        + 3 * UniformAddressRecord::SIZE_BYTES
        + DrawElementsRecord::SIZE_BYTES;
    SCENE_UNIFORM_STAGES.len() * UniformAddressRecord::SIZE_BYTES + scene.len() * per_object
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressRange, DeviceAddress};
    use crate::scene::{ObjectRecord, SceneBindings};
    use crate::token::{ShaderStage, TokenKind, UniformAddressRecord};

    const STATES: VariantStates = VariantStates {
        simple: StateObjectId(11),
        geometry: StateObjectId(12),
    };

    fn scene(variants: &[PipelineVariant]) -> Scene {
        let objects = variants
            .iter()
            .enumerate()
            .map(|(i, &variant)| ObjectRecord {
                vertex: DeviceAddress(0x1_0000_0000 + i as u64 * 0x1000),
                index: DeviceAddress(0x2_0000_0000 + i as u64 * 0x1000),
                index_count: 36,
                variant,
            })
            .collect();
        Scene {
            objects,
            bindings: SceneBindings {
                scene_uniform: AddressRange::new(DeviceAddress(0x3_0000_0000), 128),
                object_uniforms: DeviceAddress(0x4_0000_0000),
                object_stride: 256,
                object_size: 80,
            },
        }
    }

    fn builder() -> SegmentBuilder {
        SegmentBuilder::new(TokenFormat::generic(), STATES, FramebufferId(5))
    }

    use PipelineVariant::{GeometryStage as B, Simple as A};

    // ── segmentation ──────────────────────────────────────────────────────

    #[test]
    fn aab_filtered_gives_two_runs() {
        let seq = builder().build(&scene(&[A, A, B]));
        let segs = seq.segments();
        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0].state, STATES.simple);
        assert_eq!(segs[1].state, STATES.geometry);
        assert!(seq.tiles_stream());

        let draws = |s: &Segment| {
            seq.segment_tokens(s)
                .filter(|t| t.as_ref().unwrap().1.kind() == TokenKind::DrawElements)
                .count()
        };
        assert_eq!(draws(&segs[0]), 2);
        assert_eq!(draws(&segs[1]), 1);
    }

    #[test]
    fn aab_unfiltered_breaks_every_object() {
        let seq = builder().filter_states(false).build(&scene(&[A, A, B]));
        let states: Vec<_> = seq.segments().iter().map(|s| s.state).collect();
        assert_eq!(states, vec![STATES.simple, STATES.simple, STATES.geometry]);
        assert!(seq.tiles_stream());
    }

    #[test]
    fn empty_scene_has_one_uniform_only_segment() {
        let seq = builder().build(&scene(&[]));
        assert_eq!(seq.segments().len(), 1);
        assert_eq!(seq.segments()[0].size, 3 * UniformAddressRecord::SIZE_BYTES);

        let tokens: Vec<Token> = seq.stream().reader().map(|t| t.unwrap().1).collect();
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.kind() == TokenKind::UniformAddress));
    }

    #[test]
    fn consecutive_filtered_segments_differ() {
        let seq = builder().build(&scene(&[A, B, B, A, A, A, B, A]));
        for pair in seq.segments().windows(2) {
            assert_ne!(pair[0].state, pair[1].state);
        }
        assert_eq!(seq.segments().len(), 5);
    }

    // ── token order ───────────────────────────────────────────────────────

    #[test]
    fn object_run_order_and_stage_policy() {
        let seq = builder().build(&scene(&[B]));
        let tokens: Vec<Token> = seq.stream().reader().map(|t| t.unwrap().1).collect();

        let kinds: Vec<_> = tokens.iter().map(Token::kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::UniformAddress,
                TokenKind::UniformAddress,
                TokenKind::UniformAddress,
                TokenKind::AttributeAddress,
                TokenKind::ElementAddress,
                TokenKind::UniformAddress,
                TokenKind::UniformAddress,
                TokenKind::UniformAddress,
                TokenKind::DrawElements,
            ]
        );
        let object_stages: Vec<_> = tokens[5..8]
            .iter()
            .map(|t| match t {
                Token::BindUniform { stage, slot, .. } => {
                    assert_eq!(*slot, OBJECT_UNIFORM_SLOT);
                    *stage
                }
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            object_stages,
            vec![ShaderStage::Vertex, ShaderStage::Fragment, ShaderStage::Geometry]
        );
    }

    #[test]
    fn rebuild_is_byte_identical() {
        let s = scene(&[A, B, A, B, B]);
        assert_eq!(builder().build(&s), builder().build(&s));
    }

    #[test]
    fn restate_and_retarget() {
        let mut seq = builder().build(&scene(&[A, B]));
        let host = VariantStates {
            simple: StateObjectId(1),
            geometry: StateObjectId(2),
        };
        let remapped = seq.remapped(&STATES, &host);
        assert_eq!(remapped[0].state, StateObjectId(1));
        assert_eq!(remapped[1].state, StateObjectId(2));
        assert_eq!(remapped[1].range(), seq.segments()[1].range());

        let bytes = seq.stream().clone();
        seq.retarget(FramebufferId(9));
        assert!(seq.segments().iter().all(|s| s.framebuffer == FramebufferId(9)));
        assert_eq!(seq.stream(), &bytes);
    }
}
