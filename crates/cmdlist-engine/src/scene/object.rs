use crate::address::{AddressRange, DeviceAddress};

/// Uniform buffer offset alignment assumed for per-object blocks.
pub const UNIFORM_ALIGNMENT: u64 = 256;

/// Rounds a uniform block size up to [`UNIFORM_ALIGNMENT`].
#[inline]
pub fn uniform_aligned(size: u64) -> u64 {
    size.div_ceil(UNIFORM_ALIGNMENT) * UNIFORM_ALIGNMENT
}

/// The two pipeline configurations the scene alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PipelineVariant {
    Simple,
    /// Adds a geometry stage that also consumes the per-object uniforms.
    GeometryStage,
}

impl PipelineVariant {
    pub const ALL: [PipelineVariant; 2] = [PipelineVariant::Simple, PipelineVariant::GeometryStage];
}

/// One drawable object. Immutable once the scene is generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectRecord {
    pub vertex: DeviceAddress,
    pub index: DeviceAddress,
    pub index_count: u32,
    pub variant: PipelineVariant,
}

/// Uniform block addresses shared by the whole scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBindings {
    /// Global scene block, bound once before the object loop.
    pub scene_uniform: AddressRange,
    /// Start of the per-object block array.
    pub object_uniforms: DeviceAddress,
    /// Distance between consecutive object blocks.
    pub object_stride: u64,
    /// Bound size of one object block.
    pub object_size: u64,
}

impl SceneBindings {
    /// Uniform range for object `index`.
    #[inline]
    pub fn object_uniform(&self, index: usize) -> AddressRange {
        AddressRange::new(
            self.object_uniforms.offset(self.object_stride * index as u64),
            self.object_size,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scene {
    pub objects: Vec<ObjectRecord>,
    pub bindings: SceneBindings,
}

impl Scene {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_sizes() {
        assert_eq!(uniform_aligned(1), 256);
        assert_eq!(uniform_aligned(256), 256);
        assert_eq!(uniform_aligned(257), 512);
    }

    #[test]
    fn object_uniform_strides() {
        let bindings = SceneBindings {
            scene_uniform: AddressRange::new(DeviceAddress(0x1_0000_0000), 128),
            object_uniforms: DeviceAddress(0x1_0001_0000),
            object_stride: 256,
            object_size: 80,
        };
        let r = bindings.object_uniform(3);
        assert_eq!(r.address, DeviceAddress(0x1_0001_0300));
        assert_eq!(r.size, 80);
    }
}
