use crate::handle::ProgramHandle;

use crate::scene::VERTEX_BINDING;

pub const MAX_VERTEX_ATTRIBUTES: usize = 4;

pub const ATTRIB_POS: u32 = 0;
pub const ATTRIB_NORMAL: u32 = 1;
pub const ATTRIB_UV: u32 = 2;

/// Stride of the scene's interleaved vertex format.
pub const VERTEX_STRIDE: u32 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32x2,
    Float32x3,
    /// Four normalized `i16`; the scene stores normals padded to four lanes.
    Snorm16x4,
}

impl VertexFormat {
    pub fn size_bytes(self) -> u32 {
        match self {
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Snorm16x4 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    pub format: VertexFormat,
    pub offset: u32,
    pub binding: u32,
}

/// Snapshot of the state the scene's draws depend on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GraphicsState {
    pub program: Option<ProgramHandle>,
    pub depth_test: bool,
    pub cull_face: bool,
    /// Enabled attributes by location.
    pub attributes: [Option<VertexAttribute>; MAX_VERTEX_ATTRIBUTES],
    pub vertex_stride: u32,
}

/// Position, normal and uv, interleaved in one buffer.
pub fn default_vertex_layout() -> [Option<VertexAttribute>; MAX_VERTEX_ATTRIBUTES] {
    let mut attributes = [None; MAX_VERTEX_ATTRIBUTES];
    attributes[ATTRIB_POS as usize] = Some(VertexAttribute {
        format: VertexFormat::Float32x3,
        offset: 0,
        binding: VERTEX_BINDING,
    });
    attributes[ATTRIB_NORMAL as usize] = Some(VertexAttribute {
        format: VertexFormat::Snorm16x4,
        offset: 16,
        binding: VERTEX_BINDING,
    });
    attributes[ATTRIB_UV as usize] = Some(VertexAttribute {
        format: VertexFormat::Float32x2,
        offset: 24,
        binding: VERTEX_BINDING,
    });
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_fits_stride() {
        for attr in default_vertex_layout().iter().flatten() {
            assert!(attr.offset + attr.format.size_bytes() <= VERTEX_STRIDE);
        }
    }
}
