use crate::address::{AddressRange, DeviceAddress};

/// The four token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    UniformAddress,
    AttributeAddress,
    ElementAddress,
    DrawElements,
}

impl TokenKind {
    pub const ALL: [TokenKind; 4] = [
        TokenKind::UniformAddress,
        TokenKind::AttributeAddress,
        TokenKind::ElementAddress,
        TokenKind::DrawElements,
    ];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

/// Shader stages a uniform block can be bound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    Vertex,
    Geometry,
    Fragment,
}

impl ShaderStage {
    pub const ALL: [ShaderStage; 3] = [ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment];

    #[inline]
    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    U16,
    U32,
}

impl IndexType {
    pub fn size_bytes(self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }

    pub fn from_size_bytes(size: u32) -> Option<Self> {
        match size {
            2 => Some(IndexType::U16),
            4 => Some(IndexType::U32),
            _ => None,
        }
    }
}

/// Primitive assembly mode. Codes match the GL enum values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveMode {
    Points,
    Lines,
    #[default]
    Triangles,
    TriangleStrip,
}

impl PrimitiveMode {
    pub fn code(self) -> u32 {
        match self {
            PrimitiveMode::Points => 0x0000,
            PrimitiveMode::Lines => 0x0001,
            PrimitiveMode::Triangles => 0x0004,
            PrimitiveMode::TriangleStrip => 0x0005,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0x0000 => Some(PrimitiveMode::Points),
            0x0001 => Some(PrimitiveMode::Lines),
            0x0004 => Some(PrimitiveMode::Triangles),
            0x0005 => Some(PrimitiveMode::TriangleStrip),
            _ => None,
        }
    }
}

/// One decoded command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    BindUniform {
        slot: u16,
        stage: ShaderStage,
        range: AddressRange,
    },
    BindVertexBuffer {
        binding: u32,
        address: DeviceAddress,
    },
    BindIndexBuffer {
        index_type: IndexType,
        address: DeviceAddress,
    },
    DrawIndexed {
        count: u32,
        mode: PrimitiveMode,
    },
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::BindUniform { .. } => TokenKind::UniformAddress,
            Token::BindVertexBuffer { .. } => TokenKind::AttributeAddress,
            Token::BindIndexBuffer { .. } => TokenKind::ElementAddress,
            Token::DrawIndexed { .. } => TokenKind::DrawElements,
        }
    }
}
