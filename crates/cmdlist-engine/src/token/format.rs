use super::{ShaderStage, TokenKind};

/// Which header vocabulary a stream was encoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeaderKind {
    /// Fixed command ids, understood by the host interpreter.
    Generic,
    /// Opaque words provided by the driver's command-list extension.
    Hardware,
}

/// Header and stage-index table for one token vocabulary.
///
/// Both vocabularies encode the same information; only the header words and
/// the per-stage indices differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TokenFormat {
    kind: HeaderKind,
    headers: [u32; 4],
    stages: [u16; 3],
}

impl TokenFormat {
    pub const GENERIC_UNIFORM_ADDRESS: u32 = 0xa;
    pub const GENERIC_ATTRIBUTE_ADDRESS: u32 = 0x9;
    pub const GENERIC_ELEMENT_ADDRESS: u32 = 0x8;
    pub const GENERIC_DRAW_ELEMENTS: u32 = 0x2;

    /// Generic stage indices: vertex 0, geometry 3, fragment 4.
    pub const GENERIC_STAGES: [u16; 3] = [0, 3, 4];

    pub const fn generic() -> Self {
        Self {
            kind: HeaderKind::Generic,
            headers: [
                Self::GENERIC_UNIFORM_ADDRESS,
                Self::GENERIC_ATTRIBUTE_ADDRESS,
                Self::GENERIC_ELEMENT_ADDRESS,
                Self::GENERIC_DRAW_ELEMENTS,
            ],
            stages: Self::GENERIC_STAGES,
        }
    }

    /// Builds a driver-provided table.
    ///
    /// `headers` is indexed in [`TokenKind::ALL`] order and `stages` in
    /// [`ShaderStage::ALL`] order. Entries must be pairwise distinct.
    pub fn hardware(headers: [u32; 4], stages: [u16; 3]) -> Self {
        debug_assert!(
            all_distinct(&headers),
            "hardware token headers must be distinct: {headers:?}"
        );
        debug_assert!(
            all_distinct(&stages),
            "hardware stage indices must be distinct: {stages:?}"
        );
        Self {
            kind: HeaderKind::Hardware,
            headers,
            stages,
        }
    }

    #[inline]
    pub fn header_kind(&self) -> HeaderKind {
        self.kind
    }

    #[inline]
    pub fn header(&self, kind: TokenKind) -> u32 {
        self.headers[kind.index()]
    }

    pub fn kind_of(&self, header: u32) -> Option<TokenKind> {
        TokenKind::ALL.into_iter().find(|k| self.header(*k) == header)
    }

    #[inline]
    pub fn stage_index(&self, stage: ShaderStage) -> u16 {
        self.stages[stage.index()]
    }

    pub fn stage_of(&self, index: u16) -> Option<ShaderStage> {
        ShaderStage::ALL.into_iter().find(|s| self.stage_index(*s) == index)
    }
}

impl Default for TokenFormat {
    fn default() -> Self {
        Self::generic()
    }
}

fn all_distinct<T: PartialEq>(items: &[T]) -> bool {
    items
        .iter()
        .enumerate()
        .all(|(i, a)| items[i + 1..].iter().all(|b| a != b))
}
