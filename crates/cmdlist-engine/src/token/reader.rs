use std::fmt;

use crate::address::{AddressRange, DeviceAddress};

use super::encoder::record_size;
use super::record::{
    AttributeAddressRecord, DrawElementsRecord, ElementAddressRecord, UniformAddressRecord,
};
use super::{IndexType, PrimitiveMode, Token, TokenFormat, TokenKind};

/// Malformed token data.
///
/// Offsets are absolute stream offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Truncated { offset: usize, needed: usize, available: usize },
    UnknownHeader { offset: usize, header: u32 },
    UnknownStage { offset: usize, stage: u16 },
    UnknownIndexType { offset: usize, size_bytes: u32 },
    UnknownMode { offset: usize, mode: u32 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated {
                offset,
                needed,
                available,
            } => write!(
                f,
                "token at offset {offset} needs {needed} bytes but only {available} remain"
            ),
            DecodeError::UnknownHeader { offset, header } => {
                write!(f, "unknown token header 0x{header:08x} at offset {offset}")
            }
            DecodeError::UnknownStage { offset, stage } => {
                write!(f, "unknown shader stage index {stage} at offset {offset}")
            }
            DecodeError::UnknownIndexType { offset, size_bytes } => {
                write!(f, "unsupported index size {size_bytes} at offset {offset}")
            }
            DecodeError::UnknownMode { offset, mode } => {
                write!(f, "unknown primitive mode 0x{mode:04x} at offset {offset}")
            }
        }
    }
}

impl std::error::Error for DecodeError {}

/// Iterator decoding records from a token byte range.
///
/// Yields `(offset, token)` pairs. After the first error the iterator is
/// exhausted.
#[derive(Debug, Clone)]
pub struct TokenReader<'a> {
    format: &'a TokenFormat,
    bytes: &'a [u8],
    base: usize,
    pos: usize,
    failed: bool,
}

impl<'a> TokenReader<'a> {
    pub fn new(format: &'a TokenFormat, bytes: &'a [u8]) -> Self {
        Self::with_base(format, bytes, 0)
    }

    /// Reads a sub-range of a larger stream. `base` is the absolute offset of
    /// `bytes[0]` and is added to every reported offset.
    pub fn with_base(format: &'a TokenFormat, bytes: &'a [u8], base: usize) -> Self {
        Self {
            format,
            bytes,
            base,
            pos: 0,
            failed: false,
        }
    }

    fn decode_at(&self, pos: usize) -> Result<(Token, usize), DecodeError> {
        let offset = self.base + pos;
        let rest = &self.bytes[pos..];

        if rest.len() < 4 {
            return Err(DecodeError::Truncated {
                offset,
                needed: 4,
                available: rest.len(),
            });
        }
        let header: u32 = bytemuck::pod_read_unaligned(&rest[..4]);
        let kind = self
            .format
            .kind_of(header)
            .ok_or(DecodeError::UnknownHeader { offset, header })?;

        let size = record_size(kind);
        if rest.len() < size {
            return Err(DecodeError::Truncated {
                offset,
                needed: size,
                available: rest.len(),
            });
        }
        let raw = &rest[..size];

        let token = match kind {
            TokenKind::UniformAddress => {
                let r: UniformAddressRecord = bytemuck::pod_read_unaligned(raw);
                let stage = self
                    .format
                    .stage_of(r.stage)
                    .ok_or(DecodeError::UnknownStage { offset, stage: r.stage })?;
                Token::BindUniform {
                    slot: r.slot,
                    stage,
                    range: AddressRange::new(
                        DeviceAddress::from_parts(r.address_lo, r.address_hi),
                        u64::from(r.size),
                    ),
                }
            }
            TokenKind::AttributeAddress => {
                let r: AttributeAddressRecord = bytemuck::pod_read_unaligned(raw);
                Token::BindVertexBuffer {
                    binding: r.binding,
                    address: DeviceAddress::from_parts(r.address_lo, r.address_hi),
                }
            }
            TokenKind::ElementAddress => {
                let r: ElementAddressRecord = bytemuck::pod_read_unaligned(raw);
                let index_type = IndexType::from_size_bytes(r.type_size_bytes).ok_or(
                    DecodeError::UnknownIndexType {
                        offset,
                        size_bytes: r.type_size_bytes,
                    },
                )?;
                Token::BindIndexBuffer {
                    index_type,
                    address: DeviceAddress::from_parts(r.address_lo, r.address_hi),
                }
            }
            TokenKind::DrawElements => {
                let r: DrawElementsRecord = bytemuck::pod_read_unaligned(raw);
                let mode = PrimitiveMode::from_code(r.mode)
                    .ok_or(DecodeError::UnknownMode { offset, mode: r.mode })?;
                debug_assert!(
                    r.first_index == 0 && r.base_vertex == 0,
                    "draw records always start at index 0 with base vertex 0"
                );
                Token::DrawIndexed { count: r.count, mode }
            }
        };

        Ok((token, size))
    }
}

impl Iterator for TokenReader<'_> {
    type Item = Result<(usize, Token), DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        let offset = self.base + self.pos;
        match self.decode_at(self.pos) {
            Ok((token, size)) => {
                self.pos += size;
                Some(Ok((offset, token)))
            }
            Err(err) => {
                self.failed = true;
                Some(Err(err))
            }
        }
    }
}
