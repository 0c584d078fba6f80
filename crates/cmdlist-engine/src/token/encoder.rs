use super::reader::TokenReader;
use super::record::{
    AttributeAddressRecord, DrawElementsRecord, ElementAddressRecord, UniformAddressRecord,
};
use super::{Token, TokenFormat, TokenKind};

/// Finished, immutable token bytes plus the format they were encoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenStream {
    format: TokenFormat,
    bytes: Vec<u8>,
}

impl TokenStream {
    #[inline]
    pub fn format(&self) -> &TokenFormat {
        &self.format
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Decodes the whole stream.
    pub fn reader(&self) -> TokenReader<'_> {
        TokenReader::new(&self.format, &self.bytes)
    }
}

/// Appends token records to a growing byte buffer.
///
/// Encoding is pure serialization; nothing is sent to a device.
#[derive(Debug)]
pub struct TokenEncoder {
    format: TokenFormat,
    bytes: Vec<u8>,
}

impl TokenEncoder {
    pub fn new(format: TokenFormat) -> Self {
        Self {
            format,
            bytes: Vec::new(),
        }
    }

    pub fn with_capacity(format: TokenFormat, bytes: usize) -> Self {
        Self {
            format,
            bytes: Vec::with_capacity(bytes),
        }
    }

    /// Current end of the stream in bytes.
    #[inline]
    pub fn offset(&self) -> usize {
        self.bytes.len()
    }

    /// Appends one record and returns the offset it was written at.
    pub fn encode(&mut self, token: &Token) -> usize {
        let offset = self.bytes.len();
        let header = self.format.header(token.kind());

        match *token {
            Token::BindUniform { slot, stage, range } => {
                debug_assert!(
                    range.size <= u64::from(u32::MAX),
                    "uniform range of {} bytes does not fit a token",
                    range.size
                );
                let record = UniformAddressRecord {
                    header,
                    slot,
                    stage: self.format.stage_index(stage),
                    address_lo: range.address.lo(),
                    address_hi: range.address.hi(),
                    size: range.size as u32,
                    _pad: 0,
                };
                self.bytes.extend_from_slice(bytemuck::bytes_of(&record));
            }
            Token::BindVertexBuffer { binding, address } => {
                let record = AttributeAddressRecord {
                    header,
                    binding,
                    address_lo: address.lo(),
                    address_hi: address.hi(),
                };
                self.bytes.extend_from_slice(bytemuck::bytes_of(&record));
            }
            Token::BindIndexBuffer { index_type, address } => {
                let record = ElementAddressRecord {
                    header,
                    address_lo: address.lo(),
                    address_hi: address.hi(),
                    type_size_bytes: index_type.size_bytes(),
                };
                self.bytes.extend_from_slice(bytemuck::bytes_of(&record));
            }
            Token::DrawIndexed { count, mode } => {
                let record = DrawElementsRecord {
                    header,
                    count,
                    first_index: 0,
                    base_vertex: 0,
                    mode: mode.code(),
                    _pad: 0,
                };
                self.bytes.extend_from_slice(bytemuck::bytes_of(&record));
            }
        }

        offset
    }

    pub fn finish(self) -> TokenStream {
        TokenStream {
            format: self.format,
            bytes: self.bytes,
        }
    }
}

/// Encoded size of one record of `kind`.
pub(crate) fn record_size(kind: TokenKind) -> usize {
    match kind {
        TokenKind::UniformAddress => UniformAddressRecord::SIZE_BYTES,
        TokenKind::AttributeAddress => AttributeAddressRecord::SIZE_BYTES,
        TokenKind::ElementAddress => ElementAddressRecord::SIZE_BYTES,
        TokenKind::DrawElements => DrawElementsRecord::SIZE_BYTES,
    }
}
