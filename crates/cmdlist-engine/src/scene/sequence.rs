use std::ops::Range;

use crate::handle::{FramebufferId, StateObjectId};
use crate::token::{TokenReader, TokenStream};

use super::VariantStates;

/// Contiguous run of tokens drawn with one state object into one target.
///
/// A segment names its state object but does not own it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Byte offset of the first token.
    pub offset: usize,
    /// Length in bytes.
    pub size: usize,
    pub state: StateObjectId,
    pub framebuffer: FramebufferId,
}

impl Segment {
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.size
    }

    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Token bytes plus their segmentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSequence {
    stream: TokenStream,
    segments: Vec<Segment>,
}

impl TokenSequence {
    pub fn new(stream: TokenStream, segments: Vec<Segment>) -> Self {
        let sequence = Self { stream, segments };
        debug_assert!(
            sequence.tiles_stream(),
            "segments must tile the token stream without gaps or overlaps"
        );
        sequence
    }

    #[inline]
    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }

    #[inline]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Token bytes covered by `segment`.
    pub fn segment_bytes(&self, segment: &Segment) -> &[u8] {
        &self.stream.as_bytes()[segment.range()]
    }

    /// Decodes the tokens of one segment with absolute offsets.
    pub fn segment_tokens(&self, segment: &Segment) -> TokenReader<'_> {
        TokenReader::with_base(self.stream.format(), self.segment_bytes(segment), segment.offset)
    }

    /// True if the segments cover `0..len` in order with no gaps or overlaps
    /// and there is at least one segment.
    pub fn tiles_stream(&self) -> bool {
        let mut cursor = 0;
        for segment in &self.segments {
            if segment.offset != cursor {
                return false;
            }
            cursor = segment.end();
        }
        !self.segments.is_empty() && cursor == self.stream.len()
    }

    /// Points every segment at `framebuffer`. Token bytes are untouched.
    pub fn retarget(&mut self, framebuffer: FramebufferId) {
        for segment in &mut self.segments {
            segment.framebuffer = framebuffer;
        }
    }

    /// Replaces state references from `from` with the matching ones in `to`.
    pub fn restate(&mut self, from: &VariantStates, to: &VariantStates) {
        for segment in &mut self.segments {
            segment.state = from.translate(segment.state, to);
        }
    }

    /// Segment list with state references translated from `from` to `to`.
    pub fn remapped(&self, from: &VariantStates, to: &VariantStates) -> Vec<Segment> {
        self.segments
            .iter()
            .map(|s| Segment {
                state: from.translate(s.state, to),
                ..*s
            })
            .collect()
    }
}
