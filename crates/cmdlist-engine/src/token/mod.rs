//! Binary command tokens.
//!
//! A token stream is a flat byte buffer of fixed-layout records, each one led
//! by a `u32` header naming its kind. Two header vocabularies exist, the
//! driver's opaque words and the generic command ids. A [`TokenFormat`] is
//! the table translating between them and [`TokenKind`].

mod encoder;
mod format;
mod kind;
mod reader;
mod record;

pub use encoder::{TokenEncoder, TokenStream};
pub use format::{HeaderKind, TokenFormat};
pub use kind::{IndexType, PrimitiveMode, ShaderStage, Token, TokenKind};
pub use reader::{DecodeError, TokenReader};
pub use record::{
    AttributeAddressRecord, DrawElementsRecord, ElementAddressRecord, UniformAddressRecord,
};
