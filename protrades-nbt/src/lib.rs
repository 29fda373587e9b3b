//! Compound tag store and tag codec for ProTrades.
//!
//! This crate defines the portable representation of item metadata:
//! - [`CompoundTag`]: ordered map from string keys to typed values
//! - [`TagValue`] / [`TagKind`]: the value kinds a tag can hold
//! - [`codec`]: compact text encoding for durable storage
//!
//! Nothing here knows what a tag means; interpretation belongs to callers.

pub mod codec;
mod compound;
mod de;
mod value;

pub use compound::CompoundTag;
pub use value::{TagKind, TagValue};

/// Deepest compound nesting accepted anywhere in the engine. A top-level
/// compound is level 1.
pub const MAX_DEPTH: usize = 128;

/// Result type alias using the crate's error type.
pub type CodecResult<T> = std::result::Result<T, CodecError>;

/// Errors raised while encoding or decoding tag text.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("empty input")]
    Empty,

    #[error("invalid base64 text: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("binary encoding error: {0}")]
    Binary(#[from] bincode::Error),

    #[error("unrecognized payload header")]
    BadHeader,

    #[error("payload exceeds {0} bytes")]
    TooLarge(u64),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}
