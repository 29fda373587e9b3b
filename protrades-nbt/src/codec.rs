//! Text codec for tag data.
//!
//! A value is written as a 4-byte frame magic followed by its bincode
//! encoding, gzip-compressed, then base64-encoded so it can sit inside a
//! plain string field of a configuration record.
//!
//! Decoding is all-or-nothing: any damage to the text yields an error and
//! never a partially populated value.

use crate::{CodecError, CodecResult, CompoundTag, MAX_DEPTH};
use base64::{Engine, engine::general_purpose::STANDARD};
use bincode::Options;
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};

/// Largest decompressed payload accepted by [`unseal`] (8 MiB).
pub const MAX_PAYLOAD_BYTES: u64 = 8 * 1024 * 1024;

/// Identifies what a sealed payload contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// A bare [`CompoundTag`].
    Compound,
    /// A whole item (type, quantity, metadata).
    Item,
}

impl Frame {
    /// Magic bytes written ahead of the binary payload. The last byte is
    /// the format version.
    #[must_use]
    pub const fn magic(self) -> &'static [u8; 4] {
        match self {
            Frame::Compound => b"PTC1",
            Frame::Item => b"PTI1",
        }
    }
}

fn binary_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_PAYLOAD_BYTES)
        .reject_trailing_bytes()
}

/// Encodes a compound to its portable text form.
///
/// Compounds nested deeper than [`MAX_DEPTH`] are refused, since
/// [`decode`] would reject them.
pub fn encode(tag: &CompoundTag) -> CodecResult<String> {
    let depth = tag.depth();
    if depth > MAX_DEPTH {
        return Err(CodecError::InvalidPayload(format!(
            "compound nesting of {depth} exceeds {MAX_DEPTH} levels"
        )));
    }
    seal(Frame::Compound, tag)
}

/// Decodes a compound from its portable text form.
pub fn decode(text: &str) -> CodecResult<CompoundTag> {
    unseal(Frame::Compound, text)
}

/// Serializes `value` behind `frame`'s magic, compresses and base64-encodes it.
pub fn seal<T: Serialize>(frame: Frame, value: &T) -> CodecResult<String> {
    let mut raw = Vec::with_capacity(128);
    raw.extend_from_slice(frame.magic());
    binary_options().serialize_into(&mut raw, value)?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw)?;
    let compressed = encoder.finish()?;

    Ok(STANDARD.encode(compressed))
}

/// Reverses [`seal`]. ASCII whitespace in `text` is ignored so wrapped
/// base64 lines decode too.
pub fn unseal<T: DeserializeOwned>(frame: Frame, text: &str) -> CodecResult<T> {
    let cleaned: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(CodecError::Empty);
    }

    let compressed = STANDARD.decode(cleaned.as_bytes())?;

    let mut raw = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .take(MAX_PAYLOAD_BYTES + 1)
        .read_to_end(&mut raw)?;
    if raw.len() as u64 > MAX_PAYLOAD_BYTES {
        return Err(CodecError::TooLarge(MAX_PAYLOAD_BYTES));
    }

    let body = raw
        .strip_prefix(frame.magic().as_slice())
        .ok_or(CodecError::BadHeader)?;

    Ok(binary_options().deserialize(body)?)
}
