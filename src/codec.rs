//! Boundary-safe encodings for configuration collections.
//!
//! The engine's bootstrap entry point cannot accept host collection types, so
//! every list and mapping crosses the boundary as an ordered sequence of
//! opaque byte blocks. Strings contribute one block each, mappings contribute
//! a key block immediately followed by its value block, and filter entries
//! contribute a name block followed by a config block.
//!
//! Encoders are infallible: empty input yields an empty sequence. The
//! matching decoders model the engine side and are used by test doubles and
//! the dry-run binary.

use bytes::Bytes;
use thiserror::Error;

use crate::filter::NativeFilterEntry;

/// Ordered sequence of owned byte blocks handed across the engine boundary.
pub type ByteBlocks = Vec<Bytes>;

/// Errors raised while decoding byte blocks on the engine side.
#[non_exhaustive]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A paired encoding ended with a key that has no value block.
    #[error("paired block sequence has odd length {0}")]
    UnpairedBlock(usize),
    /// A block was not valid UTF-8.
    #[error("block {index} is not valid UTF-8")]
    InvalidUtf8 {
        /// Position of the offending block.
        index: usize,
    },
}

/// Encode an ordered sequence of strings, one block per string.
///
/// ```
/// use engine_bridge::codec::encode_strings;
///
/// let blocks = encode_strings(["a.example", "b.example"]);
/// assert_eq!(blocks.len(), 2);
/// assert_eq!(&blocks[1][..], b"b.example");
/// ```
pub fn encode_strings<I, S>(strings: I) -> ByteBlocks
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    strings
        .into_iter()
        .map(|s| Bytes::copy_from_slice(s.as_ref().as_bytes()))
        .collect()
}

/// Encode a mapping as consecutive key and value blocks, in iteration order.
pub fn encode_mapping<I, K, V>(entries: I) -> ByteBlocks
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let entries = entries.into_iter();
    let mut blocks = Vec::with_capacity(entries.size_hint().0 * 2);
    for (key, value) in entries {
        blocks.push(Bytes::copy_from_slice(key.as_ref().as_bytes()));
        blocks.push(Bytes::copy_from_slice(value.as_ref().as_bytes()));
    }
    blocks
}

/// Encode a filter chain as consecutive name and config blocks per entry.
#[must_use]
pub fn encode_filter_chain(chain: &[NativeFilterEntry]) -> ByteBlocks {
    encode_mapping(chain.iter().map(|entry| (entry.name(), entry.config())))
}

/// Decode one string per block.
///
/// # Errors
///
/// Returns [`CodecError::InvalidUtf8`] if a block is not valid UTF-8.
pub fn decode_strings(blocks: &[Bytes]) -> Result<Vec<String>, CodecError> {
    blocks
        .iter()
        .enumerate()
        .map(|(index, block)| decode_block(index, block))
        .collect()
}

/// Decode consecutive key and value blocks into ordered pairs.
///
/// # Errors
///
/// Returns [`CodecError::UnpairedBlock`] when the sequence has an odd length
/// and [`CodecError::InvalidUtf8`] when a block is not valid UTF-8.
pub fn decode_mapping(blocks: &[Bytes]) -> Result<Vec<(String, String)>, CodecError> {
    if blocks.len() % 2 != 0 {
        return Err(CodecError::UnpairedBlock(blocks.len()));
    }
    blocks
        .chunks_exact(2)
        .enumerate()
        .map(|(pair, chunk)| {
            let key = decode_block(pair * 2, &chunk[0])?;
            let value = decode_block(pair * 2 + 1, &chunk[1])?;
            Ok((key, value))
        })
        .collect()
}

fn decode_block(index: usize, block: &Bytes) -> Result<String, CodecError> {
    std::str::from_utf8(block)
        .map(str::to_owned)
        .map_err(|_| CodecError::InvalidUtf8 { index })
}
