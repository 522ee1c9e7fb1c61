//! SZS decoding.
//!
//! One decode path serves the output of every encoder: the token stream is
//! the same regardless of which match finder produced it.

use super::constants::HEADER_SIZE;
use super::header::Header;
use super::tokens::{Token, TokenReader};
use crate::error::{Error, Result};

const MAX_EXPANSION: usize = 91;

/// Decode an SZS stream into a freshly allocated buffer of exactly the
/// declared decoded size.
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    let header = Header::parse(src)?;
    // A payload byte describes at most 91 output bytes (273 per 3-byte reference)
    let payload = src.len() - HEADER_SIZE;
    if header.decoded_size as usize > payload.saturating_mul(MAX_EXPANSION) {
        return Err(Error::corrupt("declared size exceeds what the stream can encode", HEADER_SIZE));
    }
    let mut dst = vec![0u8; header.decoded_size as usize];
    decode_payload(&mut dst, src, header.decoded_size as usize)?;
    Ok(dst)
}

/// Decode an SZS stream into `dst`, returning the number of bytes written.
///
/// `dst` must hold at least the declared decoded size. On error the contents
/// of `dst` are unspecified.
pub fn decode_into(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    let header = Header::parse(src)?;
    let size = header.decoded_size as usize;
    if dst.len() < size {
        return Err(Error::BufferTooSmall {
            needed: size,
            available: dst.len(),
        });
    }
    decode_payload(&mut dst[..size], src, size)?;
    Ok(size)
}

fn decode_payload(dst: &mut [u8], src: &[u8], size: usize) -> Result<()> {
    let mut out = 0usize;
    let mut tokens = TokenReader::new(src, HEADER_SIZE, size);

    for token in tokens.by_ref() {
        match token? {
            Token::Literal(b) => {
                dst[out] = b;
                out += 1;
            }
            Token::BackRef { distance, length } => {
                // The reader has already checked distance <= out
                let end = (out + length as usize).min(size);
                let mut from = out - distance as usize;
                // Byte by byte: source and destination overlap when distance < length
                while out < end {
                    dst[out] = dst[from];
                    out += 1;
                    from += 1;
                }
            }
        }
    }

    if out < size {
        return Err(Error::corrupt("stream ended before declared size", tokens.position()));
    }

    tracing::trace!(decoded = size, consumed = tokens.position(), "decoded SZS stream");
    Ok(())
}
