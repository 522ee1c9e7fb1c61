//! SZP (YAY0): the de-interlaced sibling of SZS.
//!
//! YAY0 carries the same tokens as YAZ0, split into three streams:
//!
//! ```text
//! 0x00  "Yay0"
//! 0x04  decoded size (u32 BE)
//! 0x08  offset of the link table (u32 BE)
//! 0x0C  offset of the chunk table (u32 BE)
//! 0x10  flag bits, MSB first, packed into u32 BE words
//! ....  link table: one u16 BE per back-reference (YAZ0's first two bytes)
//! ....  chunk table: literal bytes and extended-length bytes in stream order
//! ```
//!
//! Converting from YAZ0 is a pure re-layout; no matching is redone.

use crate::error::{Error, Result};
use crate::yaz0::{Header, Token, TokenReader, HEADER_SIZE, MAX_SHORT_MATCH_LEN};

pub const YAY0_MAGIC: [u8; 4] = *b"Yay0";

/// Largest YAY0 file [`deinterlace`] can produce from `yaz0_len` bytes.
///
/// Flags packed 32 to a word take at most 3 bytes more than one byte per 8.
pub fn deinterlaced_upper_bound(yaz0_len: u32) -> u32 {
    yaz0_len.saturating_add(3)
}

/// Check for the YAY0 magic
pub fn is_compressed(buf: &[u8]) -> bool {
    buf.len() >= 4 && buf[..4] == YAY0_MAGIC
}

/// The three YAY0 streams, collected in token order
#[derive(Default)]
struct Streams {
    flags: Vec<u32>,
    flag_bits: usize,
    links: Vec<u16>,
    chunks: Vec<u8>,
}

impl Streams {
    fn push_flag(&mut self, literal: bool) {
        if self.flag_bits % 32 == 0 {
            self.flags.push(0);
        }
        if literal {
            if let Some(word) = self.flags.last_mut() {
                *word |= 0x8000_0000 >> (self.flag_bits % 32);
            }
        }
        self.flag_bits += 1;
    }

    fn push(&mut self, token: Token) {
        match token {
            Token::Literal(b) => {
                self.push_flag(true);
                self.chunks.push(b);
            }
            Token::BackRef { distance, length } => {
                self.push_flag(false);
                let d = distance - 1;
                if length as usize > MAX_SHORT_MATCH_LEN {
                    self.links.push(d);
                    self.chunks.push((length - 0x12) as u8);
                } else {
                    self.links.push(((length - 2) << 12) | d);
                }
            }
        }
    }

    fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.flags.len() * 4 + self.links.len() * 2 + self.chunks.len()
    }
}

fn collect(yaz0: &[u8]) -> Result<(u32, Streams)> {
    let header = Header::parse(yaz0)?;
    let mut streams = Streams::default();
    for token in TokenReader::new(yaz0, HEADER_SIZE, header.decoded_size as usize) {
        streams.push(token?);
    }
    Ok((header.decoded_size, streams))
}

fn write_streams(dst: &mut [u8], decoded_size: u32, streams: &Streams) -> Result<usize> {
    let total = streams.encoded_len();
    if dst.len() < total {
        return Err(Error::BufferTooSmall {
            needed: total,
            available: dst.len(),
        });
    }

    let link_offset = HEADER_SIZE + streams.flags.len() * 4;
    let chunk_offset = link_offset + streams.links.len() * 2;

    dst[0..4].copy_from_slice(&YAY0_MAGIC);
    dst[4..8].copy_from_slice(&decoded_size.to_be_bytes());
    dst[8..12].copy_from_slice(&(link_offset as u32).to_be_bytes());
    dst[12..16].copy_from_slice(&(chunk_offset as u32).to_be_bytes());

    for (slot, word) in dst[HEADER_SIZE..link_offset].chunks_exact_mut(4).zip(&streams.flags) {
        slot.copy_from_slice(&word.to_be_bytes());
    }
    for (slot, link) in dst[link_offset..chunk_offset].chunks_exact_mut(2).zip(&streams.links) {
        slot.copy_from_slice(&link.to_be_bytes());
    }
    dst[chunk_offset..total].copy_from_slice(&streams.chunks);

    tracing::debug!(output = total, back_refs = streams.links.len(), "deinterlaced SZS to SZP");
    Ok(total)
}

/// Convert an SZS (YAZ0/YAZ1) buffer to SZP into `dst`
pub fn deinterlace_into(dst: &mut [u8], yaz0: &[u8]) -> Result<usize> {
    let (decoded_size, streams) = collect(yaz0)?;
    write_streams(dst, decoded_size, &streams)
}

/// Convert an SZS (YAZ0/YAZ1) buffer to SZP
pub fn deinterlace(yaz0: &[u8]) -> Result<Vec<u8>> {
    let (decoded_size, streams) = collect(yaz0)?;
    let mut dst = vec![0u8; streams.encoded_len()];
    write_streams(&mut dst, decoded_size, &streams)?;
    Ok(dst)
}

/// Read cursor over one of the three YAY0 regions
struct Region<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
    what: &'static str,
}

impl<'a> Region<'a> {
    fn new(buf: &'a [u8], pos: usize, end: usize, what: &'static str) -> Self {
        Self {
            buf,
            pos,
            end,
            what,
        }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.pos + n > self.end {
            return Err(Error::corrupt(self.what, self.pos));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }
}

/// Decode an SZP (YAY0) buffer
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    if !is_compressed(src) {
        return Err(Error::malformed("missing Yay0 magic"));
    }
    if src.len() < HEADER_SIZE {
        return Err(Error::malformed("truncated header"));
    }
    let be32 = |at: usize| {
        u32::from_be_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]]) as usize
    };
    let size = be32(4);
    let link_offset = be32(8);
    let chunk_offset = be32(12);
    if link_offset < HEADER_SIZE || chunk_offset < link_offset || chunk_offset > src.len() {
        return Err(Error::malformed("table offsets out of range"));
    }

    let mut flags = Region::new(src, HEADER_SIZE, link_offset, "flag stream exhausted");
    let mut links = Region::new(src, link_offset, chunk_offset, "link table exhausted");
    let mut chunks = Region::new(src, chunk_offset, src.len(), "chunk table exhausted");

    let mut out: Vec<u8> = Vec::with_capacity(size.min(src.len().saturating_mul(91)));
    let mut word = 0u32;
    let mut bits_left = 0;

    while out.len() < size {
        if bits_left == 0 {
            let w = flags.take(4)?;
            word = u32::from_be_bytes([w[0], w[1], w[2], w[3]]);
            bits_left = 32;
        }
        let literal = word & 0x8000_0000 != 0;
        word <<= 1;
        bits_left -= 1;

        if literal {
            out.push(chunks.take(1)?[0]);
            continue;
        }

        let at = links.pos;
        let l = links.take(2)?;
        let link = u16::from_be_bytes([l[0], l[1]]) as usize;
        let distance = (link & 0x0FFF) + 1;
        let length = match link >> 12 {
            0 => chunks.take(1)?[0] as usize + 0x12,
            n => n + 2,
        };
        if distance > out.len() {
            return Err(Error::corrupt("back-reference reaches before start of output", at));
        }

        let length = length.min(size - out.len());
        let start = out.len() - distance;
        for i in 0..length {
            let b = out[start + i];
            out.push(b);
        }
    }

    tracing::trace!(input = src.len(), output = out.len(), "decoded SZP stream");
    Ok(out)
}
