//! SZS encoder: drives a match finder over the source and packs the chosen
//! tokens into flag groups behind a 16-byte header. MK8 and CTGP run their
//! own parse loops and only share the token output.

mod ctgp;
mod mk8;
pub mod writer;

pub use writer::TokenWriter;

use crate::error::{Error, Result};
use crate::matcher::{self, MatchFinder, Parsing};
use crate::yaz0::{self, Header, Match, Token, HEADER_SIZE};
use crate::{Algorithm, EncodeConfig};

/// Worst-case encoded size for `len` source bytes: header, one literal per
/// byte, one flag byte per 8 literals plus a trailing empty flag byte,
/// rounded up to 4 bytes. Saturates at `u32::MAX`.
pub fn upper_bound(len: u32) -> u32 {
    u32::try_from(max_encoded_len(len as u64)).unwrap_or(u32::MAX)
}

pub(crate) fn max_encoded_len(len: u64) -> u64 {
    let raw = HEADER_SIZE as u64 + len + len / 8 + 1;
    (raw + 3) & !3
}

/// Stateless encoder front end; a fresh match finder is built per call
#[derive(Clone, Debug, Default)]
pub struct Encoder {
    config: EncodeConfig,
}

impl Encoder {
    pub fn new(config: EncodeConfig) -> Self {
        Self { config }
    }

    /// Encode `src` into a freshly allocated buffer sized to the result
    pub fn encode(&self, src: &[u8]) -> Result<Vec<u8>> {
        let capacity = usize::try_from(max_encoded_len(src.len() as u64)).map_err(|_| {
            Error::EncodeFailure(format!("input of {} bytes is too large", src.len()))
        })?;
        let mut dst = vec![0u8; capacity];
        let written = self.encode_into(&mut dst, src)?;
        dst.truncate(written);
        Ok(dst)
    }

    /// Encode `src` into `dst`, returning the number of bytes written.
    ///
    /// `dst` must hold at least [`upper_bound`] bytes for the input length;
    /// nothing past the returned length is meaningful.
    pub fn encode_into(&self, dst: &mut [u8], src: &[u8]) -> Result<usize> {
        let decoded_size = u32::try_from(src.len()).map_err(|_| {
            Error::EncodeFailure(format!(
                "input of {} bytes exceeds the 32-bit size field",
                src.len()
            ))
        })?;

        let needed = max_encoded_len(src.len() as u64);
        if (dst.len() as u64) < needed {
            return Err(Error::BufferTooSmall {
                needed: needed as usize,
                available: dst.len(),
            });
        }

        let algorithm = self.config.algorithm;
        Header::new(self.config.magic, decoded_size).write(dst)?;

        let mut writer = if algorithm.eager_group_header() {
            TokenWriter::eager(dst, HEADER_SIZE)?
        } else {
            TokenWriter::new(dst, HEADER_SIZE)
        };
        let mut out = Emitter::new(&mut writer, algorithm, src);
        match algorithm {
            Algorithm::Mk8 => mk8::encode(src, &mut out)?,
            Algorithm::Ctgp => ctgp::encode(src, &mut out)?,
            _ => {
                let mut finder =
                    matcher::for_algorithm(algorithm, self.config.level).ok_or_else(|| {
                        Error::EncodeFailure(format!("{} has no match finder", algorithm.name()))
                    })?;
                drive(finder.as_mut(), algorithm.parsing(), src, &mut out)?;
            }
        }
        let stats = out.finish(src.len())?;

        if let Some(align) = algorithm.stream_alignment() {
            writer.pad_to(align)?;
        }
        let written = writer.finish();

        tracing::debug!(
            algorithm = algorithm.name(),
            input = src.len(),
            output = written,
            literals = stats.literals,
            back_refs = stats.back_refs,
            "encoded SZS stream"
        );

        if self.config.verify {
            verify(&dst[..written], src)?;
        }
        Ok(written)
    }
}

/// Token counts from a single encode pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub literals: usize,
    pub back_refs: usize,
}

/// Token sink shared by every parse loop.
///
/// Tracks how much of the source the tokens cover so far and rejects any
/// back-reference the stream cannot express at that point.
pub(crate) struct Emitter<'w, 'a> {
    writer: &'w mut TokenWriter<'a>,
    algorithm: Algorithm,
    src: &'w [u8],
    pos: usize,
    stats: EncodeStats,
}

impl<'w, 'a> Emitter<'w, 'a> {
    fn new(writer: &'w mut TokenWriter<'a>, algorithm: Algorithm, src: &'w [u8]) -> Self {
        Self {
            writer,
            algorithm,
            src,
            pos: 0,
            stats: EncodeStats::default(),
        }
    }

    pub(crate) fn literal(&mut self, byte: u8) -> Result<()> {
        self.stats.literals += 1;
        self.pos += 1;
        self.writer.push(Token::Literal(byte))
    }

    pub(crate) fn back_ref(&mut self, m: Match) -> Result<()> {
        if !m.is_valid_at(self.pos, self.src.len()) {
            return Err(Error::EncodeFailure(format!(
                "{} produced an invalid back-reference (distance {}, length {}) at {}",
                self.algorithm.name(),
                m.distance,
                m.length,
                self.pos
            )));
        }
        self.stats.back_refs += 1;
        self.pos += m.length;
        self.writer.push(m.to_token())
    }

    /// Emit `m`, or the bytes it covers as literals when it reaches back
    /// before the start of the source
    pub(crate) fn back_ref_or_literals(&mut self, m: Match) -> Result<()> {
        if m.distance <= self.pos {
            return self.back_ref(m);
        }
        for _ in 0..m.length {
            let byte = self.src.get(self.pos).copied().ok_or_else(|| {
                Error::EncodeFailure(format!("{} ran past the input", self.algorithm.name()))
            })?;
            self.literal(byte)?;
        }
        Ok(())
    }

    /// Check that the tokens covered exactly `len` source bytes
    fn finish(self, len: usize) -> Result<EncodeStats> {
        if self.pos != len {
            return Err(Error::EncodeFailure(format!(
                "{} covered {} of {len} input bytes",
                self.algorithm.name(),
                self.pos
            )));
        }
        Ok(self.stats)
    }
}

/// Ask the finder for a match at `pos`
fn find_at(finder: &mut dyn MatchFinder, src: &[u8], pos: usize) -> Option<Match> {
    if pos >= src.len() {
        return None;
    }
    finder.find_match(src, pos)
}

/// Walk `src` left to right under `parsing`
fn drive(
    finder: &mut dyn MatchFinder,
    parsing: Parsing,
    src: &[u8],
    out: &mut Emitter<'_, '_>,
) -> Result<()> {
    let mut pos = 0;
    // Lookahead result for `pos`, carried over after a deferred match
    let mut pending: Option<Option<Match>> = None;

    while pos < src.len() {
        let current = match pending.take() {
            Some(found) => found,
            None => find_at(finder, src, pos),
        };
        let Some(m) = current else {
            out.literal(src[pos])?;
            pos += 1;
            continue;
        };

        match parsing {
            Parsing::Greedy => {
                out.back_ref(m)?;
                pos += m.length;
            }
            Parsing::Lazy => {
                let next = find_at(finder, src, pos + 1);
                if next.is_some_and(|n| n.length > m.length) {
                    out.literal(src[pos])?;
                    pending = Some(next);
                    pos += 1;
                } else {
                    out.back_ref(m)?;
                    pos += m.length;
                }
            }
            Parsing::LazyCommit => {
                let next = find_at(finder, src, pos + 1);
                match next.filter(|n| n.length > m.length + 1) {
                    Some(n) => {
                        out.literal(src[pos])?;
                        out.back_ref(n)?;
                        pos += 1 + n.length;
                    }
                    None => {
                        out.back_ref(m)?;
                        pos += m.length;
                    }
                }
            }
        }
    }
    Ok(())
}

fn verify(encoded: &[u8], src: &[u8]) -> Result<()> {
    let decoded = yaz0::decode(encoded)
        .map_err(|e| Error::EncodeFailure(format!("verification decode failed: {e}")))?;
    if decoded != src {
        let at = decoded
            .iter()
            .zip(src)
            .position(|(a, b)| a != b)
            .unwrap_or(decoded.len().min(src.len()));
        return Err(Error::EncodeFailure(format!("verification mismatch at byte {at}")));
    }
    Ok(())
}
