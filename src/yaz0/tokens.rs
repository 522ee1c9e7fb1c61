use super::constants::{GROUP_SIZE, MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};
use crate::error::{Error, Result};

/// Represents a single token in the SZS stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Token {
    /// A literal byte (flag bit 1)
    Literal(u8),
    /// A back-reference (flag bit 0): copy `length` bytes from `distance` bytes back
    BackRef { distance: u16, length: u16 },
}

impl Token {
    /// Returns the uncompressed size this token represents
    pub fn uncompressed_size(&self) -> usize {
        match self {
            Token::Literal(_) => 1,
            Token::BackRef { length, .. } => *length as usize,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Token::Literal(_))
    }
}

/// Candidate back-reference produced by a match finder
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Match {
    /// Bytes behind the cursor (1..=4096)
    pub distance: usize,
    /// Bytes to copy (3..=273)
    pub length: usize,
}

impl Match {
    pub fn new(distance: usize, length: usize) -> Self {
        Self { distance, length }
    }

    /// Whether this match is encodable at `pos` in a source of `src_len` bytes
    pub fn is_valid_at(&self, pos: usize, src_len: usize) -> bool {
        (1..=WINDOW_SIZE).contains(&self.distance)
            && self.distance <= pos
            && (MIN_MATCH_LEN..=MAX_MATCH_LEN).contains(&self.length)
            && pos + self.length <= src_len
    }

    pub fn to_token(self) -> Token {
        Token::BackRef {
            distance: self.distance as u16,
            length: self.length as u16,
        }
    }
}

/// Walks the flag groups of an SZS token stream.
///
/// Stops as soon as the declared output size is covered, so unused low bits
/// of the final flag byte (and any trailing padding) are never interpreted.
pub struct TokenReader<'a> {
    src: &'a [u8],
    /// Next unread input byte
    pos: usize,
    /// Current flag byte, shifted so the next bit is the MSB
    flags: u8,
    /// Bits left in `flags`
    bits_left: u8,
    /// Output bytes accounted for so far
    produced: usize,
    decoded_size: usize,
    failed: bool,
}

impl<'a> TokenReader<'a> {
    /// `payload_start` is the offset of the first flag byte (16 for SZS)
    pub fn new(src: &'a [u8], payload_start: usize, decoded_size: usize) -> Self {
        Self {
            src,
            pos: payload_start,
            flags: 0,
            bits_left: 0,
            produced: 0,
            decoded_size,
            failed: false,
        }
    }

    /// Input offset of the next unread byte
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_finished(&self) -> bool {
        self.produced >= self.decoded_size
    }

    #[inline]
    fn take8(&mut self) -> Result<u8> {
        let b = *self.src.get(self.pos).ok_or(Error::corrupt("stream exhausted", self.pos))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_token(&mut self) -> Result<Token> {
        if self.bits_left == 0 {
            self.flags = self.take8()?;
            self.bits_left = GROUP_SIZE as u8;
        }
        let literal = self.flags & 0x80 != 0;
        self.flags <<= 1;
        self.bits_left -= 1;

        if literal {
            let token = Token::Literal(self.take8()?);
            self.produced += token.uncompressed_size();
            return Ok(token);
        }

        let start = self.pos;
        let hi = self.take8()?;
        let lo = self.take8()?;
        let distance = ((hi as usize & 0x0F) << 8 | lo as usize) + 1;
        let length = match hi >> 4 {
            0 => self.take8()? as usize + 0x12,
            n => n as usize + 2,
        };

        if distance > self.produced {
            return Err(Error::corrupt(
                "back-reference reaches before start of output",
                start,
            ));
        }

        let token = Token::BackRef {
            distance: distance as u16,
            length: length as u16,
        };
        self.produced = (self.produced + token.uncompressed_size()).min(self.decoded_size);
        Ok(token)
    }
}

impl Iterator for TokenReader<'_> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.is_finished() {
            return None;
        }
        let token = self.read_token();
        self.failed = token.is_err();
        Some(token)
    }
}
