use crate::error::{Error, Result};
use crate::yaz0::{Token, GROUP_SIZE, MAX_SHORT_MATCH_LEN};

/// Flag-group writer for SZS token streams
///
/// Writes into a caller-provided slice and never past its end. Two framings
/// exist. [`TokenWriter::new`] reserves a flag byte when the first token of
/// its group arrives, so a stream never ends with an empty group.
/// [`TokenWriter::eager`] opens a group up front and again right after every
/// eighth token, the way the EGG, MK8 and CTLib encoders do: empty input still
/// gets one flag byte, and a token count that is a multiple of 8 leaves an
/// empty group at the end.
pub struct TokenWriter<'a> {
    buf: &'a mut [u8],
    /// Next write position
    pos: usize,
    /// Position of the current flag byte
    flag_pos: usize,
    /// Tokens already placed in the current group (0-8)
    bits_used: u8,
    eager: bool,
}

impl<'a> TokenWriter<'a> {
    /// Start writing at `start` (just past the header)
    pub fn new(buf: &'a mut [u8], start: usize) -> Self {
        Self {
            buf,
            pos: start,
            flag_pos: start,
            bits_used: GROUP_SIZE as u8,
            eager: false,
        }
    }

    /// Start writing at `start` with the first flag byte already reserved
    pub fn eager(buf: &'a mut [u8], start: usize) -> Result<Self> {
        let mut writer = Self::new(buf, start);
        writer.eager = true;
        writer.open_group()?;
        Ok(writer)
    }

    #[inline]
    fn put(&mut self, byte: u8) -> Result<()> {
        match self.buf.get_mut(self.pos) {
            Some(slot) => {
                *slot = byte;
                self.pos += 1;
                Ok(())
            }
            None => Err(Error::BufferTooSmall {
                needed: self.pos + 1,
                available: self.buf.len(),
            }),
        }
    }

    fn open_group(&mut self) -> Result<()> {
        self.flag_pos = self.pos;
        self.put(0)?;
        self.bits_used = 0;
        Ok(())
    }

    /// Append one token, opening a new flag group when the current one is full
    pub fn push(&mut self, token: Token) -> Result<()> {
        if self.bits_used as usize == GROUP_SIZE {
            self.open_group()?;
        }

        match token {
            Token::Literal(b) => {
                self.buf[self.flag_pos] |= 0x80 >> self.bits_used;
                self.put(b)?;
            }
            Token::BackRef { distance, length } => {
                let d = distance - 1;
                if length as usize > MAX_SHORT_MATCH_LEN {
                    self.put((d >> 8) as u8)?;
                    self.put(d as u8)?;
                    self.put((length - 0x12) as u8)?;
                } else {
                    self.put((((length - 2) << 4) | (d >> 8)) as u8)?;
                    self.put(d as u8)?;
                }
            }
        }

        self.bits_used += 1;
        if self.eager && self.bits_used as usize == GROUP_SIZE {
            self.open_group()?;
        }
        Ok(())
    }

    /// Zero-pad the output so its total length is a multiple of `align`
    pub fn pad_to(&mut self, align: usize) -> Result<()> {
        while self.pos % align != 0 {
            self.put(0)?;
        }
        Ok(())
    }

    /// Finish and return the total number of bytes used
    pub fn finish(self) -> usize {
        self.pos
    }
}
