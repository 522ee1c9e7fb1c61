use super::constants::{HEADER_SIZE, YAZ0_MAGIC, YAZ1_MAGIC};
use crate::error::{Error, Result};

/// Container magic
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Magic {
    /// "Yaz0", the standard header
    #[default]
    Yaz0,
    /// "Yaz1", alternate header with the same token stream
    Yaz1,
}

impl Magic {
    /// Identify the magic at the start of `buf`, if any
    pub fn detect(buf: &[u8]) -> Option<Self> {
        match buf.get(..4)? {
            m if m == YAZ0_MAGIC => Some(Magic::Yaz0),
            m if m == YAZ1_MAGIC => Some(Magic::Yaz1),
            _ => None,
        }
    }

    pub fn bytes(self) -> [u8; 4] {
        match self {
            Magic::Yaz0 => YAZ0_MAGIC,
            Magic::Yaz1 => YAZ1_MAGIC,
        }
    }
}

/// Parsed SZS header (16 bytes)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: Magic,
    /// Size of the data once decoded
    pub decoded_size: u32,
    /// Data alignment hint (bytes 8..12); zero on classic Wii/GameCube files
    pub alignment: u32,
    /// Raw bytes 8..16, kept verbatim for inspection
    pub reserved: [u8; 8],
}

impl Header {
    /// Header for a freshly encoded stream: reserved area zero-filled
    pub fn new(magic: Magic, decoded_size: u32) -> Self {
        Self {
            magic,
            decoded_size,
            alignment: 0,
            reserved: [0; 8],
        }
    }

    /// Parse the header at the start of `buf`
    pub fn parse(buf: &[u8]) -> Result<Self> {
        let magic = Magic::detect(buf).ok_or(Error::malformed("missing Yaz0/Yaz1 magic"))?;
        if buf.len() < HEADER_SIZE {
            return Err(Error::malformed("truncated header"));
        }

        let decoded_size = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let alignment = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let mut reserved = [0u8; 8];
        reserved.copy_from_slice(&buf[8..HEADER_SIZE]);

        Ok(Header {
            magic,
            decoded_size,
            alignment,
            reserved,
        })
    }

    /// Write the 16-byte header into the start of `dst`
    pub fn write(&self, dst: &mut [u8]) -> Result<()> {
        if dst.len() < HEADER_SIZE {
            return Err(Error::BufferTooSmall {
                needed: HEADER_SIZE,
                available: dst.len(),
            });
        }
        dst[0..4].copy_from_slice(&self.magic.bytes());
        dst[4..8].copy_from_slice(&self.decoded_size.to_be_bytes());
        dst[8..HEADER_SIZE].copy_from_slice(&self.reserved);
        Ok(())
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&self.magic.bytes());
        out[4..8].copy_from_slice(&self.decoded_size.to_be_bytes());
        out[8..].copy_from_slice(&self.reserved);
        out
    }
}

/// Decoded size declared by an SZS header.
///
/// Pure header read; the token stream is not touched.
pub fn decoded_size(buf: &[u8]) -> Result<u32> {
    Header::parse(buf).map(|h| h.decoded_size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_parse_header() {
        let mut buf = b"Yaz0\x00\x00\x00\x20\x00\x00\x00\x80\x00\x00\x00\x00payload".to_vec();
        let header = Header::parse(&buf).unwrap();
        assert_eq!(header.magic, Magic::Yaz0);
        assert_eq!(header.decoded_size, 32);
        assert_eq!(header.alignment, 0x80);

        buf[3] = b'1';
        assert_eq!(Header::parse(&buf).unwrap().magic, Magic::Yaz1);
    }

    #[test]
    fn test_decoded_size_needs_full_header() {
        // Magic and size present, reserved area cut short
        let buf = b"Yaz0\x00\x00\x01\x00\x00\x00";
        assert_eq!(decoded_size(buf).unwrap_err().kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_decoded_size_rejects_bad_magic() {
        let buf = [0u8; 32];
        assert_eq!(decoded_size(&buf).unwrap_err().kind(), ErrorKind::MalformedHeader);
        assert_eq!(decoded_size(&[]).unwrap_err().kind(), ErrorKind::MalformedHeader);
    }

    #[test]
    fn test_write_round_trips() {
        let header = Header::new(Magic::Yaz1, 0x0102_0304);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[..8], b"Yaz1\x01\x02\x03\x04");
        assert_eq!(&bytes[8..], &[0u8; 8]);
        assert_eq!(Header::parse(&bytes).unwrap(), header);

        let mut small = [0u8; 8];
        assert_eq!(header.write(&mut small).unwrap_err().kind(), ErrorKind::BufferTooSmall);
    }
}
