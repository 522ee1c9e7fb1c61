pub mod batch;
pub mod encoder;
pub mod error;
pub mod matcher;
pub mod szp;
pub mod yaz0;

pub use batch::encode_batch;
pub use encoder::{upper_bound, Encoder};
pub use error::{Error, ErrorKind, Result};
pub use matcher::{MatchFinder, Parsing};
pub use yaz0::{decoded_size, is_compressed, Header, Magic, Match, Token};

use std::fmt;
use std::str::FromStr;

/// Compression level (1-9)
///
/// Only [`Algorithm::LibYaz0`] reads it: the search window grows from 256
/// bytes at level 1 to the full 4096 at level 9.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionLevel {
    Level1 = 1,
    Level2 = 2,
    Level3 = 3,
    Level4 = 4,
    Level5 = 5,
    Level6 = 6,
    Level7 = 7,
    Level8 = 8,
    #[default]
    Level9 = 9,
}

impl CompressionLevel {
    /// Create from numeric level (1-9), clamped to valid range
    pub fn from_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Level1,
            2 => Self::Level2,
            3 => Self::Level3,
            4 => Self::Level4,
            5 => Self::Level5,
            6 => Self::Level6,
            7 => Self::Level7,
            8 => Self::Level8,
            _ => Self::Level9,
        }
    }

    /// Get numeric level (1-9)
    pub fn level(&self) -> u8 {
        *self as u8
    }
}

/// Encoding algorithm
///
/// Every variant produces a valid stream that any decoder accepts; they
/// differ in speed, ratio, and which historical encoder's output they match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Algorithm {
    /// Literals only; fastest, and the size [`upper_bound`] is built around
    WorstCase,
    /// Exhaustive greedy search, nearest match on ties
    #[default]
    Reference,
    /// Nintendo's EGG encoder (Mario Kart Wii and other first-party titles)
    Nintendo,
    /// The libyaz0 encoder, window scaled by [`CompressionLevel`]
    LibYaz0,
    /// Mario Kart 8's hash-chain encoder
    Mk8,
    /// The CTLib encoder; output padded to 4 bytes
    CtLib,
    /// CTGP's streaming encoder (a 4 KiB ring and a 0x4000-slot hash map)
    Ctgp,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::WorstCase,
        Algorithm::Reference,
        Algorithm::Nintendo,
        Algorithm::LibYaz0,
        Algorithm::Mk8,
        Algorithm::CtLib,
        Algorithm::Ctgp,
    ];

    /// Name used on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::WorstCase => "worst-case",
            Algorithm::Reference => "reference",
            Algorithm::Nintendo => "nintendo",
            Algorithm::LibYaz0 => "lib-yaz0",
            Algorithm::Mk8 => "mk8",
            Algorithm::CtLib => "ct-lib",
            Algorithm::Ctgp => "ctgp",
        }
    }

    /// How the encoder acts on this algorithm's matches
    pub fn parsing(&self) -> Parsing {
        match self {
            Algorithm::WorstCase | Algorithm::Reference | Algorithm::CtLib | Algorithm::Ctgp => {
                Parsing::Greedy
            }
            Algorithm::Nintendo => Parsing::LazyCommit,
            Algorithm::LibYaz0 | Algorithm::Mk8 => Parsing::Lazy,
        }
    }

    /// Whether the encoder opens each flag group before its first token.
    ///
    /// These encoders write a flag byte even for empty input and leave an
    /// empty group at the end when the token count is a multiple of 8.
    pub fn eager_group_header(&self) -> bool {
        matches!(self, Algorithm::Nintendo | Algorithm::Mk8 | Algorithm::CtLib)
    }

    /// Total output length is padded to a multiple of this, if any
    pub fn stream_alignment(&self) -> Option<usize> {
        match self {
            Algorithm::CtLib => Some(4),
            _ => None,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        match lower.as_str() {
            "worst-case" | "worstcase" => Ok(Algorithm::WorstCase),
            "reference" => Ok(Algorithm::Reference),
            "nintendo" | "mkw" => Ok(Algorithm::Nintendo),
            "lib-yaz0" | "libyaz0" => Ok(Algorithm::LibYaz0),
            "mk8" => Ok(Algorithm::Mk8),
            "ct-lib" | "ctlib" => Ok(Algorithm::CtLib),
            "ctgp" => Ok(Algorithm::Ctgp),
            _ => Err(format!(
                "unknown algorithm '{s}' (expected one of: {})",
                Algorithm::ALL.map(|a| a.name()).join(", ")
            )),
        }
    }
}

/// Configuration for encoding
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EncodeConfig {
    /// Match search and parsing strategy
    pub algorithm: Algorithm,
    /// Compression level (1-9); only LibYaz0 uses it
    pub level: CompressionLevel,
    /// Header magic to write
    pub magic: Magic,
    /// Decode the output and compare it with the input before returning
    pub verify: bool,
}

impl EncodeConfig {
    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        Self {
            algorithm,
            ..Default::default()
        }
    }
}

/// Decode an SZS buffer into a new vector
pub fn decode(src: &[u8]) -> Result<Vec<u8>> {
    yaz0::decode(src)
}

/// Decode an SZS buffer into `dst`, returning the decoded size
pub fn decode_into(dst: &mut [u8], src: &[u8]) -> Result<usize> {
    yaz0::decode_into(dst, src)
}

/// Encode `src` with `algorithm` and default settings
pub fn encode(src: &[u8], algorithm: Algorithm) -> Result<Vec<u8>> {
    Encoder::new(EncodeConfig::with_algorithm(algorithm)).encode(src)
}

/// Encode `src` into `dst`; `dst` must hold [`upper_bound`] bytes
pub fn encode_into(dst: &mut [u8], src: &[u8], algorithm: Algorithm) -> Result<usize> {
    Encoder::new(EncodeConfig::with_algorithm(algorithm)).encode_into(dst, src)
}

/// Encode `src` with every setting taken from `config` (algorithm, level,
/// header magic and verification)
pub fn encode_with(src: &[u8], config: &EncodeConfig) -> Result<Vec<u8>> {
    Encoder::new(config.clone()).encode(src)
}

/// Crate name and version, e.g. `"szs 0.3.0"`
pub fn version() -> &'static str {
    concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"))
}
