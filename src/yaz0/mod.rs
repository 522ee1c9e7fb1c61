pub mod constants;
pub mod decoder;
pub mod detector;
pub mod header;
pub mod tokens;

pub use constants::*;
pub use decoder::{decode, decode_into};
pub use detector::is_compressed;
pub use header::{decoded_size, Header, Magic};
pub use tokens::{Match, Token, TokenReader};
