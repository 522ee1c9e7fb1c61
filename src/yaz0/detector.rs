//! SZS format detection.
//!
//! Detection is a pure magic check; it never fails. A buffer that is too
//! short or carries another magic is simply "not compressed".

use super::header::Magic;

/// Quick check - only looks at the 4-byte magic.
///
/// Returns true for "Yaz0" and "Yaz1" streams. The rest of the header is not
/// validated here; [`crate::decoded_size`] does that.
pub fn is_compressed(buf: &[u8]) -> bool {
    Magic::detect(buf).is_some()
}
