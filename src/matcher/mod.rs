//! Match finders: the pluggable search strategies behind the encoder.
//!
//! Every finder answers one question - the best back-reference at `pos` - and
//! the encoder decides what to do with the answer according to the
//! algorithm's [`Parsing`] policy. Finders may keep scratch tables or an
//! index over `src[..pos]`, so positions must be queried in non-decreasing
//! order and a finder must not be reused across sources. A fresh finder is
//! built for every encode call.
//!
//! | Module | Search | Tie-break |
//! |--------|--------|-----------|
//! | [`worst_case`] | none | - |
//! | [`reference`] | exhaustive window scan | smallest distance |
//! | [`nintendo`] | Boyer-Moore-Horspool, growing needle | farthest |
//! | [`lib_yaz0`] | memchr first-byte scan, level-scaled window | farthest |
//! | [`ct_lib`] | per-byte occurrence lists, refilled every 4096 bytes | farthest |
//!
//! MK8 and CTGP interleave search and emission too tightly for this seam;
//! they live in the encoder as their own parse loops.

pub mod ct_lib;
pub mod lib_yaz0;
pub mod nintendo;
pub mod reference;
pub mod worst_case;

pub use ct_lib::CtLibFinder;
pub use lib_yaz0::LibYaz0Finder;
pub use nintendo::NintendoFinder;
pub use reference::ReferenceFinder;
pub use worst_case::WorstCaseFinder;

use crate::yaz0::{Match, MAX_MATCH_LEN};
use crate::{Algorithm, CompressionLevel};

/// Search strategy for back-references
pub trait MatchFinder {
    /// Best back-reference starting at `pos`, if one of at least 3 bytes
    /// exists within the 4096-byte window.
    fn find_match(&mut self, src: &[u8], pos: usize) -> Option<Match>;
}

/// How the encoder turns finder answers into tokens
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parsing {
    /// Take every match as soon as it is found
    Greedy,
    /// Peek one byte ahead; if the match there is longer, emit a literal and
    /// re-evaluate from the next byte
    Lazy,
    /// Peek one byte ahead; if the match there is longer by at least two
    /// bytes, emit a literal and then commit to that match
    LazyCommit,
}

/// Build the finder for `algorithm`; `None` for the algorithms that run
/// their own parse loop (`Mk8`, `Ctgp`)
pub fn for_algorithm(
    algorithm: Algorithm,
    level: CompressionLevel,
) -> Option<Box<dyn MatchFinder + Send>> {
    let finder: Box<dyn MatchFinder + Send> = match algorithm {
        Algorithm::WorstCase => Box::new(WorstCaseFinder),
        Algorithm::Reference => Box::new(ReferenceFinder),
        Algorithm::Nintendo => Box::new(NintendoFinder::new()),
        Algorithm::LibYaz0 => Box::new(LibYaz0Finder::new(level)),
        Algorithm::CtLib => Box::new(CtLibFinder::new()),
        Algorithm::Mk8 | Algorithm::Ctgp => return None,
    };
    Some(finder)
}

/// Longest match the stream can express at `pos`
#[inline]
pub(crate) fn max_match_len(src_len: usize, pos: usize) -> usize {
    (src_len - pos).min(MAX_MATCH_LEN)
}

/// Length of the common prefix of `src[candidate..]` and `src[pos..]`, capped
/// at `max`. The two ranges may overlap.
#[inline]
pub(crate) fn common_prefix(src: &[u8], candidate: usize, pos: usize, max: usize) -> usize {
    src[candidate..].iter().zip(&src[pos..pos + max]).take_while(|(a, b)| a == b).count()
}
