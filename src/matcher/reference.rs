//! Exhaustive search.
//!
//! Every candidate in the 4096-byte window is compared against the cursor,
//! nearest first, and the longest match wins; on equal length the nearer
//! candidate (smallest distance) is kept. This is the canonical rule most
//! reference encoders follow. Cost is O(n * 4096) comparisons in the worst
//! case (long runs of a repeated short pattern); no internal time limit is
//! applied.

use super::{common_prefix, max_match_len, MatchFinder};
use crate::yaz0::{Match, MIN_MATCH_LEN, WINDOW_SIZE};

#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceFinder;

impl MatchFinder for ReferenceFinder {
    fn find_match(&mut self, src: &[u8], pos: usize) -> Option<Match> {
        let max = max_match_len(src.len(), pos);
        if max < MIN_MATCH_LEN {
            return None;
        }

        let first = src[pos];
        let mut best: Option<Match> = None;
        for candidate in (pos.saturating_sub(WINDOW_SIZE)..pos).rev() {
            if src[candidate] != first {
                continue;
            }
            let len = common_prefix(src, candidate, pos, max);
            if len >= MIN_MATCH_LEN && best.map_or(true, |b| len > b.length) {
                best = Some(Match::new(pos - candidate, len));
                if len == max {
                    break;
                }
            }
        }
        best
    }
}
