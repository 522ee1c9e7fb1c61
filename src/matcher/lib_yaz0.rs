//! libyaz0-compatible search.
//!
//! Scans the window oldest-first for occurrences of the cursor's first byte
//! (via `memchr`) and keeps the first candidate of each new best length, so
//! ties go to the farthest match. The window shrinks with the compression
//! level: `0x10E0 * level / 9 - 0xE0` bytes, i.e. 256 at level 1 and the full
//! 4096 at level 9.

use memchr::memchr;

use super::{common_prefix, max_match_len, MatchFinder};
use crate::yaz0::{Match, MIN_MATCH_LEN, WINDOW_SIZE};
use crate::CompressionLevel;

pub struct LibYaz0Finder {
    search_range: usize,
}

impl LibYaz0Finder {
    pub fn new(level: CompressionLevel) -> Self {
        Self {
            search_range: search_range(level),
        }
    }
}

/// Window size used at `level`
pub fn search_range(level: CompressionLevel) -> usize {
    match level.level() {
        9 => WINDOW_SIZE,
        n => 0x10E0 * n as usize / 9 - 0x0E0,
    }
}

impl MatchFinder for LibYaz0Finder {
    fn find_match(&mut self, src: &[u8], pos: usize) -> Option<Match> {
        let max = max_match_len(src.len(), pos);
        if max < MIN_MATCH_LEN {
            return None;
        }

        let first = src[pos];
        let mut search = pos.saturating_sub(self.search_range);
        let mut best: Option<Match> = None;

        while let Some(hit) = memchr(first, &src[search..pos]) {
            let candidate = search + hit;
            let len = common_prefix(src, candidate, pos, max);
            if len >= MIN_MATCH_LEN && best.map_or(true, |b| len > b.length) {
                best = Some(Match::new(pos - candidate, len));
                if len == max {
                    break;
                }
            }
            search = candidate + 1;
        }
        best
    }
}
