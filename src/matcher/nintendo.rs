//! Nintendo's EGG encoder search (Mario Kart Wii and contemporaries).
//!
//! Starting from the oldest byte of the window, find the first occurrence of
//! the next 3 source bytes with a Boyer-Moore-Horspool scan, extend it as far
//! as it goes, then search again - past that occurrence - for a needle one
//! byte longer than the best so far. The result is the longest match, and of
//! equally long matches the one farthest back.
//!
//! Paired with [`Parsing::LazyCommit`](super::Parsing::LazyCommit) this
//! reproduces the token choices of the game's encoder.

use super::{max_match_len, MatchFinder};
use crate::yaz0::{Match, MIN_MATCH_LEN, WINDOW_SIZE};

pub struct NintendoFinder {
    /// Horspool bad-character shifts for the current needle
    skip: [u16; 256],
}

impl NintendoFinder {
    pub fn new() -> Self {
        Self { skip: [0; 256] }
    }

    fn compute_skip_table(&mut self, needle: &[u8]) {
        let last = needle.len() - 1;
        self.skip.fill(needle.len() as u16);
        for (i, &b) in needle[..last].iter().enumerate() {
            self.skip[b as usize] = (last - i) as u16;
        }
    }

    /// Offset of the first occurrence of `needle` in `haystack`
    fn search_window(&mut self, needle: &[u8], haystack: &[u8]) -> Option<usize> {
        if needle.len() > haystack.len() {
            return None;
        }
        self.compute_skip_table(needle);

        let last = needle.len() - 1;
        let mut at = 0;
        while at + needle.len() <= haystack.len() {
            let tail = haystack[at + last];
            if tail == needle[last] && haystack[at..at + last] == needle[..last] {
                return Some(at);
            }
            at += self.skip[tail as usize] as usize;
        }
        None
    }
}

impl Default for NintendoFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchFinder for NintendoFinder {
    fn find_match(&mut self, src: &[u8], pos: usize) -> Option<Match> {
        let max = max_match_len(src.len(), pos);
        if max < MIN_MATCH_LEN {
            return None;
        }

        let mut window = pos.saturating_sub(WINDOW_SIZE);
        let mut needle_len = MIN_MATCH_LEN;
        let mut best: Option<Match> = None;

        while window < pos {
            // The haystack runs up to the end of the needle so that matches
            // overlapping the cursor are found
            let needle = &src[pos..pos + needle_len];
            let haystack = &src[window..pos + needle_len];
            let offset = match self.search_window(needle, haystack) {
                Some(off) if off < pos - window => off,
                _ => break,
            };

            let found = window + offset;
            while needle_len < max && src[found + needle_len] == src[pos + needle_len] {
                needle_len += 1;
            }
            best = Some(Match::new(pos - found, needle_len));
            if needle_len == max {
                break;
            }

            // Anything worth switching to must beat this match by a byte
            needle_len += 1;
            window = found + 1;
        }
        best
    }
}
