//! CTLib-style search.
//!
//! Positions are bucketed by their byte value. The buckets are filled 4096
//! positions at a time: the first fill covers `0..4096`, and once the cursor
//! has moved 4096 or more bytes past the start of the last fill, entries 4096
//! or more bytes behind the cursor are dropped and the next 4096 positions
//! from the cursor are added. Positions that a long match jumped over between
//! two fills are never indexed.
//!
//! For the cursor, the bucket of its first byte is scanned oldest to newest
//! within the window and the first candidate reaching each new best length is
//! kept, so ties go to the farthest match. The encoder pads CTLib streams to a
//! multiple of 4 bytes.

use super::{common_prefix, max_match_len, MatchFinder};
use crate::yaz0::{Match, MIN_MATCH_LEN, WINDOW_SIZE};

pub struct CtLibFinder {
    /// Ascending positions of each byte value
    buckets: Vec<Vec<u32>>,
    /// Per bucket: first entry that may still be inside the window
    cursor: [usize; 256],
    /// Start of the last fill, `None` until the first query
    fill_start: Option<usize>,
}

impl CtLibFinder {
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); 256],
            cursor: [0; 256],
            fill_start: None,
        }
    }

    fn fill(&mut self, src: &[u8], from: usize) {
        let end = (from + WINDOW_SIZE).min(src.len());
        for (pos, &b) in src[from..end].iter().enumerate() {
            self.buckets[b as usize].push((from + pos) as u32);
        }
        self.fill_start = Some(from);
    }

    /// Drop entries 4096 or more bytes behind `pos` and index the next block
    fn refill(&mut self, src: &[u8], pos: usize) {
        for bucket in &mut self.buckets {
            bucket.retain(|&p| pos - (p as usize) < WINDOW_SIZE);
        }
        self.cursor = [0; 256];
        self.fill(src, pos);
    }
}

impl Default for CtLibFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchFinder for CtLibFinder {
    fn find_match(&mut self, src: &[u8], pos: usize) -> Option<Match> {
        let fill_start = match self.fill_start {
            Some(start) => start,
            None => {
                self.fill(src, 0);
                0
            }
        };
        if pos - fill_start >= WINDOW_SIZE {
            self.refill(src, pos);
        }

        let max = max_match_len(src.len(), pos);
        if max < MIN_MATCH_LEN {
            return None;
        }

        let first = src[pos] as usize;
        let floor = pos.saturating_sub(WINDOW_SIZE);
        let bucket = &self.buckets[first];

        // Queries only move forward, so entries that fell out of the window stay out
        let mut start = self.cursor[first];
        while start < bucket.len() && (bucket[start] as usize) < floor {
            start += 1;
        }
        self.cursor[first] = start;

        let mut best: Option<Match> = None;
        for &candidate in &bucket[start..] {
            let c = candidate as usize;
            if c >= pos {
                break;
            }
            let len = common_prefix(src, c, pos, max);
            if len >= MIN_MATCH_LEN && best.map_or(true, |b| len > b.length) {
                best = Some(Match::new(pos - c, len));
                if len == max {
                    break;
                }
            }
        }
        best
    }
}
