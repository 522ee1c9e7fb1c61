//! Mario Kart 8's encoder.
//!
//! Positions are hashed on their next three bytes into a 0x8000-entry head
//! table and chained through a 4096-entry ring indexed by position, so
//! candidates come newest first and equal-length ties go to the nearest match.
//! Only the head of a chain may sit a full 4096 bytes back. A match shorter
//! than 273 bytes is held while the next position is searched; if that search
//! finds something longer, a literal goes out instead and the next iteration
//! reuses the lookahead's chain.
//!
//! Input is staged through a data buffer of 100 × 8 KiB. Once fewer than 275
//! bytes are left in it and the cursor is far enough in, everything from 4096
//! bytes behind the cursor slides to the front, the buffer is topped up from
//! the source and every stored position is rebased, which also reshuffles the
//! ring. Hashes and comparisons near the end read whatever the buffer holds
//! past the input: zeros, or older bytes a slide left behind.

use super::Emitter;
use crate::error::Result;
use crate::yaz0::{Match, MAX_MATCH_LEN, MIN_MATCH_LEN, WINDOW_SIZE};

const DATA_BUFFER_SIZE: usize = 0x2000 * 100;
const HASH_TABLE_SIZE: u32 = 0x8000;
/// Room for comparisons that start near the end of the data buffer
const SLACK: usize = MAX_MATCH_LEN + 3;
/// The inner loop hands back to the slide check below this many buffered bytes
const LOW_WATER: usize = MAX_MATCH_LEN + 2;
const SLIDE_MIN_POS: usize = WINDOW_SIZE + 14 * MAX_MATCH_LEN;
const NONE: i32 = -1;

/// Hash of the three bytes starting at the position being inserted
#[derive(Default)]
struct TripletHash(u32);

impl TripletHash {
    fn push(&mut self, byte: u8) {
        self.0 = ((self.0 << 5) ^ byte as u32) % HASH_TABLE_SIZE;
    }
}

struct Window {
    data: Vec<u8>,
    /// Newest position per hash
    head: Vec<i32>,
    /// Previous position with the same hash, by `pos % WINDOW_SIZE`
    chain: Vec<i32>,
}

impl Window {
    fn new() -> Self {
        Self {
            data: vec![0; DATA_BUFFER_SIZE + SLACK],
            head: vec![NONE; HASH_TABLE_SIZE as usize],
            chain: vec![NONE; WINDOW_SIZE],
        }
    }

    /// Make `pos` the newest entry for `hash`; returns the entry it displaced
    fn insert(&mut self, pos: usize, hash: &TripletHash) -> i32 {
        let slot = pos % WINDOW_SIZE;
        self.chain[slot] = self.head[hash.0 as usize];
        self.head[hash.0 as usize] = pos as i32;
        self.chain[slot]
    }

    /// Walk the chain from `head` for the longest match at `pos`.
    ///
    /// Lengths are cut to the `buffered` bytes left, and a later candidate
    /// has to beat the cut length to replace an earlier one.
    fn search(&self, head: i32, pos: usize, buffered: usize) -> Option<Match> {
        if pos - head as usize > WINDOW_SIZE {
            return None;
        }
        let floor = if pos > WINDOW_SIZE {
            (pos - WINDOW_SIZE) as i32
        } else {
            NONE
        };

        let cur = &self.data[pos..];
        let mut best_len = 2;
        let mut best = None;
        let mut candidate = head;

        for _ in 0..WINDOW_SIZE {
            let c = candidate as usize;
            let prev = &self.data[c..];
            if prev[0] == cur[0] && prev[1] == cur[1] && prev[best_len] == cur[best_len] {
                let len = (2..MAX_MATCH_LEN)
                    .find(|&i| prev[i] != cur[i])
                    .unwrap_or(MAX_MATCH_LEN);
                if len > best_len {
                    best_len = len.min(buffered);
                    best = Some(Match::new(pos - c, best_len));
                    if len == MAX_MATCH_LEN {
                        break;
                    }
                }
            }

            candidate = self.chain[c % WINDOW_SIZE];
            if candidate <= floor {
                break;
            }
        }
        best.filter(|m| m.length >= MIN_MATCH_LEN)
    }

    /// Move `data[shift..]` to the front and rebase every stored position
    fn slide(&mut self, shift: usize) {
        self.data.copy_within(shift..DATA_BUFFER_SIZE, 0);
        let shift = shift as i32;
        for p in self.head.iter_mut().chain(self.chain.iter_mut()) {
            *p = if *p >= shift { *p - shift } else { NONE };
        }
    }
}

pub(crate) fn encode(src: &[u8], out: &mut Emitter<'_, '_>) -> Result<()> {
    let mut w = Window::new();
    let mut read_end = src.len().min(DATA_BUFFER_SIZE);
    w.data[..read_end].copy_from_slice(&src[..read_end]);
    // Bytes from the cursor to the end of what has been loaded
    let mut buffered = read_end;

    let mut hash = TripletHash::default();
    hash.push(w.data[0]);
    hash.push(w.data[1]);

    let mut pos = 0;
    let mut candidate = NONE;
    // The cursor already sits one past the literal being decided, and
    // `candidate` is the chain for it
    let mut deferred = false;

    while buffered > 0 {
        loop {
            if deferred {
                deferred = false;
            } else {
                hash.push(w.data[pos + 2]);
                candidate = w.insert(pos, &hash);
            }

            let mut current = None;
            if candidate != NONE {
                current = w.search(candidate, pos, buffered);
                if let Some(m) = current.filter(|m| m.length < MAX_MATCH_LEN) {
                    pos += 1;
                    buffered -= 1;
                    hash.push(w.data[pos + 2]);
                    candidate = w.insert(pos, &hash);
                    if candidate != NONE
                        && w
                            .search(candidate, pos, buffered)
                            .is_some_and(|next| next.length > m.length)
                    {
                        current = None;
                    }
                    deferred = true;
                }
            }

            let ahead = deferred as usize;
            match current {
                Some(m) => {
                    out.back_ref(m)?;
                    buffered -= m.length - ahead;
                    for _ in 0..m.length - 1 - ahead {
                        pos += 1;
                        hash.push(w.data[pos + 2]);
                        w.insert(pos, &hash);
                    }
                    pos += 1;
                    deferred = false;
                }
                None => {
                    out.literal(w.data[pos - ahead])?;
                    if !deferred {
                        pos += 1;
                        buffered -= 1;
                    }
                }
            }

            if buffered < LOW_WATER {
                break;
            }
        }

        if pos >= SLIDE_MIN_POS {
            let shift = pos - WINDOW_SIZE;
            let kept = DATA_BUFFER_SIZE - shift;
            w.slide(shift);
            let take = shift.min(src.len() - read_end);
            w.data[kept..kept + take].copy_from_slice(&src[read_end..read_end + take]);
            read_end += take;
            buffered += take;
            pos -= shift;
        }
    }
    Ok(())
}
