//! CTGP's streaming encoder.
//!
//! Input goes through one byte at a time. The last 4096 bytes live in a ring
//! and the newest three wait in a shift register until they can be hashed
//! together. A 0x4000-slot open-addressing table maps 3-byte sequences to ring
//! locations, with linear probing, tombstones on removal and a full rebuild
//! once more than 0x555 tombstones pile up.
//!
//! A sequence found in the table starts a match that grows byte by byte while
//! the input keeps agreeing with the ring. Matches of three bytes or fewer go
//! out as literals, longer ones in chunks of at most 273 bytes. When no
//! sequence is found the byte is a literal, and a run at distance 1 or 2 is
//! tried for the following byte instead.
//!
//! The ring starts zeroed, so a match can point before the start of the input
//! when the data opens with zero bytes; such chunks are written as literals.

use super::Emitter;
use crate::error::{Error, Result};
use crate::yaz0::{Match, MAX_MATCH_LEN};

const RING_SIZE: usize = 0x1000;
const RING_MASK: u32 = 0xFFF;
const TABLE_SIZE: usize = 0x4000;
const TABLE_MASK: usize = TABLE_SIZE - 1;
/// Slot has held an entry; tombstones keep this bit
const USED: u16 = 0x8000;
/// Slot holds a ring location in its low 12 bits
const LIVE: u16 = 0x4000;
const TOMBSTONE: u16 = USED;
const MAX_TOMBSTONES: u32 = 0x555;
const NO_HOME: u16 = 0xFFFF;
/// Ring locations are unlinked once this many bytes have gone through
const EVICT_AFTER: u32 = 0x1004;
const INDEX_AFTER: u32 = 9;

fn hash(key: u32) -> usize {
    let h = key
        .wrapping_mul(key)
        .wrapping_mul(0xEF34)
        .wrapping_add(key)
        .wrapping_add(0xB205);
    (h >> 10) as usize & TABLE_MASK
}

fn lost_location(loc: u32) -> Error {
    Error::EncodeFailure(format!("ctgp hash table lost ring location {loc:#x}"))
}

struct Stream {
    ring: Vec<u8>,
    /// Next ring slot to write
    head: u32,
    table: Vec<u16>,
    tombstones: u32,
    /// Newest input byte in the top 8 bits, older ones below it
    shifter: u32,
    /// Bytes in `shifter` not yet written to the ring
    pending: u32,
    /// Input bytes taken so far
    fed: u32,
    /// Ring location the running match compares against next
    copy_from: Option<u32>,
    /// Distance of the running match, minus one
    copy_distance: u32,
    copy_len: u32,
}

impl Stream {
    fn new() -> Self {
        Self {
            ring: vec![0; RING_SIZE],
            head: 0,
            table: vec![0; TABLE_SIZE],
            tombstones: 0,
            shifter: 0,
            pending: 0,
            fed: 0,
            copy_from: None,
            copy_distance: 0,
            copy_len: 0,
        }
    }

    fn byte_at(&self, loc: u32) -> u8 {
        self.ring[(loc & RING_MASK) as usize]
    }

    /// The three ring bytes from `loc` on, first byte lowest
    fn triple(&self, loc: u32) -> u32 {
        self.byte_at(loc) as u32
            | (self.byte_at(loc + 1) as u32) << 8
            | (self.byte_at(loc + 2) as u32) << 16
    }

    fn write_ring(&mut self, byte: u8) {
        self.ring[self.head as usize] = byte;
        self.head = (self.head + 1) & RING_MASK;
    }

    fn push(&mut self, byte: u8, out: &mut Emitter<'_, '_>) -> Result<()> {
        if self.absorb(byte, out)? {
            return Ok(());
        }
        self.flush_residue(out)?;
        self.start_token(out)
    }

    fn finish(&mut self, out: &mut Emitter<'_, '_>) -> Result<()> {
        if self.copy_from.is_some() {
            self.write_match(out)?;
        }
        self.flush_residue(out)?;
        while self.pending > 0 {
            let byte = (self.shifter >> (32 - 8 * self.pending)) as u8;
            self.write_ring(byte);
            out.literal(byte)?;
            self.pending -= 1;
        }
        Ok(())
    }

    /// Shift `byte` in and keep the table current. Returns true when the byte
    /// needs nothing more: the register is still filling or the running match
    /// grew.
    fn absorb(&mut self, byte: u8, out: &mut Emitter<'_, '_>) -> Result<bool> {
        let seen = self.fed;
        self.fed += 1;
        self.pending += 1;
        self.shifter = (byte as u32) << 24 | self.shifter >> 8;
        if self.pending < 3 {
            return Ok(true);
        }

        if seen > EVICT_AFTER {
            self.evict()?;
        }
        if self.fed > INDEX_AFTER {
            self.index_newest()?;
        }

        if let Some(from) = self.copy_from {
            let next = (self.shifter >> 8) as u8;
            if next == self.ring[from as usize] {
                self.write_ring(next);
                self.pending -= 1;
                self.copy_from = Some((from + 1) & RING_MASK);
                self.copy_len += 1;
                return Ok(true);
            }
            self.write_match(out)?;
        }
        Ok(false)
    }

    /// Unlink the ring location just past the write head, or repoint its slot
    /// at one of the next four locations holding the same three bytes.
    ///
    /// Locations inside long runs were never linked (see `index_newest`);
    /// reaching an empty slot means there is nothing to unlink.
    fn evict(&mut self) -> Result<()> {
        let loc = (self.head + 1) & RING_MASK;
        let key = self.triple(loc);
        let mut slot = hash(key);
        for step in 0..=TABLE_SIZE {
            let entry = self.table[slot];
            if entry & USED == 0 {
                return Ok(());
            }
            if step == TABLE_SIZE {
                return Err(lost_location(loc));
            }
            if entry & LIVE != 0 && u32::from(entry & 0x3FFF) == loc {
                break;
            }
            slot = (slot + 1) & TABLE_MASK;
        }

        match (loc + 1..=loc + 4).find(|&l| self.triple(l) == key) {
            Some(l) => self.table[slot] = (l & RING_MASK) as u16 | USED | LIVE,
            None => {
                self.tombstones += 1;
                self.table[slot] = TOMBSTONE;
            }
        }
        if self.tombstones > MAX_TOMBSTONES {
            self.rebuild();
        }
        Ok(())
    }

    /// Link the newest complete sequence in the ring unless one of the four
    /// locations before it holds the same bytes
    fn index_newest(&mut self) -> Result<()> {
        let loc = self.head.wrapping_sub(3) & RING_MASK;
        let key = self.triple(loc);
        if (1..=4).any(|k| self.triple(loc.wrapping_sub(k) & RING_MASK) == key) {
            return Ok(());
        }

        let mut slot = hash(key);
        let mut steps = 0;
        while self.table[slot] & LIVE != 0 {
            steps += 1;
            if steps == TABLE_SIZE {
                return Err(Error::EncodeFailure("ctgp hash table is full".into()));
            }
            slot = (slot + 1) & TABLE_MASK;
        }
        let old = self.table[slot];
        self.table[slot] = loc as u16 | USED | LIVE;
        self.tombstones = self.tombstones.wrapping_sub(u32::from(old >> 15));
        Ok(())
    }

    /// Clear every tombstone, pulling later cluster members back toward their
    /// home slot
    fn rebuild(&mut self) {
        let mut homes = vec![NO_HOME; TABLE_SIZE];
        for i in 0..TABLE_SIZE {
            if self.table[i] & (USED | LIVE) != TOMBSTONE {
                continue;
            }
            // First empty slot after the cluster
            let mut end = (i + 1) & TABLE_MASK;
            while self.table[end] & USED != 0 {
                end = (end + 1) & TABLE_MASK;
            }

            let mut hole = i;
            'cluster: loop {
                self.table[hole] = 0;
                homes[hole] = NO_HOME;

                let mut at = end;
                let mover = loop {
                    at = at.wrapping_sub(1) & TABLE_MASK;
                    if at == hole {
                        break 'cluster;
                    }
                    let entry = self.table[at];
                    if entry & LIVE == 0 {
                        continue;
                    }
                    let home = match homes[at] {
                        NO_HOME => {
                            let h = hash(self.triple(u32::from(entry) & RING_MASK)) as u16;
                            homes[at] = h;
                            h
                        }
                        h => h,
                    };
                    // Distances from the entry's home slot
                    let home = home as usize;
                    let from_home = at.wrapping_sub(home) & TABLE_MASK;
                    if from_home >= hole.wrapping_sub(home) & TABLE_MASK {
                        break at;
                    }
                };

                self.table[hole] = self.table[mover];
                homes[hole] = homes[mover];
                self.table[mover] = TOMBSTONE;
                homes[mover] = NO_HOME;
                hole = mover;
            }
        }
        tracing::trace!(fed = self.fed, "rebuilt ctgp hash table");
        self.tombstones = 0;
    }

    /// Ring location of a live entry holding `key`
    fn lookup(&self, key: u32) -> Result<Option<u32>> {
        let mut slot = hash(key);
        for _ in 0..=TABLE_SIZE {
            let entry = self.table[slot];
            if entry & LIVE != 0 {
                let loc = u32::from(entry) & RING_MASK;
                if self.triple(loc) == key {
                    return Ok(Some(loc));
                }
            } else if entry & USED == 0 {
                return Ok(None);
            }
            slot = (slot + 1) & TABLE_MASK;
        }
        Err(Error::EncodeFailure("ctgp hash table has no empty slot".into()))
    }

    /// Place the oldest pending byte, as the start of a match or a literal
    fn start_token(&mut self, out: &mut Emitter<'_, '_>) -> Result<()> {
        let key = self.shifter >> 8;
        let byte = key as u8;
        self.write_ring(byte);
        self.pending = 2;

        if let Some(loc) = self.lookup(key)? {
            let from = (loc + 1) & RING_MASK;
            self.copy_len = 1;
            self.copy_from = Some(from);
            self.copy_distance = self.head.wrapping_sub(1).wrapping_sub(from) & RING_MASK;
            return Ok(());
        }

        out.literal(byte)?;
        self.copy_len = 0;
        self.copy_distance = 0;
        self.copy_from = None;

        let next = (key >> 8) as u8;
        let last = self.head.wrapping_sub(1) & RING_MASK;
        if self.ring[last as usize] == next {
            self.copy_from = Some(last);
        }
        let before = self.head.wrapping_sub(2) & RING_MASK;
        if self.ring[before as usize] == next {
            self.copy_from = Some(before);
            self.copy_distance = 1;
        }
        Ok(())
    }

    /// Emit the running match if it is longer than three bytes, leaving at
    /// most two bytes behind
    fn write_match(&mut self, out: &mut Emitter<'_, '_>) -> Result<()> {
        if self.copy_len <= 3 {
            return Ok(());
        }
        while self.copy_len > 2 {
            let len = self.copy_len.min(MAX_MATCH_LEN as u32);
            let chunk = Match::new(self.copy_distance as usize + 1, len as usize);
            out.back_ref_or_literals(chunk)?;
            self.copy_len -= len;
        }
        Ok(())
    }

    /// Write what is left of the running match as literals
    fn flush_residue(&mut self, out: &mut Emitter<'_, '_>) -> Result<()> {
        while self.copy_len > 0 {
            out.literal(self.byte_at(self.head.wrapping_sub(self.copy_len)))?;
            self.copy_len -= 1;
        }
        Ok(())
    }
}

pub(crate) fn encode(src: &[u8], out: &mut Emitter<'_, '_>) -> Result<()> {
    let mut stream = Stream::new();
    for &byte in src {
        stream.push(byte, out)?;
    }
    stream.finish(out)
}
