//! # Query Engine
//!
//! Exact-key lookup over a built table. [`Index::find`] computes the key's
//! bucket hash and checksum, probes from `hash & (table_size - 1)`, and hands
//! back a [`Query`] positioned on the first slot whose checksum matches; an
//! empty slot ends the probe and means the key is absent.
//!
//! The iterator continues the same open-addressing walk on demand, yielding
//! one dictionary entry per matching slot until it reaches an empty slot.
//! Since probing only reads the post-build table, any number of *distinct*
//! iterators may run concurrently over one index; a single iterator is not
//! shareable.
//!
//! The probe is additionally capped at `table_size` slots so that a corrupt
//! index file with no empty slot cannot loop forever.

use crate::hash::{bucket_hash, slot_checksum};
use crate::parser::entry_at;

use super::{Index, Slot};

/// One lookup result: the matching entry's byte offset and its bytes (up to,
/// excluding, the terminating newline).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry<'i> {
    pub offset: u32,
    pub bytes: &'i [u8],
}

/// Stateful result iterator for one key. Borrows the index; cannot outlive it.
#[derive(Debug)]
pub struct Query<'i> {
    slots: &'i [Slot],
    dict: &'i [u8],
    mask: u32,
    checksum: u32,
    /// Next slot to examine when advancing.
    next_probe: u32,
    /// Slots examined so far; the walk stops after table_size of them.
    probed: u32,
    /// Offset of the current match, or None once exhausted.
    current: Option<u32>,
}

impl Index {
    /// Looks up an exact key. Returns `None` when the key is absent.
    pub fn find(&self, key: &[u8]) -> Option<Query<'_>> {
        let slots = self.slots().ok()?;
        let dict = self.dict.bytes();
        let mask = self.table_size - 1;

        let checksum = slot_checksum(key);
        let mut probe = bucket_hash(key) & mask;
        let mut probed = 0u32;

        while probed < self.table_size {
            let slot = &slots[probe as usize];
            probed += 1;

            if slot.is_empty() {
                return None;
            }

            if slot.checksum() == checksum {
                return Some(Query {
                    slots,
                    dict,
                    mask,
                    checksum,
                    next_probe: (probe + 1) & mask,
                    probed,
                    current: Some(slot.offset()),
                });
            }

            probe = (probe + 1) & mask;
        }

        None
    }
}

impl<'i> Query<'i> {
    /// Copies the next matching entry into `buf`, silently truncated to the
    /// buffer length, and returns the bytes written; 0 once exhausted.
    /// Truncation is a diagnostic concern for the caller, never an error.
    pub fn next_result(&mut self, buf: &mut [u8]) -> usize {
        match self.next() {
            None => 0,
            Some(entry) => {
                let n = entry.bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&entry.bytes[..n]);
                n
            }
        }
    }

    /// Continues the probe past the current slot to the next one with the
    /// same checksum; `None` at the first empty slot.
    fn advance(&mut self) -> Option<u32> {
        while self.probed < self.slots.len() as u32 {
            let slot = &self.slots[self.next_probe as usize];
            self.probed += 1;
            self.next_probe = (self.next_probe + 1) & self.mask;

            if slot.is_empty() {
                return None;
            }

            if slot.checksum() == self.checksum {
                return Some(slot.offset());
            }
        }

        None
    }
}

impl<'i> Iterator for Query<'i> {
    type Item = Entry<'i>;

    fn next(&mut self) -> Option<Entry<'i>> {
        let offset = self.current.take()?;
        self.current = self.advance();

        Some(Entry {
            offset,
            bytes: entry_at(self.dict, offset as usize),
        })
    }
}
