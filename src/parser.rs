//! # Entry/Key Parser
//!
//! Sequential scanner over dictionary bytes. The dictionary format is
//! newline-delimited byte records with no header and no escaping; a record's
//! offset is its starting byte position and its length runs to the next `\n`
//! (a final record without a trailing newline is still a record).
//!
//! [`KeyStream`] is the pull interface the build engine and verifier share:
//! it scans one entry at a time, hands it to the active key strategy with a
//! fresh continuation, and yields one `(key, entry_offset)` pair per call
//! until both the entry's keys and the dictionary are exhausted.
//!
//! An entry longer than `max_entry_size` is a corruption-class error that
//! aborts the whole pass.

use eyre::{bail, Result};

use crate::keys::KeyStrategy;

/// Reads the entry starting at `offset`: the bytes up to (excluding) the next
/// `\n` or the end of the dictionary. An out-of-range offset reads as empty.
pub fn entry_at(dict: &[u8], offset: usize) -> &[u8] {
    let Some(rest) = dict.get(offset..) else {
        return &[];
    };

    match rest.iter().position(|&b| b == b'\n') {
        Some(n) => &rest[..n],
        None => rest,
    }
}

/// Streaming `(key, entry_offset)` source over one dictionary.
///
/// One `KeyStream` per build or verify pass; the stream holds the parse
/// position, the current entry, and the strategy's continuation word.
pub struct KeyStream<'d> {
    dict: &'d [u8],
    strategy: KeyStrategy,
    max_entry_size: usize,
    pos: usize,
    entry: Option<(&'d [u8], u32)>,
    continuation: u32,
}

impl<'d> KeyStream<'d> {
    pub fn new(dict: &'d [u8], strategy: KeyStrategy, max_entry_size: usize) -> Self {
        Self {
            dict,
            strategy,
            max_entry_size,
            pos: 0,
            entry: None,
            continuation: 0,
        }
    }

    /// Yields the next `(key, entry_offset)` pair, or `None` once the whole
    /// dictionary has been consumed.
    pub fn next_key(&mut self) -> Result<Option<(&'d [u8], u32)>> {
        loop {
            if self.entry.is_none() {
                match self.scan_entry()? {
                    Some(entry) => {
                        self.entry = Some(entry);
                        self.continuation = 0;
                    }
                    None => return Ok(None),
                }
            }

            let (bytes, offset) = self.entry.unwrap_or((&[], 0));
            match (self.strategy.key_fn())(bytes, &mut self.continuation) {
                Some(key) => return Ok(Some((key, offset))),
                None => self.entry = None,
            }
        }
    }

    /// Byte offset of the next unscanned entry. After `next_key` has returned
    /// `None` this must equal the dictionary length; anything less means the
    /// scan stopped early.
    pub fn final_offset(&self) -> usize {
        self.pos
    }

    fn scan_entry(&mut self) -> Result<Option<(&'d [u8], u32)>> {
        if self.pos >= self.dict.len() {
            return Ok(None);
        }

        let start = self.pos;
        let rest = &self.dict[start..];

        // Only look max_entry_size + 1 bytes ahead: a newline any further
        // away means the entry itself is over the limit.
        let window = rest.len().min(self.max_entry_size + 1);

        match rest[..window].iter().position(|&b| b == b'\n') {
            Some(n) => {
                self.pos = start + n + 1;
                Ok(Some((&rest[..n], start as u32)))
            }
            None if rest.len() <= self.max_entry_size => {
                // Final entry without a trailing newline.
                self.pos = self.dict.len();
                Ok(Some((rest, start as u32)))
            }
            None => bail!(
                "dictionary entry at offset {} exceeds max entry size of {} bytes",
                start,
                self.max_entry_size
            ),
        }
    }
}

/// Plain entry iterator, without key extraction. Used by the CLI dump and by
/// anything that wants to walk records rather than keys.
pub struct Entries<'d> {
    dict: &'d [u8],
    pos: usize,
}

impl<'d> Entries<'d> {
    pub fn new(dict: &'d [u8]) -> Self {
        Self { dict, pos: 0 }
    }
}

impl<'d> Iterator for Entries<'d> {
    type Item = (u32, &'d [u8]);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.dict.len() {
            return None;
        }

        let start = self.pos;
        let bytes = entry_at(self.dict, start);
        self.pos = start + bytes.len() + 1;

        Some((start as u32, bytes))
    }
}
