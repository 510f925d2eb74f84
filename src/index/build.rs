//! # Build Engine
//!
//! Fills the hash table from the parser's key stream using open addressing.
//! A fill attempt runs over the entire dictionary; two conditions abort it
//! with an internal overflow signal rather than an error:
//!
//! - the table is nearly full (`entries >= table_size * 15/16`)
//! - a single probe passed more than `max_chain` foreign-checksum slots
//!
//! On overflow the table is doubled (a hard error once `max_table_size` is
//! exceeded), zeroed, and the fill restarts from the first key. Records
//! beyond `max_list` for one checksum are dropped silently by policy; callers
//! rely on that to bound result-set size for common keys.
//!
//! Build is a single-writer operation; nothing else may touch the index or
//! any index sharing its storage while it runs.

use std::sync::Arc;

use eyre::{ensure, eyre, Result};

use crate::config::{FILL_LIMIT_DEN, FILL_LIMIT_NUM, SLOT_SIZE};
use crate::hash::{bucket_hash, slot_checksum};
use crate::keys::KeyStrategy;
use crate::parser::KeyStream;

use super::Index;

/// Diagnostics from a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Filled slots in the final table.
    pub entries: u32,
    /// Longest probe chain observed during the final fill attempt.
    pub max_chain: u32,
    /// Largest number of records sharing one checksum.
    pub max_list: u32,
    /// Final table size in slots.
    pub table_size: u32,
}

enum FillOutcome {
    Done(BuildStats),
    /// Chain or fill-ratio threshold hit; the table must double and the fill
    /// restart. Not an error.
    Overflow,
}

impl Index {
    /// Rebuilds the whole table from the dictionary using `strategy`.
    ///
    /// Returns diagnostics on success and flushes the table to its backing
    /// file. On failure the index stays alive but its table contents are not
    /// valid for queries.
    pub fn build(&mut self, strategy: KeyStrategy) -> Result<BuildStats> {
        loop {
            match self.fill(strategy)? {
                FillOutcome::Done(stats) => {
                    self.flush()?;
                    return Ok(stats);
                }
                FillOutcome::Overflow => self.grow_table()?,
            }
        }
    }

    fn fill(&mut self, strategy: KeyStrategy) -> Result<FillOutcome> {
        let table_size = self.table_size;
        let mask = table_size - 1;
        let max_chain = self.params.max_chain();
        let max_list = self.params.max_list();
        let max_entry_size = self.params.max_entry_size();
        let fill_limit = (table_size as u64 * FILL_LIMIT_NUM / FILL_LIMIT_DEN) as u32;

        let dict = Arc::clone(&self.dict);
        let mut stream = KeyStream::new(dict.bytes(), strategy, max_entry_size);

        let slots = self.slots_mut()?;
        for slot in slots.iter_mut() {
            slot.set(0, 0);
        }

        let mut entries = 0u32;
        let mut max_chain_seen = 0u32;
        let mut max_list_seen = 0u32;

        while let Some((key, offset)) = stream.next_key()? {
            let hash = bucket_hash(key);
            let checksum = slot_checksum(key);

            let mut probe = hash & mask;
            let mut chain = 0u32;
            let mut list = 0u32;

            loop {
                let slot = &mut slots[probe as usize];

                if slot.is_empty() {
                    slot.set(checksum, offset);
                    entries += 1;
                    max_list_seen = max_list_seen.max(list + 1);
                    break;
                }

                if slot.checksum() == checksum {
                    list += 1;
                    if list >= max_list {
                        // Drop, don't error: the list for this key is full.
                        max_list_seen = max_list_seen.max(list);
                        break;
                    }
                } else {
                    // Only foreign slots count toward the collision chain.
                    // A key's own list is bounded by max_list, and a long
                    // run of duplicates would survive any number of table
                    // doublings, so counting it here could only turn a
                    // legal dictionary into a permanent overflow.
                    chain += 1;
                    if chain > max_chain {
                        return Ok(FillOutcome::Overflow);
                    }
                }

                probe = (probe + 1) & mask;
            }

            max_chain_seen = max_chain_seen.max(chain);

            if entries >= fill_limit {
                return Ok(FillOutcome::Overflow);
            }
        }

        ensure!(
            stream.final_offset() == dict.len(),
            "parser consumed only {} of {} dictionary bytes",
            stream.final_offset(),
            dict.len()
        );

        Ok(FillOutcome::Done(BuildStats {
            entries,
            max_chain: max_chain_seen,
            max_list: max_list_seen,
            table_size,
        }))
    }

    fn grow_table(&mut self) -> Result<()> {
        let new_size = self
            .table_size
            .checked_mul(2)
            .ok_or_else(|| eyre!("cannot double table of {} slots", self.table_size))?;

        ensure!(
            new_size <= self.params.max_table_size(),
            "table of {} slots exceeds maximum table size of {} slots",
            new_size,
            self.params.max_table_size()
        );

        self.table.resize(new_size as usize * SLOT_SIZE)?;
        self.table_size = new_size;
        Ok(())
    }
}
