//! # Verifier
//!
//! Re-derives every key from the dictionary and confirms each is discoverable
//! through the query engine at its original offset. Used as a correctness and
//! regression tool after building.
//!
//! Verify must run with the *same* key strategy and the same `max_list` the
//! index was built with; neither is recorded in the index file. The coupling
//! matters for `max_list`: a record legitimately dropped at build time is
//! recognized here by its list being full: iterating `max_list` results
//! without finding the offset is accepted, while exhausting the list early is
//! index corruption and aborts immediately.

use eyre::{ensure, eyre, Result};

use crate::keys::KeyStrategy;
use crate::parser::KeyStream;

use super::Index;

/// Diagnostics from a successful verification pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyStats {
    /// Keys checked (one per key occurrence the parser yields).
    pub keys: u64,
    /// Result records iterated across all keys.
    pub results: u64,
    /// Longest result list walked for any single key.
    pub max_list: u32,
}

impl Index {
    /// Checks that every `(key, offset)` pair the parser yields is reachable
    /// through [`Index::find`]. Any unreachable pair is a hard
    /// index-corruption error.
    pub fn verify(&self, strategy: KeyStrategy) -> Result<VerifyStats> {
        let max_list = self.params.max_list();
        let mut stream =
            KeyStream::new(self.dict.bytes(), strategy, self.params.max_entry_size());

        let mut keys = 0u64;
        let mut results = 0u64;
        let mut max_list_seen = 0u32;

        while let Some((key, offset)) = stream.next_key()? {
            keys += 1;

            let query = self.find(key).ok_or_else(|| {
                eyre!(
                    "index corrupt: key {:?} from offset {} is not in the table",
                    String::from_utf8_lossy(key),
                    offset
                )
            })?;

            let mut found = false;
            let mut exhausted = false;
            let mut list = 0u32;

            for entry in query {
                list += 1;
                results += 1;

                if entry.offset == offset {
                    found = true;
                    break;
                }
                if list >= max_list {
                    break;
                }
            }
            if !found && list < max_list {
                exhausted = true;
            }

            max_list_seen = max_list_seen.max(list);

            // A full list without a match means the record was dropped at
            // build time under the same max_list; a short list without a
            // match means the table lost it.
            ensure!(
                !exhausted,
                "index corrupt: key {:?} does not list its entry at offset {}",
                String::from_utf8_lossy(key),
                offset
            );
        }

        Ok(VerifyStats {
            keys,
            results,
            max_list: max_list_seen,
        })
    }
}
