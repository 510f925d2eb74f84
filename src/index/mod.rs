//! # Index Core
//!
//! This module owns the two mappings an index is made of, the dictionary
//! bytes and the hash-table slot array, and the lifecycle operations over
//! them: create a fresh table, open an existing one, share a dictionary with
//! a second index, and tune parameters.
//!
//! ## On-Disk Format
//!
//! The index file is the raw little-endian memory image of the slot array:
//!
//! ```text
//! Offset 0:   Slot 0  { checksum: u32, offset: u32 }
//! Offset 8:   Slot 1
//! Offset 16:  Slot 2
//! ...
//! ```
//!
//! There is no header. The slot count is derived from the file's byte length
//! on open, so the length must be `SLOT_SIZE` times a power of two; anything
//! else is rejected as corrupt. A slot whose checksum is 0 is empty (the
//! checksum function never produces 0 for a real key).
//!
//! ## Sharing
//!
//! Several indexes with different key strategies can serve one dictionary.
//! The dictionary lives behind an `Arc`: [`Index::share`] clones the handle
//! and allocates a fresh table, so the dictionary mapping cannot be unmapped
//! while any sharer is alive, and no sharer can resize it.
//!
//! ## Zerocopy Safety
//!
//! [`Slot`] derives the zerocopy traits (`FromBytes`, `IntoBytes`,
//! `Immutable`, `KnownLayout`, `Unaligned`), so the slot array is reinterpreted
//! in place over the mapped table bytes with no copying and no alignment
//! requirements.

mod build;
mod query;
mod verify;

pub use build::BuildStats;
pub use query::{Entry, Query};
pub use verify::VerifyStats;

use std::path::Path;
use std::sync::Arc;

use eyre::{ensure, eyre, Result};
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{
    DEFAULT_MAX_CHAIN, DEFAULT_MAX_ENTRY_SIZE, DEFAULT_MAX_LIST, DEFAULT_MAX_TABLE_SIZE,
    DEFAULT_MIN_TABLE_SIZE, MAX_DICT_SIZE, SLOT_SIZE,
};
use crate::storage::{AnyRegion, Backing, RegionKind};

/// One hash-table record: the key's checksum and the byte offset of the
/// matching dictionary entry. Checksum 0 denotes an empty slot.
#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct Slot {
    checksum: U32,
    offset: U32,
}

const _: () = assert!(std::mem::size_of::<Slot>() == SLOT_SIZE);

impl Slot {
    pub fn checksum(&self) -> u32 {
        self.checksum.get()
    }

    pub fn offset(&self) -> u32 {
        self.offset.get()
    }

    pub fn is_empty(&self) -> bool {
        self.checksum.get() == 0
    }

    pub(crate) fn set(&mut self, checksum: u32, offset: u32) {
        self.checksum = U32::new(checksum);
        self.offset = U32::new(offset);
    }
}

/// Validated tuning knobs for build and verify passes.
///
/// Every setter rejects values that would break the engine's invariants, so a
/// params value in hand is always usable.
#[derive(Debug, Clone, Copy)]
pub struct IndexParams {
    min_table_size: u32,
    max_table_size: u32,
    max_entry_size: usize,
    max_chain: u32,
    max_list: u32,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            min_table_size: DEFAULT_MIN_TABLE_SIZE,
            max_table_size: DEFAULT_MAX_TABLE_SIZE,
            max_entry_size: DEFAULT_MAX_ENTRY_SIZE,
            max_chain: DEFAULT_MAX_CHAIN,
            max_list: DEFAULT_MAX_LIST,
        }
    }
}

impl IndexParams {
    pub fn min_table_size(&self) -> u32 {
        self.min_table_size
    }

    pub fn max_table_size(&self) -> u32 {
        self.max_table_size
    }

    pub fn max_entry_size(&self) -> usize {
        self.max_entry_size
    }

    pub fn max_chain(&self) -> u32 {
        self.max_chain
    }

    pub fn max_list(&self) -> u32 {
        self.max_list
    }

    /// Initial table size in slots. Must be a power of two between 2 and the
    /// current maximum.
    pub fn set_min_table_size(&mut self, slots: u32) -> Result<()> {
        ensure!(
            slots >= 2 && slots.is_power_of_two(),
            "min table size {} is not a power of two >= 2",
            slots
        );
        ensure!(
            slots <= self.max_table_size,
            "min table size {} exceeds max table size {}",
            slots,
            self.max_table_size
        );
        self.min_table_size = slots;
        Ok(())
    }

    /// Hard cap in slots for the doubling retry loop. Must be a power of two
    /// no smaller than the current minimum.
    pub fn set_max_table_size(&mut self, slots: u32) -> Result<()> {
        ensure!(
            slots.is_power_of_two(),
            "max table size {} is not a power of two",
            slots
        );
        ensure!(
            slots >= self.min_table_size,
            "max table size {} is below min table size {}",
            slots,
            self.min_table_size
        );
        self.max_table_size = slots;
        Ok(())
    }

    /// Longest accepted dictionary entry in bytes.
    pub fn set_max_entry_size(&mut self, bytes: usize) -> Result<()> {
        ensure!(bytes >= 1, "max entry size must be at least 1 byte");
        self.max_entry_size = bytes;
        Ok(())
    }

    /// Longest tolerated probe chain before a fill attempt aborts.
    pub fn set_max_chain(&mut self, chain: u32) -> Result<()> {
        ensure!(chain >= 1, "max chain must be at least 1");
        self.max_chain = chain;
        Ok(())
    }

    /// Maximum records stored per checksum. Build drops records beyond it;
    /// verify must run with the same value to agree on what was dropped.
    pub fn set_max_list(&mut self, list: u32) -> Result<()> {
        ensure!(list >= 1, "max list must be at least 1");
        self.max_list = list;
        Ok(())
    }
}

/// Read-only view of one dictionary file's bytes, shared by every index built
/// over it.
#[derive(Debug)]
pub struct Dictionary {
    region: AnyRegion,
}

impl Dictionary {
    /// Maps the dictionary file read-only with the mmap backend.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Arc<Self>> {
        Self::open_with(RegionKind::Mmap, path)
    }

    /// Maps the dictionary file read-only with an explicit backend.
    pub fn open_with<P: AsRef<Path>>(kind: RegionKind, path: P) -> Result<Arc<Self>> {
        let path = path.as_ref();
        let region = AnyRegion::open(kind, path)?;
        ensure!(
            region.len() <= MAX_DICT_SIZE,
            "dictionary '{}' is {} bytes, beyond the u32 entry offset limit of {} bytes",
            path.display(),
            region.len(),
            MAX_DICT_SIZE
        );
        region.prefetch();
        Ok(Arc::new(Self { region }))
    }

    /// Wraps in-memory dictionary content. Mostly for tests and callers that
    /// already hold the bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            region: AnyRegion::from_vec(bytes),
        })
    }

    /// The full dictionary content.
    pub fn bytes(&self) -> &[u8] {
        self.region.as_slice()
    }

    /// Dictionary length in bytes. Constant for the lifetime of the mapping.
    pub fn len(&self) -> usize {
        self.region.len()
    }

    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }
}

/// A hash-table index over one dictionary.
///
/// Created empty by [`Index::create`] (then populated by
/// [`Index::build`](Index::build)), or opened over an existing index file by
/// [`Index::open`]. Queries go through [`Index::find`](Index::find).
#[derive(Debug)]
pub struct Index {
    dict: Arc<Dictionary>,
    table: AnyRegion,
    table_size: u32,
    params: IndexParams,
}

impl Index {
    /// Creates an index with an empty table of `min_table_size` slots, using
    /// the mmap backend for the table region.
    pub fn create(dict: Arc<Dictionary>, backing: &Backing, params: IndexParams) -> Result<Self> {
        Self::create_with(RegionKind::Mmap, dict, backing, params)
    }

    /// Creates an index with an explicit table backend.
    pub fn create_with(
        kind: RegionKind,
        dict: Arc<Dictionary>,
        backing: &Backing,
        params: IndexParams,
    ) -> Result<Self> {
        // In-memory dictionaries bypass Dictionary::open, so the offset-width
        // check is repeated here.
        ensure!(
            dict.len() <= MAX_DICT_SIZE,
            "dictionary is {} bytes, beyond the u32 entry offset limit of {} bytes",
            dict.len(),
            MAX_DICT_SIZE
        );

        let table_size = params.min_table_size();
        let table = AnyRegion::create(kind, backing, table_size as usize * SLOT_SIZE)?;

        Ok(Self {
            dict,
            table,
            table_size,
            params,
        })
    }

    /// Opens an existing index file read-only with the mmap backend.
    ///
    /// The slot count is derived from the file's byte length, which must be
    /// `SLOT_SIZE` times a power of two.
    pub fn open<P: AsRef<Path>>(dict: Arc<Dictionary>, path: P) -> Result<Self> {
        Self::open_with(RegionKind::Mmap, dict, path)
    }

    /// Opens an existing index file read-only with an explicit backend.
    pub fn open_with<P: AsRef<Path>>(
        kind: RegionKind,
        dict: Arc<Dictionary>,
        path: P,
    ) -> Result<Self> {
        ensure!(
            dict.len() <= MAX_DICT_SIZE,
            "dictionary is {} bytes, beyond the u32 entry offset limit of {} bytes",
            dict.len(),
            MAX_DICT_SIZE
        );

        let path = path.as_ref();
        let table = AnyRegion::open(kind, path)?;
        let len = table.len();

        ensure!(
            len % SLOT_SIZE == 0,
            "index file '{}' length {} is not a multiple of the slot size {}",
            path.display(),
            len,
            SLOT_SIZE
        );

        let slots = len / SLOT_SIZE;
        ensure!(
            slots > 0 && slots.is_power_of_two(),
            "index file '{}' holds {} slots, which is not a power of two",
            path.display(),
            slots
        );
        ensure!(
            slots <= u32::MAX as usize,
            "index file '{}' holds {} slots, beyond the addressable maximum",
            path.display(),
            slots
        );

        table.prefetch();

        Ok(Self {
            dict,
            table,
            table_size: slots as u32,
            params: IndexParams::default(),
        })
    }

    /// Creates a second index over the same dictionary, typically for a
    /// different key strategy. The dictionary mapping is shared, the table is
    /// fresh.
    pub fn share(&self, backing: &Backing) -> Result<Self> {
        Self::create(Arc::clone(&self.dict), backing, self.params)
    }

    /// The shared dictionary handle.
    pub fn dictionary(&self) -> &Arc<Dictionary> {
        &self.dict
    }

    /// Current table size in slots. Always a power of two.
    pub fn table_size(&self) -> u32 {
        self.table_size
    }

    pub fn params(&self) -> &IndexParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut IndexParams {
        &mut self.params
    }

    /// Persists the table to its backing file, if any.
    pub fn flush(&self) -> Result<()> {
        self.table.flush()
    }

    /// Raw table bytes; exact image of the index file.
    pub fn table_bytes(&self) -> &[u8] {
        self.table.as_slice()
    }

    pub(crate) fn slots(&self) -> Result<&[Slot]> {
        let bytes = self.table.as_slice();
        <[Slot]>::ref_from_bytes(bytes)
            .map_err(|_| eyre!("index table length {} is not a whole number of slots", bytes.len()))
    }

    pub(crate) fn slots_mut(&mut self) -> Result<&mut [Slot]> {
        let bytes = self.table.as_mut_slice()?;
        let len = bytes.len();
        <[Slot]>::mut_from_bytes(bytes)
            .map_err(|_| eyre!("index table length {} is not a whole number of slots", len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn params_reject_invalid_values() {
        let mut params = IndexParams::default();

        assert!(params.set_min_table_size(0).is_err());
        assert!(params.set_min_table_size(48).is_err());
        assert!(params.set_max_table_size(3).is_err());
        assert!(params.set_max_entry_size(0).is_err());
        assert!(params.set_max_chain(0).is_err());
        assert!(params.set_max_list(0).is_err());

        assert!(params.set_min_table_size(64).is_ok());
        assert!(params.set_max_table_size(32).is_err());
        assert!(params.set_max_table_size(64).is_ok());
    }

    #[test]
    fn create_sizes_table_to_minimum() {
        let dict = Dictionary::from_bytes(b"a b\n".to_vec());
        let mut params = IndexParams::default();
        params.set_min_table_size(16).unwrap();

        let index = Index::create(dict, &Backing::Anon, params).unwrap();

        assert_eq!(index.table_size(), 16);
        assert_eq!(index.table_bytes().len(), 16 * SLOT_SIZE);
        assert!(index.table_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn open_rejects_non_power_of_two_slot_count() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.idx");
        std::fs::write(&path, vec![0u8; 3 * SLOT_SIZE]).unwrap();

        let dict = Dictionary::from_bytes(b"a b\n".to_vec());
        let result = Index::open(dict, &path);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a power of two"));
    }

    #[test]
    fn open_rejects_ragged_file_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.idx");
        std::fs::write(&path, vec![0u8; SLOT_SIZE + 3]).unwrap();

        let dict = Dictionary::from_bytes(b"a b\n".to_vec());
        let result = Index::open(dict, &path);

        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("not a multiple of the slot size"));
    }

    #[test]
    fn open_rejects_dictionary_past_offset_width() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("huge.dict");
        // Sparse: occupies no disk space, but maps at its nominal length.
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(u32::MAX as u64 + 2).unwrap();

        let result = Dictionary::open(&path);

        assert!(result
            .unwrap_err()
            .to_string()
            .contains("entry offset limit"));
    }

    #[test]
    fn shared_index_reads_the_same_dictionary_bytes() {
        let dict = Dictionary::from_bytes(b"a b\n".to_vec());
        let first = Index::create(dict, &Backing::Anon, IndexParams::default()).unwrap();

        let second = first.share(&Backing::Anon).unwrap();

        assert_eq!(
            first.dictionary().bytes().as_ptr(),
            second.dictionary().bytes().as_ptr()
        );
    }

    #[test]
    fn opened_index_is_read_only() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ro.idx");
        std::fs::write(&path, vec![0u8; 4 * SLOT_SIZE]).unwrap();

        let dict = Dictionary::from_bytes(b"a b\n".to_vec());
        let mut index = Index::open(dict, &path).unwrap();

        assert_eq!(index.table_size(), 4);
        assert!(index.slots_mut().is_err());
    }
}
