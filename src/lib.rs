//! # edictidx - Mapped Hash-Table Index for Flat Dictionaries
//!
//! edictidx builds and queries an on-disk, memory-mapped hash-table index
//! over a flat-text dictionary in EDICT-like format (one entry per line). It
//! resolves an exact key string to the byte offsets of the matching entries
//! without scanning the dictionary, and can regenerate or verify the index at
//! any time.
//!
//! ## Quick Start
//!
//! ```ignore
//! use edictidx::{Backing, Dictionary, Index, IndexParams, KeyStrategy};
//!
//! let dict = Dictionary::open("edict.txt")?;
//! let mut index = Index::create(dict, &Backing::file("edict.hdw"), IndexParams::default())?;
//!
//! let stats = index.build(KeyStrategy::Headword)?;
//! println!("{} entries indexed", stats.entries);
//!
//! for entry in index.find("犬".as_bytes()).into_iter().flatten() {
//!     println!("{}", String::from_utf8_lossy(entry.bytes));
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │   Index (lifecycle, share, params)   │
//! ├────────────┬───────────┬────────────┤
//! │   Build    │   Query   │   Verify   │
//! ├────────────┴───────────┴────────────┤
//! │   Entry/Key Parser │ Key Strategies  │
//! ├─────────────────────────────────────┤
//! │   Hash Functions (bucket + checksum) │
//! ├─────────────────────────────────────┤
//! │   Region Storage (mmap / heap)       │
//! └─────────────────────────────────────┘
//! ```
//!
//! ## Index Format
//!
//! The index file is the raw memory image of a power-of-two array of 8-byte
//! slots `{ checksum: u32, offset: u32 }`, little-endian, no header. Open
//! addressing resolves bucket collisions; the per-slot checksum (a second,
//! independent hash of the key) disambiguates them cheaply.
//!
//! One physical index serves one key strategy. To search the same dictionary
//! by headword and by reading, build two indexes that share the dictionary
//! mapping via [`Index::share`].
//!
//! ## Concurrency
//!
//! Build and verify are exclusive single-writer passes. Queries over a built
//! index are read-only; any number of distinct [`Query`] iterators may run
//! concurrently.
//!
//! ## Module Overview
//!
//! - [`storage`]: mapped-region contract with mmap and heap backends
//! - [`hash`]: bucket hash and slot checksum
//! - [`keys`]: pluggable key-extraction strategies
//! - [`parser`]: sequential entry/key scanner
//! - [`index`]: lifecycle, build engine, query iterator, verifier
//! - [`config`]: centralized tuning constants

pub mod config;
pub mod hash;
pub mod index;
pub mod keys;
pub mod parser;
pub mod storage;

pub use index::{BuildStats, Dictionary, Entry, Index, IndexParams, Query, Slot, VerifyStats};
pub use keys::{KeyFn, KeyStrategy};
pub use storage::{AnyRegion, Backing, RegionKind};
