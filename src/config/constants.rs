//! # edictidx Configuration Constants
//!
//! This module centralizes all configuration constants, grouping interdependent
//! values together and documenting their relationships.
//!
//! ## Dependency Graph
//!
//! ```text
//! SLOT_SIZE (8 bytes)
//!       │
//!       └─> Index file size is always table_size * SLOT_SIZE, and table_size
//!           is recovered from the file size on open. A file whose size is not
//!           SLOT_SIZE times a power of two is rejected as corrupt.
//!
//! DEFAULT_MIN_TABLE_SIZE (4096 slots)
//!       │
//!       ├─> Must be a power of two (bucket = hash & (table_size - 1))
//!       │
//!       └─> Must be <= DEFAULT_MAX_TABLE_SIZE or the initial allocation
//!           is rejected before any key is inserted.
//!
//! DEFAULT_MAX_TABLE_SIZE (16M slots)
//!       │
//!       └─> Hard cap for the doubling retry loop. Reaching it turns a
//!           recoverable overflow into a hard build failure.
//!
//! FILL_LIMIT_NUM / FILL_LIMIT_DEN (15/16)
//!       │
//!       └─> A fill attempt aborts once entries >= table_size * 15/16. This
//!           guarantees at least one empty slot per 16, so every open-
//!           addressing probe terminates without a wraparound guard on the
//!           hot path.
//!
//! MAX_DICT_SIZE (u32::MAX bytes)
//!       │
//!       └─> Slots store entry offsets as u32. A dictionary longer than this
//!           would silently truncate offsets, so it is rejected when the
//!           dictionary is opened and again when an index is created or
//!           opened over it.
//! ```
//!
//! ## Critical Invariants
//!
//! These invariants are enforced by compile-time assertions below:
//!
//! 1. `DEFAULT_MIN_TABLE_SIZE` and `DEFAULT_MAX_TABLE_SIZE` are powers of two
//! 2. `DEFAULT_MIN_TABLE_SIZE <= DEFAULT_MAX_TABLE_SIZE`
//! 3. `FILL_LIMIT_NUM < FILL_LIMIT_DEN` (the table is never allowed to fill up)
//!
//! ## Usage
//!
//! Import constants from this module rather than defining them locally:
//!
//! ```ignore
//! use edictidx::config::{SLOT_SIZE, DEFAULT_MAX_LIST};
//! ```

/// Size in bytes of one hash-table slot: `{ checksum: u32, offset: u32 }`,
/// little-endian, no padding.
pub const SLOT_SIZE: usize = 8;

/// Initial table size in slots for a freshly created index.
pub const DEFAULT_MIN_TABLE_SIZE: u32 = 1 << 12;

/// Upper bound in slots for the doubling retry loop.
pub const DEFAULT_MAX_TABLE_SIZE: u32 = 1 << 24;

/// Longest dictionary entry (in bytes, excluding the newline) the parser
/// accepts before declaring the dictionary corrupt.
pub const DEFAULT_MAX_ENTRY_SIZE: usize = 8192;

/// Longest open-addressing probe chain tolerated during a fill attempt.
/// Exceeding it triggers a table doubling, not an error.
pub const DEFAULT_MAX_CHAIN: u32 = 63;

/// Maximum number of records stored for one checksum. Further records for the
/// same key are silently dropped, bounding result-set size for common keys.
pub const DEFAULT_MAX_LIST: u32 = 127;

/// Largest dictionary the slot format can address: entry offsets are stored
/// as `u32`, so bytes past this limit would be unreachable.
pub const MAX_DICT_SIZE: usize = u32::MAX as usize;

/// Numerator of the fill-ratio limit: a fill attempt aborts once
/// `entries >= table_size * FILL_LIMIT_NUM / FILL_LIMIT_DEN`.
pub const FILL_LIMIT_NUM: u64 = 15;

/// Denominator of the fill-ratio limit.
pub const FILL_LIMIT_DEN: u64 = 16;

const _: () = assert!(DEFAULT_MIN_TABLE_SIZE.is_power_of_two());
const _: () = assert!(DEFAULT_MAX_TABLE_SIZE.is_power_of_two());
const _: () = assert!(DEFAULT_MIN_TABLE_SIZE <= DEFAULT_MAX_TABLE_SIZE);
const _: () = assert!(FILL_LIMIT_NUM < FILL_LIMIT_DEN);
const _: () = assert!(DEFAULT_MAX_CHAIN >= 1);
const _: () = assert!(DEFAULT_MAX_LIST >= 1);
