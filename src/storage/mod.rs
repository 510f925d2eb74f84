//! # Storage Module
//!
//! This module provides the mapped-region abstraction both the dictionary file
//! and the hash-table file sit on. The rest of the engine depends only on the
//! contract defined here, never on which backend is underneath:
//!
//! - `create(backing, size)`: a zero-filled, read/write region of exactly
//!   `size` bytes; [`Backing::Anon`] requests an in-memory-only region.
//! - `open(path)`: maps an existing file read-only and reports its size.
//! - `resize(new_size)`: grows or shrinks a mutable region, preserving prior
//!   content up to `min(old, new)`; on failure the original region stays valid.
//! - `flush()`: persists a file-backed mutable region; a no-op for anonymous
//!   regions.
//! - unmap: release happens on `Drop`, exactly once by construction.
//!
//! ## Backends
//!
//! Two interchangeable backends implement byte-identical semantics:
//!
//! | Backend      | Mechanism                       | Flush cost          |
//! |--------------|---------------------------------|---------------------|
//! | `MmapRegion` | virtual-memory mapping (memmap2)| `msync` (no-op-ish) |
//! | `HeapRegion` | heap buffer + buffered file I/O | full file rewrite   |
//!
//! `MmapRegion` is preferred wherever the platform supports it; `HeapRegion`
//! exists so the engine runs unchanged where mapping a file is unavailable or
//! undesirable, and doubles as a convenient harness for tests that want a
//! dictionary built from literal bytes.
//!
//! ## Safety Model
//!
//! A remapped region invalidates every slice previously handed out. Rather
//! than runtime guards, the borrow checker enforces this at compile time:
//! `as_slice(&self)` borrows the region immutably while `resize(&mut self)`
//! needs it exclusively, so no slice can survive a resize.
//!
//! ## Backend Selection
//!
//! The backend is a tagged enum ([`AnyRegion`]) fixed at construction time via
//! [`RegionKind`]; there is no dynamic dispatch on the read path.

mod heap;
mod mmap;

pub use heap::HeapRegion;
pub use mmap::MmapRegion;

use std::path::{Path, PathBuf};

use eyre::Result;

/// Where a mutable region keeps its bytes: a concrete file, or nowhere but
/// memory. An explicit variant, not an optional path with implicit meaning.
#[derive(Debug, Clone)]
pub enum Backing {
    /// Region backed by a file at this path; `flush` persists to it.
    File(PathBuf),
    /// Anonymous in-memory region; `flush` is a no-op and the contents are
    /// lost on drop.
    Anon,
}

impl Backing {
    /// Creates a file backing from anything path-like.
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Backing::File(path.into())
    }
}

/// Configuration for region backend selection, fixed per region at
/// construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// True virtual-memory mapping. Preferred where available.
    Mmap,
    /// Portable emulation: heap buffer plus ordinary buffered reads/writes.
    Heap,
}

/// Type-erased region backend.
///
/// The enum form keeps the backend choice a plain match instead of threading
/// generics through the index, build, and query layers.
#[derive(Debug)]
pub enum AnyRegion {
    Mmap(MmapRegion),
    Heap(HeapRegion),
}

impl AnyRegion {
    /// Allocates a zero-filled read/write region of exactly `size` bytes.
    pub fn create(kind: RegionKind, backing: &Backing, size: usize) -> Result<Self> {
        match kind {
            RegionKind::Mmap => Ok(AnyRegion::Mmap(MmapRegion::create(backing, size)?)),
            RegionKind::Heap => Ok(AnyRegion::Heap(HeapRegion::create(backing, size)?)),
        }
    }

    /// Maps an existing file read-only.
    pub fn open<P: AsRef<Path>>(kind: RegionKind, path: P) -> Result<Self> {
        match kind {
            RegionKind::Mmap => Ok(AnyRegion::Mmap(MmapRegion::open(path)?)),
            RegionKind::Heap => Ok(AnyRegion::Heap(HeapRegion::open(path)?)),
        }
    }

    /// Wraps owned bytes as a read-only anonymous region.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        AnyRegion::Heap(HeapRegion::from_vec(bytes))
    }

    /// Region length in bytes. Constant until the next `resize`.
    pub fn len(&self) -> usize {
        match self {
            AnyRegion::Mmap(r) => r.len(),
            AnyRegion::Heap(r) => r.len(),
        }
    }

    /// Returns true for a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The full region contents.
    pub fn as_slice(&self) -> &[u8] {
        match self {
            AnyRegion::Mmap(r) => r.as_slice(),
            AnyRegion::Heap(r) => r.as_slice(),
        }
    }

    /// The full region contents, mutably. Fails for read-only regions.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        match self {
            AnyRegion::Mmap(r) => r.as_mut_slice(),
            AnyRegion::Heap(r) => r.as_mut_slice(),
        }
    }

    /// Grows or shrinks a mutable region to `new_size` bytes, preserving
    /// content up to `min(old, new)` and zero-filling any growth.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        match self {
            AnyRegion::Mmap(r) => r.resize(new_size),
            AnyRegion::Heap(r) => r.resize(new_size),
        }
    }

    /// Persists in-memory changes for file-backed mutable regions.
    pub fn flush(&self) -> Result<()> {
        match self {
            AnyRegion::Mmap(r) => r.flush(),
            AnyRegion::Heap(r) => r.flush(),
        }
    }

    /// Hints to the OS that the whole region will be read soon. Best effort,
    /// mmap backend only.
    pub fn prefetch(&self) {
        if let AnyRegion::Mmap(r) = self {
            r.prefetch();
        }
    }
}
