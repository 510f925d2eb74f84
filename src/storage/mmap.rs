//! # Memory-Mapped Region Backend
//!
//! This module implements `MmapRegion`, the true virtual-memory backend of the
//! storage contract. Both the dictionary file (mapped read-only) and the
//! hash-table file (mapped read/write) go through it on platforms with mmap
//! support.
//!
//! ## Design Philosophy
//!
//! Copying a multi-megabyte dictionary through read() buffers just to scan it
//! once per build is wasted work. Mapping the file lets the parser and the
//! query engine walk `&[u8]` slices straight over the page cache, and lets the
//! builder write table slots in place.
//!
//! ## Safety Considerations
//!
//! A mapping becomes invalid when the region is remapped during `resize()`.
//! `MmapRegion` leverages the borrow checker instead of runtime guards:
//!
//! ```text
//! as_slice(&self) -> &[u8]              // Immutable borrow of self
//! as_mut_slice(&mut self) -> &mut [u8]  // Mutable borrow (exclusive)
//! resize(&mut self)                     // Mutable borrow (exclusive)
//! ```
//!
//! Since `resize()` takes `&mut self`, the compiler guarantees no slice into
//! the old mapping survives the remap.
//!
//! ## Error Handling
//!
//! All fallible operations return `eyre::Result` with the file path and the
//! operation being performed attached as context.

use std::fs::{File, OpenOptions};
use std::path::Path;

use eyre::{bail, ensure, Result, WrapErr};
use memmap2::{Mmap, MmapMut};

use super::Backing;

#[derive(Debug)]
enum Inner {
    /// Existing file mapped read-only.
    ReadOnly(Mmap),
    /// File-backed read/write mapping; `flush` delegates to msync.
    File { file: File, map: MmapMut },
    /// Anonymous read/write mapping with no backing file.
    Anon(MmapMut),
}

/// Mapped region backed by real virtual memory.
#[derive(Debug)]
pub struct MmapRegion {
    inner: Inner,
}

impl MmapRegion {
    /// Allocates a zero-filled read/write mapping of exactly `size` bytes.
    ///
    /// With [`Backing::File`] the file is created (or truncated) and extended
    /// to `size`; with [`Backing::Anon`] the mapping has no backing file.
    pub fn create(backing: &Backing, size: usize) -> Result<Self> {
        ensure!(size > 0, "region size must be at least 1 byte");

        let inner = match backing {
            Backing::File(path) => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .wrap_err_with(|| {
                        format!("failed to create region file '{}'", path.display())
                    })?;

                file.set_len(size as u64)
                    .wrap_err_with(|| format!("failed to set file size to {} bytes", size))?;

                // SAFETY: MmapMut::map_mut is unsafe because memory-mapped files
                // can be modified externally. This is safe because:
                // 1. We just created this file with truncate=true, so no other
                //    view of its old contents exists
                // 2. Index and dictionary files are not meant to be modified by
                //    external processes while mapped
                // 3. The mapping's lifetime is tied to MmapRegion, preventing
                //    use-after-unmap
                let map = unsafe {
                    MmapMut::map_mut(&file).wrap_err_with(|| {
                        format!("failed to memory-map '{}'", path.display())
                    })?
                };

                Inner::File { file, map }
            }
            Backing::Anon => {
                let map = MmapMut::map_anon(size)
                    .wrap_err_with(|| format!("failed to map {} anonymous bytes", size))?;
                Inner::Anon(map)
            }
        };

        Ok(Self { inner })
    }

    /// Maps an existing file read-only.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .wrap_err_with(|| format!("failed to open region file '{}'", path.display()))?;

        let file_size = file
            .metadata()
            .wrap_err_with(|| format!("failed to get metadata for '{}'", path.display()))?
            .len();

        ensure!(
            file_size > 0,
            "cannot map empty region file '{}'",
            path.display()
        );

        // SAFETY: Mmap::map is unsafe because the file could be modified
        // externally while mapped. This is safe because:
        // 1. The mapping is read-only; we never write through it
        // 2. Dictionary and index files are treated as immutable once written
        // 3. The mapping's lifetime is tied to MmapRegion, preventing
        //    use-after-unmap
        let map = unsafe {
            Mmap::map(&file)
                .wrap_err_with(|| format!("failed to memory-map '{}'", path.display()))?
        };

        Ok(Self {
            inner: Inner::ReadOnly(map),
        })
    }

    /// Region length in bytes.
    pub fn len(&self) -> usize {
        match &self.inner {
            Inner::ReadOnly(map) => map.len(),
            Inner::File { map, .. } => map.len(),
            Inner::Anon(map) => map.len(),
        }
    }

    /// Returns true for a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The full region contents.
    pub fn as_slice(&self) -> &[u8] {
        match &self.inner {
            Inner::ReadOnly(map) => &map[..],
            Inner::File { map, .. } => &map[..],
            Inner::Anon(map) => &map[..],
        }
    }

    /// The full region contents, mutably. Fails for read-only regions.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        match &mut self.inner {
            Inner::ReadOnly(_) => bail!("read-only region cannot be written"),
            Inner::File { map, .. } => Ok(&mut map[..]),
            Inner::Anon(map) => Ok(&mut map[..]),
        }
    }

    /// Grows or shrinks a mutable mapping to `new_size` bytes.
    ///
    /// Content is preserved up to `min(old, new)`; growth reads back as
    /// zeroes. On failure the original mapping remains valid.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        ensure!(new_size > 0, "region size must be at least 1 byte");

        match &mut self.inner {
            Inner::ReadOnly(_) => bail!("read-only region cannot be resized"),
            Inner::File { file, map } => {
                map.flush().wrap_err("failed to flush mapping before resize")?;

                let old_len = map.len();
                file.set_len(new_size as u64)
                    .wrap_err_with(|| format!("failed to resize file to {} bytes", new_size))?;

                // SAFETY: MmapMut::map_mut is unsafe because the old mapping
                // becomes invalid. This is safe because:
                // 1. resize() takes &mut self, so no slice into the old
                //    mapping can exist (borrow checker)
                // 2. The old mapping was flushed above, so no dirty bytes are
                //    lost
                // 3. The file length was adjusted before remapping
                // 4. The old mapping is dropped when the new one is assigned
                match unsafe { MmapMut::map_mut(&*file) } {
                    Ok(remapped) => *map = remapped,
                    Err(e) => {
                        // The old mapping stays in place, so the file must be
                        // restored to its length; after a shrink the mapping
                        // would otherwise extend past EOF and fault on access.
                        let _ = file.set_len(old_len as u64);
                        return Err(e).wrap_err("failed to remap file after resize");
                    }
                }
            }
            Inner::Anon(map) => {
                let mut grown = MmapMut::map_anon(new_size)
                    .wrap_err_with(|| format!("failed to map {} anonymous bytes", new_size))?;

                let keep = map.len().min(new_size);
                grown[..keep].copy_from_slice(&map[..keep]);
                *map = grown;
            }
        }

        Ok(())
    }

    /// Persists in-memory changes for file-backed mutable mappings; a no-op
    /// for read-only and anonymous regions.
    pub fn flush(&self) -> Result<()> {
        match &self.inner {
            Inner::File { map, .. } => map.flush().wrap_err("failed to sync mapping to disk"),
            Inner::ReadOnly(_) | Inner::Anon(_) => Ok(()),
        }
    }

    /// Hints to the OS that the whole region will be read soon.
    pub fn prefetch(&self) {
        #[cfg(unix)]
        {
            let slice = self.as_slice();
            if slice.is_empty() {
                return;
            }

            // SAFETY: madvise with MADV_WILLNEED is a hint and cannot corrupt
            // memory. This is safe because:
            // 1. The pointer and length come from a live mapping owned by self
            // 2. The range covers exactly the mapped region, never beyond it
            unsafe {
                libc::madvise(
                    slice.as_ptr() as *mut libc::c_void,
                    slice.len(),
                    libc::MADV_WILLNEED,
                );
            }
        }
    }
}
