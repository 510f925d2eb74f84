//! # Heap-Buffer Region Backend
//!
//! This module implements `HeapRegion`, the portable emulation of the storage
//! contract. Where `MmapRegion` maps a file into the address space,
//! `HeapRegion` keeps the whole region in an ordinary heap buffer and moves
//! bytes with buffered file I/O:
//!
//! - `create` allocates a zeroed `Vec<u8>` and, for file backings, reserves
//!   the file at its final length up front
//! - `open` reads the entire file into the buffer
//! - `resize` is a plain `Vec::resize`
//! - `flush` rewrites the whole backing file from the buffer
//!
//! The full-rewrite flush is the price of portability; the engine only
//! flushes once per successful build, so it never sits on a hot path.
//!
//! Because the buffer is owned memory, `HeapRegion` also serves as the
//! read-only wrapper for dictionaries built from literal bytes in tests and
//! for sharing pre-loaded dictionary content.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use eyre::{bail, ensure, Result, WrapErr};

use super::Backing;

/// Mapped-region emulation over a heap buffer.
#[derive(Debug)]
pub struct HeapRegion {
    buf: Vec<u8>,
    path: Option<PathBuf>,
    read_only: bool,
}

impl HeapRegion {
    /// Allocates a zero-filled read/write buffer of exactly `size` bytes.
    pub fn create(backing: &Backing, size: usize) -> Result<Self> {
        ensure!(size > 0, "region size must be at least 1 byte");

        let path = match backing {
            Backing::File(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .wrap_err_with(|| {
                        format!("failed to create region file '{}'", path.display())
                    })?;

                file.set_len(size as u64)
                    .wrap_err_with(|| format!("failed to set file size to {} bytes", size))?;

                Some(path.clone())
            }
            Backing::Anon => None,
        };

        Ok(Self {
            buf: vec![0u8; size],
            path,
            read_only: false,
        })
    }

    /// Reads an existing file fully into a read-only buffer.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let buf = fs::read(path)
            .wrap_err_with(|| format!("failed to read region file '{}'", path.display()))?;

        ensure!(
            !buf.is_empty(),
            "cannot map empty region file '{}'",
            path.display()
        );

        Ok(Self {
            buf,
            path: Some(path.to_path_buf()),
            read_only: true,
        })
    }

    /// Wraps owned bytes as a read-only region with no backing file.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        Self {
            buf: bytes,
            path: None,
            read_only: true,
        }
    }

    /// Region length in bytes.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true for a zero-length region.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The full region contents.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    /// The full region contents, mutably. Fails for read-only regions.
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        if self.read_only {
            bail!("read-only region cannot be written");
        }
        Ok(&mut self.buf)
    }

    /// Grows or shrinks the buffer to `new_size` bytes, zero-filling growth.
    ///
    /// The backing file, if any, is only brought up to date on the next
    /// `flush`.
    pub fn resize(&mut self, new_size: usize) -> Result<()> {
        ensure!(new_size > 0, "region size must be at least 1 byte");

        if self.read_only {
            bail!("read-only region cannot be resized");
        }

        self.buf.resize(new_size, 0);
        Ok(())
    }

    /// Rewrites the whole backing file from the buffer. A no-op for
    /// anonymous and read-only regions.
    pub fn flush(&self) -> Result<()> {
        if self.read_only {
            return Ok(());
        }

        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = File::create(path)
            .wrap_err_with(|| format!("failed to rewrite region file '{}'", path.display()))?;

        let mut writer = BufWriter::new(file);
        writer
            .write_all(&self.buf)
            .wrap_err_with(|| format!("failed to write region file '{}'", path.display()))?;

        writer
            .into_inner()
            .wrap_err("failed to drain region file writer")?
            .sync_all()
            .wrap_err_with(|| format!("failed to sync region file '{}'", path.display()))?;

        Ok(())
    }
}
