//! Image file abstraction over disk and memory data sources.
//!
//! This module provides unified access to the raw bytes of a module image, whether it
//! comes from a file on disk or from a buffer that was produced in memory. It performs
//! no format interpretation itself; decoding the image structure is the job of
//! [`crate::metadata::reader`], which drives a [`crate::file::parser::Parser`] over the
//! bytes handed out here.
//!
//! # Key Components
//!
//! - [`crate::file::File`] - Main image abstraction owning a data source
//! - [`crate::file::Backend`] - Trait for different data sources; owned
//!   `Vec<u8>` buffers implement it directly
//! - [`crate::file::physical::Physical`] - Memory-mapped file backend for disk access
//! - [`crate::file::parser::Parser`] - Cursor-based parsing over the image bytes
//! - [`crate::file::io`] - Low-level bounds-checked reads and writes
//!
//! # Examples
//!
//! ```rust,no_run
//! use dotsplice::file::File;
//! use std::path::Path;
//!
//! // Load an image from disk (memory-mapped)
//! let file = File::from_file(Path::new("target.dspl"))?;
//! println!("Loaded image with {} bytes", file.len());
//!
//! // Or wrap bytes already in memory
//! let data = std::fs::read("target.dspl")?;
//! let file = File::from_mem(data)?;
//! # Ok::<(), dotsplice::Error>(())
//! ```

pub mod io;
pub mod parser;

mod physical;

use std::path::Path;

use crate::{
    Error::{Empty, OutOfBounds},
    Result,
};
use physical::Physical;

/// Backend trait for image data sources.
///
/// This trait abstracts over the source of image data. Implementors only
/// provide the raw bytes; bounds-checked slicing is derived from that, so a
/// memory-mapped file and an owned `Vec<u8>` behave identically. All
/// implementations must be thread-safe.
pub trait Backend: Send + Sync {
    /// Returns the entire data buffer.
    fn data(&self) -> &[u8];

    /// Returns a slice of the data at the given offset and length.
    ///
    /// # Arguments
    ///
    /// * `offset` - The starting offset within the data.
    /// * `len` - The length of the slice in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the requested range is out of
    /// bounds or the offset arithmetic overflows.
    fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        let end = offset.checked_add(len).ok_or(OutOfBounds)?;
        self.data().get(offset..end).ok_or(OutOfBounds)
    }

    /// Returns the total length of the data buffer.
    fn len(&self) -> usize {
        self.data().len()
    }
}

/// Owned byte buffers are a backend in their own right; this is the path
/// [`File::from_mem`] takes.
impl Backend for Vec<u8> {
    fn data(&self) -> &[u8] {
        self
    }
}

/// Represents a loaded module image file.
///
/// `File` owns the raw bytes of an image through a [`Backend`] and hands them to the
/// image reader for decoding. It rejects empty input early; all further validation
/// (magic, version, table structure) happens during decoding.
///
/// # Examples
///
/// ```rust
/// use dotsplice::file::File;
///
/// let file = File::from_mem(vec![0x44, 0x53, 0x50, 0x4C])?;
/// assert_eq!(file.len(), 4);
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub struct File {
    backend: Box<dyn Backend>,
}

impl File {
    /// Load an image from a file on disk using memory-mapped I/O.
    ///
    /// # Arguments
    /// * `path` - Path of the image to load
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened,
    /// [`crate::Error::Error`] if memory mapping fails, or [`crate::Error::Empty`]
    /// if the file contains no data.
    pub fn from_file(path: &Path) -> Result<File> {
        let backend = Physical::new(path)?;
        if backend.len() == 0 {
            return Err(Empty);
        }

        Ok(File {
            backend: Box::new(backend),
        })
    }

    /// Wrap a byte buffer that already lives in memory.
    ///
    /// # Arguments
    /// * `data` - The buffer to consume
    ///
    /// # Errors
    /// Returns [`crate::Error::Empty`] if the buffer contains no data.
    pub fn from_mem(data: Vec<u8>) -> Result<File> {
        if data.is_empty() {
            return Err(Empty);
        }

        Ok(File {
            backend: Box::new(data),
        })
    }

    /// Returns a slice of the image data at the given offset and length.
    ///
    /// # Arguments
    /// * `offset` - The starting offset within the data
    /// * `len` - The length of the slice in bytes
    ///
    /// # Errors
    /// Returns [`crate::Error::OutOfBounds`] if the requested range is out of bounds.
    pub fn data_slice(&self, offset: usize, len: usize) -> Result<&[u8]> {
        self.backend.data_slice(offset, len)
    }

    /// Returns the entire image data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        self.backend.data()
    }

    /// Returns the total length of the image data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    /// Returns `true` if the image contains no data.
    ///
    /// Construction rejects empty input, so this is always `false` for a loaded image.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.backend.len() == 0
    }
}
