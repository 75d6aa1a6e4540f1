//! Physical file backend for memory-mapped I/O.
//!
//! This module provides the [`crate::file::physical::Physical`] backend that implements the
//! [`crate::file::Backend`] trait for accessing module images from disk using memory-mapped
//! I/O. Only the pages that are actually touched get loaded, and the operating system keeps
//! the mapping cached across runs that patch the same image.
//!
//! # Key Components
//!
//! - [`crate::file::physical::Physical`] - Main backend struct implementing [`crate::file::Backend`]
//! - [`crate::file::physical::Physical::new`] - Creates backend from an image path
//!
//! All access operations include bounds checking to ensure memory safety when the mapped
//! image turns out to be truncated.

use super::Backend;
use crate::{
    Error::{Error, FileError},
    Result,
};

use memmap2::Mmap;
use std::{fs, path::Path};

/// An image backend that uses memory-mapped I/O for efficient access to files on disk.
///
/// [`crate::file::physical::Physical`] maps the image directly into the process's virtual
/// address space instead of reading it into a buffer upfront. The mapping is read-only;
/// mutation happens on the decoded model and is persisted by the image writer, never
/// through this backend.
///
/// # Examples
///
/// ```rust,ignore
/// use dotsplice::file::{Physical, Backend};
/// use std::path::Path;
///
/// let physical = Physical::new(Path::new("target.dspl"))?;
/// println!("Image size: {} bytes", physical.len());
///
/// // Read the magic value
/// let magic = physical.data_slice(0, 4)?;
/// # Ok::<(), dotsplice::Error>(())
/// ```
#[derive(Debug)]
pub struct Physical {
    /// Memory-mapped image data
    data: Mmap,
}

impl Physical {
    /// Create a new physical backend by memory-mapping the specified image file.
    ///
    /// This method opens the file at the given path and creates a memory mapping
    /// for it. The file is mapped as read-only and shared, allowing multiple
    /// processes to efficiently access the same image.
    ///
    /// # Arguments
    /// * `path` - Path to the image on disk. Accepts `&Path`, `&str`, `String`, or `PathBuf`.
    ///
    /// # Errors
    /// Returns [`crate::Error::FileError`] if the file cannot be opened or
    /// [`crate::Error::Error`] if memory mapping fails.
    pub fn new(path: impl AsRef<Path>) -> Result<Physical> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(error) => return Err(FileError(error)),
        };

        let mmap = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => mmap,
            Err(error) => return Err(Error(error.to_string())),
        };

        Ok(Physical { data: mmap })
    }
}

impl Backend for Physical {
    fn data(&self) -> &[u8] {
        self.data.as_ref()
    }
}
