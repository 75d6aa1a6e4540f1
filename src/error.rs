use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// This enum covers the run-aborting failure modes of the patch pipeline: image parsing,
/// serialization, and registry validation. Conditions scoped to a single hook declaration
/// (unresolvable targets, skipped injections) are not represented here - those are reported
/// through [`crate::Diagnostics`] and summarized per run, so one bad declaration never
/// aborts the remaining ones.
///
/// # Error Categories
///
/// ## Image Parsing Errors
/// - [`Error::Malformed`] - Corrupted or invalid image structure
/// - [`Error::OutOfBounds`] - Attempted to read beyond image boundaries
/// - [`Error::NotSupported`] - Unsupported image format or version
/// - [`Error::Empty`] - Empty input provided
///
/// ## Validation Errors
/// - [`Error::HookVisibility`] - Hook declaring types that are not externally visible
///
/// ## I/O Errors
/// - [`Error::FileError`] - Filesystem I/O errors during image read/write
///
/// # Examples
///
/// ```rust
/// use dotsplice::{Error, metadata::Module};
/// use std::path::Path;
///
/// match Module::from_file(Path::new("image.dspl")) {
///     Ok(module) => {
///         println!("Loaded module '{}'", module.name());
///     }
///     Err(Error::NotSupported) => {
///         eprintln!("Image format is not supported");
///     }
///     Err(Error::Malformed { message, file, line }) => {
///         eprintln!("Malformed image: {} ({}:{})", message, file, line);
///     }
///     Err(Error::FileError(io_err)) => {
///         eprintln!("I/O error: {}", io_err);
///     }
///     Err(e) => {
///         eprintln!("Other error: {}", e);
///     }
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The image is damaged and could not be parsed.
    ///
    /// This error indicates that the image structure is corrupted or doesn't
    /// conform to the expected module format. The error includes the source
    /// location where the malformation was detected for debugging purposes.
    ///
    /// # Fields
    ///
    /// * `message` - Detailed description of what was malformed
    /// * `file` - Source file where the error was detected
    /// * `line` - Source line where the error was detected
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// An out of bound access was attempted while parsing the image.
    ///
    /// This error occurs when trying to read data beyond the end of the image
    /// or stream. It's a safety check to prevent buffer overruns during parsing.
    #[error("Out of Bound read would have occurred!")]
    OutOfBounds,

    /// This file type is not supported.
    ///
    /// Indicates that the input is not a supported module image, either because
    /// the magic value is wrong or the format version is newer than this
    /// library understands.
    #[error("This file type is not supported")]
    NotSupported,

    /// Provided input was empty.
    ///
    /// This error occurs when an empty file or buffer is provided where
    /// actual module image data was expected.
    #[error("Provided input was empty")]
    Empty,

    /// One or more hook declaring types are not externally visible.
    ///
    /// Every type that declares hook methods must be public so the target
    /// module can call back into it after injection. This error aborts the
    /// whole registry build and carries the formatted list of every offending
    /// type, so all of them can be fixed in one pass.
    #[error("Hook types must be public:\n{0}")]
    HookVisibility(String),

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur during image read or
    /// write-back, such as permission issues or filesystem errors.
    #[error("{0}")]
    FileError(#[from] std::io::Error),

    /// Generic error for miscellaneous failures.
    ///
    /// Used for errors that don't fit into other categories or for
    /// wrapping external failures with additional context.
    #[error("{0}")]
    Error(String),
}
