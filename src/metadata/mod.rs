//! Module image model, binary format, and symbol lookup.
//!
//! This module contains the metadata layer the patcher operates on: the
//! in-memory [`Module`] model, the binary image reader and writer, fluent
//! builders for authoring images, and the symbol table used for name-driven
//! target resolution.
//!
//! # Key Components
//!
//! - [`Module`] - Loaded image with types, methods, and external references
//! - [`ModuleBuilder`] - Fluent authoring of images in memory
//! - [`SymbolTable`] - Fully-qualified type name lookup
//! - [`token`] - Row references for method definitions and method refs
//! - [`attributes`] - Custom attributes and their typed arguments
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dotsplice::metadata::{Module, SymbolTable};
//!
//! let module = Module::from_file(Path::new("game.dspl"))?;
//! let symbols = SymbolTable::new(&module);
//!
//! if let Some(index) = symbols.type_index("Game.Player") {
//!     println!("Game.Player declares {} methods", module[index].methods.len());
//! }
//! # Ok::<(), dotsplice::Error>(())
//! ```

/// Implementation of custom attributes and their argument values
pub mod attributes;
/// Fluent builders for authoring module images
pub mod builder;
/// Implementation of method rows, parameters, and their flags
pub mod method;
/// Implementation of the loaded module model
pub mod module;
/// Binary format reader
pub(crate) mod reader;
/// Fully-qualified type name lookup
pub mod symbols;
/// Commonly used row reference type
pub mod token;
/// Implementation of type rows and their flags
pub mod types;
/// Binary format writer
pub(crate) mod writer;

pub use builder::{MethodBuilder, ModuleBuilder, TypeBuilder};
pub use module::{MethodRef, Module};
pub use symbols::SymbolTable;
pub use token::Token;
pub use uguid::{guid, Guid};

/// Magic value identifying a module image, `DSPL` read little-endian.
pub const IMAGE_MAGIC: u32 = 0x4C50_5344;

/// Highest format version this library reads and the version it writes.
pub const IMAGE_VERSION: u16 = 1;
