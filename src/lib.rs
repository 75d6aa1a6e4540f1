// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]
#![allow(clippy::too_many_arguments)]
//#![deny(unsafe_code)]
// - 'file/physical.rs' uses mmap to map a file into memory

//! # dotsplice
//!
//! [![Crates.io](https://img.shields.io/crates/v/dotsplice.svg)](https://crates.io/crates/dotsplice)
//! [![Documentation](https://docs.rs/dotsplice/badge.svg)](https://docs.rs/dotsplice)
//! [![License](https://img.shields.io/badge/license-Apache--2.0-blue.svg)](https://github.com/BinFlip/dotsplice/blob/main/LICENSE)
//!
//! A static hook-injection engine for managed module images. Built in pure Rust,
//! `dotsplice` rewrites method bodies on disk - no runtime, no process attach - by
//! discovering hook declarations in one image and splicing calls to them into another.
//!
//! Hooks are ordinary methods marked with attributes. A `CallHook` attribute names a
//! dotted `Type.Method` target and gets its call spliced into that method's body, at
//! entry or before every return; a `NewMethod` attribute synthesizes a fresh forwarding
//! method on a target type. Overloaded targets are disambiguated structurally from the
//! hook's own signature, so declarations stay plain strings.
//!
//! ## Features
//!
//! - **📦 Efficient memory access** - Memory-mapped image loading with bounds-checked parsing
//! - **🔍 Attribute-driven discovery** - Hooks are declared where they are implemented, no manifest
//! - **🎯 Structural overload resolution** - Target overloads are matched against the hook's signature
//! - **⚙️ Body splicing** - Branch-safe instruction insertion at method entry or before every return
//! - **🛡️ Declaration-scoped failures** - One bad hook is skipped with a diagnostic, the rest proceed
//! - **🔧 Cross-platform** - Works anywhere Rust does; target images never execute
//!
//! ## Quick Start
//!
//! Add `dotsplice` to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! dotsplice = "0.1"
//! ```
//!
//! ### Using the Prelude
//!
//! For convenient access to the most commonly used types, import the prelude:
//!
//! ```rust,no_run
//! use dotsplice::prelude::*;
//!
//! let patcher = Patcher::new(PatchOptions {
//!     hook_image: "mods/hooks.dspl".into(),
//!     target_image: "game.dspl".into(),
//!     output: None,
//!     search_paths: vec!["mods".into()],
//! });
//! let summary = patcher.run()?;
//! println!("{} injected, {} skipped", summary.injected, summary.skipped);
//! # Ok::<(), dotsplice::Error>(())
//! ```
//!
//! ### Basic Usage
//!
//! ```rust,no_run
//! use dotsplice::metadata::Module;
//! use std::path::Path;
//!
//! // Load and inspect a module image
//! let module = Module::from_file(Path::new("game.dspl"))?;
//! println!("Module: {}", module.name());
//!
//! for type_def in module.types() {
//!     println!("{}.{}: {} methods", type_def.namespace, type_def.name, type_def.methods.len());
//! }
//! # Ok::<(), dotsplice::Error>(())
//! ```
//!
//! ## Architecture
//!
//! `dotsplice` is organized into several key modules:
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`metadata`] - Module image model, binary format, builders, and symbol lookup
//! - [`cil`] - Instruction decoding and branch-safe encoding for method bodies
//! - [`patch`] - The pipeline: registry, resolution, planning, execution, write-back
//! - [`diagnostics`] - Per-run diagnostic collection
//! - [`Error`] and [`Result`] - Error handling across the crate
//!
//! ### A run, phase by phase
//!
//! [`Patcher::run`](crate::Patcher::run) loads the hook image and the target image,
//! then moves through fixed phases: hook attributes are scanned and validated into a
//! registry, each dotted target name is resolved against the target's symbol table,
//! every resolved declaration is planned and executed, and the patched image is written
//! back only if something actually changed. Problems scoped to a single declaration
//! never abort the run; they are collected as [`Diagnostics`] and counted in the
//! returned [`PatchSummary`].
//!
//! ### Image format
//!
//! Images use a compact little-endian container (`DSPL`, format version 1) holding a
//! string heap, type and method tables with inline bodies, and the extern reference
//! list. [`metadata::Module`] round-trips this format byte-exactly: load, mutate,
//! write. The [`metadata::ModuleBuilder`] authors images from scratch, which is also
//! how the test suite constructs its fixtures.
//!
//! ## Error Handling
//!
//! All operations return [`Result<T, Error>`](Result) with detailed error information:
//!
//! ```rust,no_run
//! use dotsplice::{Error, metadata::Module};
//!
//! match Module::from_file(std::path::Path::new("game.dspl")) {
//!     Ok(module) => println!("Loaded '{}'", module.name()),
//!     Err(Error::NotSupported) => println!("Not a supported image"),
//!     Err(Error::Malformed { message, .. }) => println!("Malformed image: {}", message),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Performance
//!
//! Patching is dominated by image parsing and serialization; both are single-pass over
//! a memory-mapped buffer with pre-sized allocations. Resolution is a hash lookup per
//! declaration plus a linear scan over the target type's overloads. Benchmarks for
//! symbol table construction and resolution live under `benches/`.
//!
//! ## Testing
//!
//! The test suite builds every fixture in memory through [`metadata::ModuleBuilder`],
//! so no sample binaries are required:
//!
//! ```bash
//! cargo test
//! cargo bench   # criterion benchmarks
//! ```

#[macro_use]
pub(crate) mod error;

/// Convenient re-exports of the most commonly used types and traits.
///
/// This module provides a curated selection of the most frequently used types
/// from across the dotsplice library, allowing for convenient glob imports.
///
/// # Example
///
/// ```rust,no_run
/// use dotsplice::prelude::*;
///
/// let module = Module::from_file(std::path::Path::new("game.dspl"))?;
/// let symbols = SymbolTable::new(&module);
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub mod prelude;

/// Instruction decoding and encoding for method bodies.
///
/// This module provides the instruction layer the executor splices against.
/// It includes:
///
/// - **Instruction Decoding**: Parse encoded method bodies into instruction lists
/// - **Branch Resolution**: Byte offsets become instruction indices and back
/// - **Width Selection**: Short branch forms widen automatically when displacements grow
///
/// # Key Types
///
/// - [`cil::Instruction`] - A decoded instruction with its operand
/// - [`cil::Opcode`] - The supported operation set
/// - [`cil::Operand`] - Immediates, tokens, and branch targets
///
/// # Main Functions
///
/// - [`cil::decode_body`] - Decode an encoded body into instructions
/// - [`cil::encode_body`] - Encode instructions back into body bytes
///
/// # Examples
///
/// ```rust
/// use dotsplice::cil::{decode_body, Opcode};
///
/// let body = [0x00, 0x2A]; // nop, ret
/// let instructions = decode_body(&body)?;
/// assert_eq!(instructions[1].opcode, Opcode::Ret);
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub mod cil;

/// Per-run diagnostic collection for declaration-scoped problems.
///
/// Conditions that affect a single hook declaration - unresolvable targets,
/// ambiguous overloads, skipped injections - are reported here rather than
/// as errors, so one bad declaration never aborts the rest of a run.
///
/// # Key Types
///
/// - [`Diagnostics`] - Append-only collection shared across pipeline phases
/// - [`Diagnostic`] - A single report with severity, category, and detail
/// - [`DiagnosticSeverity`] / [`DiagnosticCategory`] - Classification axes
pub mod diagnostics;

/// Raw image access: disk and memory backends, bounds-checked parsing.
///
/// The [`File`] type owns the raw bytes of an image, memory-mapped when loaded
/// from disk. [`Parser`] provides cursor-based decoding over those bytes and
/// [`file::io`] the low-level little-endian reads and writes shared by the
/// image reader and writer.
pub mod file;

/// Module image model, binary format, builders, and symbol lookup.
///
/// This module implements the metadata layer the patcher operates on. It
/// provides loading, authoring, and serialization of module images along with
/// name-based type lookup.
///
/// # Key Components
///
/// ## Image Model
/// - [`metadata::Module`] - A loaded image: types, methods, extern references
/// - [`metadata::types`] - Type rows, nesting, and their attribute flags
/// - [`metadata::method`] - Method rows, parameters, bodies, and flags
/// - [`metadata::token`] - Row references linking call sites to method rows
///
/// ## Authoring and Lookup
/// - [`metadata::ModuleBuilder`] - Fluent in-memory image authoring
/// - [`metadata::SymbolTable`] - Fully-qualified type name index
/// - [`metadata::attributes`] - Custom attributes and their typed arguments
///
/// # Examples
///
/// ```rust
/// use dotsplice::metadata::{MethodBuilder, ModuleBuilder, SymbolTable, TypeBuilder};
///
/// let module = ModuleBuilder::new("game.dspl")
///     .type_def(
///         TypeBuilder::new("Game", "Player")
///             .public()
///             .method(MethodBuilder::new("Damage").public()),
///     )
///     .build()?;
///
/// let symbols = SymbolTable::new(&module);
/// assert!(symbols.type_index("Game.Player").is_some());
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub mod metadata;

/// The attribute-driven patch pipeline.
///
/// Everything between a pair of loaded images and a patched one lives here:
/// attribute scanning, hook validation, dotted-name resolution, injection
/// planning, splice execution, and write-back.
///
/// # Key Components
///
/// - [`Patcher`] - Drives a full run from configuration to write-back
/// - [`patch::registry`] - Recognition, visibility validation, argument screening
/// - [`patch::resolver`] - Dotted-name and structural overload resolution
/// - [`patch::planner`] - Injection shape derivation from signatures
/// - [`patch::executor`] - Body splicing and method synthesis
///
/// # Examples
///
/// ```rust,no_run
/// use dotsplice::{PatchOptions, Patcher};
///
/// let patcher = Patcher::new(PatchOptions {
///     hook_image: "mods/hooks.dspl".into(),
///     target_image: "game.dspl".into(),
///     output: Some("game.patched.dspl".into()),
///     search_paths: Vec::new(),
/// });
/// let summary = patcher.run()?;
/// println!("{:?}: {} injected", summary.status, summary.injected);
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub mod patch;

/// `dotsplice` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always
/// [`Error`]. This is used consistently throughout the crate for all fallible
/// operations.
///
/// # Examples
///
/// ```rust,no_run
/// use dotsplice::{metadata::Module, Result};
///
/// fn load_module(path: &str) -> Result<Module> {
///     Module::from_file(std::path::Path::new(path))
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `dotsplice` Error type
///
/// The main error type for all operations in this crate. Provides detailed error
/// information for image parsing, serialization, and hook validation.
///
/// # Examples
///
/// ```rust,no_run
/// use dotsplice::{Error, metadata::Module};
///
/// match Module::from_file(std::path::Path::new("game.dspl")) {
///     Ok(module) => println!("Loaded successfully"),
///     Err(Error::NotSupported) => println!("Image format not supported"),
///     Err(Error::Malformed { message, .. }) => println!("Malformed: {}", message),
///     Err(e) => println!("Error: {}", e),
/// }
/// ```
pub use error::Error;

/// Main entry point for patching module images.
///
/// See [`patch`] for the pipeline behind it and [`PatchOptions`] for configuration.
///
/// # Example
///
/// ```rust,no_run
/// use dotsplice::{PatchOptions, Patcher};
///
/// let patcher = Patcher::new(PatchOptions {
///     hook_image: "hooks.dspl".into(),
///     target_image: "game.dspl".into(),
///     output: None,
///     search_paths: Vec::new(),
/// });
/// let summary = patcher.run()?;
/// println!("reached {:?}", summary.state);
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub use patch::{PatchOptions, PatchSummary, Patcher, RunState, RunStatus};

/// Diagnostic collection and classification for declaration-scoped reporting.
///
/// Re-exported at the crate root because every phase of a run hands out or
/// consumes these types.
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};

/// The loaded image model, its name index, and the module identity type.
///
/// # Example
///
/// ```rust,no_run
/// use dotsplice::{Module, SymbolTable};
///
/// let module = Module::from_file(std::path::Path::new("game.dspl"))?;
/// let symbols = SymbolTable::new(&module);
/// println!("{} types", symbols.len());
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub use metadata::{Guid, Module, SymbolTable};

/// Provides access to low-level file and memory parsing utilities.
///
/// The [`Parser`] type is used for decoding method bodies and image structures.
///
/// # Example
///
/// ```rust
/// use dotsplice::Parser;
///
/// let data = [0x44, 0x53, 0x50, 0x4C];
/// let mut parser = Parser::new(&data);
/// assert_eq!(parser.read_le::<u32>()?, 0x4C50_5344);
/// # Ok::<(), dotsplice::Error>(())
/// ```
pub use file::{parser::Parser, File};
