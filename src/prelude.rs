//! # dotsplice Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the dotsplice library. Import this module to get quick access to the essential
//! types for loading, patching, and writing module images.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all dotsplice operations
pub use crate::Error;

/// The result type used throughout dotsplice
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Main entry point for patching module images
pub use crate::{PatchOptions, PatchSummary, Patcher, RunState, RunStatus};

/// Low-level file parsing utilities
pub use crate::{File, Parser};

// ================================================================================================
// Metadata System - Core Types
// ================================================================================================

/// The loaded image model and its external method references
pub use crate::metadata::{MethodRef, Module};

/// Fully-qualified type name lookup
pub use crate::metadata::SymbolTable;

/// Row reference type linking call sites to method rows
pub use crate::metadata::token::Token;

/// Fluent builders for authoring images in memory
pub use crate::metadata::{MethodBuilder, ModuleBuilder, TypeBuilder};

/// Module version identifier type and literal macro
pub use crate::metadata::{guid, Guid};

// ================================================================================================
// Model Rows and Flags
// ================================================================================================

/// Type rows, nesting, and their flags
pub use crate::metadata::types::{TypeAttributes, TypeDef, TypeIndex, VOID_TYPE};

/// Method rows, parameters, and their flags
pub use crate::metadata::method::{MethodAttributes, MethodDef, ParamAttributes, ParamDef};

/// Custom attributes and their typed arguments
pub use crate::metadata::attributes::{AttrArgument, CustomAttribute, ARGUMENT_TYPE};

// ================================================================================================
// Instructions
// ================================================================================================

/// Method body decoding and encoding
pub use crate::cil::{decode_body, encode_body, Instruction, Opcode, Operand, OperandKind};

// ================================================================================================
// Patch Pipeline
// ================================================================================================

/// Hook declarations and their recognized kinds
pub use crate::patch::{HookDeclaration, HookKind, HookPayload, HookSet};

/// Target resolution outcomes
pub use crate::patch::{Resolution, ResolvedTarget};

/// Injection shape planning
pub use crate::patch::{InjectionPlan, ParameterPassing, Placement};

/// Splice and synthesis outcomes
pub use crate::patch::{SpliceOutcome, SynthesisOutcome};

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Per-run diagnostic collection and classification
pub use crate::{Diagnostic, DiagnosticCategory, DiagnosticSeverity, Diagnostics};
