//! Method definitions, parameters, and attribute flags.
//!
//! A [`MethodDef`] carries everything the patcher needs to reason about one
//! method: its name, flags, return type, parameters, custom attributes, and
//! the raw bytes of its body. Bodies stay opaque at this layer; the CIL
//! decoder materializes instructions only for methods that actually receive
//! an injection.
//!
//! # Key Types
//! - [`MethodDef`] - A method row with parameters, attributes, and body bytes
//! - [`ParamDef`] - A single parameter with its passing-mode flags
//! - [`MethodAttributes`] / [`ParamAttributes`] - Row flag sets

use bitflags::bitflags;

use crate::metadata::attributes::CustomAttribute;
use crate::metadata::types::VOID_TYPE;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method attribute flags carried in a method row
    pub struct MethodAttributes: u32 {
        /// Method is externally visible
        const PUBLIC = 0x0001;
        /// Method has no instance receiver
        const STATIC = 0x0002;
        /// Method participates in virtual dispatch
        const VIRTUAL = 0x0004;
        /// Method has no body of its own
        const ABSTRACT = 0x0008;
    }
}

impl MethodAttributes {
    /// Extract method attributes from a raw flags value, ignoring unknown bits
    #[must_use]
    pub fn from_raw(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Parameter passing-mode flags
    pub struct ParamAttributes: u8 {
        /// Parameter is passed by reference and read by the callee
        const INPUT_REFERENCE = 0x01;
        /// Parameter is passed by reference and written by the callee
        const OUTPUT_REFERENCE = 0x02;
    }
}

impl ParamAttributes {
    /// Extract parameter attributes from a raw flags value, ignoring unknown bits
    #[must_use]
    pub fn from_raw(flags: u8) -> Self {
        Self::from_bits_truncate(flags)
    }
}

/// A single method parameter.
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Fully-qualified type name of the parameter
    pub type_name: String,
    /// Passing-mode flags
    pub flags: ParamAttributes,
}

impl ParamDef {
    /// Creates a by-value parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ParamDef {
            name: name.into(),
            type_name: type_name.into(),
            flags: ParamAttributes::empty(),
        }
    }

    /// Creates a by-reference input parameter.
    #[must_use]
    pub fn by_ref(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        ParamDef {
            name: name.into(),
            type_name: type_name.into(),
            flags: ParamAttributes::INPUT_REFERENCE,
        }
    }

    /// Returns true if the parameter is an input reference.
    #[must_use]
    pub fn is_input_reference(&self) -> bool {
        self.flags.contains(ParamAttributes::INPUT_REFERENCE)
    }
}

/// A method definition within a type.
///
/// The body is kept as raw encoded bytes until an injection targets the method.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Method name
    pub name: String,
    /// Attribute flags
    pub flags: MethodAttributes,
    /// Fully-qualified return type name, [`VOID_TYPE`] for no return value
    pub return_type: String,
    /// Declared parameters, in signature order
    pub params: Vec<ParamDef>,
    /// Custom attributes applied to this method
    pub attributes: Vec<CustomAttribute>,
    /// Raw encoded body bytes; empty for bodyless methods
    pub body: Vec<u8>,
}

impl MethodDef {
    /// Creates a method definition with no parameters, attributes, or body.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        flags: MethodAttributes,
        return_type: impl Into<String>,
    ) -> Self {
        MethodDef {
            name: name.into(),
            flags,
            return_type: return_type.into(),
            params: Vec::new(),
            attributes: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Returns true if this method is externally visible.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.contains(MethodAttributes::PUBLIC)
    }

    /// Returns true if this method has no instance receiver.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.flags.contains(MethodAttributes::STATIC)
    }

    /// Returns true if this method returns no value.
    #[must_use]
    pub fn is_void_return(&self) -> bool {
        self.return_type == VOID_TYPE
    }

    /// Returns true if any parameter is passed as an input reference.
    #[must_use]
    pub fn has_input_reference_param(&self) -> bool {
        self.params.iter().any(ParamDef::is_input_reference)
    }
}
