//! Custom attributes and their typed argument values.
//!
//! Attributes in the image format carry a fully-qualified attribute type name
//! and a list of tagged constructor arguments. Only the argument kinds the
//! patcher consumes are modeled: booleans, 32-bit integers, and strings.
//!
//! # Key Types
//! - [`CustomAttribute`] - An attribute application with its arguments
//! - [`AttrArgument`] - A single typed argument value
//! - [`ARGUMENT_TYPE`] - On-disk tag constants for argument values

/// On-disk tag constants for custom attribute argument values
#[allow(non_snake_case, missing_docs)]
pub mod ARGUMENT_TYPE {
    pub const BOOLEAN: u8 = 0x02;
    pub const I4: u8 = 0x08;
    pub const STRING: u8 = 0x0E;
}

/// A typed custom attribute argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrArgument {
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer value
    I4(i32),
    /// String value
    Str(String),
}

impl AttrArgument {
    /// The on-disk tag for this argument's kind.
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            AttrArgument::Bool(_) => ARGUMENT_TYPE::BOOLEAN,
            AttrArgument::I4(_) => ARGUMENT_TYPE::I4,
            AttrArgument::Str(_) => ARGUMENT_TYPE::STRING,
        }
    }

    /// The string payload, if this argument is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrArgument::Str(value) => Some(value),
            _ => None,
        }
    }

    /// The boolean payload, if this argument is a boolean.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrArgument::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer payload, if this argument is a 32-bit integer.
    #[must_use]
    pub fn as_i4(&self) -> Option<i32> {
        match self {
            AttrArgument::I4(value) => Some(*value),
            _ => None,
        }
    }
}

/// An attribute applied to a method.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomAttribute {
    /// Fully-qualified name of the attribute type
    pub attr_type: String,
    /// Constructor arguments, in declaration order
    pub args: Vec<AttrArgument>,
}

impl CustomAttribute {
    /// Creates an attribute application.
    #[must_use]
    pub fn new(attr_type: impl Into<String>, args: Vec<AttrArgument>) -> Self {
        CustomAttribute {
            attr_type: attr_type.into(),
            args,
        }
    }
}
