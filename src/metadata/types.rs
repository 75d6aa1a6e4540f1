//! Type definitions and attribute flags for module image types.
//!
//! This module defines the in-memory representation of a type row: its namespace,
//! name, attribute flags, optional enclosing type, and the methods it declares.
//! Fully-qualified naming follows the image format rules: namespace and name join
//! with `.`, nested types join onto their enclosing type with `/`.
//!
//! # Key Types
//! - [`TypeDef`] - A type definition with its declared methods
//! - [`TypeAttributes`] - Attribute flags (visibility, sealed, ...)
//! - [`TypeIndex`] - Position of a type within the module's type arena

use std::fmt;

use bitflags::bitflags;

use crate::metadata::method::MethodDef;

/// The fully-qualified name of the "no value" return type.
pub const VOID_TYPE: &str = "System.Void";

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Type attribute flags carried in a type row
    pub struct TypeAttributes: u32 {
        /// Type is externally visible
        const PUBLIC = 0x0001;
        /// Type cannot be derived from; new methods added to it are static
        const SEALED = 0x0002;
        /// Type cannot be instantiated directly
        const ABSTRACT = 0x0004;
        /// Type is an interface
        const INTERFACE = 0x0008;
    }
}

impl TypeAttributes {
    /// Extract type attributes from a raw flags value, ignoring unknown bits
    #[must_use]
    pub fn from_raw(flags: u32) -> Self {
        Self::from_bits_truncate(flags)
    }
}

/// Position of a type within a module's type arena.
///
/// Indices are stable for the lifetime of a patch run: injection appends methods
/// and mutates bodies but never removes or reorders types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeIndex(pub usize);

impl fmt::Display for TypeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type#{}", self.0)
    }
}

/// A type definition within a module image.
///
/// Owns the methods it declares. Nesting is represented by reference: a nested
/// type carries the [`TypeIndex`] of its enclosing type, and the module computes
/// fully-qualified names by walking that chain.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Namespace the type lives in; empty for the global namespace
    pub namespace: String,
    /// Simple name of the type
    pub name: String,
    /// Attribute flags
    pub flags: TypeAttributes,
    /// Enclosing type for nested types, `None` for top-level types
    pub enclosing: Option<TypeIndex>,
    /// Methods declared by this type, in declaration order
    pub methods: Vec<MethodDef>,
}

impl TypeDef {
    /// Creates a new top-level type definition.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, flags: TypeAttributes) -> Self {
        TypeDef {
            namespace: namespace.into(),
            name: name.into(),
            flags,
            enclosing: None,
            methods: Vec::new(),
        }
    }

    /// The type's own name segment: `Namespace.Name`, or just `Name` when the
    /// namespace is empty. Nested types contribute only their simple name to
    /// the fully-qualified form; their namespace field is empty by convention.
    #[must_use]
    pub fn local_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns true if this type is externally visible.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.flags.contains(TypeAttributes::PUBLIC)
    }

    /// Returns true if this type is sealed.
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.flags.contains(TypeAttributes::SEALED)
    }

    /// Returns true if this type is nested within another type.
    #[must_use]
    pub fn is_nested(&self) -> bool {
        self.enclosing.is_some()
    }

    /// Looks up a declared method by name, returning the first match in
    /// declaration order.
    #[must_use]
    pub fn method_by_name(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Returns every declared method sharing `name`, in declaration order.
    #[must_use]
    pub fn methods_by_name(&self, name: &str) -> Vec<&MethodDef> {
        self.methods.iter().filter(|m| m.name == name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::method::MethodAttributes;

    #[test]
    fn test_local_name() {
        let plain = TypeDef::new("", "Program", TypeAttributes::PUBLIC);
        assert_eq!(plain.local_name(), "Program");

        let namespaced = TypeDef::new("Game.World", "Player", TypeAttributes::PUBLIC);
        assert_eq!(namespaced.local_name(), "Game.World.Player");
    }

    #[test]
    fn test_flag_queries() {
        let sealed = TypeDef::new(
            "Game",
            "Registry",
            TypeAttributes::PUBLIC | TypeAttributes::SEALED,
        );
        assert!(sealed.is_public());
        assert!(sealed.is_sealed());
        assert!(!sealed.is_nested());

        let hidden = TypeDef::new("Game", "Internals", TypeAttributes::empty());
        assert!(!hidden.is_public());
    }

    #[test]
    fn test_from_raw_ignores_unknown_bits() {
        let flags = TypeAttributes::from_raw(0xFFFF_0001);
        assert!(flags.contains(TypeAttributes::PUBLIC));
        assert!(!flags.contains(TypeAttributes::SEALED));
    }

    #[test]
    fn test_method_lookup() {
        let mut ty = TypeDef::new("Game", "Player", TypeAttributes::PUBLIC);
        ty.methods.push(MethodDef::new(
            "Damage",
            MethodAttributes::PUBLIC,
            VOID_TYPE,
        ));
        ty.methods.push(MethodDef::new(
            "Damage",
            MethodAttributes::PUBLIC | MethodAttributes::STATIC,
            VOID_TYPE,
        ));
        ty.methods.push(MethodDef::new(
            "Heal",
            MethodAttributes::PUBLIC,
            VOID_TYPE,
        ));

        assert!(ty.method_by_name("Damage").is_some());
        assert_eq!(ty.methods_by_name("Damage").len(), 2);
        assert_eq!(ty.methods_by_name("Heal").len(), 1);
        assert!(ty.methods_by_name("Jump").is_empty());
    }
}
