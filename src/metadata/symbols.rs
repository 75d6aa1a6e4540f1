//! Symbol table for fully-qualified type lookup.
//!
//! Built once per loaded module, [`SymbolTable`] maps every fully-qualified
//! type name (nested names included) to its [`TypeIndex`] in the arena.
//! Target resolution is entirely name-driven, so this table is the bridge
//! from the dotted names hook declarations carry to the actual type rows.

use std::collections::HashMap;

use crate::metadata::module::Module;
use crate::metadata::types::TypeIndex;

/// Fully-qualified type name index over a module.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    types: HashMap<String, TypeIndex>,
}

impl SymbolTable {
    /// Builds the table by walking every type in the module, nested types
    /// included.
    ///
    /// # Panics
    /// Panics if two types share a fully-qualified name. The format reader and
    /// the module builder both reject duplicates, so this only fires for
    /// models mutated by hand into an inconsistent state.
    #[must_use]
    pub fn new(module: &Module) -> Self {
        let mut types = HashMap::with_capacity(module.types().len());
        for index in 0..module.types().len() {
            let fullname = module.type_fullname(TypeIndex(index));
            let previous = types.insert(fullname, TypeIndex(index));
            assert!(
                previous.is_none(),
                "module contains duplicate fully-qualified type names"
            );
        }
        SymbolTable { types }
    }

    /// Looks up a type by its fully-qualified name.
    #[must_use]
    pub fn type_index(&self, fullname: &str) -> Option<TypeIndex> {
        self.types.get(fullname).copied()
    }

    /// Number of types in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if the module declared no types.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over all known fully-qualified names and their indices.
    pub fn iter(&self) -> impl Iterator<Item = (&str, TypeIndex)> {
        self.types.iter().map(|(name, index)| (name.as_str(), *index))
    }
}
