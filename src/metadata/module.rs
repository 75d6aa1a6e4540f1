//! In-memory representation of a loaded module image.
//!
//! [`Module`] is the central mutable model the patcher operates on: a flat
//! arena of [`TypeDef`] rows (nested types reference their enclosing type by
//! index), a table of external method references, and module-level identity
//! (name, mvid, referenced images). Loading goes through the format reader,
//! write-back through the format writer; in between, injection mutates method
//! bodies and appends synthesized methods and method references in place.
//!
//! # Key Components
//! - [`Module`] - The loaded image with lookup and mutation entry points
//! - [`MethodRef`] - A reference to a method owned by another image
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::path::Path;
//! use dotsplice::metadata::Module;
//!
//! let module = Module::from_file(Path::new("target.dspl"))?;
//! println!("loaded {} with {} types", module.name(), module.types().len());
//! # Ok::<(), dotsplice::Error>(())
//! ```

use std::ops::{Index, IndexMut};
use std::path::Path;

use uguid::Guid;

use crate::file::File;
use crate::metadata::reader;
use crate::metadata::token::Token;
use crate::metadata::types::{TypeDef, TypeIndex};
use crate::metadata::writer;
use crate::Result;

/// A reference to a method declared by another image.
///
/// Carries just enough to identify the callee at link time: the owning type's
/// fully-qualified name and the method name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    /// Fully-qualified name of the owning type
    pub owner: String,
    /// Method name
    pub name: String,
}

/// A loaded module image.
#[derive(Debug, Clone)]
pub struct Module {
    /// Module name, as recorded in the image header
    name: String,
    /// Module version identifier
    mvid: Guid,
    /// Names of external images this module references
    extern_refs: Vec<String>,
    /// Type arena; [`TypeIndex`] values index into this
    types: Vec<TypeDef>,
    /// External method references; method-ref tokens index into this
    method_refs: Vec<MethodRef>,
}

impl Module {
    /// Creates an empty module with the given name and identity.
    #[must_use]
    pub fn new(name: impl Into<String>, mvid: Guid) -> Self {
        Module {
            name: name.into(),
            mvid,
            extern_refs: Vec::new(),
            types: Vec::new(),
            method_refs: Vec::new(),
        }
    }

    /// Loads a module image from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not decode as a
    /// well-formed module image.
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::from_file(path)?;
        reader::read_module(file.data())
    }

    /// Loads a module image from a byte buffer.
    ///
    /// # Errors
    /// Returns an error if the buffer does not decode as a well-formed module
    /// image.
    pub fn from_mem(data: Vec<u8>) -> Result<Self> {
        let file = File::from_mem(data)?;
        reader::read_module(file.data())
    }

    /// Encodes this module back into image bytes.
    ///
    /// # Errors
    /// Returns an error if a row refers to a type index outside the arena.
    pub fn to_vec(&self) -> Result<Vec<u8>> {
        writer::write_module(self)
    }

    /// Encodes this module and writes it to `path`.
    ///
    /// # Errors
    /// Returns an error if encoding fails or the file cannot be written.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let bytes = self.to_vec()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// The module name recorded in the image header.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module version identifier.
    #[must_use]
    pub fn mvid(&self) -> Guid {
        self.mvid
    }

    /// Names of external images this module references.
    #[must_use]
    pub fn extern_refs(&self) -> &[String] {
        &self.extern_refs
    }

    /// Records a reference to an external image, skipping duplicates.
    pub fn add_extern_ref(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.extern_refs.contains(&name) {
            self.extern_refs.push(name);
        }
    }

    /// All type definitions, in arena order.
    #[must_use]
    pub fn types(&self) -> &[TypeDef] {
        &self.types
    }

    /// Looks up a type by arena index.
    #[must_use]
    pub fn get_type(&self, index: TypeIndex) -> Option<&TypeDef> {
        self.types.get(index.0)
    }

    /// Appends a type definition and returns its arena index.
    pub fn push_type(&mut self, type_def: TypeDef) -> TypeIndex {
        self.types.push(type_def);
        TypeIndex(self.types.len() - 1)
    }

    /// Computes the fully-qualified name of a type, walking the nesting chain.
    ///
    /// Top-level types render as `Namespace.Name`; nested types append their
    /// simple name to the enclosing type's fully-qualified name with a `/`
    /// separator, e.g. `Game.Player/State`.
    ///
    /// # Panics
    /// Panics if `index` is outside the type arena.
    #[must_use]
    pub fn type_fullname(&self, index: TypeIndex) -> String {
        let type_def = &self.types[index.0];
        match type_def.enclosing {
            Some(enclosing) => {
                format!("{}/{}", self.type_fullname(enclosing), type_def.name)
            }
            None => type_def.local_name(),
        }
    }

    /// All external method references, in table order.
    #[must_use]
    pub fn method_refs(&self) -> &[MethodRef] {
        &self.method_refs
    }

    /// Resolves a method-ref token to its table entry.
    #[must_use]
    pub fn method_ref_at(&self, token: Token) -> Option<&MethodRef> {
        if !token.is_method_ref() || token.row() == 0 {
            return None;
        }
        self.method_refs.get(token.row() as usize - 1)
    }

    /// Returns a token for a reference to `owner::name`, reusing an existing
    /// table entry when one matches and appending a new row otherwise.
    pub fn import_method_ref(&mut self, owner: &str, name: &str) -> Token {
        let existing = self
            .method_refs
            .iter()
            .position(|r| r.owner == owner && r.name == name);
        let row = match existing {
            Some(index) => index + 1,
            None => {
                self.method_refs.push(MethodRef {
                    owner: owner.to_string(),
                    name: name.to_string(),
                });
                self.method_refs.len()
            }
        };
        Token::method_ref(row as u32)
    }

    /// Appends a pre-built method reference row, used by the format reader.
    pub(crate) fn push_method_ref(&mut self, method_ref: MethodRef) {
        self.method_refs.push(method_ref);
    }

    /// Computes the token of a method definition from its position.
    ///
    /// Method rows are numbered globally in declaration order: all methods of
    /// the first type, then all methods of the second, and so on.
    #[must_use]
    pub fn method_def_token(&self, type_index: TypeIndex, method_index: usize) -> Token {
        let preceding: usize = self.types[..type_index.0]
            .iter()
            .map(|t| t.methods.len())
            .sum();
        Token::method_def((preceding + method_index + 1) as u32)
    }

    /// Resolves a method-def token back to its type and method position.
    #[must_use]
    pub fn resolve_method_def(&self, token: Token) -> Option<(TypeIndex, usize)> {
        if !token.is_method_def() || token.row() == 0 {
            return None;
        }
        let mut remaining = token.row() as usize - 1;
        for (index, type_def) in self.types.iter().enumerate() {
            if remaining < type_def.methods.len() {
                return Some((TypeIndex(index), remaining));
            }
            remaining -= type_def.methods.len();
        }
        None
    }

    /// Total number of method definitions across all types.
    #[must_use]
    pub fn method_count(&self) -> usize {
        self.types.iter().map(|t| t.methods.len()).sum()
    }
}

impl Index<TypeIndex> for Module {
    type Output = TypeDef;

    fn index(&self, index: TypeIndex) -> &TypeDef {
        &self.types[index.0]
    }
}

impl IndexMut<TypeIndex> for Module {
    fn index_mut(&mut self, index: TypeIndex) -> &mut TypeDef {
        &mut self.types[index.0]
    }
}
