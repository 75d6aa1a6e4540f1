//! Fluent builders for authoring module images in memory.
//!
//! [`ModuleBuilder`] and its companions construct a [`Module`] without going
//! through the binary format, which is how test fixtures and synthetic images
//! are produced. Builders consume themselves so declarations chain naturally,
//! and nesting is expressed structurally: a [`TypeBuilder`] owns its nested
//! type builders and the final build pass flattens them into the arena with
//! enclosing links resolved.
//!
//! # Examples
//!
//! ```rust
//! use dotsplice::metadata::{ModuleBuilder, TypeBuilder, MethodBuilder};
//!
//! let module = ModuleBuilder::new("game.dspl")
//!     .type_def(
//!         TypeBuilder::new("Game", "Player").public().method(
//!             MethodBuilder::new("Damage")
//!                 .public()
//!                 .param("amount", "System.Int32")
//!                 .body(vec![0x00, 0x2A]),
//!         ),
//!     )
//!     .build()?;
//!
//! assert_eq!(module.types().len(), 1);
//! assert_eq!(module.method_count(), 1);
//! # Ok::<(), dotsplice::Error>(())
//! ```

use std::collections::HashSet;

use uguid::Guid;

use crate::metadata::attributes::CustomAttribute;
use crate::metadata::method::{MethodAttributes, MethodDef, ParamDef};
use crate::metadata::module::Module;
use crate::metadata::types::{TypeAttributes, TypeDef, TypeIndex, VOID_TYPE};
use crate::Result;

/// Builder for a method declaration.
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    flags: MethodAttributes,
    return_type: String,
    params: Vec<ParamDef>,
    attributes: Vec<CustomAttribute>,
    body: Vec<u8>,
}

impl MethodBuilder {
    /// Starts a method returning no value, with no flags set.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            name: name.into(),
            flags: MethodAttributes::empty(),
            return_type: VOID_TYPE.to_string(),
            params: Vec::new(),
            attributes: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Marks the method externally visible.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.flags |= MethodAttributes::PUBLIC;
        self
    }

    /// Marks the method static.
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.flags |= MethodAttributes::STATIC;
        self
    }

    /// Replaces the flag set entirely.
    #[must_use]
    pub fn flags(mut self, flags: MethodAttributes) -> Self {
        self.flags = flags;
        self
    }

    /// Sets the return type.
    #[must_use]
    pub fn returns(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = type_name.into();
        self
    }

    /// Appends a by-value parameter.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.params.push(ParamDef::new(name, type_name));
        self
    }

    /// Appends a by-reference input parameter.
    #[must_use]
    pub fn param_by_ref(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.params.push(ParamDef::by_ref(name, type_name));
        self
    }

    /// Applies a custom attribute.
    #[must_use]
    pub fn attribute(mut self, attribute: CustomAttribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Sets the raw body bytes.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    fn into_def(self) -> MethodDef {
        MethodDef {
            name: self.name,
            flags: self.flags,
            return_type: self.return_type,
            params: self.params,
            attributes: self.attributes,
            body: self.body,
        }
    }
}

/// Builder for a type declaration, including its nested types.
#[derive(Debug, Clone)]
pub struct TypeBuilder {
    namespace: String,
    name: String,
    flags: TypeAttributes,
    methods: Vec<MethodBuilder>,
    nested: Vec<TypeBuilder>,
}

impl TypeBuilder {
    /// Starts a type with no flags set. Nested types conventionally use an
    /// empty namespace; their position in the name hierarchy comes from the
    /// enclosing chain.
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        TypeBuilder {
            namespace: namespace.into(),
            name: name.into(),
            flags: TypeAttributes::empty(),
            methods: Vec::new(),
            nested: Vec::new(),
        }
    }

    /// Marks the type externally visible.
    #[must_use]
    pub fn public(mut self) -> Self {
        self.flags |= TypeAttributes::PUBLIC;
        self
    }

    /// Marks the type sealed.
    #[must_use]
    pub fn sealed(mut self) -> Self {
        self.flags |= TypeAttributes::SEALED;
        self
    }

    /// Replaces the flag set entirely.
    #[must_use]
    pub fn flags(mut self, flags: TypeAttributes) -> Self {
        self.flags = flags;
        self
    }

    /// Declares a method on this type.
    #[must_use]
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method);
        self
    }

    /// Declares a type nested within this one.
    #[must_use]
    pub fn nested(mut self, nested: TypeBuilder) -> Self {
        self.nested.push(nested);
        self
    }

    /// Flattens this builder and its nested types into the module arena,
    /// parents before children.
    fn flatten_into(self, module: &mut Module, enclosing: Option<TypeIndex>) {
        let mut type_def = TypeDef::new(self.namespace, self.name, self.flags);
        type_def.enclosing = enclosing;
        type_def.methods = self.methods.into_iter().map(MethodBuilder::into_def).collect();

        let index = module.push_type(type_def);
        for nested in self.nested {
            nested.flatten_into(module, Some(index));
        }
    }
}

/// Builder for a complete module image.
#[derive(Debug, Clone)]
pub struct ModuleBuilder {
    name: String,
    mvid: Guid,
    extern_refs: Vec<String>,
    types: Vec<TypeBuilder>,
}

impl ModuleBuilder {
    /// Starts a module with a zero mvid and no declarations.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        ModuleBuilder {
            name: name.into(),
            mvid: Guid::ZERO,
            extern_refs: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Sets the module version identifier.
    #[must_use]
    pub fn mvid(mut self, mvid: Guid) -> Self {
        self.mvid = mvid;
        self
    }

    /// Records a reference to an external image.
    #[must_use]
    pub fn extern_ref(mut self, name: impl Into<String>) -> Self {
        self.extern_refs.push(name.into());
        self
    }

    /// Declares a top-level type.
    #[must_use]
    pub fn type_def(mut self, type_builder: TypeBuilder) -> Self {
        self.types.push(type_builder);
        self
    }

    /// Builds the module, flattening nested type declarations into the arena.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] if two declarations produce the same
    /// fully-qualified type name.
    pub fn build(self) -> Result<Module> {
        let mut module = Module::new(self.name, self.mvid);
        for extern_ref in self.extern_refs {
            module.add_extern_ref(extern_ref);
        }
        for type_builder in self.types {
            type_builder.flatten_into(&mut module, None);
        }

        let mut seen = HashSet::new();
        for index in 0..module.types().len() {
            let fullname = module.type_fullname(TypeIndex(index));
            if !seen.insert(fullname.clone()) {
                return Err(malformed_error!(
                    "Duplicate type name '{}' in module",
                    fullname
                ));
            }
        }

        Ok(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_nested_types_flatten_parents_first() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .nested(
                        TypeBuilder::new("", "State")
                            .public()
                            .nested(TypeBuilder::new("", "Flags").public()),
                    )
                    .nested(TypeBuilder::new("", "Stats").public()),
            )
            .build()
            .unwrap();

        assert_eq!(module.types().len(), 4);
        assert_eq!(module.type_fullname(TypeIndex(0)), "Game.Player");
        assert_eq!(module.type_fullname(TypeIndex(1)), "Game.Player/State");
        assert_eq!(module.type_fullname(TypeIndex(2)), "Game.Player/State/Flags");
        assert_eq!(module.type_fullname(TypeIndex(3)), "Game.Player/Stats");
    }

    #[test]
    fn test_method_declarations() {
        let module = ModuleBuilder::new("hooks.dspl")
            .extern_ref("game.dspl")
            .type_def(
                TypeBuilder::new("Mods", "Hooks").public().sealed().method(
                    MethodBuilder::new("OnDamage")
                        .public()
                        .static_method()
                        .param("self", "Game.Player")
                        .param_by_ref("amount", "System.Int32")
                        .returns("System.Boolean")
                        .body(vec![0x2A]),
                ),
            )
            .build()
            .unwrap();

        let hooks = &module.types()[0];
        assert!(hooks.is_public());
        assert!(hooks.is_sealed());

        let on_damage = &hooks.methods[0];
        assert!(on_damage.is_public());
        assert!(on_damage.is_static());
        assert!(!on_damage.is_void_return());
        assert!(on_damage.has_input_reference_param());
        assert_eq!(on_damage.params.len(), 2);
        assert_eq!(module.extern_refs(), &["game.dspl"]);
    }

    #[test]
    fn test_duplicate_fullname_rejected() {
        let result = ModuleBuilder::new("app")
            .type_def(TypeBuilder::new("Game", "Player"))
            .type_def(TypeBuilder::new("Game", "Player"))
            .build();
        assert!(matches!(result, Err(Error::Malformed { .. })));
    }

    #[test]
    fn test_round_trip_through_image_bytes() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player").public().method(
                    MethodBuilder::new("Damage")
                        .public()
                        .param("amount", "System.Int32")
                        .body(vec![0x00, 0x2A]),
                ),
            )
            .build()
            .unwrap();

        let bytes = module.to_vec().unwrap();
        let reloaded = Module::from_mem(bytes).unwrap();
        assert_eq!(reloaded.name(), "game.dspl");
        assert_eq!(reloaded.types()[0].methods[0].body, vec![0x00, 0x2A]);
    }
}
