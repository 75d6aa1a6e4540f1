//! Target resolution: dotted-name splitting and overload disambiguation.
//!
//! A call-wrapper declaration names its target as a single dotted string like
//! `Game.Player.Damage`. The final segment is the method name; everything
//! before it is the fully-qualified type name (which itself contains dots).
//! Resolution looks the type up in the [`SymbolTable`], gathers the same-named
//! overloads, and picks exactly one.
//!
//! # Disambiguation
//!
//! With a single overload there is nothing to decide and it is returned
//! immediately. With two or more, the hook's own signature drives the choice:
//!
//! 1. The hook's call mode is *instance-style* when its first parameter's
//!    type names the target type (simple or fully-qualified), *static-style*
//!    otherwise. Overloads whose static-ness disagrees are discarded.
//! 2. A hook carrying no data parameters (nothing beyond the receiver)
//!    prefers the first remaining overload that itself takes no parameters.
//! 3. Otherwise each remaining overload is matched structurally: the hook's
//!    parameter list must replay the overload's receiver, optionally its
//!    return value, and a prefix of its parameters, compared by
//!    fully-qualified type name.
//! 4. Several survivors produce [`Resolution::Ambiguous`] carrying every
//!    surviving signature; the first survivor is still chosen. Zero survivors
//!    fall back to the first overload in declaration order.
//!
//! The outcome is a plain tagged value; the orchestrator decides what is a
//! warning and what skips the declaration.
//!
//! # Examples
//!
//! ```rust
//! use dotsplice::metadata::{MethodBuilder, ModuleBuilder, SymbolTable, TypeBuilder};
//! use dotsplice::patch::resolver::{self, Resolution};
//!
//! let target = ModuleBuilder::new("game.dspl")
//!     .type_def(
//!         TypeBuilder::new("Game", "Player")
//!             .public()
//!             .method(MethodBuilder::new("Damage").public())
//!             .method(
//!                 MethodBuilder::new("Damage")
//!                     .public()
//!                     .param("amount", "System.Int32"),
//!             ),
//!     )
//!     .build()?;
//! let symbols = SymbolTable::new(&target);
//!
//! // A hook declaring (Player, System.Int32) selects the overload whose
//! // parameter list it replays.
//! let hook = ModuleBuilder::new("hooks.dspl")
//!     .type_def(
//!         TypeBuilder::new("Mods", "Hooks").public().method(
//!             MethodBuilder::new("OnDamage")
//!                 .public()
//!                 .static_method()
//!                 .param("player", "Game.Player")
//!                 .param("amount", "System.Int32"),
//!         ),
//!     )
//!     .build()?;
//! let hook_method = &hook.types()[0].methods[0];
//!
//! let resolution = resolver::resolve(&target, &symbols, "Game.Player", "Damage", hook_method);
//! match resolution {
//!     Resolution::Resolved(target) => assert_eq!(target.method_pos, 1),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! # Ok::<(), dotsplice::Error>(())
//! ```

use crate::metadata::method::MethodDef;
use crate::metadata::module::Module;
use crate::metadata::symbols::SymbolTable;
use crate::metadata::types::TypeIndex;

/// Splits a dotted target name into its type and method segments.
///
/// The method name is the final segment; the type name is everything before
/// the last dot and may itself contain dots. Returns `None` for names with no
/// dot or with an empty segment on either side.
#[must_use]
pub fn split_target_name(target: &str) -> Option<(&str, &str)> {
    let (type_name, method_name) = target.rsplit_once('.')?;
    if type_name.is_empty() || method_name.is_empty() {
        return None;
    }
    Some((type_name, method_name))
}

/// A resolved (type, method) pair in the target module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Arena index of the resolved type
    pub type_index: TypeIndex,
    /// Position of the resolved method within the type
    pub method_pos: usize,
}

/// Outcome of resolving one dotted target name against a symbol table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one method was chosen.
    Resolved(ResolvedTarget),
    /// More than one overload survived structural matching; the first
    /// survivor was chosen and every surviving signature is listed.
    Ambiguous {
        /// The chosen first survivor
        target: ResolvedTarget,
        /// Full signatures of every surviving overload
        candidates: Vec<String>,
    },
    /// The type name is absent from the symbol table.
    UnknownType {
        /// The name that failed to resolve
        type_name: String,
    },
    /// The type exists but declares no method with the requested name.
    UnknownMethod {
        /// Fully-qualified name of the resolved type
        type_name: String,
        /// The method name that failed to resolve
        method_name: String,
    },
}

/// Resolves a split target name to a single method of the target module.
///
/// `hook` is the hook implementation method whose signature drives overload
/// disambiguation. Candidate ordering is declaration order throughout, so the
/// outcome is reproducible for a given pair of modules.
#[must_use]
pub fn resolve(
    module: &Module,
    symbols: &SymbolTable,
    type_name: &str,
    method_name: &str,
    hook: &MethodDef,
) -> Resolution {
    let Some(type_index) = symbols.type_index(type_name) else {
        return Resolution::UnknownType {
            type_name: type_name.to_string(),
        };
    };

    let type_def = &module[type_index];
    let overloads: Vec<usize> = type_def
        .methods
        .iter()
        .enumerate()
        .filter(|(_, method)| method.name == method_name)
        .map(|(pos, _)| pos)
        .collect();

    if overloads.is_empty() {
        return Resolution::UnknownMethod {
            type_name: type_name.to_string(),
            method_name: method_name.to_string(),
        };
    }
    if overloads.len() == 1 {
        return Resolution::Resolved(ResolvedTarget {
            type_index,
            method_pos: overloads[0],
        });
    }

    // Call mode: the hook addresses instance methods when its first parameter
    // names the target type, static methods otherwise.
    let instance_style = hook.params.first().is_some_and(|param| {
        param.type_name == type_def.name || param.type_name == module.type_fullname(type_index)
    });

    let mode_matched: Vec<usize> = overloads
        .iter()
        .copied()
        .filter(|&pos| type_def.methods[pos].is_static() != instance_style)
        .collect();

    // No data parameters: nothing to match structurally, so prefer the
    // overload that also takes nothing.
    let data_params = hook.params.len().saturating_sub(usize::from(instance_style));
    if data_params == 0 {
        let chosen = mode_matched
            .iter()
            .copied()
            .find(|&pos| type_def.methods[pos].params.is_empty())
            .or_else(|| mode_matched.first().copied())
            .unwrap_or(overloads[0]);
        return Resolution::Resolved(ResolvedTarget {
            type_index,
            method_pos: chosen,
        });
    }

    let survivors: Vec<usize> = mode_matched
        .iter()
        .copied()
        .filter(|&pos| signature_matches(hook, &type_def.methods[pos]))
        .collect();

    match survivors.as_slice() {
        [] => Resolution::Resolved(ResolvedTarget {
            type_index,
            method_pos: overloads[0],
        }),
        [only] => Resolution::Resolved(ResolvedTarget {
            type_index,
            method_pos: *only,
        }),
        _ => Resolution::Ambiguous {
            target: ResolvedTarget {
                type_index,
                method_pos: survivors[0],
            },
            candidates: survivors
                .iter()
                .map(|&pos| method_signature(module, type_index, &type_def.methods[pos]))
                .collect(),
        },
    }
}

/// Structural signature match between a hook and one overload candidate.
///
/// The hook's parameter list is laid out as `[receiver][return][params...]`:
/// slot 0 holds the receiver for instance candidates, the next slot may hold
/// the candidate's return value, and the remaining slots replay a prefix of
/// the candidate's own parameters. Matching compares fully-qualified type
/// names only.
fn signature_matches(hook: &MethodDef, candidate: &MethodDef) -> bool {
    let return_slot = usize::from(!candidate.is_static());
    let required_extra = if candidate.is_static() { 1 } else { 2 };
    let max_hook_params = candidate.params.len() + required_extra;
    let hook_params = hook.params.len();

    if hook_params > max_hook_params {
        return false;
    }

    if hook_params == max_hook_params {
        // The hook also receives the return value.
        if hook.params[return_slot].type_name != candidate.return_type {
            return false;
        }
        for index in (return_slot + 1)..hook_params {
            if hook.params[index].type_name != candidate.params[index - required_extra].type_name {
                return false;
            }
        }
        true
    } else {
        // No return-value slot: remaining hook parameters replay a prefix of
        // the candidate's own.
        for index in return_slot..hook_params {
            if hook.params[index].type_name != candidate.params[index - return_slot].type_name {
                return false;
            }
        }
        true
    }
}

/// Renders a method's full signature for diagnostics, e.g.
/// `System.Void Game.Player.Damage(System.Int32)`.
#[must_use]
pub fn method_signature(module: &Module, type_index: TypeIndex, method: &MethodDef) -> String {
    let params: Vec<&str> = method
        .params
        .iter()
        .map(|param| param.type_name.as_str())
        .collect();
    format!(
        "{} {}.{}({})",
        method.return_type,
        module.type_fullname(type_index),
        method.name,
        params.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::method::{MethodAttributes, ParamDef};
    use crate::metadata::{MethodBuilder, ModuleBuilder, TypeBuilder};

    fn static_hook(params: &[&str]) -> MethodDef {
        let mut hook = MethodDef::new(
            "Hook",
            MethodAttributes::PUBLIC | MethodAttributes::STATIC,
            "System.Void",
        );
        for (index, type_name) in params.iter().enumerate() {
            hook.params.push(ParamDef::new(format!("p{index}"), *type_name));
        }
        hook
    }

    #[test]
    fn test_split_round_trip() {
        assert_eq!(
            split_target_name("Game.Player.Damage"),
            Some(("Game.Player", "Damage"))
        );
        assert_eq!(split_target_name("Foo.Bar"), Some(("Foo", "Bar")));
        assert_eq!(
            split_target_name("Game.Player/State.Reset"),
            Some(("Game.Player/State", "Reset"))
        );

        // Joining the split segments with a dot restores the original name.
        let (type_name, method_name) = split_target_name("Game.World.Region.Load").unwrap();
        assert_eq!(format!("{type_name}.{method_name}"), "Game.World.Region.Load");
    }

    #[test]
    fn test_split_rejects_malformed_names() {
        assert_eq!(split_target_name("NoDots"), None);
        assert_eq!(split_target_name(".Leading"), None);
        assert_eq!(split_target_name("Trailing."), None);
        assert_eq!(split_target_name(""), None);
        assert_eq!(split_target_name("."), None);
    }

    #[test]
    fn test_unknown_type_and_method() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(MethodBuilder::new("Damage").public()),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);
        let hook = static_hook(&[]);

        assert_eq!(
            resolve(&module, &symbols, "Game.Playr", "Damage", &hook),
            Resolution::UnknownType {
                type_name: "Game.Playr".to_string()
            }
        );
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Jump", &hook),
            Resolution::UnknownMethod {
                type_name: "Game.Player".to_string(),
                method_name: "Jump".to_string()
            }
        );
    }

    #[test]
    fn test_single_overload_returned_without_matching() {
        // One overload wins immediately, even when the hook's shape would
        // never match it structurally.
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Foo", "Bar").public().method(
                    MethodBuilder::new("Baz")
                        .public()
                        .param("count", "System.Int32"),
                ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);
        let hook = static_hook(&["System.String", "System.Single", "System.Double"]);

        assert_eq!(
            resolve(&module, &symbols, "Foo.Bar", "Baz", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_exact_parameter_match_selects_overload() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .static_method()
                            .param("amount", "System.Int32"),
                    )
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .static_method()
                            .param("amount", "System.Int32")
                            .param("critical", "System.Boolean"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        // Static-style hook replaying (int, bool) exactly: required extra
        // slot stays empty, so only the two-parameter overload matches.
        let hook = static_hook(&["System.Int32", "System.Boolean"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Damage", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 1
            })
        );
    }

    #[test]
    fn test_zero_parameter_hook_prefers_zero_parameter_overload() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .static_method()
                            .param("amount", "System.Int32"),
                    )
                    .method(MethodBuilder::new("Damage").public().static_method()),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        let hook = static_hook(&[]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Damage", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 1
            })
        );
    }

    #[test]
    fn test_instance_hook_with_only_receiver_prefers_zero_parameter_overload() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Foo", "Widget")
                    .public()
                    .method(MethodBuilder::new("Qux").public())
                    .method(
                        MethodBuilder::new("Qux")
                            .public()
                            .param("count", "System.Int32"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        // Instance-style: single parameter naming the target type, no data
        // parameters beyond it.
        let hook = static_hook(&["Foo.Widget"]);
        assert_eq!(
            resolve(&module, &symbols, "Foo.Widget", "Qux", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_call_mode_discards_disagreeing_overloads() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("Heal")
                            .public()
                            .static_method()
                            .param("amount", "System.Int32"),
                    )
                    .method(
                        MethodBuilder::new("Heal")
                            .public()
                            .param("amount", "System.Int32"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        // Instance-style hook discards the static overload. The simple type
        // name works as well as the fully-qualified one.
        let by_simple_name = static_hook(&["Player", "System.Int32"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Heal", &by_simple_name),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 1
            })
        );

        let by_full_name = static_hook(&["Game.Player", "System.Int32"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Heal", &by_full_name),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 1
            })
        );

        // A first parameter naming neither spelling is static-style.
        let static_style = static_hook(&["System.Int32"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Heal", &static_style),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_return_slot_match_on_instance_overload() {
        // Instance f(int) returning bool; hook (Receiver, bool, int) fills
        // every slot: receiver, return value, then f's own parameter.
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("TryDamage")
                            .public()
                            .returns("System.Boolean")
                            .param("amount", "System.Int32"),
                    )
                    .method(
                        MethodBuilder::new("TryDamage")
                            .public()
                            .returns("System.Boolean")
                            .param("amount", "System.Int32")
                            .param("critical", "System.Boolean"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        let hook = static_hook(&["Game.Player", "System.Boolean", "System.Int32"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "TryDamage", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_prefix_match_without_return_slot() {
        // Instance f(int); hook (Receiver, int) forwards f's parameter with
        // no slot for the return value.
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .param("amount", "System.Int32"),
                    )
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .param("reason", "System.String"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        let hook = static_hook(&["Game.Player", "System.Int32"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Damage", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_ambiguous_overloads_list_candidates_and_pick_first() {
        // Both overloads accept the hook's (Receiver, int) prefix.
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .param("amount", "System.Int32"),
                    )
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .param("amount", "System.Int32")
                            .param("reason", "System.String"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        let hook = static_hook(&["Game.Player", "System.Int32"]);
        match resolve(&module, &symbols, "Game.Player", "Damage", &hook) {
            Resolution::Ambiguous { target, candidates } => {
                assert_eq!(target.method_pos, 0);
                assert_eq!(candidates.len(), 2);
                assert_eq!(
                    candidates[0],
                    "System.Void Game.Player.Damage(System.Int32)"
                );
                assert_eq!(
                    candidates[1],
                    "System.Void Game.Player.Damage(System.Int32, System.String)"
                );
            }
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_survivors_fall_back_to_first_overload() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player")
                    .public()
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .static_method()
                            .param("amount", "System.Int32"),
                    )
                    .method(
                        MethodBuilder::new("Damage")
                            .public()
                            .static_method()
                            .param("reason", "System.String"),
                    ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        // Static-style (bool) matches neither overload's parameter list.
        let hook = static_hook(&["System.Boolean"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player", "Damage", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(0),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_nested_receiver_type_is_instance_style() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player").public().nested(
                    TypeBuilder::new("", "State")
                        .public()
                        .method(MethodBuilder::new("Reset").public())
                        .method(
                            MethodBuilder::new("Reset")
                                .public()
                                .param("hard", "System.Boolean"),
                        ),
                ),
            )
            .build()
            .unwrap();
        let symbols = SymbolTable::new(&module);

        // Either the simple name or the nested fully-qualified name marks
        // the first parameter as the receiver.
        let hook = static_hook(&["Game.Player/State"]);
        assert_eq!(
            resolve(&module, &symbols, "Game.Player/State", "Reset", &hook),
            Resolution::Resolved(ResolvedTarget {
                type_index: TypeIndex(1),
                method_pos: 0
            })
        );
    }

    #[test]
    fn test_method_signature_rendering() {
        let module = ModuleBuilder::new("game.dspl")
            .type_def(
                TypeBuilder::new("Game", "Player").public().method(
                    MethodBuilder::new("TryDamage")
                        .public()
                        .returns("System.Boolean")
                        .param("amount", "System.Int32")
                        .param("critical", "System.Boolean"),
                ),
            )
            .build()
            .unwrap();

        let rendered = method_signature(&module, TypeIndex(0), &module.types()[0].methods[0]);
        assert_eq!(
            rendered,
            "System.Boolean Game.Player.TryDamage(System.Int32, System.Boolean)"
        );
    }
}
