//! Hook registry: kind grouping, visibility validation, and argument screening.
//!
//! The registry turns the scanner's raw candidate list into a validated
//! [`HookSet`]. Three things happen here, in order:
//!
//! 1. **Visibility validation** - every declaring type in the raw candidate
//!    pool (any attributed method, recognized or not) must be externally
//!    visible, enclosing types included. A single failure aborts the whole
//!    build with [`crate::Error::HookVisibility`] naming every offender at
//!    once, and no kind produces output for that run.
//! 2. **Recognition** - each candidate's attribute is matched against the
//!    closed set of [`HookKind`] variants; unrecognized attributes are ignored.
//! 3. **Argument screening** - a declaration whose constructor arguments do
//!    not satisfy its kind's contract is excluded with a diagnostic; the
//!    exclusion is declaration-scoped and the build continues.
//!
//! The surviving declarations are grouped by kind with scan order preserved,
//! which fixes the injection order when several hooks target the same method.
//!
//! # Key Components
//!
//! - [`HookKind`] - The closed set of recognized attribute types
//! - [`HookDeclaration`] - A validated declaration with its parsed payload
//! - [`HookSet`] - Declarations grouped by kind, scan order preserved
//! - [`build`] - Runs recognition, validation, and screening over a module

use crate::diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics, DiagnosticSeverity};
use crate::metadata::attributes::CustomAttribute;
use crate::metadata::module::Module;
use crate::metadata::types::TypeIndex;
use crate::patch::resolver::split_target_name;
use crate::patch::scanner;
use crate::{Error, Result};

/// Fully-qualified attribute type recognized as a call-wrapper hook.
pub const CALL_HOOK_ATTRIBUTE: &str = "Dotsplice.CallHookAttribute";
/// Fully-qualified attribute type recognized as a new-method hook.
pub const NEW_METHOD_ATTRIBUTE: &str = "Dotsplice.NewMethodAttribute";

/// The closed set of hook kinds the patcher recognizes.
///
/// Each kind knows which attribute type marks it and what constructor
/// arguments that attribute must carry. Grouping, validation, and execution
/// all dispatch over this enum rather than over attribute name strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    /// Splice a call to the hook into an existing method body.
    CallHook,
    /// Synthesize a new forwarding method on a target type.
    NewMethod,
}

/// A constructor argument list that does not satisfy its kind's contract.
enum ArgumentError {
    /// Wrong arity or wrong argument types
    Shape,
    /// The dotted target cannot be split into a type and method name
    TargetName(String),
}

impl HookKind {
    /// Every recognized kind, in grouping order.
    pub const ALL: [HookKind; 2] = [HookKind::CallHook, HookKind::NewMethod];

    /// The fully-qualified attribute type that marks this kind.
    #[must_use]
    pub fn attribute_type(self) -> &'static str {
        match self {
            HookKind::CallHook => CALL_HOOK_ATTRIBUTE,
            HookKind::NewMethod => NEW_METHOD_ATTRIBUTE,
        }
    }

    /// Returns true if the attribute instance marks this kind.
    #[must_use]
    pub fn matches(self, attribute: &CustomAttribute) -> bool {
        attribute.attr_type == self.attribute_type()
    }

    /// Human-readable constructor contract, used in screening diagnostics.
    #[must_use]
    pub fn expected_arguments(self) -> &'static str {
        match self {
            HookKind::CallHook => "(target: string, placeAtEnd: bool = false)",
            HookKind::NewMethod => "(typeName: string, methodName: string)",
        }
    }

    /// Parses and validates the constructor arguments for this kind.
    fn parse(self, attribute: &CustomAttribute) -> std::result::Result<HookPayload, ArgumentError> {
        match self {
            HookKind::CallHook => {
                if attribute.args.is_empty() || attribute.args.len() > 2 {
                    return Err(ArgumentError::Shape);
                }
                let target = attribute.args[0].as_str().ok_or(ArgumentError::Shape)?;
                let place_at_end = match attribute.args.get(1) {
                    Some(arg) => arg.as_bool().ok_or(ArgumentError::Shape)?,
                    None => false,
                };
                let (type_name, method_name) = split_target_name(target)
                    .ok_or_else(|| ArgumentError::TargetName(target.to_string()))?;
                Ok(HookPayload::CallHook {
                    type_name: type_name.to_string(),
                    method_name: method_name.to_string(),
                    place_at_end,
                })
            }
            HookKind::NewMethod => {
                if attribute.args.len() != 2 {
                    return Err(ArgumentError::Shape);
                }
                let type_name = attribute.args[0].as_str().ok_or(ArgumentError::Shape)?;
                let method_name = attribute.args[1].as_str().ok_or(ArgumentError::Shape)?;
                Ok(HookPayload::NewMethod {
                    type_name: type_name.to_string(),
                    method_name: method_name.to_string(),
                })
            }
        }
    }
}

/// Parsed constructor arguments of a hook declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookPayload {
    /// Call-wrapper arguments: the split target name and the placement flag.
    CallHook {
        /// Fully-qualified name of the type to patch
        type_name: String,
        /// Name of the method to patch
        method_name: String,
        /// Splice at the method's exit points instead of its entry
        place_at_end: bool,
    },
    /// New-method arguments: the owning type and the name to synthesize.
    NewMethod {
        /// Fully-qualified name of the type to extend
        type_name: String,
        /// Name of the method to synthesize
        method_name: String,
    },
}

/// A validated hook declaration, ready for resolution.
///
/// Ties the parsed attribute payload to the hook implementation method it was
/// found on. Declarations are immutable once built.
#[derive(Debug, Clone)]
pub struct HookDeclaration {
    /// The kind this declaration was grouped under
    pub kind: HookKind,
    /// Parsed constructor arguments
    pub payload: HookPayload,
    /// Declaring type of the hook implementation, in the hook module
    pub type_index: TypeIndex,
    /// Position of the hook implementation method within its type
    pub method_pos: usize,
}

impl HookDeclaration {
    /// The dotted name this declaration targets, for diagnostics.
    #[must_use]
    pub fn target_name(&self) -> String {
        match &self.payload {
            HookPayload::CallHook {
                type_name,
                method_name,
                ..
            }
            | HookPayload::NewMethod {
                type_name,
                method_name,
            } => format!("{type_name}.{method_name}"),
        }
    }
}

/// Validated declarations grouped by kind, scan order preserved within each.
#[derive(Debug, Default)]
pub struct HookSet {
    call_hooks: Vec<HookDeclaration>,
    new_methods: Vec<HookDeclaration>,
    excluded: usize,
}

impl HookSet {
    /// Declarations of one kind, in scan order.
    #[must_use]
    pub fn of_kind(&self, kind: HookKind) -> &[HookDeclaration] {
        match kind {
            HookKind::CallHook => &self.call_hooks,
            HookKind::NewMethod => &self.new_methods,
        }
    }

    /// Total number of declarations across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.call_hooks.len() + self.new_methods.len()
    }

    /// Returns true if no declaration survived screening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of declarations excluded during argument screening.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.excluded
    }

    fn push(&mut self, declaration: HookDeclaration) {
        match declaration.kind {
            HookKind::CallHook => self.call_hooks.push(declaration),
            HookKind::NewMethod => self.new_methods.push(declaration),
        }
    }
}

/// Builds the hook set for a module: visibility validation, recognition, and
/// argument screening over the scanner's candidate list.
///
/// # Errors
/// Returns [`Error::HookVisibility`] when the declaring type of any attributed
/// method is not externally visible, whether or not the attribute is a
/// recognized hook kind; the error lists every offending type and no
/// declarations are produced for any kind.
pub fn build(module: &Module, diagnostics: &Diagnostics) -> Result<HookSet> {
    let candidates = scanner::scan(module);

    // Validated before recognition: an unrecognized attribute on a hidden
    // type still aborts the build.
    let mut offenders: Vec<String> = Vec::new();
    for candidate in &candidates {
        if is_externally_visible(module, candidate.type_index) {
            continue;
        }
        let fullname = module.type_fullname(candidate.type_index);
        if !offenders.contains(&fullname) {
            offenders.push(fullname);
        }
    }
    if !offenders.is_empty() {
        let listing = offenders.join("\n");
        diagnostics.error(
            DiagnosticCategory::Registry,
            "Hook types must be public",
            format!("The following hook types are not externally visible:\n{listing}"),
        );
        return Err(Error::HookVisibility(listing));
    }

    let mut set = HookSet::default();
    for candidate in candidates {
        let method = &module[candidate.type_index].methods[candidate.method_pos];
        let attribute = &method.attributes[candidate.attr_pos];
        let Some(kind) = HookKind::ALL.into_iter().find(|kind| kind.matches(attribute)) else {
            continue;
        };
        match kind.parse(attribute) {
            Ok(payload) => set.push(HookDeclaration {
                kind,
                payload,
                type_index: candidate.type_index,
                method_pos: candidate.method_pos,
            }),
            Err(ArgumentError::Shape) => {
                set.excluded += 1;
                diagnostics.error(
                    DiagnosticCategory::Registry,
                    "Malformed hook attribute",
                    format!(
                        "Attribute '{}' on '{}.{}' does not match the expected constructor {}",
                        attribute.attr_type,
                        module.type_fullname(candidate.type_index),
                        method.name,
                        kind.expected_arguments()
                    ),
                );
            }
            Err(ArgumentError::TargetName(target)) => {
                set.excluded += 1;
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticSeverity::Error,
                        DiagnosticCategory::Registry,
                        "Malformed target name",
                        format!(
                            "Target '{}' on '{}.{}' is not a dotted 'Type.Method' name",
                            target,
                            module.type_fullname(candidate.type_index),
                            method.name
                        ),
                    )
                    .with_target(target),
                );
            }
        }
    }

    Ok(set)
}

/// A type is externally visible when it and every enclosing type are public.
fn is_externally_visible(module: &Module, index: TypeIndex) -> bool {
    let mut current = Some(index);
    while let Some(index) = current {
        let type_def = &module[index];
        if !type_def.is_public() {
            return false;
        }
        current = type_def.enclosing;
    }
    true
}
