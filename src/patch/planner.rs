//! Injection plan derivation from a resolved target and a hook signature.
//!
//! The plan is the bridge between resolution and execution: four flags,
//! derived purely from the resolved target method and the hook's own shape,
//! that tell the executor what the spliced call must look like. Plans are
//! computed immediately before execution and never stored.

use crate::metadata::method::MethodDef;

/// How the target's parameters are handed to the hook at the splice site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterPassing {
    /// The target declares no parameters; nothing is forwarded.
    None,
    /// Each parameter's value is loaded and passed as-is.
    ByValue,
    /// Each parameter's address is passed, letting the hook observe the
    /// caller's slots.
    ByReference,
}

/// Where the spliced call lands inside the target method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Before the first original instruction.
    Entry,
    /// Before every return point.
    Exit,
}

/// Derived call-shape flags for one injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionPlan {
    /// Load the receiver as the hook's first argument
    pub pass_instance: bool,
    /// How target parameters are forwarded
    pub parameter_passing: ParameterPassing,
    /// The hook returns a value, which replaces the target's return value at
    /// an exit splice
    pub modifies_return: bool,
    /// Entry or exit placement
    pub placement: Placement,
}

/// Derives the injection plan for a call-wrapper declaration.
///
/// `place_at_end` is the declaration's placement flag: `false` splices at the
/// method entry, `true` at its exit points. The remaining flags come from the
/// two signatures: the instance is passed whenever the target has one,
/// parameters are passed by reference as soon as the hook declares any
/// input-reference parameter, and a non-void hook modifies the return value.
#[must_use]
pub fn plan_call_hook(target: &MethodDef, hook: &MethodDef, place_at_end: bool) -> InjectionPlan {
    let parameter_passing = if target.params.is_empty() {
        ParameterPassing::None
    } else if hook.has_input_reference_param() {
        ParameterPassing::ByReference
    } else {
        ParameterPassing::ByValue
    };

    InjectionPlan {
        pass_instance: !target.is_static(),
        parameter_passing,
        modifies_return: !hook.is_void_return(),
        placement: if place_at_end {
            Placement::Exit
        } else {
            Placement::Entry
        },
    }
}
