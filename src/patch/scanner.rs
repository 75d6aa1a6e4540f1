//! Attribute discovery over a hook-implementation module.
//!
//! The scan is the first pipeline phase: it walks every method of every type
//! and produces one [`HookCandidate`] per attribute applied to a method,
//! without judging whether the attribute is one the patcher recognizes.
//! Filtering and validation belong to the registry, which consumes the raw
//! candidate list.
//!
//! Candidates are emitted in declaration order (types in arena order, methods
//! and attributes in row order), which keeps every later phase deterministic.

use crate::metadata::module::Module;
use crate::metadata::types::TypeIndex;

/// A (declaring type, method, attribute) triple found during the scan.
///
/// Carries arena positions rather than borrowed rows, so candidates stay
/// valid while the registry walks and re-walks the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HookCandidate {
    /// Arena index of the declaring type
    pub type_index: TypeIndex,
    /// Position of the method within the declaring type
    pub method_pos: usize,
    /// Position of the attribute on the method
    pub attr_pos: usize,
}

/// Walks every method in the module and collects one candidate per applied
/// attribute.
///
/// A method with several attributes produces several candidates; a method
/// with none produces nothing. The scan itself is a pure read.
#[must_use]
pub fn scan(module: &Module) -> Vec<HookCandidate> {
    let mut candidates = Vec::new();

    for (type_pos, type_def) in module.types().iter().enumerate() {
        for (method_pos, method) in type_def.methods.iter().enumerate() {
            for attr_pos in 0..method.attributes.len() {
                candidates.push(HookCandidate {
                    type_index: TypeIndex(type_pos),
                    method_pos,
                    attr_pos,
                });
            }
        }
    }

    candidates
}
