//! Splice execution and method synthesis against the target module.
//!
//! This is the only phase that mutates anything. A call-wrapper injection
//! decodes the target method's body, inserts a call to the hook at the
//! planned placement, and re-encodes; a new-method injection appends a
//! forwarding method to the target type. Both import the hook into the
//! target module as a method reference first, so the inserted call operands
//! are ordinary method-ref tokens.
//!
//! # Splice shape
//!
//! The inserted sequence is derived from the [`InjectionPlan`]:
//!
//! ```text
//! [pop]                      exit splice into a non-void method, when the
//!                            hook's result replaces the return value
//! [ldarg.0]                  when passing the instance
//! [ldarg.<n> | ldarga.s <n>] per target parameter, by value or by reference
//! call <hook token>
//! [pop]                      when the hook returns a value that is discarded
//!                            (entry splice, or exit splice in a void method)
//! ```
//!
//! An entry splice lands before the first instruction; branches keep
//! following the original entry, so a loop back to the top does not re-fire
//! the hook. An exit splice lands before every `ret`, and branches that
//! jumped straight to a `ret` are left pointing at the inserted sequence so
//! every return path runs the hook.
//!
//! # Failure scoping
//!
//! Every error here is declaration-scoped: a body that does not decode, an
//! exit splice into a method with no return points, or an argument slot out
//! of encodable range skips that declaration and leaves the method
//! untouched. The double-injection guard goes one step further and reports
//! [`SpliceOutcome::AlreadyInjected`] without treating it as a failure.

use crate::cil::{decode_body, encode_body, Instruction, Opcode, Operand};
use crate::metadata::method::{MethodAttributes, MethodDef};
use crate::metadata::module::Module;
use crate::metadata::token::Token;
use crate::metadata::types::{TypeIndex, VOID_TYPE};
use crate::patch::planner::{InjectionPlan, ParameterPassing, Placement};
use crate::{Error, Result};

/// Outcome of attempting a call splice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpliceOutcome {
    /// The call was inserted and the body re-encoded.
    Injected,
    /// The body already calls this hook; nothing was changed.
    AlreadyInjected,
}

/// Outcome of attempting to synthesize a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisOutcome {
    /// The method was appended to the target type.
    Added,
    /// The type already declares the requested name; nothing was changed.
    Duplicate,
}

/// Splices a call to `hook_owner::hook_name` into the target method,
/// following the plan's placement and argument-passing shape.
///
/// # Errors
/// Returns an error when the body does not decode, when an exit placement
/// finds no return points, or when an argument slot exceeds the encodable
/// range. The target method is left untouched in every error case.
pub fn splice_call(
    module: &mut Module,
    type_index: TypeIndex,
    method_pos: usize,
    plan: InjectionPlan,
    hook_owner: &str,
    hook_name: &str,
) -> Result<SpliceOutcome> {
    let (target_void, target_params) = {
        let method = &module[type_index].methods[method_pos];
        (method.is_void_return(), method.params.len())
    };

    let mut instructions = decode_body(&module[type_index].methods[method_pos].body)?;

    if already_calls(&instructions, module, hook_owner, hook_name) {
        return Ok(SpliceOutcome::AlreadyInjected);
    }

    let ret_positions: Vec<usize> = instructions
        .iter()
        .enumerate()
        .filter(|(_, instruction)| instruction.opcode == Opcode::Ret)
        .map(|(pos, _)| pos)
        .collect();
    if plan.placement == Placement::Exit && ret_positions.is_empty() {
        return Err(Error::Error(format!(
            "Method '{}.{}' has no return points for an exit splice",
            module.type_fullname(type_index),
            module[type_index].methods[method_pos].name
        )));
    }

    let hook_token = module.import_method_ref(hook_owner, hook_name);
    let prelude = build_prelude(plan, target_params, hook_token)?;

    match plan.placement {
        Placement::Entry => {
            let mut sequence = prelude;
            if plan.modifies_return {
                sequence.push(Instruction::simple(Opcode::Pop));
            }
            insert_sequence(&mut instructions, 0, &sequence, false);
        }
        Placement::Exit => {
            let mut sequence = Vec::with_capacity(prelude.len() + 1);
            if plan.modifies_return && !target_void {
                // Consume the original return value; the hook's result
                // replaces it on the stack.
                sequence.push(Instruction::simple(Opcode::Pop));
            }
            sequence.extend(prelude);
            if plan.modifies_return && target_void {
                sequence.push(Instruction::simple(Opcode::Pop));
            }

            // Back to front, so earlier positions stay valid.
            for &position in ret_positions.iter().rev() {
                insert_sequence(&mut instructions, position, &sequence, true);
            }
        }
    }

    let body = encode_body(&instructions)?;
    module[type_index].methods[method_pos].body = body;
    Ok(SpliceOutcome::Injected)
}

/// Synthesizes a public forwarding method named `method_name` on the target
/// type, with a body that calls the hook and returns.
///
/// The method is static when the target type is sealed, an instance method
/// otherwise. No parameters are declared and nothing is forwarded; the
/// synthesized method is a plain externally callable shim. The collision
/// check accepts both spellings of an existing member: the bare method name
/// and the type-qualified `Full.Type.Name.method` form.
///
/// # Errors
/// Returns an error when the two-instruction body fails to encode.
pub fn synthesize_method(
    module: &mut Module,
    type_index: TypeIndex,
    method_name: &str,
    hook_owner: &str,
    hook_name: &str,
) -> Result<SynthesisOutcome> {
    let fullname = module.type_fullname(type_index);
    let qualified_rest = method_name
        .strip_prefix(fullname.as_str())
        .and_then(|rest| rest.strip_prefix('.'));
    let type_def = &module[type_index];
    if type_def.method_by_name(method_name).is_some()
        || qualified_rest.is_some_and(|rest| type_def.method_by_name(rest).is_some())
    {
        return Ok(SynthesisOutcome::Duplicate);
    }

    let hook_token = module.import_method_ref(hook_owner, hook_name);
    let body = encode_body(&[
        Instruction::new(Opcode::Call, Operand::Token(hook_token)),
        Instruction::simple(Opcode::Ret),
    ])?;

    let mut flags = MethodAttributes::PUBLIC;
    if module[type_index].is_sealed() {
        flags |= MethodAttributes::STATIC;
    }
    let mut method = MethodDef::new(method_name, flags, VOID_TYPE);
    method.body = body;
    module[type_index].methods.push(method);

    Ok(SynthesisOutcome::Added)
}

/// Returns true if the body already contains a call to `owner::name`,
/// resolved through the module's method-ref table.
fn already_calls(
    instructions: &[Instruction],
    module: &Module,
    owner: &str,
    name: &str,
) -> bool {
    instructions.iter().any(|instruction| {
        if !instruction.opcode.is_call() {
            return false;
        }
        let Operand::Token(token) = instruction.operand else {
            return false;
        };
        module
            .method_ref_at(token)
            .is_some_and(|existing| existing.owner == owner && existing.name == name)
    })
}

/// Builds the load-and-call sequence for one splice.
fn build_prelude(
    plan: InjectionPlan,
    target_params: usize,
    hook_token: Token,
) -> Result<Vec<Instruction>> {
    let mut prelude = Vec::new();
    if plan.pass_instance {
        prelude.push(Instruction::simple(Opcode::Ldarg0));
    }

    // Argument slots follow the target's own numbering: slot 0 is the
    // receiver for instance methods, parameters start right after.
    let slot_base = usize::from(plan.pass_instance);
    match plan.parameter_passing {
        ParameterPassing::None => {}
        ParameterPassing::ByValue => {
            for index in 0..target_params {
                prelude.push(load_argument(slot_base + index)?);
            }
        }
        ParameterPassing::ByReference => {
            for index in 0..target_params {
                prelude.push(load_argument_address(slot_base + index)?);
            }
        }
    }

    prelude.push(Instruction::new(Opcode::Call, Operand::Token(hook_token)));
    Ok(prelude)
}

fn load_argument(slot: usize) -> Result<Instruction> {
    Ok(match slot {
        0 => Instruction::simple(Opcode::Ldarg0),
        1 => Instruction::simple(Opcode::Ldarg1),
        2 => Instruction::simple(Opcode::Ldarg2),
        3 => Instruction::simple(Opcode::Ldarg3),
        _ => Instruction::new(Opcode::LdargS, Operand::UInt8(argument_slot(slot)?)),
    })
}

fn load_argument_address(slot: usize) -> Result<Instruction> {
    Ok(Instruction::new(
        Opcode::LdargaS,
        Operand::UInt8(argument_slot(slot)?),
    ))
}

fn argument_slot(slot: usize) -> Result<u8> {
    u8::try_from(slot)
        .map_err(|_| malformed_error!("Argument slot {} exceeds the encodable range", slot))
}

/// Inserts `sequence` at `position`, shifting branch targets to compensate.
///
/// Branches that pointed at `position` itself either keep following the
/// original instruction to its shifted location, or - with
/// `retarget_to_sequence` - are left pointing at the start of the inserted
/// sequence.
fn insert_sequence(
    instructions: &mut Vec<Instruction>,
    position: usize,
    sequence: &[Instruction],
    retarget_to_sequence: bool,
) {
    let shift = sequence.len();
    for instruction in instructions.iter_mut() {
        if let Operand::Target(target) = &mut instruction.operand {
            if *target > position || (*target == position && !retarget_to_sequence) {
                *target += shift;
            }
        }
    }
    instructions.splice(position..position, sequence.iter().copied());
}
