//! Body decoding with branch-target resolution.

use std::collections::HashMap;

use crate::cil::{Instruction, Opcode, Operand, OperandKind};
use crate::file::parser::Parser;
use crate::metadata::token::Token;
use crate::Result;

/// Decodes a method body into an instruction list.
///
/// Branch displacements are resolved to instruction indices in a second pass,
/// so a displacement landing in the middle of another instruction or outside
/// the body is rejected rather than silently producing a broken target.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] for opcodes outside the supported
/// subset or branch targets off instruction boundaries, and
/// [`crate::Error::OutOfBounds`] for operands truncated by the end of the
/// body.
pub fn decode_body(body: &[u8]) -> Result<Vec<Instruction>> {
    let mut parser = Parser::new(body);
    let mut instructions = Vec::new();
    let mut offsets = Vec::new();
    // Branches carry (instruction index, absolute target byte offset)
    let mut pending_branches: Vec<(usize, i64)> = Vec::new();

    while parser.has_more_data() {
        let offset = parser.pos();
        let byte = parser.read_le::<u8>()?;
        let Some(opcode) = Opcode::from_byte(byte) else {
            return Err(malformed_error!(
                "Unsupported opcode 0x{:02X} at body offset {}",
                byte,
                offset
            ));
        };

        let operand = match opcode.operand_kind() {
            OperandKind::None => Operand::None,
            OperandKind::U8 => Operand::UInt8(parser.read_le::<u8>()?),
            OperandKind::I8 => {
                let value = parser.read_le::<i8>()?;
                if opcode.is_branch() {
                    pending_branches.push((instructions.len(), parser.pos() as i64 + i64::from(value)));
                    Operand::Target(0)
                } else {
                    Operand::Int8(value)
                }
            }
            OperandKind::I32 => {
                let value = parser.read_le::<i32>()?;
                if opcode.is_branch() {
                    pending_branches.push((instructions.len(), parser.pos() as i64 + i64::from(value)));
                    Operand::Target(0)
                } else {
                    Operand::Int32(value)
                }
            }
            OperandKind::Token => Operand::Token(Token::new(parser.read_le::<u32>()?)),
        };

        offsets.push(offset);
        instructions.push(Instruction { opcode, operand });
    }

    let index_by_offset: HashMap<i64, usize> = offsets
        .iter()
        .enumerate()
        .map(|(index, offset)| (*offset as i64, index))
        .collect();

    for (index, target_offset) in pending_branches {
        match index_by_offset.get(&target_offset) {
            Some(&target_index) => {
                instructions[index].operand = Operand::Target(target_index);
            }
            None => {
                return Err(malformed_error!(
                    "Branch at instruction {} targets byte offset {} which is not an instruction boundary",
                    index,
                    target_offset
                ));
            }
        }
    }

    Ok(instructions)
}
