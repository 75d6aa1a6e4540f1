//! Body encoding with displacement recomputation.

use crate::cil::{Instruction, Opcode, Operand, OperandKind};
use crate::file::io::write_le_at;
use crate::Result;

/// Byte size of an instruction in a given form.
fn instruction_size(opcode: Opcode) -> usize {
    match opcode.operand_kind() {
        OperandKind::None => 1,
        OperandKind::U8 | OperandKind::I8 => 2,
        OperandKind::I32 | OperandKind::Token => 5,
    }
}

/// Encodes an instruction list back into body bytes.
///
/// Branch displacements are computed from the final instruction layout. A
/// short-form branch whose target has moved out of 8-bit range is widened to
/// its 32-bit form; widening grows the body, which can push further targets
/// out of range, so layout iterates until no branch needs to grow. Widening
/// is one-way: branches already in long form are never shrunk, keeping
/// re-encoded bodies stable.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] when an operand does not fit its
/// opcode, e.g. a branch without an instruction-index target or a call
/// without a token.
pub fn encode_body(instructions: &[Instruction]) -> Result<Vec<u8>> {
    validate_operands(instructions)?;

    // Branches may widen, so the emitted opcode can differ from the input.
    let mut opcodes: Vec<Opcode> = instructions.iter().map(|i| i.opcode).collect();

    let offsets = loop {
        let mut offsets = Vec::with_capacity(instructions.len() + 1);
        let mut position = 0;
        for opcode in &opcodes {
            offsets.push(position);
            position += instruction_size(*opcode);
        }
        offsets.push(position);

        let mut widened = false;
        for (index, instruction) in instructions.iter().enumerate() {
            if opcodes[index].operand_kind() != OperandKind::I8 || !opcodes[index].is_branch() {
                continue;
            }
            if let Operand::Target(target) = instruction.operand {
                let displacement = offsets[target] as i64 - offsets[index + 1] as i64;
                if i8::try_from(displacement).is_err() {
                    opcodes[index] = opcodes[index].widened();
                    widened = true;
                }
            }
        }

        if !widened {
            break offsets;
        }
    };

    let mut buffer = vec![0u8; offsets[instructions.len()]];
    let mut position = 0;
    for (index, instruction) in instructions.iter().enumerate() {
        let opcode = opcodes[index];
        write_le_at(&mut buffer, &mut position, opcode as u8)?;

        match instruction.operand {
            Operand::None => {}
            Operand::UInt8(value) => write_le_at(&mut buffer, &mut position, value)?,
            Operand::Int8(value) => write_le_at(&mut buffer, &mut position, value)?,
            Operand::Int32(value) => write_le_at(&mut buffer, &mut position, value)?,
            Operand::Token(token) => write_le_at(&mut buffer, &mut position, token.value())?,
            Operand::Target(target) => {
                let displacement = offsets[target] as i64 - offsets[index + 1] as i64;
                match opcode.operand_kind() {
                    OperandKind::I8 => {
                        let Ok(short) = i8::try_from(displacement) else {
                            return Err(malformed_error!(
                                "Branch displacement {} left out of 8-bit range after layout",
                                displacement
                            ));
                        };
                        write_le_at(&mut buffer, &mut position, short)?;
                    }
                    _ => {
                        let Ok(long) = i32::try_from(displacement) else {
                            return Err(malformed_error!(
                                "Branch displacement {} exceeds 32-bit range",
                                displacement
                            ));
                        };
                        write_le_at(&mut buffer, &mut position, long)?;
                    }
                }
            }
        }
    }

    Ok(buffer)
}

/// Rejects instruction lists whose operands do not match their opcodes before
/// any layout work happens.
fn validate_operands(instructions: &[Instruction]) -> Result<()> {
    for (index, instruction) in instructions.iter().enumerate() {
        let opcode = instruction.opcode;
        let valid = if opcode.is_branch() {
            matches!(instruction.operand, Operand::Target(target) if target < instructions.len())
        } else {
            match opcode.operand_kind() {
                OperandKind::None => matches!(instruction.operand, Operand::None),
                OperandKind::U8 => matches!(instruction.operand, Operand::UInt8(_)),
                OperandKind::I8 => matches!(instruction.operand, Operand::Int8(_)),
                OperandKind::I32 => matches!(instruction.operand, Operand::Int32(_)),
                OperandKind::Token => matches!(instruction.operand, Operand::Token(_)),
            }
        };
        if !valid {
            return Err(malformed_error!(
                "Instruction {} ({}) has an operand incompatible with its opcode",
                index,
                opcode
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cil::decode_body;
    use crate::metadata::token::Token;
    use crate::Error;

    #[test]
    fn encode_simple_sequence() {
        let instructions = vec![
            Instruction::simple(Opcode::Ldarg0),
            Instruction::new(Opcode::Call, Operand::Token(Token::method_ref(3))),
            Instruction::simple(Opcode::Pop),
            Instruction::simple(Opcode::Ret),
        ];
        let body = encode_body(&instructions).unwrap();
        assert_eq!(body, [0x02, 0x28, 0x03, 0x00, 0x00, 0x0A, 0x26, 0x2A]);
    }

    #[test]
    fn round_trip_preserves_short_branches() {
        // brtrue.s over a nop, backward br.s loop at the end
        let body = [0x2D, 0x01, 0x00, 0x00, 0x2B, 0xFD, 0x2A];
        let instructions = decode_body(&body).unwrap();
        let encoded = encode_body(&instructions).unwrap();
        assert_eq!(encoded, body);
    }

    #[test]
    fn short_branch_widens_when_target_moves_out_of_range() {
        // br.s forward over 200 single-byte instructions cannot stay short
        let mut instructions = vec![Instruction::new(Opcode::BrS, Operand::Target(201))];
        for _ in 0..200 {
            instructions.push(Instruction::simple(Opcode::Nop));
        }
        instructions.push(Instruction::simple(Opcode::Ret));

        let body = encode_body(&instructions).unwrap();
        assert_eq!(body[0], Opcode::Br as u8);
        assert_eq!(body.len(), 5 + 200 + 1);

        // Displacement covers the 200 nops from the end of the widened branch
        let displacement = i32::from_le_bytes([body[1], body[2], body[3], body[4]]);
        assert_eq!(displacement, 200);

        let decoded = decode_body(&body).unwrap();
        assert_eq!(decoded[0].opcode, Opcode::Br);
        assert_eq!(decoded[0].operand, Operand::Target(201));
    }

    #[test]
    fn widening_cascades_to_other_branches() {
        // The first branch reaches its ret with displacement 127, exactly at
        // the short-form limit, but only while the second branch it jumps over
        // stays short. The second branch must widen for its own distant
        // target, which pushes the first out of range too.
        let mut instructions = vec![
            Instruction::new(Opcode::BrS, Operand::Target(127)),
            Instruction::new(Opcode::BrS, Operand::Target(258)),
        ];
        for _ in 0..125 {
            instructions.push(Instruction::simple(Opcode::Nop));
        }
        instructions.push(Instruction::simple(Opcode::Ret)); // index 127
        for _ in 0..130 {
            instructions.push(Instruction::simple(Opcode::Nop));
        }
        instructions.push(Instruction::simple(Opcode::Ret)); // index 258

        let body = encode_body(&instructions).unwrap();
        assert_eq!(body[0], Opcode::Br as u8);
        assert_eq!(body[5], Opcode::Br as u8);

        let decoded = decode_body(&body).unwrap();
        assert_eq!(decoded[0].operand, Operand::Target(127));
        assert_eq!(decoded[1].operand, Operand::Target(258));
    }

    #[test]
    fn long_branches_never_shrink() {
        let instructions = vec![
            Instruction::new(Opcode::Br, Operand::Target(1)),
            Instruction::simple(Opcode::Ret),
        ];
        let body = encode_body(&instructions).unwrap();
        assert_eq!(body, [0x38, 0x00, 0x00, 0x00, 0x00, 0x2A]);
    }

    #[test]
    fn mismatched_operand_rejected() {
        let missing_token = vec![Instruction::simple(Opcode::Call)];
        assert!(matches!(
            encode_body(&missing_token),
            Err(Error::Malformed { .. })
        ));

        let branch_without_target = vec![Instruction::new(Opcode::BrS, Operand::Int8(3))];
        assert!(matches!(
            encode_body(&branch_without_target),
            Err(Error::Malformed { .. })
        ));

        let target_out_of_range = vec![Instruction::new(Opcode::BrS, Operand::Target(9))];
        assert!(matches!(
            encode_body(&target_out_of_range),
            Err(Error::Malformed { .. })
        ));
    }

    #[test]
    fn immediates_round_trip() {
        let instructions = vec![
            Instruction::new(Opcode::LdcI4S, Operand::Int8(-100)),
            Instruction::new(Opcode::LdcI4, Operand::Int32(1 << 20)),
            Instruction::new(Opcode::LdargaS, Operand::UInt8(2)),
            Instruction::simple(Opcode::Add),
            Instruction::simple(Opcode::Ret),
        ];
        let body = encode_body(&instructions).unwrap();
        assert_eq!(decode_body(&body).unwrap(), instructions);
    }
}
