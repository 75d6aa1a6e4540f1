//! CIL instruction decoding and encoding for method body splicing.
//!
//! This module materializes raw body bytes into an instruction list the
//! injection executor can splice into, and serializes the result back. The
//! two directions are deliberately asymmetric about branches:
//!
//! - **Decoding** resolves every branch displacement to the *index* of its
//!   target instruction, so splices can insert and remove instructions
//!   without byte-offset bookkeeping.
//! - **Encoding** recomputes displacements from instruction indices, widening
//!   short-form branches to their 32-bit counterparts when an inserted splice
//!   pushes a target out of 8-bit range.
//!
//! # Key Types
//! - [`Instruction`] - A decoded instruction with its typed operand
//! - [`Operand`] - Immediates, slot indices, branch targets, call tokens
//! - [`Opcode`] - The supported opcode subset
//!
//! # Example
//!
//! ```rust
//! use dotsplice::cil::{decode_body, encode_body, Opcode, Operand};
//!
//! let body = [0x00, 0x2C, 0x01, 0x00, 0x2A]; // nop; brfalse.s ->ret; nop; ret
//! let instructions = decode_body(&body)?;
//!
//! assert_eq!(instructions[1].opcode, Opcode::BrfalseS);
//! assert_eq!(instructions[1].operand, Operand::Target(3));
//!
//! let encoded = encode_body(&instructions)?;
//! assert_eq!(encoded, body);
//! # Ok::<(), dotsplice::Error>(())
//! ```

mod decoder;
mod encoder;
/// Opcode table for the supported instruction subset
pub mod opcode;

pub use decoder::decode_body;
pub use encoder::encode_body;
pub use opcode::{Opcode, OperandKind};

use std::fmt;

use crate::metadata::token::Token;

/// A decoded instruction operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    /// No operand
    None,
    /// Unsigned 8-bit slot index
    UInt8(u8),
    /// Signed 8-bit constant
    Int8(i8),
    /// Signed 32-bit constant
    Int32(i32),
    /// Branch target as an index into the instruction list
    Target(usize),
    /// Method token for call instructions
    Token(Token),
}

/// A single decoded CIL instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// The opcode
    pub opcode: Opcode,
    /// The typed operand, [`Operand::None`] for bare opcodes
    pub operand: Operand,
}

impl Instruction {
    /// Creates an instruction with an operand.
    #[must_use]
    pub fn new(opcode: Opcode, operand: Operand) -> Self {
        Instruction { opcode, operand }
    }

    /// Creates an instruction without an operand.
    #[must_use]
    pub fn simple(opcode: Opcode) -> Self {
        Instruction {
            opcode,
            operand: Operand::None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.operand {
            Operand::None => write!(f, "{}", self.opcode),
            Operand::UInt8(value) => write!(f, "{} {}", self.opcode, value),
            Operand::Int8(value) => write!(f, "{} {}", self.opcode, value),
            Operand::Int32(value) => write!(f, "{} {}", self.opcode, value),
            Operand::Target(index) => write!(f, "{} -> {}", self.opcode, index),
            Operand::Token(token) => write!(f, "{} {}", self.opcode, token),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(Instruction::simple(Opcode::Ret).to_string(), "ret");
        assert_eq!(
            Instruction::new(Opcode::LdargS, Operand::UInt8(4)).to_string(),
            "ldarg.s 4"
        );
        assert_eq!(
            Instruction::new(Opcode::BrS, Operand::Target(7)).to_string(),
            "br.s -> 7"
        );
        assert_eq!(
            Instruction::new(Opcode::Call, Operand::Token(Token::method_ref(1))).to_string(),
            "call 0x0a000001"
        );
    }
}
