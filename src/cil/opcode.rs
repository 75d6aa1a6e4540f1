//! Opcode definitions for the supported CIL subset.
//!
//! Injection only needs to decode, retarget, and re-encode the instruction
//! kinds that appear in splice preludes and around return sites, so the
//! supported set is deliberately small: argument and local loads, constants,
//! stack manipulation, calls, returns, and branches in both their short and
//! long forms. Any byte outside this set fails decoding with a malformed
//! error rather than being carried opaquely, since unrecognized instructions
//! have unknown lengths and would corrupt branch retargeting.

use std::fmt;

use strum::{EnumCount, EnumIter, IntoEnumIterator};

/// What follows an opcode byte in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand bytes
    None,
    /// Unsigned 8-bit slot index
    U8,
    /// Signed 8-bit immediate or branch displacement
    I8,
    /// Signed 32-bit immediate or branch displacement
    I32,
    /// 32-bit row reference
    Token,
}

/// A CIL opcode from the supported subset.
///
/// Discriminants are the actual encoding bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, EnumCount)]
#[repr(u8)]
pub enum Opcode {
    /// No operation
    Nop = 0x00,
    /// Load argument 0 (the receiver for instance methods)
    Ldarg0 = 0x02,
    /// Load argument 1
    Ldarg1 = 0x03,
    /// Load argument 2
    Ldarg2 = 0x04,
    /// Load argument 3
    Ldarg3 = 0x05,
    /// Load local 0
    Ldloc0 = 0x06,
    /// Load local 1
    Ldloc1 = 0x07,
    /// Load local 2
    Ldloc2 = 0x08,
    /// Load local 3
    Ldloc3 = 0x09,
    /// Store local 0
    Stloc0 = 0x0A,
    /// Store local 1
    Stloc1 = 0x0B,
    /// Store local 2
    Stloc2 = 0x0C,
    /// Store local 3
    Stloc3 = 0x0D,
    /// Load argument by 8-bit index
    LdargS = 0x0E,
    /// Load argument address by 8-bit index
    LdargaS = 0x0F,
    /// Push 8-bit constant, sign-extended
    LdcI4S = 0x1F,
    /// Push 32-bit constant
    LdcI4 = 0x20,
    /// Duplicate the top stack value
    Dup = 0x25,
    /// Discard the top stack value
    Pop = 0x26,
    /// Call the method named by the token operand
    Call = 0x28,
    /// Return from the current method
    Ret = 0x2A,
    /// Unconditional branch, 8-bit displacement
    BrS = 0x2B,
    /// Branch if false, 8-bit displacement
    BrfalseS = 0x2C,
    /// Branch if true, 8-bit displacement
    BrtrueS = 0x2D,
    /// Unconditional branch, 32-bit displacement
    Br = 0x38,
    /// Branch if false, 32-bit displacement
    Brfalse = 0x39,
    /// Branch if true, 32-bit displacement
    Brtrue = 0x3A,
    /// Add the two top stack values
    Add = 0x58,
    /// Virtual call through the token operand
    Callvirt = 0x6F,
}

impl Opcode {
    /// Decodes an encoding byte into an opcode from the supported subset.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        Self::iter().find(|opcode| *opcode as u8 == byte)
    }

    /// The operand layout following this opcode byte.
    #[must_use]
    pub fn operand_kind(self) -> OperandKind {
        match self {
            Opcode::LdargS | Opcode::LdargaS => OperandKind::U8,
            Opcode::LdcI4S | Opcode::BrS | Opcode::BrfalseS | Opcode::BrtrueS => OperandKind::I8,
            Opcode::LdcI4 | Opcode::Br | Opcode::Brfalse | Opcode::Brtrue => OperandKind::I32,
            Opcode::Call | Opcode::Callvirt => OperandKind::Token,
            _ => OperandKind::None,
        }
    }

    /// Returns `true` for branch instructions in either displacement width.
    #[must_use]
    pub fn is_branch(self) -> bool {
        matches!(
            self,
            Opcode::BrS
                | Opcode::BrfalseS
                | Opcode::BrtrueS
                | Opcode::Br
                | Opcode::Brfalse
                | Opcode::Brtrue
        )
    }

    /// Returns `true` for call instructions carrying a method token.
    #[must_use]
    pub fn is_call(self) -> bool {
        matches!(self, Opcode::Call | Opcode::Callvirt)
    }

    /// Widens a short-form branch to its 32-bit displacement counterpart.
    /// Non-branch opcodes and branches already in long form are unchanged.
    #[must_use]
    pub fn widened(self) -> Self {
        match self {
            Opcode::BrS => Opcode::Br,
            Opcode::BrfalseS => Opcode::Brfalse,
            Opcode::BrtrueS => Opcode::Brtrue,
            other => other,
        }
    }

    /// The assembler mnemonic.
    #[must_use]
    pub fn mnemonic(self) -> &'static str {
        match self {
            Opcode::Nop => "nop",
            Opcode::Ldarg0 => "ldarg.0",
            Opcode::Ldarg1 => "ldarg.1",
            Opcode::Ldarg2 => "ldarg.2",
            Opcode::Ldarg3 => "ldarg.3",
            Opcode::Ldloc0 => "ldloc.0",
            Opcode::Ldloc1 => "ldloc.1",
            Opcode::Ldloc2 => "ldloc.2",
            Opcode::Ldloc3 => "ldloc.3",
            Opcode::Stloc0 => "stloc.0",
            Opcode::Stloc1 => "stloc.1",
            Opcode::Stloc2 => "stloc.2",
            Opcode::Stloc3 => "stloc.3",
            Opcode::LdargS => "ldarg.s",
            Opcode::LdargaS => "ldarga.s",
            Opcode::LdcI4S => "ldc.i4.s",
            Opcode::LdcI4 => "ldc.i4",
            Opcode::Dup => "dup",
            Opcode::Pop => "pop",
            Opcode::Call => "call",
            Opcode::Ret => "ret",
            Opcode::BrS => "br.s",
            Opcode::BrfalseS => "brfalse.s",
            Opcode::BrtrueS => "brtrue.s",
            Opcode::Br => "br",
            Opcode::Brfalse => "brfalse",
            Opcode::Brtrue => "brtrue",
            Opcode::Add => "add",
            Opcode::Callvirt => "callvirt",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
