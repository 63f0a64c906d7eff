//! Closed operation set and operand addressing model.

use std::fmt;

use crate::state::Register;

/// Operation code of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum OpCode {
    /// Load an immediate into a register.
    Mov,
    /// Add a register or immediate into a register.
    Add,
    /// Subtract a register from a register, updating the zero flag.
    Sub,
    /// Compare a register against a register or immediate.
    Cmp,
    /// Unconditional jump.
    Jmp,
    /// Jump when the zero flag is set.
    Jz,
    /// Read memory through an address register.
    Load,
    /// Write memory through an address register or absolute address.
    Store,
    /// Stop execution.
    Halt,
    /// Emit a register value on the output channel.
    Print,
}

/// Kind of operand an instruction slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OperandSlot {
    /// Must name a register.
    Register,
    /// Must be an immediate value.
    Immediate,
    /// Register or immediate, chosen when the program is written.
    RegisterOrImmediate,
    /// Non-negative immediate instruction index.
    Target,
}

impl OperandSlot {
    /// Returns `true` when `operand` fits this slot's addressing mode.
    ///
    /// Target slots only check the kind; the sign is checked by the decoder.
    #[must_use]
    pub const fn accepts(self, operand: Operand) -> bool {
        matches!(
            (self, operand),
            (Self::Register | Self::RegisterOrImmediate, Operand::Register(_))
                | (
                    Self::Immediate | Self::RegisterOrImmediate | Self::Target,
                    Operand::Immediate(_)
                )
        )
    }
}

impl fmt::Display for OperandSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Register => "register",
            Self::Immediate => "immediate",
            Self::RegisterOrImmediate => "register or immediate",
            Self::Target => "jump target",
        };
        f.write_str(label)
    }
}

impl OpCode {
    /// Every operation in table order.
    pub const ALL: [Self; 10] = [
        Self::Mov,
        Self::Add,
        Self::Sub,
        Self::Cmp,
        Self::Jmp,
        Self::Jz,
        Self::Load,
        Self::Store,
        Self::Halt,
        Self::Print,
    ];

    /// Assembly mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Mov => "MOV",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Cmp => "CMP",
            Self::Jmp => "JMP",
            Self::Jz => "JZ",
            Self::Load => "LOAD",
            Self::Store => "STORE",
            Self::Halt => "HALT",
            Self::Print => "PRINT",
        }
    }

    /// Case-insensitive mnemonic lookup.
    #[must_use]
    pub fn from_mnemonic(text: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(text))
    }

    /// Operand slots, in order.
    #[must_use]
    pub const fn signature(self) -> &'static [OperandSlot] {
        use OperandSlot::{Immediate, Register, RegisterOrImmediate, Target};
        match self {
            Self::Mov => &[Register, Immediate],
            Self::Add | Self::Cmp | Self::Store => &[Register, RegisterOrImmediate],
            Self::Sub | Self::Load => &[Register, Register],
            Self::Jmp | Self::Jz => &[Target],
            Self::Print => &[Register],
            Self::Halt => &[],
        }
    }

    /// Returns `true` for operations that may write the program counter.
    #[must_use]
    pub const fn is_jump(self) -> bool {
        matches!(self, Self::Jmp | Self::Jz)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// Explicitly tagged operand.
///
/// The addressing mode is fixed when the program is written, so an immediate
/// `5` can never be mistaken for `R5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operand {
    /// Register operand.
    Register(Register),
    /// Immediate operand.
    Immediate(i64),
}

impl Operand {
    /// Short form for an immediate operand.
    #[must_use]
    pub const fn imm(value: i64) -> Self {
        Self::Immediate(value)
    }

    /// Short form for a register operand.
    #[must_use]
    pub const fn reg(register: Register) -> Self {
        Self::Register(register)
    }
}

impl From<Register> for Operand {
    fn from(register: Register) -> Self {
        Self::Register(register)
    }
}

impl From<i64> for Operand {
    fn from(value: i64) -> Self {
        Self::Immediate(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(register) => write!(f, "{register}"),
            Self::Immediate(value) => write!(f, "{value}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{OpCode, Operand, OperandSlot};
    use crate::state::Register;

    #[test]
    fn mnemonic_lookup_roundtrips_and_ignores_case() {
        for op in OpCode::ALL {
            assert_eq!(OpCode::from_mnemonic(op.mnemonic()), Some(op));
            assert_eq!(
                OpCode::from_mnemonic(&op.mnemonic().to_ascii_lowercase()),
                Some(op)
            );
        }
        assert_eq!(OpCode::from_mnemonic("NOP"), None);
    }

    #[test]
    fn signature_table_matches_operand_counts() {
        assert_eq!(OpCode::Mov.signature().len(), 2);
        assert_eq!(OpCode::Add.signature().len(), 2);
        assert_eq!(OpCode::Sub.signature().len(), 2);
        assert_eq!(OpCode::Cmp.signature().len(), 2);
        assert_eq!(OpCode::Jmp.signature().len(), 1);
        assert_eq!(OpCode::Jz.signature().len(), 1);
        assert_eq!(OpCode::Load.signature().len(), 2);
        assert_eq!(OpCode::Store.signature().len(), 2);
        assert_eq!(OpCode::Print.signature().len(), 1);
        assert!(OpCode::Halt.signature().is_empty());
    }

    #[test]
    fn slots_accept_only_their_addressing_mode() {
        let reg = Operand::reg(Register::R5);
        let imm = Operand::imm(5);

        assert!(OperandSlot::Register.accepts(reg));
        assert!(!OperandSlot::Register.accepts(imm));
        assert!(OperandSlot::Immediate.accepts(imm));
        assert!(!OperandSlot::Immediate.accepts(reg));
        assert!(OperandSlot::RegisterOrImmediate.accepts(reg));
        assert!(OperandSlot::RegisterOrImmediate.accepts(imm));
        assert!(OperandSlot::Target.accepts(imm));
        assert!(!OperandSlot::Target.accepts(reg));
    }

    #[test]
    fn operands_display_in_assembly_form() {
        assert_eq!(Operand::reg(Register::R3).to_string(), "R3");
        assert_eq!(Operand::imm(-12).to_string(), "-12");
    }
}
