//! Canonical text form of instructions.
//!
//! The output is accepted back by the assembler, so a disassembled program
//! reassembles to the same instruction sequence.

use crate::isa::{OpCode, Operand};
use crate::program::Instruction;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single listing row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Instruction index (the value jump targets refer to).
    pub index: usize,
    /// Instruction id.
    pub id: String,
    /// Canonical assembly text, e.g. `ADD R0, R1`.
    pub text: String,
    /// The instruction's own description.
    pub description: String,
}

/// Formats an operation and its operands, e.g. `STORE R0, 50`.
#[must_use]
pub fn disassemble_parts(op: OpCode, args: &[Operand]) -> String {
    let operands = args
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    if operands.is_empty() {
        op.mnemonic().to_owned()
    } else {
        format!("{} {operands}", op.mnemonic())
    }
}

/// Formats one instruction.
#[must_use]
pub fn disassemble(instruction: &Instruction) -> String {
    disassemble_parts(instruction.op, &instruction.args)
}

/// Lists every instruction in order.
#[must_use]
pub fn listing(instructions: &[Instruction]) -> Vec<DisassemblyRow> {
    instructions
        .iter()
        .enumerate()
        .map(|(index, instruction)| DisassemblyRow {
            index,
            id: instruction.id.clone(),
            text: disassemble(instruction),
            description: instruction.description.clone(),
        })
        .collect()
}
