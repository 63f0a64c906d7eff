//! Immutable instructions and named programs.

use crate::disasm::disassemble_parts;
use crate::isa::{OpCode, Operand};

/// One program instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Instruction {
    /// Opaque identity, used only to correlate with a listing.
    pub id: String,
    /// Operation code.
    pub op: OpCode,
    /// Operands in slot order.
    pub args: Vec<Operand>,
    /// Display text.
    pub description: String,
}

impl Instruction {
    /// Builds an instruction with an explicit description.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        op: OpCode,
        args: Vec<Operand>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            op,
            args,
            description: description.into(),
        }
    }

    /// Builds an instruction whose description is its canonical disassembly.
    #[must_use]
    pub fn described(id: impl Into<String>, op: OpCode, args: Vec<Operand>) -> Self {
        let description = disassemble_parts(op, &args);
        Self::new(id, op, args, description)
    }
}

/// Immutable named instruction sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Program {
    name: String,
    description: String,
    instructions: Vec<Instruction>,
}

impl Program {
    /// Creates a program.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        instructions: Vec<Instruction>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions,
        }
    }

    /// Program name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// One-line summary.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Instructions in execution order.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns `true` for a program with no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}
