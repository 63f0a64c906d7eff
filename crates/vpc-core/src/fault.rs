use thiserror::Error;

use crate::isa::{OpCode, OperandSlot};

/// Where in the cycle a fatal fault was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// The instruction is malformed for its operation.
    Decode,
    /// The instruction was well formed but could not complete.
    Execute,
}

/// Fatal faults. Any of these moves the processor to `ERROR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// Wrong number of operands for the operation.
    #[error("{op} expects {expected} operand(s), found {found}")]
    OperandCount {
        /// Faulting operation.
        op: OpCode,
        /// Operand count from the signature table.
        expected: usize,
        /// Operand count on the instruction.
        found: usize,
    },
    /// Operand addressing mode does not fit the slot.
    #[error("{op} operand {position} must be a {expected}")]
    OperandKind {
        /// Faulting operation.
        op: OpCode,
        /// 1-based operand position.
        position: usize,
        /// What the slot accepts.
        expected: OperandSlot,
    },
    /// Jump target below zero.
    #[error("{op} target {target} is negative")]
    NegativeJumpTarget {
        /// Faulting operation.
        op: OpCode,
        /// Offending target.
        target: i64,
    },
    /// Arithmetic result does not fit a register.
    #[error("arithmetic overflow in {op}")]
    Overflow {
        /// Faulting operation.
        op: OpCode,
    },
}

impl Fault {
    /// Returns the phase that raised this fault.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::OperandCount { .. }
            | Self::OperandKind { .. }
            | Self::NegativeJumpTarget { .. } => FaultClass::Decode,
            Self::Overflow { .. } => FaultClass::Execute,
        }
    }

    /// Operation that raised this fault.
    #[must_use]
    pub const fn op(self) -> OpCode {
        match self {
            Self::OperandCount { op, .. }
            | Self::OperandKind { op, .. }
            | Self::NegativeJumpTarget { op, .. }
            | Self::Overflow { op } => op,
        }
    }
}
