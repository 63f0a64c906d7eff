//! Instruction decoder.
//!
//! Validates operand count and addressing modes against the operation's
//! signature and produces a typed form the executor can match on without any
//! further checks. Nothing here touches processor state, so a decode fault is
//! always precise.

use crate::fault::Fault;
use crate::isa::{OpCode, Operand, OperandSlot};
use crate::program::Instruction;
use crate::state::Register;

/// Fully validated instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decoded {
    /// `MOV dst, value`.
    Mov {
        /// Destination register.
        dst: Register,
        /// Immediate value.
        value: i64,
    },
    /// `ADD dst, addend`.
    Add {
        /// Destination and left operand.
        dst: Register,
        /// Register or immediate addend.
        addend: Operand,
    },
    /// `SUB dst, src`.
    Sub {
        /// Destination and minuend.
        dst: Register,
        /// Subtrahend register.
        src: Register,
    },
    /// `CMP lhs, rhs`.
    Cmp {
        /// Left-hand register.
        lhs: Register,
        /// Register or immediate right-hand side.
        rhs: Operand,
    },
    /// `JMP target`.
    Jmp {
        /// Instruction index to fetch next.
        target: usize,
    },
    /// `JZ target`.
    Jz {
        /// Instruction index to fetch next when the zero flag is set.
        target: usize,
    },
    /// `LOAD dst, addr`.
    Load {
        /// Destination register.
        dst: Register,
        /// Register holding the address.
        addr: Register,
    },
    /// `STORE src, addr`.
    Store {
        /// Register whose value is written.
        src: Register,
        /// Address register (indirect) or absolute address.
        addr: Operand,
    },
    /// `PRINT src`.
    Print {
        /// Register to emit.
        src: Register,
    },
    /// `HALT`.
    Halt,
}

impl Decoded {
    /// Operation code of this instruction.
    #[must_use]
    pub const fn op(self) -> OpCode {
        match self {
            Self::Mov { .. } => OpCode::Mov,
            Self::Add { .. } => OpCode::Add,
            Self::Sub { .. } => OpCode::Sub,
            Self::Cmp { .. } => OpCode::Cmp,
            Self::Jmp { .. } => OpCode::Jmp,
            Self::Jz { .. } => OpCode::Jz,
            Self::Load { .. } => OpCode::Load,
            Self::Store { .. } => OpCode::Store,
            Self::Print { .. } => OpCode::Print,
            Self::Halt => OpCode::Halt,
        }
    }
}

/// Decodes `instruction` against its operation's signature.
///
/// # Errors
///
/// Returns [`Fault::OperandCount`] for a wrong arity, [`Fault::OperandKind`]
/// for an operand with the wrong addressing mode and
/// [`Fault::NegativeJumpTarget`] for a jump below index zero.
pub fn decode(instruction: &Instruction) -> Result<Decoded, Fault> {
    decode_parts(instruction.op, &instruction.args)
}

/// Decodes a bare operation and operand list.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_parts(op: OpCode, args: &[Operand]) -> Result<Decoded, Fault> {
    let signature = op.signature();
    if args.len() != signature.len() {
        return Err(Fault::OperandCount {
            op,
            expected: signature.len(),
            found: args.len(),
        });
    }

    for (index, (slot, operand)) in signature.iter().zip(args).enumerate() {
        if !slot.accepts(*operand) {
            return Err(Fault::OperandKind {
                op,
                position: index + 1,
                expected: *slot,
            });
        }
    }

    let decoded = match (op, args) {
        (OpCode::Mov, [Operand::Register(dst), Operand::Immediate(value)]) => Decoded::Mov {
            dst: *dst,
            value: *value,
        },
        (OpCode::Add, [Operand::Register(dst), addend]) => Decoded::Add {
            dst: *dst,
            addend: *addend,
        },
        (OpCode::Sub, [Operand::Register(dst), Operand::Register(src)]) => Decoded::Sub {
            dst: *dst,
            src: *src,
        },
        (OpCode::Cmp, [Operand::Register(lhs), rhs]) => Decoded::Cmp {
            lhs: *lhs,
            rhs: *rhs,
        },
        (OpCode::Jmp, [Operand::Immediate(target)]) => Decoded::Jmp {
            target: jump_target(op, *target)?,
        },
        (OpCode::Jz, [Operand::Immediate(target)]) => Decoded::Jz {
            target: jump_target(op, *target)?,
        },
        (OpCode::Load, [Operand::Register(dst), Operand::Register(addr)]) => Decoded::Load {
            dst: *dst,
            addr: *addr,
        },
        (OpCode::Store, [Operand::Register(src), addr]) => Decoded::Store {
            src: *src,
            addr: *addr,
        },
        (OpCode::Print, [Operand::Register(src)]) => Decoded::Print { src: *src },
        (OpCode::Halt, []) => Decoded::Halt,
        // Unreachable once the signature checks above have passed.
        _ => {
            return Err(Fault::OperandKind {
                op,
                position: 1,
                expected: signature.first().copied().unwrap_or(OperandSlot::Register),
            })
        }
    };

    Ok(decoded)
}

fn jump_target(op: OpCode, target: i64) -> Result<usize, Fault> {
    if target < 0 {
        return Err(Fault::NegativeJumpTarget { op, target });
    }
    Ok(usize::try_from(target).unwrap_or(usize::MAX))
}
