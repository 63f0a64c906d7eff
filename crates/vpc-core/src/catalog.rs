//! Built-in demo programs.
//!
//! Jump targets are 0-based instruction indices.

use crate::isa::{OpCode, Operand};
use crate::program::{Instruction, Program};
use crate::state::Register;

const fn r(register: Register) -> Operand {
    Operand::Register(register)
}

const fn imm(value: i64) -> Operand {
    Operand::Immediate(value)
}

fn build(rows: Vec<(OpCode, Vec<Operand>, &str)>) -> Vec<Instruction> {
    rows.into_iter()
        .enumerate()
        .map(|(index, (op, args, description))| {
            Instruction::new((index + 1).to_string(), op, args, description)
        })
        .collect()
}

/// Adds 10 and 20, stores the sum at `MEM[50]` and prints it.
#[must_use]
pub fn addition() -> Program {
    use Register::{R0, R1};
    Program::new(
        "Addition",
        "Simple Add & Store",
        build(vec![
            (OpCode::Mov, vec![r(R0), imm(10)], "MOV R0, 10"),
            (OpCode::Mov, vec![r(R1), imm(20)], "MOV R1, 20"),
            (OpCode::Add, vec![r(R0), r(R1)], "ADD R0, R1"),
            (OpCode::Store, vec![r(R0), imm(50)], "STORE R0 -> MEM[50]"),
            (OpCode::Print, vec![r(R0)], "PRINT R0"),
            (OpCode::Halt, vec![], "HALT"),
        ]),
    )
}

/// Scans `MEM[100..105)` for the value 99 and prints the address of the first hit.
#[must_use]
pub fn search() -> Program {
    use Register::{R0, R1, R2, R3};
    Program::new(
        "Search",
        "Find 99 in RAM",
        build(vec![
            (OpCode::Mov, vec![r(R0), imm(100)], "MOV R0, 100 (start)"),
            (OpCode::Mov, vec![r(R1), imm(99)], "MOV R1, 99 (target)"),
            (OpCode::Mov, vec![r(R3), imm(1)], "MOV R3, 1 (step)"),
            (OpCode::Load, vec![r(R2), r(R0)], "LOAD R2 <- MEM[R0]"),
            (OpCode::Cmp, vec![r(R2), r(R1)], "CMP R2, R1"),
            (OpCode::Jz, vec![imm(10)], "JZ -> found"),
            (OpCode::Add, vec![r(R0), r(R3)], "ADD R0, R3 (next)"),
            (OpCode::Cmp, vec![r(R0), imm(105)], "CMP R0, 105 (end)"),
            (OpCode::Jz, vec![imm(11)], "JZ -> not found"),
            (OpCode::Jmp, vec![imm(3)], "JMP -> loop"),
            (OpCode::Print, vec![r(R0)], "PRINT R0 (found at)"),
            (OpCode::Halt, vec![], "HALT"),
        ]),
    )
}

/// Loads `MEM[200]` and `MEM[201]`, swaps them unless equal and prints.
#[must_use]
pub fn sorting() -> Program {
    use Register::{R0, R1, R2, R3};
    Program::new(
        "Sorting",
        "Compare & Swap",
        build(vec![
            (OpCode::Mov, vec![r(R0), imm(200)], "MOV R0, 200 (addr A)"),
            (OpCode::Mov, vec![r(R1), imm(201)], "MOV R1, 201 (addr B)"),
            (OpCode::Load, vec![r(R2), r(R0)], "LOAD R2 <- MEM[200]"),
            (OpCode::Load, vec![r(R3), r(R1)], "LOAD R3 <- MEM[201]"),
            (OpCode::Cmp, vec![r(R2), r(R3)], "CMP R2, R3"),
            (OpCode::Jz, vec![imm(9)], "JZ -> skip swap"),
            (OpCode::Store, vec![r(R3), r(R0)], "STORE R3 -> MEM[200]"),
            (OpCode::Store, vec![r(R2), r(R1)], "STORE R2 -> MEM[201]"),
            (OpCode::Print, vec![r(R2)], "PRINT R2 (swapped)"),
            (OpCode::Halt, vec![], "HALT"),
        ]),
    )
}

/// Every built-in program.
#[must_use]
pub fn programs() -> Vec<Program> {
    vec![addition(), search(), sorting()]
}

/// Case-insensitive lookup by program name.
#[must_use]
pub fn find(name: &str) -> Option<Program> {
    programs()
        .into_iter()
        .find(|program| program.name().eq_ignore_ascii_case(name))
}
