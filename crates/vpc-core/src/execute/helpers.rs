//! Operand resolution helpers.

use crate::isa::{OpCode, Operand};
use crate::state::RegisterFile;
use crate::Fault;

/// Resolves a register-or-immediate operand to its value.
#[must_use]
pub const fn operand_value(registers: &RegisterFile, operand: Operand) -> i64 {
    match operand {
        Operand::Register(register) => registers.get(register),
        Operand::Immediate(value) => value,
    }
}

/// Resolves a `STORE` address operand: a register is read for an indirect
/// address, an immediate is taken as the absolute address.
#[must_use]
pub const fn store_address(registers: &RegisterFile, operand: Operand) -> i64 {
    operand_value(registers, operand)
}

/// `lhs + rhs`, faulting on overflow.
pub fn checked_sum(op: OpCode, lhs: i64, rhs: i64) -> Result<i64, Fault> {
    lhs.checked_add(rhs).ok_or(Fault::Overflow { op })
}

/// `lhs - rhs`, faulting on overflow.
pub fn checked_difference(op: OpCode, lhs: i64, rhs: i64) -> Result<i64, Fault> {
    lhs.checked_sub(rhs).ok_or(Fault::Overflow { op })
}

#[cfg(test)]
mod tests {
    use super::{checked_difference, checked_sum, operand_value, store_address};
    use crate::isa::{OpCode, Operand};
    use crate::state::{Register, RegisterFile};
    use crate::Fault;

    #[test]
    fn register_operands_read_the_register_file() {
        let mut registers = RegisterFile::default();
        registers.set(Register::R5, 77);

        assert_eq!(operand_value(&registers, Operand::reg(Register::R5)), 77);
        assert_eq!(operand_value(&registers, Operand::imm(5)), 5);
    }

    #[test]
    fn store_address_is_indirect_for_registers_and_absolute_for_immediates() {
        let mut registers = RegisterFile::default();
        registers.set(Register::R0, 200);

        assert_eq!(store_address(&registers, Operand::reg(Register::R0)), 200);
        assert_eq!(store_address(&registers, Operand::imm(50)), 50);
    }

    #[test]
    fn arithmetic_overflow_is_a_fault() {
        assert_eq!(checked_sum(OpCode::Add, 10, 20), Ok(30));
        assert_eq!(
            checked_sum(OpCode::Add, i64::MAX, 1),
            Err(Fault::Overflow { op: OpCode::Add })
        );
        assert_eq!(checked_difference(OpCode::Sub, 5, 5), Ok(0));
        assert_eq!(
            checked_difference(OpCode::Sub, i64::MIN, 1),
            Err(Fault::Overflow { op: OpCode::Sub })
        );
    }
}
