//! Processor state record owned by the driver and transformed by the engine.

/// General-purpose register identifiers and the register file.
pub mod registers;
/// Processor lifecycle flag.
pub mod status;

pub use registers::{Register, RegisterFile, REGISTER_COUNT};
pub use status::Status;

use crate::program::Instruction;
use crate::thermal::{LOAD_TEMPERATURE, POWER_ON_TEMPERATURE};

/// Complete processor state for one cycle boundary.
///
/// The engine takes this by value and hands back the next state, so the
/// driver is the only owner between cycles.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ProcessorState {
    /// Index of the next instruction to fetch.
    pub program_counter: usize,
    /// Last fetched instruction, kept for display.
    pub instruction_register: Option<Instruction>,
    /// `R0..R7`.
    pub registers: RegisterFile,
    /// Result of the most recent comparison or subtraction.
    pub zero_flag: bool,
    /// Number of cycles executed since the last reset.
    pub cycle_count: u64,
    /// Cosmetic load gauge in degrees, kept within the thermal bounds.
    pub temperature: f64,
    /// Lifecycle flag.
    pub status: Status,
    /// Diagnostic for the fault that put the processor into `ERROR`.
    pub last_error: Option<String>,
}

impl Default for ProcessorState {
    fn default() -> Self {
        Self::power_on()
    }
}

impl ProcessorState {
    /// State right after power-on: zeroed registers, `IDLE`, cool core.
    #[must_use]
    pub const fn power_on() -> Self {
        Self::with_temperature(POWER_ON_TEMPERATURE)
    }

    /// State right after a program load. Identical to power-on except for the
    /// warmer starting temperature.
    #[must_use]
    pub const fn loaded() -> Self {
        Self::with_temperature(LOAD_TEMPERATURE)
    }

    const fn with_temperature(temperature: f64) -> Self {
        Self {
            program_counter: 0,
            instruction_register: None,
            registers: RegisterFile::from_values([0; REGISTER_COUNT]),
            zero_flag: false,
            cycle_count: 0,
            temperature,
            status: Status::Idle,
            last_error: None,
        }
    }

    /// Convenience accessor for a single register.
    #[must_use]
    pub const fn register(&self, reg: Register) -> i64 {
        self.registers.get(reg)
    }
}
