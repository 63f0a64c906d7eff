use std::fmt;

/// Number of general-purpose registers (`R0..R7`).
pub const REGISTER_COUNT: usize = 8;

/// General-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Register {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl Register {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the register file index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Maps a register file index back to a register.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::R0),
            1 => Some(Self::R1),
            2 => Some(Self::R2),
            3 => Some(Self::R3),
            4 => Some(Self::R4),
            5 => Some(Self::R5),
            6 => Some(Self::R6),
            7 => Some(Self::R7),
            _ => None,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// Fixed-size register file. The length is part of the type, so it can never
/// hold anything other than eight values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile([i64; REGISTER_COUNT]);

impl RegisterFile {
    /// Builds a register file from explicit values.
    #[must_use]
    pub const fn from_values(values: [i64; REGISTER_COUNT]) -> Self {
        Self(values)
    }

    /// Reads a register.
    #[must_use]
    pub const fn get(&self, reg: Register) -> i64 {
        self.0[reg.index()]
    }

    /// Writes a register.
    pub const fn set(&mut self, reg: Register, value: i64) {
        self.0[reg.index()] = value;
    }

    /// Returns every register value in `R0..R7` order.
    #[must_use]
    pub const fn values(&self) -> &[i64; REGISTER_COUNT] {
        &self.0
    }
}
