//! Address resolution for engine-visible memory accesses.

use thiserror::Error;

use super::map::MEMORY_SIZE;

/// An address fell outside the memory array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("address {address} is outside memory (0..{MEMORY_SIZE})")]
pub struct AccessViolation {
    /// The offending address as the program computed it.
    pub address: i64,
}

/// A cell list that cannot be a memory image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MemoryLayoutError {
    /// Wrong number of cells.
    #[error("memory image has {found} cells, expected {MEMORY_SIZE}")]
    Length {
        /// Cells supplied.
        found: usize,
    },
    /// A cell sits at the wrong position.
    #[error("cell {index} claims address {found}")]
    Address {
        /// Position in the list.
        index: usize,
        /// Address recorded on the cell.
        found: usize,
    },
}

/// Maps a register-sized address onto a cell index.
///
/// # Errors
///
/// Returns [`AccessViolation`] when `address` is negative or not below
/// [`MEMORY_SIZE`].
pub fn resolve(address: i64) -> Result<usize, AccessViolation> {
    usize::try_from(address)
        .ok()
        .filter(|index| *index < MEMORY_SIZE)
        .ok_or(AccessViolation { address })
}
