//! Flat cell memory with last-access stamps.

/// Address resolution and access errors.
pub mod access;
/// Fixed layout, region map and boot image constants.
pub mod map;

pub use access::{resolve, AccessViolation, MemoryLayoutError};
pub use map::{
    region_of, MemoryRegion, BOOT_NOISE_WRITES, KERNEL_STACK_END, KERNEL_STACK_START,
    MEMORY_SIZE, NOISE_VALUE_BOUND, PLANTED_CELLS, VIDEO_END, VIDEO_START,
};

use crate::entropy::Entropy;

/// One addressable memory cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MemoryCell {
    /// Index of this cell, fixed at construction.
    pub address: usize,
    /// Stored value. Conceptually a byte, not enforced.
    pub value: i64,
    /// Cycle count of the last access that touched this cell.
    pub last_access_tick: u64,
}

/// Fixed-length memory array.
///
/// Cells are never added or removed; only their value and access stamp change.
/// Always [`MEMORY_SIZE`] cells, cell `i` at address `i`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(try_from = "MemoryImage"))]
pub struct Memory {
    cells: Box<[MemoryCell]>,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct MemoryImage {
    cells: Vec<MemoryCell>,
}

#[cfg(feature = "serde")]
impl TryFrom<MemoryImage> for Memory {
    type Error = MemoryLayoutError;

    fn try_from(image: MemoryImage) -> Result<Self, Self::Error> {
        Self::try_from(image.cells)
    }
}

impl TryFrom<Vec<MemoryCell>> for Memory {
    type Error = MemoryLayoutError;

    /// Accepts exactly [`MEMORY_SIZE`] cells in address order.
    fn try_from(cells: Vec<MemoryCell>) -> Result<Self, Self::Error> {
        if cells.len() != MEMORY_SIZE {
            return Err(MemoryLayoutError::Length { found: cells.len() });
        }
        if let Some((index, cell)) = cells
            .iter()
            .enumerate()
            .find(|(index, cell)| cell.address != *index)
        {
            return Err(MemoryLayoutError::Address {
                index,
                found: cell.address,
            });
        }
        Ok(Self {
            cells: cells.into_boxed_slice(),
        })
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Memory {
    /// All cells zero and never accessed.
    #[must_use]
    pub fn zeroed() -> Self {
        let cells = (0..MEMORY_SIZE)
            .map(|address| MemoryCell {
                address,
                value: 0,
                last_access_tick: 0,
            })
            .collect();
        Self { cells }
    }

    /// Boot image: random noise followed by the planted demo values.
    #[must_use]
    pub fn boot(entropy: &mut Entropy) -> Self {
        let mut memory = Self::zeroed();
        for _ in 0..BOOT_NOISE_WRITES {
            let index = entropy.below(MEMORY_SIZE);
            memory.cells[index].value = random_value(entropy);
        }
        for (index, value) in PLANTED_CELLS {
            memory.cells[index].value = value;
        }
        memory
    }

    /// Number of cells. Always [`MEMORY_SIZE`].
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// All cells in address order.
    #[must_use]
    pub fn cells(&self) -> &[MemoryCell] {
        &self.cells
    }

    /// Looks up a cell without touching its access stamp.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&MemoryCell> {
        self.cells.get(index)
    }

    pub(crate) fn cell_mut(&mut self, index: usize) -> Option<&mut MemoryCell> {
        self.cells.get_mut(index)
    }

    /// Writes `value` at `address` and stamps the cell with `tick`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessViolation`] for addresses outside the array. Memory is
    /// left untouched in that case.
    pub fn write(&mut self, address: i64, value: i64, tick: u64) -> Result<(), AccessViolation> {
        let cell = &mut self.cells[resolve(address)?];
        cell.value = value;
        cell.last_access_tick = tick;
        Ok(())
    }

    /// Scribbles random values over `count` random cells of `region`.
    ///
    /// Used by the ambient activity simulator; engine code never calls this.
    pub fn scribble(
        &mut self,
        region: MemoryRegion,
        count: usize,
        entropy: &mut Entropy,
        tick: u64,
    ) {
        let (start, _) = region.bounds();
        for _ in 0..count {
            let index = start + entropy.below(region.size());
            let value = random_value(entropy);
            let cell = &mut self.cells[index];
            cell.value = value;
            cell.last_access_tick = tick;
        }
    }
}

fn random_value(entropy: &mut Entropy) -> i64 {
    i64::try_from(entropy.below(NOISE_VALUE_BOUND)).unwrap_or_default()
}
