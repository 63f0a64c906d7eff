//! Fixed memory layout: size, named regions and the boot image.

/// Number of cells in the flat memory array.
pub const MEMORY_SIZE: usize = 1024;

/// Inclusive start of the kernel stack region.
pub const KERNEL_STACK_START: usize = 0;
/// Exclusive end of the kernel stack region.
pub const KERNEL_STACK_END: usize = 50;
/// Inclusive start of the video memory region.
pub const VIDEO_START: usize = 800;
/// Exclusive end of the video memory region.
pub const VIDEO_END: usize = 950;

/// Number of random noise writes applied when memory boots.
pub const BOOT_NOISE_WRITES: usize = 50;
/// Exclusive upper bound of randomly generated cell values.
pub const NOISE_VALUE_BOUND: usize = 255;

/// Values planted at boot so the demo programs have data to work on.
pub const PLANTED_CELLS: [(usize, i64); 4] = [(99, 99), (103, 99), (200, 45), (201, 12)];

/// Named region used by the ambient activity simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    /// Kernel stack (`0..50`).
    KernelStack,
    /// Video memory (`800..950`).
    Video,
}

impl MemoryRegion {
    /// Returns the `[start, end)` bounds for this region.
    #[must_use]
    pub const fn bounds(self) -> (usize, usize) {
        match self {
            Self::KernelStack => (KERNEL_STACK_START, KERNEL_STACK_END),
            Self::Video => (VIDEO_START, VIDEO_END),
        }
    }

    /// Number of cells in this region.
    #[must_use]
    pub const fn size(self) -> usize {
        let (start, end) = self.bounds();
        end - start
    }

    /// Returns `true` when `addr` belongs to this region.
    #[must_use]
    pub const fn contains(self, addr: usize) -> bool {
        let (start, end) = self.bounds();
        addr >= start && addr < end
    }
}

/// Decodes an address into its named region, if it has one.
#[must_use]
pub const fn region_of(addr: usize) -> Option<MemoryRegion> {
    if MemoryRegion::KernelStack.contains(addr) {
        Some(MemoryRegion::KernelStack)
    } else if MemoryRegion::Video.contains(addr) {
        Some(MemoryRegion::Video)
    } else {
        None
    }
}
