//! Deferred zero-flag and program-counter updates.

/// How the zero flag changes when an instruction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FlagsUpdate {
    /// Leave the flag alone.
    #[default]
    Keep,
    /// Overwrite the flag.
    Set(bool),
}

impl FlagsUpdate {
    /// Applies the update to `zero_flag`.
    #[must_use]
    pub const fn apply(self, zero_flag: bool) -> bool {
        match self {
            Self::Keep => zero_flag,
            Self::Set(value) => value,
        }
    }
}

/// How the program counter moves when an instruction commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PcUpdate {
    /// Fall through to the next instruction while still running.
    #[default]
    Advance,
    /// Fetch from `target` next. The advance is skipped.
    Jump(usize),
}
