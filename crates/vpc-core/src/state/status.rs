use std::fmt;

/// Lifecycle flag of the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum Status {
    /// Powered and loaded, not currently scheduled.
    #[default]
    Idle,
    /// Being stepped by the driver.
    Running,
    /// Executed `HALT` or ran past the last instruction.
    Halted,
    /// A fatal fault stopped execution; see `last_error`.
    Error,
}

impl Status {
    /// `HALTED` and `ERROR` are terminal until the next program load.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Halted | Self::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "IDLE",
            Self::Running => "RUNNING",
            Self::Halted => "HALTED",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}
