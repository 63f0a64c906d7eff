//! Host-facing contract of the engine: configuration, step I/O, outcomes and
//! the trace channel.

use std::fmt;

use crate::fault::Fault;
use crate::memory::Memory;
use crate::state::{ProcessorState, Register};
use crate::thermal::HeatSource;

/// What the engine does with a `STORE` whose address is out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum StoreMissPolicy {
    /// Drop the write without a trace line.
    #[default]
    Drop,
    /// Drop the write and emit the same `SegFault` line `LOAD` does.
    Log,
}

/// Engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Out-of-range `STORE` handling.
    pub store_miss: StoreMissPolicy,
}

/// Observable trace line emitted while executing one instruction.
///
/// `Display` renders the exact human-readable line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum TraceEvent {
    /// `MOV` assigned a register.
    Move {
        /// Destination register.
        dst: Register,
        /// Assigned value.
        value: i64,
    },
    /// `ADD` produced a sum.
    Add {
        /// Destination register.
        dst: Register,
        /// Prior destination value.
        lhs: i64,
        /// Resolved addend.
        rhs: i64,
        /// Sum written back.
        result: i64,
    },
    /// `CMP` updated the zero flag.
    Compare {
        /// Left-hand register.
        lhs: Register,
        /// Left-hand value.
        lhs_value: i64,
        /// Resolved right-hand value.
        rhs_value: i64,
        /// New zero flag.
        zero_flag: bool,
    },
    /// `JMP` redirected fetch.
    Jump {
        /// New program counter.
        target: usize,
    },
    /// `JZ` found the zero flag set and redirected fetch.
    BranchTaken {
        /// New program counter.
        target: usize,
    },
    /// `LOAD` read a cell.
    Load {
        /// Destination register.
        dst: Register,
        /// Cell index.
        addr: usize,
        /// Value read.
        value: i64,
    },
    /// A memory access missed the array.
    SegFault {
        /// Address as computed by the program.
        addr: i64,
    },
    /// `STORE` wrote a cell.
    Store {
        /// Cell index.
        addr: usize,
        /// Source register.
        src: Register,
        /// Value written.
        value: i64,
    },
    /// `PRINT` output.
    Output {
        /// Printed value.
        value: i64,
    },
    /// `HALT` executed.
    Halted,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Move { dst, value } => write!(f, "MOV: {dst} set to {value}"),
            Self::Add {
                dst,
                lhs,
                rhs,
                result,
            } => write!(f, "ADD: {dst} = {lhs} + {rhs} => {result}"),
            Self::Compare {
                lhs,
                lhs_value,
                rhs_value,
                zero_flag,
            } => write!(f, "CMP: {lhs}({lhs_value}) vs {rhs_value} -> ZeroFlag: {zero_flag}"),
            Self::Jump { target } => write!(f, "JMP: Jump to line {target}"),
            Self::BranchTaken { target } => write!(f, "JZ: Condition met. Jumping to {target}"),
            Self::Load { dst, addr, value } => write!(f, "LOAD: {dst} <- MEM[{addr}] ({value})"),
            Self::SegFault { addr } => write!(f, "ERR: SegFault at {addr}"),
            Self::Store { addr, src, value } => {
                write!(f, "STORE: MEM[{addr}] <- {src} ({value})")
            }
            Self::Output { value } => write!(f, ">> OUTPUT: {value}"),
            Self::Halted => f.write_str("CPU HALTED"),
        }
    }
}

/// Sink for trace events, called in execution order.
pub trait TraceSink {
    /// Records one event.
    fn on_event(&mut self, event: TraceEvent);
}

impl TraceSink for Vec<TraceEvent> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

impl TraceSink for Vec<String> {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event.to_string());
    }
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NullSink;

impl TraceSink for NullSink {
    fn on_event(&mut self, _event: TraceEvent) {}
}

/// Adapts a `FnMut(&str)` log callback into a [`TraceSink`].
#[derive(Debug, Clone, Copy)]
pub struct FnSink<F>(pub F);

impl<F: FnMut(&str)> TraceSink for FnSink<F> {
    fn on_event(&mut self, event: TraceEvent) {
        (self.0)(&event.to_string());
    }
}

/// Collaborators borrowed by the engine for a single step.
pub struct StepIo<'a> {
    /// Trace channel.
    pub trace: &'a mut dyn TraceSink,
    /// Heat sample source for the temperature gauge.
    pub heat: &'a mut dyn HeatSource,
    /// Engine configuration.
    pub config: EngineConfig,
}

impl<'a> StepIo<'a> {
    /// Bundles a trace sink and heat source with the default configuration.
    pub fn new(trace: &'a mut dyn TraceSink, heat: &'a mut dyn HeatSource) -> Self {
        Self {
            trace,
            heat,
            config: EngineConfig::default(),
        }
    }

    /// Replaces the engine configuration.
    #[must_use]
    pub const fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for StepIo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepIo")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// What one `step` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum StepOutcome {
    /// An instruction executed and the processor is still running.
    Retired,
    /// The processor halted, by `HALT` or by running off the end.
    Halted,
    /// A fatal fault moved the processor to `ERROR`.
    Faulted(Fault),
    /// The state was already terminal; nothing changed.
    Ignored,
}

impl StepOutcome {
    /// Returns `true` when the driver must stop scheduling steps.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Retired)
    }
}

/// New state and memory produced by one `step` call.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Next processor state.
    pub state: ProcessorState,
    /// Memory after the step. At most one cell differs from the input.
    pub memory: Memory,
    /// What happened.
    pub outcome: StepOutcome,
}

/// Where a batched run stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunBoundary {
    /// Stop once the processor halts or faults.
    #[default]
    Terminal,
    /// Stop after the next `PRINT`, or earlier on halt or fault.
    Output,
}

/// Aggregated outcome of a batched run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Number of `step` calls made.
    pub steps: u64,
    /// Outcome of the last step.
    pub final_step: StepOutcome,
}
