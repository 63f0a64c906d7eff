//! Instruction-cycle engine for the virtual PC register machine.

/// Processor state record, register file and lifecycle flag.
pub mod state;
pub use state::{ProcessorState, Register, RegisterFile, Status, REGISTER_COUNT};

/// Flat cell memory, address resolution and the fixed region map.
pub mod memory;
pub use memory::{
    region_of, resolve, AccessViolation, Memory, MemoryCell, MemoryLayoutError, MemoryRegion,
    MEMORY_SIZE,
};

/// Operation set and tagged operand model.
pub mod isa;
pub use isa::{OpCode, Operand, OperandSlot};

/// Instructions and programs.
pub mod program;
pub use program::{Instruction, Program};

/// Fatal fault taxonomy.
pub mod fault;
pub use fault::{Fault, FaultClass};

/// Host-facing engine contract.
pub mod api;
pub use api::{
    EngineConfig, FnSink, NullSink, RunBoundary, RunOutcome, StepIo, StepOutcome, StepResult,
    StoreMissPolicy, TraceEvent, TraceSink,
};

/// Operand validation and typed decode.
pub mod decoder;
pub use decoder::{decode, decode_parts, Decoded};

/// Fetch-decode-execute cycle.
pub mod execute;
pub use execute::{
    commit_execution, execute_instruction, step, ExecuteState, FlagsUpdate, MemoryEffect, PcUpdate,
};

/// Temperature gauge model.
pub mod thermal;
pub use thermal::{FixedHeat, HeatSource, TEMP_MAX, TEMP_MIN};

/// Deterministic random stream.
pub mod entropy;
pub use entropy::{Entropy, DEFAULT_SEED};

/// Canonical instruction text.
pub mod disasm;
pub use disasm::{disassemble, disassemble_parts, listing, DisassemblyRow};

/// Built-in demo programs.
pub mod catalog;

/// Run scheduling, log buffer and ambient activity.
pub mod machine;
pub use machine::{LogBuffer, Machine, MachineConfig, MachineError};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
