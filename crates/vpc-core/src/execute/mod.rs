//! Fetch-decode-execute cycle.
//!
//! Execution runs in two phases. [`execute_instruction`] reads the current
//! state and memory and records every effect of the instruction in an
//! [`ExecuteState`]; [`commit_execution`] then applies those effects in order:
//! 1. Memory access (read stamp or write)
//! 2. Destination register
//! 3. Zero flag
//! 4. Trace lines
//! 5. Status and program counter
//!
//! A fault in the first phase leaves registers, memory and the zero flag
//! exactly as they were.

mod flags;
mod helpers;

pub use flags::{FlagsUpdate, PcUpdate};

use tracing::{debug, error, warn};

use crate::api::{StepIo, StepOutcome, StepResult, StoreMissPolicy, TraceEvent, TraceSink};
use crate::decoder::{decode, Decoded};
use crate::memory::{region_of, resolve, Memory};
use crate::program::Instruction;
use crate::state::{ProcessorState, Register, Status};
use crate::thermal::heat_step;
use crate::{EngineConfig, Fault};

use helpers::{checked_difference, checked_sum, operand_value, store_address};

/// Memory effect of one instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemoryEffect {
    /// No cell is touched.
    #[default]
    None,
    /// A cell was read; only its access stamp changes.
    Touch(usize),
    /// A cell receives a new value.
    Write {
        /// Cell index.
        index: usize,
        /// New value.
        value: i64,
    },
}

/// Effects of one instruction, computed before anything is committed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecuteState {
    /// Memory access to perform.
    pub memory: MemoryEffect,
    /// Register write to perform.
    pub register_write: Option<(Register, i64)>,
    /// Zero flag update.
    pub flags: FlagsUpdate,
    /// Program counter update.
    pub pc: PcUpdate,
    /// Whether the instruction stops the processor.
    pub halt: bool,
    /// Trace lines, in emission order.
    pub events: Vec<TraceEvent>,
}

impl ExecuteState {
    fn event(&mut self, event: TraceEvent) {
        self.events.push(event);
    }
}

/// Computes the effects of `decoded` against the current state and memory.
///
/// # Errors
///
/// Returns [`Fault::Overflow`] when `ADD` or `SUB` leaves the register range.
#[allow(clippy::too_many_lines)]
pub fn execute_instruction(
    decoded: Decoded,
    state: &ProcessorState,
    memory: &Memory,
    config: EngineConfig,
) -> Result<ExecuteState, Fault> {
    let registers = &state.registers;
    let op = decoded.op();
    let mut exec = ExecuteState::default();

    match decoded {
        Decoded::Mov { dst, value } => {
            exec.register_write = Some((dst, value));
            exec.event(TraceEvent::Move { dst, value });
        }
        Decoded::Add { dst, addend } => {
            let lhs = registers.get(dst);
            let rhs = operand_value(registers, addend);
            let result = checked_sum(op, lhs, rhs)?;
            exec.register_write = Some((dst, result));
            exec.event(TraceEvent::Add {
                dst,
                lhs,
                rhs,
                result,
            });
        }
        Decoded::Sub { dst, src } => {
            let result = checked_difference(op, registers.get(dst), registers.get(src))?;
            exec.register_write = Some((dst, result));
            exec.flags = FlagsUpdate::Set(result == 0);
        }
        Decoded::Cmp { lhs, rhs } => {
            let lhs_value = registers.get(lhs);
            let rhs_value = operand_value(registers, rhs);
            let zero_flag = lhs_value == rhs_value;
            exec.flags = FlagsUpdate::Set(zero_flag);
            exec.event(TraceEvent::Compare {
                lhs,
                lhs_value,
                rhs_value,
                zero_flag,
            });
        }
        Decoded::Jmp { target } => {
            exec.pc = PcUpdate::Jump(target);
            exec.event(TraceEvent::Jump { target });
        }
        Decoded::Jz { target } => {
            if state.zero_flag {
                exec.pc = PcUpdate::Jump(target);
                exec.event(TraceEvent::BranchTaken { target });
            }
        }
        Decoded::Load { dst, addr } => {
            let address = registers.get(addr);
            match resolve(address).map(|index| (index, memory.get(index))) {
                Ok((index, Some(cell))) => {
                    exec.memory = MemoryEffect::Touch(index);
                    exec.register_write = Some((dst, cell.value));
                    exec.event(TraceEvent::Load {
                        dst,
                        addr: index,
                        value: cell.value,
                    });
                }
                Ok((_, None)) | Err(_) => {
                    warn!(address, "load outside memory");
                    exec.event(TraceEvent::SegFault { addr: address });
                }
            }
        }
        Decoded::Store { src, addr } => {
            let address = store_address(registers, addr);
            let value = registers.get(src);
            let target = resolve(address)
                .ok()
                .filter(|index| memory.get(*index).is_some());
            if let Some(index) = target {
                exec.memory = MemoryEffect::Write { index, value };
                exec.event(TraceEvent::Store {
                    addr: index,
                    src,
                    value,
                });
            } else {
                match config.store_miss {
                    StoreMissPolicy::Drop => debug!(address, "store outside memory dropped"),
                    StoreMissPolicy::Log => {
                        warn!(address, "store outside memory");
                        exec.event(TraceEvent::SegFault { addr: address });
                    }
                }
            }
        }
        Decoded::Print { src } => {
            exec.event(TraceEvent::Output {
                value: registers.get(src),
            });
        }
        Decoded::Halt => {
            exec.halt = true;
            exec.event(TraceEvent::Halted);
        }
    }

    Ok(exec)
}

/// Applies the effects recorded by [`execute_instruction`].
pub fn commit_execution(
    state: &mut ProcessorState,
    memory: &mut Memory,
    exec: ExecuteState,
    trace: &mut dyn TraceSink,
) {
    let tick = state.cycle_count;

    match exec.memory {
        MemoryEffect::None => {}
        MemoryEffect::Touch(index) => {
            if let Some(cell) = memory.cell_mut(index) {
                cell.last_access_tick = tick;
            }
        }
        MemoryEffect::Write { index, value } => {
            if let Some(region) = region_of(index) {
                debug!(?region, index, "write into reserved region");
            }
            if let Some(cell) = memory.cell_mut(index) {
                cell.value = value;
                cell.last_access_tick = tick;
            }
        }
    }

    if let Some((register, value)) = exec.register_write {
        state.registers.set(register, value);
    }

    state.zero_flag = exec.flags.apply(state.zero_flag);

    for event in exec.events {
        trace.on_event(event);
    }

    if exec.halt {
        state.status = Status::Halted;
    }

    if state.status == Status::Running {
        state.program_counter = match exec.pc {
            PcUpdate::Advance => state.program_counter.saturating_add(1),
            PcUpdate::Jump(target) => target,
        };
    }
}

/// Runs one fetch-decode-execute cycle.
///
/// `state` and `memory` are consumed and handed back in the [`StepResult`].
/// A `HALTED` or `ERROR` state is returned untouched with
/// [`StepOutcome::Ignored`]; an `IDLE` state is promoted to `RUNNING` first.
pub fn step(
    mut state: ProcessorState,
    mut memory: Memory,
    instructions: &[Instruction],
    io: &mut StepIo<'_>,
) -> StepResult {
    if state.status.is_terminal() {
        return StepResult {
            state,
            memory,
            outcome: StepOutcome::Ignored,
        };
    }

    if state.status == Status::Idle {
        state.status = Status::Running;
    }
    state.cycle_count = state.cycle_count.saturating_add(1);

    let Some(instruction) = instructions.get(state.program_counter) else {
        debug!(
            cycle = state.cycle_count,
            pc = state.program_counter,
            "fetch past end of program"
        );
        state.status = Status::Halted;
        return StepResult {
            state,
            memory,
            outcome: StepOutcome::Halted,
        };
    };

    state.instruction_register = Some(instruction.clone());
    state.temperature = heat_step(state.temperature, &mut *io.heat);

    let executed = decode(instruction)
        .and_then(|decoded| execute_instruction(decoded, &state, &memory, io.config));

    let outcome = match executed {
        Ok(exec) => {
            commit_execution(&mut state, &mut memory, exec, &mut *io.trace);
            debug!(
                cycle = state.cycle_count,
                pc = state.program_counter,
                op = %instruction.op,
                "retired"
            );
            if state.status == Status::Halted {
                StepOutcome::Halted
            } else {
                StepOutcome::Retired
            }
        }
        Err(fault) => {
            error!(
                cycle = state.cycle_count,
                pc = state.program_counter,
                id = %instruction.id,
                class = ?fault.class(),
                %fault,
                "fatal fault"
            );
            state.status = Status::Error;
            state.last_error = Some(format!("{fault} at instruction {}", state.program_counter));
            StepOutcome::Faulted(fault)
        }
    };

    StepResult {
        state,
        memory,
        outcome,
    }
}
