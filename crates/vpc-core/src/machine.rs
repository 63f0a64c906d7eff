//! Driver that owns the machine between cycles and decides when to step.
//!
//! The driver is single-threaded: stepping, loading and the ambient activity
//! simulator all run on the caller's thread, so memory only ever has one
//! writer at a time.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, info};

use crate::api::{
    EngineConfig, RunBoundary, RunOutcome, StepIo, StepOutcome, TraceEvent, TraceSink,
};
use crate::catalog;
use crate::entropy::{Entropy, DEFAULT_SEED};
use crate::execute::step;
use crate::isa::OpCode;
use crate::memory::{Memory, MemoryRegion};
use crate::program::Program;
use crate::state::{ProcessorState, Status};
use crate::thermal::{warm, SYSCALL_HEAT};

/// Fastest allowed step period in milliseconds.
pub const MIN_SPEED_MS: u64 = 50;
/// Slowest allowed step period in milliseconds.
pub const MAX_SPEED_MS: u64 = 1000;
/// Step period used until the user picks one.
pub const DEFAULT_SPEED_MS: u64 = 500;
/// Number of log lines kept.
pub const LOG_CAPACITY: usize = 100;
/// Cycles charged to a system event.
pub const SYSCALL_CYCLES: u64 = 15;
/// Video cells rewritten by a system event.
pub const SYSCALL_VIDEO_WRITES: usize = 20;
/// Kernel stack cells rewritten by a system event.
pub const SYSCALL_STACK_WRITES: usize = 5;

/// Driver configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MachineConfig {
    /// Step period while running, in milliseconds.
    pub speed_ms: u64,
    /// Seed for boot noise, heat and ambient activity.
    pub seed: u64,
    /// Engine options passed to every step.
    pub engine: EngineConfig,
    /// Number of log lines kept.
    pub log_capacity: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            speed_ms: DEFAULT_SPEED_MS,
            seed: DEFAULT_SEED,
            engine: EngineConfig::default(),
            log_capacity: LOG_CAPACITY,
        }
    }
}

/// Errors from driver operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The operation needs power.
    #[error("machine is powered off")]
    PoweredOff,
    /// The operation needs a loaded program.
    #[error("no program loaded")]
    NoProgram,
    /// No catalog program has this name.
    #[error("unknown program `{0}`")]
    UnknownProgram(String),
    /// The loaded program already stopped; reload it to run again.
    #[error("program already finished ({0})")]
    Finished(Status),
}

/// Bounded log of trace and driver lines, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
    pushed: u64,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::with_capacity(LOG_CAPACITY)
    }
}

impl LogBuffer {
    /// Creates an empty buffer keeping at most `capacity` lines. Storage
    /// grows on demand past [`LOG_CAPACITY`].
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity.min(LOG_CAPACITY)),
            capacity,
            pushed: 0,
        }
    }

    /// Appends a line, evicting the oldest one when full.
    pub fn push(&mut self, line: impl Into<String>) {
        self.pushed = self.pushed.saturating_add(1);
        if self.capacity == 0 {
            return;
        }
        while self.lines.len() >= self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Lines in insertion order.
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.lines.iter().map(String::as_str)
    }

    /// Lines pushed after `mark`, an earlier [`LogBuffer::pushed`] value, that
    /// have not been evicted yet.
    pub fn since(&self, mark: u64) -> impl Iterator<Item = &str> + '_ {
        let fresh = usize::try_from(self.pushed.saturating_sub(mark))
            .map_or(self.lines.len(), |fresh| fresh.min(self.lines.len()));
        self.lines
            .iter()
            .skip(self.lines.len() - fresh)
            .map(String::as_str)
    }

    /// Total lines ever pushed, evicted ones included. Never reset.
    #[must_use]
    pub const fn pushed(&self) -> u64 {
        self.pushed
    }

    /// Most recent line.
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Number of lines held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Returns `true` when no lines are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Drops every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl TraceSink for LogBuffer {
    fn on_event(&mut self, event: TraceEvent) {
        self.push(event.to_string());
    }
}

/// The whole simulated machine.
#[derive(Debug, Clone)]
pub struct Machine {
    config: MachineConfig,
    state: ProcessorState,
    memory: Option<Memory>,
    program: Option<Program>,
    log: LogBuffer,
    entropy: Entropy,
    powered: bool,
    running: bool,
}

impl Default for Machine {
    fn default() -> Self {
        Self::new(MachineConfig::default())
    }
}

impl Machine {
    /// Creates a powered-off machine. Memory is built on first power-on.
    #[must_use]
    pub fn new(config: MachineConfig) -> Self {
        let config = MachineConfig {
            speed_ms: clamp_speed(config.speed_ms),
            ..config
        };
        Self {
            config,
            state: ProcessorState::power_on(),
            memory: None,
            program: None,
            log: LogBuffer::with_capacity(config.log_capacity),
            entropy: Entropy::new(config.seed),
            powered: false,
            running: false,
        }
    }

    /// Powers the machine on. Memory boots on the first power-on and then
    /// persists for the life of the machine.
    pub fn power_on(&mut self) {
        if self.memory.is_none() {
            self.memory = Some(Memory::boot(&mut self.entropy));
            info!(seed = self.config.seed, "memory booted");
        }
        self.state = ProcessorState::power_on();
        self.powered = true;
        self.running = false;
        info!("powered on");
    }

    /// Powers the machine off: stops the schedule, rewinds the processor and
    /// clears the log. Memory and the loaded program persist.
    pub fn power_off(&mut self) {
        self.running = false;
        self.powered = false;
        self.state.status = Status::Idle;
        self.state.program_counter = 0;
        self.state.cycle_count = 0;
        self.log.clear();
        info!("powered off");
    }

    /// Loads `program` and resets the processor.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::PoweredOff`] when the machine is off.
    pub fn load_program(&mut self, program: Program) -> Result<(), MachineError> {
        if !self.powered {
            return Err(MachineError::PoweredOff);
        }
        self.running = false;
        self.state = ProcessorState::loaded();
        self.log.push(format!("LOADED: {}", program.name()));
        info!(program = program.name(), len = program.len(), "program loaded");
        self.program = Some(program);
        Ok(())
    }

    /// Loads a catalog program by name.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::UnknownProgram`] for a name the catalog does not
    /// know, and [`MachineError::PoweredOff`] when the machine is off.
    pub fn load_named(&mut self, name: &str) -> Result<(), MachineError> {
        let program =
            catalog::find(name).ok_or_else(|| MachineError::UnknownProgram(name.to_owned()))?;
        self.load_program(program)
    }

    /// Runs one cycle.
    ///
    /// A terminal processor stops the schedule and yields
    /// [`StepOutcome::Ignored`] without calling the engine.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::PoweredOff`] or [`MachineError::NoProgram`].
    pub fn step(&mut self) -> Result<StepOutcome, MachineError> {
        if !self.powered {
            return Err(MachineError::PoweredOff);
        }
        let program = self.program.as_ref().ok_or(MachineError::NoProgram)?;
        if self.state.status.is_terminal() {
            self.running = false;
            return Ok(StepOutcome::Ignored);
        }
        let memory = self.memory.take().ok_or(MachineError::PoweredOff)?;
        let state = std::mem::take(&mut self.state);

        let mut io =
            StepIo::new(&mut self.log, &mut self.entropy).with_config(self.config.engine);
        let result = step(state, memory, program.instructions(), &mut io);

        self.state = result.state;
        self.memory = Some(result.memory);
        if result.outcome.is_terminal() {
            self.running = false;
        }
        Ok(result.outcome)
    }

    /// Starts or pauses the run schedule. Returns whether it is now running.
    ///
    /// Pausing leaves a running processor `IDLE`.
    ///
    /// # Errors
    ///
    /// Starting fails with [`MachineError::PoweredOff`],
    /// [`MachineError::NoProgram`] or [`MachineError::Finished`].
    pub fn toggle_run(&mut self) -> Result<bool, MachineError> {
        if self.running {
            self.running = false;
            if self.state.status == Status::Running {
                self.state.status = Status::Idle;
            }
            debug!("run paused");
            return Ok(false);
        }
        if !self.powered {
            return Err(MachineError::PoweredOff);
        }
        if self.program.is_none() {
            return Err(MachineError::NoProgram);
        }
        if self.state.status.is_terminal() {
            return Err(MachineError::Finished(self.state.status));
        }
        self.running = true;
        self.state.status = Status::Running;
        debug!(speed_ms = self.config.speed_ms, "run started");
        Ok(true)
    }

    /// Timer callback: steps once while the schedule is running.
    ///
    /// # Errors
    ///
    /// Same as [`Machine::step`].
    pub fn tick(&mut self) -> Result<Option<StepOutcome>, MachineError> {
        if !self.running {
            return Ok(None);
        }
        self.step().map(Some)
    }

    /// Sets the run period, clamped to `MIN_SPEED_MS..=MAX_SPEED_MS`.
    /// Returns the period actually applied.
    pub fn set_speed(&mut self, speed_ms: u64) -> u64 {
        self.config.speed_ms = clamp_speed(speed_ms);
        self.config.speed_ms
    }

    /// Steps until `boundary` or until `max_steps` calls have been made.
    ///
    /// # Errors
    ///
    /// Same as [`Machine::step`].
    pub fn run(
        &mut self,
        boundary: RunBoundary,
        max_steps: u64,
    ) -> Result<RunOutcome, MachineError> {
        let mut outcome = RunOutcome {
            steps: 0,
            final_step: StepOutcome::Ignored,
        };
        while outcome.steps < max_steps {
            outcome.final_step = self.step()?;
            outcome.steps += 1;
            if outcome.final_step.is_terminal() {
                break;
            }
            if boundary == RunBoundary::Output && self.last_op() == Some(OpCode::Print) {
                break;
            }
        }
        Ok(outcome)
    }

    /// Ambient activity: a simulated system call that burns cycles, warms the
    /// core and scribbles over video memory and the kernel stack.
    ///
    /// # Errors
    ///
    /// Returns [`MachineError::PoweredOff`] when the machine is off.
    pub fn system_event(&mut self, action: &str) -> Result<(), MachineError> {
        if !self.powered {
            return Err(MachineError::PoweredOff);
        }
        let memory = self.memory.as_mut().ok_or(MachineError::PoweredOff)?;

        self.log.push(format!("SYSCALL: {action}"));
        self.state.cycle_count = self.state.cycle_count.saturating_add(SYSCALL_CYCLES);
        self.state.temperature = warm(self.state.temperature, SYSCALL_HEAT);

        let tick = self.state.cycle_count;
        memory.scribble(
            MemoryRegion::Video,
            SYSCALL_VIDEO_WRITES,
            &mut self.entropy,
            tick,
        );
        memory.scribble(
            MemoryRegion::KernelStack,
            SYSCALL_STACK_WRITES,
            &mut self.entropy,
            tick,
        );
        debug!(action, tick, "system event");
        Ok(())
    }

    /// Current processor state.
    #[must_use]
    pub const fn state(&self) -> &ProcessorState {
        &self.state
    }

    /// Memory, once booted.
    #[must_use]
    pub const fn memory(&self) -> Option<&Memory> {
        self.memory.as_ref()
    }

    /// Loaded program.
    #[must_use]
    pub const fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    /// Log buffer.
    #[must_use]
    pub const fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Current run period in milliseconds.
    #[must_use]
    pub const fn speed_ms(&self) -> u64 {
        self.config.speed_ms
    }

    /// Whether the machine has power.
    #[must_use]
    pub const fn is_powered(&self) -> bool {
        self.powered
    }

    /// Whether the run schedule is active.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    fn last_op(&self) -> Option<OpCode> {
        self.state
            .instruction_register
            .as_ref()
            .map(|instruction| instruction.op)
    }
}

const fn clamp_speed(speed_ms: u64) -> u64 {
    if speed_ms < MIN_SPEED_MS {
        MIN_SPEED_MS
    } else if speed_ms > MAX_SPEED_MS {
        MAX_SPEED_MS
    } else {
        speed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::{LogBuffer, Machine, MachineConfig, MachineError, DEFAULT_SPEED_MS, LOG_CAPACITY};
    use crate::api::{RunBoundary, StepOutcome};
    use crate::state::Status;
    use crate::thermal::LOAD_TEMPERATURE;

    fn loaded(name: &str) -> Machine {
        let mut machine = Machine::new(MachineConfig {
            seed: 9,
            ..MachineConfig::default()
        });
        machine.power_on();
        machine.load_named(name).expect("catalog program");
        machine
    }

    #[test]
    fn log_buffer_keeps_most_recent_lines() {
        let mut log = LogBuffer::with_capacity(3);
        for index in 0..5 {
            log.push(format!("line {index}"));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.lines().collect::<Vec<_>>(), ["line 2", "line 3", "line 4"]);
        assert_eq!(log.last(), Some("line 4"));
    }

    #[test]
    fn unbounded_log_capacity_allocates_lazily() {
        let mut log = LogBuffer::with_capacity(usize::MAX);
        for index in 0..(LOG_CAPACITY + 5) {
            log.push(format!("line {index}"));
        }

        assert_eq!(log.len(), LOG_CAPACITY + 5);
        assert_eq!(log.lines().next(), Some("line 0"));
    }

    #[test]
    fn log_buffer_reports_lines_since_a_mark() {
        let mut log = LogBuffer::with_capacity(3);
        log.push("a");
        let mark = log.pushed();
        log.push("b");
        log.push("c");

        assert_eq!(log.since(mark).collect::<Vec<_>>(), ["b", "c"]);

        log.push("d");
        log.push("e");
        assert_eq!(log.pushed(), 5);
        assert_eq!(log.since(mark).collect::<Vec<_>>(), ["c", "d", "e"]);
        assert_eq!(log.since(log.pushed()).count(), 0);
    }

    #[test]
    fn operations_need_power_and_a_program() {
        let mut machine = Machine::default();

        assert_eq!(machine.step(), Err(MachineError::PoweredOff));
        assert_eq!(machine.load_named("Addition"), Err(MachineError::PoweredOff));

        machine.power_on();
        assert_eq!(machine.step(), Err(MachineError::NoProgram));
        assert_eq!(
            machine.load_named("nope"),
            Err(MachineError::UnknownProgram("nope".to_owned()))
        );
    }

    #[test]
    fn load_resets_processor_and_logs_name() {
        let machine = loaded("Addition");
        let state = machine.state();

        assert_eq!(state.status, Status::Idle);
        assert_eq!(state.cycle_count, 0);
        assert!((state.temperature - LOAD_TEMPERATURE).abs() < f64::EPSILON);
        assert_eq!(machine.log().last(), Some("LOADED: Addition"));
    }

    #[test]
    fn speed_is_clamped() {
        let mut machine = Machine::default();
        assert_eq!(machine.speed_ms(), DEFAULT_SPEED_MS);
        assert_eq!(machine.set_speed(10), 50);
        assert_eq!(machine.set_speed(5_000), 1000);
        assert_eq!(machine.set_speed(250), 250);
    }

    #[test]
    fn toggle_run_pauses_to_idle_and_refuses_finished_programs() {
        let mut machine = loaded("Addition");

        assert_eq!(machine.toggle_run(), Ok(true));
        assert_eq!(machine.tick(), Ok(Some(StepOutcome::Retired)));
        assert_eq!(machine.toggle_run(), Ok(false));
        assert_eq!(machine.state().status, Status::Idle);
        assert_eq!(machine.tick(), Ok(None));

        machine.run(RunBoundary::Terminal, 100).expect("runs");
        assert_eq!(machine.state().status, Status::Halted);
        assert_eq!(
            machine.toggle_run(),
            Err(MachineError::Finished(Status::Halted))
        );
    }

    #[test]
    fn output_boundary_stops_after_print() {
        let mut machine = loaded("Addition");
        let outcome = machine.run(RunBoundary::Output, 100).expect("runs");

        assert_eq!(outcome.steps, 5);
        assert_eq!(outcome.final_step, StepOutcome::Retired);
        assert_eq!(machine.log().last(), Some(">> OUTPUT: 30"));
    }

    #[test]
    fn power_off_rewinds_and_clears_log_but_keeps_memory() {
        let mut machine = loaded("Addition");
        machine.run(RunBoundary::Terminal, 100).expect("runs");
        machine.power_off();

        assert!(!machine.is_powered());
        assert_eq!(machine.state().program_counter, 0);
        assert_eq!(machine.state().cycle_count, 0);
        assert_eq!(machine.state().status, Status::Idle);
        assert!(machine.log().is_empty());
        assert_eq!(
            machine.memory().and_then(|memory| memory.get(50)).map(|cell| cell.value),
            Some(30)
        );
    }

    #[test]
    fn system_event_burns_cycles_and_scribbles() {
        let mut machine = loaded("Addition");
        machine.system_event("open explorer").expect("powered");

        assert_eq!(machine.state().cycle_count, 15);
        assert!((machine.state().temperature - (LOAD_TEMPERATURE + 0.5)).abs() < 1e-9);
        assert_eq!(machine.log().last(), Some("SYSCALL: open explorer"));
        let stamped = machine
            .memory()
            .map(|memory| {
                memory
                    .cells()
                    .iter()
                    .filter(|cell| cell.last_access_tick == 15)
                    .count()
            })
            .unwrap_or_default();
        assert!(stamped > 0);
    }
}
