//! End-to-end runs of the built-in programs, both through the bare engine and
//! through the machine driver.

use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;
use tracing as _;

use vpc_core::{
    catalog, step, Entropy, Machine, MachineConfig, Memory, ProcessorState, Program, Register,
    RunBoundary, Status, StepIo, StepOutcome,
};

struct Run {
    state: ProcessorState,
    memory: Memory,
    lines: Vec<String>,
    steps: usize,
}

fn run_engine(program: &Program, memory: Memory, max_steps: usize) -> Run {
    let mut state = ProcessorState::loaded();
    let mut memory = memory;
    let mut lines: Vec<String> = Vec::new();
    let mut heat = Entropy::new(1);
    let mut steps = 0;

    while steps < max_steps && !state.status.is_terminal() {
        let mut io = StepIo::new(&mut lines, &mut heat);
        let result = step(state, memory, program.instructions(), &mut io);
        state = result.state;
        memory = result.memory;
        steps += 1;
    }

    Run {
        state,
        memory,
        lines,
        steps,
    }
}

#[test]
fn addition_program_matches_the_reference_trace() {
    let run = run_engine(&catalog::addition(), Memory::zeroed(), 6);

    assert_eq!(run.steps, 6);
    assert_eq!(run.state.status, Status::Halted);
    assert_eq!(run.state.register(Register::R0), 30);
    assert_eq!(run.state.cycle_count, 6);
    assert_eq!(run.memory.get(50).map(|cell| cell.value), Some(30));
    assert_eq!(
        run.lines,
        [
            "MOV: R0 set to 10",
            "MOV: R1 set to 20",
            "ADD: R0 = 10 + 20 => 30",
            "STORE: MEM[50] <- R0 (30)",
            ">> OUTPUT: 30",
            "CPU HALTED",
        ]
    );
}

#[test]
fn search_program_finds_the_planted_value() {
    let mut memory = Memory::zeroed();
    memory.write(103, 99, 0).expect("in range");

    let run = run_engine(&catalog::search(), memory, 200);

    assert_eq!(run.state.status, Status::Halted);
    assert!(run.lines.iter().any(|line| line == ">> OUTPUT: 103"));
    assert_eq!(run.lines.last().map(String::as_str), Some("CPU HALTED"));
}

#[test]
fn search_program_gives_up_at_the_end_of_its_window() {
    let run = run_engine(&catalog::search(), Memory::zeroed(), 200);

    assert_eq!(run.state.status, Status::Halted);
    assert!(!run.lines.iter().any(|line| line.starts_with(">> OUTPUT")));
    assert_eq!(run.state.register(Register::R0), 105);
}

#[test]
fn sorting_program_swaps_unequal_pair() {
    let mut memory = Memory::zeroed();
    memory.write(200, 45, 0).expect("in range");
    memory.write(201, 12, 0).expect("in range");

    let run = run_engine(&catalog::sorting(), memory, 50);

    assert_eq!(run.state.status, Status::Halted);
    assert_eq!(run.memory.get(200).map(|cell| cell.value), Some(12));
    assert_eq!(run.memory.get(201).map(|cell| cell.value), Some(45));
    assert!(run.lines.iter().any(|line| line == ">> OUTPUT: 45"));
}

#[test]
fn sorting_program_skips_swap_for_equal_pair() {
    let mut memory = Memory::zeroed();
    memory.write(200, 7, 0).expect("in range");
    memory.write(201, 7, 0).expect("in range");

    let run = run_engine(&catalog::sorting(), memory, 50);

    assert_eq!(run.state.status, Status::Halted);
    assert!(run.lines.iter().any(|line| line == "JZ: Condition met. Jumping to 9"));
    assert!(!run.lines.iter().any(|line| line.starts_with("STORE")));
}

#[test]
fn machine_runs_search_against_booted_memory() {
    let mut machine = Machine::new(MachineConfig {
        seed: 2024,
        ..MachineConfig::default()
    });
    machine.power_on();

    let memory = machine.memory().expect("booted");
    let expected = (100..=103)
        .find(|addr| memory.get(*addr).is_some_and(|cell| cell.value == 99))
        .expect("planted value at 103");

    machine.load_named("search").expect("catalog program");
    let outcome = machine.run(RunBoundary::Terminal, 500).expect("runs");

    assert_eq!(outcome.final_step, StepOutcome::Halted);
    assert!(!machine.is_running());
    let lines: Vec<&str> = machine.log().lines().collect();
    assert_eq!(lines.first(), Some(&"LOADED: Search"));
    assert!(lines.contains(&format!(">> OUTPUT: {expected}").as_str()));
}

#[test]
fn machine_step_after_halt_is_ignored() {
    let mut machine = Machine::default();
    machine.power_on();
    machine.load_named("Addition").expect("catalog program");
    machine.run(RunBoundary::Terminal, 100).expect("runs");
    let cycles = machine.state().cycle_count;

    assert_eq!(machine.step(), Ok(StepOutcome::Ignored));
    assert_eq!(machine.state().cycle_count, cycles);
}

#[test]
fn reloading_resets_the_processor_but_keeps_memory() {
    let mut machine = Machine::default();
    machine.power_on();
    machine.load_named("Addition").expect("catalog program");
    machine.run(RunBoundary::Terminal, 100).expect("runs");

    machine.load_named("Addition").expect("catalog program");

    assert_eq!(machine.state().status, Status::Idle);
    assert_eq!(machine.state().register(Register::R0), 0);
    assert_eq!(
        machine
            .memory()
            .and_then(|memory| memory.get(50))
            .map(|cell| cell.value),
        Some(30)
    );
}
