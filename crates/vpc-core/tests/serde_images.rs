//! JSON images of state, memory, programs and faults.

use proptest as _;
use rstest as _;
use serde as _;
use thiserror as _;
use tracing as _;

use vpc_core::{
    catalog, step, Fault, FixedHeat, Memory, MemoryLayoutError, OpCode, OperandSlot,
    ProcessorState, Program, Status, StepIo, StepOutcome,
};

#[test]
fn memory_image_round_trips() {
    let mut memory = Memory::zeroed();
    memory.write(103, 99, 4).expect("in range");

    let json = serde_json::to_string(&memory).expect("serializes");
    let back: Memory = serde_json::from_str(&json).expect("deserializes");

    assert_eq!(back, memory);
}

#[test]
fn memory_image_with_missing_cells_is_rejected() {
    let err = serde_json::from_str::<Memory>(r#"{"cells":[]}"#).expect_err("empty image");

    assert!(err
        .to_string()
        .contains(&MemoryLayoutError::Length { found: 0 }.to_string()));
}

#[test]
fn memory_image_with_shuffled_cells_is_rejected() {
    let mut value = serde_json::to_value(Memory::zeroed()).expect("serializes");
    let cells = value["cells"].as_array_mut().expect("cell array");
    cells.swap(0, 1);

    let err = serde_json::from_value::<Memory>(value).expect_err("out of order");

    assert!(err.to_string().contains("cell 0 claims address 1"));
}

#[test]
fn store_after_loading_an_image_writes_the_cell() {
    let json = serde_json::to_string(&Memory::zeroed()).expect("serializes");
    let mut memory: Memory = serde_json::from_str(&json).expect("deserializes");
    let program = catalog::addition();
    let mut state = ProcessorState::loaded();
    let mut lines: Vec<String> = Vec::new();
    let mut heat = FixedHeat(0.0);

    while !state.status.is_terminal() {
        let mut io = StepIo::new(&mut lines, &mut heat);
        let result = step(state, memory, program.instructions(), &mut io);
        state = result.state;
        memory = result.memory;
    }

    assert!(lines.iter().any(|line| line == "STORE: MEM[50] <- R0 (30)"));
    assert_eq!(memory.get(50).map(|cell| cell.value), Some(30));
}

#[test]
fn processor_state_uses_upper_case_status() {
    let mut state = ProcessorState::loaded();
    state.status = Status::Halted;

    let value = serde_json::to_value(&state).expect("serializes");

    assert_eq!(value["status"], "HALTED");
    assert_eq!(value["cycle_count"], 0);
    let back: ProcessorState = serde_json::from_value(value).expect("deserializes");
    assert_eq!(back, state);
}

#[test]
fn faulted_outcome_serializes_with_operand_slot() {
    let outcome = StepOutcome::Faulted(Fault::OperandKind {
        op: OpCode::Add,
        position: 1,
        expected: OperandSlot::Register,
    });

    let json = serde_json::to_string(&outcome).expect("serializes");
    let back: StepOutcome = serde_json::from_str(&json).expect("deserializes");

    assert_eq!(back, outcome);
    assert!(json.contains("\"register\""));
}

#[test]
fn catalog_programs_round_trip() {
    for program in catalog::programs() {
        let json = serde_json::to_string(&program).expect("serializes");
        let back: Program = serde_json::from_str(&json).expect("deserializes");
        assert_eq!(back, program);
    }
}
