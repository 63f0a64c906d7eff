//! Top-level assembler pipeline.
//!
//! 1. **Pass 1**: parse every line and build the symbol table.
//! 2. **Pass 2**: resolve label operands to instruction indices, check each
//!    instruction against its operand signature and emit the [`Program`].
//!
//! Instruction ids are 1-based ordinals; descriptions are the canonical
//! disassembly.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use vpc_core::{decode_parts, Fault, Instruction, Operand, Program};

use crate::parser::{parse_line, ParseError, ParsedInstruction, ParsedLine, ParsedOperand};
use crate::symbols::{build_symbol_table, SymbolError, SymbolTable};

/// Assembly failure.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// A line did not parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Symbol table construction failed.
    #[error(transparent)]
    Symbol(#[from] SymbolError),
    /// Operand names a label that is never defined.
    #[error("line {line}: undefined label '{name}'")]
    UndefinedLabel {
        /// Label name.
        name: String,
        /// Line of the reference.
        line: usize,
    },
    /// Instruction does not match its operand signature.
    #[error("line {line}: {fault}")]
    Invalid {
        /// Line of the instruction.
        line: usize,
        /// Decode fault the instruction would raise at run time.
        fault: Fault,
    },
    /// Source file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl AssembleError {
    /// Source line the error refers to, when it has one.
    #[must_use]
    pub const fn line(&self) -> Option<usize> {
        match self {
            Self::Parse(err) => Some(err.line),
            Self::Symbol(SymbolError::DuplicateLabel { line, .. })
            | Self::UndefinedLabel { line, .. }
            | Self::Invalid { line, .. } => Some(*line),
            Self::Io { .. } => None,
        }
    }
}

/// Assembles source text into a named program.
///
/// # Errors
///
/// Returns the first parse, symbol, label or operand-signature error.
pub fn assemble(name: &str, source: &str) -> Result<Program, AssembleError> {
    let parsed = source
        .lines()
        .enumerate()
        .map(|(i, line)| parse_line(line, i + 1).map(|parsed| (i + 1, parsed)))
        .collect::<Result<Vec<_>, _>>()?;

    let symbols = build_symbol_table(parsed.iter().map(|(line, parsed)| (*line, parsed)))?;
    debug!(labels = symbols.len(), "pass 1 complete");

    let mut instructions = Vec::new();
    for (line, parsed) in &parsed {
        let ParsedLine::Instruction { instruction, .. } = parsed else {
            continue;
        };
        let args = resolve_operands(instruction, &symbols, *line)?;
        decode_parts(instruction.op, &args)
            .map_err(|fault| AssembleError::Invalid { line: *line, fault })?;

        let id = (instructions.len() + 1).to_string();
        instructions.push(Instruction::described(id, instruction.op, args));
    }

    debug!(name, instructions = instructions.len(), "assembled");
    Ok(Program::new(
        name,
        format!("Assembled from {name}"),
        instructions,
    ))
}

/// Reads and assembles a source file; the program is named after the file
/// stem.
///
/// # Errors
///
/// Returns [`AssembleError::Io`] if the file cannot be read, otherwise any
/// error from [`assemble`].
pub fn assemble_file(path: &Path) -> Result<Program, AssembleError> {
    let source = std::fs::read_to_string(path).map_err(|source| AssembleError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map_or_else(|| "program".to_owned(), |stem| stem.to_string_lossy().into_owned());
    assemble(&name, &source)
}

fn resolve_operands(
    instruction: &ParsedInstruction,
    symbols: &SymbolTable,
    line: usize,
) -> Result<Vec<Operand>, AssembleError> {
    instruction
        .operands
        .iter()
        .map(|operand| match operand {
            ParsedOperand::Register(register) => Ok(Operand::Register(*register)),
            ParsedOperand::Immediate(value) => Ok(Operand::Immediate(*value)),
            ParsedOperand::Label(name) => symbols
                .get(name)
                .map(|symbol| Operand::Immediate(i64::try_from(symbol.index).unwrap_or(i64::MAX)))
                .ok_or_else(|| AssembleError::UndefinedLabel {
                    name: name.clone(),
                    line,
                }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{assemble, assemble_file, AssembleError};
    use crate::parser::ParseErrorKind;
    use std::io::Write;
    use vpc_core::{catalog, disassemble, Fault, OpCode, Operand, Register};

    const SEARCH: &str = "\
; scan MEM[100..105) for 99
        MOV R0, 100
        MOV R1, 99
        MOV R3, 1
loop:   LOAD R2, R0
        CMP R2, R1
        JZ found
        ADD R0, R3
        CMP R0, 105
        JZ missing
        JMP loop
found:  PRINT R0
missing:
        HALT
";

    #[test]
    fn labels_resolve_to_catalog_targets() {
        let program = assemble("search", SEARCH).expect("assembles");
        let expected = catalog::search();

        assert_eq!(program.len(), expected.len());
        for (ours, theirs) in program.instructions().iter().zip(expected.instructions()) {
            assert_eq!(ours.op, theirs.op);
            assert_eq!(ours.args, theirs.args);
            assert_eq!(ours.id, theirs.id);
        }
    }

    #[test]
    fn catalog_disassembly_reassembles_to_the_same_operations() {
        for program in catalog::programs() {
            let source = program
                .instructions()
                .iter()
                .map(disassemble)
                .collect::<Vec<_>>()
                .join("\n");

            let rebuilt = assemble(program.name(), &source).expect("reassembles");

            let ops: Vec<_> = rebuilt
                .instructions()
                .iter()
                .map(|ins| (ins.op, ins.args.clone()))
                .collect();
            let expected: Vec<_> = program
                .instructions()
                .iter()
                .map(|ins| (ins.op, ins.args.clone()))
                .collect();
            assert_eq!(ops, expected, "{}", program.name());
        }
    }

    #[test]
    fn descriptions_are_canonical_disassembly() {
        let program = assemble("t", "store r0, #0x32").expect("assembles");

        assert_eq!(program.instructions()[0].description, "STORE R0, 50");
        assert_eq!(
            program.instructions()[0].args,
            vec![Operand::Register(Register::R0), Operand::Immediate(50)]
        );
    }

    #[test]
    fn undefined_label_is_reported_with_its_line() {
        let err = assemble("t", "MOV R0, 1\nJMP nowhere").expect_err("undefined");

        assert!(matches!(
            err,
            AssembleError::UndefinedLabel { ref name, line: 2 } if name == "nowhere"
        ));
        assert_eq!(err.line(), Some(2));
    }

    #[test]
    fn signature_mismatch_is_rejected_at_assembly_time() {
        let err = assemble("t", "HALT\nADD 5, R0").expect_err("bad operands");

        assert!(matches!(
            err,
            AssembleError::Invalid {
                line: 2,
                fault: Fault::OperandKind { op: OpCode::Add, position: 1, .. }
            }
        ));
    }

    #[test]
    fn negative_jump_target_is_rejected() {
        let err = assemble("t", "JMP -1").expect_err("negative target");

        assert!(matches!(
            err,
            AssembleError::Invalid {
                fault: Fault::NegativeJumpTarget { .. },
                ..
            }
        ));
    }

    #[test]
    fn parse_errors_propagate() {
        let err = assemble("t", "HALT\n\nFROB R1").expect_err("unknown mnemonic");

        assert!(matches!(
            err,
            AssembleError::Parse(ref parse) if parse.line == 3
                && parse.kind == ParseErrorKind::UnknownMnemonic("FROB".to_owned())
        ));
    }

    #[test]
    fn file_stem_names_the_program() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("countdown.vpc");
        let mut file = std::fs::File::create(&path).expect("create");
        writeln!(file, "MOV R0, 3\nPRINT R0\nHALT").expect("write");

        let program = assemble_file(&path).expect("assembles");

        assert_eq!(program.name(), "countdown");
        assert_eq!(program.len(), 3);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");

        let err = assemble_file(&dir.path().join("absent.vpc")).expect_err("missing");

        assert!(matches!(err, AssembleError::Io { .. }));
        assert_eq!(err.line(), None);
    }
}
