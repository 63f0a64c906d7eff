//! Virtual PC assembler library.
//!
//! Turns program text into [`vpc_core::Program`]s. The disassembler lives in
//! `vpc_core::disasm`; its output assembles back to the same operations.

use clap as _;
use serde_json as _;
#[cfg(test)]
use tempfile as _;
use tracing_subscriber as _;

/// Top-level two-pass assembler pipeline.
pub mod assembler;
/// Source line parser for instructions and labels.
pub mod parser;
/// Symbol table and pass-1 index assignment.
pub mod symbols;

pub use assembler::{assemble, assemble_file, AssembleError};
pub use parser::{ParseError, ParseErrorKind};
pub use symbols::SymbolError;
