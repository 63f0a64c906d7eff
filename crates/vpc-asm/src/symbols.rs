//! Symbol table and pass-1 index assignment.
//!
//! Walks parsed lines, gives every instruction its program index and records
//! where each label points. A label on its own line binds to the next
//! instruction, or to one past the end when nothing follows.

use std::collections::HashMap;

use thiserror::Error;

use crate::parser::ParsedLine;

/// A label with the instruction index it resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Instruction index the label names.
    pub index: usize,
    /// Source line where the label was defined.
    pub defined_at: usize,
}

/// Label name to definition.
pub type SymbolTable = HashMap<String, Symbol>;

/// Error during symbol table construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// The same label was defined twice.
    #[error("line {line}: duplicate label '{name}' (first defined at line {first_definition})")]
    DuplicateLabel {
        /// Label name.
        name: String,
        /// Line of the repeated definition.
        line: usize,
        /// Line of the first definition.
        first_definition: usize,
    },
}

/// Builds the symbol table from parsed lines paired with their 1-based line
/// numbers.
///
/// # Errors
///
/// Returns [`SymbolError::DuplicateLabel`] on the second definition of a name.
pub fn build_symbol_table<'a>(
    lines: impl IntoIterator<Item = (usize, &'a ParsedLine)>,
) -> Result<SymbolTable, SymbolError> {
    let mut symbols = SymbolTable::new();
    let mut index = 0_usize;

    for (line, parsed) in lines {
        let label = match parsed {
            ParsedLine::Blank => None,
            ParsedLine::Label { name } => Some(name),
            ParsedLine::Instruction { label, .. } => label.as_ref(),
        };

        if let Some(name) = label {
            define(&mut symbols, name, index, line)?;
        }

        if matches!(parsed, ParsedLine::Instruction { .. }) {
            index += 1;
        }
    }

    Ok(symbols)
}

fn define(
    symbols: &mut SymbolTable,
    name: &str,
    index: usize,
    line: usize,
) -> Result<(), SymbolError> {
    if let Some(existing) = symbols.get(name) {
        return Err(SymbolError::DuplicateLabel {
            name: name.to_owned(),
            line,
            first_definition: existing.defined_at,
        });
    }
    symbols.insert(
        name.to_owned(),
        Symbol {
            index,
            defined_at: line,
        },
    );
    Ok(())
}
