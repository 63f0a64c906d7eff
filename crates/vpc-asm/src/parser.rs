//! Source line parser for instructions and labels.
//!
//! Syntax, one statement per line:
//! ```text
//! ; comment
//! loop:                 ; label on its own line
//! next: ADD R0, R3      ; label followed by an instruction
//!       CMP R0, #0x69   ; immediates: decimal, 0x hex, 0b binary, optional '#'
//!       JZ  found       ; labels resolve to instruction indices
//! ```

use thiserror::Error;
use vpc_core::{OpCode, Register};

/// A parsed operand before label resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedOperand {
    /// `R0`..`R7`.
    Register(Register),
    /// Numeric literal.
    Immediate(i64),
    /// Label reference, resolved in the second pass.
    Label(String),
}

/// A parsed instruction with its operands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    /// Operation.
    pub op: OpCode,
    /// Operands as written.
    pub operands: Vec<ParsedOperand>,
}

/// A single parsed source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    /// Empty or comment-only line.
    Blank,
    /// Label definition on its own line.
    Label {
        /// Label name.
        name: String,
    },
    /// Instruction line, optionally labelled.
    Instruction {
        /// Label defined on the same line.
        label: Option<String>,
        /// The parsed instruction.
        instruction: ParsedInstruction,
    },
}

/// Parse error with its source line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// 1-based source line.
    pub line: usize,
    /// What went wrong.
    pub kind: ParseErrorKind,
}

/// Classification of parse errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    /// Unknown mnemonic.
    #[error("unknown mnemonic: {0}")]
    UnknownMnemonic(String),
    /// `R` followed by a number outside `0..=7`.
    #[error("invalid register: {0}")]
    InvalidRegister(String),
    /// Malformed numeric literal.
    #[error("invalid immediate value: {0}")]
    InvalidImmediate(String),
    /// Anything else that does not parse.
    #[error("invalid syntax: {0}")]
    InvalidSyntax(String),
}

/// Parses one source line.
///
/// # Errors
///
/// Returns a [`ParseError`] for unknown mnemonics and malformed operands.
pub fn parse_line(line: &str, line_number: usize) -> Result<ParsedLine, ParseError> {
    let err = |kind| ParseError {
        line: line_number,
        kind,
    };
    let trimmed = strip_comment(line).trim();

    if trimmed.is_empty() {
        return Ok(ParsedLine::Blank);
    }

    let (label, rest) = split_label(trimmed)
        .map_or((None, trimmed), |(label, rest)| (Some(label), rest.trim()));

    if rest.is_empty() {
        return label
            .map(|name| ParsedLine::Label { name })
            .ok_or_else(|| err(ParseErrorKind::InvalidSyntax(trimmed.to_owned())));
    }

    let instruction = parse_instruction(rest).map_err(err)?;
    Ok(ParsedLine::Instruction { label, instruction })
}

fn strip_comment(line: &str) -> &str {
    line.find(';').map_or(line, |pos| &line[..pos])
}

fn split_label(text: &str) -> Option<(String, &str)> {
    let colon_pos = text.find(':')?;
    let label = text[..colon_pos].trim();
    is_valid_label(label).then(|| (label.to_owned(), &text[colon_pos + 1..]))
}

/// Label names: a letter or `_`, then letters, digits or `_`. Register names
/// are reserved.
#[must_use]
pub fn is_valid_label(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != '_' {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !looks_like_register(s)
}

fn parse_instruction(text: &str) -> Result<ParsedInstruction, ParseErrorKind> {
    let tokens = tokenize(text);
    let Some((mnemonic, operands)) = tokens.split_first() else {
        return Err(ParseErrorKind::InvalidSyntax(text.to_owned()));
    };
    let op = OpCode::from_mnemonic(mnemonic)
        .ok_or_else(|| ParseErrorKind::UnknownMnemonic((*mnemonic).to_owned()))?;
    let operands = operands
        .iter()
        .map(|token| parse_operand(token))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ParsedInstruction { op, operands })
}

fn tokenize(text: &str) -> Vec<&str> {
    text.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .collect()
}

fn looks_like_register(s: &str) -> bool {
    s.strip_prefix(['R', 'r'])
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

fn parse_register(s: &str) -> Result<Register, ParseErrorKind> {
    s[1..]
        .parse::<usize>()
        .ok()
        .and_then(Register::from_index)
        .ok_or_else(|| ParseErrorKind::InvalidRegister(s.to_owned()))
}

fn parse_operand(token: &str) -> Result<ParsedOperand, ParseErrorKind> {
    if looks_like_register(token) {
        return parse_register(token).map(ParsedOperand::Register);
    }

    if let Some(literal) = token.strip_prefix('#') {
        return parse_numeric_value(literal).map(ParsedOperand::Immediate);
    }

    if token.starts_with(|c: char| c.is_ascii_digit() || c == '-' || c == '+') {
        return parse_numeric_value(token).map(ParsedOperand::Immediate);
    }

    if is_valid_label(token) {
        return Ok(ParsedOperand::Label(token.to_owned()));
    }

    Err(ParseErrorKind::InvalidSyntax(token.to_owned()))
}

/// Parses a decimal, `0x` hexadecimal or `0b` binary literal with an optional
/// sign.
///
/// # Errors
///
/// Returns [`ParseErrorKind::InvalidImmediate`] for malformed literals.
pub fn parse_numeric_value(s: &str) -> Result<i64, ParseErrorKind> {
    let s = s.trim();
    let err = || ParseErrorKind::InvalidImmediate(s.to_owned());

    let (negative, digits) = s
        .strip_prefix('-')
        .map_or((false, s.strip_prefix('+').unwrap_or(s)), |rest| (true, rest));
    if digits.contains(['-', '+']) {
        return Err(err());
    }

    let (radix, body) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (2, bin)
    } else {
        (10, digits)
    };

    let magnitude = i64::from_str_radix(body, radix).map_err(|_| err())?;
    Ok(if negative { -magnitude } else { magnitude })
}
