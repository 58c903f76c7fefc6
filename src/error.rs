// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/error.rs

// Errors and recoverable diagnostics. Parse errors are fatal to one
// parse call; warnings are logged and turn the failing expression
// into "no result" without stopping the program.

// <>

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// What went wrong while tokenizing or reading source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    UnterminatedString,
    UnterminatedComment,
    NonDigitInNumber,
    NonDecimalFloat,
    MalformedFloat,
    UnexpectedCharacter(char),
    UnbalancedParen,
    UnclosedParen,
    NestingTooDeep,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnterminatedString => write!(f, "Unterminated string constant"),
            ParseErrorKind::UnterminatedComment => write!(f, "Unterminated comment"),
            ParseErrorKind::NonDigitInNumber => write!(f, "Non-digit character in a number"),
            ParseErrorKind::NonDecimalFloat => write!(f, "Non-decimal floating point number"),
            ParseErrorKind::MalformedFloat => write!(f, "Malformed floating point number"),
            ParseErrorKind::UnexpectedCharacter(c) => write!(f, "Unexpected character {:?}", c),
            ParseErrorKind::UnbalancedParen => write!(f, "Unbalanced closing parenthesis"),
            ParseErrorKind::UnclosedParen => write!(f, "Unexpected end of file inside a list"),
            ParseErrorKind::NestingTooDeep => write!(f, "Lists nested too deeply"),
        }
    }
}

/// Fatal tokenizer / reader failure with its source position
///
/// Lines and columns both count from 1.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub line: usize,
    pub column: usize,
    pub file: Option<PathBuf>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: usize, column: usize) -> Self {
        Self {
            kind,
            line,
            column,
            file: None,
        }
    }

    pub fn in_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.file {
            write!(f, "{}: ", file.display())?;
        }
        write!(f, "{} at line {}, char {}", self.kind, self.line, self.column)
    }
}

/// Failure to load a script file
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// Recoverable diagnostics raised during evaluation
///
/// None of these abort a program. The expression that raised one
/// produces no result and its enclosing form carries on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("{func}: values could not be coerced to a common type")]
    Coercion { func: &'static str },

    #[error("values cannot be compared")]
    Incomparable,

    #[error("{func}: division by zero")]
    DivisionByZero { func: &'static str },

    #[error("unknown symbol '{0}'")]
    UnknownSymbol(String),

    #[error("value of kind {0} is not callable")]
    NotCallable(&'static str),

    #[error("{name}: expected {expected} arguments, got {found}")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("{func}: needs exactly {n} arguments")]
    NeedsExactly { func: &'static str, n: usize },

    #[error("{func}: needs at least {n} arguments")]
    NeedsAtLeast { func: &'static str, n: usize },

    #[error("{func}: expected {expected}, found {found}")]
    WrongKind {
        func: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{func}: index out of bounds")]
    IndexOutOfBounds { func: &'static str },

    #[error("{func}: invalid argument name '{name}'")]
    InvalidArgumentName { func: &'static str, name: String },

    #[error("{func}: symbol '{name}' already exists")]
    SymbolExists { func: &'static str, name: String },

    #[error("recursion limit of {0} reached")]
    RecursionLimit(usize),

    #[error("{func}: result would be too large")]
    TooLarge { func: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_position() {
        let err = ParseError::new(ParseErrorKind::UnterminatedString, 3, 7);
        assert_eq!(
            "Unterminated string constant at line 3, char 7",
            err.to_string()
        );

        let err = err.in_file("prog.em");
        assert_eq!(
            "prog.em: Unterminated string constant at line 3, char 7",
            err.to_string()
        );
    }

    #[test]
    fn warning_text() {
        let w = Warning::NeedsAtLeast { func: "let", n: 2 };
        assert_eq!("let: needs at least 2 arguments", w.to_string());

        let w = Warning::WrongKind {
            func: "array-get",
            expected: "array",
            found: "integer",
        };
        assert_eq!("array-get: expected array, found integer", w.to_string());
    }
}
