// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/parser.rs

// Reads source text into literal values

// <>

use std::fs;
use std::path::Path;

use crate::error::{LoadError, ParseError, ParseErrorKind};
use crate::stack::ensure_sufficient_stack;
use crate::stdenv;
use crate::value::Value;

/// Parses source text into its sequence of top-level values
pub fn parse(text: &str) -> Result<Vec<Value>, ParseError> {
    let mut rdr = Reader::new(text);
    let mut out = Vec::new();

    while let Some(val) = rdr.read_value()? {
        out.push(val);
    }

    Ok(out)
}

/// Parses a whole source file
pub fn parse_file(path: impl AsRef<Path>) -> Result<Vec<Value>, LoadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(parse(&text).map_err(|e| e.in_file(path))?)
}

/// Deepest list nesting the reader accepts
pub const MAX_NESTING: usize = 1024;

fn is_ident_first(c: char) -> bool {
    c.is_ascii_alphabetic() || "#=_+-*/%!&<>.".contains(c)
}

fn is_ident_nth(c: char) -> bool {
    c.is_ascii_alphanumeric() || "=_+-*/%!&<>.".contains(c)
}

struct Reader<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
    column: usize,
    depth: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            line: 1,
            column: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.src[self.pos..].chars().nth(1)
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Error located at the next unread character
    fn error(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.line, self.column + 1)
    }

    /// Skips whitespace and both comment styles
    fn skip_space(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.next();
                }
                Some(';') => {
                    while let Some(c) = self.next() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    self.next();
                    self.next();
                    loop {
                        match self.next() {
                            Some('*') if self.peek() == Some('/') => {
                                self.next();
                                break;
                            }
                            Some(_) => continue,
                            None => return Err(self.error(ParseErrorKind::UnterminatedComment)),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Reads the next value; `None` at end of input
    fn read_value(&mut self) -> Result<Option<Value>, ParseError> {
        self.skip_space()?;

        let c = match self.peek() {
            Some(c) => c,
            None => return Ok(None),
        };

        let val = match c {
            '(' => {
                if self.depth >= MAX_NESTING {
                    return Err(self.error(ParseErrorKind::NestingTooDeep));
                }
                self.next();

                self.depth += 1;
                let list = ensure_sufficient_stack(|| self.read_list());
                self.depth -= 1;
                list?
            }
            ')' => return Err(self.error(ParseErrorKind::UnbalancedParen)),
            '"' => {
                self.next();
                self.read_string()?
            }
            '\'' => {
                self.next();
                self.read_raw_string()?
            }
            c if c.is_ascii_digit() => self.read_number()?,
            '.' if self.peek_second().map_or(false, |d| d.is_ascii_digit()) => {
                self.read_number()?
            }
            c if is_ident_first(c) => self.read_symbol(),
            c => return Err(self.error(ParseErrorKind::UnexpectedCharacter(c))),
        };

        Ok(Some(val))
    }

    fn read_list(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();

        loop {
            self.skip_space()?;
            match self.peek() {
                Some(')') => {
                    self.next();
                    return Ok(Value::array(items));
                }
                None => return Err(self.error(ParseErrorKind::UnclosedParen)),
                Some(_) => {
                    if let Some(val) = self.read_value()? {
                        items.push(val);
                    }
                }
            }
        }
    }

    fn read_string(&mut self) -> Result<Value, ParseError> {
        let mut acc = String::new();

        loop {
            match self.next() {
                Some('"') => return Ok(Value::String(acc)),
                Some('\\') => match self.next() {
                    Some('n') => acc.push('\n'),
                    Some('t') => acc.push('\t'),
                    Some('r') => acc.push('\r'),
                    Some('b') => acc.push('\u{8}'),
                    Some('f') => acc.push('\u{c}'),
                    Some(d @ '0'..='7') => {
                        let mut code = d.to_digit(8).unwrap_or(0);
                        for _ in 0..2 {
                            match self.peek().and_then(|c| c.to_digit(8)) {
                                Some(n) => {
                                    code = code * 8 + n;
                                    self.next();
                                }
                                None => break,
                            }
                        }
                        acc.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
                    }
                    Some(c) => acc.push(c),
                    None => return Err(self.error(ParseErrorKind::UnterminatedString)),
                },
                Some(c) => acc.push(c),
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
            }
        }
    }

    fn read_raw_string(&mut self) -> Result<Value, ParseError> {
        let mut acc = String::new();

        loop {
            match self.next() {
                Some('\'') => return Ok(Value::String(acc)),
                Some(c) => acc.push(c),
                None => return Err(self.error(ParseErrorKind::UnterminatedString)),
            }
        }
    }

    fn read_number(&mut self) -> Result<Value, ParseError> {
        let (line, column) = (self.line, self.column + 1);
        let mut acc = String::new();

        while let Some(c) = self.peek() {
            let exp_sign = (c == '+' || c == '-')
                && acc.ends_with(['e', 'E'])
                && !acc.starts_with("0x")
                && !acc.starts_with("0X");

            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exp_sign {
                acc.push(c);
                self.next();
            } else {
                break;
            }
        }

        match self.peek() {
            None | Some('(' | ')' | ';' | '"' | '\'') => {}
            Some(c) if c.is_whitespace() => {}
            Some(_) => return Err(self.error(ParseErrorKind::NonDigitInNumber)),
        }

        lex_number(&acc).map_err(|kind| ParseError::new(kind, line, column))
    }

    fn read_symbol(&mut self) -> Value {
        let mut acc = String::new();

        if let Some(c) = self.next() {
            acc.push(c);
        }

        while let Some(c) = self.peek() {
            if !is_ident_nth(c) {
                break;
            }
            acc.push(c);
            self.next();
        }

        if let Some(val) = stdenv::predefined(&acc) {
            return val;
        }

        if let Some(val) = negative_number(&acc) {
            return val;
        }

        Value::symbol(acc)
    }
}

/// Re-lexes an identifier spelled like a negative number
fn negative_number(text: &str) -> Option<Value> {
    let rest = text.strip_prefix('-')?;
    if !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }

    match lex_number(rest).ok()? {
        Value::Integer(i) => Some(Value::Integer(i.wrapping_neg())),
        Value::Float(f) => Some(Value::Float(-f)),
        _ => None,
    }
}

/// Converts a complete numeric token into its value
fn lex_number(text: &str) -> Result<Value, ParseErrorKind> {
    if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if digits.contains('.') {
            return Err(ParseErrorKind::NonDecimalFloat);
        }
        return u64::from_str_radix(digits, 16)
            .map(|n| Value::Integer(n as i64))
            .map_err(|_| ParseErrorKind::NonDigitInNumber);
    }

    if !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(match text.parse::<i64>() {
            Ok(i) => Value::Integer(i),
            Err(_) => Value::Float(text.parse::<f64>().map_err(|_| ParseErrorKind::MalformedFloat)?),
        });
    }

    if text
        .chars()
        .any(|c| !(c.is_ascii_digit() || "eE.+-".contains(c)))
    {
        return Err(ParseErrorKind::NonDigitInNumber);
    }

    if text.matches('.').count() > 1 {
        return Err(ParseErrorKind::MalformedFloat);
    }

    text.parse::<f64>()
        .map(Value::Float)
        .map_err(|_| ParseErrorKind::MalformedFloat)
}
