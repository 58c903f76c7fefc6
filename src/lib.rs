// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/lib.rs

// Crate root. Sessions, whole-program helpers, and the interactive
// loop used by the binary.

// <>

//! EMBER, an embeddable scripting language
//!
//! A small Lisp-shaped language evaluated directly from its literal
//! structure, meant to be driven by a host program through native
//! functions and host types.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::rc::Rc;

pub mod args;
pub mod closure;
pub mod coerce;
pub mod config;
pub mod context;
pub mod error;
pub mod eval;
pub mod host;
pub mod parser;
mod stack;
pub mod stdenv;
pub mod value;

pub use closure::{Closure, NativeFn, UserData};
pub use config::Config;
pub use context::Context;
pub use error::{LoadError, ParseError, ParseErrorKind, Warning};
pub use eval::evaluate;
pub use host::{HostType, TypeRegistry, TypeResolver};
pub use parser::{parse, parse_file};
pub use value::{Opaque, Value, Variable};

/// A root context and everything evaluated in it
///
/// Dropping a session clears its root bindings, which releases any
/// closures that would otherwise keep their defining scopes alive
/// through each other.
pub struct Session {
    root: Rc<Context>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            root: Context::new_root(config),
        }
    }

    pub fn root(&self) -> &Rc<Context> {
        &self.root
    }

    /// Evaluates one top-level form
    ///
    /// A `break` left pending by an earlier form does not carry over.
    pub fn eval_form(&self, form: &Value) -> Option<Value> {
        self.root.set_running(true);
        evaluate(&self.root, form)
    }

    /// Parses and evaluates a program, yielding the last form's result
    pub fn eval_str(&self, text: &str) -> Result<Option<Value>, ParseError> {
        let forms = parse(text)?;
        Ok(self.run(&forms))
    }

    /// Evaluates a sequence of forms, yielding the last one's result
    pub fn run(&self, forms: &[Value]) -> Option<Value> {
        let mut out = None;
        for form in forms {
            out = self.eval_form(form);
        }
        out
    }

    /// Like `run`, writing each form and its result to `out`
    pub fn run_echo(&self, forms: &[Value], out: &mut impl Write) -> io::Result<Option<Value>> {
        let mut last = None;
        for form in forms {
            writeln!(out, "{}", form)?;
            last = self.eval_form(form);
            if let Some(val) = &last {
                writeln!(out, "= {}", val)?;
            }
        }
        Ok(last)
    }

    pub fn take_warnings(&self) -> Vec<Warning> {
        self.root.take_warnings()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.root.clear();
    }
}

/// Interprets a program in a fresh session, returning the displayed
/// result of its last form
///
/// A program whose last form produced nothing yields an empty string.
pub fn interpret(code: &str) -> Result<String, ParseError> {
    let session = Session::new();
    let out = session.eval_str(code)?;
    Ok(out.map_or_else(String::new, |v| v.to_string()))
}

/// Runs a source file, echoing every form and its result to stdout
pub fn run_file(path: impl AsRef<Path>, config: Config) -> Result<Option<Value>, LoadError> {
    let path = path.as_ref();
    let forms = parse_file(path)?;
    log::debug!("loaded {} forms from {}", forms.len(), path.display());

    let session = Session::with_config(config);
    let stdout = io::stdout();
    session
        .run_echo(&forms, &mut stdout.lock())
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Whether more input could complete a failed parse
fn incomplete(err: &ParseError) -> bool {
    matches!(
        err.kind,
        ParseErrorKind::UnclosedParen
            | ParseErrorKind::UnterminatedString
            | ParseErrorKind::UnterminatedComment
    )
}

/// Reads forms from `input` until it ends, echoing each with its result
///
/// Input is gathered across lines while a form is still open. Parse
/// errors are logged and the pending text discarded.
pub fn repl(input: impl BufRead, out: &mut impl Write, config: Config) -> io::Result<()> {
    let session = Session::with_config(config);
    let mut pending = String::new();

    for line in input.lines() {
        pending.push_str(&line?);
        pending.push('\n');

        match parse(&pending) {
            Ok(forms) => {
                session.run_echo(&forms, out)?;
                pending.clear();
            }
            Err(e) if incomplete(&e) => continue,
            Err(e) => {
                log::error!("{}", e);
                pending.clear();
            }
        }
        out.flush()?;
    }

    if !pending.trim().is_empty() {
        log::error!("input ended inside an unfinished form");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quiet(session: &Session, text: &str) -> String {
        let out = session.eval_str(text).unwrap();
        let warnings = session.take_warnings();
        assert!(warnings.is_empty(), "{:?}", warnings);
        out.map_or("<none>".to_string(), |v| v.to_string())
    }

    #[test]
    fn returns() {
        let exp = String::from("42");
        assert_eq!(exp, interpret(&exp).unwrap());
    }

    #[test]
    fn adds() {
        assert_eq!("4", interpret("(+ 2 2)").unwrap());
        assert_eq!("3.0", interpret("(+ 1 2.0)").unwrap());
    }

    #[test]
    fn nothing_displays_empty() {
        assert_eq!("", interpret("(while FALSE 1)").unwrap());
        assert!(interpret("(+ 1").is_err());
    }

    #[test]
    fn literal_arrays_round_trip() {
        let forms = parse("(1 2 3)").unwrap();
        assert_eq!(1, forms.len());
        assert_eq!("(1 2 3)", forms[0].to_string());

        let Value::Array(items) = &forms[0] else {
            panic!("not an array");
        };
        let items = items.borrow();
        assert_eq!(3, items.len());
        for (i, item) in items.iter().enumerate() {
            assert!(matches!(item, Value::Integer(n) if *n == i as i64 + 1));
        }
    }

    #[test]
    fn let_bindings_do_not_leak() {
        let session = Session::new();
        assert_eq!("2", quiet(&session, "(let ((x 1)) (+ x 1))"));
        assert!(session.root().lookup("x").is_none());
    }

    #[test]
    fn closures_capture_scope() {
        let session = Session::new();
        assert_eq!(
            "8",
            quiet(&session, "(def (adder n) (lambda (x) (+ x n))) ((adder 5) 3)")
        );
        assert_eq!(
            "13",
            quiet(&session, "(def add10 (adder 10)) (add10 3)")
        );
    }

    #[test]
    fn break_leaves_outer_loop_running() {
        let session = Session::new();
        let text = "
            (def n 0)
            (def hits 0)
            (while (< n 3)
              (set! n (+ n 1))
              (for i (range 1 5)
                (if (= i 2) (break))
                (set! hits (+ hits 1))))
            (array n hits)";
        assert_eq!("(3 3)", quiet(&session, text));
    }

    #[test]
    fn unmatched_cond_yields_nothing() {
        let session = Session::new();
        assert_eq!("<none>", quiet(&session, "(cond (FALSE 1) ((= 1 2) 2))"));
        assert_eq!("3", quiet(&session, "(+ 1 2)"));
    }

    #[test]
    fn negative_numbers_lex_as_integers() {
        let forms = parse("-5").unwrap();
        assert!(matches!(forms[0], Value::Integer(-5)));
        assert_eq!("-2", interpret("(+ -5 3)").unwrap());
    }

    #[test]
    fn array_get_out_of_bounds() {
        let session = Session::new();
        quiet(&session, "(def a (array 1 2 3))");

        assert_eq!(None, session.eval_str("(array-get a 3)").unwrap());
        assert_eq!(
            vec![Warning::IndexOutOfBounds { func: "array-get" }],
            session.take_warnings()
        );
        assert_eq!("(1 2 3)", quiet(&session, "a"));
    }

    #[test]
    fn arity_mismatch_binds_nothing() {
        let session = Session::new();
        quiet(&session, "(def (f a b) (+ a b))");

        assert_eq!(None, session.eval_str("(f 1 2 3)").unwrap());
        assert_eq!(
            vec![Warning::Arity {
                name: "f".to_string(),
                expected: 2,
                found: 3
            }],
            session.take_warnings()
        );
        assert!(session.root().lookup("a").is_none());
    }

    #[test]
    fn stray_break_is_reset_between_forms() {
        let session = Session::new();
        session.eval_str("(break)").unwrap();
        assert_eq!("1", quiet(&session, "(begin 1)"));
    }

    #[test]
    fn host_functions_receive_user_data() {
        fn scaled(ctx: &Rc<Context>, raw: &[Value], data: &UserData) -> Option<Value> {
            let mut args = args::Args::new(ctx, "scaled", raw).exactly(1)?;
            let n = args.expect_integer()?;
            let factor = data.as_ref()?.downcast_ref::<i64>()?;
            Some(Value::Integer(n * factor))
        }

        let session = Session::new();
        assert!(session
            .root()
            .add_native_function("scaled", scaled, Some(Rc::new(3i64))));
        assert_eq!("12", quiet(&session, "(scaled (+ 2 2))"));
    }

    #[test]
    fn echoes_forms_and_results() {
        let session = Session::new();
        let forms = parse("(def x 2) (while FALSE 0) (* x 3)").unwrap();

        let mut out = Vec::new();
        let last = session.run_echo(&forms, &mut out).unwrap();
        assert_eq!(Some("6".to_string()), last.map(|v| v.to_string()));
        assert_eq!(
            "(def x 2)\n= TRUE\n(while FALSE 0)\n(* x 3)\n= 6\n",
            String::from_utf8(out).unwrap()
        );
    }

    #[test]
    fn repl_joins_open_forms() {
        let input = io::Cursor::new("(+ 1\n 2)\n)\n(- 5 1)\n");
        let mut out = Vec::new();
        repl(input, &mut out, Config::default()).unwrap();
        assert_eq!("(+ 1 2)\n= 3\n(- 5 1)\n= 4\n", String::from_utf8(out).unwrap());
    }
}
