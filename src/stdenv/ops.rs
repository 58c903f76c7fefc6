// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/stdenv/ops.rs

// Arithmetic, logic, and comparison operators

// <>

use std::cmp::Ordering;
use std::rc::Rc;

use crate::args::Args;
use crate::coerce::{self, ArithOp};
use crate::context::Context;
use crate::eval::evaluate;
use crate::value::Value;

/// Folds the arguments left to right, stopping at the first failure
fn arithmetic(ctx: &Rc<Context>, func: &'static str, raw: &[Value], op: ArithOp) -> Option<Value> {
    let mut args = Args::new(ctx, func, raw).at_least(2)?;
    let mut acc = args.expect_value()?;

    for form in args.rest() {
        let val = evaluate(ctx, form)?;
        acc = match coerce::arith(op, &acc, &val) {
            Ok(out) => out,
            Err(w) => {
                ctx.warn(w);
                return None;
            }
        };
    }

    Some(acc)
}

/// Checks every adjacent pair of evaluated operands
///
/// Incomparable pairs warn; they count as unequal and fail every
/// ordering test.
fn chain(
    ctx: &Rc<Context>,
    func: &'static str,
    raw: &[Value],
    test: fn(Ordering) -> bool,
    unequal: bool,
) -> Option<Value> {
    Args::new(ctx, func, raw).at_least(2)?;

    let mut vals = Vec::with_capacity(raw.len());
    for form in raw {
        vals.push(evaluate(ctx, form)?);
    }

    for pair in vals.windows(2) {
        let ok = match coerce::compare(&pair[0], &pair[1]) {
            Ok(ord) => test(ord),
            Err(w) => {
                ctx.warn(w);
                unequal
            }
        };

        if !ok {
            return Some(Value::Boolean(false));
        }
    }

    Some(Value::Boolean(true))
}

ember_fn! {
    const OPS;
    ctx raw func;

    "+" { arithmetic(ctx, func, raw, ArithOp::Add) }

    "-" { arithmetic(ctx, func, raw, ArithOp::Sub) }

    "*" { arithmetic(ctx, func, raw, ArithOp::Mul) }

    "/" { arithmetic(ctx, func, raw, ArithOp::Div) }

    "%" { arithmetic(ctx, func, raw, ArithOp::Rem) }

    "and" {
        Args::new(ctx, func, raw).at_least(1)?;

        let mut last = None;
        for form in raw {
            let val = evaluate(ctx, form)?;
            if !val.truthy() {
                return Some(val);
            }
            last = Some(val);
        }
        last
    }

    "or" {
        Args::new(ctx, func, raw).at_least(1)?;

        let mut last = None;
        for form in raw {
            last = evaluate(ctx, form);
            if last.as_ref().map_or(false, Value::truthy) {
                break;
            }
        }
        last
    }

    "not" {
        let mut args = Args::new(ctx, func, raw).exactly(1)?;
        Some(Value::Boolean(!args.expect_value()?.truthy()))
    }

    ">" { chain(ctx, func, raw, Ordering::is_gt, false) }

    ">=" { chain(ctx, func, raw, Ordering::is_ge, false) }

    "=" { chain(ctx, func, raw, Ordering::is_eq, false) }

    "<" { chain(ctx, func, raw, Ordering::is_lt, false) }

    "<=" { chain(ctx, func, raw, Ordering::is_le, false) }

    "!=" { chain(ctx, func, raw, Ordering::is_ne, true) }
}
