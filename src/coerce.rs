// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/coerce.rs

// Coercion of value pairs to a common simple type, and the
// arithmetic and ordering built on it

// <>

use std::cmp::Ordering;

use crate::error::Warning;
use crate::value::{Array, Value};

/// Two operands transformed into one common simple type
#[derive(Debug)]
pub enum Common {
    Integers(i64, i64),
    Floats(f64, f64),
    Strings(String, String),
    Booleans(bool, bool),
    Arrays(Array, Array),
    Opaques(usize, usize),
}

/// Strip variable references down to the value they hold
fn simple(v: &Value) -> Value {
    match v {
        Value::Variable(var) => var.resolve(),
        other => other.clone(),
    }
}

/// Find the common simple type of two values and transform both
/// operands into it
///
/// Mixed integer and float promote to float. Strings only pair with
/// strings, booleans with booleans, arrays with arrays. Any other
/// combination has no common type.
pub fn common(a: &Value, b: &Value) -> Option<Common> {
    match (simple(a), simple(b)) {
        (Value::Integer(x), Value::Integer(y)) => Some(Common::Integers(x, y)),
        (Value::Float(x), Value::Float(y)) => Some(Common::Floats(x, y)),
        (Value::Integer(x), Value::Float(y)) => Some(Common::Floats(x as f64, y)),
        (Value::Float(x), Value::Integer(y)) => Some(Common::Floats(x, y as f64)),
        (Value::String(x), Value::String(y)) => Some(Common::Strings(x, y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(Common::Booleans(x, y)),
        (Value::Array(x), Value::Array(y)) => Some(Common::Arrays(x, y)),
        (Value::Opaque(x), Value::Opaque(y)) => Some(Common::Opaques(x.address(), y.address())),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl ArithOp {
    pub fn name(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Rem => "%",
        }
    }
}

/// Apply one arithmetic operator to a pair of values
///
/// Integer arithmetic wraps. Adding strings concatenates them; adding
/// arrays yields a fresh array of the left elements followed by the
/// right ones.
pub fn arith(op: ArithOp, a: &Value, b: &Value) -> Result<Value, Warning> {
    let func = op.name();
    let fail = Warning::Coercion { func };

    match (op, common(a, b).ok_or(fail.clone())?) {
        (ArithOp::Add, Common::Integers(x, y)) => Ok(Value::Integer(x.wrapping_add(y))),
        (ArithOp::Sub, Common::Integers(x, y)) => Ok(Value::Integer(x.wrapping_sub(y))),
        (ArithOp::Mul, Common::Integers(x, y)) => Ok(Value::Integer(x.wrapping_mul(y))),
        (ArithOp::Div | ArithOp::Rem, Common::Integers(_, 0)) => {
            Err(Warning::DivisionByZero { func })
        }
        (ArithOp::Div, Common::Integers(x, y)) => Ok(Value::Integer(x.wrapping_div(y))),
        (ArithOp::Rem, Common::Integers(x, y)) => Ok(Value::Integer(x.wrapping_rem(y))),

        (ArithOp::Add, Common::Floats(x, y)) => Ok(Value::Float(x + y)),
        (ArithOp::Sub, Common::Floats(x, y)) => Ok(Value::Float(x - y)),
        (ArithOp::Mul, Common::Floats(x, y)) => Ok(Value::Float(x * y)),
        (ArithOp::Div, Common::Floats(x, y)) => Ok(Value::Float(x / y)),
        (ArithOp::Rem, Common::Floats(x, y)) => Ok(Value::Float(x % y)),

        (ArithOp::Add, Common::Strings(x, y)) => Ok(Value::String(x + &y)),
        (ArithOp::Add, Common::Arrays(x, y)) => {
            let mut items: Vec<Value> = x.borrow().iter().map(Value::deep_copy).collect();
            items.extend(y.borrow().iter().map(Value::deep_copy));
            Ok(Value::array(items))
        }

        _ => Err(fail),
    }
}

/// Order two values
///
/// Numbers order by magnitude, strings by ordinal comparison,
/// booleans false before true, opaque handles by identity. Anything
/// else is incomparable.
pub fn compare(a: &Value, b: &Value) -> Result<Ordering, Warning> {
    let ord = match common(a, b).ok_or(Warning::Incomparable)? {
        Common::Integers(x, y) => Some(x.cmp(&y)),
        Common::Floats(x, y) => x.partial_cmp(&y),
        Common::Strings(x, y) => Some(x.cmp(&y)),
        Common::Booleans(x, y) => Some(x.cmp(&y)),
        Common::Opaques(x, y) => Some(x.cmp(&y)),
        Common::Arrays(..) => None,
    };

    ord.ok_or(Warning::Incomparable)
}
