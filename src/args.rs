// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/args.rs

// Argument decoding for native functions. Each expected argument is
// either taken literally or evaluated and checked for a kind; the
// first failure emits a warning and ends the decode.

// <>

use std::rc::Rc;

use crate::closure::Closure;
use crate::context::Context;
use crate::error::Warning;
use crate::eval;
use crate::value::{Array, Mapping, Value};

/// Ordered, fail-fast view over the raw arguments of one call
///
/// Every `expect_*` method consumes one argument and returns `None`
/// after warning on failure, so a form decodes all of its arguments
/// with `?` before acting on any of them.
pub struct Args<'a> {
    ctx: &'a Rc<Context>,
    func: &'static str,
    raw: &'a [Value],
    next: usize,
}

/// Looks through variable references
fn strip(val: Value) -> Value {
    match val {
        Value::Variable(var) => var.resolve(),
        other => other,
    }
}

impl<'a> Args<'a> {
    pub fn new(ctx: &'a Rc<Context>, func: &'static str, raw: &'a [Value]) -> Self {
        Self {
            ctx,
            func,
            raw,
            next: 0,
        }
    }

    pub fn exactly(self, n: usize) -> Option<Self> {
        if self.raw.len() != n {
            self.ctx.warn(Warning::NeedsExactly { func: self.func, n });
            return None;
        }
        Some(self)
    }

    pub fn at_least(self, n: usize) -> Option<Self> {
        if self.raw.len() < n {
            self.ctx.warn(Warning::NeedsAtLeast { func: self.func, n });
            return None;
        }
        Some(self)
    }

    pub fn remaining(&self) -> usize {
        self.raw.len() - self.next
    }

    /// Every argument not yet consumed, left unevaluated
    pub fn rest(&mut self) -> &'a [Value] {
        let rest = &self.raw[self.next..];
        self.next = self.raw.len();
        rest
    }

    fn take(&mut self) -> Option<&'a Value> {
        let raw = self.raw.get(self.next);
        if raw.is_none() {
            self.ctx.warn(Warning::NeedsAtLeast {
                func: self.func,
                n: self.next + 1,
            });
        }
        self.next += 1;
        raw
    }

    fn wrong_kind(&self, expected: &'static str, found: &Value) {
        self.ctx.warn(Warning::WrongKind {
            func: self.func,
            expected,
            found: found.kind_name(),
        });
    }

    /// Next argument as written
    pub fn expect_literal(&mut self) -> Option<Value> {
        self.take().cloned()
    }

    /// Next argument as written, which must be an array literal
    pub fn expect_literal_array(&mut self) -> Option<Array> {
        match self.take()? {
            Value::Array(a) => Some(a.clone()),
            other => {
                self.wrong_kind("array", other);
                None
            }
        }
    }

    /// Next argument as a name: a symbol or string literal
    pub fn expect_name(&mut self) -> Option<String> {
        match self.take()? {
            Value::Symbol(s) => Some(s.name.clone()),
            Value::String(s) => Some(s.clone()),
            other => {
                self.ctx.warn(Warning::InvalidArgumentName {
                    func: self.func,
                    name: other.to_string(),
                });
                None
            }
        }
    }

    /// Next argument, evaluated
    pub fn expect_value(&mut self) -> Option<Value> {
        let raw = self.take()?;
        eval::evaluate(self.ctx, raw)
    }

    fn expect_kind<T>(
        &mut self,
        expected: &'static str,
        pick: impl FnOnce(&Value) -> Option<T>,
    ) -> Option<T> {
        let val = strip(self.expect_value()?);
        let out = pick(&val);
        if out.is_none() {
            self.wrong_kind(expected, &val);
        }
        out
    }

    pub fn expect_string(&mut self) -> Option<String> {
        self.expect_kind("string", |v| match v {
            Value::String(s) => Some(s.clone()),
            _ => None,
        })
    }

    pub fn expect_array(&mut self) -> Option<Array> {
        self.expect_kind("array", |v| match v {
            Value::Array(a) => Some(a.clone()),
            _ => None,
        })
    }

    pub fn expect_integer(&mut self) -> Option<i64> {
        self.expect_kind("integer", |v| match v {
            Value::Integer(i) => Some(*i),
            _ => None,
        })
    }

    pub fn expect_boolean(&mut self) -> Option<bool> {
        self.expect_kind("boolean", |v| match v {
            Value::Boolean(b) => Some(*b),
            _ => None,
        })
    }

    pub fn expect_closure(&mut self) -> Option<Rc<Closure>> {
        self.expect_kind("closure", |v| match v {
            Value::Closure(c) => Some(c.clone()),
            _ => None,
        })
    }

    pub fn expect_mapping(&mut self) -> Option<Mapping> {
        self.expect_kind("mapping", |v| match v {
            Value::Mapping(m) => Some(m.clone()),
            _ => None,
        })
    }
}
