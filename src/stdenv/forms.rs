// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/stdenv/forms.rs

// Special forms: binding, conditionals, loops, and sequencing. Each
// one decides for itself which of its arguments get evaluated.

// <>

use std::rc::Rc;

use crate::args::Args;
use crate::closure::Closure;
use crate::context::Context;
use crate::error::Warning;
use crate::eval::{eval_body, evaluate};
use crate::value::{Value, Variable};

/// Extracts a list of names from symbol or string literals
fn names_of(ctx: &Rc<Context>, func: &'static str, list: &[Value]) -> Option<Vec<String>> {
    let mut args = Args::new(ctx, func, list);
    (0..list.len()).map(|_| args.expect_name()).collect()
}

fn is_else(val: &Value) -> bool {
    matches!(val, Value::Symbol(s) if s.name == "else")
}

/// Warns and fails when `name` is already visible from `ctx`
fn ensure_unbound(ctx: &Context, func: &'static str, name: &str) -> Option<()> {
    if ctx.lookup_variable(name).is_some() {
        ctx.warn(Warning::SymbolExists {
            func,
            name: name.to_string(),
        });
        return None;
    }
    Some(())
}

fn lambda(ctx: &Rc<Context>, func: &'static str, raw: &[Value]) -> Option<Value> {
    let mut args = Args::new(ctx, func, raw).at_least(1)?;
    let params = args.expect_literal_array()?;
    let params = names_of(ctx, func, &params.borrow())?;

    Some(Value::closure(Closure::interpreted(
        "lambda",
        params,
        args.rest().to_vec(),
        ctx,
    )))
}

fn truth(ctx: &Rc<Context>, form: &Value) -> bool {
    evaluate(ctx, form).map_or(false, |v| v.truthy())
}

ember_fn! {
    const FORMS;
    ctx raw func;

    "def" {
        let mut args = Args::new(ctx, func, raw).at_least(2)?;

        if let Value::Array(sig) = &raw[0] {
            args.expect_literal()?;
            let names = names_of(ctx, func, &sig.borrow())?;
            let (name, params) = match names.split_first() {
                Some(split) => split,
                None => {
                    ctx.warn(Warning::InvalidArgumentName { func, name: "()".into() });
                    return None;
                }
            };
            ensure_unbound(ctx, func, name)?;

            // bound in the defining scope after creation so the body
            // can call itself
            let clo = Closure::interpreted(name.as_str(), params.to_vec(), args.rest().to_vec(), ctx);
            ctx.insert(name.as_str(), Value::closure(clo));
            return Some(Value::Boolean(true));
        }

        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let name = args.expect_name()?;
        ensure_unbound(ctx, func, &name)?;
        let val = args.expect_value()?;

        ctx.insert(name, val.deep_copy());
        Some(Value::Boolean(true))
    }

    "lambda" { lambda(ctx, func, raw) }

    "closure" { lambda(ctx, func, raw) }

    "let" {
        let mut args = Args::new(ctx, func, raw).at_least(2)?;

        let name = match &raw[0] {
            Value::Symbol(_) | Value::String(_) => {
                if raw.len() < 3 {
                    ctx.warn(Warning::NeedsAtLeast { func, n: 3 });
                    return None;
                }
                Some(args.expect_name()?)
            }
            _ => None,
        };

        let bindings = args.expect_literal_array()?;
        let bindings = bindings.borrow().clone();

        // initializers see only the outer scope
        let mut names = Vec::with_capacity(bindings.len());
        let mut vals = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            let pair = match binding {
                Value::Array(pair) => pair.borrow().clone(),
                other => {
                    ctx.warn(Warning::WrongKind { func, expected: "binding pair", found: other.kind_name() });
                    return None;
                }
            };

            let mut pair_args = Args::new(ctx, func, &pair).exactly(2)?;
            names.push(pair_args.expect_name()?);
            vals.push(pair_args.expect_value()?.deep_copy());
        }

        let body = args.rest();
        let local = ctx.child();

        if let Some(name) = name {
            let clo = Closure::interpreted(name.as_str(), names.clone(), body.to_vec(), &local);
            local.insert(name, Value::closure(clo));
        }

        for (name, val) in names.into_iter().zip(vals) {
            local.insert(name, val);
        }

        eval_body(&local, body)
    }

    "begin" {
        Args::new(ctx, func, raw).at_least(1)?;
        eval_body(ctx, raw)
    }

    "set!" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let name = args.expect_name()?;
        let val = args.expect_value()?;

        let var = match ctx.lookup_variable(&name) {
            Some(var) => var,
            None => {
                ctx.warn(Warning::UnknownSymbol(name));
                return None;
            }
        };

        // a binding holding a reference writes through it
        match var.get() {
            Value::Variable(target) => target.set(val.deep_copy()),
            _ => var.set(val.deep_copy()),
        }

        Some(val)
    }

    "get&" {
        let mut args = Args::new(ctx, func, raw).exactly(1)?;
        let name = args.expect_name()?;

        match ctx.lookup_variable(&name) {
            Some(var) => Some(Value::Variable(var)),
            None => {
                ctx.warn(Warning::UnknownSymbol(name));
                None
            }
        }
    }

    "if" {
        Args::new(ctx, func, raw).at_least(2)?;

        if truth(ctx, &raw[0]) {
            evaluate(ctx, &raw[1])
        } else {
            evaluate(ctx, raw.get(2)?)
        }
    }

    "cond" {
        let mut args = Args::new(ctx, func, raw);

        for _ in 0..raw.len() {
            let clause = args.expect_literal_array()?;
            let clause = clause.borrow().clone();
            let (test, body) = match clause.split_first() {
                Some(split) => split,
                None => continue,
            };

            let passed = if is_else(test) {
                Value::Boolean(true)
            } else {
                evaluate(ctx, test)?
            };

            if passed.truthy() {
                if body.is_empty() {
                    return Some(passed);
                }
                return eval_body(ctx, body);
            }
        }

        None
    }

    "case" {
        let mut args = Args::new(ctx, func, raw).at_least(2)?;
        let subject = args.expect_value()?;

        for _ in 1..raw.len() {
            let clause = args.expect_literal_array()?;
            let clause = clause.borrow().clone();
            let (keys, body) = match clause.split_first() {
                Some(split) => split,
                None => continue,
            };

            let hit = match keys {
                k if is_else(k) => true,
                Value::Array(keys) => {
                    let keys = keys.borrow().clone();
                    keys.iter()
                        .filter_map(|k| evaluate(ctx, k))
                        .any(|k| subject.equals(&k))
                }
                single => evaluate(ctx, single).map_or(false, |k| subject.equals(&k)),
            };

            if hit {
                return eval_body(ctx, body);
            }
        }

        None
    }

    "while" {
        Args::new(ctx, func, raw).at_least(2)?;
        let (cond, body) = raw.split_first()?;

        let local = ctx.loop_child();
        while local.running() && truth(ctx, cond) {
            eval_body(&local, body);
        }

        None
    }

    "for" {
        let mut args = Args::new(ctx, func, raw).at_least(2)?;
        let name = args.expect_name()?;
        let items = args.expect_array()?.borrow().clone();
        let body = args.rest();

        let local = ctx.loop_child();
        let iter = Variable::new(Value::null());
        local.insert_variable(name, iter.clone());

        for item in items {
            if !local.running() {
                break;
            }
            iter.set(item.deep_copy());
            eval_body(&local, body);
        }

        None
    }

    "break" {
        ctx.break_nearest();
        None
    }

    "print" {
        Args::new(ctx, func, raw).at_least(1)?;

        let mut line = String::new();
        for form in raw {
            if let Some(val) = evaluate(ctx, form) {
                line.push_str(&val.to_plain_string());
            }
        }
        println!("{}", line);

        None
    }

    "quote" {
        let mut args = Args::new(ctx, func, raw).exactly(1)?;
        args.expect_literal()
    }
}
