// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/closure.rs

// Callable values: host functions and user-defined closures

// <>

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::context::Context;
use crate::error::Warning;
use crate::eval;
use crate::stdenv;
use crate::value::Value;

/// Opaque data handed back to a native function on every call
pub type UserData = Option<Rc<dyn Any>>;

/// Host function signature
///
/// Receives the calling context and its arguments unevaluated.
/// Returning `None` means the call produced no result.
pub type NativeFn = fn(&Rc<Context>, &[Value], &UserData) -> Option<Value>;

pub enum Closure {
    Native {
        name: String,
        func: NativeFn,
        data: UserData,
    },
    Interpreted {
        name: String,
        params: Vec<String>,
        body: Vec<Value>,
        env: Rc<Context>,
    },
}

impl Closure {
    pub fn native(name: impl Into<String>, func: NativeFn, data: UserData) -> Self {
        Closure::Native {
            name: name.into(),
            func,
            data,
        }
    }

    /// Closure over `env`, the context it was defined in
    pub fn interpreted(
        name: impl Into<String>,
        params: Vec<String>,
        body: Vec<Value>,
        env: &Rc<Context>,
    ) -> Self {
        Closure::Interpreted {
            name: name.into(),
            params,
            body,
            env: env.clone(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Closure::Native { name, .. } | Closure::Interpreted { name, .. } => name,
        }
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Closure::Native { .. })
    }

    /// Calls this closure with the raw argument forms of an invocation
    ///
    /// Interpreted closures have every argument evaluated in the
    /// caller's context first, left to right; natives see them as
    /// written.
    pub fn invoke(&self, caller: &Rc<Context>, raw: &[Value]) -> Option<Value> {
        match self {
            Closure::Native { func, data, .. } => func(caller, raw, data),
            Closure::Interpreted { .. } => {
                let mut args = Vec::with_capacity(raw.len());
                for form in raw {
                    args.push(eval::evaluate(caller, form)?);
                }
                self.call_with_values(caller, args)
            }
        }
    }

    /// Calls this closure with arguments that are already values
    ///
    /// Natives receive each argument quoted where needed so that their
    /// own evaluation hands back the value unchanged.
    pub fn call_with_values(&self, caller: &Rc<Context>, args: Vec<Value>) -> Option<Value> {
        match self {
            Closure::Native { func, data, .. } => {
                let quoted: Vec<Value> = args.into_iter().map(quote).collect();
                func(caller, &quoted, data)
            }
            Closure::Interpreted {
                name,
                params,
                body,
                env,
            } => {
                if params.len() != args.len() {
                    caller.warn(Warning::Arity {
                        name: name.clone(),
                        expected: params.len(),
                        found: args.len(),
                    });
                    return None;
                }

                let local = env.call_child();
                for (param, arg) in params.iter().zip(args) {
                    local.insert(param.as_str(), arg);
                }

                eval::eval_body(&local, body)
            }
        }
    }
}

/// Wraps values that would not evaluate to themselves
fn quote(val: Value) -> Value {
    match val {
        Value::Array(_) | Value::Symbol(_) => match stdenv::predefined("quote") {
            Some(q) => Value::array(vec![q, val]),
            None => val,
        },
        other => other,
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Closure::Native { name, .. } => write!(f, "{}", name),
            Closure::Interpreted { name, params, .. } => {
                write!(f, "<closure {} ({})>", name, params.join(" "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    fn twice(ctx: &Rc<Context>, args: &[Value], _: &UserData) -> Option<Value> {
        let val = eval::evaluate(ctx, args.first()?)?;
        Some(Value::array(vec![val.clone(), val]))
    }

    #[test]
    fn interpreted_binds_params() {
        let root = Context::new(None);
        let body = parse("(+ a b)").unwrap();
        let clo = Closure::interpreted("sum", vec!["a".into(), "b".into()], body, &root);

        let out = clo.call_with_values(&root, vec![Value::Integer(2), Value::Integer(5)]);
        assert_eq!(Some(Value::Integer(7)), out);
        assert_eq!(None, root.lookup("a"));
    }

    #[test]
    fn arity_mismatch_binds_nothing() {
        let root = Context::new(None);
        let body = parse("(+ a b)").unwrap();
        let clo = Closure::interpreted("sum", vec!["a".into(), "b".into()], body, &root);

        let raw = parse("1 2 3").unwrap();
        assert_eq!(None, clo.invoke(&root, &raw));
        assert_eq!(
            vec![Warning::Arity {
                name: "sum".into(),
                expected: 2,
                found: 3
            }],
            root.take_warnings()
        );
        assert_eq!(None, root.lookup("a"));
    }

    #[test]
    fn native_gets_values_back() {
        let root = Context::new(None);
        let clo = Closure::native("twice", twice, None);

        let arr = Value::array(vec![Value::Integer(1)]);
        let out = clo.call_with_values(&root, vec![arr]).unwrap();
        assert_eq!("((1) (1))", out.to_string());
        assert!(root.take_warnings().is_empty());
    }

    #[test]
    fn displays() {
        let root = Context::new(None);
        let clo = Closure::interpreted("f", vec!["x".into()], vec![], &root);
        assert_eq!("<closure f (x)>", clo.to_string());
        assert_eq!("twice", Closure::native("twice", twice, None).to_string());
    }
}
