// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/eval.rs

// Recursive evaluator. Resolves symbols, dispatches invocations, and
// declares host-typed variables.

// <>

use std::rc::Rc;

use crate::context::Context;
use crate::error::Warning;
use crate::host::HostType;
use crate::stack::ensure_sufficient_stack;
use crate::value::{TypeTag, Value};

/// Evaluates one value in `ctx`
///
/// `None` means no result was produced; a diagnostic has already been
/// emitted by whatever failed.
pub fn evaluate(ctx: &Rc<Context>, value: &Value) -> Option<Value> {
    if cfg!(feature = "evaldbg") {
        log::trace!("eval [{}]: {}", ctx.runtime().depth(), value);
    }

    match value {
        Value::Symbol(sym) => {
            if let Some(var) = &sym.variable {
                return Some(var.get());
            }

            let found = ctx.lookup(&sym.name);
            if found.is_none() {
                ctx.warn(Warning::UnknownSymbol(sym.name.clone()));
            }
            found
        }
        Value::Array(arr) => {
            // snapshot; the invocation may mutate its own source form
            let items = arr.borrow().clone();
            if items.is_empty() {
                return Some(value.clone());
            }

            let rt = ctx.runtime();
            if !rt.enter() {
                ctx.warn(Warning::RecursionLimit(rt.config().recursion_limit));
                return None;
            }

            let out = ensure_sufficient_stack(|| invoke(ctx, &items));
            rt.leave();

            if cfg!(feature = "evaldbg") {
                log::trace!("result: {:?}", out);
            }

            out
        }
        other => Some(other.clone()),
    }
}

/// Evaluates `forms` in order until `ctx` is stopped, yielding the last
/// result
pub fn eval_body(ctx: &Rc<Context>, forms: &[Value]) -> Option<Value> {
    let mut out = None;

    for form in forms {
        if !ctx.active() {
            break;
        }
        out = evaluate(ctx, form);
    }

    out
}

fn invoke(ctx: &Rc<Context>, items: &[Value]) -> Option<Value> {
    let (head, args) = items.split_first()?;

    if let Some(ty) = host_type(ctx, head) {
        return declare(ctx, ty.as_ref(), args);
    }

    match evaluate(ctx, head)? {
        Value::Closure(clo) => clo.invoke(ctx, args),
        other => {
            ctx.warn(Warning::NotCallable(other.kind_name()));
            None
        }
    }
}

fn host_type(ctx: &Context, head: &Value) -> Option<Rc<dyn HostType>> {
    let name = match head {
        Value::String(s) => s.as_str(),
        Value::Symbol(s) => s.name.as_str(),
        _ => return None,
    };

    ctx.type_resolver()?.resolve(name)
}

/// Declares each named variable as a fresh instance of `ty`
fn declare(ctx: &Rc<Context>, ty: &dyn HostType, names: &[Value]) -> Option<Value> {
    let mut decls = Vec::with_capacity(names.len());

    for name in names {
        match name {
            Value::Symbol(s) => decls.push(s.name.clone()),
            Value::String(s) => decls.push(s.clone()),
            other => {
                ctx.warn(Warning::InvalidArgumentName {
                    func: "declare",
                    name: other.to_string(),
                });
                return None;
            }
        }
    }

    for name in decls {
        ctx.insert(name, ty.instantiate());
    }

    Some(Value::opaque(Rc::new(TypeTag(ty.name().to_string()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::host::TypeRegistry;
    use crate::parser::parse;
    use crate::stdenv;
    use crate::value::{Symbol, Variable};
    use pretty_assertions::assert_eq;

    fn eval_str(ctx: &Rc<Context>, text: &str) -> Option<Value> {
        let mut out = None;
        for form in parse(text).unwrap() {
            out = evaluate(ctx, &form);
        }
        out
    }

    #[test]
    fn adds_integers() {
        let root = Context::new(None);
        let form = &parse("(+ 1 2)").unwrap()[0];
        assert!(matches!(evaluate(&root, form), Some(Value::Integer(3))));
    }

    #[test]
    fn promotes_floats() {
        let root = Context::new(None);
        let form = &parse("(+ 1 2.0)").unwrap()[0];
        assert!(matches!(evaluate(&root, form), Some(Value::Float(f)) if f == 3.0));
    }

    #[test]
    fn literals_evaluate_to_themselves() {
        let root = Context::new(None);
        assert_eq!(Some(Value::Integer(4)), eval_str(&root, "4"));
        assert_eq!(Some(Value::string("s")), eval_str(&root, "\"s\""));
        assert_eq!(Some(Value::array(vec![])), eval_str(&root, "()"));
    }

    #[test]
    fn unknown_symbol_yields_nothing() {
        let root = Context::new(None);
        assert_eq!(None, eval_str(&root, "nope"));
        assert_eq!(
            vec![Warning::UnknownSymbol("nope".into())],
            root.take_warnings()
        );
    }

    #[test]
    fn bound_symbols_read_their_variable() {
        let root = Context::new(None);
        let var = Variable::new(Value::Integer(5));
        let sym = Value::Symbol(Symbol::bound("hidden", var.clone()));

        assert_eq!(Some(Value::Integer(5)), evaluate(&root, &sym));

        var.set(Value::Integer(6));
        let form = Value::array(vec![stdenv::predefined("+").unwrap(), sym, Value::Integer(1)]);
        assert_eq!(Some(Value::Integer(7)), evaluate(&root, &form));

        assert_eq!(None, root.lookup("hidden"));
        assert!(root.take_warnings().is_empty());
    }

    #[test]
    fn not_callable() {
        let root = Context::new(None);
        assert_eq!(None, eval_str(&root, "(1 2)"));
        assert_eq!(vec![Warning::NotCallable("integer")], root.take_warnings());
    }

    #[test]
    fn recursion_limit() {
        let root = Context::new_root(Config::default().with_recursion_limit(50));
        let out = eval_str(&root, "(def (down n) (if (= n 0) 0 (down (- n 1)))) (down 100)");
        assert_eq!(None, out);
        assert!(root
            .take_warnings()
            .contains(&Warning::RecursionLimit(50)));

        assert_eq!(Some(Value::Integer(0)), eval_str(&root, "(down 10)"));
        assert_eq!(0, root.runtime().depth());
    }

    #[test]
    fn deep_recursion_grows_stack() {
        let root = Context::new(None);
        let out = eval_str(
            &root,
            "(def (count n) (if (= n 0) 0 (+ 1 (count (- n 1))))) (count 2000)",
        );
        assert_eq!(Some(Value::Integer(2000)), out);
    }

    struct Window;

    impl HostType for Window {
        fn name(&self) -> &str {
            "Window"
        }
    }

    #[test]
    fn declares_host_types() {
        let root = Context::new(None);
        let mut reg = TypeRegistry::new();
        reg.register(Rc::new(Window));
        root.set_type_resolver(Rc::new(reg));

        let out = eval_str(&root, "(Window main \"popup\")").unwrap();
        assert_eq!("<type Window>", out.to_string());
        assert!(matches!(root.lookup("main"), Some(Value::Opaque(o)) if o.is_null()));
        assert!(root.lookup("popup").is_some());

        assert_eq!(None, eval_str(&root, "(Window 5)"));
    }
}
