// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/stdenv/mod.rs

// Items, particularly native functions, which are part of the
// standard environment and are predefined in every root context.

// <>

use std::collections::HashMap;

use crate::closure::{Closure, NativeFn};
use crate::context::Context;
use crate::value::{Value, Variable};

/// Generates a slice of named native function pointers
///
/// Each entry reads like a small function: the three identifiers after
/// the table name bind the calling context, the raw argument slice and
/// the entry's own name inside every body. A body yields
/// `Option<Value>`, with `None` meaning no result.
macro_rules! ember_fn {
    ( const $array:ident; $ctx:ident $args:ident $func:ident;
      $( $name:literal $body:block )+
    ) => {
        pub const $array: &[(&str, crate::closure::NativeFn)] =
            &[$(($name, |
                _ctx: &std::rc::Rc<crate::context::Context>,
                _args: &[crate::value::Value],
                _data: &crate::closure::UserData,
              | -> Option<crate::value::Value> {
                    #[allow(unused_variables)]
                    let $ctx = _ctx;
                    #[allow(unused_variables)]
                    let $args = _args;
                    #[allow(unused_variables)]
                    let $func: &'static str = $name;

                    $body
                })),+];
    };
}

pub mod collections;
pub mod forms;
pub mod ops;

/// Named constants
const CONSTANTS: &[(&str, bool)] = &[("TRUE", true), ("FALSE", false)];

fn tables() -> [&'static [(&'static str, NativeFn)]; 3] {
    [forms::FORMS, ops::OPS, collections::COLLECTIONS]
}

fn build() -> HashMap<&'static str, Value> {
    let mut tbl = HashMap::new();

    for table in tables() {
        for (name, func) in table {
            tbl.insert(*name, Value::closure(Closure::native(*name, *func, None)));
        }
    }

    for (name, val) in CONSTANTS {
        tbl.insert(*name, Value::Boolean(*val));
    }

    tbl
}

thread_local! {
    /// Built on first use and never modified afterward
    static REGISTRY: HashMap<&'static str, Value> = build();
}

/// The predefined value named `name`, if there is one
pub fn predefined(name: &str) -> Option<Value> {
    REGISTRY.with(|reg| reg.get(name).cloned())
}

/// Every predefined name, sorted
pub fn names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = REGISTRY.with(|reg| reg.keys().copied().collect());
    names.sort_unstable();
    names
}

/// Binds every predefined name in a root context
///
/// The registry keeps ownership of the values, so the bindings are
/// borrowed variables.
pub fn populate(ctx: &Context) {
    REGISTRY.with(|reg| {
        for (name, val) in reg {
            ctx.insert_variable(*name, Variable::borrowed(val.clone()));
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_complete() {
        let names = names();
        for name in [
            "def", "lambda", "closure", "let", "begin", "set!", "get&", "if", "cond", "case",
            "while", "for", "break", "print", "quote", "+", "-", "*", "/", "%", "and", "or",
            "not", ">", ">=", "=", "<", "<=", "!=", "array", "array-append!", "array-get",
            "array-set!", "array-remove!", "array-size", "range", "find", "filter", "apply",
            "zip", "map", "hash", "hash-get", "hash-set!", "hash-remove!", "hash-size",
            "hash-keys", "TRUE", "FALSE",
        ] {
            assert!(names.contains(&name), "missing {}", name);
        }
    }

    #[test]
    fn registry_is_shared() {
        let a = predefined("if").unwrap();
        let b = predefined("if").unwrap();
        assert!(a.equals(&b));
        assert!(predefined("else").is_none());
    }

    #[test]
    fn root_bindings_are_borrowed() {
        let root = Context::new(None);
        let var = root.lookup_variable("map").unwrap();
        assert!(!var.is_owned());
    }
}
