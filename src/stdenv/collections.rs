// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/stdenv/collections.rs

// Array and mapping primitives

// <>

use crate::args::Args;
use crate::context::Context;
use crate::error::Warning;
use crate::eval::evaluate;
use crate::value::Value;

/// Longest array `range` will build
pub const MAX_RANGE_LEN: u64 = 1 << 20;

/// Resolves a possibly negative index against `len`
fn wrap_index(ctx: &Context, func: &'static str, index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { index + len } else { index };

    if index < 0 || index >= len {
        ctx.warn(Warning::IndexOutOfBounds { func });
        return None;
    }
    Some(index as usize)
}

/// Position of `key` in an association list
fn find_key(entries: &[(Value, Value)], key: &Value) -> Option<usize> {
    entries.iter().position(|(k, _)| k.equals(key))
}

ember_fn! {
    const COLLECTIONS;
    ctx raw func;

    "array" {
        let items = raw
            .iter()
            .map(|form| evaluate(ctx, form).unwrap_or_else(Value::null))
            .collect();
        Some(Value::array(items))
    }

    "array-append!" {
        let mut args = Args::new(ctx, func, raw).at_least(1)?;
        let arr = args.expect_array()?;

        let mut items = Vec::with_capacity(args.remaining());
        for form in args.rest() {
            items.push(evaluate(ctx, form)?.deep_copy());
        }

        arr.borrow_mut().extend(items);
        Some(Value::Array(arr))
    }

    "array-get" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let arr = args.expect_array()?;
        let index = args.expect_integer()?;

        let arr = arr.borrow();
        let i = wrap_index(ctx, func, index, arr.len())?;
        Some(arr[i].deep_copy())
    }

    "array-set!" {
        let mut args = Args::new(ctx, func, raw).exactly(3)?;
        let arr = args.expect_array()?;
        let index = args.expect_integer()?;
        let val = args.expect_value()?;

        let len = arr.borrow().len();
        let i = wrap_index(ctx, func, index, len)?;
        arr.borrow_mut()[i] = val.deep_copy();
        Some(val)
    }

    "array-remove!" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let arr = args.expect_array()?;
        let index = args.expect_integer()?;

        let len = arr.borrow().len();
        let i = wrap_index(ctx, func, index, len)?;
        let removed = arr.borrow_mut().remove(i);
        Some(removed)
    }

    "array-size" {
        let mut args = Args::new(ctx, func, raw).exactly(1)?;
        let arr = args.expect_array()?;
        let len = arr.borrow().len();
        Some(Value::Integer(len as i64))
    }

    "range" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let first = args.expect_integer()?;
        let last = args.expect_integer()?;

        // span + 1 cannot overflow once the span is under the cap
        let span = first.abs_diff(last);
        let mut items = Vec::new();
        if span >= MAX_RANGE_LEN || items.try_reserve_exact(span as usize + 1).is_err() {
            ctx.warn(Warning::TooLarge { func });
            return None;
        }

        if first <= last {
            items.extend((first..=last).map(Value::Integer));
        } else {
            items.extend((last..=first).rev().map(Value::Integer));
        }
        Some(Value::array(items))
    }

    "find" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let arr = args.expect_array()?;
        let clo = args.expect_closure()?;

        let items = arr.borrow().clone();
        for (i, item) in items.into_iter().enumerate() {
            if clo.call_with_values(ctx, vec![item]).map_or(false, |v| v.truthy()) {
                return Some(Value::Integer(i as i64));
            }
        }
        Some(Value::Integer(-1))
    }

    "filter" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let clo = args.expect_closure()?;
        let arr = args.expect_array()?;

        let items = arr.borrow().clone();
        let kept = items
            .into_iter()
            .filter(|item| {
                clo.call_with_values(ctx, vec![item.clone()])
                    .map_or(false, |v| v.truthy())
            })
            .map(|item| item.deep_copy())
            .collect();
        Some(Value::array(kept))
    }

    "apply" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let clo = args.expect_closure()?;
        let arr = args.expect_array()?;

        let items = arr.borrow().clone();
        clo.call_with_values(ctx, items)
    }

    "zip" {
        let mut args = Args::new(ctx, func, raw).at_least(1)?;

        let mut arrays = Vec::with_capacity(raw.len());
        for _ in 0..raw.len() {
            arrays.push(args.expect_array()?.borrow().clone());
        }

        let len = arrays.iter().map(Vec::len).min().unwrap_or(0);
        let rows = (0..len)
            .map(|i| Value::array(arrays.iter().map(|a| a[i].deep_copy()).collect()))
            .collect();
        Some(Value::array(rows))
    }

    "map" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let clo = args.expect_closure()?;
        let arr = args.expect_array()?;

        let items = arr.borrow().clone();
        let out = items
            .into_iter()
            .map(|item| clo.call_with_values(ctx, vec![item]).unwrap_or_else(Value::null))
            .collect();
        Some(Value::array(out))
    }

    "hash" {
        let mut args = Args::new(ctx, func, raw);
        let mut entries: Vec<(Value, Value)> = Vec::with_capacity(raw.len());

        for _ in 0..raw.len() {
            let pair = args.expect_literal_array()?.borrow().clone();
            let mut pair_args = Args::new(ctx, func, &pair).exactly(2)?;
            let key = pair_args.expect_value()?.deep_copy();
            let val = pair_args.expect_value()?.deep_copy();

            match find_key(&entries, &key) {
                Some(i) => entries[i].1 = val,
                None => entries.push((key, val)),
            }
        }

        Some(Value::mapping(entries))
    }

    "hash-get" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let map = args.expect_mapping()?;
        let key = args.expect_value()?;

        let map = map.borrow();
        let i = find_key(&map, &key)?;
        Some(map[i].1.deep_copy())
    }

    "hash-set!" {
        let mut args = Args::new(ctx, func, raw).exactly(3)?;
        let map = args.expect_mapping()?;
        let key = args.expect_value()?.deep_copy();
        let val = args.expect_value()?;

        let mut entries = map.borrow_mut();
        match find_key(&entries, &key) {
            Some(i) => entries[i].1 = val.deep_copy(),
            None => entries.push((key, val.deep_copy())),
        }
        Some(val)
    }

    "hash-remove!" {
        let mut args = Args::new(ctx, func, raw).exactly(2)?;
        let map = args.expect_mapping()?;
        let key = args.expect_value()?;

        let mut entries = map.borrow_mut();
        let found = find_key(&entries, &key);
        if let Some(i) = found {
            entries.remove(i);
        }
        Some(Value::Boolean(found.is_some()))
    }

    "hash-size" {
        let mut args = Args::new(ctx, func, raw).exactly(1)?;
        let map = args.expect_mapping()?;
        let len = map.borrow().len();
        Some(Value::Integer(len as i64))
    }

    "hash-keys" {
        let mut args = Args::new(ctx, func, raw).exactly(1)?;
        let map = args.expect_mapping()?;
        let keys = map.borrow().iter().map(|(k, _)| k.deep_copy()).collect();
        Some(Value::array(keys))
    }
}

#[cfg(test)]
mod tests {
    use crate::context::Context;
    use crate::error::Warning;
    use crate::eval::evaluate;
    use crate::parser::parse;
    use crate::value::Value;
    use pretty_assertions::assert_eq;
    use std::rc::Rc;

    fn run(ctx: &Rc<Context>, text: &str) -> String {
        let mut out = None;
        for form in parse(text).unwrap() {
            out = evaluate(ctx, &form);
        }
        out.map_or("<none>".to_string(), |v| v.to_string())
    }

    fn show(text: &str) -> String {
        let root = Context::new(None);
        let out = run(&root, text);
        assert!(root.take_warnings().is_empty());
        out
    }

    #[test]
    fn builds_arrays() {
        assert_eq!("(1 3 \"s\")", show("(array 1 (+ 1 2) \"s\")"));
        assert_eq!("(1 2 3 4)", show("(def a (array 1 2)) (array-append! a 3 4) a"));
        assert_eq!("3", show("(array-size (array 1 2 3))"));
    }

    #[test]
    fn array_element_that_fails_is_null() {
        let root = Context::new(None);
        assert_eq!("(1 <null>)", run(&root, "(array 1 missing)"));
        assert_eq!(vec![Warning::UnknownSymbol("missing".into())], root.take_warnings());
    }

    #[test]
    fn indexes_wrap_from_end() {
        assert_eq!("30", show("(array-get (array 10 20 30) -1)"));
        assert_eq!("10", show("(array-get (array 10 20 30) -3)"));
        assert_eq!("(10 0 30)", show("(def a (array 10 20 30)) (array-set! a -2 0) a"));
        assert_eq!("(20 30)", show("(def a (array 10 20 30)) (array-remove! a 0) a"));
    }

    #[test]
    fn out_of_bounds_leaves_array_untouched() {
        let root = Context::new(None);
        run(&root, "(def a (array 1 2 3))");

        for form in ["(array-get a 3)", "(array-get a -4)", "(array-set! a 5 0)", "(array-remove! a -9)"] {
            assert_eq!("<none>", run(&root, form));
        }

        assert_eq!("(1 2 3)", run(&root, "a"));
        let warnings = root.take_warnings();
        assert_eq!(4, warnings.len());
        assert_eq!(Warning::IndexOutOfBounds { func: "array-get" }, warnings[0]);
        assert_eq!(Warning::IndexOutOfBounds { func: "array-remove!" }, warnings[3]);
    }

    #[test]
    fn array_holding_its_own_reference_displays() {
        let root = Context::new(None);
        run(&root, "(def a (array 1)) (array-append! a (get& a))");

        assert_eq!("2", run(&root, "(array-size a)"));
        assert_eq!("(1 &(1 &<variable>))", run(&root, "a"));
        assert!(root.take_warnings().is_empty());
        root.clear();
    }

    #[test]
    fn ranges_are_inclusive() {
        assert_eq!("(1 2 3)", show("(range 1 3)"));
        assert_eq!("(3 2 1 0)", show("(range 3 0)"));
        assert_eq!("(5)", show("(range 5 5)"));
        assert_eq!("(-1 0 1)", show("(range -1 1)"));
    }

    #[test]
    fn oversized_ranges_are_refused() {
        let root = Context::new(None);
        for form in [
            "(range 0 9223372036854775807)",
            "(range 9223372036854775807 0)",
            "(range -1 1048575)",
        ] {
            assert_eq!("<none>", run(&root, form));
        }

        assert_eq!(vec![Warning::TooLarge { func: "range" }; 3], root.take_warnings());
        assert_eq!("1048576", run(&root, "(array-size (range 0 1048575))"));
    }

    #[test]
    fn higher_order() {
        assert_eq!("(2 4 6)", show("(map (lambda (x) (* x 2)) (array 1 2 3))"));
        assert_eq!("(2 4)", show("(filter (lambda (x) (= (% x 2) 0)) (range 1 5))"));
        assert_eq!("2", show("(find (array 5 6 7) (lambda (x) (> x 6)))"));
        assert_eq!("-1", show("(find (array 5 6 7) (lambda (x) (> x 9)))"));
        assert_eq!("6", show("(apply (lambda (a b c) (+ a b c)) (array 1 2 3))"));
        assert_eq!("6", show("(apply + (array 1 2 3))"));
        assert_eq!("(3 2)", show("(map array-size (array (array 1 2 3) (array 4 5)))"));
    }

    #[test]
    fn zips_to_shortest() {
        assert_eq!("((1 a) (2 b))", show("(zip (array 1 2 3) (array 'a' 'b'))").replace('"', ""));
    }

    #[test]
    fn mappings() {
        let root = Context::new(None);
        run(&root, "(def h (hash (\"one\" 1) (2 \"two\")))");

        assert_eq!("1", run(&root, "(hash-get h \"one\")"));
        assert_eq!("\"two\"", run(&root, "(hash-get h 2.0)"));
        assert_eq!("2", run(&root, "(hash-size h)"));

        run(&root, "(hash-set! h \"one\" 11)");
        run(&root, "(hash-set! h 3 (array))");
        assert_eq!("11", run(&root, "(hash-get h \"one\")"));
        assert_eq!("(\"one\" 2 3)", run(&root, "(hash-keys h)"));

        assert_eq!("TRUE", run(&root, "(hash-remove! h 2)"));
        assert_eq!("FALSE", run(&root, "(hash-remove! h 2)"));
        assert_eq!("<none>", run(&root, "(hash-get h 2)"));
        assert!(root.take_warnings().is_empty());
    }

    #[test]
    fn wrong_kind_is_reported() {
        let root = Context::new(None);
        assert_eq!("<none>", run(&root, "(array-size 5)"));
        assert_eq!(
            vec![Warning::WrongKind {
                func: "array-size",
                expected: "array",
                found: "integer"
            }],
            root.take_warnings()
        );
        assert!(matches!(root.lookup("array-size"), Some(Value::Closure(_))));
    }
}
