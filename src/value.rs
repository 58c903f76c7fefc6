// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/value.rs

// The dynamically typed value and the reference cells that back
// every binding

// <>

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::closure::Closure;

/// Shared, mutable, ordered sequence
pub type Array = Rc<RefCell<Vec<Value>>>;

/// Shared, mutable association list; keys are unique under
/// [`Value::equals`]
pub type Mapping = Rc<RefCell<Vec<(Value, Value)>>>;

/// Every value a program can produce or consume
///
/// Cloning a value is shallow: containers, closures, variables and
/// opaque handles are shared, never duplicated. Use
/// [`Value::deep_copy`] where a binding must own its contents.
#[derive(Clone)]
pub enum Value {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Symbol(Symbol),
    Array(Array),
    Closure(Rc<Closure>),
    Variable(Variable),
    Mapping(Mapping),
    Opaque(Opaque),
}

impl Value {
    pub fn string(text: impl Into<String>) -> Self {
        Value::String(text.into())
    }

    pub fn symbol(name: impl Into<String>) -> Self {
        Value::Symbol(Symbol::new(name))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn mapping(entries: Vec<(Value, Value)>) -> Self {
        Value::Mapping(Rc::new(RefCell::new(entries)))
    }

    pub fn closure(closure: Closure) -> Self {
        Value::Closure(Rc::new(closure))
    }

    /// The null opaque reference
    pub fn null() -> Self {
        Value::Opaque(Opaque::null())
    }

    pub fn opaque(handle: Rc<dyn Any>) -> Self {
        Value::Opaque(Opaque::new(handle))
    }

    /// Human-readable name of this value's kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Boolean(_) => "boolean",
            Value::Symbol(_) => "symbol",
            Value::Array(_) => "array",
            Value::Closure(_) => "closure",
            Value::Variable(_) => "variable",
            Value::Mapping(_) => "mapping",
            Value::Opaque(_) => "opaque",
        }
    }

    /// Boolean coercion
    ///
    /// Zero numbers, the empty string, the null opaque reference and
    /// empty containers are false. A variable reference is as true as
    /// the value it holds.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Boolean(b) => *b,
            Value::Array(a) => !a.borrow().is_empty(),
            Value::Mapping(m) => !m.borrow().is_empty(),
            Value::Opaque(o) => !o.is_null(),
            Value::Variable(v) => v.resolve().truthy(),
            Value::Symbol(_) | Value::Closure(_) => true,
        }
    }

    /// Copy this value so that the result shares no mutable container
    /// with the original; closures and opaque handles stay shared
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Array(a) => Value::array(a.borrow().iter().map(Value::deep_copy).collect()),
            Value::Mapping(m) => Value::mapping(
                m.borrow()
                    .iter()
                    .map(|(k, v)| (k.deep_copy(), v.deep_copy()))
                    .collect(),
            ),
            Value::Symbol(s) => Value::Symbol(Symbol::new(s.name.clone())),
            other => other.clone(),
        }
    }

    /// Structural value equality, the relation used for mapping keys
    /// and `case` clauses
    ///
    /// Numbers compare by magnitude across integer and float.
    /// Closures, variables and opaque handles compare by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(a), Value::Float(b)) | (Value::Float(b), Value::Integer(a)) => {
                *a as f64 == *b
            }
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a.name == b.name,
            (Value::Array(a), Value::Array(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Mapping(a), Value::Mapping(b)) => {
                if Rc::ptr_eq(a, b) {
                    return true;
                }
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter()
                            .find(|(bk, _)| bk.equals(k))
                            .map_or(false, |(_, bv)| bv.equals(v))
                    })
            }
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Variable(a), Value::Variable(b)) => Variable::ptr_eq(a, b),
            (Value::Opaque(a), Value::Opaque(b)) => a.address() == b.address(),
            _ => false,
        }
    }

    /// Rendering used by `print`: strings appear without quotes
    pub fn to_plain_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

fn write_seq<'a>(
    f: &mut fmt::Formatter<'_>,
    items: impl Iterator<Item = &'a Value>,
    in_ref: bool,
) -> fmt::Result {
    let mut first = true;
    for item in items {
        if !first {
            write!(f, " ")?;
        }
        render(f, item, in_ref)?;
        first = false;
    }
    Ok(())
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\t' => write!(f, "\\t")?,
            '\r' => write!(f, "\\r")?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "\"")
}

/// Writes `val`, following at most one variable reference
///
/// A reference met inside another reference's contents prints as
/// `&<variable>`, so a container holding a reference to itself still
/// renders finitely.
fn render(f: &mut fmt::Formatter<'_>, val: &Value, in_ref: bool) -> fmt::Result {
    match val {
        Value::Integer(i) => write!(f, "{}", i),
        Value::Float(x) => write!(f, "{:?}", x),
        Value::String(s) => write_escaped(f, s),
        Value::Boolean(true) => write!(f, "TRUE"),
        Value::Boolean(false) => write!(f, "FALSE"),
        Value::Symbol(s) => write!(f, "{}", s.name),
        Value::Array(a) => {
            write!(f, "(")?;
            write_seq(f, a.borrow().iter(), in_ref)?;
            write!(f, ")")
        }
        Value::Closure(c) => write!(f, "{}", c),
        Value::Variable(_) if in_ref => write!(f, "&<variable>"),
        Value::Variable(v) => {
            write!(f, "&")?;
            render(f, &v.get(), true)
        }
        Value::Mapping(m) => {
            write!(f, "{{")?;
            for (i, (k, v)) in m.borrow().iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                render(f, k, in_ref)?;
                write!(f, ": ")?;
                render(f, v, in_ref)?;
            }
            write!(f, "}}")
        }
        Value::Opaque(o) => write!(f, "{}", o),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        render(f, self, false)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "Integer({})", i),
            Value::Float(x) => write!(f, "Float({:?})", x),
            Value::String(s) => write!(f, "String({:?})", s),
            Value::Boolean(b) => write!(f, "Boolean({})", b),
            Value::Symbol(s) => write!(f, "Symbol({})", s.name),
            Value::Array(a) => f.debug_list().entries(a.borrow().iter()).finish(),
            Value::Closure(c) => write!(f, "Closure({})", c.name()),
            Value::Variable(_) => write!(f, "Variable({})", self),
            Value::Mapping(m) => f
                .debug_map()
                .entries(m.borrow().iter().map(|(k, v)| (k.clone(), v.clone())))
                .finish(),
            Value::Opaque(o) => write!(f, "Opaque({})", o),
        }
    }
}

/// A name, optionally backed by the variable it denotes
///
/// Symbols read from source text are unbound; the variable is filled
/// in only when a symbol stands for a binding's storage.
#[derive(Clone)]
pub struct Symbol {
    pub name: String,
    pub variable: Option<Variable>,
}

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variable: None,
        }
    }

    pub fn bound(name: impl Into<String>, variable: Variable) -> Self {
        Self {
            name: name.into(),
            variable: Some(variable),
        }
    }
}

struct Slot {
    value: RefCell<Value>,
    owned: bool,
}

/// Shared reference cell backing a binding
///
/// A variable lives as long as any symbol, context or closure still
/// holds it. An owned variable's value belongs to the cell; a borrowed
/// one holds a value whose lifetime is managed elsewhere, such as the
/// predefined registry.
#[derive(Clone)]
pub struct Variable(Rc<Slot>);

impl Variable {
    pub fn new(value: Value) -> Self {
        Self(Rc::new(Slot {
            value: RefCell::new(value),
            owned: true,
        }))
    }

    pub fn borrowed(value: Value) -> Self {
        Self(Rc::new(Slot {
            value: RefCell::new(value),
            owned: false,
        }))
    }

    /// Shallow clone of the held value
    pub fn get(&self) -> Value {
        self.0.value.borrow().clone()
    }

    /// Replace the held value; the cell keeps its identity
    pub fn set(&self, value: Value) {
        *self.0.value.borrow_mut() = value;
    }

    /// Held value, following chained references to the first value
    /// that is not itself a reference
    ///
    /// A chain that loops back on itself resolves to null.
    pub fn resolve(&self) -> Value {
        let mut seen = vec![self.clone()];
        let mut val = self.get();

        loop {
            let next = match &val {
                Value::Variable(next) => next.clone(),
                _ => return val,
            };
            if seen.iter().any(|v| Variable::ptr_eq(v, &next)) {
                return Value::null();
            }
            val = next.get();
            seen.push(next);
        }
    }

    pub fn is_owned(&self) -> bool {
        self.0.owned
    }

    /// Number of holders sharing this cell
    pub fn holders(&self) -> usize {
        Rc::strong_count(&self.0)
    }

    pub fn ptr_eq(a: &Variable, b: &Variable) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

/// Host handle passed through the runtime unexamined
#[derive(Clone)]
pub struct Opaque(Option<Rc<dyn Any>>);

impl Opaque {
    pub fn new(handle: Rc<dyn Any>) -> Self {
        Self(Some(handle))
    }

    pub fn null() -> Self {
        Self(None)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    pub fn handle(&self) -> Option<&Rc<dyn Any>> {
        self.0.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|h| h.downcast_ref::<T>())
    }

    /// Identity of the handle; the null reference is zero
    pub fn address(&self) -> usize {
        self.0
            .as_ref()
            .map_or(0, |h| Rc::as_ptr(h) as *const () as usize)
    }
}

/// Marker produced when a host type constructor declares variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTag(pub String);

impl fmt::Display for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.downcast_ref::<TypeTag>() {
            Some(tag) => write!(f, "<type {}>", tag.0),
            None if self.is_null() => write!(f, "<null>"),
            None => write!(f, "<opaque {:#x}>", self.address()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn truthiness() {
        assert!(!Value::Integer(0).truthy());
        assert!(!Value::Float(0.0).truthy());
        assert!(!Value::string("").truthy());
        assert!(!Value::null().truthy());
        assert!(!Value::array(vec![]).truthy());
        assert!(!Value::mapping(vec![]).truthy());

        assert!(Value::Integer(-3).truthy());
        assert!(Value::string("a").truthy());
        assert!(Value::array(vec![Value::Integer(0)]).truthy());
        assert!(Value::opaque(Rc::new(5_u8)).truthy());
    }

    #[test]
    fn deep_copy_detaches() {
        let inner = Value::array(vec![Value::Integer(1), Value::Integer(2)]);
        let outer = Value::array(vec![inner.clone()]);
        let copy = outer.deep_copy();

        if let Value::Array(a) = &inner {
            a.borrow_mut().push(Value::Integer(3));
        }

        assert_eq!("((1 2 3))", outer.to_string());
        assert_eq!("((1 2))", copy.to_string());
    }

    #[test]
    fn displays() {
        let val = Value::array(vec![
            Value::Integer(1),
            Value::Float(2.5),
            "a\"b".into(),
            true.into(),
            Value::symbol("x"),
            Value::array(vec![]),
        ]);
        assert_eq!("(1 2.5 \"a\\\"b\" TRUE x ())", val.to_string());
        assert_eq!("3.0", Value::Float(3.0).to_string());
        assert_eq!("hi", Value::string("hi").to_plain_string());
    }

    #[test]
    fn structural_equality() {
        let a = Value::array(vec![Value::Integer(1), "s".into()]);
        let b = Value::array(vec![Value::Integer(1), "s".into()]);
        assert_eq!(a, b);
        assert!(Value::Integer(2).equals(&Value::Float(2.0)));
        assert!(!Value::Integer(2).equals(&Value::string("2")));

        let one = || Value::Integer(1);
        let m1 = Value::mapping(vec![(one(), Value::Integer(2)), ("k".into(), Value::Integer(3))]);
        let m2 = Value::mapping(vec![("k".into(), Value::Integer(3)), (one(), Value::Integer(2))]);
        assert_eq!(m1, m2);
    }

    #[test]
    fn variables_alias() {
        let var = Variable::new(Value::Integer(1));
        let alias = var.clone();
        alias.set(Value::Integer(2));

        assert_eq!(Value::Integer(2), var.get());
        assert!(Variable::ptr_eq(&var, &alias));
        assert_eq!(2, var.holders());
        assert!(var.is_owned());
        assert!(!Variable::borrowed(Value::Integer(0)).is_owned());
    }

    #[test]
    fn self_referencing_array_displays() {
        let var = Variable::new(Value::Integer(0));
        let arr = Value::array(vec![Value::Integer(1), Value::Variable(var.clone())]);
        var.set(arr.clone());

        assert_eq!("(1 &(1 &<variable>))", arr.to_string());
        assert_eq!("&(1 &<variable>)", Value::Variable(var.clone()).to_string());
        assert_eq!("Variable(&(1 &<variable>))", format!("{:?}", Value::Variable(var.clone())));

        var.set(Value::Integer(0));
    }

    #[test]
    fn reference_chains_resolve() {
        let a = Variable::new(Value::Integer(7));
        let b = Variable::new(Value::Variable(a.clone()));
        assert!(matches!(b.resolve(), Value::Integer(7)));

        a.set(Value::Variable(b.clone()));
        assert!(matches!(b.resolve(), Value::Opaque(o) if o.is_null()));
        assert!(!Value::Variable(b.clone()).truthy());

        a.set(Value::Integer(0));
    }
}
