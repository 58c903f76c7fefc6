// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/context.rs

// Lexical scopes and the session state they share

// <>

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::closure::{Closure, NativeFn, UserData};
use crate::config::Config;
use crate::error::Warning;
use crate::host::TypeResolver;
use crate::stdenv;
use crate::value::{Value, Variable};

/// State shared by every context descending from one root
pub struct Runtime {
    config: Config,
    depth: Cell<usize>,
    warnings: RefCell<VecDeque<Warning>>,
    resolver: RefCell<Option<Rc<dyn TypeResolver>>>,
}

impl Runtime {
    fn new(config: Config) -> Self {
        Self {
            config,
            depth: Cell::new(0),
            warnings: RefCell::new(VecDeque::with_capacity(config.warning_capacity)),
            resolver: RefCell::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Claims one level of evaluation depth; false once the limit
    /// is reached
    pub(crate) fn enter(&self) -> bool {
        let depth = self.depth.get();
        if depth >= self.config.recursion_limit {
            return false;
        }
        self.depth.set(depth + 1);
        true
    }

    pub(crate) fn leave(&self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    fn record(&self, warning: Warning) {
        let cap = self.config.warning_capacity;
        if cap == 0 {
            return;
        }

        let mut buf = self.warnings.borrow_mut();
        while buf.len() >= cap {
            buf.pop_front();
        }
        buf.push_back(warning);
    }
}

/// What created a context; decides where `break` lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Root,
    /// Plain nested scope, as made by `let`; transparent to `break`
    Block,
    Loop,
    /// Body of an interpreted closure invocation
    Call,
}

/// One lexical scope
///
/// Contexts are always handled through `Rc` so that interpreted
/// closures can keep their defining scope alive after it exits.
pub struct Context {
    bindings: RefCell<HashMap<String, Variable>>,
    outer: Option<Rc<Context>>,
    running: Cell<bool>,
    kind: ScopeKind,
    runtime: Rc<Runtime>,
}

impl Context {
    /// Creates a scope nested in `outer`, or a fully populated root
    /// scope with default configuration when there is none
    pub fn new(outer: Option<&Rc<Context>>) -> Rc<Context> {
        match outer {
            Some(outer) => Context::nested(outer, ScopeKind::Block),
            None => Context::new_root(Config::default()),
        }
    }

    fn nested(outer: &Rc<Context>, kind: ScopeKind) -> Rc<Context> {
        Rc::new(Context {
            bindings: RefCell::new(HashMap::new()),
            outer: Some(outer.clone()),
            running: Cell::new(true),
            kind,
            runtime: outer.runtime.clone(),
        })
    }

    /// Creates a root scope holding every predefined symbol
    pub fn new_root(config: Config) -> Rc<Context> {
        let ctx = Rc::new(Context {
            bindings: RefCell::new(HashMap::new()),
            outer: None,
            running: Cell::new(true),
            kind: ScopeKind::Root,
            runtime: Rc::new(Runtime::new(config)),
        });

        stdenv::populate(&ctx);
        ctx
    }

    /// Nested block scope whose outer link is this context
    pub fn child(self: &Rc<Self>) -> Rc<Context> {
        Context::nested(self, ScopeKind::Block)
    }

    /// Scope for the body of a loop
    pub fn loop_child(self: &Rc<Self>) -> Rc<Context> {
        Context::nested(self, ScopeKind::Loop)
    }

    /// Scope for one invocation of a closure defined here
    pub fn call_child(self: &Rc<Self>) -> Rc<Context> {
        Context::nested(self, ScopeKind::Call)
    }

    pub fn kind(&self) -> ScopeKind {
        self.kind
    }

    pub fn outer(&self) -> Option<&Rc<Context>> {
        self.outer.as_ref()
    }

    pub fn is_root(&self) -> bool {
        self.outer.is_none()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn config(&self) -> &Config {
        self.runtime.config()
    }

    /// Finds the variable bound to `name` in this scope or the
    /// nearest enclosing one
    pub fn lookup_variable(&self, name: &str) -> Option<Variable> {
        if let Some(var) = self.bindings.borrow().get(name) {
            return Some(var.clone());
        }

        self.outer.as_ref()?.lookup_variable(name)
    }

    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.lookup_variable(name).map(|var| var.get())
    }

    /// Binds `name` in this scope only, replacing any local binding
    pub fn insert(&self, name: impl Into<String>, value: Value) {
        self.insert_variable(name, Variable::new(value));
    }

    /// Binds `name` to an existing variable, sharing its storage
    pub fn insert_variable(&self, name: impl Into<String>, var: Variable) {
        self.bindings.borrow_mut().insert(name.into(), var);
    }

    pub fn remove(&self, name: &str) -> bool {
        self.bindings.borrow_mut().remove(name).is_some()
    }

    pub fn contains_local(&self, name: &str) -> bool {
        self.bindings.borrow().contains_key(name)
    }

    /// Drops every local binding
    pub fn clear(&self) {
        let old = self.bindings.take();
        drop(old);
    }

    pub fn running(&self) -> bool {
        self.running.get()
    }

    pub fn set_running(&self, running: bool) {
        self.running.set(running);
    }

    /// Stops the nearest scope, this one included, that is still
    /// running
    ///
    /// Block scopes are passed over, so a `break` inside a `let`
    /// within a loop body ends the loop.
    pub fn break_nearest(&self) {
        let mut ctx = Some(self);
        while let Some(c) = ctx {
            if c.kind != ScopeKind::Block && c.running() {
                c.set_running(false);
                return;
            }
            ctx = c.outer.as_deref();
        }
    }

    /// Whether a sequence evaluated here should keep going
    ///
    /// False once this scope, or any block scope between it and the
    /// nearest loop, call or root scope, has been stopped.
    pub fn active(&self) -> bool {
        let mut ctx = Some(self);
        while let Some(c) = ctx {
            if !c.running() {
                return false;
            }
            if c.kind != ScopeKind::Block {
                return true;
            }
            ctx = c.outer.as_deref();
        }
        true
    }

    /// Registers a host function under `name` in this scope
    ///
    /// Fails with a warning if the name is already bound here; remove
    /// the old binding first to replace it.
    pub fn add_native_function(
        &self,
        name: &str,
        func: NativeFn,
        data: UserData,
    ) -> bool {
        if self.contains_local(name) {
            self.warn(Warning::SymbolExists {
                func: "add_native_function",
                name: name.to_string(),
            });
            return false;
        }

        self.insert(name, Value::closure(Closure::native(name, func, data)));
        true
    }

    /// Installs the collaborator that recognizes host type names
    pub fn set_type_resolver(&self, resolver: Rc<dyn TypeResolver>) {
        *self.runtime.resolver.borrow_mut() = Some(resolver);
    }

    pub fn type_resolver(&self) -> Option<Rc<dyn TypeResolver>> {
        self.runtime.resolver.borrow().clone()
    }

    /// Emits a recoverable diagnostic
    pub fn warn(&self, warning: Warning) {
        log::warn!("{}", warning);
        self.runtime.record(warning);
    }

    /// Drains the diagnostics recorded since the last call
    pub fn take_warnings(&self) -> Vec<Warning> {
        self.runtime.warnings.borrow_mut().drain(..).collect()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.bindings.borrow().keys().cloned().collect();
        names.sort();

        f.debug_struct("Context")
            .field("bindings", &names)
            .field("running", &self.running.get())
            .field("kind", &self.kind)
            .finish()
    }
}
