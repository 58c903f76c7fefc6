// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/host.rs

// Boundary to the host application's type catalog

// <>

use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

/// A type the host can construct values of
pub trait HostType {
    fn name(&self) -> &str;

    /// Initial value of a freshly declared variable of this type
    fn instantiate(&self) -> Value {
        Value::null()
    }
}

/// Recognizes host type names at the head of an invocation
pub trait TypeResolver {
    fn resolve(&self, name: &str) -> Option<Rc<dyn HostType>>;
}

/// Resolver backed by a fixed table of types
#[derive(Default)]
pub struct TypeRegistry {
    types: HashMap<String, Rc<dyn HostType>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, ty: Rc<dyn HostType>) {
        self.types.insert(ty.name().to_string(), ty);
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, name: &str) -> Option<Rc<dyn HostType>> {
        self.types.get(name).cloned()
    }
}
