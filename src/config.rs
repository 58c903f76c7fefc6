// EMBER, an embeddable scripting language.

// SPDX-FileCopyrightText: © 2024 Matthew Rothlisberger
// SPDX-License-Identifier: AGPL-3.0-only

// EMBER is licensed under the terms of the GNU Affero General Public
// License version 3. See the top-level LICENSES directory for the
// license text.

// Find full copyright information in the top-level COPYRIGHT file.

// <>

// src/config.rs

// Runtime knobs shared by every context of one session

// <>

/// Maximum nesting of evaluation steps before a form is abandoned
pub const DEFAULT_RECURSION_LIMIT: usize = 10_000;

/// Number of diagnostics retained for later inspection
pub const DEFAULT_WARNING_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub recursion_limit: usize,
    pub warning_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            warning_capacity: DEFAULT_WARNING_CAPACITY,
        }
    }
}

impl Config {
    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_warning_capacity(mut self, capacity: usize) -> Self {
        self.warning_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setters_chain() {
        let cfg = Config::default()
            .with_recursion_limit(64)
            .with_warning_capacity(4);

        assert_eq!(64, cfg.recursion_limit);
        assert_eq!(4, cfg.warning_capacity);
        assert_eq!(DEFAULT_RECURSION_LIMIT, Config::default().recursion_limit);
    }
}
