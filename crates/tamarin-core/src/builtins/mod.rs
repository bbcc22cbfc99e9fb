// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Built-in functions.
//!
//! The [`Builtins`] table is built once, then shared by the compiler (which
//! resolves names to table indices) and the VM (which calls by index).
//! Entries are only ever appended, so an index never changes meaning.
//!
//! ## Structure
//!
//! - `array.rs` - `len`, `first`, `last`, `head`, `tail`, `push`
//! - `console.rs` - `puts`

pub mod array;
pub mod console;

use crate::runtime::function::{Builtin, BuiltinFn};

/// An append-only table of host functions.
#[derive(Debug, Clone, Default)]
pub struct Builtins {
    entries: Vec<Builtin>,
}

impl Builtins {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the table with the standard library registered.
    pub fn standard() -> Self {
        let mut builtins = Self::new();
        builtins.register("len", array::len);
        builtins.register("first", array::first);
        builtins.register("last", array::last);
        builtins.register("head", array::head);
        builtins.register("tail", array::tail);
        builtins.register("push", array::push);
        builtins.register("puts", console::puts);
        builtins
    }

    /// Appends a host function and returns its index.
    pub fn register(&mut self, name: &str, func: BuiltinFn) -> usize {
        let index = self.entries.len();
        self.entries.push(Builtin::new(name, func));
        index
    }

    /// Gets a builtin by index.
    pub fn get(&self, index: usize) -> Option<&Builtin> {
        self.entries.get(index)
    }

    /// Iterates over `(index, builtin)` in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Builtin)> {
        self.entries.iter().enumerate()
    }

    /// Names of every registered builtin.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|builtin| &*builtin.name)
    }

    /// Number of registered builtins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::value::Value;

    #[test]
    fn test_standard_order() {
        let builtins = Builtins::standard();
        let names: Vec<&str> = builtins.names().collect();
        assert_eq!(names, ["len", "first", "last", "head", "tail", "push", "puts"]);
    }

    #[test]
    fn test_register_appends() {
        fn double(args: &[Value]) -> Result<Value, String> {
            match args {
                [Value::Integer(n)] => Ok(Value::Integer(n * 2)),
                _ => Err("double takes one integer".into()),
            }
        }

        let mut builtins = Builtins::standard();
        let index = builtins.register("double", double);
        assert_eq!(index, 7);
        let builtin = builtins.get(index).unwrap();
        assert_eq!(builtin.call(&[Value::Integer(21)]), Ok(Value::Integer(42)));
        assert!(builtins.get(8).is_none());
    }
}
