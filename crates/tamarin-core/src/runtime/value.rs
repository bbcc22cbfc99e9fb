// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tamarin value representation.

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use super::function::{Builtin, Closure, CompiledFunction};

/// A Tamarin value.
///
/// Composite values are reference counted; cloning a `Value` never copies
/// an array or hash.
#[derive(Debug, Clone, Default)]
pub enum Value {
    /// 64-bit signed integer
    Integer(i64),
    /// Boolean value
    Boolean(bool),
    /// Immutable string
    String(Rc<str>),
    /// null
    #[default]
    Null,
    /// Ordered sequence of values
    Array(Rc<Vec<Value>>),
    /// Mapping from hashable values to values
    Hash(Rc<HashObject>),
    /// Function template from the constant pool
    Function(Rc<CompiledFunction>),
    /// Function template bound to its captured values
    Closure(Rc<Closure>),
    /// Host function
    Builtin(Builtin),
    /// Error value produced by a builtin
    Error(Rc<str>),
    /// Wrapper marking a value being returned
    Return(Rc<Value>),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Return(a), Value::Return(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Creates a string value.
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    /// Creates an array value.
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(elements))
    }

    /// Creates an error value.
    pub fn error(message: impl AsRef<str>) -> Self {
        Value::Error(Rc::from(message.as_ref()))
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Null and false are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    /// Returns the type tag of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
            Value::Builtin(_) => "BUILTIN",
            Value::Error(_) => "ERROR",
            Value::Return(_) => "RETURN_VALUE",
        }
    }

    /// Returns the key this value hashes to, or `None` if it cannot be used
    /// as a hash key.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Integer(n) => Some(HashKey::Integer(*n)),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::String(s) => Some(HashKey::String(Rc::clone(s))),
            _ => None,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => f.write_str(s),
            Value::Null => f.write_str("null"),
            Value::Array(elements) => {
                f.write_str("[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                f.write_str("]")
            }
            Value::Hash(hash) => write!(f, "{}", hash),
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "CompiledFunction<{}>[{:p}]", name, Rc::as_ptr(func)),
                None => write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func)),
            },
            Value::Closure(closure) => write!(f, "Closure[{:p}]", Rc::as_ptr(closure)),
            Value::Builtin(builtin) => write!(f, "builtin function {}", builtin.name),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::Return(value) => write!(f, "{}", value),
        }
    }
}

/// A value usable as a hash key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    /// Integer key
    Integer(i64),
    /// Boolean key
    Boolean(bool),
    /// String key
    String(Rc<str>),
}

/// A hash value. Iteration follows insertion order.
#[derive(Debug, Clone, Default)]
pub struct HashObject {
    slots: FxHashMap<HashKey, usize>,
    pairs: Vec<(Value, Value)>,
}

impl HashObject {
    /// Creates an empty hash.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a pair, replacing the value of an existing equal key.
    ///
    /// Returns the key back if it is not hashable.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), Value> {
        let Some(hash_key) = key.hash_key() else {
            return Err(key);
        };

        match self.slots.get(&hash_key) {
            Some(&slot) => self.pairs[slot].1 = value,
            None => {
                self.slots.insert(hash_key, self.pairs.len());
                self.pairs.push((key, value));
            }
        }
        Ok(())
    }

    /// Looks up a value by key.
    pub fn get(&self, key: &HashKey) -> Option<&Value> {
        self.slots.get(key).map(|&slot| &self.pairs[slot].1)
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Returns true if the hash has no pairs.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Iterates over pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.pairs.iter().map(|(key, value)| (key, value))
    }
}

impl fmt::Display for HashObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        f.write_str("}")
    }
}
