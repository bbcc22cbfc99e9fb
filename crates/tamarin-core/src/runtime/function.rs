// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tamarin function representation.

use std::fmt;
use std::rc::Rc;

use super::value::Value;
use crate::compiler::Instructions;

/// A compiled function body, stored in the constant pool.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFunction {
    /// The function body
    pub instructions: Instructions,
    /// Stack slots reserved for parameters and locals
    pub num_locals: usize,
    /// Number of declared parameters
    pub num_parameters: usize,
    /// Name of the `let` binding, if any
    pub name: Option<String>,
}

impl CompiledFunction {
    /// Creates a new function template.
    pub fn new(instructions: Instructions, num_locals: usize, num_parameters: usize) -> Self {
        Self {
            instructions,
            num_locals,
            num_parameters,
            name: None,
        }
    }
}

/// A function template bound to the values it captured when created.
#[derive(Debug, Clone)]
pub struct Closure {
    /// The template
    pub function: Rc<CompiledFunction>,
    /// Captured values, in capture order
    pub free: Vec<Value>,
}

impl Closure {
    /// Wraps a template with no captured values.
    pub fn new(function: Rc<CompiledFunction>) -> Self {
        Self {
            function,
            free: Vec::new(),
        }
    }
}

/// Signature of a host function.
///
/// An `Err` becomes an error value in the running program.
pub type BuiltinFn = fn(&[Value]) -> Result<Value, String>;

/// A named host function.
#[derive(Clone)]
pub struct Builtin {
    /// The name scripts call it by
    pub name: Rc<str>,
    /// The native function pointer
    pub func: BuiltinFn,
}

impl Builtin {
    /// Creates a builtin.
    pub fn new(name: impl AsRef<str>, func: BuiltinFn) -> Self {
        Self {
            name: Rc::from(name.as_ref()),
            func,
        }
    }

    /// Invokes the host function.
    pub fn call(&self, args: &[Value]) -> Result<Value, String> {
        (self.func)(args)
    }
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && std::ptr::fn_addr_eq(self.func, other.func)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(_args: &[Value]) -> Result<Value, String> {
        Ok(Value::Integer(42))
    }

    #[test]
    fn test_builtin_call() {
        let builtin = Builtin::new("answer", answer);
        assert_eq!(builtin.call(&[]), Ok(Value::Integer(42)));
        assert_eq!(format!("{:?}", builtin), "Builtin(answer)");
    }

    #[test]
    fn test_closure_without_captures() {
        let template = Rc::new(CompiledFunction::new(Instructions::new(), 2, 1));
        let closure = Closure::new(Rc::clone(&template));
        assert!(closure.free.is_empty());
        assert_eq!(closure.function.num_locals, 2);
        assert_eq!(closure.function.num_parameters, 1);
    }
}
