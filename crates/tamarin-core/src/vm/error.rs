// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Runtime errors raised by the VM.

use thiserror::Error;

use crate::compiler::BytecodeError;

/// An error that aborts a VM run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Binary operator applied to operands of different types
    #[error("type mismatch: {left} {operator} {right}")]
    TypeMismatch {
        /// Operator symbol
        operator: &'static str,
        /// Left operand type
        left: &'static str,
        /// Right operand type
        right: &'static str,
    },

    /// Operator has no meaning for the operand type
    #[error("unsupported operator {operator} for {operand}")]
    UnsupportedOperator {
        /// Operator symbol
        operator: &'static str,
        /// Operand type
        operand: &'static str,
    },

    /// Integer division by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Callee is not a closure or builtin
    #[error("calling non-function {0}")]
    NotCallable(&'static str),

    /// Argument count differs from the parameter count
    #[error("wrong number of arguments: want={expected}, got={found}")]
    WrongArgumentCount {
        /// Declared parameters
        expected: usize,
        /// Supplied arguments
        found: usize,
    },

    /// Operand stack is full
    #[error("stack overflow")]
    StackOverflow,

    /// Pop from an empty operand stack
    #[error("stack underflow")]
    StackUnderflow,

    /// Call depth reached the configured frame limit
    #[error("frame overflow: call depth exceeds {0}")]
    FrameOverflow(usize),

    /// Global slot beyond the globals store
    #[error("global slot {index} exceeds store capacity {capacity}")]
    GlobalsExhausted {
        /// Requested slot
        index: usize,
        /// Store size
        capacity: usize,
    },

    /// Value of this type cannot be a hash key
    #[error("unusable as hash key: {0}")]
    UnusableHashKey(&'static str),

    /// Container does not support this index type
    #[error("index operator not supported: {container}[{index}]")]
    IndexNotSupported {
        /// Indexed value type
        container: &'static str,
        /// Index value type
        index: &'static str,
    },

    /// Instruction stream or its references are invalid
    #[error("malformed bytecode: {0}")]
    MalformedBytecode(String),
}

impl From<BytecodeError> for RuntimeError {
    fn from(err: BytecodeError) -> Self {
        RuntimeError::MalformedBytecode(err.to_string())
    }
}
