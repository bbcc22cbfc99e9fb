// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Compile-time errors.

use thiserror::Error;

use super::bytecode::BytecodeError;

/// An error that aborts compilation. No bytecode is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// Identifier is not bound in any enclosing scope
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    /// Hash literal key can never hash at runtime
    #[error("unusable as hash key: {0}")]
    UnhashableKey(String),

    /// An operand does not fit its encoded width
    #[error("too many {what}: {count} exceeds the limit of {limit}")]
    OperandOverflow {
        /// What ran out
        what: &'static str,
        /// Requested count or index
        count: usize,
        /// Largest encodable value
        limit: usize,
    },

    /// Expression tree deeper than the compiler walks
    #[error("expression nesting exceeds {limit} levels")]
    NestingTooDeep {
        /// Deepest accepted nesting
        limit: usize,
    },

    /// Instruction could not be encoded
    #[error(transparent)]
    Bytecode(#[from] BytecodeError),
}
