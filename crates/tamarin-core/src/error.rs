// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Error types for the Tamarin engine

use thiserror::Error;

use crate::compiler::CompileError;
use crate::parser::ParseError;
use crate::vm::RuntimeError;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating Tamarin code
#[derive(Debug, Error)]
pub enum Error {
    /// Source did not parse
    #[error("SyntaxError: {0}")]
    Syntax(#[from] ParseError),

    /// Program did not compile
    #[error("CompileError: {0}")]
    Compile(#[from] CompileError),

    /// Execution aborted
    #[error("RuntimeError: {0}")]
    Runtime(#[from] RuntimeError),

    /// Source file could not be read
    #[error("IOError: {0}")]
    Io(#[from] std::io::Error),
}
