// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The bytecode virtual machine.
//!
//! ## Structure
//!
//! - `interpreter` - Main VM execution loop and opcode handlers
//! - `frame` - Call frames (closure, instruction pointer, base pointer)
//! - `error` - `RuntimeError`
//!
//! ## Stack Layout During a Call
//!
//! ```text
//! | ...     |
//! | callee  |  <- base_pointer - 1
//! | arg 0   |  <- base_pointer
//! | arg 1   |
//! | local 2 |
//! | ...     |  <- operands of the callee
//! ```

mod error;
mod frame;
mod interpreter;

pub use error::RuntimeError;
pub use frame::Frame;
pub use interpreter::VM;
