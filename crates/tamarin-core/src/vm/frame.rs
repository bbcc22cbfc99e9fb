// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Call frames.

use std::rc::Rc;

use crate::runtime::function::Closure;

/// A call frame for function execution.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The closure being executed
    pub closure: Rc<Closure>,
    /// Offset of the next byte to execute
    pub ip: usize,
    /// Stack index of the first argument; the callee sits just below
    pub base_pointer: usize,
}

impl Frame {
    /// Creates a frame positioned at the first instruction.
    pub fn new(closure: Rc<Closure>, base_pointer: usize) -> Self {
        Self {
            closure,
            ip: 0,
            base_pointer,
        }
    }

    /// The bytes being executed.
    pub fn instructions(&self) -> &[u8] {
        self.closure.function.instructions.as_bytes()
    }
}
