// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Statement compilation.
//!
//! | Statement | Key Operations | Notes |
//! |-----------|----------------|-------|
//! | `let` | `SetGlobal` / `SetLocal` | Name is bound after the value compiles |
//! | `return` | `ReturnValue` | Also ends a top-level program |
//! | expression | `Pop` | Value is discarded |

use super::Compiler;
use crate::ast::{BlockStatement, Statement};
use crate::compiler::bytecode::OpCode;
use crate::compiler::error::CompileError;

impl Compiler {
    pub(super) fn compile_statement(&mut self, statement: &Statement) -> Result<(), CompileError> {
        match statement {
            Statement::Expression(expr) => {
                self.compile_expression(expr)?;
                self.emit(OpCode::Pop, &[])?;
            }
            Statement::Let(stmt) => {
                self.compile_expression(&stmt.value)?;
                let symbol = self.symbols.define(&stmt.name.name);
                self.store_symbol(&symbol)?;
            }
            Statement::Return(value) => {
                self.compile_expression(value)?;
                self.emit(OpCode::ReturnValue, &[])?;
            }
        }
        Ok(())
    }

    pub(super) fn compile_block(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        for statement in &block.statements {
            self.compile_statement(statement)?;
        }
        Ok(())
    }

    /// Compiles an if/else branch so that it leaves exactly one value on
    /// the stack: its trailing expression, or null.
    pub(super) fn compile_branch(&mut self, block: &BlockStatement) -> Result<(), CompileError> {
        self.compile_block(block)?;
        if self.last_instruction_is(OpCode::Pop) {
            self.remove_last_pop();
        } else {
            self.emit(OpCode::Null, &[])?;
        }
        Ok(())
    }
}
