// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Code generation from AST to bytecode.
//!
//! This module contains the `Compiler` which transforms a parsed Tamarin
//! program into executable bytecode for the VM.
//!
//! ## Structure
//!
//! - `mod.rs` - `Compiler` state, emission and backpatching helpers
//! - `statements.rs` - statement and block compilation
//! - `expressions.rs` - expression compilation
//! - `scope.rs` - `SymbolTable` for name resolution

mod expressions;
mod scope;
mod statements;

#[cfg(test)]
mod tests;

pub use scope::{Scope, Symbol, SymbolScope, SymbolTable};

use std::rc::Rc;

use tracing::debug;

use super::bytecode::{self, Bytecode, Instructions, OpCode};
use super::error::CompileError;
use crate::ast::Program;
use crate::builtins::Builtins;
use crate::runtime::value::Value;

/// Largest value of a two-byte operand.
pub(crate) const MAX_U16_OPERAND: usize = u16::MAX as usize;
/// Largest value of a one-byte operand.
pub(crate) const MAX_U8_OPERAND: usize = u8::MAX as usize;

/// Operand written into a jump before its target is known.
const JUMP_PLACEHOLDER: usize = 9999;

#[derive(Debug, Clone, Copy)]
struct EmittedInstruction {
    opcode: OpCode,
    position: usize,
}

/// Instruction buffer of one function body being compiled.
#[derive(Debug, Default)]
struct CompilationScope {
    instructions: Instructions,
    last: Option<EmittedInstruction>,
    previous: Option<EmittedInstruction>,
}

/// Compiles AST to bytecode.
pub struct Compiler {
    /// The constant pool, shared by every function in the program
    constants: Vec<Value>,
    /// Name resolution state
    symbols: SymbolTable,
    /// One entry per function being compiled, innermost last
    scopes: Vec<CompilationScope>,
    /// Builtins visible to the program
    builtins: Rc<Builtins>,
    /// Expressions currently being compiled
    depth: usize,
}

impl Compiler {
    /// Creates a compiler with the standard builtins.
    pub fn new() -> Self {
        Self::with_builtins(Rc::new(Builtins::standard()))
    }

    /// Creates a compiler that resolves names against `builtins`.
    pub fn with_builtins(builtins: Rc<Builtins>) -> Self {
        let symbols = Self::global_symbols(&builtins);
        Self::with_state(symbols, Vec::new(), builtins)
    }

    /// Creates a compiler that continues from earlier compilations.
    ///
    /// `symbols` and `constants` are what a previous compiler returned from
    /// [`Compiler::finish`], so globals and constants keep their slots.
    pub fn with_state(symbols: SymbolTable, constants: Vec<Value>, builtins: Rc<Builtins>) -> Self {
        Self {
            constants,
            symbols,
            scopes: vec![CompilationScope::default()],
            builtins,
            depth: 0,
        }
    }

    /// A fresh global symbol table with `builtins` defined.
    pub fn global_symbols(builtins: &Builtins) -> SymbolTable {
        let mut symbols = SymbolTable::new();
        for (index, builtin) in builtins.iter() {
            symbols.define_builtin(index, &builtin.name);
        }
        symbols
    }

    /// Builtins this compiler resolves against.
    pub fn builtins(&self) -> &Rc<Builtins> {
        &self.builtins
    }

    // ========================================================================
    // Main Compilation Entry Point
    // ========================================================================

    /// Compiles a program, appending to the top-level instructions.
    pub fn compile(&mut self, program: &Program) -> Result<(), CompileError> {
        for statement in &program.statements {
            self.compile_statement(statement)?;
        }

        debug!(
            instructions = self.current_instructions().len(),
            constants = self.constants.len(),
            "compiled program"
        );
        Ok(())
    }

    /// Returns a copy of the compiled program.
    pub fn bytecode(&self) -> Bytecode {
        Bytecode {
            instructions: self.current_instructions().clone(),
            constants: self.constants.clone(),
        }
    }

    /// Consumes the compiler, returning the program and the symbol table
    /// for a later [`Compiler::with_state`].
    pub fn finish(mut self) -> (Bytecode, SymbolTable) {
        let instructions = self
            .scopes
            .drain(..)
            .next()
            .map(|scope| scope.instructions)
            .unwrap_or_default();
        let bytecode = Bytecode {
            instructions,
            constants: self.constants,
        };
        (bytecode, self.symbols)
    }

    // ========================================================================
    // Emission
    // ========================================================================

    fn current_scope(&self) -> &CompilationScope {
        // `scopes` always holds the top-level scope
        &self.scopes[self.scopes.len() - 1]
    }

    fn current_scope_mut(&mut self) -> &mut CompilationScope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    fn current_instructions(&self) -> &Instructions {
        &self.current_scope().instructions
    }

    /// Emits an instruction and returns its offset.
    fn emit(&mut self, opcode: OpCode, operands: &[usize]) -> Result<usize, CompileError> {
        let instruction = bytecode::make(opcode, operands)?;
        let scope = self.current_scope_mut();
        let position = scope.instructions.push(&instruction);
        scope.previous = scope.last.replace(EmittedInstruction { opcode, position });
        Ok(position)
    }

    /// Emits a jump with a placeholder target, to be fixed by `patch_jump`.
    fn emit_jump(&mut self, opcode: OpCode) -> Result<usize, CompileError> {
        self.emit(opcode, &[JUMP_PLACEHOLDER])
    }

    /// Points the jump at `position` to the current end of the instructions.
    fn patch_jump(&mut self, position: usize) -> Result<(), CompileError> {
        let target = checked_operand("instruction bytes", self.current_instructions().len(), MAX_U16_OPERAND)?;
        let opcode = OpCode::try_from(self.current_instructions().as_bytes()[position])?;
        let instruction = bytecode::make(opcode, &[target])?;
        self.current_scope_mut()
            .instructions
            .overwrite(position, &instruction);
        Ok(())
    }

    fn last_instruction_is(&self, opcode: OpCode) -> bool {
        self.current_scope()
            .last
            .is_some_and(|last| last.opcode == opcode)
    }

    fn remove_last_pop(&mut self) {
        let scope = self.current_scope_mut();
        if let Some(last) = scope.last {
            scope.instructions.truncate(last.position);
            scope.last = scope.previous;
        }
    }

    fn replace_last_pop_with_return(&mut self) -> Result<(), CompileError> {
        let instruction = bytecode::make(OpCode::ReturnValue, &[])?;
        let scope = self.current_scope_mut();
        if let Some(last) = scope.last.as_mut() {
            scope.instructions.overwrite(last.position, &instruction);
            last.opcode = OpCode::ReturnValue;
        }
        Ok(())
    }

    fn add_constant(&mut self, value: Value) -> Result<usize, CompileError> {
        let index = checked_operand("constants", self.constants.len(), MAX_U16_OPERAND)?;
        self.constants.push(value);
        Ok(index)
    }

    // ========================================================================
    // Scopes
    // ========================================================================

    fn enter_scope(&mut self) {
        self.scopes.push(CompilationScope::default());
        self.symbols.push_scope();
    }

    fn leave_scope(&mut self) -> (Instructions, Scope) {
        let instructions = self
            .scopes
            .pop()
            .map(|scope| scope.instructions)
            .unwrap_or_default();
        let scope = self.symbols.pop_scope().unwrap_or_default();
        (instructions, scope)
    }

    /// Emits the load matching the symbol's storage class.
    fn load_symbol(&mut self, symbol: &Symbol) -> Result<(), CompileError> {
        match symbol.scope {
            SymbolScope::Global => {
                let slot = checked_operand("global bindings", symbol.index, MAX_U16_OPERAND)?;
                self.emit(OpCode::GetGlobal, &[slot])?;
            }
            SymbolScope::Local => {
                let slot = checked_operand("local bindings", symbol.index, MAX_U8_OPERAND)?;
                self.emit(OpCode::GetLocal, &[slot])?;
            }
            SymbolScope::Builtin => {
                let slot = checked_operand("builtins", symbol.index, MAX_U8_OPERAND)?;
                self.emit(OpCode::GetBuiltin, &[slot])?;
            }
            SymbolScope::Free => {
                let slot = checked_operand("captured variables", symbol.index, MAX_U8_OPERAND)?;
                self.emit(OpCode::GetFree, &[slot])?;
            }
            SymbolScope::Function => {
                self.emit(OpCode::CurrentClosure, &[])?;
            }
        }
        Ok(())
    }

    /// Emits the store matching the symbol's storage class.
    fn store_symbol(&mut self, symbol: &Symbol) -> Result<(), CompileError> {
        if symbol.scope == SymbolScope::Global {
            let slot = checked_operand("global bindings", symbol.index, MAX_U16_OPERAND)?;
            self.emit(OpCode::SetGlobal, &[slot])?;
        } else {
            let slot = checked_operand("local bindings", symbol.index, MAX_U8_OPERAND)?;
            self.emit(OpCode::SetLocal, &[slot])?;
        }
        Ok(())
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Checks that `value` fits an operand whose largest value is `limit`.
fn checked_operand(what: &'static str, value: usize, limit: usize) -> Result<usize, CompileError> {
    if value > limit {
        return Err(CompileError::OperandOverflow {
            what,
            count: value,
            limit,
        });
    }
    Ok(value)
}
