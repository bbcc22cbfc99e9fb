// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Expression compilation.
//!
//! Every expression leaves exactly one value on the stack.
//!
//! | Expression | Key Operations | Stack Effect |
//! |------------|----------------|--------------|
//! | Literal | `Constant` / `True` / `False` | Push value |
//! | Identifier | `GetGlobal` / `GetLocal` / `GetFree` / `GetBuiltin` / `CurrentClosure` | Push value |
//! | Infix | `Add` / `Sub` / ... | Pop 2, push 1 |
//! | Prefix | `Minus` / `Bang` | Pop 1, push 1 |
//! | if/else | `JumpNotTruthy`, `Jump` | Pop 1, push 1 |
//! | Call | `Call` | Pop N+1, push result |
//! | Array | `Array` | Pop N, push 1 |
//! | Hash | `Hash` | Pop N*2, push 1 |
//! | Index | `Index` | Pop 2, push 1 |
//! | Function | `Closure` | Pop free count, push closure |
//!
//! ```text
//! Expression: 1 + 2 * 3
//!
//! Bytecode:
//!   OpConstant 0    ; stack: [1]
//!   OpConstant 1    ; stack: [1, 2]
//!   OpConstant 2    ; stack: [1, 2, 3]
//!   OpMul           ; stack: [1, 6]
//!   OpAdd           ; stack: [7]
//! ```

use std::rc::Rc;

use super::{checked_operand, Compiler, MAX_U16_OPERAND, MAX_U8_OPERAND};
use crate::ast::*;
use crate::compiler::bytecode::OpCode;
use crate::compiler::error::CompileError;
use crate::config::MAX_NESTING_DEPTH;
use crate::runtime::function::CompiledFunction;
use crate::runtime::value::Value;

impl Compiler {
    pub(super) fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(CompileError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
            });
        }

        self.depth += 1;
        let result = self.compile_expression_kind(expr);
        self.depth -= 1;
        result
    }

    fn compile_expression_kind(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::Integer(n) => {
                let index = self.add_constant(Value::Integer(*n))?;
                self.emit(OpCode::Constant, &[index])?;
            }
            Expression::String(s) => {
                let index = self.add_constant(Value::string(s))?;
                self.emit(OpCode::Constant, &[index])?;
            }
            Expression::Boolean(true) => {
                self.emit(OpCode::True, &[])?;
            }
            Expression::Boolean(false) => {
                self.emit(OpCode::False, &[])?;
            }
            Expression::Identifier(ident) => {
                let symbol = self
                    .symbols
                    .resolve(&ident.name)
                    .ok_or_else(|| CompileError::UndefinedVariable(ident.name.clone()))?;
                self.load_symbol(&symbol)?;
            }
            Expression::Prefix(prefix) => {
                self.compile_expression(&prefix.right)?;
                let opcode = match prefix.operator {
                    PrefixOperator::Not => OpCode::Bang,
                    PrefixOperator::Negate => OpCode::Minus,
                };
                self.emit(opcode, &[])?;
            }
            Expression::Infix(infix) => self.compile_infix(infix)?,
            Expression::If(if_expr) => self.compile_if(if_expr)?,
            Expression::Function(func) => self.compile_function(func)?,
            Expression::Call(call) => {
                self.compile_expression(&call.function)?;
                for argument in &call.arguments {
                    self.compile_expression(argument)?;
                }
                let argc = checked_operand("call arguments", call.arguments.len(), MAX_U8_OPERAND)?;
                self.emit(OpCode::Call, &[argc])?;
            }
            Expression::Array(elements) => {
                for element in elements {
                    self.compile_expression(element)?;
                }
                let count = checked_operand("array elements", elements.len(), MAX_U16_OPERAND)?;
                self.emit(OpCode::Array, &[count])?;
            }
            Expression::Hash(hash) => self.compile_hash(hash)?,
            Expression::Index(index) => {
                self.compile_expression(&index.left)?;
                self.compile_expression(&index.index)?;
                self.emit(OpCode::Index, &[])?;
            }
        }
        Ok(())
    }

    fn compile_infix(&mut self, infix: &InfixExpression) -> Result<(), CompileError> {
        self.compile_expression(&infix.left)?;
        self.compile_expression(&infix.right)?;

        let opcode = match infix.operator {
            InfixOperator::Add => OpCode::Add,
            InfixOperator::Subtract => OpCode::Sub,
            InfixOperator::Multiply => OpCode::Mul,
            InfixOperator::Divide => OpCode::Div,
            InfixOperator::Equal => OpCode::Equal,
            InfixOperator::NotEqual => OpCode::NotEqual,
            InfixOperator::LessThan => OpCode::LessThan,
            InfixOperator::GreaterThan => OpCode::GreaterThan,
        };
        self.emit(opcode, &[])?;
        Ok(())
    }

    fn compile_if(&mut self, if_expr: &IfExpression) -> Result<(), CompileError> {
        self.compile_expression(&if_expr.condition)?;
        let jump_not_truthy = self.emit_jump(OpCode::JumpNotTruthy)?;

        self.compile_branch(&if_expr.consequence)?;
        let jump = self.emit_jump(OpCode::Jump)?;
        self.patch_jump(jump_not_truthy)?;

        match &if_expr.alternative {
            Some(alternative) => self.compile_branch(alternative)?,
            None => {
                self.emit(OpCode::Null, &[])?;
            }
        }
        self.patch_jump(jump)?;

        Ok(())
    }

    fn compile_function(&mut self, func: &FunctionLiteral) -> Result<(), CompileError> {
        self.enter_scope();

        if let Some(name) = &func.name {
            self.symbols.define_function_self(name);
        }
        for parameter in &func.parameters {
            self.symbols.define(&parameter.name);
        }

        self.compile_block(&func.body)?;

        if self.last_instruction_is(OpCode::Pop) {
            self.replace_last_pop_with_return()?;
        }
        if !self.last_instruction_is(OpCode::ReturnValue) {
            self.emit(OpCode::Return, &[])?;
        }

        let (instructions, scope) = self.leave_scope();

        // Captured values are read in the enclosing scope, in capture order.
        for symbol in &scope.free_symbols {
            self.load_symbol(symbol)?;
        }

        let free_count = checked_operand("captured variables", scope.free_symbols.len(), MAX_U8_OPERAND)?;
        let num_locals = checked_operand("local bindings", scope.num_definitions, MAX_U8_OPERAND + 1)?;
        let template = CompiledFunction {
            instructions,
            num_locals,
            num_parameters: func.parameters.len(),
            name: func.name.clone(),
        };
        let index = self.add_constant(Value::Function(Rc::new(template)))?;
        self.emit(OpCode::Closure, &[index, free_count])?;

        Ok(())
    }

    fn compile_hash(&mut self, hash: &HashLiteral) -> Result<(), CompileError> {
        for (key, _) in &hash.pairs {
            if matches!(
                key,
                Expression::Array(_) | Expression::Hash(_) | Expression::Function(_)
            ) {
                return Err(CompileError::UnhashableKey(key.to_string()));
            }
        }

        // Sorted by source rendering so equal literals compile identically.
        let mut pairs: Vec<(&Expression, &Expression)> =
            hash.pairs.iter().map(|(key, value)| (key, value)).collect();
        pairs.sort_by_cached_key(|(key, _)| key.to_string());

        for (key, value) in pairs {
            self.compile_expression(key)?;
            self.compile_expression(value)?;
        }

        let count = checked_operand("hash elements", hash.pairs.len() * 2, MAX_U16_OPERAND)?;
        self.emit(OpCode::Hash, &[count])?;
        Ok(())
    }
}
