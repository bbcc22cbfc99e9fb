// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The bytecode interpreter.

use std::mem;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::error::RuntimeError;
use super::frame::Frame;
use crate::builtins::Builtins;
use crate::compiler::bytecode::{self, Bytecode, OpCode};
use crate::config::EngineConfig;
use crate::runtime::function::{Builtin, Closure, CompiledFunction};
use crate::runtime::value::{HashObject, Value};

fn operator_symbol(opcode: OpCode) -> &'static str {
    match opcode {
        OpCode::Add => "+",
        OpCode::Sub => "-",
        OpCode::Mul => "*",
        OpCode::Div => "/",
        OpCode::Equal => "==",
        OpCode::NotEqual => "!=",
        OpCode::GreaterThan => ">",
        OpCode::LessThan => "<",
        OpCode::Minus => "-",
        OpCode::Bang => "!",
        _ => "?",
    }
}

/// The Tamarin virtual machine.
///
/// Executes one compiled program against a globals store that the caller
/// can take back with [`VM::into_globals`] and pass to the next run.
pub struct VM<'a> {
    /// Constant pool of the program
    constants: &'a [Value],
    /// Operand stack; never grows past `stack_size`
    stack: Vec<Value>,
    stack_size: usize,
    /// Global slots
    globals: Vec<Value>,
    /// The frame being executed
    frame: Frame,
    /// Suspended callers, outermost first
    frames: Vec<Frame>,
    max_frames: usize,
    /// Builtins addressed by `OpGetBuiltin`
    builtins: Rc<Builtins>,
    /// Most recent value discarded by `OpPop` or returned from the top level
    last_popped: Option<Value>,
}

impl<'a> VM<'a> {
    /// Creates a VM with the standard builtins, default limits and an empty
    /// globals store.
    pub fn new(bytecode: &'a Bytecode) -> Self {
        let config = EngineConfig::default();
        let globals = vec![Value::Null; config.globals_size];
        Self::with_globals(bytecode, globals, Rc::new(Builtins::standard()), &config)
    }

    /// Creates a VM that reads and writes an existing globals store.
    pub fn with_globals(
        bytecode: &'a Bytecode,
        globals: Vec<Value>,
        builtins: Rc<Builtins>,
        config: &EngineConfig,
    ) -> Self {
        let main = CompiledFunction::new(bytecode.instructions.clone(), 0, 0);
        let main = Rc::new(Closure::new(Rc::new(main)));

        Self {
            constants: &bytecode.constants,
            stack: Vec::with_capacity(config.stack_size),
            stack_size: config.stack_size,
            globals,
            frame: Frame::new(main, 0),
            frames: Vec::new(),
            max_frames: config.max_frames,
            builtins,
            last_popped: None,
        }
    }

    /// The value most recently popped off the stack, which is the result
    /// of a program's final expression statement.
    pub fn last_popped(&self) -> Option<&Value> {
        self.last_popped.as_ref()
    }

    /// The value on top of the stack.
    pub fn stack_top(&self) -> Option<&Value> {
        self.stack.last()
    }

    /// Gives back the globals store.
    pub fn into_globals(self) -> Vec<Value> {
        self.globals
    }

    // ========================================================================
    // Main Execution Loop
    // ========================================================================

    /// Runs the program until its instructions are exhausted or it returns.
    pub fn run(&mut self) -> Result<(), RuntimeError> {
        debug!(
            instructions = self.frame.instructions().len(),
            constants = self.constants.len(),
            "vm run"
        );

        loop {
            let Some(opcode) = self.fetch_opcode()? else {
                if self.frames.is_empty() {
                    return Ok(());
                }
                return Err(RuntimeError::MalformedBytecode(
                    "function body ended without a return".into(),
                ));
            };

            match opcode {
                OpCode::Constant => {
                    let index = self.read_u16()?;
                    let constant = self.constants.get(index).cloned().ok_or_else(|| {
                        RuntimeError::MalformedBytecode(format!("no constant at index {}", index))
                    })?;
                    self.push(constant)?;
                }
                OpCode::Null => self.push(Value::Null)?,
                OpCode::True => self.push(Value::Boolean(true))?,
                OpCode::False => self.push(Value::Boolean(false))?,
                OpCode::Pop => {
                    let value = self.pop()?;
                    self.last_popped = Some(value);
                }

                OpCode::Add | OpCode::Sub | OpCode::Mul | OpCode::Div => {
                    self.execute_binary_operation(opcode)?;
                }
                OpCode::Equal | OpCode::NotEqual | OpCode::GreaterThan | OpCode::LessThan => {
                    self.execute_comparison(opcode)?;
                }
                OpCode::Minus => match self.pop()? {
                    Value::Integer(n) => self.push(Value::Integer(n.wrapping_neg()))?,
                    other => {
                        return Err(RuntimeError::UnsupportedOperator {
                            operator: operator_symbol(opcode),
                            operand: other.type_name(),
                        });
                    }
                },
                OpCode::Bang => {
                    let operand = self.pop()?;
                    self.push(Value::Boolean(!operand.is_truthy()))?;
                }

                OpCode::Jump => {
                    let target = self.read_u16()?;
                    self.frame.ip = target;
                }
                OpCode::JumpNotTruthy => {
                    let target = self.read_u16()?;
                    let condition = self.pop()?;
                    if !condition.is_truthy() {
                        self.frame.ip = target;
                    }
                }

                OpCode::Array => {
                    let count = self.read_u16()?;
                    let elements = self.pop_many(count)?;
                    self.push(Value::array(elements))?;
                }
                OpCode::Hash => {
                    let count = self.read_u16()?;
                    let hash = self.build_hash(count)?;
                    self.push(Value::Hash(Rc::new(hash)))?;
                }
                OpCode::Index => {
                    let index = self.pop()?;
                    let left = self.pop()?;
                    let value = self.execute_index(&left, &index)?;
                    self.push(value)?;
                }

                OpCode::SetGlobal => {
                    let index = self.read_u16()?;
                    let value = self.pop()?;
                    let capacity = self.globals.len();
                    let slot = self
                        .globals
                        .get_mut(index)
                        .ok_or(RuntimeError::GlobalsExhausted { index, capacity })?;
                    *slot = value;
                }
                OpCode::GetGlobal => {
                    let index = self.read_u16()?;
                    let value = self.globals.get(index).cloned().ok_or(
                        RuntimeError::GlobalsExhausted {
                            index,
                            capacity: self.globals.len(),
                        },
                    )?;
                    self.push(value)?;
                }
                OpCode::SetLocal => {
                    let index = self.read_u8()?;
                    let value = self.pop()?;
                    let slot = self.frame.base_pointer + index;
                    *self.local_slot(slot)? = value;
                }
                OpCode::GetLocal => {
                    let index = self.read_u8()?;
                    let slot = self.frame.base_pointer + index;
                    let value = self.local_slot(slot)?.clone();
                    self.push(value)?;
                }
                OpCode::GetBuiltin => {
                    let index = self.read_u8()?;
                    let builtin = self.builtins.get(index).cloned().ok_or_else(|| {
                        RuntimeError::MalformedBytecode(format!("no builtin at index {}", index))
                    })?;
                    self.push(Value::Builtin(builtin))?;
                }
                OpCode::GetFree => {
                    let index = self.read_u8()?;
                    let value = self.frame.closure.free.get(index).cloned().ok_or_else(|| {
                        RuntimeError::MalformedBytecode(format!("no captured value at index {}", index))
                    })?;
                    self.push(value)?;
                }
                OpCode::CurrentClosure => {
                    let closure = Rc::clone(&self.frame.closure);
                    self.push(Value::Closure(closure))?;
                }

                OpCode::Closure => {
                    let index = self.read_u16()?;
                    let free_count = self.read_u8()?;
                    self.push_closure(index, free_count)?;
                }
                OpCode::Call => {
                    let argc = self.read_u8()?;
                    self.execute_call(argc)?;
                }
                OpCode::ReturnValue => {
                    let value = self.pop()?;
                    if self.return_from_frame(value)? {
                        return Ok(());
                    }
                }
                OpCode::Return => {
                    if self.return_from_frame(Value::Null)? {
                        return Ok(());
                    }
                }
            }
        }
    }

    // ========================================================================
    // Instruction Decoding
    // ========================================================================

    fn fetch_opcode(&mut self) -> Result<Option<OpCode>, RuntimeError> {
        let frame = &mut self.frame;
        let Some(&byte) = frame.closure.function.instructions.as_bytes().get(frame.ip) else {
            return Ok(None);
        };
        frame.ip += 1;
        Ok(Some(OpCode::try_from(byte)?))
    }

    fn read_u16(&mut self) -> Result<usize, RuntimeError> {
        let frame = &mut self.frame;
        let operand = bytecode::read_u16(frame.closure.function.instructions.as_bytes(), frame.ip)?;
        frame.ip += 2;
        Ok(operand as usize)
    }

    fn read_u8(&mut self) -> Result<usize, RuntimeError> {
        let frame = &mut self.frame;
        let operand = bytecode::read_u8(frame.closure.function.instructions.as_bytes(), frame.ip)?;
        frame.ip += 1;
        Ok(operand as usize)
    }

    // ========================================================================
    // Stack Operations
    // ========================================================================

    fn push(&mut self, value: Value) -> Result<(), RuntimeError> {
        if self.stack.len() >= self.stack_size {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Removes the top `count` values, oldest first.
    fn pop_many(&mut self, count: usize) -> Result<Vec<Value>, RuntimeError> {
        let start = self
            .stack
            .len()
            .checked_sub(count)
            .ok_or(RuntimeError::StackUnderflow)?;
        Ok(self.stack.split_off(start))
    }

    fn local_slot(&mut self, slot: usize) -> Result<&mut Value, RuntimeError> {
        self.stack.get_mut(slot).ok_or_else(|| {
            RuntimeError::MalformedBytecode(format!("local slot {} is outside the frame", slot))
        })
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn execute_binary_operation(&mut self, opcode: OpCode) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;
        let operator = operator_symbol(opcode);

        let result = match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => {
                let value = match opcode {
                    OpCode::Add => l.wrapping_add(*r),
                    OpCode::Sub => l.wrapping_sub(*r),
                    OpCode::Mul => l.wrapping_mul(*r),
                    _ => {
                        if *r == 0 {
                            return Err(RuntimeError::DivisionByZero);
                        }
                        l.wrapping_div(*r)
                    }
                };
                Value::Integer(value)
            }
            (Value::String(l), Value::String(r)) => {
                if opcode != OpCode::Add {
                    return Err(RuntimeError::UnsupportedOperator {
                        operator,
                        operand: left.type_name(),
                    });
                }
                let mut joined = String::with_capacity(l.len() + r.len());
                joined.push_str(l);
                joined.push_str(r);
                Value::String(Rc::from(joined))
            }
            _ if mem::discriminant(&left) == mem::discriminant(&right) => {
                return Err(RuntimeError::UnsupportedOperator {
                    operator,
                    operand: left.type_name(),
                });
            }
            _ => {
                return Err(RuntimeError::TypeMismatch {
                    operator,
                    left: left.type_name(),
                    right: right.type_name(),
                });
            }
        };

        self.push(result)
    }

    fn execute_comparison(&mut self, opcode: OpCode) -> Result<(), RuntimeError> {
        let right = self.pop()?;
        let left = self.pop()?;

        let result = match (&left, &right) {
            (Value::Integer(l), Value::Integer(r)) => match opcode {
                OpCode::Equal => l == r,
                OpCode::NotEqual => l != r,
                OpCode::GreaterThan => l > r,
                _ => l < r,
            },
            _ => match opcode {
                OpCode::Equal => left == right,
                OpCode::NotEqual => left != right,
                _ if mem::discriminant(&left) == mem::discriminant(&right) => {
                    return Err(RuntimeError::UnsupportedOperator {
                        operator: operator_symbol(opcode),
                        operand: left.type_name(),
                    });
                }
                _ => {
                    return Err(RuntimeError::TypeMismatch {
                        operator: operator_symbol(opcode),
                        left: left.type_name(),
                        right: right.type_name(),
                    });
                }
            },
        };

        self.push(Value::Boolean(result))
    }

    fn execute_index(&self, left: &Value, index: &Value) -> Result<Value, RuntimeError> {
        match (left, index) {
            (Value::Array(elements), Value::Integer(i)) => Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| elements.get(i))
                .cloned()
                .unwrap_or(Value::Null)),
            (Value::Hash(hash), key) => {
                let key = key
                    .hash_key()
                    .ok_or(RuntimeError::UnusableHashKey(key.type_name()))?;
                Ok(hash.get(&key).cloned().unwrap_or(Value::Null))
            }
            _ => Err(RuntimeError::IndexNotSupported {
                container: left.type_name(),
                index: index.type_name(),
            }),
        }
    }

    fn build_hash(&mut self, count: usize) -> Result<HashObject, RuntimeError> {
        if count % 2 != 0 {
            return Err(RuntimeError::MalformedBytecode(format!(
                "hash built from an odd number of values ({})",
                count
            )));
        }

        let items = self.pop_many(count)?;
        let mut hash = HashObject::new();
        let mut items = items.into_iter();

        while let (Some(key), Some(value)) = (items.next(), items.next()) {
            hash.insert(key, value)
                .map_err(|key| RuntimeError::UnusableHashKey(key.type_name()))?;
        }

        Ok(hash)
    }

    // ========================================================================
    // Functions
    // ========================================================================

    fn push_closure(&mut self, index: usize, free_count: usize) -> Result<(), RuntimeError> {
        let function = match self.constants.get(index) {
            Some(Value::Function(function)) => Rc::clone(function),
            Some(other) => {
                return Err(RuntimeError::MalformedBytecode(format!(
                    "constant {} is {}, not a function",
                    index,
                    other.type_name()
                )));
            }
            None => {
                return Err(RuntimeError::MalformedBytecode(format!(
                    "no constant at index {}",
                    index
                )));
            }
        };

        let free = self.pop_many(free_count)?;
        self.push(Value::Closure(Rc::new(Closure { function, free })))
    }

    fn execute_call(&mut self, argc: usize) -> Result<(), RuntimeError> {
        let callee_index = self
            .stack
            .len()
            .checked_sub(argc + 1)
            .ok_or(RuntimeError::StackUnderflow)?;

        match &self.stack[callee_index] {
            Value::Closure(closure) => {
                let closure = Rc::clone(closure);
                self.call_closure(closure, argc, callee_index)
            }
            Value::Builtin(builtin) => {
                let builtin = builtin.clone();
                self.call_builtin(&builtin, callee_index)
            }
            other => Err(RuntimeError::NotCallable(other.type_name())),
        }
    }

    fn call_closure(
        &mut self,
        closure: Rc<Closure>,
        argc: usize,
        callee_index: usize,
    ) -> Result<(), RuntimeError> {
        let function = &closure.function;
        if argc != function.num_parameters {
            return Err(RuntimeError::WrongArgumentCount {
                expected: function.num_parameters,
                found: argc,
            });
        }

        // live frames are the suspended callers plus the current one
        if self.frames.len() + 2 > self.max_frames {
            return Err(RuntimeError::FrameOverflow(self.max_frames));
        }

        let base_pointer = callee_index + 1;
        let frame_top = base_pointer + function.num_locals.max(argc);
        if frame_top > self.stack_size {
            return Err(RuntimeError::StackOverflow);
        }
        self.stack.resize(frame_top, Value::Null);

        let caller = mem::replace(&mut self.frame, Frame::new(closure, base_pointer));
        self.frames.push(caller);
        trace!(depth = self.frames.len() + 1, base_pointer, "frame pushed");

        Ok(())
    }

    fn call_builtin(&mut self, builtin: &Builtin, callee_index: usize) -> Result<(), RuntimeError> {
        let args = self.stack.split_off(callee_index + 1);
        let result = builtin.call(&args).unwrap_or_else(|message| {
            warn!(builtin = %builtin.name, %message, "builtin returned an error");
            Value::error(message)
        });

        self.stack.truncate(callee_index);
        self.push(result)
    }

    /// Pops the current frame and hands `value` to the caller. Returns true
    /// when the top-level program itself returned.
    fn return_from_frame(&mut self, value: Value) -> Result<bool, RuntimeError> {
        let Some(caller) = self.frames.pop() else {
            self.last_popped = Some(value);
            return Ok(true);
        };

        let callee = mem::replace(&mut self.frame, caller);
        self.stack.truncate(callee.base_pointer.saturating_sub(1));
        trace!(depth = self.frames.len() + 1, "frame popped");

        self.push(value)?;
        Ok(false)
    }
}
