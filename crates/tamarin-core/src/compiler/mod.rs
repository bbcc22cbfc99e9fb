// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bytecode compiler for Tamarin.
//!
//! Transforms AST into bytecode that can be executed by the VM.
//!
//! # Module Structure
//!
//! - `bytecode`: Opcode table, instruction encoding and disassembly
//! - `codegen`: Code generation from AST
//!   - `codegen::scope`: Symbol table for name resolution
//! - `error`: Compile errors

pub mod bytecode;
pub mod codegen;
pub mod error;

pub use bytecode::{Bytecode, BytecodeError, Definition, Instructions, OpCode, make, read_operands};
pub use codegen::{Compiler, Symbol, SymbolScope, SymbolTable};
pub use error::CompileError;
