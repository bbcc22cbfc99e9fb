// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! # tamarin-core
//!
//! Compiler and bytecode virtual machine for the Tamarin language.
//!
//! ## Overview
//!
//! This crate provides the whole execution pipeline:
//! - Lexer and Pratt parser producing a closed-enum AST
//! - Single-pass compiler with a lexical symbol table and closure capture
//! - Stack VM with call frames, closures and builtins
//! - An incremental [`Engine`] that keeps globals between evaluations
//!
//! ## Quick Start
//!
//! ```rust
//! use tamarin_core::{Engine, Value};
//!
//! let mut engine = Engine::new();
//! engine.eval("let double = fn(x) { x * 2 };")?;
//! let result = engine.eval("double(21)")?;
//! assert_eq!(result, Some(Value::Integer(42)));
//! # Ok::<(), tamarin_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod compiler;
pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod vm;

use std::mem;
use std::path::Path;
use std::rc::Rc;

use tracing::debug;

pub use builtins::Builtins;
pub use compiler::{Bytecode, CompileError, Compiler, SymbolTable};
pub use config::EngineConfig;
pub use error::{Error, Result};
pub use parser::ParseError;
pub use runtime::value::Value;
pub use vm::{RuntimeError, VM};

use ast::Program;
use parser::Parser;

/// The main Tamarin engine instance.
///
/// Each call to [`Engine::eval`] compiles against the globals, symbols and
/// constants left by earlier calls, so a REPL can define a function on one
/// line and call it on the next.
pub struct Engine {
    config: EngineConfig,
    builtins: Rc<Builtins>,
    /// Global names defined so far
    symbols: SymbolTable,
    /// Constant pool shared by every evaluation
    constants: Vec<Value>,
    /// Global slots, indexed by symbol
    globals: Vec<Value>,
}

impl Engine {
    /// Creates a new engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Creates a new engine with the given resource limits.
    pub fn with_config(config: EngineConfig) -> Self {
        Self::with_builtins(config, Builtins::standard())
    }

    /// Creates a new engine exposing `builtins` to programs.
    pub fn with_builtins(config: EngineConfig, builtins: Builtins) -> Self {
        Self {
            config,
            symbols: Compiler::global_symbols(&builtins),
            builtins: Rc::new(builtins),
            constants: Vec::new(),
            globals: vec![Value::Null; config.globals_size],
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the builtins table.
    pub fn builtins(&self) -> &Builtins {
        &self.builtins
    }

    /// Compiles source code without running it or recording its
    /// definitions.
    ///
    /// Names defined by earlier evaluations resolve as usual.
    pub fn compile(&self, source: &str) -> Result<Bytecode> {
        let program = Parser::new(source).parse_program()?;
        let (bytecode, _) = self.compile_program(&program)?;
        Ok(bytecode)
    }

    /// Evaluates source code and returns the value of its final expression
    /// statement, if any.
    ///
    /// A parse or compile error leaves the engine untouched.
    pub fn eval(&mut self, source: &str) -> Result<Option<Value>> {
        let program = Parser::new(source).parse_program()?;
        let (bytecode, symbols) = self.compile_program(&program)?;

        let globals = mem::take(&mut self.globals);
        let mut vm = VM::with_globals(&bytecode, globals, Rc::clone(&self.builtins), &self.config);
        let outcome = vm.run();
        let result = vm.last_popped().cloned();
        self.globals = vm.into_globals();

        self.symbols = symbols;
        self.constants = bytecode.constants;

        if let Err(err) = &outcome {
            debug!(error = %err, "evaluation aborted");
        }
        outcome?;
        Ok(result)
    }

    /// Evaluates source code from a file.
    pub fn eval_file(&mut self, path: &Path) -> Result<Option<Value>> {
        let source = std::fs::read_to_string(path)?;
        self.eval(&source)
    }

    fn compile_program(
        &self,
        program: &Program,
    ) -> std::result::Result<(Bytecode, SymbolTable), CompileError> {
        let mut compiler = Compiler::with_state(
            self.symbols.clone(),
            self.constants.clone(),
            Rc::clone(&self.builtins),
        );
        compiler.compile(program)?;
        Ok(compiler.finish())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new();
        assert_eq!(engine.config(), &EngineConfig::default());
        assert_eq!(engine.builtins().len(), 7);
    }

    #[test]
    fn test_eval_returns_last_expression() {
        let mut engine = Engine::new();
        assert_eq!(engine.eval("1 + 2").unwrap(), Some(Value::Integer(3)));
        assert_eq!(engine.eval("let a = 1;").unwrap(), None);
    }

    #[test]
    fn test_globals_persist_between_evals() {
        let mut engine = Engine::new();
        engine.eval("let a = 10;").unwrap();
        engine.eval("let add = fn(x) { x + a };").unwrap();
        assert_eq!(engine.eval("add(5)").unwrap(), Some(Value::Integer(15)));
    }

    #[test]
    fn test_compile_error_leaves_engine_untouched() {
        let mut engine = Engine::new();
        engine.eval("let a = 1;").unwrap();
        let constants = engine.constants.len();

        let err = engine.eval("let b = 2; let c = missing;").unwrap_err();
        assert!(matches!(err, Error::Compile(CompileError::UndefinedVariable(_))));
        assert_eq!(engine.constants.len(), constants);

        assert!(matches!(
            engine.eval("b").unwrap_err(),
            Error::Compile(CompileError::UndefinedVariable(_))
        ));
        assert_eq!(engine.eval("let b = 5; a + b").unwrap(), Some(Value::Integer(6)));
    }

    #[test]
    fn test_syntax_error() {
        let mut engine = Engine::new();
        assert!(matches!(engine.eval("let = 1;"), Err(Error::Syntax(_))));
    }

    #[test]
    fn test_engine_usable_after_runtime_error() {
        let mut engine = Engine::new();
        engine.eval("let a = 2;").unwrap();
        assert!(matches!(
            engine.eval("a + true"),
            Err(Error::Runtime(RuntimeError::TypeMismatch { .. }))
        ));
        assert_eq!(engine.eval("a * 3").unwrap(), Some(Value::Integer(6)));
    }

    #[test]
    fn test_compile_does_not_define_names() {
        let mut engine = Engine::new();
        let bytecode = engine.compile("let x = 1; x").unwrap();
        assert!(!bytecode.instructions.is_empty());
        assert!(engine.eval("x").is_err());
    }

    #[test]
    fn test_eval_file() {
        let path = std::env::temp_dir().join(format!("tamarin-eval-{}.tam", std::process::id()));
        std::fs::write(&path, "let sq = fn(n) { n * n };\nsq(9)\n").unwrap();

        let mut engine = Engine::new();
        let result = engine.eval_file(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap(), Some(Value::Integer(81)));
    }

    #[test]
    fn test_eval_missing_file() {
        let mut engine = Engine::new();
        let result = engine.eval_file(Path::new("/nonexistent/tamarin/file.tam"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
