// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Parser for Tamarin source code.
//!
//! Transforms a stream of tokens into an Abstract Syntax Tree (AST).
//!
//! ## Precedence Table (lowest to highest)
//!
//! | Precedence | Operators |
//! |------------|-----------|
//! | 1 | (lowest) |
//! | 2 | `==` `!=` |
//! | 3 | `<` `>` |
//! | 4 | `+` `-` |
//! | 5 | `*` `/` |
//! | 6 | `!x` `-x` |
//! | 7 | `f(x)` |
//! | 8 | `a[i]` |
//!
//! ## Usage
//!
//! ```rust
//! use tamarin_core::parser::Parser;
//!
//! let mut parser = Parser::new("let x = 1 + 2;");
//! let program = parser.parse_program().expect("Should parse");
//! assert_eq!(program.statements.len(), 1);
//! ```

mod error;
mod parser;

pub use error::ParseError;
pub use parser::Parser;
