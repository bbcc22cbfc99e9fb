// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Syntax errors reported by the parser.

use thiserror::Error;

use crate::lexer::{Span, TokenKind};

/// A syntax error. Parsing stops at the first one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A specific token was required but something else was found
    #[error("expected {expected}, found {found} at offset {}", span.start)]
    UnexpectedToken {
        /// What the parser wanted
        expected: String,
        /// What it got
        found: TokenKind,
        /// Where
        span: Span,
    },

    /// The token cannot start an expression
    #[error("no expression can start with {found} at offset {}", span.start)]
    NoPrefixRule {
        /// The offending token
        found: TokenKind,
        /// Where
        span: Span,
    },

    /// Expressions nest deeper than the parser allows
    #[error("expression nesting exceeds {limit} levels at offset {}", span.start)]
    NestingTooDeep {
        /// Deepest accepted nesting
        limit: usize,
        /// Where the limit was reached
        span: Span,
    },

    /// Integer literal does not fit in 64 bits
    #[error("could not parse {literal} as an integer at offset {}", span.start)]
    InvalidInteger {
        /// Source text of the literal
        literal: String,
        /// Where
        span: Span,
    },
}

impl ParseError {
    /// Source location of the error.
    pub fn span(&self) -> Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::NoPrefixRule { span, .. }
            | ParseError::NestingTooDeep { span, .. }
            | ParseError::InvalidInteger { span, .. } => *span,
        }
    }
}
