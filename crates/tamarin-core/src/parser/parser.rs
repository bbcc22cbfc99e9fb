// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! The main parser implementation.

use super::ParseError;
use crate::ast::*;
use crate::config::MAX_NESTING_DEPTH;
use crate::lexer::{Scanner, Token, TokenKind};

/// Binding power of infix positions, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    fn of(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::EqualEqual | TokenKind::NotEqual => Precedence::Equals,
            TokenKind::LessThan | TokenKind::GreaterThan => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Star | TokenKind::Slash => Precedence::Product,
            TokenKind::LeftParen => Precedence::Call,
            TokenKind::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_operator(kind: &TokenKind) -> Option<InfixOperator> {
    let operator = match kind {
        TokenKind::Plus => InfixOperator::Add,
        TokenKind::Minus => InfixOperator::Subtract,
        TokenKind::Star => InfixOperator::Multiply,
        TokenKind::Slash => InfixOperator::Divide,
        TokenKind::EqualEqual => InfixOperator::Equal,
        TokenKind::NotEqual => InfixOperator::NotEqual,
        TokenKind::LessThan => InfixOperator::LessThan,
        TokenKind::GreaterThan => InfixOperator::GreaterThan,
        _ => return None,
    };
    Some(operator)
}

/// A precedence-climbing parser for Tamarin.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    /// Open `parse_precedence` calls
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given source code.
    pub fn new(source: &'a str) -> Self {
        let mut scanner = Scanner::new(source);
        let current = scanner.next_token();
        Self {
            scanner,
            current,
            depth: 0,
        }
    }

    /// Parses the source code into a Program AST node.
    pub fn parse_program(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    /// Parses a single statement. A trailing semicolon is optional.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let statement = match &self.current.kind {
            TokenKind::Let => self.parse_let_statement()?,
            TokenKind::Return => {
                self.advance(); // consume 'return'
                Statement::Return(self.parse_expression()?)
            }
            _ => Statement::Expression(self.parse_expression()?),
        };

        if self.check(&TokenKind::Semicolon) {
            self.advance();
        }

        Ok(statement)
    }

    fn parse_let_statement(&mut self) -> Result<Statement, ParseError> {
        self.advance(); // consume 'let'

        let name = self.expect_identifier()?;
        self.expect(&TokenKind::Assign)?;
        let mut value = self.parse_expression()?;

        // Lets the function body call itself without a global binding.
        if let Expression::Function(func) = &mut value {
            func.name = Some(name.name.clone());
        }

        Ok(Statement::Let(LetStatement { name, value }))
    }

    /// Parses a full expression.
    pub fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_precedence(Precedence::Lowest)
    }

    fn parse_precedence(&mut self, precedence: Precedence) -> Result<Expression, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                span: self.current.span,
            });
        }

        self.depth += 1;
        let result = self.parse_operators(precedence);
        self.depth -= 1;
        result
    }

    fn parse_operators(&mut self, precedence: Precedence) -> Result<Expression, ParseError> {
        let mut left = self.parse_prefix()?;

        while precedence < Precedence::of(&self.current.kind) {
            left = match &self.current.kind {
                TokenKind::LeftParen => {
                    self.advance();
                    let arguments = self.parse_expression_list(&TokenKind::RightParen)?;
                    Expression::Call(CallExpression {
                        function: Box::new(left),
                        arguments,
                    })
                }
                TokenKind::LeftBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    self.expect(&TokenKind::RightBracket)?;
                    Expression::Index(IndexExpression {
                        left: Box::new(left),
                        index: Box::new(index),
                    })
                }
                kind => {
                    let Some(operator) = infix_operator(kind) else {
                        break;
                    };
                    let operator_precedence = Precedence::of(kind);
                    self.advance();
                    let right = self.parse_precedence(operator_precedence)?;
                    Expression::Infix(InfixExpression {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                }
            };
        }

        Ok(left)
    }

    fn parse_prefix(&mut self) -> Result<Expression, ParseError> {
        let token = self.advance();

        match token.kind {
            TokenKind::Identifier(name) => Ok(Expression::Identifier(Identifier { name })),
            TokenKind::Integer(literal) => match literal.parse::<i64>() {
                Ok(value) => Ok(Expression::Integer(value)),
                Err(_) => Err(ParseError::InvalidInteger {
                    literal,
                    span: token.span,
                }),
            },
            TokenKind::String(value) => Ok(Expression::String(value)),
            TokenKind::True => Ok(Expression::Boolean(true)),
            TokenKind::False => Ok(Expression::Boolean(false)),
            TokenKind::Bang => self.parse_prefix_operator(PrefixOperator::Not),
            TokenKind::Minus => self.parse_prefix_operator(PrefixOperator::Negate),
            TokenKind::LeftParen => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RightParen)?;
                Ok(expr)
            }
            TokenKind::If => self.parse_if_expression(),
            TokenKind::Function => self.parse_function_literal(),
            TokenKind::LeftBracket => {
                let elements = self.parse_expression_list(&TokenKind::RightBracket)?;
                Ok(Expression::Array(elements))
            }
            TokenKind::LeftBrace => self.parse_hash_literal(),
            found => Err(ParseError::NoPrefixRule {
                found,
                span: token.span,
            }),
        }
    }

    fn parse_prefix_operator(&mut self, operator: PrefixOperator) -> Result<Expression, ParseError> {
        let right = self.parse_precedence(Precedence::Prefix)?;
        Ok(Expression::Prefix(PrefixExpression {
            operator,
            right: Box::new(right),
        }))
    }

    fn parse_if_expression(&mut self) -> Result<Expression, ParseError> {
        self.expect(&TokenKind::LeftParen)?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen)?;

        let consequence = self.parse_block_statement()?;
        let alternative = if self.check(&TokenKind::Else) {
            self.advance();
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Ok(Expression::If(IfExpression {
            condition: Box::new(condition),
            consequence,
            alternative,
        }))
    }

    fn parse_function_literal(&mut self) -> Result<Expression, ParseError> {
        self.expect(&TokenKind::LeftParen)?;

        let mut parameters = Vec::new();
        if !self.check(&TokenKind::RightParen) {
            loop {
                parameters.push(self.expect_identifier()?);
                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }
        }
        self.expect(&TokenKind::RightParen)?;

        let body = self.parse_block_statement()?;

        Ok(Expression::Function(FunctionLiteral {
            name: None,
            parameters,
            body,
        }))
    }

    fn parse_hash_literal(&mut self) -> Result<Expression, ParseError> {
        let mut pairs = Vec::new();

        while !self.check(&TokenKind::RightBrace) {
            let key = self.parse_expression()?;
            self.expect(&TokenKind::Colon)?;
            let value = self.parse_expression()?;
            pairs.push((key, value));

            if !self.check(&TokenKind::RightBrace) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        self.expect(&TokenKind::RightBrace)?;

        Ok(Expression::Hash(HashLiteral { pairs }))
    }

    fn parse_block_statement(&mut self) -> Result<BlockStatement, ParseError> {
        self.expect(&TokenKind::LeftBrace)?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect(&TokenKind::RightBrace)?;

        Ok(BlockStatement { statements })
    }

    /// Parses comma-separated expressions up to and including `end`.
    fn parse_expression_list(&mut self, end: &TokenKind) -> Result<Vec<Expression>, ParseError> {
        let mut list = Vec::new();

        if self.check(end) {
            self.advance();
            return Ok(list);
        }

        loop {
            list.push(self.parse_expression()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(end)?;

        Ok(list)
    }

    /// Moves to the next token and returns the one just consumed.
    fn advance(&mut self) -> Token {
        std::mem::replace(&mut self.current, self.scanner.next_token())
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: &TokenKind) -> Result<Token, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::UnexpectedToken {
                expected: kind.to_string(),
                found: self.current.kind.clone(),
                span: self.current.span,
            })
        }
    }

    fn expect_identifier(&mut self) -> Result<Identifier, ParseError> {
        if let TokenKind::Identifier(name) = &self.current.kind {
            let id = Identifier { name: name.clone() };
            self.advance();
            Ok(id)
        } else {
            Err(ParseError::UnexpectedToken {
                expected: "identifier".into(),
                found: self.current.kind.clone(),
                span: self.current.span,
            })
        }
    }

    fn is_at_end(&self) -> bool {
        matches!(self.current.kind, TokenKind::Eof)
    }
}
