// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Abstract Syntax Tree (AST) definitions for Tamarin.
//!
//! Every node category is a closed enum, so the compiler dispatches over
//! them with exhaustive matches. `Display` renders canonical source text,
//! which is also the ordering key for hash literal keys during compilation.

use std::fmt;

/// A complete Tamarin program.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    /// The statements in the program
    pub statements: Vec<Statement>,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
}

impl Identifier {
    /// Creates a new identifier.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A Tamarin statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let <name> = <value>;`
    Let(LetStatement),
    /// `return <value>;`
    Return(Expression),
    /// An expression whose value is discarded
    Expression(Expression),
}

/// A let binding.
#[derive(Debug, Clone, PartialEq)]
pub struct LetStatement {
    /// The bound name
    pub name: Identifier,
    /// The bound value
    pub value: Expression,
}

/// A braced list of statements.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    /// The statements in the block
    pub statements: Vec<Statement>,
}

/// A Tamarin expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Identifier reference
    Identifier(Identifier),
    /// Integer literal
    Integer(i64),
    /// String literal
    String(String),
    /// Boolean literal
    Boolean(bool),
    /// Prefix operator application
    Prefix(PrefixExpression),
    /// Infix operator application
    Infix(InfixExpression),
    /// if/else expression
    If(IfExpression),
    /// fn literal
    Function(FunctionLiteral),
    /// Call expression
    Call(CallExpression),
    /// Array literal
    Array(Vec<Expression>),
    /// Hash literal
    Hash(HashLiteral),
    /// Index expression `left[index]`
    Index(IndexExpression),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    /// `!`
    Not,
    /// `-`
    Negate,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
}

/// A prefix expression.
#[derive(Debug, Clone, PartialEq)]
pub struct PrefixExpression {
    /// The operator
    pub operator: PrefixOperator,
    /// The operand
    pub right: Box<Expression>,
}

/// An infix expression.
#[derive(Debug, Clone, PartialEq)]
pub struct InfixExpression {
    /// The operator
    pub operator: InfixOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
}

/// An if expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IfExpression {
    /// The condition
    pub condition: Box<Expression>,
    /// The then branch
    pub consequence: BlockStatement,
    /// The optional else branch
    pub alternative: Option<BlockStatement>,
}

/// A function literal.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionLiteral {
    /// Name of the `let` binding this literal was assigned to, if any
    pub name: Option<String>,
    /// The parameters
    pub parameters: Vec<Identifier>,
    /// The function body
    pub body: BlockStatement,
}

/// A call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpression {
    /// The callee
    pub function: Box<Expression>,
    /// The arguments, in evaluation order
    pub arguments: Vec<Expression>,
}

/// A hash literal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HashLiteral {
    /// Key/value pairs in source order
    pub pairs: Vec<(Expression, Expression)>,
}

/// An index expression.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpression {
    /// The indexed container
    pub left: Box<Expression>,
    /// The index
    pub index: Box<Expression>,
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let(stmt) => write!(f, "let {} = {};", stmt.name, stmt.value),
            Statement::Return(value) => write!(f, "return {};", value),
            Statement::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for statement in &self.statements {
            write!(f, "{} ", statement)?;
        }
        f.write_str("}")
    }
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrefixOperator::Not => "!",
            PrefixOperator::Negate => "-",
        })
    }
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            InfixOperator::Add => "+",
            InfixOperator::Subtract => "-",
            InfixOperator::Multiply => "*",
            InfixOperator::Divide => "/",
            InfixOperator::Equal => "==",
            InfixOperator::NotEqual => "!=",
            InfixOperator::LessThan => "<",
            InfixOperator::GreaterThan => ">",
        })
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(ident) => write!(f, "{}", ident),
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::String(value) => write!(f, "{:?}", value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::Prefix(expr) => write!(f, "({}{})", expr.operator, expr.right),
            Expression::Infix(expr) => {
                write!(f, "({} {} {})", expr.left, expr.operator, expr.right)
            }
            Expression::If(expr) => {
                write!(f, "if {} {}", expr.condition, expr.consequence)?;
                if let Some(alternative) = &expr.alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function(func) => {
                f.write_str("fn")?;
                if let Some(name) = &func.name {
                    write!(f, "<{}>", name)?;
                }
                write!(f, "({}) {}", join(&func.parameters), func.body)
            }
            Expression::Call(call) => write!(f, "{}({})", call.function, join(&call.arguments)),
            Expression::Array(elements) => write!(f, "[{}]", join(elements)),
            Expression::Hash(hash) => {
                let pairs: Vec<String> = hash
                    .pairs
                    .iter()
                    .map(|(key, value)| format!("{}: {}", key, value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expression::Index(expr) => write!(f, "({}[{}])", expr.left, expr.index),
        }
    }
}

fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_let_statement_display() {
        let program = Program {
            statements: vec![Statement::Let(LetStatement {
                name: Identifier::new("onevar"),
                value: Expression::Identifier(Identifier::new("twovar")),
            })],
        };
        assert_eq!(program.to_string(), "let onevar = twovar;");
    }

    #[test]
    fn test_infix_display_is_parenthesized() {
        let expr = Expression::Infix(InfixExpression {
            operator: InfixOperator::Add,
            left: Box::new(Expression::Integer(1)),
            right: Box::new(Expression::Infix(InfixExpression {
                operator: InfixOperator::Multiply,
                left: Box::new(Expression::Integer(2)),
                right: Box::new(Expression::Integer(3)),
            })),
        });
        assert_eq!(expr.to_string(), "(1 + (2 * 3))");
    }

    #[test]
    fn test_string_literal_display_is_quoted() {
        assert_eq!(Expression::String("a".into()).to_string(), "\"a\"");
    }

    #[test]
    fn test_hash_display() {
        let expr = Expression::Hash(HashLiteral {
            pairs: vec![(Expression::String("k".into()), Expression::Integer(1))],
        });
        assert_eq!(expr.to_string(), "{\"k\": 1}");
    }
}
