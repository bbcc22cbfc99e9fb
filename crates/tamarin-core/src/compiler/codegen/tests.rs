// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Tests for the bytecode compiler.

use super::*;
use crate::compiler::bytecode::make;
use crate::config::MAX_NESTING_DEPTH;
use crate::parser::Parser;

enum Constant {
    Int(i64),
    Str(&'static str),
    Func(Vec<Vec<u8>>),
}

fn compile_source(src: &str) -> Result<Bytecode, CompileError> {
    let mut parser = Parser::new(src);
    let program = parser.parse_program().expect("Parsing should succeed");
    let mut compiler = Compiler::new();
    compiler.compile(&program)?;
    Ok(compiler.bytecode())
}

fn compile_ok(src: &str) -> Bytecode {
    compile_source(src).expect("Compilation should succeed")
}

fn op(opcode: OpCode, operands: &[usize]) -> Vec<u8> {
    make(opcode, operands).unwrap()
}

fn concat(instructions: Vec<Vec<u8>>) -> Instructions {
    instructions.into_iter().collect()
}

fn assert_compiles(src: &str, constants: Vec<Constant>, instructions: Vec<Vec<u8>>) {
    let bytecode = compile_ok(src);
    let expected = concat(instructions);
    assert_eq!(
        bytecode.instructions, expected,
        "source: {}\nwant:\n{}got:\n{}",
        src, expected, bytecode.instructions
    );
    assert_constants(&bytecode.constants, constants);
}

fn assert_constants(actual: &[Value], expected: Vec<Constant>) {
    assert_eq!(actual.len(), expected.len(), "constant count");
    for (index, (actual, expected)) in actual.iter().zip(expected).enumerate() {
        match (actual, expected) {
            (Value::Integer(n), Constant::Int(want)) => assert_eq!(*n, want, "constant {}", index),
            (Value::String(s), Constant::Str(want)) => assert_eq!(&**s, want, "constant {}", index),
            (Value::Function(func), Constant::Func(want)) => {
                let want = concat(want);
                assert_eq!(
                    func.instructions, want,
                    "constant {}\nwant:\n{}got:\n{}",
                    index, want, func.instructions
                );
            }
            (other, _) => panic!("constant {} has unexpected value {:?}", index, other),
        }
    }
}

#[test]
fn test_compiler_default() {
    let compiler = Compiler::default();
    assert!(compiler.bytecode().instructions.is_empty());
    assert_eq!(compiler.builtins().len(), 7);
}

#[test]
fn test_compile_empty_program() {
    let bytecode = compile_ok("");
    assert!(bytecode.instructions.is_empty());
    assert!(bytecode.constants.is_empty());
}

#[test]
fn test_integer_arithmetic() {
    assert_compiles(
        "1 + 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Add, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
    assert_compiles(
        "1; 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Pop, &[]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Pop, &[]),
        ],
    );
    assert_compiles(
        "2 / 1",
        vec![Constant::Int(2), Constant::Int(1)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Div, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
    assert_compiles(
        "-1",
        vec![Constant::Int(1)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Minus, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_boolean_expressions() {
    assert_compiles(
        "true",
        vec![],
        vec![op(OpCode::True, &[]), op(OpCode::Pop, &[])],
    );
    assert_compiles(
        "1 < 2",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::LessThan, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
    assert_compiles(
        "true != false",
        vec![],
        vec![
            op(OpCode::True, &[]),
            op(OpCode::False, &[]),
            op(OpCode::NotEqual, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
    assert_compiles(
        "!true",
        vec![],
        vec![op(OpCode::True, &[]), op(OpCode::Bang, &[]), op(OpCode::Pop, &[])],
    );
}

#[test]
fn test_conditional_without_alternative() {
    assert_compiles(
        "if (true) { 10 }; 3333;",
        vec![Constant::Int(10), Constant::Int(3333)],
        vec![
            // 0000
            op(OpCode::True, &[]),
            // 0001
            op(OpCode::JumpNotTruthy, &[10]),
            // 0004
            op(OpCode::Constant, &[0]),
            // 0007
            op(OpCode::Jump, &[11]),
            // 0010
            op(OpCode::Null, &[]),
            // 0011
            op(OpCode::Pop, &[]),
            // 0012
            op(OpCode::Constant, &[1]),
            // 0015
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_conditional_with_alternative() {
    assert_compiles(
        "if (true) { 10 } else { 20 }; 3333;",
        vec![Constant::Int(10), Constant::Int(20), Constant::Int(3333)],
        vec![
            // 0000
            op(OpCode::True, &[]),
            // 0001
            op(OpCode::JumpNotTruthy, &[10]),
            // 0004
            op(OpCode::Constant, &[0]),
            // 0007
            op(OpCode::Jump, &[13]),
            // 0010
            op(OpCode::Constant, &[1]),
            // 0013
            op(OpCode::Pop, &[]),
            // 0014
            op(OpCode::Constant, &[2]),
            // 0017
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_conditional_with_empty_branch() {
    assert_compiles(
        "if (true) { }",
        vec![],
        vec![
            // 0000
            op(OpCode::True, &[]),
            // 0001
            op(OpCode::JumpNotTruthy, &[8]),
            // 0004
            op(OpCode::Null, &[]),
            // 0005
            op(OpCode::Jump, &[9]),
            // 0008
            op(OpCode::Null, &[]),
            // 0009
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_conditional_branch_ending_in_let() {
    assert_compiles(
        "if (true) { let x = 1; }",
        vec![Constant::Int(1)],
        vec![
            // 0000
            op(OpCode::True, &[]),
            // 0001
            op(OpCode::JumpNotTruthy, &[14]),
            // 0004
            op(OpCode::Constant, &[0]),
            // 0007
            op(OpCode::SetGlobal, &[0]),
            // 0010
            op(OpCode::Null, &[]),
            // 0011
            op(OpCode::Jump, &[15]),
            // 0014
            op(OpCode::Null, &[]),
            // 0015
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_global_let_statements() {
    assert_compiles(
        "let one = 1; let two = 2;",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::SetGlobal, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::SetGlobal, &[1]),
        ],
    );
    assert_compiles(
        "let one = 1; let two = one; two;",
        vec![Constant::Int(1)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::SetGlobal, &[0]),
            op(OpCode::GetGlobal, &[0]),
            op(OpCode::SetGlobal, &[1]),
            op(OpCode::GetGlobal, &[1]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_string_expressions() {
    assert_compiles(
        r#""mon" + "key""#,
        vec![Constant::Str("mon"), Constant::Str("key")],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Add, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_array_literals() {
    assert_compiles("[]", vec![], vec![op(OpCode::Array, &[0]), op(OpCode::Pop, &[])]);
    assert_compiles(
        "[1 + 2, 3]",
        vec![Constant::Int(1), Constant::Int(2), Constant::Int(3)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Add, &[]),
            op(OpCode::Constant, &[2]),
            op(OpCode::Array, &[2]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_hash_literal_keys_are_sorted() {
    assert_compiles("{}", vec![], vec![op(OpCode::Hash, &[0]), op(OpCode::Pop, &[])]);
    assert_compiles(
        "{2: 3, 1: 4}",
        vec![
            Constant::Int(1),
            Constant::Int(4),
            Constant::Int(2),
            Constant::Int(3),
        ],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Constant, &[2]),
            op(OpCode::Constant, &[3]),
            op(OpCode::Hash, &[4]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_index_expressions() {
    assert_compiles(
        "[1, 2][0]",
        vec![Constant::Int(1), Constant::Int(2), Constant::Int(0)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Array, &[2]),
            op(OpCode::Constant, &[2]),
            op(OpCode::Index, &[]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_functions_return_last_expression() {
    let body = vec![
        op(OpCode::Constant, &[0]),
        op(OpCode::Constant, &[1]),
        op(OpCode::Add, &[]),
        op(OpCode::ReturnValue, &[]),
    ];
    for src in ["fn() { return 5 + 10 }", "fn() { 5 + 10 }"] {
        assert_compiles(
            src,
            vec![Constant::Int(5), Constant::Int(10), Constant::Func(body.clone())],
            vec![op(OpCode::Closure, &[2, 0]), op(OpCode::Pop, &[])],
        );
    }
}

#[test]
fn test_function_without_return_value() {
    assert_compiles(
        "fn() { }",
        vec![Constant::Func(vec![op(OpCode::Return, &[])])],
        vec![op(OpCode::Closure, &[0, 0]), op(OpCode::Pop, &[])],
    );
}

#[test]
fn test_function_locals() {
    let bytecode = compile_ok("fn() { let a = 1; let b = 2; }");
    assert_constants(
        &bytecode.constants,
        vec![
            Constant::Int(1),
            Constant::Int(2),
            Constant::Func(vec![
                op(OpCode::Constant, &[0]),
                op(OpCode::SetLocal, &[0]),
                op(OpCode::Constant, &[1]),
                op(OpCode::SetLocal, &[1]),
                op(OpCode::Return, &[]),
            ]),
        ],
    );
    let Value::Function(func) = &bytecode.constants[2] else {
        panic!("expected function constant");
    };
    assert_eq!(func.num_locals, 2);
    assert_eq!(func.num_parameters, 0);
}

#[test]
fn test_function_reads_global() {
    assert_compiles(
        "let num = 55; fn() { num }",
        vec![
            Constant::Int(55),
            Constant::Func(vec![
                op(OpCode::GetGlobal, &[0]),
                op(OpCode::ReturnValue, &[]),
            ]),
        ],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::SetGlobal, &[0]),
            op(OpCode::Closure, &[1, 0]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_function_calls() {
    assert_compiles(
        "let oneArg = fn(a) { a }; oneArg(24);",
        vec![
            Constant::Func(vec![
                op(OpCode::GetLocal, &[0]),
                op(OpCode::ReturnValue, &[]),
            ]),
            Constant::Int(24),
        ],
        vec![
            op(OpCode::Closure, &[0, 0]),
            op(OpCode::SetGlobal, &[0]),
            op(OpCode::GetGlobal, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Call, &[1]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_builtins() {
    assert_compiles(
        "len([]); push([], 1);",
        vec![Constant::Int(1)],
        vec![
            op(OpCode::GetBuiltin, &[0]),
            op(OpCode::Array, &[0]),
            op(OpCode::Call, &[1]),
            op(OpCode::Pop, &[]),
            op(OpCode::GetBuiltin, &[5]),
            op(OpCode::Array, &[0]),
            op(OpCode::Constant, &[0]),
            op(OpCode::Call, &[2]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_builtin_inside_function() {
    assert_compiles(
        "fn() { len([]) }",
        vec![Constant::Func(vec![
            op(OpCode::GetBuiltin, &[0]),
            op(OpCode::Array, &[0]),
            op(OpCode::Call, &[1]),
            op(OpCode::ReturnValue, &[]),
        ])],
        vec![op(OpCode::Closure, &[0, 0]), op(OpCode::Pop, &[])],
    );
}

#[test]
fn test_closures() {
    assert_compiles(
        "fn(a) { fn(b) { a + b } }",
        vec![
            Constant::Func(vec![
                op(OpCode::GetFree, &[0]),
                op(OpCode::GetLocal, &[0]),
                op(OpCode::Add, &[]),
                op(OpCode::ReturnValue, &[]),
            ]),
            Constant::Func(vec![
                op(OpCode::GetLocal, &[0]),
                op(OpCode::Closure, &[0, 1]),
                op(OpCode::ReturnValue, &[]),
            ]),
        ],
        vec![op(OpCode::Closure, &[1, 0]), op(OpCode::Pop, &[])],
    );
}

#[test]
fn test_nested_closures_capture_through_middle_scope() {
    assert_compiles(
        "fn(a) { fn(b) { fn(c) { a + b + c } } }",
        vec![
            Constant::Func(vec![
                op(OpCode::GetFree, &[0]),
                op(OpCode::GetFree, &[1]),
                op(OpCode::Add, &[]),
                op(OpCode::GetLocal, &[0]),
                op(OpCode::Add, &[]),
                op(OpCode::ReturnValue, &[]),
            ]),
            Constant::Func(vec![
                op(OpCode::GetFree, &[0]),
                op(OpCode::GetLocal, &[0]),
                op(OpCode::Closure, &[0, 2]),
                op(OpCode::ReturnValue, &[]),
            ]),
            Constant::Func(vec![
                op(OpCode::GetLocal, &[0]),
                op(OpCode::Closure, &[1, 1]),
                op(OpCode::ReturnValue, &[]),
            ]),
        ],
        vec![op(OpCode::Closure, &[2, 0]), op(OpCode::Pop, &[])],
    );
}

#[test]
fn test_recursive_function_uses_current_closure() {
    assert_compiles(
        "let countDown = fn(x) { countDown(x - 1); }; countDown(1);",
        vec![
            Constant::Int(1),
            Constant::Func(vec![
                op(OpCode::CurrentClosure, &[]),
                op(OpCode::GetLocal, &[0]),
                op(OpCode::Constant, &[0]),
                op(OpCode::Sub, &[]),
                op(OpCode::Call, &[1]),
                op(OpCode::ReturnValue, &[]),
            ]),
            Constant::Int(1),
        ],
        vec![
            op(OpCode::Closure, &[1, 0]),
            op(OpCode::SetGlobal, &[0]),
            op(OpCode::GetGlobal, &[0]),
            op(OpCode::Constant, &[2]),
            op(OpCode::Call, &[1]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_top_level_return() {
    assert_compiles(
        "return 1; 2;",
        vec![Constant::Int(1), Constant::Int(2)],
        vec![
            op(OpCode::Constant, &[0]),
            op(OpCode::ReturnValue, &[]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Pop, &[]),
        ],
    );
}

#[test]
fn test_error_undefined_variable() {
    let err = compile_source("let a = b;").unwrap_err();
    assert_eq!(err, CompileError::UndefinedVariable("b".into()));

    // the name is not visible inside its own initializer
    let err = compile_source("let f = fn() { g }; let g = 1;").unwrap_err();
    assert_eq!(err, CompileError::UndefinedVariable("g".into()));
}

#[test]
fn test_error_unhashable_key() {
    let err = compile_source("{[1]: 2}").unwrap_err();
    assert_eq!(err, CompileError::UnhashableKey("[1]".into()));
}

#[test]
fn test_error_too_many_arguments() {
    let args = vec!["1"; 256].join(", ");
    let err = compile_source(&format!("puts({})", args)).unwrap_err();
    assert_eq!(
        err,
        CompileError::OperandOverflow {
            what: "call arguments",
            count: 256,
            limit: 255,
        }
    );
}

#[test]
fn test_error_expression_nesting_too_deep() {
    let chain = vec!["1"; MAX_NESTING_DEPTH + 50].join(" + ");
    let err = compile_source(&chain).unwrap_err();
    assert_eq!(
        err,
        CompileError::NestingTooDeep {
            limit: MAX_NESTING_DEPTH,
        }
    );

    let chain = vec!["1"; MAX_NESTING_DEPTH - 1].join(" + ");
    assert!(compile_source(&chain).is_ok());
}

#[test]
fn test_incremental_compilation_keeps_globals_and_constants() {
    let mut compiler = Compiler::new();
    compiler
        .compile(&Parser::new("let a = 1;").parse_program().unwrap())
        .unwrap();
    let (first, symbols) = compiler.finish();
    assert_eq!(first.constants.len(), 1);

    let builtins = Rc::new(Builtins::standard());
    let mut compiler = Compiler::with_state(symbols, first.constants, builtins);
    compiler
        .compile(&Parser::new("a + 2").parse_program().unwrap())
        .unwrap();
    let (second, _) = compiler.finish();

    assert_eq!(
        second.instructions,
        concat(vec![
            op(OpCode::GetGlobal, &[0]),
            op(OpCode::Constant, &[1]),
            op(OpCode::Add, &[]),
            op(OpCode::Pop, &[]),
        ])
    );
    assert_constants(&second.constants, vec![Constant::Int(1), Constant::Int(2)]);
}
