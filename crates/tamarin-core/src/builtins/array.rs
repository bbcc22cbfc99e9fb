// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Sequence builtins: `len`, `first`, `last`, `head`, `tail`, `push`.
//!
//! None of these mutate their argument; `push`, `head` and `tail` return
//! new arrays.

use crate::runtime::value::Value;

fn expect_args(name: &str, args: &[Value], count: usize) -> Result<(), String> {
    if args.len() != count {
        return Err(format!(
            "wrong number of arguments to `{}`: got {}, want {}",
            name,
            args.len(),
            count
        ));
    }
    Ok(())
}

fn expect_array<'a>(name: &str, value: &'a Value) -> Result<&'a [Value], String> {
    match value {
        Value::Array(elements) => Ok(elements),
        other => Err(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        )),
    }
}

/// len(x) - byte length of a string or element count of an array
pub fn len(args: &[Value]) -> Result<Value, String> {
    expect_args("len", args, 1)?;
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.len() as i64)),
        Value::Array(elements) => Ok(Value::Integer(elements.len() as i64)),
        other => Err(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

/// first(arr) - first element, or null when empty
pub fn first(args: &[Value]) -> Result<Value, String> {
    expect_args("first", args, 1)?;
    let elements = expect_array("first", &args[0])?;
    Ok(elements.first().cloned().unwrap_or(Value::Null))
}

/// last(arr) - last element, or null when empty
pub fn last(args: &[Value]) -> Result<Value, String> {
    expect_args("last", args, 1)?;
    let elements = expect_array("last", &args[0])?;
    Ok(elements.last().cloned().unwrap_or(Value::Null))
}

/// head(arr) - every element but the last, or null when empty
pub fn head(args: &[Value]) -> Result<Value, String> {
    expect_args("head", args, 1)?;
    let elements = expect_array("head", &args[0])?;
    match elements.split_last() {
        Some((_, rest)) => Ok(Value::array(rest.to_vec())),
        None => Ok(Value::Null),
    }
}

/// tail(arr) - every element but the first, or null when empty
pub fn tail(args: &[Value]) -> Result<Value, String> {
    expect_args("tail", args, 1)?;
    let elements = expect_array("tail", &args[0])?;
    match elements.split_first() {
        Some((_, rest)) => Ok(Value::array(rest.to_vec())),
        None => Ok(Value::Null),
    }
}

/// push(arr, x) - a new array with `x` appended
pub fn push(args: &[Value]) -> Result<Value, String> {
    expect_args("push", args, 2)?;
    let elements = expect_array("push", &args[0])?;
    let mut extended = Vec::with_capacity(elements.len() + 1);
    extended.extend_from_slice(elements);
    extended.push(args[1].clone());
    Ok(Value::array(extended))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Value {
        Value::array(values.iter().copied().map(Value::Integer).collect())
    }

    #[test]
    fn test_len() {
        assert_eq!(len(&[Value::string("four")]), Ok(Value::Integer(4)));
        assert_eq!(len(&[Value::string("")]), Ok(Value::Integer(0)));
        assert_eq!(len(&[ints(&[1, 2, 3])]), Ok(Value::Integer(3)));
        assert!(len(&[Value::Integer(1)]).unwrap_err().contains("INTEGER"));
        assert!(len(&[]).unwrap_err().contains("wrong number of arguments"));
    }

    #[test]
    fn test_first_and_last() {
        assert_eq!(first(&[ints(&[1, 2, 3])]), Ok(Value::Integer(1)));
        assert_eq!(last(&[ints(&[1, 2, 3])]), Ok(Value::Integer(3)));
        assert_eq!(first(&[ints(&[])]), Ok(Value::Null));
        assert_eq!(last(&[ints(&[])]), Ok(Value::Null));
        assert!(first(&[Value::Integer(1)]).is_err());
    }

    #[test]
    fn test_head_and_tail() {
        assert_eq!(head(&[ints(&[1, 2, 3])]).unwrap().to_string(), "[1, 2]");
        assert_eq!(tail(&[ints(&[1, 2, 3])]).unwrap().to_string(), "[2, 3]");
        assert_eq!(tail(&[ints(&[1])]).unwrap().to_string(), "[]");
        assert_eq!(head(&[ints(&[])]), Ok(Value::Null));
        assert_eq!(tail(&[ints(&[])]), Ok(Value::Null));
    }

    #[test]
    fn test_push_does_not_mutate() {
        let original = ints(&[1]);
        let pushed = push(&[original.clone(), Value::Integer(2)]).unwrap();
        assert_eq!(pushed.to_string(), "[1, 2]");
        assert_eq!(original.to_string(), "[1]");
        assert_eq!(push(&[ints(&[]), Value::Integer(7)]).unwrap().to_string(), "[7]");
        assert!(push(&[ints(&[])]).is_err());
    }
}
