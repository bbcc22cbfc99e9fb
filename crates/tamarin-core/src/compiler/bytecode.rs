// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Bytecode definitions.
//!
//! An instruction is one opcode byte followed by zero or more big-endian
//! operands whose widths come from the opcode's [`Definition`].

use std::fmt;

use thiserror::Error;

use crate::runtime::value::Value;

/// Errors raised while encoding or decoding instructions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BytecodeError {
    /// Byte does not name an opcode
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// Operand list does not match the opcode definition
    #[error("{opcode} takes {expected} operands, got {found}")]
    OperandCount {
        /// Opcode name
        opcode: &'static str,
        /// Operands in the definition
        expected: usize,
        /// Operands supplied
        found: usize,
    },

    /// Instruction stream ended inside an operand
    #[error("operand truncated at offset {0}")]
    Truncated(usize),
}

/// Operation codes for the VM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    // Loads
    /// Push a constant: `[index: u16]`
    Constant,
    /// Push null
    Null,
    /// Push true
    True,
    /// Push false
    False,
    /// Discard the top value
    Pop,

    // Composites
    /// Build an array from the top N values: `[count: u16]`
    Array,
    /// Build a hash from the top N values (N/2 pairs): `[count: u16]`
    Hash,
    /// Index a container
    Index,

    // Arithmetic
    /// Add or concatenate
    Add,
    /// Subtract
    Sub,
    /// Multiply
    Mul,
    /// Divide
    Div,
    /// Arithmetic negation
    Minus,
    /// Boolean negation
    Bang,

    // Comparison
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// >
    GreaterThan,
    /// <
    LessThan,

    // Control flow
    /// Jump when the popped value is falsy: `[target: u16]`
    JumpNotTruthy,
    /// Unconditional jump: `[target: u16]`
    Jump,

    // Functions
    /// Call the value beneath the arguments: `[argc: u8]`
    Call,
    /// Return null from the current frame
    Return,
    /// Return the top value from the current frame
    ReturnValue,
    /// Build a closure: `[constant: u16, free: u8]`
    Closure,
    /// Push the closure that is currently executing
    CurrentClosure,

    // Variables
    /// Load a global: `[slot: u16]`
    GetGlobal,
    /// Store a global: `[slot: u16]`
    SetGlobal,
    /// Load a local: `[slot: u8]`
    GetLocal,
    /// Store a local: `[slot: u8]`
    SetLocal,
    /// Load a captured variable: `[index: u8]`
    GetFree,
    /// Load a builtin: `[index: u8]`
    GetBuiltin,
}

/// Name and operand layout of an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Definition {
    /// Mnemonic used by the disassembler
    pub name: &'static str,
    /// Width in bytes of each operand
    pub operand_widths: &'static [usize],
}

impl OpCode {
    /// Every opcode, in encoding order.
    pub const ALL: [OpCode; 31] = [
        OpCode::Constant,
        OpCode::Null,
        OpCode::True,
        OpCode::False,
        OpCode::Pop,
        OpCode::Array,
        OpCode::Hash,
        OpCode::Index,
        OpCode::Add,
        OpCode::Sub,
        OpCode::Mul,
        OpCode::Div,
        OpCode::Minus,
        OpCode::Bang,
        OpCode::Equal,
        OpCode::NotEqual,
        OpCode::GreaterThan,
        OpCode::LessThan,
        OpCode::JumpNotTruthy,
        OpCode::Jump,
        OpCode::Call,
        OpCode::Return,
        OpCode::ReturnValue,
        OpCode::Closure,
        OpCode::CurrentClosure,
        OpCode::GetGlobal,
        OpCode::SetGlobal,
        OpCode::GetLocal,
        OpCode::SetLocal,
        OpCode::GetFree,
        OpCode::GetBuiltin,
    ];

    /// Returns the definition for this opcode.
    pub const fn definition(self) -> Definition {
        let (name, operand_widths): (&'static str, &'static [usize]) = match self {
            OpCode::Constant => ("OpConstant", &[2]),
            OpCode::Null => ("OpNull", &[]),
            OpCode::True => ("OpTrue", &[]),
            OpCode::False => ("OpFalse", &[]),
            OpCode::Pop => ("OpPop", &[]),
            OpCode::Array => ("OpArray", &[2]),
            OpCode::Hash => ("OpHash", &[2]),
            OpCode::Index => ("OpIndex", &[]),
            OpCode::Add => ("OpAdd", &[]),
            OpCode::Sub => ("OpSub", &[]),
            OpCode::Mul => ("OpMul", &[]),
            OpCode::Div => ("OpDiv", &[]),
            OpCode::Minus => ("OpMinus", &[]),
            OpCode::Bang => ("OpBang", &[]),
            OpCode::Equal => ("OpEqual", &[]),
            OpCode::NotEqual => ("OpNotEqual", &[]),
            OpCode::GreaterThan => ("OpGreaterThan", &[]),
            OpCode::LessThan => ("OpLessThan", &[]),
            OpCode::JumpNotTruthy => ("OpJumpNotTruthy", &[2]),
            OpCode::Jump => ("OpJump", &[2]),
            OpCode::Call => ("OpCall", &[1]),
            OpCode::Return => ("OpReturn", &[]),
            OpCode::ReturnValue => ("OpReturnValue", &[]),
            OpCode::Closure => ("OpClosure", &[2, 1]),
            OpCode::CurrentClosure => ("OpCurrentClosure", &[]),
            OpCode::GetGlobal => ("OpGetGlobal", &[2]),
            OpCode::SetGlobal => ("OpSetGlobal", &[2]),
            OpCode::GetLocal => ("OpGetLocal", &[1]),
            OpCode::SetLocal => ("OpSetLocal", &[1]),
            OpCode::GetFree => ("OpGetFree", &[1]),
            OpCode::GetBuiltin => ("OpGetBuiltin", &[1]),
        };
        Definition {
            name,
            operand_widths,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = BytecodeError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        OpCode::ALL
            .get(byte as usize)
            .copied()
            .ok_or(BytecodeError::UnknownOpcode(byte))
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

/// Encodes one instruction.
///
/// One-byte operands keep only their low byte and two-byte operands their
/// low 16 bits; callers range-check before encoding.
pub fn make(opcode: OpCode, operands: &[usize]) -> Result<Vec<u8>, BytecodeError> {
    let def = opcode.definition();
    if operands.len() != def.operand_widths.len() {
        return Err(BytecodeError::OperandCount {
            opcode: def.name,
            expected: def.operand_widths.len(),
            found: operands.len(),
        });
    }

    let len = 1 + def.operand_widths.iter().sum::<usize>();
    let mut bytes = Vec::with_capacity(len);
    bytes.push(opcode as u8);
    for (&operand, &width) in operands.iter().zip(def.operand_widths) {
        match width {
            2 => bytes.extend_from_slice(&(operand as u16).to_be_bytes()),
            _ => bytes.push(operand as u8),
        }
    }
    Ok(bytes)
}

/// Decodes the operands of `opcode` from `bytes`, which start just past the
/// opcode byte. Returns the operands and how many bytes they occupied.
pub fn read_operands(opcode: OpCode, bytes: &[u8]) -> Result<(Vec<usize>, usize), BytecodeError> {
    let def = opcode.definition();
    let mut operands = Vec::with_capacity(def.operand_widths.len());
    let mut offset = 0;

    for &width in def.operand_widths {
        let operand = match width {
            2 => read_u16(bytes, offset)? as usize,
            _ => read_u8(bytes, offset)? as usize,
        };
        operands.push(operand);
        offset += width;
    }

    Ok((operands, offset))
}

/// Reads a big-endian u16 at `offset`.
#[inline]
pub fn read_u16(bytes: &[u8], offset: usize) -> Result<u16, BytecodeError> {
    match bytes.get(offset..offset + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo])),
        _ => Err(BytecodeError::Truncated(offset)),
    }
}

/// Reads a u8 at `offset`.
#[inline]
pub fn read_u8(bytes: &[u8], offset: usize) -> Result<u8, BytecodeError> {
    bytes
        .get(offset)
        .copied()
        .ok_or(BytecodeError::Truncated(offset))
}

/// A linear instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instructions(Vec<u8>);

impl Instructions {
    /// Creates an empty stream.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the stream holds no instructions.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Appends an encoded instruction and returns its offset.
    pub fn push(&mut self, instruction: &[u8]) -> usize {
        let position = self.0.len();
        self.0.extend_from_slice(instruction);
        position
    }

    /// Overwrites bytes starting at `position` with an encoded instruction
    /// of the same length.
    pub fn overwrite(&mut self, position: usize, instruction: &[u8]) {
        self.0[position..position + instruction.len()].copy_from_slice(instruction);
    }

    /// Drops everything from `len` onwards.
    pub fn truncate(&mut self, len: usize) {
        self.0.truncate(len);
    }
}

impl From<Vec<u8>> for Instructions {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl FromIterator<Vec<u8>> for Instructions {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self(iter.into_iter().flatten().collect())
    }
}

/// Disassembly, one instruction per line as `offset name operands`.
///
/// Bad bytes are rendered as `ERROR:` lines; decoding resumes at the next
/// byte for unknown opcodes and stops at a truncated operand.
impl fmt::Display for Instructions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = &self.0;
        let mut offset = 0;

        while offset < bytes.len() {
            let opcode = match OpCode::try_from(bytes[offset]) {
                Ok(opcode) => opcode,
                Err(err) => {
                    writeln!(f, "{:04} ERROR: {}", offset, err)?;
                    offset += 1;
                    continue;
                }
            };

            match read_operands(opcode, &bytes[offset + 1..]) {
                Ok((operands, read)) => {
                    write!(f, "{:04} {}", offset, opcode)?;
                    for operand in operands {
                        write!(f, " {}", operand)?;
                    }
                    writeln!(f)?;
                    offset += 1 + read;
                }
                Err(err) => {
                    writeln!(f, "{:04} ERROR: {} {}", offset, opcode, err)?;
                    break;
                }
            }
        }

        Ok(())
    }
}

/// A compiled program: top-level instructions plus the constant pool.
#[derive(Debug, Clone, Default)]
pub struct Bytecode {
    /// The instructions
    pub instructions: Instructions,
    /// The constant pool
    pub constants: Vec<Value>,
}

impl Bytecode {
    /// Creates a new empty bytecode chunk.
    pub fn new() -> Self {
        Self::default()
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.instructions)?;
        for (index, constant) in self.constants.iter().enumerate() {
            writeln!(f, "constant {:04}: {} {}", index, constant.type_name(), constant)?;
            if let Value::Function(func) = constant {
                for line in func.instructions.to_string().lines() {
                    writeln!(f, "    {}", line)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_bytes_round_trip() {
        for opcode in OpCode::ALL {
            assert_eq!(OpCode::try_from(opcode as u8), Ok(opcode));
        }
        assert_eq!(
            OpCode::try_from(OpCode::ALL.len() as u8),
            Err(BytecodeError::UnknownOpcode(OpCode::ALL.len() as u8))
        );
    }

    #[test]
    fn test_make() {
        let cases: [(OpCode, &[usize], &[u8]); 4] = [
            (OpCode::Constant, &[65534], &[OpCode::Constant as u8, 255, 254]),
            (OpCode::Add, &[], &[OpCode::Add as u8]),
            (OpCode::GetLocal, &[255], &[OpCode::GetLocal as u8, 255]),
            (OpCode::Closure, &[65534, 255], &[OpCode::Closure as u8, 255, 254, 255]),
        ];

        for (opcode, operands, expected) in cases {
            assert_eq!(make(opcode, operands).unwrap(), expected);
        }
    }

    #[test]
    fn test_make_truncates_wide_operands() {
        assert_eq!(make(OpCode::Call, &[257]).unwrap(), vec![OpCode::Call as u8, 1]);
        assert_eq!(
            make(OpCode::Jump, &[0x1_0002]).unwrap(),
            vec![OpCode::Jump as u8, 0, 2]
        );
    }

    #[test]
    fn test_make_rejects_wrong_operand_count() {
        let err = make(OpCode::Constant, &[]).unwrap_err();
        assert_eq!(
            err,
            BytecodeError::OperandCount {
                opcode: "OpConstant",
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_read_operands() {
        for opcode in OpCode::ALL {
            let widths = opcode.definition().operand_widths;
            let operands: Vec<usize> = widths
                .iter()
                .map(|width| if *width == 2 { 65535 } else { 255 })
                .collect();

            let instruction = make(opcode, &operands).unwrap();
            assert_eq!(instruction.len(), 1 + widths.iter().sum::<usize>());

            let (decoded, read) = read_operands(opcode, &instruction[1..]).unwrap();
            assert_eq!(read, widths.iter().sum::<usize>(), "{}", opcode);
            assert_eq!(decoded, operands, "{}", opcode);
        }
    }

    #[test]
    fn test_read_operands_truncated() {
        let err = read_operands(OpCode::Constant, &[1]).unwrap_err();
        assert_eq!(err, BytecodeError::Truncated(0));
    }

    #[test]
    fn test_instructions_display() {
        let instructions: Instructions = vec![
            make(OpCode::Add, &[]).unwrap(),
            make(OpCode::GetLocal, &[1]).unwrap(),
            make(OpCode::Constant, &[2]).unwrap(),
            make(OpCode::Constant, &[65535]).unwrap(),
            make(OpCode::Closure, &[65535, 255]).unwrap(),
        ]
        .into_iter()
        .collect();

        let expected = "0000 OpAdd\n\
                        0001 OpGetLocal 1\n\
                        0003 OpConstant 2\n\
                        0006 OpConstant 65535\n\
                        0009 OpClosure 65535 255\n";
        assert_eq!(instructions.to_string(), expected);
    }

    #[test]
    fn test_instructions_display_marks_bad_bytes() {
        let instructions = Instructions::from(vec![200, OpCode::Pop as u8, OpCode::Constant as u8, 0]);
        let expected = "0000 ERROR: unknown opcode 200\n\
                        0001 OpPop\n\
                        0002 ERROR: OpConstant operand truncated at offset 0\n";
        assert_eq!(instructions.to_string(), expected);
    }

    #[test]
    fn test_overwrite_in_place() {
        let mut instructions = Instructions::new();
        instructions.push(&make(OpCode::Pop, &[]).unwrap());
        let position = instructions.push(&make(OpCode::Jump, &[9999]).unwrap());
        instructions.overwrite(position, &make(OpCode::Jump, &[4]).unwrap());
        assert_eq!(instructions.as_bytes(), &[OpCode::Pop as u8, OpCode::Jump as u8, 0, 4]);
    }
}
