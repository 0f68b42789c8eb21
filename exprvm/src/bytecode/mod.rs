//! Packed bytecode format
//!
//! The bytecode is a flat representation of a [`Program`]'s instruction
//! stream, meant for interpreters written in other languages (or running on
//! other hardware).  It is a list of little-endian `u32` words; each
//! instruction is an opcode word followed by its operand slots:
//!
//! | Word | Value                                          |
//! |------|------------------------------------------------|
//! | 0    | opcode in byte 0; bytes 1-3 are `0xFF`         |
//! | 1    | output slot                                    |
//! | 2    | first input slot                               |
//! | 3    | second input slot (two-argument opcodes only)  |
//!
//! Opcode values are generated automatically from [`BytecodeOp`], which is
//! one-to-one with [`Instruction`] variants.  The format is **not stable**;
//! check interpreters against [`iter_ops`], which associates opcode integers
//! with their names.
//!
//! The memory template, variable slots, and output slot travel alongside the
//! words, since they are needed to run the program.
//!
//! ```
//! use exprvm::{compiler::compile, parse};
//! use std::collections::BTreeMap;
//!
//! let prog = compile(&parse("sin(x) * 2")?);
//! let bc = prog.to_bytecode();
//! assert_eq!(bc.as_bytes().len(), bc.len() * 4);
//!
//! let decoded = exprvm::compiler::Program::from_bytecode(&bc)?;
//! let vars = BTreeMap::from([("x".to_owned(), 0.5)]);
//! assert_eq!(decoded.run(&vars), prog.run(&vars));
//! # Ok::<(), exprvm::Error>(())
//! ```
use crate::{
    Error,
    compiler::{Instruction, Program},
};
use zerocopy::IntoBytes;

pub use crate::compiler::Opcode as BytecodeOp;

/// Serialized bytecode for external evaluation
#[derive(Clone, Debug)]
pub struct Bytecode {
    data: Vec<u32>,
    memory: Vec<f64>,
    vars: Vec<(String, u32)>,
    output: u32,
}

impl Bytecode {
    /// Builds bytecode from raw parts, without checking them
    ///
    /// Validation happens in [`Program::from_bytecode`].
    pub fn from_raw(
        data: Vec<u32>,
        memory: Vec<f64>,
        vars: Vec<(String, u32)>,
        output: u32,
    ) -> Self {
        Self {
            data,
            memory,
            vars,
            output,
        }
    }

    /// Returns the length of the bytecode data (in `u32` words)
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Raw serialized operations
    pub fn data(&self) -> &[u32] {
        &self.data
    }

    /// Returns a view of the operations as a byte slice
    pub fn as_bytes(&self) -> &[u8] {
        self.data.as_bytes()
    }

    /// Initial memory contents
    pub fn memory(&self) -> &[f64] {
        &self.memory
    }

    /// `(name, slot)` pairs for each variable
    pub fn vars(&self) -> &[(String, u32)] {
        &self.vars
    }

    /// Slot holding the final result
    pub fn output(&self) -> u32 {
        self.output
    }

    /// Builds a new bytecode object from a compiled program
    pub fn new(prog: &Program) -> Self {
        let mut data = Vec::with_capacity(prog.len() * 4);
        for op in prog.instructions() {
            let r = BytecodeOp::from(op);
            data.push(u32::from_le_bytes([r as u8, 0xFF, 0xFF, 0xFF]));
            data.push(op.out());
            data.extend(op.inputs());
        }
        Bytecode {
            data,
            memory: prog.memory().to_vec(),
            vars: prog.vars().to_vec(),
            output: prog.output(),
        }
    }
}

impl Program {
    /// Packs this program into [`Bytecode`]
    pub fn to_bytecode(&self) -> Bytecode {
        Bytecode::new(self)
    }

    /// Unpacks and validates a program from [`Bytecode`]
    ///
    /// Fails if an opcode is unknown, if the words end partway through an
    /// instruction, or if any slot is outside of the memory template.
    pub fn from_bytecode(bc: &Bytecode) -> Result<Program, Error> {
        use strum::IntoEnumIterator;

        let mut instructions = vec![];
        let mut words = bc.data.iter().copied();
        while let Some(word) = words.next() {
            let [code, ..] = word.to_le_bytes();
            let op = BytecodeOp::iter()
                .nth(code as usize)
                .ok_or(Error::UnknownOpcode(code))?;
            let mut next = || words.next().ok_or(Error::TruncatedBytecode);
            let out = next()?;
            let instr = match op {
                BytecodeOp::Add => Instruction::Add(out, next()?, next()?),
                BytecodeOp::Sub => Instruction::Sub(out, next()?, next()?),
                BytecodeOp::Mul => Instruction::Mul(out, next()?, next()?),
                BytecodeOp::Div => Instruction::Div(out, next()?, next()?),
                BytecodeOp::Pow => Instruction::Pow(out, next()?, next()?),
                BytecodeOp::Sin => Instruction::Sin(out, next()?),
                BytecodeOp::Cos => Instruction::Cos(out, next()?),
                BytecodeOp::Ln => Instruction::Ln(out, next()?),
            };
            instructions.push(instr);
        }
        Program::try_from_parts(
            instructions,
            bc.memory.clone(),
            bc.vars.clone(),
            bc.output,
        )
    }
}

/// Iterates over opcode `(names, value)` tuples, with names in `CamelCase`
///
/// This is a helper function for defining constants in a VM interpreter
pub fn iter_ops<'a>() -> impl Iterator<Item = (&'a str, u8)> {
    use strum::IntoEnumIterator;

    BytecodeOp::iter().enumerate().map(|(i, op)| {
        let s: &'static str = op.into();
        (s, i as u8)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{compiler::compile, parse};
    use std::collections::BTreeMap;

    #[test]
    fn simple_bytecode() {
        let prog = compile(&parse("x + 1").unwrap());
        let bc = prog.to_bytecode();
        let mut iter = bc.data().iter();
        let mut next = || *iter.next().unwrap();
        assert_eq!(
            next().to_le_bytes(),
            [BytecodeOp::Add as u8, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(next(), 2); // output slot
        assert_eq!(next(), 0); // x
        assert_eq!(next(), 1); // constant 1
        assert!(iter.next().is_none());
        assert_eq!(bc.memory()[..2], [0.0, 1.0]);
        assert!(bc.memory()[2].is_nan());
        assert_eq!(
            bc.as_bytes()[..4],
            [BytecodeOp::Add as u8, 0xFF, 0xFF, 0xFF]
        );
    }

    #[test]
    fn ops() {
        let ops: Vec<_> = iter_ops().collect();
        assert_eq!(ops.len(), 8);
        assert_eq!(ops[0], ("Add", 0));
        assert!(ops.contains(&("Ln", BytecodeOp::Ln as u8)));
    }

    #[test]
    fn decode() {
        let e = parse("sin(x*y/b)*y+cos(a*x-y) - 2^ln(a)").unwrap();
        let prog = compile(&e);
        let decoded = Program::from_bytecode(&prog.to_bytecode()).unwrap();
        assert_eq!(decoded.instructions(), prog.instructions());
        assert_eq!(decoded.vars(), prog.vars());
        assert_eq!(decoded.output(), prog.output());

        let vars = BTreeMap::from([
            ("a".to_owned(), 1.25),
            ("b".to_owned(), 3.0),
            ("x".to_owned(), 0.5),
            ("y".to_owned(), -2.0),
        ]);
        assert_eq!(decoded.run(&vars), prog.run(&vars));
    }

    #[test]
    fn decode_errors() {
        let bad = |data: Vec<u32>| {
            Program::from_bytecode(&Bytecode::from_raw(
                data,
                vec![0.0; 3],
                vec![("x".to_owned(), 0)],
                2,
            ))
        };
        let add = BytecodeOp::Add as u32 | 0xFFFF_FF00;
        assert!(bad(vec![add, 2, 0, 1]).is_ok());
        assert_eq!(
            bad(vec![0xFFFF_FF20, 2, 0, 1]).unwrap_err(),
            Error::UnknownOpcode(0x20)
        );
        assert_eq!(bad(vec![add, 2, 0]).unwrap_err(), Error::TruncatedBytecode);
        assert_eq!(
            bad(vec![add, 2, 0, 7]).unwrap_err(),
            Error::BadSlot { slot: 7, len: 3 }
        );

        let bc = Bytecode::from_raw(vec![], vec![1.0], vec![], 1);
        assert_eq!(
            Program::from_bytecode(&bc).unwrap_err(),
            Error::BadSlot { slot: 1, len: 1 }
        );
    }
}
