//! Compiler from expression trees to flat instruction streams
//!
//! A [`Program`] is a list of [`Instruction`]s operating on a flat array of
//! `f64` slots.  Constants are baked into the memory template, each variable
//! owns one slot which is overwritten before every run, and every operation
//! writes its result into a fresh slot.  Instructions are emitted in
//! post-order, so every slot is written before it is read.
//!
//! ```
//! use exprvm::{compiler::compile, parse};
//! use std::collections::BTreeMap;
//!
//! let e = parse("sin(x * y / b) * y + cos(a * x - y)")?;
//! let prog = compile(&e);
//! let vars = BTreeMap::from([
//!     ("a".to_owned(), 1.5),
//!     ("b".to_owned(), 0.5),
//!     ("x".to_owned(), 2.0),
//!     ("y".to_owned(), 0.25),
//! ]);
//! assert_eq!(prog.run(&vars), e.eval(&vars));
//! # Ok::<(), exprvm::Error>(())
//! ```
use crate::{
    Error,
    indexed::{IndexMap, IndexVec, define_index},
    tree::{BinaryOpcode, Expr, ExprOp, UnaryOpcode},
};
use log::debug;
use std::sync::Arc;

/// A single interpreter instruction
///
/// Arguments, in order, are
/// - Output slot
/// - LHS slot (or the only input slot, for unary operations)
/// - RHS slot
#[derive(Copy, Clone, Debug, Eq, PartialEq, strum::EnumDiscriminants)]
#[strum_discriminants(
    name(Opcode),
    derive(strum::EnumIter, strum::IntoStaticStr),
    allow(missing_docs)
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// Add two slots
    Add(u32, u32, u32),
    /// Subtract one slot from another
    Sub(u32, u32, u32),
    /// Multiply two slots
    Mul(u32, u32, u32),
    /// Divide one slot by another
    Div(u32, u32, u32),
    /// Raise one slot to the power of another
    Pow(u32, u32, u32),
    /// Take the sine of a slot
    Sin(u32, u32),
    /// Take the cosine of a slot
    Cos(u32, u32),
    /// Take the natural log of a slot
    Ln(u32, u32),
}

impl Instruction {
    /// Builds a two-argument instruction
    pub fn binary(op: BinaryOpcode, out: u32, lhs: u32, rhs: u32) -> Self {
        match op {
            BinaryOpcode::Add => Instruction::Add(out, lhs, rhs),
            BinaryOpcode::Sub => Instruction::Sub(out, lhs, rhs),
            BinaryOpcode::Mul => Instruction::Mul(out, lhs, rhs),
            BinaryOpcode::Div => Instruction::Div(out, lhs, rhs),
            BinaryOpcode::Pow => Instruction::Pow(out, lhs, rhs),
        }
    }

    /// Builds a one-argument instruction
    pub fn unary(op: UnaryOpcode, out: u32, arg: u32) -> Self {
        match op {
            UnaryOpcode::Sin => Instruction::Sin(out, arg),
            UnaryOpcode::Cos => Instruction::Cos(out, arg),
            UnaryOpcode::Ln => Instruction::Ln(out, arg),
        }
    }

    /// Returns the output slot
    pub fn out(&self) -> u32 {
        match *self {
            Instruction::Add(out, ..)
            | Instruction::Sub(out, ..)
            | Instruction::Mul(out, ..)
            | Instruction::Div(out, ..)
            | Instruction::Pow(out, ..)
            | Instruction::Sin(out, ..)
            | Instruction::Cos(out, ..)
            | Instruction::Ln(out, ..) => out,
        }
    }

    /// Iterates over input slots
    pub fn inputs(&self) -> impl Iterator<Item = u32> {
        match *self {
            Instruction::Add(_, lhs, rhs)
            | Instruction::Sub(_, lhs, rhs)
            | Instruction::Mul(_, lhs, rhs)
            | Instruction::Div(_, lhs, rhs)
            | Instruction::Pow(_, lhs, rhs) => [Some(lhs), Some(rhs)],
            Instruction::Sin(_, arg)
            | Instruction::Cos(_, arg)
            | Instruction::Ln(_, arg) => [Some(arg), None],
        }
        .into_iter()
        .flatten()
    }
}

/// A compiled expression, ready for repeated evaluation
///
/// The program is read-only once built; evaluation always works on a private
/// copy of [`memory`](Program::memory), so a single program can be shared
/// between threads.
///
/// Deserialization checks that every slot is inside the memory template, so
/// a program loaded from elsewhere cannot index out of bounds when run.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawProgram"))]
pub struct Program {
    instructions: Vec<Instruction>,
    memory: Vec<f64>,
    vars: Vec<(String, u32)>,
    output: u32,
}

impl Program {
    /// Compiles the given expression
    pub fn new(e: &Expr) -> Self {
        compile(e)
    }

    /// Builds a program from raw parts, checking that every slot is in range
    pub(crate) fn try_from_parts(
        instructions: Vec<Instruction>,
        memory: Vec<f64>,
        vars: Vec<(String, u32)>,
        output: u32,
    ) -> Result<Self, Error> {
        let len = memory.len();
        for op in &instructions {
            check_slot(op.out(), len)?;
            for i in op.inputs() {
                check_slot(i, len)?;
            }
        }
        for (_, slot) in &vars {
            check_slot(*slot, len)?;
        }
        check_slot(output, len)?;
        Ok(Self {
            instructions,
            memory,
            vars,
            output,
        })
    }

    /// Returns the instruction stream, in evaluation order
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the memory template
    ///
    /// Constant slots hold their value and variable slots hold `0.0`.  Result
    /// slots hold NaN until they are written during evaluation, so a read
    /// before write poisons the output instead of passing for zero.
    pub fn memory(&self) -> &[f64] {
        &self.memory
    }

    /// Returns `(name, slot)` pairs for each variable, in first-use order
    pub fn vars(&self) -> &[(String, u32)] {
        &self.vars
    }

    /// Returns the slot holding the final result
    pub fn output(&self) -> u32 {
        self.output
    }

    /// Returns the number of instructions
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }
}

impl From<&Expr> for Program {
    fn from(e: &Expr) -> Self {
        compile(e)
    }
}

/// Checks that a slot indexes into memory of the given length
fn check_slot(slot: u32, len: usize) -> Result<(), Error> {
    if (slot as usize) < len {
        Ok(())
    } else {
        Err(Error::BadSlot { slot, len })
    }
}

/// Unchecked mirror of [`Program`], used as a deserialization target
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawProgram {
    instructions: Vec<Instruction>,
    memory: Vec<f64>,
    vars: Vec<(String, u32)>,
    output: u32,
}

#[cfg(feature = "serde")]
impl TryFrom<RawProgram> for Program {
    type Error = Error;
    fn try_from(p: RawProgram) -> Result<Self, Error> {
        Program::try_from_parts(p.instructions, p.memory, p.vars, p.output)
    }
}

define_index!(VarIndex, "Index of a variable during compilation");

#[derive(Default)]
struct Compiler {
    instructions: Vec<Instruction>,
    memory: Vec<f64>,
    vars: IndexMap<String, VarIndex>,
    var_slots: IndexVec<u32, VarIndex>,
}

impl Compiler {
    /// Allocates a fresh memory slot with the given initial value
    fn alloc(&mut self, v: f64) -> u32 {
        let slot = self.memory.len() as u32;
        self.memory.push(v);
        slot
    }

    /// Returns the slot of the given variable, allocating it on first use
    fn var(&mut self, name: &str) -> u32 {
        if let Some(i) = self.vars.get(&name.to_owned()) {
            return self.var_slots[i];
        }
        let slot = self.alloc(0.0);
        self.vars.insert(name.to_owned());
        self.var_slots.push(slot);
        slot
    }

    /// Compiles a tree, returning the slot of its result
    ///
    /// Post-order traversal is done on the heap, so deep trees do not
    /// overflow the stack.
    fn compile(&mut self, root: &Arc<ExprOp>) -> u32 {
        // Every child pushes exactly one slot before its parent is revisited
        fn pop(slots: &mut Vec<u32>) -> u32 {
            slots.pop().expect("post-order operand stack underflow")
        }

        let mut todo = vec![(root, false)];
        let mut slots: Vec<u32> = vec![];
        while let Some((t, children_done)) = todo.pop() {
            match (t.as_ref(), children_done) {
                (ExprOp::Const(c), _) => slots.push(self.alloc(*c)),
                (ExprOp::Var(v), _) => {
                    let slot = self.var(v);
                    slots.push(slot);
                }
                (ExprOp::Unary(_, arg), false) => {
                    todo.push((t, true));
                    todo.push((arg, false));
                }
                (ExprOp::Binary(_, lhs, rhs), false) => {
                    todo.push((t, true));
                    todo.push((rhs, false));
                    todo.push((lhs, false));
                }
                (ExprOp::Unary(op, _), true) => {
                    let arg = pop(&mut slots);
                    let out = self.alloc(f64::NAN);
                    self.instructions.push(Instruction::unary(*op, out, arg));
                    slots.push(out);
                }
                (ExprOp::Binary(op, ..), true) => {
                    let rhs = pop(&mut slots);
                    let lhs = pop(&mut slots);
                    let out = self.alloc(f64::NAN);
                    self.instructions
                        .push(Instruction::binary(*op, out, lhs, rhs));
                    slots.push(out);
                }
            }
        }
        debug_assert_eq!(slots.len(), 1);
        pop(&mut slots)
    }
}

/// Compiles an expression into a [`Program`]
pub fn compile(e: &Expr) -> Program {
    let mut c = Compiler::default();
    let output = c.compile(&e.0);
    let vars: Vec<(String, u32)> = c
        .vars
        .iter()
        .map(|(i, name)| (name.clone(), c.var_slots[i]))
        .collect();
    debug!(
        "compiled {} instructions over {} slots ({} variables)",
        c.instructions.len(),
        c.memory.len(),
        vars.len()
    );
    Program {
        instructions: c.instructions,
        memory: c.memory,
        vars,
        output,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse;

    #[test]
    fn constant() {
        let p = compile(&Expr::constant(2.5));
        assert!(p.instructions().is_empty());
        assert_eq!(p.memory(), [2.5]);
        assert_eq!(p.output(), 0);
        assert!(p.vars().is_empty());
    }

    #[test]
    fn post_order_layout() {
        let p = compile(&parse("x * 2 + sin(y)").unwrap());
        assert_eq!(&p.memory()[..2], [0.0, 2.0]);
        assert_eq!(p.memory()[3], 0.0);
        for i in [2, 4, 5] {
            assert!(p.memory()[i].is_nan(), "result slot {i} is not NaN");
        }
        assert_eq!(
            p.instructions(),
            [
                Instruction::Mul(2, 0, 1),
                Instruction::Sin(4, 3),
                Instruction::Add(5, 2, 4),
            ]
        );
        assert_eq!(p.vars(), [("x".to_owned(), 0), ("y".to_owned(), 3)]);
        assert_eq!(p.output(), 5);
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn shared_variable_slot() {
        let p = compile(&parse("x * x - x").unwrap());
        assert_eq!(p.vars(), [("x".to_owned(), 0)]);
        assert_eq!(
            p.instructions(),
            [Instruction::Mul(1, 0, 0), Instruction::Sub(2, 1, 0)]
        );
    }

    #[test]
    fn slots_are_written_before_read() {
        let p = compile(&parse("sin(x*y/b)*y+cos(a*x-y) + 2^ln(a)").unwrap());
        let mut written = vec![false; p.memory().len()];
        for (_, slot) in p.vars() {
            written[*slot as usize] = true;
        }
        for (i, v) in p.memory().iter().enumerate() {
            if !v.is_nan() {
                written[i] = true;
            }
        }
        for op in p.instructions() {
            for i in op.inputs() {
                assert!(written[i as usize], "slot {i} read before write");
            }
            assert!(!written[op.out() as usize], "slot written twice");
            written[op.out() as usize] = true;
        }
        assert!(written[p.output() as usize]);
    }

    #[test]
    fn deep_tree() {
        let mut e = Expr::var("x");
        for _ in 0..100_000 {
            e += 1.0;
        }
        let p = compile(&e);
        assert_eq!(p.len(), 100_000);
        assert_eq!(p.memory().len(), 200_001);
    }

    #[test]
    fn checked_parts() {
        let ok = Program::try_from_parts(
            vec![Instruction::Add(2, 0, 1)],
            vec![0.0, 1.0, f64::NAN],
            vec![("x".to_owned(), 0)],
            2,
        );
        assert!(ok.is_ok());

        let bad = Program::try_from_parts(
            vec![Instruction::Sin(2, 5)],
            vec![0.0, 1.0, f64::NAN],
            vec![],
            2,
        );
        assert_eq!(bad.unwrap_err(), Error::BadSlot { slot: 5, len: 3 });

        let bad = Program::try_from_parts(
            vec![],
            vec![1.0],
            vec![("x".to_owned(), 3)],
            0,
        );
        assert_eq!(bad.unwrap_err(), Error::BadSlot { slot: 3, len: 1 });
    }
}
