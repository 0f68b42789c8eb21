//! Interpreter for compiled [`Program`]s
//!
//! ```
//! use exprvm::{compiler::compile, parse, vm::ProgramEval};
//! use std::collections::BTreeMap;
//!
//! let prog = compile(&parse("x ^ 2 + 1")?);
//! let mut eval = ProgramEval::default();
//! let mut vars = BTreeMap::new();
//! for i in 0..4 {
//!     vars.insert("x".to_owned(), i as f64);
//!     assert_eq!(eval.eval(&prog, &vars), (i * i + 1) as f64);
//! }
//! # Ok::<(), exprvm::Error>(())
//! ```
use crate::{
    compiler::{Instruction, Program},
    tree::{BinaryOpcode, UnaryOpcode},
};
use std::collections::BTreeMap;

/// Helper struct to reduce boilerplate conversions
struct SlotArray<'a>(&'a mut [f64]);
impl std::ops::Index<u32> for SlotArray<'_> {
    type Output = f64;
    fn index(&self, i: u32) -> &Self::Output {
        &self.0[i as usize]
    }
}
impl std::ops::IndexMut<u32> for SlotArray<'_> {
    fn index_mut(&mut self, i: u32) -> &mut f64 {
        &mut self.0[i as usize]
    }
}

/// Reusable evaluator for [`Program`]s
///
/// The evaluator owns its working memory, which is reset from the program's
/// template at the start of every call; keeping one around avoids
/// reallocating that memory when evaluating the same program many times.
#[derive(Default)]
pub struct ProgramEval {
    slots: Vec<f64>,
}

impl ProgramEval {
    /// Evaluates the program with the given variable bindings
    ///
    /// Variables which are missing from `vars` evaluate to `0.0`.
    pub fn eval(
        &mut self,
        prog: &Program,
        vars: &BTreeMap<String, f64>,
    ) -> f64 {
        self.slots.clear();
        self.slots.extend_from_slice(prog.memory());
        let mut v = SlotArray(&mut self.slots);
        for (name, slot) in prog.vars() {
            v[*slot] = vars.get(name).copied().unwrap_or(0.0);
        }

        for op in prog.instructions() {
            match *op {
                Instruction::Add(out, lhs, rhs) => {
                    v[out] = BinaryOpcode::Add.apply(v[lhs], v[rhs]);
                }
                Instruction::Sub(out, lhs, rhs) => {
                    v[out] = BinaryOpcode::Sub.apply(v[lhs], v[rhs]);
                }
                Instruction::Mul(out, lhs, rhs) => {
                    v[out] = BinaryOpcode::Mul.apply(v[lhs], v[rhs]);
                }
                Instruction::Div(out, lhs, rhs) => {
                    v[out] = BinaryOpcode::Div.apply(v[lhs], v[rhs]);
                }
                Instruction::Pow(out, lhs, rhs) => {
                    v[out] = BinaryOpcode::Pow.apply(v[lhs], v[rhs]);
                }
                Instruction::Sin(out, arg) => {
                    v[out] = UnaryOpcode::Sin.apply(v[arg]);
                }
                Instruction::Cos(out, arg) => {
                    v[out] = UnaryOpcode::Cos.apply(v[arg]);
                }
                Instruction::Ln(out, arg) => {
                    v[out] = UnaryOpcode::Ln.apply(v[arg]);
                }
            }
        }
        v[prog.output()]
    }
}

impl Program {
    /// Evaluates the program with the given variable bindings
    ///
    /// Each call works on a fresh copy of the memory template; use a
    /// [`ProgramEval`] to reuse that allocation across calls.
    pub fn run(&self, vars: &BTreeMap<String, f64>) -> f64 {
        ProgramEval::default().eval(self, vars)
    }
}
