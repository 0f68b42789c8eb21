//! `exprvm` is a small compiler and runtime for arithmetic expressions.
//!
//! Expressions are written as infix text with numbers, named variables, the
//! operators `+ - * / ^`, parentheses, and the functions `sin`, `cos`, and
//! `ln`.  The crate parses them into immutable trees, which can be evaluated
//! directly, differentiated, simplified, or compiled into a flat instruction
//! stream for fast repeated evaluation.
//!
//! # Parsing and evaluation
//! ```
//! use std::collections::BTreeMap;
//!
//! let e = exprvm::parse("sin(x * y / b) * y + cos(a * x - y)")?;
//! let vars = BTreeMap::from([
//!     ("a".to_owned(), 1.0),
//!     ("b".to_owned(), 0.5),
//!     ("x".to_owned(), 2.0),
//!     ("y".to_owned(), 0.25),
//! ]);
//! let v = e.eval(&vars);
//! let expected =
//!     (2.0f64 * 0.25 / 0.5).sin() * 0.25 + (1.0f64 * 2.0 - 0.25).cos();
//! assert_eq!(v, expected);
//! # Ok::<(), exprvm::Error>(())
//! ```
//!
//! Variables which are not bound evaluate to `0.0`, and division by zero
//! follows IEEE-754 rules rather than returning an error.
//!
//! # Symbolic transforms
//! Trees can be [differentiated](tree::Expr::deriv) and
//! [simplified](tree::Expr::simplify); both return new trees.
//! ```
//! let e = exprvm::parse("x ^ 3")?;
//! let d = e.deriv("x");
//! assert_eq!(d.to_string(), "(3 * (x ^ 2))");
//! assert_eq!(d.markup().to_string(), r"3 \times x^{2}");
//! # Ok::<(), exprvm::Error>(())
//! ```
//!
//! # Compilation
//! For workloads which evaluate the same expression many times, a tree can
//! be [compiled](compiler::compile) into a [`Program`](compiler::Program),
//! which is run by a simple interpreter.  Compiled evaluation produces
//! bit-identical results to tree evaluation.
//! ```
//! use exprvm::{compiler::compile, parse};
//! use std::collections::BTreeMap;
//!
//! let e = parse("x * x + 3 * x")?;
//! let prog = compile(&e);
//! let mut vars = BTreeMap::new();
//! for i in 0..10 {
//!     vars.insert("x".to_owned(), i as f64 / 10.0);
//!     assert_eq!(prog.run(&vars), e.eval(&vars));
//! }
//! # Ok::<(), exprvm::Error>(())
//! ```
//!
//! # Feature flags
#![doc = document_features::document_features!()]
#![warn(missing_docs)]

mod error;
mod indexed;

pub mod bytecode;
pub mod compiler;
pub mod integrate;
pub mod parse;
pub mod tree;
pub mod vm;

pub use error::{Error, ErrorKind};
pub use parse::parse;
