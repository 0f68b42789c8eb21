//! Algebraic simplification
//!
//! Simplification is a bottom-up rewrite: children are simplified first, then
//! a small set of identities is applied at each node.  Chains of `*` and `/`
//! also go through term collection, which merges repeated factors into
//! powers and folds every constant into a single coefficient.
use super::{BinaryOpcode, Expr, ExprOp};
use crate::indexed::{IndexMap, IndexVec, define_index};
use log::trace;
use std::sync::Arc;

define_index!(BaseIndex, "Index of a distinct base during term collection");

impl Expr {
    /// Returns an algebraically simplified copy of this expression
    ///
    /// The result evaluates to the same value as `self` wherever `self` is
    /// finite, up to floating-point rounding.  Subtrees which are unchanged
    /// by simplification are shared with the input.
    ///
    /// ```
    /// use exprvm::tree::Expr;
    /// let x = Expr::var("x");
    /// let e = x.clone() * x.clone() * 3.0 / x.clone();
    /// assert_eq!(e.simplify().to_string(), "(3 * x)");
    /// ```
    pub fn simplify(&self) -> Expr {
        match self.0.as_ref() {
            ExprOp::Const(..) | ExprOp::Var(..) => self.clone(),
            ExprOp::Unary(op, arg) => {
                let a = Expr::from(arg.clone()).simplify();
                if Arc::ptr_eq(&a.0, arg) {
                    self.clone()
                } else {
                    Expr::op_unary(a, *op)
                }
            }
            ExprOp::Binary(op, lhs, rhs) => {
                let a = Expr::from(lhs.clone()).simplify();
                let b = Expr::from(rhs.clone()).simplify();
                match op {
                    BinaryOpcode::Add => simplify_add(a, b),
                    BinaryOpcode::Sub => simplify_sub(a, b),
                    BinaryOpcode::Mul => simplify_mul(a, b),
                    BinaryOpcode::Div => simplify_div(a, b),
                    BinaryOpcode::Pow => simplify_pow(a, b),
                }
            }
        }
    }
}

/// Folds a pair of constants, if both operands are constant
fn fold(a: &Expr, b: &Expr, op: BinaryOpcode) -> Option<Expr> {
    let (a, b) = (a.const_value()?, b.const_value()?);
    Some(Expr::constant(op.apply(a, b)))
}

fn simplify_add(a: Expr, b: Expr) -> Expr {
    if let Some(c) = fold(&a, &b, BinaryOpcode::Add) {
        c
    } else if a.is_const(0.0) {
        b
    } else if b.is_const(0.0) {
        a
    } else {
        Expr::op_binary(a, b, BinaryOpcode::Add)
    }
}

fn simplify_sub(a: Expr, b: Expr) -> Expr {
    if let Some(c) = fold(&a, &b, BinaryOpcode::Sub) {
        c
    } else if a.is_const(0.0) {
        Expr::op_binary(Expr::constant(-1.0), b, BinaryOpcode::Mul)
    } else if b.is_const(0.0) {
        a
    } else {
        Expr::op_binary(a, b, BinaryOpcode::Sub)
    }
}

/// Simplifies `a * b`, where both operands are already simplified
fn simplify_mul(a: Expr, b: Expr) -> Expr {
    // Zero wins even if the other side is undefined (e.g. `0 * ln(x)`)
    if a.is_const(0.0) || b.is_const(0.0) {
        trace!("eliminated ({a} * {b})");
        Expr::constant(0.0)
    } else if a.is_const(1.0) {
        b
    } else if b.is_const(1.0) {
        a
    } else if let Some(c) = fold(&a, &b, BinaryOpcode::Mul) {
        c
    } else if let Some(c) = collect(&a, &b, BinaryOpcode::Mul) {
        c
    } else if b.const_value().is_some() {
        Expr::op_binary(b, a, BinaryOpcode::Mul)
    } else {
        Expr::op_binary(a, b, BinaryOpcode::Mul)
    }
}

/// Simplifies `a / b`, where both operands are already simplified
fn simplify_div(a: Expr, b: Expr) -> Expr {
    if b.is_const(1.0) {
        a
    } else if a.is_const(0.0) {
        trace!("eliminated (0 / {b})");
        Expr::constant(0.0)
    } else if let Some(c) = fold(&a, &b, BinaryOpcode::Div) {
        c
    } else if let Some(c) = collect(&a, &b, BinaryOpcode::Div) {
        c
    } else {
        Expr::op_binary(a, b, BinaryOpcode::Div)
    }
}

/// Simplifies `a ^ b`, where both operands are already simplified
fn simplify_pow(a: Expr, b: Expr) -> Expr {
    if b.is_const(1.0) {
        a
    } else if b.is_const(0.0) {
        Expr::constant(1.0)
    } else {
        Expr::op_binary(a, b, BinaryOpcode::Pow)
    }
}

////////////////////////////////////////////////////////////////////////////////

/// Flattened view of a chain of `*` and `/` nodes
///
/// Every factor is stored as `base ^ exponent`, with exponents from the
/// denominator negated; constants are folded into `coef` instead.
struct Terms {
    coef: f64,
    const_count: usize,
    bases: IndexMap<Expr, BaseIndex>,
    exponents: IndexVec<Vec<Expr>, BaseIndex>,
}

impl Terms {
    fn new() -> Self {
        Self {
            coef: 1.0,
            const_count: 0,
            bases: IndexMap::default(),
            exponents: IndexVec::default(),
        }
    }

    fn push(&mut self, e: &Arc<ExprOp>, numerator: bool) {
        match e.as_ref() {
            ExprOp::Const(c) => {
                self.const_count += 1;
                if numerator {
                    self.coef *= c;
                } else {
                    self.coef /= c;
                }
            }
            ExprOp::Binary(BinaryOpcode::Mul, lhs, rhs) => {
                self.push(lhs, numerator);
                self.push(rhs, numerator);
            }
            ExprOp::Binary(BinaryOpcode::Div, lhs, rhs) => {
                self.push(lhs, numerator);
                self.push(rhs, !numerator);
            }
            ExprOp::Binary(BinaryOpcode::Pow, base, exp) => {
                let base = Expr::from(base.clone());
                self.push_factor(base, exp.clone().into(), numerator)
            }
            ExprOp::Var(..) | ExprOp::Unary(..) | ExprOp::Binary(..) => {
                let one = Expr::constant(1.0);
                self.push_factor(e.clone().into(), one, numerator)
            }
        }
    }

    fn push_factor(&mut self, base: Expr, exp: Expr, numerator: bool) {
        let exp = if numerator {
            exp
        } else if let Some(v) = exp.const_value() {
            Expr::constant(-v)
        } else {
            simplify_mul(Expr::constant(-1.0), exp)
        };
        let i = match self.bases.get(&base) {
            Some(i) => i,
            None => {
                self.bases.insert(base);
                self.exponents.push(vec![])
            }
        };
        self.exponents[i].push(exp);
    }

    /// Checks whether rebuilding would change anything
    ///
    /// A lone constant or a factor which appears once is already as merged
    /// as it can get.
    fn has_merges(&self) -> bool {
        self.const_count >= 2
            || self.bases.iter().any(|(i, _)| self.exponents[i].len() > 1)
    }

    /// Rebuilds the expression from collected terms
    ///
    /// Factors whose summed exponent is a negative constant are moved into
    /// the denominator, so `x / y` comes back out as a division rather than
    /// `x * y^-1`.
    fn rebuild(self) -> Expr {
        let mut num = vec![];
        let mut den = vec![];
        let bases: Vec<Expr> =
            self.bases.iter().map(|(_, b)| b.clone()).collect();
        let exponents = self.exponents.into_values();
        for (base, exps) in bases.into_iter().zip(exponents) {
            let exp = exps
                .into_iter()
                .reduce(simplify_add)
                .unwrap_or_else(|| Expr::constant(1.0));
            match exp.const_value() {
                Some(v) if v < 0.0 => {
                    den.push(simplify_pow(base, Expr::constant(-v)))
                }
                _ => num.push(simplify_pow(base, exp)),
            }
        }
        let product = |parts: Vec<Expr>| {
            parts
                .into_iter()
                .filter(|p| !p.is_const(1.0))
                .reduce(|a, b| Expr::op_binary(a, b, BinaryOpcode::Mul))
        };
        let (num, den) = (product(num), product(den));

        if self.coef == 0.0 {
            return Expr::constant(0.0);
        }
        let num = match num {
            Some(n) if self.coef == 1.0 => n,
            Some(n) => {
                Expr::op_binary(Expr::constant(self.coef), n, BinaryOpcode::Mul)
            }
            None => Expr::constant(self.coef),
        };
        match den {
            Some(d) => Expr::op_binary(num, d, BinaryOpcode::Div),
            None => num,
        }
    }
}

/// Attempts term collection on `a * b` or `a / b`
///
/// Returns `None` if collection would not merge anything, in which case the
/// caller keeps the plain binary node.
fn collect(a: &Expr, b: &Expr, op: BinaryOpcode) -> Option<Expr> {
    let mut terms = Terms::new();
    terms.push(&a.0, true);
    terms.push(&b.0, op == BinaryOpcode::Mul);
    if !terms.has_merges() {
        return None;
    }
    let out = terms.rebuild();
    trace!("collected ({a} {} {b}) into {out}", op.symbol());
    Some(out)
}
