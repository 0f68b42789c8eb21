//! Immutable math expression trees
//!
//! An [`Expr`] is a cheap, clonable handle to an [`ExprOp`].  Trees are never
//! modified in place: every transform ([`Expr::deriv`], [`Expr::simplify`])
//! builds a new tree, reusing unchanged subtrees by reference.
//!
//! ```
//! use exprvm::tree::Expr;
//! use std::collections::BTreeMap;
//!
//! let x = Expr::var("x");
//! let e = x.clone() * x.sin() + 2.0;
//! let vars = BTreeMap::from([("x".to_owned(), 0.5)]);
//! assert_eq!(e.eval(&vars), 0.5 * 0.5f64.sin() + 2.0);
//! ```
mod deriv;
mod display;
mod op;
mod simplify;

pub use display::Markup;
pub use op::{BinaryOpcode, UnaryOpcode};

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Opcode type for trees
#[derive(Debug)]
pub enum ExprOp {
    /// Constant value
    Const(f64),
    /// Free variable, resolved by name at evaluation time
    Var(String),
    /// One-argument function
    Unary(UnaryOpcode, Arc<ExprOp>),
    /// Two-argument operation; for [`BinaryOpcode::Pow`], the base comes first
    Binary(BinaryOpcode, Arc<ExprOp>, Arc<ExprOp>),
}

impl Drop for ExprOp {
    fn drop(&mut self) {
        // Early exit for nodes which have limited recursion
        if self.eligible_for_fast_drop() {
            return;
        }

        let mut todo = vec![std::mem::replace(self, ExprOp::Const(0.0))];
        let empty = Arc::new(ExprOp::Const(0.0));
        while let Some(mut t) = todo.pop() {
            for t in t.iter_children_mut() {
                let arg = std::mem::replace(t, empty.clone());
                todo.extend(Arc::into_inner(arg));
            }
            drop(t);
        }
    }
}

impl ExprOp {
    /// Checks whether the given node is eligible for fast dropping
    ///
    /// Fast dropping uses the normal `Drop` implementation, which recurses on
    /// the stack and can overflow for deep trees.  A node is only eligible
    /// for fast dropping if all of its children are leaves.
    fn eligible_for_fast_drop(&self) -> bool {
        self.iter_children().all(|c| c.is_leaf())
    }

    /// Returns `true` if this node has no children
    fn is_leaf(&self) -> bool {
        matches!(self, ExprOp::Const(..) | ExprOp::Var(..))
    }

    fn iter_children(&self) -> impl Iterator<Item = &Arc<ExprOp>> {
        match self {
            ExprOp::Const(..) | ExprOp::Var(..) => [None, None],
            ExprOp::Unary(_op, arg) => [Some(arg), None],
            ExprOp::Binary(_op, lhs, rhs) => [Some(lhs), Some(rhs)],
        }
        .into_iter()
        .flatten()
    }

    fn iter_children_mut(&mut self) -> impl Iterator<Item = &mut Arc<ExprOp>> {
        match self {
            ExprOp::Const(..) | ExprOp::Var(..) => [None, None],
            ExprOp::Unary(_op, arg) => [Some(arg), None],
            ExprOp::Binary(_op, lhs, rhs) => [Some(lhs), Some(rhs)],
        }
        .into_iter()
        .flatten()
    }
}

/// Owned handle for a standalone math expression
#[derive(Clone, Debug)]
pub struct Expr(pub(crate) Arc<ExprOp>);

impl std::ops::Deref for Expr {
    type Target = ExprOp;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Expr {
        Expr::constant(v)
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Expr {
        Expr::constant(v as f64)
    }
}

impl From<ExprOp> for Expr {
    fn from(t: ExprOp) -> Expr {
        Expr(Arc::new(t))
    }
}

impl From<Arc<ExprOp>> for Expr {
    fn from(t: Arc<ExprOp>) -> Expr {
        Expr(t)
    }
}

/// Deep structural equality
///
/// Constants are compared by bit pattern, so `0.0 != -0.0` and a NaN constant
/// is equal to an identical NaN constant.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        // Heap recursion using a `Vec`, to avoid blowing up the stack
        let mut todo = vec![(&self.0, &other.0)];
        while let Some((a, b)) = todo.pop() {
            // Pointer equality lets us short-circuit deep checks
            if Arc::ptr_eq(a, b) {
                continue;
            }
            match (a.as_ref(), b.as_ref()) {
                (ExprOp::Const(a), ExprOp::Const(b)) => {
                    if a.to_bits() != b.to_bits() {
                        return false;
                    }
                }
                (ExprOp::Var(a), ExprOp::Var(b)) => {
                    if a != b {
                        return false;
                    }
                }
                (ExprOp::Unary(op_a, arg_a), ExprOp::Unary(op_b, arg_b)) => {
                    if op_a != op_b {
                        return false;
                    }
                    todo.push((arg_a, arg_b));
                }
                (
                    ExprOp::Binary(op_a, lhs_a, rhs_a),
                    ExprOp::Binary(op_b, lhs_b, rhs_b),
                ) => {
                    if op_a != op_b {
                        return false;
                    }
                    todo.push((lhs_a, lhs_b));
                    todo.push((rhs_a, rhs_b));
                }
                _ => return false,
            }
        }
        true
    }
}
impl Eq for Expr {}

/// Deep structural hash, consistent with [`PartialEq`]
impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let mut todo = vec![&self.0];
        while let Some(t) = todo.pop() {
            std::mem::discriminant(t.as_ref()).hash(state);
            match t.as_ref() {
                ExprOp::Const(c) => c.to_bits().hash(state),
                ExprOp::Var(v) => v.hash(state),
                ExprOp::Unary(op, arg) => {
                    op.hash(state);
                    todo.push(arg);
                }
                ExprOp::Binary(op, lhs, rhs) => {
                    op.hash(state);
                    todo.push(rhs);
                    todo.push(lhs);
                }
            }
        }
    }
}

impl Expr {
    /// Builds a constant
    pub fn constant(f: f64) -> Self {
        Expr(Arc::new(ExprOp::Const(f)))
    }

    /// Builds a free variable with the given name
    pub fn var<S: Into<String>>(name: S) -> Self {
        Expr(Arc::new(ExprOp::Var(name.into())))
    }

    pub(crate) fn op_unary(a: Expr, op: UnaryOpcode) -> Self {
        Expr(Arc::new(ExprOp::Unary(op, a.0)))
    }

    pub(crate) fn op_binary(a: Expr, b: Expr, op: BinaryOpcode) -> Self {
        Expr(Arc::new(ExprOp::Binary(op, a.0, b.0)))
    }

    /// Returns the inner constant, or `None` if this is not a constant
    pub fn const_value(&self) -> Option<f64> {
        match *self.0 {
            ExprOp::Const(c) => Some(c),
            _ => None,
        }
    }

    /// Returns the variable name, or `None` if this is not a variable
    pub fn var_name(&self) -> Option<&str> {
        match &*self.0 {
            ExprOp::Var(v) => Some(v),
            _ => None,
        }
    }

    /// Checks whether this is a constant with exactly the given value
    pub(crate) fn is_const(&self, v: f64) -> bool {
        self.const_value() == Some(v)
    }

    /// Shallow (pointer) equality check
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Builds `sin(self)`
    pub fn sin(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Sin)
    }

    /// Builds `cos(self)`
    pub fn cos(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Cos)
    }

    /// Builds `ln(self)`
    pub fn ln(&self) -> Self {
        Self::op_unary(self.clone(), UnaryOpcode::Ln)
    }

    /// Builds `self ^ exponent`
    pub fn pow<T: Into<Expr>>(&self, exponent: T) -> Self {
        Self::op_binary(self.clone(), exponent.into(), BinaryOpcode::Pow)
    }

    /// Evaluates the expression with the given variable bindings
    ///
    /// A variable that is missing from `vars` evaluates to `0.0`.  Division
    /// by zero and domain errors follow IEEE-754 rules, producing infinities
    /// or NaN rather than errors.
    pub fn eval(&self, vars: &BTreeMap<String, f64>) -> f64 {
        eval_inner(&self.0, vars)
    }

    /// Returns the set of free variables in this expression
    pub fn vars(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        let mut todo = vec![&self.0];
        while let Some(t) = todo.pop() {
            if let ExprOp::Var(v) = t.as_ref() {
                out.insert(v.clone());
            }
            todo.extend(t.iter_children());
        }
        out
    }

    /// Returns the number of nodes in the tree (counting shared subtrees once
    /// per use)
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        let mut count = 0;
        let mut todo = vec![&self.0];
        while let Some(t) = todo.pop() {
            count += 1;
            todo.extend(t.iter_children());
        }
        count
    }
}

fn eval_inner(op: &ExprOp, vars: &BTreeMap<String, f64>) -> f64 {
    match op {
        ExprOp::Const(c) => *c,
        ExprOp::Var(v) => vars.get(v).copied().unwrap_or(0.0),
        ExprOp::Unary(op, arg) => op.apply(eval_inner(arg, vars)),
        ExprOp::Binary(op, lhs, rhs) => {
            let a = eval_inner(lhs, vars);
            let b = eval_inner(rhs, vars);
            op.apply(a, b)
        }
    }
}

impl std::str::FromStr for Expr {
    type Err = crate::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        crate::parse::parse(s)
    }
}

macro_rules! impl_binary {
    ($op:ident, $op_assign:ident, $base_fn:ident, $assign_fn:ident) => {
        impl<A: Into<Expr>> std::ops::$op<A> for Expr {
            type Output = Self;

            fn $base_fn(self, other: A) -> Self {
                Self::op_binary(self, other.into(), BinaryOpcode::$op)
            }
        }
        impl<A: Into<Expr>> std::ops::$op_assign<A> for Expr {
            fn $assign_fn(&mut self, other: A) {
                use std::ops::$op;
                let mut next = self.clone().$base_fn(other.into());
                std::mem::swap(self, &mut next);
            }
        }
        impl std::ops::$op<Expr> for f64 {
            type Output = Expr;
            fn $base_fn(self, other: Expr) -> Expr {
                Expr::op_binary(self.into(), other, BinaryOpcode::$op)
            }
        }
    };
}

impl_binary!(Add, AddAssign, add, add_assign);
impl_binary!(Sub, SubAssign, sub, sub_assign);
impl_binary!(Mul, MulAssign, mul, mul_assign);
impl_binary!(Div, DivAssign, div, div_assign);

#[cfg(test)]
mod test {
    use super::*;
    use std::collections::HashSet;

    fn bind(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn deep_equality() {
        let x1 = Expr::var("x");
        let x2 = Expr::var("x");
        assert!(!x1.ptr_eq(&x2)); // shallow equality
        assert_eq!(x1, x2); // deep equality

        assert_eq!(Expr::constant(1.5), Expr::constant(1.5));
        assert_ne!(Expr::constant(0.0), Expr::constant(-0.0));
        assert_eq!(Expr::constant(f64::NAN), Expr::constant(f64::NAN));
        assert_ne!(Expr::var("x"), Expr::var("y"));
        assert_ne!(Expr::var("x").sin(), Expr::var("x").cos());
        assert_ne!(Expr::var("x") - 1.0, 1.0 - Expr::var("x"));
        assert_eq!(
            (Expr::var("x") * 2.0).pow(3),
            (Expr::var("x") * 2.0).pow(3)
        );
    }

    #[test]
    fn hash_matches_eq() {
        let mut set = HashSet::new();
        set.insert(Expr::var("x").pow(2));
        set.insert(Expr::var("x").pow(2));
        set.insert(Expr::var("x").pow(3));
        set.insert(Expr::var("x"));
        assert_eq!(set.len(), 3);
        assert!(set.contains(&Expr::var("x").pow(2)));
    }

    #[test]
    fn eval() {
        let x = Expr::var("x");
        let y = Expr::var("y");
        let e = (x.clone() + y.clone()) * (x.clone() - y.clone()) / 2.0;
        assert_eq!(e.eval(&bind(&[("x", 3.0), ("y", 1.0)])), 4.0);

        let e = x.pow(y.clone());
        assert_eq!(e.eval(&bind(&[("x", 3.0), ("y", 4.0)])), 81.0);

        let e = x.ln().cos() + y.sin();
        assert_eq!(
            e.eval(&bind(&[("x", 2.0), ("y", 1.0)])),
            2f64.ln().cos() + 1f64.sin()
        );
    }

    #[test]
    fn eval_missing_var_is_zero() {
        let e = Expr::var("x") + 1.0;
        assert_eq!(e.eval(&BTreeMap::new()), 1.0);
    }

    #[test]
    fn eval_division_by_zero() {
        let e = Expr::constant(1.0) / Expr::var("x");
        assert_eq!(e.eval(&BTreeMap::new()), f64::INFINITY);
        let e = Expr::var("x") / Expr::var("x");
        assert!(e.eval(&BTreeMap::new()).is_nan());
    }

    #[test]
    fn free_vars() {
        let e = Expr::var("a") * Expr::var("b").sin() + Expr::var("a");
        let vs: Vec<_> = e.vars().into_iter().collect();
        assert_eq!(vs, ["a", "b"]);
        assert!(Expr::constant(1.0).vars().is_empty());
    }

    #[test]
    fn node_count() {
        let x = Expr::var("x");
        assert_eq!(x.len(), 1);
        assert_eq!((x.clone() + x.sin()).len(), 4);
    }

    #[test]
    fn deep_recursion_drop() {
        let mut x = Expr::var("x");
        for _ in 0..1_000_000 {
            x += 1.0;
        }
        drop(x);
        // we should not panic here!
    }

    #[test]
    fn deep_recursion_eq() {
        let mut x1 = Expr::var("x");
        for _ in 0..1_000_000 {
            x1 += 1.0;
        }
        let mut x2 = Expr::var("x");
        for _ in 0..1_000_000 {
            x2 += 1.0;
        }
        assert_eq!(x1, x2);
        assert_eq!(x1.len(), 2_000_001);
    }
}
