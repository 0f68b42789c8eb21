use super::{BinaryOpcode, Expr, ExprOp, UnaryOpcode};

impl Expr {
    /// Computes a symbolic derivative with respect to the given variable
    ///
    /// Each derivative is simplified as it is built, which keeps the output
    /// from growing exponentially with tree depth.
    ///
    /// ```
    /// use exprvm::tree::Expr;
    /// use std::collections::BTreeMap;
    ///
    /// let x = Expr::var("x");
    /// let d = x.pow(3).deriv("x");
    /// let vars = BTreeMap::from([("x".to_owned(), 4.0)]);
    /// assert_eq!(d.eval(&vars), 48.0);
    /// ```
    pub fn deriv(&self, v: &str) -> Expr {
        match self.0.as_ref() {
            ExprOp::Const(..) => Expr::constant(0.0),
            ExprOp::Var(name) => {
                Expr::constant(if name == v { 1.0 } else { 0.0 })
            }
            ExprOp::Unary(op, arg) => {
                let a = Expr::from(arg.clone());
                let outer = match op {
                    UnaryOpcode::Sin => a.cos(),
                    UnaryOpcode::Cos => Expr::constant(-1.0) * a.sin(),
                    UnaryOpcode::Ln => 1.0 / a.clone(),
                };
                (outer * a.deriv(v)).simplify()
            }
            ExprOp::Binary(op, lhs, rhs) => {
                let a = Expr::from(lhs.clone());
                let b = Expr::from(rhs.clone());
                let da = a.deriv(v);
                let db = b.deriv(v);
                let out = match op {
                    BinaryOpcode::Add => da + db,
                    BinaryOpcode::Sub => da - db,
                    BinaryOpcode::Mul => a * db + da * b,
                    BinaryOpcode::Div => (b.clone() * da - a * db) / b.pow(2),
                    // d/dx(f^g) = f^g * (g' * ln(f) + g * f' / f)
                    BinaryOpcode::Pow => {
                        self.clone() * (db * a.ln() + b * da / a)
                    }
                };
                out.simplify()
            }
        }
    }
}
