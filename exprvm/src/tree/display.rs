//! Text and markup rendering
//!
//! The [`Display`](std::fmt::Display) implementation for [`Expr`] writes a
//! fully parenthesized infix form which can be read back by
//! [`parse`](crate::parse::parse):
//!
//! ```
//! use exprvm::tree::Expr;
//! let e = Expr::var("x") * 2.0 + Expr::var("y").sin();
//! assert_eq!(e.to_string(), "((x * 2) + sin(y))");
//! assert_eq!(e.markup().to_string(), r"x \times 2 + \sin(y)");
//! ```
use super::{BinaryOpcode, Expr, ExprOp, UnaryOpcode};
use std::fmt;

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_text(&self.0, f)
    }
}

/// Writes a constant so that the lexer can read it back
///
/// The lexer has no unary minus and no exponent notation, so negative and
/// non-finite values are spelled out as arithmetic on plain numbers.
fn write_const(c: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if c.is_nan() {
        write!(f, "(0 / 0)")
    } else if c == 0.0 && c.is_sign_negative() {
        write!(f, "(0 / (0 - 1))")
    } else if c.is_sign_negative() {
        write!(f, "(0 - ")?;
        write_const(-c, f)?;
        write!(f, ")")
    } else if c.is_infinite() {
        write!(f, "(1 / 0)")
    } else {
        write!(f, "{c}")
    }
}

fn write_text(op: &ExprOp, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match op {
        ExprOp::Const(c) => write_const(*c, f),
        ExprOp::Var(v) => write!(f, "{v}"),
        ExprOp::Unary(op, arg) => {
            write!(f, "{}(", op.name())?;
            write_text(arg, f)?;
            write!(f, ")")
        }
        ExprOp::Binary(op, lhs, rhs) => {
            write!(f, "(")?;
            write_text(lhs, f)?;
            write!(f, " {} ", op.symbol())?;
            write_text(rhs, f)?;
            write!(f, ")")
        }
    }
}

////////////////////////////////////////////////////////////////////////////////

/// LaTeX-style rendering of an [`Expr`], returned by [`Expr::markup`]
///
/// Fractions are written as `\frac{}{}`, powers as `^{}`, and multiplication
/// as `\times`.  Parentheses are only inserted where precedence requires
/// them.
pub struct Markup<'a>(&'a Expr);

impl Expr {
    /// Returns a LaTeX-style rendering of this expression
    pub fn markup(&self) -> Markup<'_> {
        Markup(self)
    }
}

impl fmt::Display for Markup<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_markup(&self.0.0, f)
    }
}

/// Checks whether `child` binds more loosely than a product
fn is_sum(child: &ExprOp) -> bool {
    matches!(
        child,
        ExprOp::Binary(BinaryOpcode::Add | BinaryOpcode::Sub, ..)
    )
}

fn write_grouped(
    op: &ExprOp,
    grouped: bool,
    f: &mut fmt::Formatter<'_>,
) -> fmt::Result {
    if grouped {
        write!(f, r"\left(")?;
        write_markup(op, f)?;
        write!(f, r"\right)")
    } else {
        write_markup(op, f)
    }
}

fn write_markup(op: &ExprOp, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match op {
        ExprOp::Const(c) if c.is_nan() => write!(f, r"\mathrm{{NaN}}"),
        ExprOp::Const(c) if c.is_infinite() => {
            write!(f, "{}\\infty", if *c < 0.0 { "-" } else { "" })
        }
        ExprOp::Const(c) => write!(f, "{c}"),
        ExprOp::Var(v) => write!(f, "{v}"),
        ExprOp::Unary(UnaryOpcode::Ln, arg) => {
            write!(f, r"\ln{{")?;
            write_markup(arg, f)?;
            write!(f, "}}")
        }
        ExprOp::Unary(op, arg) => {
            write!(f, r"\{}(", op.name())?;
            write_markup(arg, f)?;
            write!(f, ")")
        }
        ExprOp::Binary(BinaryOpcode::Add, lhs, rhs) => {
            write_markup(lhs, f)?;
            write!(f, " + ")?;
            write_markup(rhs, f)
        }
        ExprOp::Binary(BinaryOpcode::Sub, lhs, rhs) => {
            write_markup(lhs, f)?;
            write!(f, " - ")?;
            write_grouped(rhs, is_sum(rhs), f)
        }
        ExprOp::Binary(BinaryOpcode::Mul, lhs, rhs) => {
            write_grouped(lhs, is_sum(lhs), f)?;
            write!(f, r" \times ")?;
            write_grouped(rhs, is_sum(rhs), f)
        }
        ExprOp::Binary(BinaryOpcode::Div, lhs, rhs) => {
            write!(f, r"\frac{{")?;
            write_markup(lhs, f)?;
            write!(f, "}}{{")?;
            write_markup(rhs, f)?;
            write!(f, "}}")
        }
        ExprOp::Binary(BinaryOpcode::Pow, base, exp) => {
            let grouped = match base.as_ref() {
                ExprOp::Binary(..) => true,
                ExprOp::Const(c) => c.is_sign_negative(),
                ExprOp::Var(..) | ExprOp::Unary(..) => false,
            };
            write_grouped(base, grouped, f)?;
            write!(f, "^{{")?;
            write_markup(exp, f)?;
            write!(f, "}}")
        }
    }
}
