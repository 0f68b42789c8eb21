use super::{Token, TokenKind};
use crate::{
    Error,
    tree::{BinaryOpcode, Expr, UnaryOpcode},
};

/// Builds an expression tree from tokens in postfix order
///
/// Operands are taken from a value stack; an operator or function without
/// enough operands, or a stream which leaves anything other than a single
/// value behind, is an error.
///
/// Binary operators pop their right-hand operand first, so operands always
/// end up in source order (`a b -` becomes `a - b`).
pub fn to_tree(postfix: &[Token]) -> Result<Expr, Error> {
    let mut stack: Vec<Expr> = vec![];
    for (i, t) in postfix.iter().enumerate() {
        let missing = || Error::MissingOperand {
            token: t.text.clone(),
            index: i,
        };
        let e = match t.kind {
            TokenKind::Number => {
                let v = t
                    .text
                    .parse::<f64>()
                    .map_err(|_| Error::BadNumber(t.text.clone()))?;
                Expr::constant(v)
            }
            TokenKind::Variable => Expr::var(t.text.as_str()),
            TokenKind::Operator => {
                let op = BinaryOpcode::from_symbol(&t.text)
                    .ok_or_else(|| Error::UnknownOperator(t.text.clone()))?;
                let rhs = stack.pop().ok_or_else(missing)?;
                let lhs = stack.pop().ok_or_else(missing)?;
                Expr::op_binary(lhs, rhs, op)
            }
            TokenKind::Function => {
                let op = UnaryOpcode::from_name(&t.text)
                    .ok_or_else(|| Error::UnknownFunction(t.text.clone()))?;
                let arg = stack.pop().ok_or_else(missing)?;
                Expr::op_unary(arg, op)
            }
            TokenKind::LeftParen | TokenKind::RightParen => {
                return Err(Error::UnbalancedParen { index: i });
            }
        };
        stack.push(e);
    }
    match stack.len() {
        0 => Err(Error::EmptyExpression),
        1 => stack.pop().ok_or(Error::EmptyExpression),
        n => Err(Error::LeftoverOperands(n)),
    }
}
