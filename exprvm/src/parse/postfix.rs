use super::{Token, TokenKind};
use crate::Error;

/// Binding strength of an operator token; higher binds tighter
fn precedence(t: &Token) -> u8 {
    match (t.kind, t.text.as_str()) {
        (TokenKind::Operator, "+" | "-") => 2,
        (TokenKind::Operator, "*" | "/") => 3,
        (TokenKind::Operator, "^") => 4,
        _ => 0,
    }
}

fn is_right_associative(t: &Token) -> bool {
    t.kind == TokenKind::Operator && t.text == "^"
}

/// Reorders infix tokens into postfix order using the shunting-yard algorithm
///
/// Functions are attached to the parenthesized group which follows them.
/// Errors report the index of the unmatched parenthesis in `tokens`.
pub fn to_postfix(tokens: &[Token]) -> Result<Vec<Token>, Error> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut stack: Vec<(usize, &Token)> = vec![];
    for (i, t) in tokens.iter().enumerate() {
        match t.kind {
            TokenKind::Number | TokenKind::Variable => out.push(t.clone()),
            TokenKind::Function | TokenKind::LeftParen => stack.push((i, t)),
            TokenKind::Operator => {
                while let Some(&(_, top)) = stack.last() {
                    if top.kind == TokenKind::LeftParen {
                        break;
                    }
                    let (p1, p2) = (precedence(t), precedence(top));
                    if p2 > p1 || (p2 == p1 && !is_right_associative(t)) {
                        out.push(top.clone());
                        stack.pop();
                    } else {
                        break;
                    }
                }
                stack.push((i, t));
            }
            TokenKind::RightParen => {
                loop {
                    match stack.pop() {
                        None => return Err(Error::UnbalancedParen { index: i }),
                        Some((_, top)) if top.kind == TokenKind::LeftParen => {
                            break;
                        }
                        Some((_, top)) => out.push(top.clone()),
                    }
                }
                if let Some(&(_, top)) = stack.last() {
                    if top.kind == TokenKind::Function {
                        out.push(top.clone());
                        stack.pop();
                    }
                }
            }
        }
    }
    while let Some((i, top)) = stack.pop() {
        if top.kind == TokenKind::LeftParen {
            return Err(Error::UnbalancedParen { index: i });
        }
        out.push(top.clone());
    }
    Ok(out)
}
