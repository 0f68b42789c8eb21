use super::{Token, TokenKind};
use crate::{Error, tree::UnaryOpcode};

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || c == '.'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Splits infix text into tokens
///
/// Whitespace is removed before scanning, so error indexes refer to
/// positions in the text with whitespace stripped.  Runs of digits and `.`
/// become a single [`TokenKind::Number`]; runs of letters and `_` become a
/// [`TokenKind::Function`] if they name a built-in function, or a
/// [`TokenKind::Variable`] otherwise.
///
/// A number directly followed or preceded by an identifier (e.g. `3x`) is
/// rejected as ambiguous.
pub fn tokenize(text: &str) -> Result<Vec<Token>, Error> {
    let chars: Vec<char> =
        text.chars().filter(|c| !c.is_whitespace()).collect();
    let mut out = vec![];
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let start = i;
        let kind = if is_number_char(c) {
            while i < chars.len() && is_number_char(chars[i]) {
                i += 1;
            }
            TokenKind::Number
        } else if is_ident_char(c) {
            while i < chars.len() && is_ident_char(chars[i]) {
                i += 1;
            }
            TokenKind::Variable
        } else {
            i += 1;
            match c {
                '+' | '-' | '*' | '/' | '^' => TokenKind::Operator,
                '(' => TokenKind::LeftParen,
                ')' => TokenKind::RightParen,
                ch => return Err(Error::UnexpectedChar { ch, index: start }),
            }
        };

        // Numbers and identifiers may not touch, in either order
        if let Some(&next) = chars.get(i) {
            let clash = match kind {
                TokenKind::Number => is_ident_char(next),
                TokenKind::Variable => is_number_char(next),
                _ => false,
            };
            if clash {
                return Err(Error::AmbiguousToken { index: i });
            }
        }

        let text: String = chars[start..i].iter().collect();
        let kind = match kind {
            TokenKind::Number => {
                if text.parse::<f64>().is_err() {
                    return Err(Error::BadNumber(text));
                }
                TokenKind::Number
            }
            TokenKind::Variable if UnaryOpcode::from_name(&text).is_some() => {
                TokenKind::Function
            }
            k => k,
        };
        out.push(Token { kind, text });
    }
    Ok(out)
}
