//! Infix text parsing
//!
//! Parsing runs in three passes, each of which is exposed for testing and
//! for callers that want to inspect intermediate results:
//!
//! - [`tokenize`] splits text into [`Token`]s
//! - [`to_postfix`] reorders tokens into postfix form (shunting-yard)
//! - [`to_tree`] builds an [`Expr`] from postfix tokens
//!
//! [`parse`] chains all three.
//!
//! ```
//! use exprvm::parse::{tokenize, to_postfix};
//! let tokens = tokenize("3 * 4 + 2")?;
//! let postfix = to_postfix(&tokens)?;
//! let text: Vec<String> = postfix.iter().map(|t| t.to_string()).collect();
//! assert_eq!(text, ["3", "4", "*", "2", "+"]);
//! # Ok::<(), exprvm::Error>(())
//! ```
use crate::{Error, tree::Expr};

mod build;
mod lexer;
mod postfix;

pub use build::to_tree;
pub use lexer::tokenize;
pub use postfix::to_postfix;

/// Category of a [`Token`]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TokenKind {
    /// A run of digits and `.` characters
    Number,
    /// An identifier which is not a built-in function
    Variable,
    /// One of `+ - * / ^`
    Operator,
    /// A built-in function name (`sin`, `cos`, `ln`)
    Function,
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
}

/// A single lexical token
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Token {
    /// Token category
    pub kind: TokenKind,
    /// Source text of the token
    pub text: String,
}

impl Token {
    /// Builds a new token
    pub fn new<S: Into<String>>(kind: TokenKind, text: S) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Parses infix text into an expression tree
///
/// Whitespace is ignored.  Supported syntax is numbers, variable names,
/// the binary operators `+ - * / ^` (with `^` binding tightest and grouping
/// to the right), parentheses, and the functions `sin`, `cos`, and `ln`.
///
/// ```
/// use std::collections::BTreeMap;
/// let e = exprvm::parse("2 ^ 3 ^ 2")?;
/// assert_eq!(e.eval(&BTreeMap::new()), 512.0);
///
/// assert!(exprvm::parse("(2 + 3").is_err());
/// # Ok::<(), exprvm::Error>(())
/// ```
pub fn parse(text: &str) -> Result<Expr, Error> {
    let tokens = tokenize(text)?;
    let postfix = to_postfix(&tokens)?;
    to_tree(&postfix)
}
