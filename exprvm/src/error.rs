//! Module containing the universal error type
use thiserror::Error;

/// Universal error type for `exprvm`
///
/// Only parsing and loading programs (from bytecode or `serde`) can fail.
/// Evaluation, simplification, differentiation, and compilation are
/// infallible: division by zero and
/// friends follow IEEE-754 rules and show up as infinities or NaN in the
/// result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A character is not part of any token
    #[error("unexpected character '{ch}' at index {index}")]
    UnexpectedChar {
        /// Offending character
        ch: char,
        /// Index of the character (after whitespace removal)
        index: usize,
    },

    /// A number and an identifier touch without an operator between them
    #[error("number and identifier are adjacent at index {index}")]
    AmbiguousToken {
        /// Index where the second run begins (after whitespace removal)
        index: usize,
    },

    /// A run of digits and `.` characters is not a valid number
    #[error("invalid number '{0}'")]
    BadNumber(String),

    /// Parentheses do not match
    #[error("unbalanced parentheses at token {index}")]
    UnbalancedParen {
        /// Index of the unmatched parenthesis in the token stream
        index: usize,
    },

    /// An operator or function has too few operands
    #[error("not enough operands for '{token}' at token {index}")]
    MissingOperand {
        /// Text of the operator or function
        token: String,
        /// Index of the token in the postfix stream
        index: usize,
    },

    /// More than one value was left over after building the tree
    #[error("{0} values left over after building the tree")]
    LeftoverOperands(usize),

    /// The token stream did not produce any value
    #[error("expression is empty")]
    EmptyExpression,

    /// An operator token is not one of `+ - * / ^`
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),

    /// A function token is not one of the built-in functions
    #[error("unknown function '{0}'")]
    UnknownFunction(String),

    /// A packed bytecode word names an unknown opcode
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),

    /// Packed bytecode ended in the middle of an instruction
    #[error("bytecode ended in the middle of an instruction")]
    TruncatedBytecode,

    /// A decoded or deserialized program refers to a slot outside of its
    /// memory
    #[error("slot {slot} is out of range for memory of length {len}")]
    BadSlot {
        /// Slot index named by the program
        slot: u32,
        /// Length of the memory template
        len: usize,
    },
}

/// Broad category of an [`Error`]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Invalid characters or tokens in the input text
    Lex,
    /// Unbalanced parentheses
    Parenthesis,
    /// Malformed postfix stream (too few or too many operands)
    StackUnderflow,
    /// Invalid packed bytecode or serialized program
    Bytecode,
}

impl Error {
    /// Returns the broad category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnexpectedChar { .. }
            | Error::AmbiguousToken { .. }
            | Error::BadNumber(..) => ErrorKind::Lex,
            Error::UnbalancedParen { .. } => ErrorKind::Parenthesis,
            Error::MissingOperand { .. }
            | Error::LeftoverOperands(..)
            | Error::EmptyExpression
            | Error::UnknownOperator(..)
            | Error::UnknownFunction(..) => ErrorKind::StackUnderflow,
            Error::UnknownOpcode(..)
            | Error::TruncatedBytecode
            | Error::BadSlot { .. } => ErrorKind::Bytecode,
        }
    }
}
