/// A one-argument math operation
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "lowercase")]
#[allow(missing_docs)]
pub enum UnaryOpcode {
    Sin,
    Cos,
    Ln,
}

/// A two-argument math operation
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    strum::EnumIter,
    strum::IntoStaticStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[allow(missing_docs)]
pub enum BinaryOpcode {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

impl UnaryOpcode {
    /// Looks up a built-in function by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sin" => Some(UnaryOpcode::Sin),
            "cos" => Some(UnaryOpcode::Cos),
            "ln" => Some(UnaryOpcode::Ln),
            _ => None,
        }
    }

    /// Returns the function name, as written in infix text
    pub fn name(&self) -> &'static str {
        self.into()
    }

    /// Applies the operation to a value
    ///
    /// Both the tree-walking evaluator and the interpreter go through this
    /// function, so their results are bit-identical.
    #[inline]
    pub fn apply(&self, a: f64) -> f64 {
        match self {
            UnaryOpcode::Sin => a.sin(),
            UnaryOpcode::Cos => a.cos(),
            UnaryOpcode::Ln => a.ln(),
        }
    }
}

impl BinaryOpcode {
    /// Looks up an operator by its symbol
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            "+" => Some(BinaryOpcode::Add),
            "-" => Some(BinaryOpcode::Sub),
            "*" => Some(BinaryOpcode::Mul),
            "/" => Some(BinaryOpcode::Div),
            "^" => Some(BinaryOpcode::Pow),
            _ => None,
        }
    }

    /// Returns the operator symbol, as written in infix text
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOpcode::Add => "+",
            BinaryOpcode::Sub => "-",
            BinaryOpcode::Mul => "*",
            BinaryOpcode::Div => "/",
            BinaryOpcode::Pow => "^",
        }
    }

    /// Applies the operation to a pair of values
    ///
    /// See [`UnaryOpcode::apply`] for why this is shared.
    #[inline]
    pub fn apply(&self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOpcode::Add => a + b,
            BinaryOpcode::Sub => a - b,
            BinaryOpcode::Mul => a * b,
            BinaryOpcode::Div => a / b,
            BinaryOpcode::Pow => a.powf(b),
        }
    }
}
