use thiserror::Error;

use crate::expr::Op;

/// Failures while tokenizing, parsing or evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("invalid character '{ch}' at position {position}")]
    InvalidCharacter { ch: char, position: usize },
    #[error("number starting at position {position} is too large")]
    NumberTooLarge { position: usize },
    #[error("'{op}' must sit between two operands; signed numbers are not supported")]
    UnsupportedUnaryOperator { op: Op },
    #[error("enter an expression first")]
    EmptyExpression,
    #[error("mismatched parentheses")]
    MismatchedParentheses,
    #[error("malformed expression")]
    MalformedExpression,
    #[error("the expression does not produce a finite number")]
    InvalidArithmeticResult,
}

/// Rule violations raised by the number pool.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PoolError {
    #[error(transparent)]
    Expression(#[from] ExprError),
    #[error("use at least one number from the pool")]
    NoNumbersUsed,
    #[error("{value} is not a whole number")]
    NonIntegerUsage { value: f64 },
    #[error("{value} is not in the pool range 1..={max}")]
    OutOfRange { value: f64, max: u64 },
    #[error("{value} appears more than once; each number can be used only once")]
    DuplicateUsageInExpression { value: u64 },
    #[error("{value} has already been used or removed")]
    NumberAlreadyConsumed { value: u64 },
    #[error("no numbers left to remove")]
    PoolExhausted,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config format error: {0}")]
    Format(#[from] serde_json::Error),
    #[error("invalid setting: {0}")]
    Invalid(String),
}
