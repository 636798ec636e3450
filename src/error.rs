use thiserror::Error;

// Every variant is absorbed into display text at the dispatch boundary;
// nothing here crosses into the terminal surface as a structured error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("invalid expression")]
    InvalidExpression,
    #[error("division by zero")]
    DivideByZero,
    #[error("integer overflow")]
    Overflow,
    #[error("price lookup failed: {0}")]
    Network(String),
    #[error("malformed command arguments")]
    MalformedArgs,
}
