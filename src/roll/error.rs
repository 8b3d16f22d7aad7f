use super::num::Number;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RollError {
    #[error("cannot roll {requested} dice at once; the limit is {max}")]
    LimitExceeded { requested: Number, max: usize },
    #[error("invalid target for '{modifier}': every face would be re-rolled")]
    InvalidModifierTarget { modifier: &'static str },
    #[error("unsupported node: {0}")]
    UnsupportedNode(String),
    #[error("a die must have at least one face, found {0}")]
    InvalidDieSize(Number),
    #[error("cannot divide by zero")]
    ZeroDivision,
    #[error("cannot take modulus by zero")]
    ZeroModulo,
}
