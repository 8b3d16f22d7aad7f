use crate::parse::ParseError;
use crate::roll::RollError;

/// Anything that can go wrong between reading notation and producing a result.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum Error {
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Roll(#[from] RollError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
