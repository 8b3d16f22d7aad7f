use crate::roll::Number;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write};
pub use vec1::vec1;

pub type Int = i64;

pub type Float = f64;

pub type NonEmpty<T> = vec1::Vec1<T>;

/// The comparison used by success, failure, critical, match and re-roll targets.
///
/// Roll20 comparisons are inclusive: `>` means "at least" and `<` means "at most".
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = ">")]
    AtLeast,
    #[serde(rename = "<")]
    AtMost,
    #[serde(rename = "=")]
    Equal,
}

impl CompareOp {
    pub fn test(self, value: Number, target: Number) -> bool {
        match self {
            Self::AtLeast => value >= target,
            Self::AtMost => value <= target,
            Self::Equal => value == target,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::AtLeast => '>',
            Self::AtMost => '<',
            Self::Equal => '=',
        };
        f.write_char(c)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum HighLow {
    #[serde(rename = "h")]
    High,
    #[serde(rename = "l")]
    Low,
}

impl fmt::Display for HighLow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::High => 'h',
            Self::Low => 'l',
        };
        f.write_char(c)
    }
}

/// Operators allowed between the terms of a dice expression.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum DiceOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
}

impl fmt::Display for DiceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            Self::Add => '+',
            Self::Sub => '-',
        };
        f.write_char(c)
    }
}

/// Operators allowed between the terms of a math expression.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum MathOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Rem,
    #[serde(rename = "**")]
    Pow,
}

impl From<DiceOp> for MathOp {
    fn from(op: DiceOp) -> Self {
        match op {
            DiceOp::Add => Self::Add,
            DiceOp::Sub => Self::Sub,
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Rem => "%",
            Self::Pow => "**",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathFn {
    Floor,
    Ceil,
    Round,
    Abs,
}

impl fmt::Display for MathFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Round => "round",
            Self::Abs => "abs",
        };
        f.write_str(s)
    }
}

/// Display-only critical marking of a single die.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Critical {
    Success,
    Failure,
}

/// Serializes as `{"type": "fate"}`, the marker used in place of a face count for fate dice.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FateMarker {
    Fate,
}
