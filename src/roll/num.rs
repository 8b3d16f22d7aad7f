use crate::common::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A value flowing through a roll: integral wherever the arithmetic allows it.
#[derive(Debug, Copy, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Number {
    Int(Int),
    Float(Float),
}

impl Number {
    pub const ZERO: Self = Self::Int(0);

    pub fn as_int(self) -> Int {
        match self {
            Self::Int(x) => x,
            Self::Float(x) => x as Int,
        }
    }

    pub fn as_float(self) -> Float {
        match self {
            Self::Int(x) => x as Float,
            Self::Float(x) => x,
        }
    }

    /// Collapses an integral float back into an `Int` when it fits.
    fn integral(x: Float) -> Self {
        if x.is_finite() && x.fract() == 0.0 && x.abs() < Int::MAX as Float {
            Self::Int(x as Int)
        } else {
            Self::Float(x)
        }
    }

    pub fn floor(self) -> Self {
        match self {
            Self::Int(_) => self,
            Self::Float(x) => Self::integral(x.floor()),
        }
    }

    pub fn ceil(self) -> Self {
        match self {
            Self::Int(_) => self,
            Self::Float(x) => Self::integral(x.ceil()),
        }
    }

    /// Rounds half-way cases towards positive infinity.
    pub fn round(self) -> Self {
        match self {
            Self::Int(_) => self,
            Self::Float(x) => Self::integral((x + 0.5).floor()),
        }
    }

    pub fn abs(self) -> Self {
        match self {
            Self::Int(x) => x.checked_abs().map_or(Self::Float((x as Float).abs()), Self::Int),
            Self::Float(x) => Self::Float(x.abs()),
        }
    }

    pub fn pow(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Int(x), Self::Int(y)) if (0..=u32::MAX as Int).contains(&y) => x
                .checked_pow(y as u32)
                .map_or_else(|| Self::Float((x as Float).powf(y as Float)), Self::Int),
            (x, y) => Self::Float(x.as_float().powf(y.as_float())),
        }
    }

    /// Total order over the float view of the number, used to rank dice for keep and drop.
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.as_float().total_cmp(&other.as_float())
    }
}

impl std::ops::Neg for Number {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Self::Int(x) => x.checked_neg().map_or(Self::Float(-(x as Float)), Self::Int),
            Self::Float(x) => Self::Float(-x),
        }
    }
}

macro_rules! val_impl_bin_op {
    ($Name:ident, $fn_name:ident, $checked:ident) => {
        impl std::ops::$Name for Number {
            type Output = Self;

            fn $fn_name(self, rhs: Self) -> Self::Output {
                match (self, rhs) {
                    (Self::Int(x), Self::Int(y)) => x
                        .$checked(y)
                        .map_or_else(|| Self::Float(std::ops::$Name::$fn_name(x as Float, y as Float)), Self::Int),
                    (x, y) => Self::Float(std::ops::$Name::$fn_name(x.as_float(), y.as_float())),
                }
            }
        }
    };
}

val_impl_bin_op!(Add, add, checked_add);
val_impl_bin_op!(Sub, sub, checked_sub);
val_impl_bin_op!(Mul, mul, checked_mul);
val_impl_bin_op!(Rem, rem, checked_rem);

impl std::ops::Div for Number {
    type Output = Self;

    fn div(self, rhs: Self) -> Self::Output {
        match (self, rhs) {
            (Self::Int(x), Self::Int(y)) if y != 0 && x.checked_rem(y) == Some(0) => {
                Self::Int(x / y)
            }
            (x, y) => Self::Float(x.as_float() / y.as_float()),
        }
    }
}

impl std::ops::AddAssign for Number {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Number {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Number {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |a, b| a + b)
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.as_float().eq(&other.as_float())
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_float().partial_cmp(&other.as_float())
    }
}

impl From<Int> for Number {
    fn from(x: Int) -> Self {
        Self::Int(x)
    }
}

impl From<Float> for Number {
    fn from(x: Float) -> Self {
        Self::Float(x)
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(x) => fmt::Display::fmt(x, f),
            Self::Float(x) => fmt::Display::fmt(x, f),
        }
    }
}
