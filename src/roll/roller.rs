use crate::common::{Float, Int};
use rand::Rng;

/// The single source of randomness an evaluation draws from.
///
/// Implementors only supply [`Roller::random`]; die faces are derived from it so that a fixed
/// sequence of random values always yields the same rolls.
pub trait Roller {
    /// Returns a value in `[0, 1)`.
    fn random(&mut self) -> Float;

    /// Rolls a numeric die, uniform over `1..=face`.
    fn roll_die(&mut self, face: Int) -> Int {
        ((self.random() * face as Float).floor() as Int).min(face - 1) + 1
    }

    /// Rolls a fate die, uniform over `-1..=1`.
    fn roll_fate(&mut self) -> Int {
        (self.random() * 3.0).floor() as Int - 1
    }
}

impl<R: Rng> Roller for R {
    fn random(&mut self) -> Float {
        self.gen::<Float>()
    }
}

/// Adapts a zero-argument closure into a [`Roller`].
///
/// ```
/// use roll20_dice::{DiceRoller, FnRoller, Number};
///
/// let mut roller = DiceRoller::with_roller(FnRoller(|| 0.0));
/// assert_eq!(roller.roll_value("d20+5").unwrap(), Number::Int(6));
/// ```
#[derive(Debug, Copy, Clone)]
pub struct FnRoller<F>(pub F);

impl<F: FnMut() -> Float> Roller for FnRoller<F> {
    fn random(&mut self) -> Float {
        (self.0)()
    }
}

#[cfg(test)]
pub(crate) use fixed::{FixedRoller, SeqRoller};
