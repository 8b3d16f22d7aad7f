//! Evaluates roll20-style dice notation such as `4d6kh3`, `{2d6,3d8}kh1` or `3d6!!>4` into a
//! result tree that records every die rolled and every modifier applied.
//!
//! ```
//! use roll20_dice::{DiceRoller, FnRoller, Number};
//!
//! let mut roller = DiceRoller::with_roller(FnRoller(|| 0.0));
//! assert_eq!(roller.roll_value("2d6+3").unwrap(), Number::Int(5));
//! ```

mod common;
mod error;
pub mod parse;
pub mod roll;

pub use common::{
    CompareOp, Critical, DiceOp, FateMarker, Float, HighLow, Int, MathFn, MathOp, NonEmpty,
};
pub use error::{Error, Result};
pub use parse::{ast, ParseError, ParseErrorKind};
pub use roll::{
    AcceptRoll, DefaultRoller, Eval, FnRoller, MarkdownStringifier, Number, RollContext,
    RollError, RollResult, Roller, SimpleStringifier, Stringify, VisitRoll,
};

/// Parses and evaluates dice notation against a [`Roller`].
pub struct DiceRoller<R = DefaultRoller> {
    ctx: RollContext<R>,
}

impl<R: Roller> DiceRoller<R> {
    pub fn new(roller: R, max_rolls: usize) -> Self {
        Self {
            ctx: RollContext::new(max_rolls, roller),
        }
    }

    /// A roller with the default ceiling of 1000 dice per specification.
    pub fn with_roller(roller: R) -> Self {
        Self::new(roller, RollContext::<R>::DEFAULT_MAX_ROLLS)
    }

    pub fn with_max_rolls(mut self, max_rolls: usize) -> Self {
        self.ctx.set_max_rolls(max_rolls);
        self
    }

    pub fn max_rolls(&self) -> usize {
        self.ctx.max_rolls()
    }

    pub fn parse(&self, s: &str) -> Result<ast::Node> {
        Ok(parse::parse(s)?)
    }

    pub fn roll(&mut self, s: &str) -> Result<RollResult> {
        let node = parse::parse(s)?;
        self.roll_parsed(&node)
    }

    /// Evaluates an already parsed (or deserialized) tree.
    pub fn roll_parsed(&mut self, node: &ast::Node) -> Result<RollResult> {
        Ok(self.ctx.eval(node)?)
    }

    pub fn roll_value(&mut self, s: &str) -> Result<Number> {
        self.roll(s).map(|r| r.value())
    }
}

impl Default for DiceRoller {
    fn default() -> Self {
        Self {
            ctx: RollContext::default(),
        }
    }
}

pub fn parse(s: &str) -> Result<ast::Node> {
    Ok(parse::parse(s)?)
}

/// Rolls `s` with the thread-local random number generator.
pub fn roll(s: &str) -> Result<RollResult> {
    DiceRoller::default().roll(s)
}

pub fn roll_value(s: &str) -> Result<Number> {
    DiceRoller::default().roll_value(s)
}
