mod ctx;
mod error;
mod num;
mod ops;
mod roller;
mod stringify;
mod tree;
mod visit;

use crate::parse::ast;

type RResult<T> = Result<T, RollError>;

pub use ctx::{DefaultRoller, RollContext};
pub use error::RollError;
pub use num::Number;
pub use roller::{FnRoller, Roller};
pub use stringify::{MarkdownStringifier, SimpleStringifier, Stringify};
pub use tree::{
    ChainRoll, DiceExpressionRoll, DiceRoll, DieKind, DieRoll, Eval, Face, Faces, ExpressionRoll,
    GroupRoll, MathFunctionRoll, NumberRoll, Outcome, RollResult,
};
pub use visit::{AcceptRoll, VisitRoll};

/// Evaluates `node` once with a fresh context.
pub fn eval<R: Roller>(node: &ast::Node, roller: R, max_rolls: usize) -> RResult<RollResult> {
    let mut ctx = RollContext::new(max_rolls, roller);
    ctx.eval(node)
}
