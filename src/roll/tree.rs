use super::num::Number;
use crate::common::*;
use serde::Serialize;
use std::ops::Not;

/// The fields every node of a result tree carries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub value: Number,
    /// Still counted towards the parent's sum.
    pub valid: bool,
    /// The value has been converted into a success/failure count.
    pub success: bool,
    /// Display position among siblings.
    pub order: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Outcome {
    pub fn new(value: Number) -> Self {
        Self {
            value,
            valid: true,
            success: false,
            order: 0,
            label: None,
        }
    }

    fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }
}

#[enum_dispatch::enum_dispatch]
pub trait Eval {
    fn outcome(&self) -> &Outcome;

    fn outcome_mut(&mut self) -> &mut Outcome;

    fn value(&self) -> Number {
        self.outcome().value
    }

    fn valid(&self) -> bool {
        self.outcome().valid
    }

    fn success(&self) -> bool {
        self.outcome().success
    }

    fn order(&self) -> usize {
        self.outcome().order
    }

    fn label(&self) -> Option<&str> {
        self.outcome().label.as_deref()
    }

    /// The contribution to a parent's sum.
    fn total(&self) -> Number {
        if self.valid() {
            self.value()
        } else {
            Number::ZERO
        }
    }

    fn drop(&mut self) {
        self.outcome_mut().valid = false;
    }
}

impl<T: Eval + ?Sized> Eval for &mut T {
    fn outcome(&self) -> &Outcome {
        (**self).outcome()
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        (**self).outcome_mut()
    }

    fn drop(&mut self) {
        (**self).drop()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
#[enum_dispatch::enum_dispatch(Eval, AcceptRoll)]
pub enum RollResult {
    #[serde(rename = "number")]
    Number(NumberRoll),
    #[serde(rename = "die")]
    Die(DiceRoll),
    #[serde(rename = "diceexpressionroll")]
    DiceExpression(DiceExpressionRoll),
    #[serde(rename = "expressionroll")]
    Expression(ExpressionRoll),
    #[serde(rename = "grouproll")]
    Group(GroupRoll),
    #[serde(rename = "mathfunction")]
    MathFunction(MathFunctionRoll),
}

impl RollResult {
    /// Collects every individual die inside this result, looking through dice expressions.
    pub(crate) fn flatten_dice<'r>(&'r mut self, out: &mut Vec<&'r mut DieRoll>) {
        match self {
            Self::Die(dice) => out.extend(dice.rolls.iter_mut()),
            Self::DiceExpression(expr) => {
                for child in expr.dice.iter_mut() {
                    child.flatten_dice(out);
                }
            }
            _ => {}
        }
    }

    /// Re-sums every die specification reached by [`RollResult::flatten_dice`], then re-folds
    /// the dice expressions around them.
    pub(crate) fn refresh_dice(&mut self) {
        match self {
            Self::Die(dice) => dice.refresh_value(),
            Self::DiceExpression(expr) => {
                expr.dice.iter_mut().for_each(Self::refresh_dice);
                expr.refold();
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumberRoll {
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl NumberRoll {
    pub fn new(value: Number) -> Self {
        Self {
            outcome: Outcome::new(value),
        }
    }
}

impl Eval for NumberRoll {
    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        &mut self.outcome
    }
}

/// A rolled die specification such as `4d6kh3`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiceRoll {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub count: Box<RollResult>,
    pub die: Faces,
    pub rolls: Vec<DieRoll>,
    /// The value is the number of matching groups rather than a sum.
    pub matched: bool,
}

impl DiceRoll {
    pub fn new(count: RollResult, die: Faces, rolls: Vec<DieRoll>) -> Self {
        let mut ret = Self {
            outcome: Outcome::new(Number::ZERO),
            count: Box::new(count),
            die,
            rolls,
            matched: false,
        };
        ret.refresh_value();
        ret
    }

    pub(crate) fn refresh_value(&mut self) {
        if !self.matched {
            self.outcome.value = self.rolls.iter().map(Eval::total).sum();
        }
    }
}

impl Eval for DiceRoll {
    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        &mut self.outcome
    }
}

/// The evaluated face count of a die specification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Faces {
    Fate(FateMarker),
    Numeric(Box<RollResult>),
}

/// The kind of die a single roll came from.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum DieKind {
    Fate,
    Numeric(Int),
}

impl DieKind {
    pub fn min(self) -> Int {
        match self {
            Self::Fate => -1,
            Self::Numeric(_) => 1,
        }
    }

    pub fn max(self) -> Int {
        match self {
            Self::Fate => 1,
            Self::Numeric(face) => face,
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Face {
    #[serde(rename = "roll")]
    Numeric {
        die: Int,
        critical: Option<Critical>,
    },
    #[serde(rename = "fateroll")]
    Fate,
}

/// A single face rolled on a single die.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DieRoll {
    #[serde(flatten)]
    pub outcome: Outcome,
    #[serde(flatten)]
    pub face: Face,
    /// The raw face; `value` may diverge from it once modifiers apply.
    pub roll: Int,
    pub matched: bool,
    #[serde(rename = "explode", skip_serializing_if = "Not::not")]
    pub exploded: bool,
    #[serde(rename = "reroll", skip_serializing_if = "Not::not")]
    pub rerolled: bool,
    #[serde(rename = "drop", skip_serializing_if = "Not::not")]
    pub dropped: bool,
}

impl DieRoll {
    fn __new(face: Face, roll: Int, order: usize) -> Self {
        Self {
            outcome: Outcome::new(roll.into()).with_order(order),
            face,
            roll,
            matched: false,
            exploded: false,
            rerolled: false,
            dropped: false,
        }
    }

    pub fn numeric(die: Int, roll: Int, order: usize) -> Self {
        let critical = if roll == die {
            Some(Critical::Success)
        } else if roll == 1 {
            Some(Critical::Failure)
        } else {
            None
        };
        Self::__new(Face::Numeric { die, critical }, roll, order)
    }

    pub fn fate(roll: Int, order: usize) -> Self {
        Self::__new(Face::Fate, roll, order)
    }

    pub fn kind(&self) -> DieKind {
        match self.face {
            Face::Numeric { die, .. } => DieKind::Numeric(die),
            Face::Fate => DieKind::Fate,
        }
    }

    pub fn critical(&self) -> Option<Critical> {
        match self.face {
            Face::Numeric { critical, .. } => critical,
            Face::Fate => None,
        }
    }

    /// Replaces the raw face, keeping `value` in step with it.
    pub(crate) fn set_roll(&mut self, roll: Int) {
        self.roll = roll;
        self.outcome.value = roll.into();
    }

    /// Stores an accumulated total. A total past the integer range keeps its float value and
    /// saturates the raw face.
    pub(crate) fn set_total(&mut self, total: Number) {
        self.roll = total.as_int();
        self.outcome.value = total;
    }
}

impl Eval for DieRoll {
    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        &mut self.outcome
    }

    fn drop(&mut self) {
        self.outcome.valid = false;
        self.dropped = true;
    }
}

/// The results of a left-associative chain, with the operators that joined them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainRoll<O> {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub dice: Vec<RollResult>,
    pub ops: Vec<O>,
}

pub type DiceExpressionRoll = ChainRoll<DiceOp>;

pub type ExpressionRoll = ChainRoll<MathOp>;

impl<O> ChainRoll<O> {
    pub fn new(value: Number, dice: Vec<RollResult>, ops: Vec<O>) -> Self {
        Self {
            outcome: Outcome::new(value),
            dice,
            ops,
        }
    }
}

impl DiceExpressionRoll {
    fn refold(&mut self) {
        let mut dice = self.dice.iter();
        let mut value = dice.next().map_or(Number::ZERO, Eval::value);
        for (op, tail) in self.ops.iter().zip(dice) {
            value = match op {
                DiceOp::Add => value + tail.value(),
                DiceOp::Sub => value - tail.value(),
            };
        }
        self.outcome.value = value;
    }
}

impl<O> Eval for ChainRoll<O> {
    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        &mut self.outcome
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRoll {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub dice: Vec<RollResult>,
}

impl GroupRoll {
    pub fn new(dice: Vec<RollResult>) -> Self {
        let value = dice.iter().map(Eval::total).sum();
        Self {
            outcome: Outcome::new(value),
            dice,
        }
    }
}

impl Eval for GroupRoll {
    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        &mut self.outcome
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MathFunctionRoll {
    #[serde(flatten)]
    pub outcome: Outcome,
    pub op: MathFn,
    pub expr: Box<RollResult>,
}

impl MathFunctionRoll {
    pub fn new(op: MathFn, expr: RollResult) -> Self {
        let x = expr.value();
        let value = match op {
            MathFn::Floor => x.floor(),
            MathFn::Ceil => x.ceil(),
            MathFn::Round => x.round(),
            MathFn::Abs => x.abs(),
        };
        Self {
            outcome: Outcome::new(value),
            op,
            expr: Box::new(expr),
        }
    }
}

impl Eval for MathFunctionRoll {
    fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    fn outcome_mut(&mut self) -> &mut Outcome {
        &mut self.outcome
    }
}
