use crate::common::*;
use crate::roll::Number;
use serde::{Deserialize, Serialize};

/// A parsed roll.
///
/// The serialized form is internally tagged with `type`, so trees produced by any grammar that
/// follows the same shape can be deserialized and rolled directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Node {
    Number(NumberNode),
    Inline(Inline),
    Die(FullRoll),
    Group(Group),
    DiceExpression(Chain<DiceOp>),
    Expression(Chain<MathOp>),
    #[serde(rename = "mathfunction")]
    MathFunction(MathFunction),
    /// Any tag this crate does not know about.
    #[serde(other)]
    Unsupported,
}

impl Node {
    pub fn number(value: Number) -> Self {
        Self::Number(NumberNode { value, label: None })
    }

    pub fn int(value: Int) -> Self {
        Self::number(Number::Int(value))
    }

    pub fn float(value: Float) -> Self {
        Self::number(Number::Float(value))
    }

    pub fn inline(expr: Node) -> Self {
        Self::Inline(Inline {
            expr: Box::new(expr),
            label: None,
        })
    }

    pub fn math_function(op: MathFn, expr: Node) -> Self {
        Self::MathFunction(MathFunction {
            op,
            expr: Box::new(expr),
            label: None,
        })
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Number(x) => x.label.as_deref(),
            Self::Inline(x) => x.label.as_deref(),
            Self::Die(x) => x.label.as_deref(),
            Self::Group(x) => x.label.as_deref(),
            Self::DiceExpression(x) => x.label.as_deref(),
            Self::Expression(x) => x.label.as_deref(),
            Self::MathFunction(x) => x.label.as_deref(),
            Self::Unsupported => None,
        }
    }

    pub(crate) fn label_mut(&mut self) -> Option<&mut Option<String>> {
        Some(match self {
            Self::Number(x) => &mut x.label,
            Self::Inline(x) => &mut x.label,
            Self::Die(x) => &mut x.label,
            Self::Group(x) => &mut x.label,
            Self::DiceExpression(x) => &mut x.label,
            Self::Expression(x) => &mut x.label,
            Self::MathFunction(x) => &mut x.label,
            Self::Unsupported => return None,
        })
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Some(slot) = self.label_mut() {
            *slot = Some(label.into());
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberNode {
    pub value: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// An embedded `[[...]]` roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inline {
    pub expr: Box<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A die specification together with everything written after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullRoll {
    pub die: Sides,
    pub count: Box<Node>,
    /// Re-roll, keep and drop modifiers, in written order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mods: Vec<Modifier>,
    /// Success, failure and critical conditions, in written order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<Modifier>,
    #[serde(rename = "match", default, skip_serializing_if = "Option::is_none")]
    pub matches: Option<MatchMod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortMod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl FullRoll {
    pub fn new(count: Node, die: Sides) -> Self {
        Self {
            die,
            count: Box::new(count),
            mods: vec![],
            targets: vec![],
            matches: None,
            sort: None,
            label: None,
        }
    }
}

/// What a die is rolled against: a number of faces, or the fate marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Sides {
    Fate(FateMarker),
    Numeric(Box<Node>),
}

impl Sides {
    pub fn faces(x: Int) -> Self {
        Self::Numeric(Box::new(Node::int(x)))
    }
}

/// A brace-delimited list of rolls, e.g. `{4d6,3d8}kh1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub rolls: NonEmpty<Node>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mods: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// A left-associative chain `head op tail op tail ...`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain<O> {
    pub head: Box<Node>,
    pub ops: Vec<Op<O>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl<O> Chain<O> {
    pub fn new(head: Node, ops: Vec<Op<O>>) -> Self {
        Self {
            head: Box::new(head),
            ops,
            label: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Op<O> {
    pub op: O,
    pub tail: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MathFunction {
    pub op: MathFn,
    pub expr: Box<Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Modifier {
    Keep(KeepDrop),
    Drop(KeepDrop),
    Success(Condition),
    Failure(Condition),
    Crit(Condition),
    Critfail(Condition),
    Explode(ReRoll),
    Compound(ReRoll),
    Penetrate(ReRoll),
    Reroll(ReRoll),
    RerollOnce(ReRoll),
    #[serde(other)]
    Unsupported,
}

impl Modifier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keep(_) => "keep",
            Self::Drop(_) => "drop",
            Self::Success(_) => "success",
            Self::Failure(_) => "failure",
            Self::Crit(_) => "crit",
            Self::Critfail(_) => "critfail",
            Self::Explode(_) => "explode",
            Self::Compound(_) => "compound",
            Self::Penetrate(_) => "penetrate",
            Self::Reroll(_) => "reroll",
            Self::RerollOnce(_) => "rerollOnce",
            Self::Unsupported => "unsupported",
        }
    }

    /// Whether this modifier turns values into success/failure counts.
    pub fn is_target(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failure(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeepDrop {
    pub highlow: Option<HighLow>,
    pub expr: Box<Node>,
}

impl KeepDrop {
    pub fn new(highlow: Option<HighLow>, expr: Node) -> Self {
        Self {
            highlow,
            expr: Box::new(expr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(rename = "mod")]
    pub compare: CompareOp,
    pub expr: Box<Node>,
}

impl Condition {
    pub fn new(compare: CompareOp, expr: Node) -> Self {
        Self {
            compare,
            expr: Box::new(expr),
        }
    }
}

/// The trigger for a re-roll mechanic. Without an explicit target the die's own default applies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ReRoll {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Target>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    #[serde(rename = "mod")]
    pub compare: CompareOp,
    pub value: Box<Node>,
}

impl ReRoll {
    pub fn new(target: Option<(CompareOp, Node)>) -> Self {
        Self {
            target: target.map(|(compare, value)| Target {
                compare,
                value: Box::new(value),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMod {
    pub min: Box<Node>,
    pub count: bool,
    #[serde(rename = "mod", default, skip_serializing_if = "Option::is_none")]
    pub compare: Option<CompareOp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expr: Option<Box<Node>>,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SortMod {
    pub asc: bool,
}
