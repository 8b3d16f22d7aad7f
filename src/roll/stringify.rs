use super::tree::*;
use super::visit::{AcceptRoll, VisitRoll};
use crate::common::Critical;
use std::fmt;

/// Renders a result tree as text, one `str_*` method per kind of node.
pub trait Stringify {
    fn stringify<A: AcceptRoll>(&mut self, a: &A) -> String {
        let ret = a.accept(self);
        with_label(ret, a.label())
    }

    /// The whole tree followed by its total.
    fn render(&mut self, roll: &RollResult) -> String {
        let tree = self.stringify(roll);
        format!("{} = {}", tree, roll.value())
    }

    fn str_number(&mut self, x: &NumberRoll) -> String {
        x.value().to_string()
    }

    fn str_dice(&mut self, x: &DiceRoll) -> String {
        let count = match &*x.count {
            RollResult::Number(n) => self.stringify(n),
            other => format!("({})", self.stringify(other)),
        };
        let faces = match &x.die {
            Faces::Fate(_) => "F".to_string(),
            Faces::Numeric(n) => match &**n {
                RollResult::Number(n) => self.stringify(n),
                other => format!("({})", self.stringify(other)),
            },
        };
        let rolls = x
            .rolls
            .iter()
            .map(|die| self.stringify(die))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}d{} ({})", count, faces, rolls)
    }

    fn str_die(&mut self, x: &DieRoll) -> String {
        plain_die(x)
    }

    fn str_chain<O: fmt::Display>(&mut self, x: &ChainRoll<O>) -> String {
        let mut dice = x.dice.iter();
        let mut ret = match dice.next() {
            Some(head) => self.str_operand(head),
            None => String::new(),
        };
        for (op, tail) in x.ops.iter().zip(dice) {
            let tail = self.str_operand(tail);
            ret = format!("{} {} {}", ret, op, tail);
        }
        ret
    }

    /// A term of a chain, parenthesized when it is a chain itself.
    fn str_operand(&mut self, x: &RollResult) -> String {
        match x {
            RollResult::DiceExpression(_) | RollResult::Expression(_) => {
                format!("({})", self.stringify(x))
            }
            _ => self.stringify(x),
        }
    }

    fn str_group(&mut self, x: &GroupRoll) -> String {
        let inner = x
            .dice
            .iter()
            .map(|r| self.stringify(r))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{{{}}}", inner)
    }

    fn str_math_function(&mut self, x: &MathFunctionRoll) -> String {
        let inner = self.stringify(&*x.expr);
        format!("{}({})", x.op, inner)
    }
}

fn with_label(s: String, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("{} [{}]", s, label),
        None => s,
    }
}

fn plain_die(x: &DieRoll) -> String {
    let mut ret = x.roll.to_string();
    if x.exploded {
        ret.push('!');
    }
    ret
}

#[derive(Debug, Default)]
pub struct SimpleStringifier;

impl SimpleStringifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, roll: &RollResult) -> String {
        Stringify::render(self, roll)
    }
}

impl Stringify for SimpleStringifier {}

/// Markdown output: invalid results are struck through, critical successes bold and critical
/// failures italic.
#[derive(Debug, Default)]
pub struct MarkdownStringifier {
    in_dropped: bool,
}

impl MarkdownStringifier {
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self) {
        self.in_dropped = false;
    }

    pub fn render(&mut self, roll: &RollResult) -> String {
        self.reset();
        Stringify::render(self, roll)
    }
}

impl Stringify for MarkdownStringifier {
    fn stringify<A: AcceptRoll>(&mut self, a: &A) -> String {
        let ret = if !a.valid() && !self.in_dropped {
            self.in_dropped = true;
            let inside = a.accept(self);
            self.in_dropped = false;
            format!("~~{}~~", inside)
        } else {
            a.accept(self)
        };
        with_label(ret, a.label())
    }

    fn render(&mut self, roll: &RollResult) -> String {
        let tree = Stringify::stringify(self, roll);
        format!("{} = `{}`", tree, roll.value())
    }

    fn str_die(&mut self, x: &DieRoll) -> String {
        let ret = plain_die(x);
        match x.critical() {
            Some(Critical::Success) => format!("**{}**", ret),
            Some(Critical::Failure) => format!("*{}*", ret),
            None => ret,
        }
    }
}

impl<S: ?Sized> VisitRoll for S
where
    S: Stringify,
{
    type Output = String;

    fn visit_number(&mut self, x: &NumberRoll) -> Self::Output {
        self.str_number(x)
    }

    fn visit_dice(&mut self, x: &DiceRoll) -> Self::Output {
        self.str_dice(x)
    }

    fn visit_die(&mut self, x: &DieRoll) -> Self::Output {
        self.str_die(x)
    }

    fn visit_dice_expression(&mut self, x: &DiceExpressionRoll) -> Self::Output {
        self.str_chain(x)
    }

    fn visit_expression(&mut self, x: &ExpressionRoll) -> Self::Output {
        self.str_chain(x)
    }

    fn visit_group(&mut self, x: &GroupRoll) -> Self::Output {
        self.str_group(x)
    }

    fn visit_math_function(&mut self, x: &MathFunctionRoll) -> Self::Output {
        self.str_math_function(x)
    }
}
