use super::{error::RollError, num::Number, roller::Roller, tree::*, RResult};
use crate::common::*;
use crate::parse::{
    ast,
    visit::{self, Accept},
};

pub type DefaultRoller = rand::rngs::ThreadRng;

/// Evaluates parsed rolls against a source of randomness.
pub struct RollContext<R = DefaultRoller> {
    max_rolls: usize,
    roller: R,
}

impl<R: Roller> RollContext<R> {
    pub const DEFAULT_MAX_ROLLS: usize = 1000;

    pub fn new(max_rolls: usize, roller: R) -> Self {
        Self { max_rolls, roller }
    }

    pub fn max_rolls(&self) -> usize {
        self.max_rolls
    }

    pub fn set_max_rolls(&mut self, max_rolls: usize) {
        self.max_rolls = max_rolls;
    }

    pub fn roller_mut(&mut self) -> &mut R {
        &mut self.roller
    }

    pub(crate) fn roll_face(&mut self, kind: DieKind) -> Int {
        match kind {
            DieKind::Fate => self.roller.roll_fate(),
            DieKind::Numeric(face) => self.roller.roll_die(face),
        }
    }

    pub(crate) fn roll_die(&mut self, kind: DieKind, order: usize) -> DieRoll {
        let roll = self.roll_face(kind);
        match kind {
            DieKind::Fate => DieRoll::fate(roll, order),
            DieKind::Numeric(face) => DieRoll::numeric(face, roll, order),
        }
    }

    /// Evaluates `node`, then copies its label onto the result.
    pub fn eval(&mut self, node: &ast::Node) -> RResult<RollResult> {
        let mut ret = node.accept(self)?;
        if let Some(label) = node.label() {
            ret.outcome_mut().label = Some(label.to_owned());
        }
        Ok(ret)
    }

    pub(crate) fn eval_value(&mut self, node: &ast::Node) -> RResult<Number> {
        self.eval(node).map(|x| x.value())
    }

    fn eval_chain<O: Copy + Into<MathOp>>(
        &mut self,
        chain: &ast::Chain<O>,
    ) -> RResult<ChainRoll<O>> {
        let head = self.eval(&chain.head)?;
        let mut value = head.value();

        let mut dice = Vec::with_capacity(chain.ops.len() + 1);
        let mut ops = Vec::with_capacity(chain.ops.len());
        dice.push(head);

        for (order, op) in chain.ops.iter().enumerate() {
            let mut tail = self.eval(&op.tail)?;
            tail.outcome_mut().order = order;
            value = operate(op.op.into(), value, tail.value())?;
            dice.push(tail);
            ops.push(op.op);
        }

        Ok(ChainRoll::new(value, dice, ops))
    }

    fn eval_count(&mut self, node: &ast::Node) -> RResult<(RollResult, usize)> {
        let count = self.eval(node)?;
        let requested = count.value();
        if requested > Number::Int(self.max_rolls as Int) {
            log::debug!(
                "rejecting roll of {} dice (limit {})",
                requested,
                self.max_rolls
            );
            return Err(RollError::LimitExceeded {
                requested,
                max: self.max_rolls,
            });
        }

        let n = match requested.as_float() {
            x if x >= 1.0 => x as usize,
            _ => 0,
        };
        Ok((count, n))
    }

    fn eval_faces(&mut self, sides: &ast::Sides) -> RResult<(Faces, DieKind)> {
        match sides {
            ast::Sides::Fate(marker) => Ok((Faces::Fate(*marker), DieKind::Fate)),
            ast::Sides::Numeric(node) => {
                let die = self.eval(node)?;
                let face = die.value();
                if !(face >= Number::Int(1)) {
                    return Err(RollError::InvalidDieSize(face));
                }
                Ok((
                    Faces::Numeric(Box::new(die)),
                    DieKind::Numeric(face.as_int()),
                ))
            }
        }
    }

    /// Applies group modifiers, then zeroes whatever no success or failure condition matched.
    fn apply_group_mods<T: Eval>(
        &mut self,
        mods: &[ast::Modifier],
        items: &mut [T],
    ) -> RResult<()> {
        for m in mods {
            m.operate_group(self, items)?;
        }
        if mods.iter().any(ast::Modifier::is_target) {
            force_unsuccessful(items);
        }
        Ok(())
    }
}

impl Default for RollContext {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ROLLS, rand::thread_rng())
    }
}

/// Non-matching dice count for nothing once targets have been applied.
pub(crate) fn force_unsuccessful<T: Eval>(items: &mut [T]) {
    for item in items.iter_mut() {
        let outcome = item.outcome_mut();
        if !outcome.success {
            outcome.value = Number::ZERO;
            outcome.success = true;
        }
    }
}

fn operate(op: MathOp, left: Number, right: Number) -> RResult<Number> {
    Ok(match op {
        MathOp::Add => left + right,
        MathOp::Sub => left - right,
        MathOp::Mul => left * right,
        MathOp::Div => {
            if right == Number::ZERO {
                return Err(RollError::ZeroDivision);
            } else {
                left / right
            }
        }
        MathOp::Rem => {
            if right == Number::ZERO {
                return Err(RollError::ZeroModulo);
            } else {
                left % right
            }
        }
        MathOp::Pow => left.pow(right),
    })
}

impl<R: Roller> visit::AstVisitor for RollContext<R> {
    type Output = RResult<RollResult>;

    fn visit_number(&mut self, x: &ast::NumberNode) -> Self::Output {
        Ok(NumberRoll::new(x.value).into())
    }

    fn visit_inline(&mut self, x: &ast::Inline) -> Self::Output {
        self.eval(&x.expr)
    }

    fn visit_die(&mut self, roll: &ast::FullRoll) -> Self::Output {
        let (count, n) = self.eval_count(&roll.count)?;
        let (die, kind) = self.eval_faces(&roll.die)?;

        log::trace!("rolling {} dice of kind {:?}", n, kind);
        let mut rolls: Vec<_> = (0..n).map(|i| self.roll_die(kind, i)).collect();

        for m in &roll.mods {
            m.operate_dice(self, kind, &mut rolls)?;
        }

        if !roll.targets.is_empty() {
            for m in &roll.targets {
                m.operate_dice(self, kind, &mut rolls)?;
            }
            if roll.targets.iter().any(ast::Modifier::is_target) {
                force_unsuccessful(&mut rolls);
            }
        }

        let match_count = match &roll.matches {
            Some(m) => m.operate(self, &mut rolls)?,
            None => None,
        };

        if let Some(sort) = roll.sort {
            sort.operate(&mut rolls);
        }

        let mut ret = DiceRoll::new(count, die, rolls);
        if let Some(groups) = match_count {
            ret.matched = true;
            ret.outcome.value = Number::Int(groups as Int);
        }
        Ok(ret.into())
    }

    fn visit_group(&mut self, group: &ast::Group) -> Self::Output {
        let mut dice = group
            .rolls
            .iter()
            .enumerate()
            .map(|(order, node)| {
                let mut ret = self.eval(node)?;
                ret.outcome_mut().order = order;
                Ok(ret)
            })
            .collect::<RResult<Vec<_>>>()?;

        let single_dice = matches!(
            dice.as_slice(),
            [RollResult::Die(_) | RollResult::DiceExpression(_)]
        );
        if !group.mods.is_empty() {
            if single_dice {
                // Modifiers reach through to the individual dice, e.g. `{4d6+3d8}kh1`.
                let only = &mut dice[0];
                let mut flat = Vec::new();
                only.flatten_dice(&mut flat);
                self.apply_group_mods(&group.mods, &mut flat)?;
                let value: Number = flat.iter().map(Eval::total).sum();

                only.refresh_dice();
                only.outcome_mut().value = value;
            } else {
                self.apply_group_mods(&group.mods, &mut dice)?;
            }
        }

        Ok(GroupRoll::new(dice).into())
    }

    fn visit_dice_expression(&mut self, chain: &ast::Chain<DiceOp>) -> Self::Output {
        self.eval_chain(chain).map(RollResult::DiceExpression)
    }

    fn visit_expression(&mut self, chain: &ast::Chain<MathOp>) -> Self::Output {
        self.eval_chain(chain).map(RollResult::Expression)
    }

    fn visit_math_function(&mut self, f: &ast::MathFunction) -> Self::Output {
        let expr = self.eval(&f.expr)?;
        Ok(MathFunctionRoll::new(f.op, expr).into())
    }

    fn visit_unsupported(&mut self) -> Self::Output {
        log::debug!("rejecting unsupported node");
        Err(RollError::UnsupportedNode("unknown node type".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roll::roller::{FixedRoller, SeqRoller};

    fn eval_with<R: Roller>(s: &str, roller: R) -> RResult<RollResult> {
        let mut ctx = RollContext::new(1000, roller);
        let ast = crate::parse::parse(s).unwrap();
        ctx.eval(&ast)
    }

    fn check(s: &str, expected: Number) {
        let actual = eval_with(s, FixedRoller(0.0)).unwrap();
        assert_eq!(actual.value(), expected, "rolling {:?}", s);
    }

    fn check_int(s: &str, expected: Int) {
        check(s, Number::Int(expected));
    }

    fn check_err(s: &str, expected: RollError) {
        let actual = eval_with(s, FixedRoller(0.0));
        assert_eq!(expected, actual.unwrap_err());
    }

    fn dice_of(result: &RollResult) -> &DiceRoll {
        match result {
            RollResult::Die(dice) => dice,
            other => panic!("expected dice, got {:?}", other),
        }
    }

    #[test]
    fn test_eval_number() {
        check_int("2", 2);
        check("2.5", Number::Float(2.5));
        check_int("-2", -2);
    }

    #[test]
    fn test_eval_arithmetic() {
        check_int("5+3", 8);
        check_int("16 % 3", 1);
        check_int("3 ** 2", 9);
        check_int("2 * (1 - 3)", -4);
        check("7 / 2", Number::Float(3.5));
    }

    #[test]
    fn test_eval_math_functions() {
        check_int("floor(7/2)", 3);
        check_int("ceil(7/2)", 4);
        check_int("round(7/3)", 2);
        check_int("round(8/3)", 3);
        check_int("abs(7)", 7);
        check_int("abs(-7)", 7);
        check_int("floor( 5 / 2d6 ) + ceil( (3d6 + 7d2) / 4 ) - 2d6", 3);
    }

    #[test]
    fn test_eval_dice() {
        check_int("d20+5", 6);
        check_int("3d6+2", 5);
        check_int("2d6+5 + d8", 8);
        check_int("[[2d6]]d5", 2);
        check_int("4dF", -4);
        check_int("4dF+1", -3);
    }

    #[test]
    fn test_eval_keep_drop() {
        check_int("8d100k4", 4);
        check_int("8d100d3", 5);
        check_int("8d100dh3", 5);
        check_int("8d100kl3", 3);
    }

    #[test]
    fn test_keep_drop_by_roll() {
        let roller = SeqRoller::new(vec![0.5, 0.0, 0.99, 0.2]);
        let result = eval_with("4d6kh2", roller).unwrap();
        let dice = dice_of(&result);
        let rolls: Vec<_> = dice.rolls.iter().map(|d| d.roll).collect();
        assert_eq!(rolls, vec![4, 1, 6, 2]);
        let valid: Vec<_> = dice.rolls.iter().map(|d| d.valid()).collect();
        assert_eq!(valid, vec![true, false, true, false]);
        assert!(dice.rolls[1].dropped);
        assert_eq!(dice.value(), Number::Int(10));

        let roller = SeqRoller::new(vec![0.5, 0.0, 0.99, 0.2]);
        let result = eval_with("4d6dl1", roller).unwrap();
        assert_eq!(result.value(), Number::Int(12));
    }

    #[test]
    fn test_eval_success_failure() {
        check_int("3d6>3", 0);
        check_int("10d6<4", 10);
        check_int("3d6>3f1", -3);
        check_int("3d6<3f1", 0);
        check_int("10d6<4f>5", 10);
        check_int("4d6kh1<4", 1);
        check_int("4d6kh3>4", 0);
        check_int("4d6>4kh3", 0);
        check_int("4d6<4kh3", 3);
    }

    #[test]
    fn test_success_stacks() {
        check_int("2d6>1>1", 4);
        check_int("2d6<3f<3", 0);
    }

    #[test]
    fn test_crit_is_cosmetic() {
        let result = eval_with("3d6cs1", FixedRoller(0.0)).unwrap();
        let dice = dice_of(&result);
        assert_eq!(dice.value(), Number::Int(3));
        assert!(dice
            .rolls
            .iter()
            .all(|d| d.critical() == Some(Critical::Success)));

        let result = eval_with("3d6cf2", FixedRoller(0.0)).unwrap();
        let dice = dice_of(&result);
        assert!(dice.rolls.iter().all(|d| d.critical().is_none()));
    }

    #[test]
    fn test_eval_explode() {
        check_int("3d6!", 3);
        check_int("3d6!>4", 3);
        check_int("3d6!3", 3);
        check_int("10d6!", 10);
        check_int("5d6!!", 5);
        check_int("5d6!p", 5);
    }

    #[test]
    fn test_explode_inserts_after_die() {
        let roller = SeqRoller::new(vec![0.99, 0.99, 0.5, 0.2]);
        let result = eval_with("2d6!", roller).unwrap();
        let dice = dice_of(&result);
        let rolls: Vec<_> = dice.rolls.iter().map(|d| d.roll).collect();
        assert_eq!(rolls, vec![6, 4, 6, 2]);
        let exploded: Vec<_> = dice.rolls.iter().map(|d| d.exploded).collect();
        assert_eq!(exploded, vec![true, false, true, false]);
        let orders: Vec<_> = dice.rolls.iter().map(|d| d.order()).collect();
        assert_eq!(orders, vec![0, 1, 2, 3]);
        assert_eq!(dice.value(), Number::Int(18));
    }

    #[test]
    fn test_compound() {
        let roller = SeqRoller::new(vec![0.84, 0.84, 0.17]);
        let result = eval_with("1d6!!", roller).unwrap();
        let dice = dice_of(&result);
        assert_eq!(dice.rolls.len(), 1);
        assert!(dice.rolls[0].exploded);
        assert_eq!(dice.value(), Number::Int(14));

        let roller = SeqRoller::new(vec![0.84, 0.67, 0.5, 0.17, 0.84, 0.0]);
        let result = eval_with("4d6!!", roller).unwrap();
        assert_eq!(result.value(), Number::Int(24));
    }

    #[test]
    fn test_penetrate() {
        let roller = SeqRoller::new(vec![0.99, 0.99, 0.0]);
        let result = eval_with("1d6!p", roller).unwrap();
        let dice = dice_of(&result);
        let rolls: Vec<_> = dice.rolls.iter().map(|d| d.roll).collect();
        assert_eq!(rolls, vec![6, 5]);
        assert!(dice.rolls[0].exploded);
        assert!(!dice.rolls[1].exploded);
        assert_eq!(dice.value(), Number::Int(11));
    }

    #[test]
    fn test_eval_reroll() {
        check_int("2d8r8", 2);
        check_int("2d8ro1r3r5r7", 2);
        check_int("2d8ro<2", 2);

        let roller = SeqRoller::new(vec![0.0, 0.5, 0.0, 0.9]);
        let result = eval_with("2d8r1", roller).unwrap();
        let dice = dice_of(&result);
        let rolls: Vec<_> = dice.rolls.iter().map(|d| d.roll).collect();
        assert_eq!(rolls, vec![1, 1, 8, 5]);
        let valid: Vec<_> = dice.rolls.iter().map(|d| d.valid()).collect();
        assert_eq!(valid, vec![false, false, true, true]);
        assert!(dice.rolls[0].rerolled);
        assert_eq!(dice.value(), Number::Int(13));
    }

    #[test]
    fn test_invalid_reroll_targets() {
        let err = |m| RollError::InvalidModifierTarget { modifier: m };
        check_err("1d1!", err("explode"));
        check_err("2d6!>1", err("explode"));
        check_err("2d6!!<6", err("compound"));
        check_err("2d6!p>0", err("penetrate"));
        check_err("2d6r>1", err("reroll"));
        check_err("2d6ro<6", err("rerollOnce"));
        check_err("4dF!>-1", err("explode"));
    }

    #[test]
    fn test_eval_match() {
        check_int("4d6mt", 1);
        check_int("4d6mt3", 1);
        check_int("4d6mt5", 0);
        check_int("4d6mt3>2", 0);
        check_int("4d6mt4<2", 1);
        check_int("4d6m", 4);

        let roller = SeqRoller::new(vec![0.0, 0.5, 0.0, 0.9]);
        let result = eval_with("4d6m", roller).unwrap();
        let matched: Vec<_> = dice_of(&result).rolls.iter().map(|d| d.matched).collect();
        assert_eq!(matched, vec![true, false, true, false]);
    }

    #[test]
    fn test_eval_sort() {
        let roller = SeqRoller::new(vec![0.5, 0.0, 0.99]);
        let result = eval_with("3d6sd", roller).unwrap();
        let dice = dice_of(&result);
        let rolls: Vec<_> = dice.rolls.iter().map(|d| d.roll).collect();
        assert_eq!(rolls, vec![6, 4, 1]);
        let orders: Vec<_> = dice.rolls.iter().map(|d| d.order()).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        let roller = SeqRoller::new(vec![0.5, 0.0, 0.99]);
        let result = eval_with("3d6s", roller).unwrap();
        let rolls: Vec<_> = dice_of(&result).rolls.iter().map(|d| d.roll).collect();
        assert_eq!(rolls, vec![1, 4, 6]);
    }

    #[test]
    fn test_eval_group() {
        check_int("{4d6+3d8}kh1", 1);
        check_int("{4d6,3d8}kh1", 4);
        check_int("{5d6!!}>8", 0);
        check_int("{3d6+1}<3", 3);
        check_int("{1, 2, 3}", 6);
        check_int("{1, 5, 3}kh1", 5);
        check_int("{1, 5, 3}d1", 8);
    }

    #[test]
    fn test_group_flattening_keeps_structure() {
        let result = eval_with("{4d6+3d8}kh1", FixedRoller(0.0)).unwrap();
        let group = match &result {
            RollResult::Group(g) => g,
            other => panic!("expected group, got {:?}", other),
        };
        assert_eq!(group.dice.len(), 1);
        let inner = match &group.dice[0] {
            RollResult::DiceExpression(e) => e,
            other => panic!("expected dice expression, got {:?}", other),
        };
        let valid: usize = inner
            .dice
            .iter()
            .map(|d| dice_of(d).rolls.iter().filter(|r| r.valid()).count())
            .sum();
        assert_eq!(valid, 1);
        assert_eq!(inner.value(), Number::Int(1));
    }

    #[test]
    fn test_group_rejects_dice_only_modifiers() {
        let node = ast::Node::Group(ast::Group {
            rolls: vec1![ast::Node::int(1), ast::Node::int(2)],
            mods: vec![ast::Modifier::Explode(ast::ReRoll::default())],
            label: None,
        });
        let mut ctx = RollContext::new(1000, FixedRoller(0.0));
        assert!(matches!(
            ctx.eval(&node),
            Err(RollError::UnsupportedNode(_))
        ));
    }

    #[test]
    fn test_group_flattening_refreshes_nested_expressions() {
        let roller = SeqRoller::new(vec![0.9, 0.1, 0.5, 0.7, 0.3]);
        let result = eval_with("{(2d6+1d4)+1d8}kh1", roller).unwrap();
        assert_eq!(result.value(), Number::Int(6));

        let outer = match &result {
            RollResult::Group(g) => match &g.dice[0] {
                RollResult::DiceExpression(e) => e,
                other => panic!("expected dice expression, got {:?}", other),
            },
            other => panic!("expected group, got {:?}", other),
        };
        assert_eq!(outer.value(), Number::Int(6));

        let inner = match &outer.dice[0] {
            RollResult::DiceExpression(e) => e,
            other => panic!("expected dice expression, got {:?}", other),
        };
        let values: Vec<_> = inner.dice.iter().map(|d| d.value()).collect();
        assert_eq!(values, vec![Number::Int(0), Number::Int(0)]);
        assert_eq!(inner.value(), Number::Int(0));
        assert_eq!(outer.dice[1].value(), Number::Int(6));
    }

    #[test]
    fn test_compound_overflow_falls_back_to_float() {
        let result = eval_with("1d9223372036854775807!!>2", FixedRoller(0.5)).unwrap();
        assert!(matches!(result.value(), Number::Float(x) if x > Int::MAX as Float));
    }

    #[test]
    fn test_labels_are_copied() {
        let result = eval_with("1d20+5 Roll for Initiative", FixedRoller(0.0)).unwrap();
        assert_eq!(result.label(), Some("Roll for Initiative"));
        assert_eq!(result.value(), Number::Int(6));

        check_int("1d20+5 \\ +5 Roll for Initiative", 6);
        check_int("2d20+5[Fire Damage] + 3d6+5[Ice Damage]", 15);
        check_int("2d10+2d6[crit]+5 Critical Hit!", 9);
    }

    #[test]
    fn test_tail_order_is_op_index() {
        let result = eval_with("1 + 2 + 3", FixedRoller(0.0)).unwrap();
        let orders: Vec<_> = match &result {
            RollResult::DiceExpression(e) => e.dice.iter().map(|d| d.order()).collect(),
            other => panic!("expected dice expression, got {:?}", other),
        };
        assert_eq!(orders, vec![0, 0, 1]);
    }

    #[test]
    fn test_err_limits() {
        check_err(
            "1001d6",
            RollError::LimitExceeded {
                requested: Number::Int(1001),
                max: 1000,
            },
        );
        check_err("2d0", RollError::InvalidDieSize(Number::Int(0)));
        check_err("1 / 0", RollError::ZeroDivision);
        check_err("1 % (1 - 1)", RollError::ZeroModulo);
    }

    #[test]
    fn test_zero_and_negative_counts_roll_nothing() {
        check_int("0d6", 0);
        check_int("(1-3)d6", 0);
    }
}
