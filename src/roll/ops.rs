use super::{error::RollError, num::Number, roller::Roller, tree::*, RResult, RollContext};
use crate::common::*;
use crate::parse::ast::{Condition, KeepDrop, MatchMod, Modifier, ReRoll, SortMod};
use std::collections::{BTreeMap, BTreeSet};

/// Upper bound on how many dice a single explode or compound chain may add.
const MAX_CHAIN: usize = 1000;

/// A resolved comparison against the raw face of a die.
#[derive(Debug, Copy, Clone)]
struct Predicate {
    compare: CompareOp,
    target: Number,
}

impl Predicate {
    fn test(&self, roll: Int) -> bool {
        self.compare.test(roll.into(), self.target)
    }
}

impl Modifier {
    /// Applies this modifier to the dice of a single die specification.
    pub(crate) fn operate_dice<R: Roller>(
        &self,
        ctx: &mut RollContext<R>,
        kind: DieKind,
        rolls: &mut Vec<DieRoll>,
    ) -> RResult<()> {
        log::trace!("applying {} to {} dice", self.name(), rolls.len());
        let by_roll = |d: &DieRoll| Number::from(d.roll);

        match self {
            Self::Keep(m) => {
                let n = ctx.eval_value(&m.expr)?;
                keep_n(rolls, m, n, by_roll);
            }
            Self::Drop(m) => {
                let n = ctx.eval_value(&m.expr)?;
                drop_n(rolls, m, n, by_roll);
            }
            Self::Success(c) => {
                let target = ctx.eval_value(&c.expr)?;
                convert(rolls, c, target, 1, by_roll);
            }
            Self::Failure(c) => {
                let target = ctx.eval_value(&c.expr)?;
                convert(rolls, c, target, -1, by_roll);
            }
            Self::Crit(c) => {
                let target = ctx.eval_value(&c.expr)?;
                mark_critical(rolls, c, target, Critical::Success);
            }
            Self::Critfail(c) => {
                let target = ctx.eval_value(&c.expr)?;
                mark_critical(rolls, c, target, Critical::Failure);
            }
            Self::Explode(r) => {
                let pred = r.predicate(ctx, kind, kind.max(), "explode")?;
                explode(ctx, kind, rolls, pred, 0);
            }
            Self::Penetrate(r) => {
                let pred = r.predicate(ctx, kind, kind.max(), "penetrate")?;
                explode(ctx, kind, rolls, pred, 1);
            }
            Self::Compound(r) => {
                let pred = r.predicate(ctx, kind, kind.max(), "compound")?;
                compound(ctx, kind, rolls, pred);
            }
            Self::Reroll(r) => {
                let pred = r.predicate(ctx, kind, 1, "reroll")?;
                reroll(ctx, kind, rolls, pred, false);
            }
            Self::RerollOnce(r) => {
                let pred = r.predicate(ctx, kind, 1, "rerollOnce")?;
                reroll(ctx, kind, rolls, pred, true);
            }
            Self::Unsupported => {
                return Err(RollError::UnsupportedNode("unknown modifier".to_string()))
            }
        }
        Ok(())
    }

    /// Applies this modifier to the members of a group, looking at each member's value.
    pub(crate) fn operate_group<R: Roller, T: Eval>(
        &self,
        ctx: &mut RollContext<R>,
        items: &mut [T],
    ) -> RResult<()> {
        log::trace!("applying {} to a group of {}", self.name(), items.len());
        let by_value = |x: &T| x.value();

        match self {
            Self::Keep(m) => {
                let n = ctx.eval_value(&m.expr)?;
                keep_n(items, m, n, by_value);
            }
            Self::Drop(m) => {
                let n = ctx.eval_value(&m.expr)?;
                drop_n(items, m, n, by_value);
            }
            Self::Success(c) => {
                let target = ctx.eval_value(&c.expr)?;
                convert(items, c, target, 1, by_value);
            }
            Self::Failure(c) => {
                let target = ctx.eval_value(&c.expr)?;
                convert(items, c, target, -1, by_value);
            }
            other => {
                return Err(RollError::UnsupportedNode(format!(
                    "modifier '{}' on a group",
                    other.name()
                )))
            }
        }
        Ok(())
    }
}

impl ReRoll {
    /// Resolves the trigger, refusing any that would match every face of the die.
    fn predicate<R: Roller>(
        &self,
        ctx: &mut RollContext<R>,
        kind: DieKind,
        default: Int,
        modifier: &'static str,
    ) -> RResult<Predicate> {
        let pred = match &self.target {
            Some(t) => Predicate {
                compare: t.compare,
                target: ctx.eval_value(&t.value)?,
            },
            None => Predicate {
                compare: CompareOp::Equal,
                target: default.into(),
            },
        };

        if pred.test(kind.min()) && pred.test(kind.max()) {
            log::debug!("rejecting {} with target {:?}", modifier, pred);
            return Err(RollError::InvalidModifierTarget { modifier });
        }
        Ok(pred)
    }
}

impl MatchMod {
    /// Marks dice whose raw face is shared by enough others. Returns the number of matching
    /// groups when the match counts.
    pub(crate) fn operate<R: Roller>(
        &self,
        ctx: &mut RollContext<R>,
        rolls: &mut [DieRoll],
    ) -> RResult<Option<usize>> {
        let min = ctx.eval_value(&self.min)?;
        let condition = match (self.compare, &self.expr) {
            (Some(compare), Some(expr)) => Some((compare, ctx.eval_value(expr)?)),
            _ => None,
        };

        let mut counts: BTreeMap<Int, Int> = BTreeMap::new();
        for die in rolls.iter() {
            *counts.entry(die.roll).or_insert(0) += 1;
        }

        let matches: BTreeSet<Int> = counts
            .into_iter()
            .filter(|&(_, n)| Number::Int(n) >= min)
            .filter(|&(face, _)| {
                condition.map_or(true, |(compare, target)| compare.test(face.into(), target))
            })
            .map(|(face, _)| face)
            .collect();

        for die in rolls.iter_mut() {
            if matches.contains(&die.roll) {
                die.matched = true;
            }
        }

        Ok(self.count.then(|| matches.len()))
    }
}

impl SortMod {
    pub(crate) fn operate(&self, rolls: &mut [DieRoll]) {
        if self.asc {
            rolls.sort_by_key(|d| d.roll);
        } else {
            rolls.sort_by(|a, b| b.roll.cmp(&a.roll));
        }
        renumber(rolls);
    }
}

fn renumber(rolls: &mut [DieRoll]) {
    for (i, die) in rolls.iter_mut().enumerate() {
        die.outcome.order = i;
    }
}

/// Clamps a requested keep/drop count to the size of the sequence.
fn clamp_count(n: Number, len: usize) -> usize {
    let x = n.as_float();
    if x >= len as Float {
        len
    } else if x >= 1.0 {
        x as usize
    } else {
        0
    }
}

/// Indices of `items` ordered by `lookup`, ascending unless `descending`. Ties keep their
/// original order.
fn ranked<T>(items: &[T], descending: bool, lookup: impl Fn(&T) -> Number) -> Vec<usize> {
    let mut ret: Vec<usize> = (0..items.len()).collect();
    ret.sort_by(|&a, &b| {
        let ord = lookup(&items[a]).total_cmp(&lookup(&items[b]));
        if descending {
            ord.reverse()
        } else {
            ord
        }
    });
    ret
}

/// Keeps `n` of the still-valid items, dropping the lowest first (the highest for `kl`).
fn keep_n<T: Eval>(items: &mut [T], m: &KeepDrop, n: Number, lookup: impl Fn(&T) -> Number) {
    let to_keep = clamp_count(n, items.len());
    let valid = items.iter().filter(|x| x.valid()).count();
    let to_drop = valid.saturating_sub(to_keep);

    let chosen: Vec<_> = ranked(items, m.highlow == Some(HighLow::Low), lookup)
        .into_iter()
        .filter(|&i| items[i].valid())
        .take(to_drop)
        .collect();
    for i in chosen {
        items[i].drop();
    }
}

/// Drops `n` of the still-valid items, the lowest first (the highest for `dh`).
fn drop_n<T: Eval>(items: &mut [T], m: &KeepDrop, n: Number, lookup: impl Fn(&T) -> Number) {
    let to_drop = clamp_count(n, items.len());

    let chosen: Vec<_> = ranked(items, m.highlow == Some(HighLow::High), lookup)
        .into_iter()
        .filter(|&i| items[i].valid())
        .take(to_drop)
        .collect();
    for i in chosen {
        items[i].drop();
    }
}

/// Turns matching items into a success (`delta` 1) or failure (`delta` -1) count. Items already
/// converted stack instead.
fn convert<T: Eval>(
    items: &mut [T],
    c: &Condition,
    target: Number,
    delta: Int,
    lookup: impl Fn(&T) -> Number,
) {
    for item in items.iter_mut().filter(|x| x.valid()) {
        if !c.compare.test(lookup(item), target) {
            continue;
        }

        let outcome = item.outcome_mut();
        if outcome.success {
            outcome.value += Number::Int(delta);
        } else {
            outcome.value = Number::Int(delta);
            outcome.success = true;
        }
    }
}

fn mark_critical(rolls: &mut [DieRoll], c: &Condition, target: Number, kind: Critical) {
    for die in rolls.iter_mut() {
        if !die.valid() || die.success() {
            continue;
        }

        let hit = c.compare.test(die.roll.into(), target);
        if let Face::Numeric { critical, .. } = &mut die.face {
            if hit {
                *critical = Some(kind);
            } else if *critical == Some(kind) {
                *critical = None;
            }
        }
    }
}

/// Chains a new die after every die that meets `pred`. Penetrating dice lose `penalty` from
/// each chained roll, and the reduced roll is what gets tested next.
fn explode<R: Roller>(
    ctx: &mut RollContext<R>,
    kind: DieKind,
    rolls: &mut Vec<DieRoll>,
    pred: Predicate,
    penalty: Int,
) {
    let mut i = 0;
    while i < rolls.len() {
        let mut chained = 0;
        while chained < MAX_CHAIN && pred.test(rolls[i].roll) {
            chained += 1;
            rolls[i].exploded = true;

            let mut next = ctx.roll_die(kind, i + 1);
            if penalty != 0 {
                next.set_roll(next.roll - penalty);
            }
            i += 1;
            rolls.insert(i, next);
        }
        i += 1;
    }
    renumber(rolls);
}

/// Like `explode`, but every chained roll is added onto the die that started the chain.
fn compound<R: Roller>(
    ctx: &mut RollContext<R>,
    kind: DieKind,
    rolls: &mut [DieRoll],
    pred: Predicate,
) {
    for die in rolls.iter_mut() {
        let mut last = die.roll;
        let mut total = Number::from(die.roll);
        let mut chained = 0;
        while chained < MAX_CHAIN && pred.test(last) {
            chained += 1;
            die.exploded = true;
            last = ctx.roll_face(kind);
            total += Number::from(last);
        }
        if chained > 0 {
            die.set_total(total);
        }
    }
}

/// Replaces every die meeting `pred` with a fresh one placed right after it. The replaced die
/// stays in the sequence but no longer counts.
fn reroll<R: Roller>(
    ctx: &mut RollContext<R>,
    kind: DieKind,
    rolls: &mut Vec<DieRoll>,
    pred: Predicate,
    once: bool,
) {
    let mut i = 0;
    while i < rolls.len() {
        let mut rerolled = false;
        while !(once && rerolled) && pred.test(rolls[i].roll) {
            rolls[i].rerolled = true;
            rolls[i].outcome.valid = false;

            let next = ctx.roll_die(kind, i + 1);
            i += 1;
            rolls.insert(i, next);
            rerolled = true;
        }
        i += 1;
    }
    renumber(rolls);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::ast::Node;
    use crate::roll::roller::{FixedRoller, SeqRoller};

    fn numbers(values: &[Int]) -> Vec<NumberRoll> {
        values
            .iter()
            .map(|&x| NumberRoll::new(Number::Int(x)))
            .collect()
    }

    fn valid(items: &[NumberRoll]) -> Vec<bool> {
        items.iter().map(|x| x.valid()).collect()
    }

    fn keep_drop(highlow: Option<HighLow>, n: Int) -> KeepDrop {
        KeepDrop::new(highlow, Node::int(n))
    }

    #[test]
    fn test_keep_breaks_ties_by_position() {
        let mut items = numbers(&[3, 1, 3, 2]);
        keep_n(&mut items, &keep_drop(None, 1), Number::Int(1), |x| x.value());
        assert_eq!(valid(&items), vec![false, false, true, false]);

        let mut items = numbers(&[3, 1, 3, 2]);
        keep_n(&mut items, &keep_drop(Some(HighLow::Low), 2), Number::Int(2), |x| {
            x.value()
        });
        assert_eq!(valid(&items), vec![false, true, false, true]);
    }

    #[test]
    fn test_keep_ignores_dropped_items() {
        let mut items = numbers(&[6, 5, 4, 3]);
        items[0].drop();
        keep_n(&mut items, &keep_drop(None, 2), Number::Int(2), |x| x.value());
        assert_eq!(valid(&items), vec![false, true, true, false]);
    }

    #[test]
    fn test_counts_are_clamped() {
        let mut items = numbers(&[1, 2, 3]);
        drop_n(&mut items, &keep_drop(None, 10), Number::Int(10), |x| x.value());
        assert_eq!(valid(&items), vec![false, false, false]);

        let mut items = numbers(&[1, 2, 3]);
        keep_n(&mut items, &keep_drop(None, -1), Number::Int(-1), |x| x.value());
        assert_eq!(valid(&items), vec![false, false, false]);

        let mut items = numbers(&[1, 2, 3]);
        drop_n(&mut items, &keep_drop(None, -1), Number::Int(-1), |x| x.value());
        assert_eq!(valid(&items), vec![true, true, true]);
    }

    #[test]
    fn test_drop_highest() {
        let mut items = numbers(&[2, 6, 4]);
        drop_n(&mut items, &keep_drop(Some(HighLow::High), 1), Number::Int(1), |x| {
            x.value()
        });
        assert_eq!(valid(&items), vec![true, false, true]);
    }

    #[test]
    fn test_convert_skips_invalid() {
        let mut items = numbers(&[5, 5, 1]);
        items[1].drop();
        let c = Condition::new(CompareOp::AtLeast, Node::int(4));
        convert(&mut items, &c, Number::Int(4), 1, |x| x.value());
        let values: Vec<_> = items.iter().map(|x| x.value()).collect();
        assert_eq!(values, vec![Number::Int(1), Number::Int(5), Number::Int(1)]);
        assert!(items[0].success());
        assert!(!items[2].success());
    }

    #[test]
    fn test_reroll_once_replaces_once() {
        let mut ctx = RollContext::new(1000, FixedRoller(0.0));
        let kind = DieKind::Numeric(6);
        let mut rolls = vec![DieRoll::numeric(6, 1, 0), DieRoll::numeric(6, 3, 1)];
        let pred = Predicate {
            compare: CompareOp::Equal,
            target: Number::Int(1),
        };
        reroll(&mut ctx, kind, &mut rolls, pred, true);

        let faces: Vec<_> = rolls.iter().map(|d| d.roll).collect();
        assert_eq!(faces, vec![1, 1, 3]);
        let orders: Vec<_> = rolls.iter().map(|d| d.order()).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert!(rolls[0].rerolled && !rolls[0].valid());
        assert!(!rolls[1].rerolled && rolls[1].valid());
    }

    #[test]
    fn test_explode_chain_is_capped() {
        let mut ctx = RollContext::new(1000, FixedRoller(0.99));
        let kind = DieKind::Numeric(6);
        let mut rolls = vec![DieRoll::numeric(6, 6, 0)];
        let pred = Predicate {
            compare: CompareOp::Equal,
            target: Number::Int(6),
        };
        explode(&mut ctx, kind, &mut rolls, pred, 0);
        assert_eq!(rolls.len(), MAX_CHAIN + 1);
        assert!(!rolls[MAX_CHAIN].exploded);
    }

    #[test]
    fn test_fate_compound() {
        let mut ctx = RollContext::new(1000, SeqRoller::new(vec![0.99, 0.5]));
        let mut rolls = vec![DieRoll::fate(1, 0)];
        let pred = Predicate {
            compare: CompareOp::Equal,
            target: Number::Int(1),
        };
        compound(&mut ctx, DieKind::Fate, &mut rolls, pred);
        assert_eq!(rolls[0].roll, 2);
        assert_eq!(rolls[0].value(), Number::Int(2));
    }

    #[test]
    fn test_compound_on_huge_die_does_not_overflow() {
        let face = Int::MAX;
        let mut ctx = RollContext::new(1000, FixedRoller(0.5));
        let kind = DieKind::Numeric(face);
        let mut rolls = vec![ctx.roll_die(kind, 0)];
        let pred = Predicate {
            compare: CompareOp::AtLeast,
            target: Number::Int(2),
        };
        compound(&mut ctx, kind, &mut rolls, pred);

        assert!(rolls[0].exploded);
        assert!(matches!(rolls[0].value(), Number::Float(x) if x > face as Float));
        assert_eq!(rolls[0].roll, Int::MAX);
    }
}
