use super::tree::*;

pub trait VisitRoll {
    type Output;

    fn visit<A: AcceptRoll>(&mut self, a: &A) -> Self::Output {
        a.accept(self)
    }

    fn visit_number(&mut self, x: &NumberRoll) -> Self::Output;

    fn visit_dice(&mut self, x: &DiceRoll) -> Self::Output;

    fn visit_die(&mut self, x: &DieRoll) -> Self::Output;

    fn visit_dice_expression(&mut self, x: &DiceExpressionRoll) -> Self::Output;

    fn visit_expression(&mut self, x: &ExpressionRoll) -> Self::Output;

    fn visit_group(&mut self, x: &GroupRoll) -> Self::Output;

    fn visit_math_function(&mut self, x: &MathFunctionRoll) -> Self::Output;
}

#[enum_dispatch::enum_dispatch]
pub trait AcceptRoll: Sized + Eval {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output;
}

impl AcceptRoll for NumberRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_number(self)
    }
}

impl AcceptRoll for DiceRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_dice(self)
    }
}

impl AcceptRoll for DieRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_die(self)
    }
}

impl AcceptRoll for DiceExpressionRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_dice_expression(self)
    }
}

impl AcceptRoll for ExpressionRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_expression(self)
    }
}

impl AcceptRoll for GroupRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_group(self)
    }
}

impl AcceptRoll for MathFunctionRoll {
    fn accept<V: VisitRoll + ?Sized>(&self, v: &mut V) -> V::Output {
        v.visit_math_function(self)
    }
}
