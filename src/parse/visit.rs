use crate::common::*;
use crate::parse::ast;

pub trait AstVisitor {
    type Output;

    fn visit<T: ?Sized>(&mut self, node: &T) -> Self::Output
    where
        T: Accept<Self>,
    {
        node.accept(self)
    }

    fn visit_number(&mut self, x: &ast::NumberNode) -> Self::Output;

    fn visit_inline(&mut self, x: &ast::Inline) -> Self::Output;

    fn visit_die(&mut self, roll: &ast::FullRoll) -> Self::Output;

    fn visit_group(&mut self, group: &ast::Group) -> Self::Output;

    fn visit_dice_expression(&mut self, chain: &ast::Chain<DiceOp>) -> Self::Output;

    fn visit_expression(&mut self, chain: &ast::Chain<MathOp>) -> Self::Output;

    fn visit_math_function(&mut self, f: &ast::MathFunction) -> Self::Output;

    fn visit_unsupported(&mut self) -> Self::Output;
}

pub trait Accept<V: AstVisitor + ?Sized> {
    fn accept(&self, v: &mut V) -> V::Output;
}

impl<V: AstVisitor + ?Sized> Accept<V> for ast::Node {
    fn accept(&self, v: &mut V) -> V::Output {
        match self {
            Self::Number(x) => v.visit_number(x),
            Self::Inline(x) => v.visit_inline(x),
            Self::Die(x) => v.visit_die(x),
            Self::Group(x) => v.visit_group(x),
            Self::DiceExpression(x) => v.visit_dice_expression(x),
            Self::Expression(x) => v.visit_expression(x),
            Self::MathFunction(x) => v.visit_math_function(x),
            Self::Unsupported => v.visit_unsupported(),
        }
    }
}
