use super::{ast::*, lexer::*};
use crate::common::*;
use std::fmt;
use std::ops::Range;

type PResult<T = Node> = Result<T, ParseError>;

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("error at position {} ({slice:?}): {kind}", .span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub slice: String,
}

#[derive(Debug, PartialEq)]
pub enum ParseErrorKind {
    UnexpectedToken {
        found: Option<TokenKind>,
        expected: Vec<TokenKind>,
    },
    UnexpectedString {
        expected: Vec<TokenKind>,
    },
    InvalidNumber,
    InvalidGroupModifier(TokenKind),
    DuplicateModifier(TokenKind),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken {
                found: Some(found),
                expected,
            } => {
                write!(f, "unexpected token: found {}, expected ", found)?;
                fmt_expected(expected, f)
            }
            Self::UnexpectedToken {
                found: None,
                expected,
            } => {
                write!(f, "unexpected end of input, expected ")?;
                fmt_expected(expected, f)
            }
            Self::UnexpectedString { expected } => {
                write!(f, "expected ")?;
                fmt_expected(expected, f)
            }
            Self::InvalidNumber => write!(f, "number is out of range"),
            Self::InvalidGroupModifier(kind) => {
                write!(f, "{} can only be used with dice, not groups", kind)
            }
            Self::DuplicateModifier(kind) => {
                write!(f, "{} cannot be applied twice to the same roll", kind)
            }
        }
    }
}

fn fmt_expected(expected: &[TokenKind], f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let len = expected.len();

    if expected.is_empty() {
        Ok(())
    } else if len == 1 {
        f.write_str(expected[0].as_str())
    } else if len == 2 {
        write!(f, "{} or {}", expected[0], expected[1])
    } else {
        for exp in &expected[..len - 1] {
            write!(f, "{}, ", exp)?;
        }
        write!(f, "or {}", expected[len - 1])
    }
}

/// Recursive-descent parser over a pre-lexed token list.
///
/// Dice and their modifiers must be written without whitespace in between (`4d6kh3`); whatever
/// cannot be parsed after a complete expression becomes the label of the root node, so
/// `1d20+5 Roll for Initiative` is a valid roll.
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    const UNIT_START: &'static [TokenKind] = &[
        TokenKind::Integer,
        TokenKind::Decimal,
        TokenKind::Minus,
        TokenKind::LeftParen,
        TokenKind::InlineOpen,
        TokenKind::LeftBrace,
        TokenKind::D,
        TokenKind::Floor,
        TokenKind::Ceil,
        TokenKind::Round,
        TokenKind::Abs,
    ];

    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    pub fn parse(mut self) -> PResult {
        let mut root = self.parse_additive()?;

        if let Some(token) = self.tokens.get(self.pos) {
            let text = self.source[token.span.start..].trim();
            if let Some(slot) = root.label_mut() {
                match slot {
                    Some(label) => {
                        label.push(' ');
                        label.push_str(text);
                    }
                    None => *slot = Some(text.to_owned()),
                }
            }
        }

        Ok(root)
    }

    fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    /// Peeks the next token only if it directly follows the previous one.
    fn peek_adjacent(&self) -> Option<TokenKind> {
        let prev_end = self.pos.checked_sub(1).map(|i| self.tokens[i].span.end)?;
        self.tokens
            .get(self.pos)
            .filter(|t| t.span.start == prev_end)
            .map(|t| t.kind)
    }

    fn adjacent(&self, kind: TokenKind) -> bool {
        self.peek_adjacent() == Some(kind)
    }

    fn adjacent_any(&self, options: &[TokenKind]) -> bool {
        self.peek_adjacent()
            .map_or(false, |peeked| options.contains(&peeked))
    }

    fn matches(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn matches_any(&self, options: &[TokenKind]) -> bool {
        self.peek().map_or(false, |peeked| options.contains(&peeked))
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn consume(&mut self, expected: TokenKind) -> PResult<Token> {
        if self.matches(expected) {
            self.advance()
                .map_or_else(|| self.unexpected_token(vec![expected]), Ok)
        } else {
            self.unexpected_token(vec![expected])
        }
    }

    fn slice(&self, span: &Range<usize>) -> &'a str {
        &self.source[span.clone()]
    }

    fn error<T>(&self, kind: ParseErrorKind, span: Range<usize>) -> PResult<T> {
        Err(ParseError {
            kind,
            slice: self.slice(&span).to_string(),
            span,
        })
    }

    fn unexpected_token<T>(&mut self, expected: Vec<TokenKind>) -> PResult<T> {
        match self.advance() {
            None => {
                let end = self.source.len();
                self.error(
                    ParseErrorKind::UnexpectedToken {
                        found: None,
                        expected,
                    },
                    end..end,
                )
            }
            Some(Token {
                kind: TokenKind::Error,
                span,
            }) => self.error(ParseErrorKind::UnexpectedString { expected }, span),
            Some(Token { kind, span }) => self.error(
                ParseErrorKind::UnexpectedToken {
                    found: Some(kind),
                    expected,
                },
                span,
            ),
        }
    }

    fn parse_additive(&mut self) -> PResult {
        let head = self.parse_multiplication()?;

        let mut ops = Vec::new();
        while let Some(op) = self.peek().and_then(|k| k.as_dice_op()) {
            self.advance();
            let tail = self.parse_multiplication()?;
            ops.push(Op { op, tail });
        }

        Ok(if ops.is_empty() {
            head
        } else {
            Node::DiceExpression(Chain::new(head, ops))
        })
    }

    fn parse_multiplication(&mut self) -> PResult {
        let head = self.parse_power()?;

        let mut ops = Vec::new();
        while self.matches_any(TokenKind::MULTIPLICATION_OPS) {
            let op = self.advance().and_then(|t| t.kind.as_math_op());
            let tail = self.parse_power()?;
            ops.extend(op.map(|op| Op { op, tail }));
        }

        Ok(if ops.is_empty() {
            head
        } else {
            Node::Expression(Chain::new(head, ops))
        })
    }

    fn parse_power(&mut self) -> PResult {
        let head = self.parse_unit()?;

        let mut ops = Vec::new();
        while self.matches(TokenKind::StarStar) {
            self.advance();
            let tail = self.parse_unit()?;
            ops.push(Op {
                op: MathOp::Pow,
                tail,
            });
        }

        Ok(if ops.is_empty() {
            head
        } else {
            Node::Expression(Chain::new(head, ops))
        })
    }

    fn parse_unit(&mut self) -> PResult {
        let unit = match self.peek() {
            Some(TokenKind::Integer) => {
                let number = self.parse_number()?;
                self.parse_dice_if_adjacent(number)?
            }
            Some(TokenKind::Decimal | TokenKind::Minus) => {
                let number = self.parse_number()?;
                // Only a plain integer or a bracketed expression can count dice.
                if self.adjacent(TokenKind::D) {
                    return self.unexpected_token(TokenKind::ADDITION_OPS.to_vec());
                }
                number
            }
            Some(TokenKind::LeftParen) => {
                let inner = self.parse_parenthesized()?;
                self.parse_dice_if_adjacent(inner)?
            }
            Some(TokenKind::InlineOpen) => {
                let inline = self.parse_inline()?;
                self.parse_dice_if_adjacent(inline)?
            }
            Some(TokenKind::LeftBrace) => self.parse_group()?,
            Some(TokenKind::D) => self.parse_dice(Node::int(1))?,
            Some(kind) if TokenKind::FUNCTIONS.contains(&kind) => self.parse_function()?,
            _ => return self.unexpected_token(Self::UNIT_START.to_vec()),
        };

        let mut labels = Vec::new();
        while self.matches(TokenKind::Label) {
            labels.push(self.parse_label()?);
        }

        Ok(if labels.is_empty() {
            unit
        } else {
            unit.with_label(labels.join(" "))
        })
    }

    fn parse_label(&mut self) -> PResult<&'a str> {
        let token = self.consume(TokenKind::Label)?;
        let slice = self.slice(&token.span);
        Ok(&slice[1..slice.len() - 1])
    }

    fn parse_number(&mut self) -> PResult {
        let negative = self.matches(TokenKind::Minus);
        if negative {
            self.advance();
        }

        let token = match self.peek() {
            Some(TokenKind::Integer | TokenKind::Decimal) => self.advance(),
            _ => None,
        };
        let Some(token) = token else {
            return self.unexpected_token(vec![TokenKind::Integer, TokenKind::Decimal]);
        };

        let slice = self.slice(&token.span);
        let node = match token.kind {
            TokenKind::Integer => match slice.parse::<Int>() {
                Ok(x) => Node::int(if negative { -x } else { x }),
                Err(_) => return self.error(ParseErrorKind::InvalidNumber, token.span),
            },
            _ => match slice.parse::<Float>() {
                Ok(x) => Node::float(if negative { -x } else { x }),
                Err(_) => return self.error(ParseErrorKind::InvalidNumber, token.span),
            },
        };
        Ok(node)
    }

    fn parse_parenthesized(&mut self) -> PResult {
        self.consume(TokenKind::LeftParen)?;
        let inner = self.parse_additive()?;
        self.consume(TokenKind::RightParen)?;
        Ok(inner)
    }

    fn parse_inline(&mut self) -> PResult {
        self.consume(TokenKind::InlineOpen)?;
        let inner = self.parse_additive()?;
        self.consume(TokenKind::InlineClose)?;
        Ok(Node::inline(inner))
    }

    fn parse_function(&mut self) -> PResult {
        let op = self.advance().and_then(|t| t.kind.as_math_fn());
        let Some(op) = op else {
            return self.unexpected_token(TokenKind::FUNCTIONS.to_vec());
        };
        let expr = self.parse_parenthesized()?;
        Ok(Node::math_function(op, expr))
    }

    /// An operand of a modifier, which has to follow it directly.
    fn parse_operand(&mut self) -> PResult {
        match self.peek_adjacent() {
            Some(TokenKind::Integer | TokenKind::Decimal | TokenKind::Minus) => self.parse_number(),
            Some(TokenKind::LeftParen) => self.parse_parenthesized(),
            Some(TokenKind::InlineOpen) => self.parse_inline(),
            _ => self.unexpected_token(TokenKind::OPERAND_START.to_vec()),
        }
    }

    fn parse_compare(&mut self) -> Option<CompareOp> {
        let op = self.peek_adjacent().and_then(|k| k.as_compare_op());
        if op.is_some() {
            self.advance();
        }
        op
    }

    fn parse_dice_if_adjacent(&mut self, count: Node) -> PResult {
        if self.adjacent(TokenKind::D) {
            self.parse_dice(count)
        } else {
            Ok(count)
        }
    }

    fn parse_dice(&mut self, count: Node) -> PResult {
        self.consume(TokenKind::D)?;

        let die = match self.peek_adjacent() {
            Some(TokenKind::Integer) => Sides::Numeric(Box::new(self.parse_number()?)),
            Some(TokenKind::Fate) => {
                self.advance();
                Sides::Fate(FateMarker::Fate)
            }
            Some(TokenKind::LeftParen) => Sides::Numeric(Box::new(self.parse_parenthesized()?)),
            Some(TokenKind::InlineOpen) => Sides::Numeric(Box::new(self.parse_inline()?)),
            _ => {
                return self.unexpected_token(vec![
                    TokenKind::Integer,
                    TokenKind::Fate,
                    TokenKind::LeftParen,
                    TokenKind::InlineOpen,
                ])
            }
        };

        let mut roll = FullRoll::new(count, die);
        self.parse_roll_mods(&mut roll)?;
        Ok(Node::Die(roll))
    }

    fn parse_roll_mods(&mut self, roll: &mut FullRoll) -> PResult<()> {
        while let Some(kind) = self.peek_adjacent() {
            match kind {
                TokenKind::Explode => {
                    self.advance();
                    roll.mods.push(Modifier::Explode(self.parse_reroll()?));
                }
                TokenKind::Compound => {
                    self.advance();
                    roll.mods.push(Modifier::Compound(self.parse_reroll()?));
                }
                TokenKind::Penetrate => {
                    self.advance();
                    roll.mods.push(Modifier::Penetrate(self.parse_reroll()?));
                }
                TokenKind::Reroll => {
                    self.advance();
                    roll.mods.push(Modifier::Reroll(self.parse_reroll()?));
                }
                TokenKind::RerollOnce => {
                    self.advance();
                    roll.mods.push(Modifier::RerollOnce(self.parse_reroll()?));
                }
                TokenKind::Keep | TokenKind::D => roll.mods.push(self.parse_keep_drop()?),
                TokenKind::Greater | TokenKind::Less | TokenKind::Equal => {
                    roll.targets.push(Modifier::Success(self.parse_condition()?));
                }
                TokenKind::Failure => {
                    self.advance();
                    roll.targets.push(Modifier::Failure(self.parse_condition()?));
                }
                TokenKind::CritSuccess => {
                    self.advance();
                    roll.targets.push(Modifier::Crit(self.parse_condition()?));
                }
                TokenKind::CritFailure => {
                    self.advance();
                    roll.targets.push(Modifier::Critfail(self.parse_condition()?));
                }
                TokenKind::Match | TokenKind::MatchCount => {
                    if roll.matches.is_some() {
                        return self.duplicate_modifier(kind);
                    }
                    roll.matches = Some(self.parse_match()?);
                }
                TokenKind::Sort | TokenKind::SortAsc | TokenKind::SortDesc => {
                    if roll.sort.is_some() {
                        return self.duplicate_modifier(kind);
                    }
                    self.advance();
                    roll.sort = Some(SortMod {
                        asc: kind != TokenKind::SortDesc,
                    });
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn duplicate_modifier<T>(&self, kind: TokenKind) -> PResult<T> {
        let span = self.tokens[self.pos].span.clone();
        self.error(ParseErrorKind::DuplicateModifier(kind), span)
    }

    /// `!`, `r` and friends take an optional target; a bare operand means "equal to".
    fn parse_reroll(&mut self) -> PResult<ReRoll> {
        if let Some(compare) = self.parse_compare() {
            let value = self.parse_operand()?;
            Ok(ReRoll::new(Some((compare, value))))
        } else if self.adjacent_any(TokenKind::OPERAND_START) {
            let value = self.parse_operand()?;
            Ok(ReRoll::new(Some((CompareOp::Equal, value))))
        } else {
            Ok(ReRoll::default())
        }
    }

    fn parse_condition(&mut self) -> PResult<Condition> {
        let compare = self.parse_compare().unwrap_or(CompareOp::Equal);
        let expr = self.parse_operand()?;
        Ok(Condition::new(compare, expr))
    }

    fn parse_keep_drop(&mut self) -> PResult<Modifier> {
        let keep = self.advance().map_or(false, |t| t.kind == TokenKind::Keep);

        let highlow = match self.peek_adjacent() {
            Some(TokenKind::High) => Some(HighLow::High),
            Some(TokenKind::Low) => Some(HighLow::Low),
            _ => None,
        };
        if highlow.is_some() {
            self.advance();
        }

        let expr = if self.adjacent_any(TokenKind::OPERAND_START) {
            self.parse_operand()?
        } else {
            Node::int(1)
        };

        let kd = KeepDrop::new(highlow, expr);
        Ok(if keep {
            Modifier::Keep(kd)
        } else {
            Modifier::Drop(kd)
        })
    }

    fn parse_match(&mut self) -> PResult<MatchMod> {
        let count = self
            .advance()
            .map_or(false, |t| t.kind == TokenKind::MatchCount);

        let min = if self.adjacent(TokenKind::Integer) {
            self.parse_number()?
        } else {
            Node::int(2)
        };

        let (compare, expr) = match self.parse_compare() {
            Some(compare) => (Some(compare), Some(Box::new(self.parse_operand()?))),
            None => (None, None),
        };

        Ok(MatchMod {
            min: Box::new(min),
            count,
            compare,
            expr,
        })
    }

    fn parse_group(&mut self) -> PResult {
        self.consume(TokenKind::LeftBrace)?;
        let mut rolls = vec1![self.parse_additive()?];
        while self.matches(TokenKind::Comma) {
            self.advance();
            rolls.push(self.parse_additive()?);
        }
        self.consume(TokenKind::RightBrace)?;

        let mut mods = Vec::new();
        while let Some(kind) = self.peek_adjacent() {
            match kind {
                TokenKind::Keep | TokenKind::D => mods.push(self.parse_keep_drop()?),
                TokenKind::Greater | TokenKind::Less | TokenKind::Equal => {
                    mods.push(Modifier::Success(self.parse_condition()?));
                }
                TokenKind::Failure => {
                    self.advance();
                    mods.push(Modifier::Failure(self.parse_condition()?));
                }
                kind if TokenKind::DICE_ONLY_MODS.contains(&kind) => {
                    let span = self.tokens[self.pos].span.clone();
                    return self.error(ParseErrorKind::InvalidGroupModifier(kind), span);
                }
                _ => break,
            }
        }

        Ok(Node::Group(Group {
            rolls,
            mods,
            label: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! dice {
        ($num:expr, $size:expr $(; $($op:expr),+)?) => {
            Node::Die(FullRoll {
                mods: vec![$($($op),+)?],
                ..FullRoll::new(Node::int($num), Sides::faces($size))
            })
        };
    }

    fn parse(s: &str) -> PResult {
        Parser::new(s).parse()
    }

    fn check(s: &str, expected: Node) {
        let parsed = parse(s).unwrap();
        assert_eq!(parsed, expected);
    }

    fn check_err(s: &str, expected: ParseErrorKind) {
        let err = parse(s).unwrap_err();
        assert_eq!(err.kind, expected);
    }

    fn roll_of(node: Node) -> FullRoll {
        match node {
            Node::Die(roll) => roll,
            other => panic!("expected a die, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_nums() {
        check("32", Node::int(32));
        check("3.25", Node::float(3.25));
        check("-7", Node::int(-7));
    }

    #[test]
    fn test_parse_dice() {
        check("1d20", dice!(1, 20));
        check("d4", dice!(1, 4));
        check(
            "4dF",
            Node::Die(FullRoll::new(Node::int(4), Sides::Fate(FateMarker::Fate))),
        );
        check(
            "2d20kh1",
            dice!(2, 20; Modifier::Keep(KeepDrop::new(Some(HighLow::High), Node::int(1)))),
        );
        check(
            "8d100d3",
            dice!(8, 100; Modifier::Drop(KeepDrop::new(None, Node::int(3)))),
        );
        check(
            "2d8ro1r>7",
            dice!(2, 8;
                Modifier::RerollOnce(ReRoll::new(Some((CompareOp::Equal, Node::int(1))))),
                Modifier::Reroll(ReRoll::new(Some((CompareOp::AtLeast, Node::int(7)))))),
        );
        check("3d6!", dice!(3, 6; Modifier::Explode(ReRoll::default())));
    }

    #[test]
    fn test_parse_dynamic_count() {
        let roll = roll_of(parse("[[2d6]]d5").unwrap());
        assert_eq!(*roll.count, Node::inline(dice!(2, 6)));
        assert_eq!(roll.die, Sides::faces(5));

        let roll = roll_of(parse("(1+1)d6").unwrap());
        assert!(matches!(*roll.count, Node::DiceExpression(_)));
    }

    #[test]
    fn test_parse_targets_keep_written_order() {
        let roll = roll_of(parse("10d6<4f>5cs6").unwrap());
        assert_eq!(
            roll.targets,
            vec![
                Modifier::Success(Condition::new(CompareOp::AtMost, Node::int(4))),
                Modifier::Failure(Condition::new(CompareOp::AtLeast, Node::int(5))),
                Modifier::Crit(Condition::new(CompareOp::Equal, Node::int(6))),
            ]
        );
        assert!(roll.mods.is_empty());

        let roll = roll_of(parse("4d6>4kh3").unwrap());
        assert_eq!(roll.mods.len(), 1);
        assert_eq!(roll.targets.len(), 1);
    }

    #[test]
    fn test_parse_match_and_sort() {
        let roll = roll_of(parse("4d6mt3>2sd").unwrap());
        let matches = roll.matches.unwrap();
        assert!(matches.count);
        assert_eq!(*matches.min, Node::int(3));
        assert_eq!(matches.compare, Some(CompareOp::AtLeast));
        assert_eq!(matches.expr, Some(Box::new(Node::int(2))));
        assert_eq!(roll.sort, Some(SortMod { asc: false }));

        let roll = roll_of(parse("4d6m").unwrap());
        let matches = roll.matches.unwrap();
        assert!(!matches.count);
        assert_eq!(*matches.min, Node::int(2));
    }

    #[test]
    fn test_parse_expressions() {
        check(
            "5+3",
            Node::DiceExpression(Chain::new(
                Node::int(5),
                vec![Op {
                    op: DiceOp::Add,
                    tail: Node::int(3),
                }],
            )),
        );
        check(
            "1 + 2 * 3",
            Node::DiceExpression(Chain::new(
                Node::int(1),
                vec![Op {
                    op: DiceOp::Add,
                    tail: Node::Expression(Chain::new(
                        Node::int(2),
                        vec![Op {
                            op: MathOp::Mul,
                            tail: Node::int(3),
                        }],
                    )),
                }],
            )),
        );
        check(
            "3 ** 2",
            Node::Expression(Chain::new(
                Node::int(3),
                vec![Op {
                    op: MathOp::Pow,
                    tail: Node::int(2),
                }],
            )),
        );
        check(
            "floor(7/2)",
            Node::math_function(
                MathFn::Floor,
                Node::Expression(Chain::new(
                    Node::int(7),
                    vec![Op {
                        op: MathOp::Div,
                        tail: Node::int(2),
                    }],
                )),
            ),
        );
    }

    #[test]
    fn test_parse_group() {
        check(
            "{4d6,3d8}kh1",
            Node::Group(Group {
                rolls: vec1![dice!(4, 6), dice!(3, 8)],
                mods: vec![Modifier::Keep(KeepDrop::new(
                    Some(HighLow::High),
                    Node::int(1),
                ))],
                label: None,
            }),
        );
        check(
            "{3d6+1}<3",
            Node::Group(Group {
                rolls: vec1![Node::DiceExpression(Chain::new(
                    dice!(3, 6),
                    vec![Op {
                        op: DiceOp::Add,
                        tail: Node::int(1),
                    }]
                ))],
                mods: vec![Modifier::Success(Condition::new(
                    CompareOp::AtMost,
                    Node::int(3),
                ))],
                label: None,
            }),
        );
    }

    #[test]
    fn test_parse_labels() {
        check("2d6[crit]", dice!(2, 6).with_label("crit"));
        check("5[Fire] [Damage]", Node::int(5).with_label("Fire Damage"));
        check(
            "1d20 Roll for Initiative",
            dice!(1, 20).with_label("Roll for Initiative"),
        );
        let root = parse("1d20+5 \\ +5 Roll for Initiative").unwrap();
        assert_eq!(root.label(), Some("\\ +5 Roll for Initiative"));
    }

    #[test]
    fn test_modifiers_must_be_adjacent() {
        check("d20 for fun", dice!(1, 20).with_label("for fun"));
        check("3d6 k2", dice!(3, 6).with_label("k2"));
    }

    #[test]
    fn test_parse_errors() {
        check_err(
            "1 +",
            ParseErrorKind::UnexpectedToken {
                found: None,
                expected: Parser::UNIT_START.to_vec(),
            },
        );
        check_err(
            "?roll",
            ParseErrorKind::UnexpectedString {
                expected: Parser::UNIT_START.to_vec(),
            },
        );
        check_err("{2d6}!", ParseErrorKind::InvalidGroupModifier(TokenKind::Explode));
        check_err("4d6msm", ParseErrorKind::DuplicateModifier(TokenKind::Match));
        check_err("4d6sasd", ParseErrorKind::DuplicateModifier(TokenKind::SortDesc));
        check_err("99999999999999999999", ParseErrorKind::InvalidNumber);
    }

    #[test]
    fn test_negative_or_fractional_count_is_rejected() {
        let expected = ParseErrorKind::UnexpectedToken {
            found: Some(TokenKind::D),
            expected: TokenKind::ADDITION_OPS.to_vec(),
        };
        check_err("-2d6", expected);

        let err = parse("2.5d6").unwrap_err();
        assert_eq!(err.span, 3..4);
        assert_eq!(err.slice, "d");

        check(
            "-2 - 2d6",
            Node::DiceExpression(Chain::new(
                Node::int(-2),
                vec![Op {
                    op: DiceOp::Sub,
                    tail: dice!(2, 6),
                }],
            )),
        );
    }

    #[test]
    fn test_error_span() {
        let err = parse("2 + {1d6").unwrap_err();
        assert_eq!(err.span, 8..8);

        let err = parse("{2d6}r").unwrap_err();
        assert_eq!(err.span, 5..6);
        assert_eq!(err.slice, "r");
    }
}
