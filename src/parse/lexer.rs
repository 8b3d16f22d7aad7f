use crate::common::*;
use logos::Logos;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Lexes the whole input up front; the parser needs to see where each token starts and ends to
/// tell modifiers apart from trailing text.
pub fn tokenize(s: &str) -> Vec<Token> {
    TokenKind::lexer(s)
        .spanned()
        .map(|(kind, span)| Token { kind, span })
        .collect()
}

#[derive(Logos, Debug, Copy, Clone, Eq, PartialEq)]
pub enum TokenKind {
    #[regex(r"[0-9]+")]
    Integer,
    #[regex(r"[0-9]+\.[0-9]+")]
    Decimal,

    #[token("d")]
    D,
    #[token("F")]
    Fate,

    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(",")]
    Comma,
    #[token("[[")]
    InlineOpen,
    #[token("]]")]
    InlineClose,
    #[regex(r"\[[^\[\]]+\]")]
    Label,

    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("**")]
    StarStar,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[token(">")]
    Greater,
    #[token("<")]
    Less,
    #[token("=")]
    Equal,

    #[token("k")]
    Keep,
    #[token("h")]
    High,
    #[token("l")]
    Low,
    #[token("!")]
    Explode,
    #[token("!!")]
    Compound,
    #[token("!p")]
    Penetrate,
    #[token("r")]
    Reroll,
    #[token("ro")]
    RerollOnce,
    #[token("f")]
    Failure,
    #[token("cs")]
    CritSuccess,
    #[token("cf")]
    CritFailure,
    #[token("m")]
    Match,
    #[token("mt")]
    MatchCount,
    #[token("s")]
    Sort,
    #[token("sa")]
    SortAsc,
    #[token("sd")]
    SortDesc,

    #[token("floor")]
    Floor,
    #[token("ceil")]
    Ceil,
    #[token("round")]
    Round,
    #[token("abs")]
    Abs,

    #[regex(r"[ \t\r\n]+", logos::skip)]
    #[error]
    Error,
}

impl TokenKind {
    pub const ADDITION_OPS: &'static [Self] = &[Self::Plus, Self::Minus];

    pub const MULTIPLICATION_OPS: &'static [Self] = &[Self::Star, Self::Slash, Self::Percent];

    pub const COMPARISON_OPS: &'static [Self] = &[Self::Greater, Self::Less, Self::Equal];

    pub const FUNCTIONS: &'static [Self] = &[Self::Floor, Self::Ceil, Self::Round, Self::Abs];

    pub const OPERAND_START: &'static [Self] = &[
        Self::Integer,
        Self::Decimal,
        Self::Minus,
        Self::LeftParen,
        Self::InlineOpen,
    ];

    /// Modifiers that only make sense on a single die specification.
    pub const DICE_ONLY_MODS: &'static [Self] = &[
        Self::Explode,
        Self::Compound,
        Self::Penetrate,
        Self::Reroll,
        Self::RerollOnce,
        Self::CritSuccess,
        Self::CritFailure,
        Self::Match,
        Self::MatchCount,
        Self::Sort,
        Self::SortAsc,
        Self::SortDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        use TokenKind::*;

        match self {
            Integer => "<integer>",
            Decimal => "<decimal>",
            D => "'d'",
            Fate => "'F'",
            LeftParen => "'('",
            RightParen => "')'",
            LeftBrace => "'{'",
            RightBrace => "'}'",
            Comma => "','",
            InlineOpen => "'[['",
            InlineClose => "']]'",
            Label => "<label>",
            Plus => "'+'",
            Minus => "'-'",
            Star => "'*'",
            StarStar => "'**'",
            Slash => "'/'",
            Percent => "'%'",
            Greater => "'>'",
            Less => "'<'",
            Equal => "'='",
            Keep => "'k'",
            High => "'h'",
            Low => "'l'",
            Explode => "'!'",
            Compound => "'!!'",
            Penetrate => "'!p'",
            Reroll => "'r'",
            RerollOnce => "'ro'",
            Failure => "'f'",
            CritSuccess => "'cs'",
            CritFailure => "'cf'",
            Match => "'m'",
            MatchCount => "'mt'",
            Sort => "'s'",
            SortAsc => "'sa'",
            SortDesc => "'sd'",
            Floor => "'floor'",
            Ceil => "'ceil'",
            Round => "'round'",
            Abs => "'abs'",
            Error => "<error>",
        }
    }

    pub fn as_dice_op(&self) -> Option<DiceOp> {
        Some(match self {
            Self::Plus => DiceOp::Add,
            Self::Minus => DiceOp::Sub,
            _ => return None,
        })
    }

    pub fn as_math_op(&self) -> Option<MathOp> {
        Some(match self {
            Self::Star => MathOp::Mul,
            Self::Slash => MathOp::Div,
            Self::Percent => MathOp::Rem,
            Self::StarStar => MathOp::Pow,
            _ => return None,
        })
    }

    pub fn as_compare_op(&self) -> Option<CompareOp> {
        Some(match self {
            Self::Greater => CompareOp::AtLeast,
            Self::Less => CompareOp::AtMost,
            Self::Equal => CompareOp::Equal,
            _ => return None,
        })
    }

    pub fn as_math_fn(&self) -> Option<MathFn> {
        Some(match self {
            Self::Floor => MathFn::Floor,
            Self::Ceil => MathFn::Ceil,
            Self::Round => MathFn::Round,
            Self::Abs => MathFn::Abs,
            _ => return None,
        })
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
