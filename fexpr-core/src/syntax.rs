#![allow(clippy::result_large_err)]

use std::sync::LazyLock;

use from_pest::{ConversionError, FromPest, Void};
use pest::{
    Parser, Span,
    iterators::{Pair, Pairs},
    pratt_parser::{Assoc, Op, PrattParser},
};
use pest_ast::FromPest;
use pest_derive::Parser;
use thiserror::Error;

#[derive(Parser)]
#[grammar = "expr.pest"]
pub struct ExprParser;

fn span_into_str(span: Span) -> &str {
    span.as_str()
}

/// Names the grammar claims for itself; they can never serve as identifiers
/// or parameter names.
pub const RESERVED: &[&str] = &["true", "false"];

pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let starts_well = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    starts_well
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.contains(&name)
}

#[derive(Clone, Debug, FromPest, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[pest_ast(rule(Rule::ident))]
pub struct Ident(#[pest_ast(outer(with(span_into_str), with(str::to_string)))] pub String);

impl From<&str> for Ident {
    fn from(value: &str) -> Self {
        Ident(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl<'pest> FromPest<'pest> for Literal {
    type Rule = Rule;
    type FatalError = Void;

    fn from_pest(
        pest: &mut Pairs<'pest, Self::Rule>,
    ) -> Result<Self, ConversionError<Self::FatalError>> {
        let pair = pest.next().ok_or(ConversionError::NoMatch)?;
        if pair.as_rule() != Rule::literal {
            return Err(ConversionError::NoMatch);
        }
        let inner = pair.into_inner().next().ok_or(ConversionError::NoMatch)?;
        match inner.as_rule() {
            Rule::int => inner
                .as_str()
                .parse()
                .map(Self::Int)
                .map_err(|_err| ConversionError::NoMatch),
            Rule::float => inner
                .as_str()
                .parse()
                .map(Self::Float)
                .map_err(|_err| ConversionError::NoMatch),
            Rule::boolean => Ok(Self::Bool(inner.as_str() == "true")),
            Rule::string => Ok(Self::Str(unescape(inner.as_str()))),
            _ => Err(ConversionError::NoMatch),
        }
    }
}

fn unescape(quoted: &str) -> String {
    let body = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BinaryOp {
    #[display("+")]
    Add,
    #[display("-")]
    Sub,
    #[display("*")]
    Mul,
    #[display("/")]
    Div,
    #[display("%")]
    Rem,
    #[display("==")]
    Eq,
    #[display("!=")]
    Neq,
    #[display("<")]
    Lt,
    #[display("<=")]
    Leq,
    #[display(">")]
    Gt,
    #[display(">=")]
    Geq,
    #[display("&&")]
    And,
    #[display("||")]
    Or,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum UnaryOp {
    #[display("-")]
    Neg,
    #[display("!")]
    Not,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Literal),
    Variable(Ident),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    List(Vec<Expr>),
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),

    #[error("literal `{0}` is out of range")]
    InvalidLiteral(String),
}

/// Parse `source` as a single expression.
pub fn parse(source: &str) -> Result<Expr, ParseError> {
    let mut pairs = ExprParser::parse(Rule::program, source).map_err(Box::new)?;
    let program = pairs.next().expect("a successful parse yields a program pair");
    let expr = program
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::expr)
        .expect("program always contains an expr");
    parse_expr(expr.into_inner())
}

static PRATT: LazyLock<PrattParser<Rule>> = LazyLock::new(|| {
    PrattParser::new()
        .op(Op::infix(Rule::or, Assoc::Left))
        .op(Op::infix(Rule::and, Assoc::Left))
        .op(Op::infix(Rule::eq, Assoc::Left)
            | Op::infix(Rule::neq, Assoc::Left)
            | Op::infix(Rule::lt, Assoc::Left)
            | Op::infix(Rule::leq, Assoc::Left)
            | Op::infix(Rule::gt, Assoc::Left)
            | Op::infix(Rule::geq, Assoc::Left))
        .op(Op::infix(Rule::add, Assoc::Left) | Op::infix(Rule::sub, Assoc::Left))
        .op(Op::infix(Rule::mul, Assoc::Left)
            | Op::infix(Rule::div, Assoc::Left)
            | Op::infix(Rule::rem, Assoc::Left))
        .op(Op::prefix(Rule::neg) | Op::prefix(Rule::not))
        .op(Op::postfix(Rule::call))
});

fn parse_expr(pairs: Pairs<Rule>) -> Result<Expr, ParseError> {
    PRATT
        .map_primary(parse_primary)
        .map_prefix(|op, operand| {
            let op = match op.as_rule() {
                Rule::neg => UnaryOp::Neg,
                Rule::not => UnaryOp::Not,
                rule => unreachable!("not a prefix operator: {rule:?}"),
            };
            Ok(Expr::Unary {
                op,
                operand: Box::new(operand?),
            })
        })
        .map_postfix(|callee, op| {
            let args = op
                .into_inner()
                .map(|arg| parse_expr(arg.into_inner()))
                .collect::<Result<_, _>>()?;
            Ok(Expr::Call {
                callee: Box::new(callee?),
                args,
            })
        })
        .map_infix(|lhs, op, rhs| {
            let op = match op.as_rule() {
                Rule::add => BinaryOp::Add,
                Rule::sub => BinaryOp::Sub,
                Rule::mul => BinaryOp::Mul,
                Rule::div => BinaryOp::Div,
                Rule::rem => BinaryOp::Rem,
                Rule::eq => BinaryOp::Eq,
                Rule::neq => BinaryOp::Neq,
                Rule::lt => BinaryOp::Lt,
                Rule::leq => BinaryOp::Leq,
                Rule::gt => BinaryOp::Gt,
                Rule::geq => BinaryOp::Geq,
                Rule::and => BinaryOp::And,
                Rule::or => BinaryOp::Or,
                rule => unreachable!("not an infix operator: {rule:?}"),
            };
            Ok(Expr::Binary {
                op,
                lhs: Box::new(lhs?),
                rhs: Box::new(rhs?),
            })
        })
        .parse(pairs)
}

fn parse_primary(pair: Pair<Rule>) -> Result<Expr, ParseError> {
    match pair.as_rule() {
        Rule::literal => {
            let text = pair.as_str().to_string();
            Literal::from_pest(&mut Pairs::single(pair))
                .map(Expr::Literal)
                .map_err(|_err| ParseError::InvalidLiteral(text))
        }
        Rule::ident => {
            let ident = Ident::from_pest(&mut Pairs::single(pair))
                .expect("ident pairs always convert");
            Ok(Expr::Variable(ident))
        }
        Rule::paren => {
            let inner = pair
                .into_inner()
                .next()
                .expect("paren always contains an expr");
            parse_expr(inner.into_inner())
        }
        Rule::list => pair
            .into_inner()
            .map(|item| parse_expr(item.into_inner()))
            .collect::<Result<_, _>>()
            .map(Expr::List),
        rule => unreachable!("not a primary: {rule:?}"),
    }
}
