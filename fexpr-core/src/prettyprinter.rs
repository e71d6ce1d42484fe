use std::fmt;

use pretty::RcDoc;

use crate::syntax::{Expr, Literal, UnaryOp};

const WIDTH: usize = 80;

pub trait PrettyPrint {
    fn to_doc(&self) -> RcDoc<'_, ()>;

    fn to_pretty(&self) -> String {
        self.to_doc().pretty(WIDTH).to_string()
    }
}

fn delimited<'a>(items: &'a [Expr], open: &'a str, close: &'a str) -> RcDoc<'a, ()> {
    RcDoc::text(open)
        .append(RcDoc::intersperse(
            items.iter().map(PrettyPrint::to_doc),
            RcDoc::text(", "),
        ))
        .append(RcDoc::text(close))
}

impl PrettyPrint for Expr {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        match self {
            Self::Literal(literal) => literal.to_doc(),
            Self::Variable(ident) => RcDoc::text(&ident.0),
            Self::Unary { op, operand } => RcDoc::as_string(op).append(operand.to_doc()),
            // Binary expressions reprint fully parenthesised; precedence is
            // already resolved in the tree.
            Self::Binary { op, lhs, rhs } => RcDoc::text("(")
                .append(lhs.to_doc())
                .append(RcDoc::space())
                .append(RcDoc::as_string(op))
                .append(RcDoc::space())
                .append(rhs.to_doc())
                .append(RcDoc::text(")")),
            Self::Call { callee, args } => {
                let callee_doc = if matches!(**callee, Expr::Unary { .. }) {
                    RcDoc::text("(")
                        .append(callee.to_doc())
                        .append(RcDoc::text(")"))
                } else {
                    callee.to_doc()
                };
                callee_doc.append(delimited(args, "(", ")"))
            }
            Self::List(items) => delimited(items, "[", "]"),
        }
    }
}

impl PrettyPrint for Literal {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        match self {
            Self::Int(n) => RcDoc::as_string(n),
            Self::Float(x) => RcDoc::as_string(x),
            Self::Bool(b) => RcDoc::as_string(b),
            Self::Str(s) => RcDoc::text(format!("{s:?}")),
        }
    }
}

impl PrettyPrint for UnaryOp {
    fn to_doc(&self) -> RcDoc<'_, ()> {
        RcDoc::as_string(self)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_pretty())
    }
}
