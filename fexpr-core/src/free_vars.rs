use std::collections::BTreeSet;

use crate::syntax::{Expr, Ident};

/// Every identifier referenced as a value by `expr`, deduplicated and in
/// lexicographic order. A single expression has no binders of its own, so
/// exclusion of enclosing-scope names happens in the compiler, not here.
pub fn free_vars(expr: &Expr) -> BTreeSet<Ident> {
    let mut free = FreeVars::default();
    free.expr(expr);
    free.0
}

#[derive(Debug, Default)]
struct FreeVars(BTreeSet<Ident>);

impl FreeVars {
    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Variable(ident) => {
                self.0.insert(ident.clone());
            }
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Call { callee, args } => {
                self.expr(callee);
                for arg in args {
                    self.expr(arg);
                }
            }
            Expr::List(items) => {
                for item in items {
                    self.expr(item);
                }
            }
        }
    }
}
