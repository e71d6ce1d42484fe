use std::collections::BTreeMap;

use thiserror::Error;

use crate::{
    scope::Scope,
    syntax::{BinaryOp, Expr, Literal, UnaryOp},
    value::Value,
};

/// A failure of the expression's own semantics, surfaced unchanged to
/// whoever completed the call. Never recovered into further currying.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("name `{0}` is not defined")]
    Undefined(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("integer overflow in `{0}`")]
    Overflow(BinaryOp),

    #[error("`{op}` is not defined for {lhs} and {rhs}")]
    BinaryType {
        op: BinaryOp,
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("`{op}` is not defined for {operand}")]
    UnaryType {
        op: UnaryOp,
        operand: &'static str,
    },

    #[error("a {0} is not callable")]
    NotCallable(&'static str),

    #[error("`{name}` takes {expected} arguments, received {received}")]
    WrongArity {
        name: String,
        expected: usize,
        received: usize,
    },
}

/// Evaluate `expr` with parameters bound in `locals`, falling back to the
/// compile-time scope for every other name.
pub(crate) fn eval(
    expr: &Expr,
    locals: &BTreeMap<String, Value>,
    scope: &Scope,
) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(literal) => Ok(literal_value(literal)),
        Expr::Variable(ident) => locals
            .get(&ident.0)
            .or_else(|| scope.value(&ident.0))
            .cloned()
            .ok_or_else(|| EvalError::Undefined(ident.0.clone())),
        Expr::Unary { op, operand } => unary(*op, eval(operand, locals, scope)?),
        Expr::Binary { op, lhs, rhs } => match op {
            // && and || short-circuit, so the right operand is not
            // evaluated eagerly.
            BinaryOp::And | BinaryOp::Or => {
                let lhs = eval(lhs, locals, scope)?;
                logical(*op, lhs, || eval(rhs, locals, scope))
            }
            _ => binary(*op, eval(lhs, locals, scope)?, eval(rhs, locals, scope)?),
        },
        Expr::Call { callee, args } => {
            let callee = eval(callee, locals, scope)?;
            let args = args
                .iter()
                .map(|arg| eval(arg, locals, scope))
                .collect::<Result<Vec<_>, _>>()?;
            match callee {
                Value::Native(native) => native.call(&args),
                other => Err(EvalError::NotCallable(other.type_name())),
            }
        }
        Expr::List(items) => items
            .iter()
            .map(|item| eval(item, locals, scope))
            .collect::<Result<_, _>>()
            .map(Value::List),
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Str(s) => Value::Str(s.clone()),
    }
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match (op, operand) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or(EvalError::Overflow(BinaryOp::Sub)),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, operand) => Err(EvalError::UnaryType {
            op,
            operand: operand.type_name(),
        }),
    }
}

fn logical(
    op: BinaryOp,
    lhs: Value,
    rhs: impl FnOnce() -> Result<Value, EvalError>,
) -> Result<Value, EvalError> {
    let Value::Bool(a) = lhs else {
        return Err(EvalError::BinaryType {
            op,
            lhs: lhs.type_name(),
            rhs: "_",
        });
    };
    if (op == BinaryOp::And && !a) || (op == BinaryOp::Or && a) {
        return Ok(Value::Bool(a));
    }
    match rhs()? {
        Value::Bool(b) => Ok(Value::Bool(b)),
        other => Err(EvalError::BinaryType {
            op,
            lhs: "bool",
            rhs: other.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, EvalError> {
    use BinaryOp::{Add, Div, Eq, Geq, Gt, Leq, Lt, Mul, Neq, Rem, Sub};

    match (op, &lhs, &rhs) {
        (Eq, ..) => return Ok(Value::Bool(lhs == rhs)),
        (Neq, ..) => return Ok(Value::Bool(lhs != rhs)),

        (Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{a}{b}"))),
        (Add, Value::List(a), Value::List(b)) => {
            return Ok(Value::List(a.iter().chain(b).cloned().collect()));
        }

        (Lt | Leq | Gt | Geq, Value::Str(a), Value::Str(b)) => {
            return Ok(Value::Bool(compare(op, a, b)));
        }
        _ => {}
    }

    match promote(op, lhs, rhs)? {
        (Value::Int(a), Value::Int(b)) => match op {
            Add => a.checked_add(b).map(Value::Int).ok_or(EvalError::Overflow(op)),
            Sub => a.checked_sub(b).map(Value::Int).ok_or(EvalError::Overflow(op)),
            Mul => a.checked_mul(b).map(Value::Int).ok_or(EvalError::Overflow(op)),
            Div if b == 0 => Err(EvalError::DivisionByZero),
            Div => a.checked_div(b).map(Value::Int).ok_or(EvalError::Overflow(op)),
            Rem if b == 0 => Err(EvalError::DivisionByZero),
            Rem => a.checked_rem(b).map(Value::Int).ok_or(EvalError::Overflow(op)),
            Lt | Leq | Gt | Geq => Ok(Value::Bool(compare(op, &a, &b))),
            _ => unreachable!("handled above"),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            Add => Ok(Value::Float(a + b)),
            Sub => Ok(Value::Float(a - b)),
            Mul => Ok(Value::Float(a * b)),
            Div | Rem if b == 0.0 => Err(EvalError::DivisionByZero),
            Div => Ok(Value::Float(a / b)),
            Rem => Ok(Value::Float(a % b)),
            Lt | Leq | Gt | Geq => Ok(Value::Bool(compare(op, &a, &b))),
            _ => unreachable!("handled above"),
        },
        _ => unreachable!("promote only returns matching numeric pairs"),
    }
}

/// Bring both operands to a common numeric representation, or report the
/// operator as undefined for the pair.
fn promote(op: BinaryOp, lhs: Value, rhs: Value) -> Result<(Value, Value), EvalError> {
    match (lhs, rhs) {
        (a @ Value::Int(_), b @ Value::Int(_)) => Ok((a, b)),
        (a @ Value::Float(_), b @ Value::Float(_)) => Ok((a, b)),
        (Value::Int(a), b @ Value::Float(_)) => Ok((Value::Float(a as f64), b)),
        (a @ Value::Float(_), Value::Int(b)) => Ok((a, Value::Float(b as f64))),
        (lhs, rhs) => Err(EvalError::BinaryType {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}

fn compare<T: PartialOrd>(op: BinaryOp, a: &T, b: &T) -> bool {
    match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Leq => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Geq => a >= b,
        op => unreachable!("not a comparison: {op}"),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use anyhow::Result;
    use rstest::rstest;

    use super::{EvalError, eval};
    use crate::{scope::Scope, syntax::parse, value::Value};

    fn eval_str(source: &str, scope: &Scope) -> Result<Value, EvalError> {
        let expr = parse(source).expect("test source parses");
        eval(&expr, &BTreeMap::new(), scope)
    }

    #[rstest]
    #[case("1 + 2 * 3", Value::Int(7))]
    #[case("(1 + 2) * 3", Value::Int(9))]
    #[case("7 / 2", Value::Int(3))]
    #[case("7.0 / 2", Value::Float(3.5))]
    #[case("7 % 2", Value::Int(1))]
    #[case("-3 + 1", Value::Int(-2))]
    #[case("1.5 + 1", Value::Float(2.5))]
    #[case("\"ab\" + \"cd\"", Value::Str("abcd".to_string()))]
    #[case("1 < 2 && 2 <= 2", Value::Bool(true))]
    #[case("\"a\" < \"b\"", Value::Bool(true))]
    #[case("1 == 1.0", Value::Bool(true))]
    #[case("!(1 == 2)", Value::Bool(true))]
    #[case("false && undefined_is_never_reached", Value::Bool(false))]
    #[case("true || undefined_is_never_reached", Value::Bool(true))]
    fn closed_expressions(#[case] source: &str, #[case] expected: Value) -> Result<()> {
        assert_eq!(eval_str(source, &Scope::new())?, expected);
        Ok(())
    }

    #[rstest]
    #[case("1 / 0")]
    #[case("1 % 0")]
    #[case("1.0 / 0")]
    fn division_by_zero(#[case] source: &str) {
        assert!(matches!(
            eval_str(source, &Scope::new()),
            Err(EvalError::DivisionByZero)
        ));
    }

    #[rstest]
    #[case("1 + true")]
    #[case("\"a\" * 2")]
    #[case("-\"a\"")]
    #[case("1 && true")]
    fn type_mismatches(#[case] source: &str) {
        assert!(matches!(
            eval_str(source, &Scope::new()),
            Err(EvalError::BinaryType { .. } | EvalError::UnaryType { .. })
        ));
    }

    #[test]
    fn scope_lookup_and_native_calls() -> Result<()> {
        let mut scope = Scope::new();
        scope.define("base", 10);
        scope.define_native("double", 1, |args| {
            match &args[0] {
                Value::Int(n) => Ok(Value::Int(n * 2)),
                other => Err(EvalError::NotCallable(other.type_name())),
            }
        });
        assert_eq!(eval_str("double(base) + 1", &scope)?, Value::Int(21));
        Ok(())
    }

    #[test]
    fn undefined_names_report_themselves() {
        let err = eval_str("missing + 1", &Scope::new()).unwrap_err();
        assert!(matches!(err, EvalError::Undefined(name) if name == "missing"));
    }

    #[test]
    fn calling_a_number_fails() {
        assert!(matches!(
            eval_str("3(4)", &Scope::new()),
            Err(EvalError::NotCallable("int"))
        ));
    }

    #[test]
    fn native_arity_is_checked_inside_expressions() {
        let mut scope = Scope::new();
        scope.define_native("double", 1, |args| Ok(args[0].clone()));
        assert!(matches!(
            eval_str("double(1, 2)", &scope),
            Err(EvalError::WrongArity { .. })
        ));
    }
}
