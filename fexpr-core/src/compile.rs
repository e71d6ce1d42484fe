use std::collections::BTreeMap;

use thiserror::Error;
use tracing::debug;

use crate::{
    curry::{Callable, Curried, InvalidIdentifier, Signature, curry},
    eval::{self, EvalError},
    free_vars::free_vars,
    scope::Scope,
    syntax::{self, Expr, ParseError},
    value::Value,
};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    InvalidIdentifier(#[from] InvalidIdentifier),
}

/// Compile `source` with nothing in scope: every identifier it mentions
/// becomes a parameter.
pub fn compile(source: &str) -> Result<Curried, CompileError> {
    compile_in(source, &Scope::new())
}

/// Compile `source` into a curried callable.
///
/// The callable's parameters are the expression's free variables (the
/// identifiers it references that `scope` does not bind) in lexicographic
/// order, which fixes the call signature independently of where each name
/// first appears in the text. An expression with no free variables gets the
/// variadic catch-all signature instead, so it can be invoked with any
/// arguments (which it ignores).
pub fn compile_in(source: &str, scope: &Scope) -> Result<Curried, CompileError> {
    let expr = syntax::parse(source)?;
    // BTreeSet iteration order is the lexicographic parameter order.
    let params: Vec<String> = free_vars(&expr)
        .into_iter()
        .map(|ident| ident.0)
        .filter(|name| !scope.is_bound(name))
        .collect();
    let signature = if params.is_empty() {
        Signature::variadic()
    } else {
        Signature::of(params)?
    };
    debug!(?signature, canonical = %expr, source, "compiled expression");
    Ok(curry(Evaluator {
        signature,
        body: expr,
        scope: scope.clone(),
    }))
}

/// Evaluates its expression with each parameter bound by name, closing over
/// the compile-time scope snapshot for everything else.
struct Evaluator {
    signature: Signature,
    body: Expr,
    scope: Scope,
}

impl Callable for Evaluator {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        let locals: BTreeMap<String, Value> = self
            .signature
            .params()
            .iter()
            .cloned()
            .zip(args.iter().cloned())
            .collect();
        eval::eval(&self.body, &locals, &self.scope)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use rstest::{fixture, rstest};

    use super::{CompileError, compile, compile_in};
    use crate::{
        curry::{Applied, Arguments, CallError},
        eval::EvalError,
        scope::Scope,
        value::Value,
    };

    #[fixture]
    fn scope_with_double() -> Scope {
        let mut scope = Scope::new();
        scope.define_native("double", 1, |args| match &args[0] {
            Value::Int(n) => Ok(Value::Int(n * 2)),
            other => Err(EvalError::NotCallable(other.type_name())),
        });
        scope
    }

    fn complete(applied: Applied) -> Value {
        applied.done().expect("call should have completed")
    }

    #[test]
    fn incremental_and_whole_application_agree() -> Result<()> {
        let add = compile("x + y")?;
        let staged = add.call([1])?.waiting().expect("one argument short");
        assert_eq!(complete(staged.call([2])?), Value::Int(3));
        assert_eq!(complete(add.call([1, 2])?), Value::Int(3));
        Ok(())
    }

    #[test]
    fn parameters_come_in_lexicographic_order() -> Result<()> {
        let f = compile("b + a")?;
        assert_eq!(f.signature().params(), ["a", "b"]);
        // The first argument binds `a` regardless of text order, so the
        // concatenation comes out as b + a = "ba" + "ab".
        assert_eq!(
            complete(f.call(["ab", "ba"])?),
            Value::Str("baab".to_string())
        );
        Ok(())
    }

    #[test]
    fn zero_argument_call_waits_instead_of_failing() -> Result<()> {
        let f = compile("x * 2")?;
        let waiting = f.call_with(Arguments::new())?.waiting();
        assert!(waiting.is_some());
        assert_eq!(complete(f.call([5])?), Value::Int(10));
        Ok(())
    }

    #[rstest]
    #[case::no_args(Arguments::new())]
    #[case::ignored_args(Arguments::positional([99]))]
    fn closed_expressions_take_any_arguments(#[case] args: Arguments) -> Result<()> {
        let f = compile("1 + 1")?;
        assert_eq!(complete(f.call_with(args)?), Value::Int(2));
        Ok(())
    }

    #[rstest]
    fn scope_names_are_context_not_parameters(scope_with_double: Scope) -> Result<()> {
        let f = compile_in("double(x)", &scope_with_double)?;
        assert_eq!(f.signature().params(), ["x"]);
        assert_eq!(complete(f.call([21])?), Value::Int(42));
        Ok(())
    }

    #[rstest]
    fn named_arguments_complete_compiled_expressions(
        scope_with_double: Scope,
    ) -> Result<()> {
        let f = compile_in("double(x) + y", &scope_with_double)?;
        let staged = f
            .call_with(Arguments::new().named("y", 1))?
            .waiting()
            .expect("x still missing");
        assert_eq!(complete(staged.call([10])?), Value::Int(21));
        Ok(())
    }

    #[test]
    fn declared_but_undefined_names_fail_at_call_time() -> Result<()> {
        let mut scope = Scope::new();
        scope.declare("undefined_name");
        let f = compile_in("undefined_name + x", &scope)?;
        assert_eq!(f.signature().params(), ["x"]);
        let err = f.call([1]).unwrap_err();
        assert!(matches!(
            err,
            CallError::Eval(EvalError::Undefined(name)) if name == "undefined_name"
        ));
        Ok(())
    }

    #[test]
    fn statements_do_not_compile() {
        assert!(matches!(compile("x = 1"), Err(CompileError::Parse(_))));
        assert!(matches!(compile("x + 1; x"), Err(CompileError::Parse(_))));
    }

    #[test]
    fn compiled_expressions_can_feed_later_ones() -> Result<()> {
        let mut scope = Scope::new();
        let add = compile("x + y")?;
        scope.define("add", add.into_native("add"));
        let f = compile_in("add(a, 10)", &scope)?;
        assert_eq!(complete(f.call([1])?), Value::Int(11));
        Ok(())
    }

    #[test]
    fn evaluation_errors_surface_only_on_completion() -> Result<()> {
        let f = compile("x / y")?;
        let staged = f.call([1])?.waiting().expect("y still missing");
        let err = staged.call([0]).unwrap_err();
        assert!(matches!(err, CallError::Eval(EvalError::DivisionByZero)));
        // The same stage completes fine with a different argument.
        assert_eq!(complete(staged.call([2])?), Value::Int(0));
        Ok(())
    }
}
