//! Compile textual expressions into curried callables.
//!
//! An expression's parameters are discovered by free-variable analysis
//! rather than declared: every identifier the expression references that the
//! enclosing [`Scope`] does not bind becomes a parameter, in lexicographic
//! order. The resulting callable accepts its arguments incrementally:
//! under-applying returns a more specialised callable instead of failing.
//!
//! ```
//! use fexpr_core::compile;
//!
//! let add = compile("x + y")?;
//! let add_one = add.call([1])?.waiting().unwrap();
//! assert_eq!(add_one.call([2])?.done().unwrap(), 3.into());
//! assert_eq!(add.call([1, 2])?.done().unwrap(), 3.into());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Names already bound in a [`Scope`] are closed-over context, not
//! parameters:
//!
//! ```
//! use fexpr_core::{Scope, Value, compile_in};
//!
//! let mut scope = Scope::new();
//! scope.define_native("double", 1, |args| match args[0] {
//!     Value::Int(n) => Ok(Value::Int(n * 2)),
//!     ref other => Err(fexpr_core::EvalError::NotCallable(other.type_name())),
//! });
//! let f = compile_in("double(x)", &scope)?;
//! assert_eq!(f.signature().params(), ["x"]);
//! assert_eq!(f.call([21])?.done().unwrap(), 42.into());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod compile;
pub mod curry;
pub mod eval;
pub mod free_vars;
pub mod prettyprinter;
pub mod scope;
pub mod syntax;
pub mod value;

pub use self::{
    compile::{CompileError, compile, compile_in},
    curry::{
        Applied, Arguments, CallError, Callable, Curried, Function, InvalidIdentifier,
        Signature, curry,
    },
    eval::EvalError,
    scope::Scope,
    syntax::ParseError,
    value::{NativeFn, Value},
};
