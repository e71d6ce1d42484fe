//! Partial application and the curry combinator.
//!
//! A [`Curried`] wraps a [`Callable`] together with the arguments bound so
//! far. Calling it with too few arguments is not an error: the call returns
//! a further-specialised [`Curried`] instead. Whether a call can complete is
//! decided by inspecting the target's [`Signature`] against the accumulated
//! arguments, never by catching a failure from the target itself, so genuine
//! evaluation errors stay distinguishable from under-application.

use std::{collections::BTreeMap, fmt, sync::Arc};

use itertools::Itertools;
use thiserror::Error;

use crate::{
    eval::EvalError,
    syntax::is_valid_identifier,
    value::{NativeFn, Value},
};

#[derive(Debug, Error)]
#[error("`{0}` cannot be used as a parameter name")]
pub struct InvalidIdentifier(pub String);

/// The declared parameters of a callable, in call order.
///
/// `Variadic` is the synthetic catch-all used for expressions with no free
/// variables: any arguments are accepted and ignored, so a zero-argument
/// call and a call with leftovers both complete.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signature {
    Params(Vec<String>),
    Variadic,
}

impl Signature {
    /// A signature over named parameters. Names must have identifier shape,
    /// must not be reserved words, and must not repeat.
    pub fn of<I, S>(names: I) -> Result<Self, InvalidIdentifier>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let params: Vec<String> = names.into_iter().map(Into::into).collect();
        if let Some(bad) = params.iter().find(|name| !is_valid_identifier(name)) {
            return Err(InvalidIdentifier(bad.clone()));
        }
        if let Some(dup) = params.iter().duplicates().next() {
            return Err(InvalidIdentifier(dup.clone()));
        }
        Ok(Self::Params(params))
    }

    #[must_use]
    pub const fn variadic() -> Self {
        Self::Variadic
    }

    pub fn params(&self) -> &[String] {
        match self {
            Self::Params(params) => params,
            Self::Variadic => &[],
        }
    }

    /// Match accumulated arguments against the parameter slots. Named
    /// arguments claim their slots first; positional values then fill the
    /// remaining open slots in declaration order, so a stage bound by name
    /// can be finished positionally in exactly the order [`Curried::missing`]
    /// reports.
    fn saturate(&self, args: &Arguments) -> Result<Saturation, CallError> {
        let Self::Params(params) = self else {
            // The catch-all forwards positional arguments untouched; the
            // target decides whether to look at them.
            return Ok(Saturation::Complete(args.positional.clone()));
        };

        let mut slots: Vec<Option<&Value>> = vec![None; params.len()];
        for (name, value) in &args.named {
            let index = params
                .iter()
                .position(|param| param == name)
                .ok_or_else(|| CallError::UnexpectedParameter(name.clone()))?;
            slots[index] = Some(value);
        }

        let open = slots.iter().filter(|slot| slot.is_none()).count();
        if args.positional.len() > open {
            return Err(CallError::TooManyArguments {
                expected: open,
                received: args.positional.len(),
            });
        }
        let mut values = args.positional.iter();
        for slot in &mut slots {
            if slot.is_none() {
                *slot = values.next();
            }
        }

        if slots.iter().all(Option::is_some) {
            Ok(Saturation::Complete(
                slots.into_iter().flatten().cloned().collect(),
            ))
        } else {
            Ok(Saturation::Partial)
        }
    }
}

enum Saturation {
    /// Every slot filled; values are in declaration order.
    Complete(Vec<Value>),
    Partial,
}

/// Positional and named arguments for one step of a currying chain.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    positional: Vec<Value>,
    named: BTreeMap<String, Value>,
}

impl Arguments {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn positional<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        Self {
            positional: values.into_iter().map(Into::into).collect(),
            named: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.named.insert(name.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Bound-first merge: positional arguments concatenate in call order and
    /// `newer` named arguments override same-named bound ones.
    fn merge(&self, newer: &Self) -> Self {
        let mut merged = self.clone();
        merged.positional.extend(newer.positional.iter().cloned());
        merged
            .named
            .extend(newer.named.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }
}

/// Anything the curry combinator can wrap: a declared signature plus a way
/// to run it once every parameter has a value (in declaration order).
pub trait Callable: Send + Sync {
    fn signature(&self) -> &Signature;
    fn invoke(&self, args: &[Value]) -> Result<Value, EvalError>;
}

/// Adapter making any closure curryable under an explicit [`Signature`].
pub struct Function {
    signature: Signature,
    run: Box<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>,
}

impl Function {
    pub fn new(
        signature: Signature,
        run: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            signature,
            run: Box::new(run),
        }
    }
}

impl Callable for Function {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn invoke(&self, args: &[Value]) -> Result<Value, EvalError> {
        (self.run)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// An arity-class failure that cannot be repaired by supplying more
/// arguments, or an evaluation error from a completed call. Under-supply is
/// deliberately absent: it becomes [`Applied::Waiting`].
#[derive(Debug, Error)]
pub enum CallError {
    #[error("expected at most {expected} arguments, received {received}")]
    TooManyArguments { expected: usize, received: usize },

    #[error("unexpected parameter `{0}`")]
    UnexpectedParameter(String),

    #[error("parameter `{0}` supplied more than once")]
    DuplicateParameter(String),

    #[error(transparent)]
    Eval(#[from] EvalError),
}

/// Result of invoking a [`Curried`]: either the underlying callable ran to
/// completion, or the call is still waiting for more arguments.
#[derive(Debug)]
pub enum Applied {
    Done(Value),
    Waiting(Curried),
}

impl Applied {
    pub fn done(self) -> Option<Value> {
        match self {
            Self::Done(value) => Some(value),
            Self::Waiting(_) => None,
        }
    }

    pub fn waiting(self) -> Option<Curried> {
        match self {
            Self::Done(_) => None,
            Self::Waiting(curried) => Some(curried),
        }
    }
}

/// Wrap `f` so that under-applied calls accumulate arguments instead of
/// failing. Every intermediate stage is immutable and independently
/// reusable.
pub fn curry(f: impl Callable + 'static) -> Curried {
    Curried {
        target: Arc::new(f),
        bound: Arc::new(Arguments::new()),
    }
}

#[derive(Clone)]
pub struct Curried {
    target: Arc<dyn Callable>,
    bound: Arc<Arguments>,
}

impl Curried {
    /// Supply positional arguments.
    pub fn call<I>(&self, args: I) -> Result<Applied, CallError>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.call_with(Arguments::positional(args))
    }

    /// Supply a mix of positional and named arguments.
    pub fn call_with(&self, args: Arguments) -> Result<Applied, CallError> {
        // Positional values are assigned before the call's named arguments,
        // so a new named argument whose slot the positional values already
        // cover is a double supply, not an override.
        if let Signature::Params(params) = self.target.signature() {
            let supplied = self.bound.positional.len() + args.positional.len();
            let double = params
                .iter()
                .filter(|param| !self.bound.named.contains_key(param.as_str()))
                .take(supplied)
                .find(|param| args.named.contains_key(param.as_str()));
            if let Some(param) = double {
                return Err(CallError::DuplicateParameter(param.clone()));
            }
        }

        let merged = self.bound.merge(&args);
        match self.target.signature().saturate(&merged)? {
            Saturation::Complete(values) => {
                Ok(Applied::Done(self.target.invoke(&values)?))
            }
            Saturation::Partial => Ok(Applied::Waiting(Self {
                target: Arc::clone(&self.target),
                bound: Arc::new(merged),
            })),
        }
    }

    pub fn signature(&self) -> &Signature {
        self.target.signature()
    }

    /// Parameters not yet bound, in declaration order. Named bindings claim
    /// their own slots; positional bindings consume the earliest slots left
    /// open by them.
    pub fn missing(&self) -> Vec<&str> {
        let mut positional = self.bound.positional.len();
        self.signature()
            .params()
            .iter()
            .filter(|param| {
                if self.bound.named.contains_key(param.as_str()) {
                    return false;
                }
                if positional > 0 {
                    positional -= 1;
                    return false;
                }
                true
            })
            .map(String::as_str)
            .collect()
    }

    /// Repackage as a host function so a curried callable can be placed in
    /// a [`Scope`](crate::scope::Scope) and called from later expressions.
    /// Such calls must supply every remaining argument at once.
    pub fn into_native(self, name: impl Into<String>) -> NativeFn {
        let name = name.into();
        let reported = name.clone();
        NativeFn::new(name, None, move |args| {
            let received = args.len();
            match self.call(args.iter().cloned()) {
                Ok(Applied::Done(value)) => Ok(value),
                Ok(Applied::Waiting(_))
                | Err(CallError::TooManyArguments { .. })
                | Err(CallError::UnexpectedParameter(_))
                | Err(CallError::DuplicateParameter(_)) => Err(EvalError::WrongArity {
                    name: reported.clone(),
                    expected: self.missing().len(),
                    received,
                }),
                Err(CallError::Eval(err)) => Err(err),
            }
        })
    }
}

impl fmt::Debug for Curried {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Curried")
            .field("signature", self.target.signature())
            .field("bound", &*self.bound)
            .finish()
    }
}
