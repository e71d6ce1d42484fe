use std::{fmt, sync::Arc};

use itertools::Itertools;

use crate::eval::EvalError;

/// A host function callable from inside an expression.
///
/// Natives with a declared arity are checked before invocation; `None` means
/// the function accepts any number of arguments.
#[derive(Clone)]
pub struct NativeFn {
    name: String,
    arity: Option<usize>,
    run: Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<String>,
        arity: Option<usize>,
        run: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            arity,
            run: Arc::new(run),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, EvalError> {
        if let Some(expected) = self.arity {
            if expected != args.len() {
                return Err(EvalError::WrongArity {
                    name: self.name.clone(),
                    expected,
                    received: args.len(),
                });
            }
        }
        (self.run)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    List(Vec<Value>),
    Native(NativeFn),
}

impl Value {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Bool(_) => "bool",
            Self::Str(_) => "string",
            Self::List(_) => "list",
            Self::Native(_) => "function",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Native(a), Self::Native(b)) => Arc::ptr_eq(&a.run, &b.run),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => write!(f, "[{}]", items.iter().join(", ")),
            Self::Native(native) => write!(f, "<fn {}>", native.name),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(value)
    }
}

impl From<NativeFn> for Value {
    fn from(value: NativeFn) -> Self {
        Self::Native(value)
    }
}

#[cfg(test)]
mod tests {
    use super::{NativeFn, Value};

    #[test]
    fn display() {
        let list = Value::List(vec![1.into(), "two".into(), true.into()]);
        assert_eq!(list.to_string(), "[1, two, true]");
        let native = NativeFn::new("double", Some(1), |args| Ok(args[0].clone()));
        assert_eq!(Value::from(native).to_string(), "<fn double>");
    }

    #[test]
    fn numeric_equality_promotes() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
        assert_ne!(Value::Int(0), Value::Bool(false));
    }

    #[test]
    fn natives_check_arity() {
        let native = NativeFn::new("pair", Some(2), |args| {
            Ok(Value::List(args.to_vec()))
        });
        assert!(native.call(&[1.into()]).is_err());
        assert!(native.call(&[1.into(), 2.into()]).is_ok());
    }
}
