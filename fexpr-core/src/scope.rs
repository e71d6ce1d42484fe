use indexmap::IndexMap;

use crate::{
    eval::EvalError,
    value::{NativeFn, Value},
};

/// Snapshot of the names bound in the enclosing environment at compile time.
///
/// Names listed here are treated as closed-over context rather than
/// parameters during free-variable analysis. A name may be *defined* with a
/// value, or merely *declared*: declared names are still excluded from the
/// parameter list, but evaluating them raises [`EvalError::Undefined`].
#[derive(Clone, Debug, Default)]
pub struct Scope {
    bindings: IndexMap<String, Option<Value>>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), Some(value.into()));
    }

    /// Bind `name` without giving it a value.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.bindings.entry(name.into()).or_insert(None);
    }

    /// Register a host function of fixed arity under `name`.
    pub fn define_native(
        &mut self,
        name: &str,
        arity: usize,
        run: impl Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    ) {
        self.define(name, NativeFn::new(name, Some(arity), run));
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub(crate) fn value(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).and_then(Option::as_ref)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::Scope;
    use crate::value::Value;

    #[test]
    fn declared_names_are_bound_but_undefined() {
        let mut scope = Scope::new();
        scope.define("answer", 42);
        scope.declare("pending");
        assert!(scope.is_bound("answer"));
        assert!(scope.is_bound("pending"));
        assert_eq!(scope.value("answer"), Some(&Value::Int(42)));
        assert_eq!(scope.value("pending"), None);
        assert_eq!(scope.value("absent"), None);
    }

    #[test]
    fn declare_does_not_clobber_a_definition() {
        let mut scope = Scope::new();
        scope.define("x", 1);
        scope.declare("x");
        assert_eq!(scope.value("x"), Some(&Value::Int(1)));
    }
}
