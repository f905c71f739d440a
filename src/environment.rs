use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to an environment.  Closures keep their defining
/// environment alive through this handle.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope: its bindings plus the scope it is nested in.
/// `enclosing == None` marks the global scope.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wraps a fresh child of `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef) -> EnvRef {
        Rc::new(RefCell::new(Environment::with_enclosing(Rc::clone(enclosing))))
    }

    /// Binds `name` in this scope, shadowing or overwriting silently.
    pub fn define(&mut self, name: &str, value: Value) {
        trace!("define '{}'", name);

        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup along the chain; used for globals.
    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(undefined(name))
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(&name.lexeme) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(undefined(name))
        }
    }

    /// Walks exactly `distance` enclosing links up from `env`.
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut current: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = current.borrow().enclosing.clone()?;
            current = next;
        }

        Some(current)
    }

    /// Reads `name` from the scope exactly `distance` hops up.
    pub fn get_at(env: &EnvRef, distance: usize, name: &str) -> Option<Value> {
        let scope: EnvRef = Self::ancestor(env, distance)?;
        let scope = scope.borrow();

        scope.values.get(name).cloned()
    }

    /// Writes `name` in the scope exactly `distance` hops up.  Returns `false`
    /// when no such binding exists there.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &str, value: Value) -> bool {
        let Some(scope) = Self::ancestor(env, distance) else {
            return false;
        };
        let mut scope = scope.borrow_mut();

        match scope.values.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }
}

fn undefined(name: &Token) -> RuntimeError {
    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::TokenType;

    #[test]
    fn lookup_at_distance_skips_shadowing() {
        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("a", Value::Number(1.0));

        let inner: EnvRef = Environment::child_of(&globals);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, "a"), Some(Value::Number(2.0)));
        assert_eq!(Environment::get_at(&inner, 1, "a"), Some(Value::Number(1.0)));
        assert_eq!(Environment::get_at(&inner, 2, "a"), None);

        assert!(Environment::assign_at(&inner, 1, "a", Value::Bool(true)));
        assert_eq!(
            globals.borrow().get(&Token::new(TokenType::IDENTIFIER, "a", None, 1)),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn children_share_their_enclosing_scope() {
        let outer: EnvRef = Rc::new(RefCell::new(Environment::new()));
        outer.borrow_mut().define("n", Value::Number(0.0));

        let first: EnvRef = Environment::child_of(&outer);
        let second: EnvRef = Environment::child_of(&outer);

        assert!(Environment::assign_at(&first, 1, "n", Value::Number(5.0)));
        assert_eq!(Environment::get_at(&second, 1, "n"), Some(Value::Number(5.0)));
    }

    #[test]
    fn assign_to_missing_global_fails() {
        let mut globals = Environment::new();
        let name = Token::new(TokenType::IDENTIFIER, "nope", None, 4);

        let err = globals.assign(&name, Value::Nil).unwrap_err();
        assert_eq!(err.message, "Undefined variable 'nope'.");
    }
}
