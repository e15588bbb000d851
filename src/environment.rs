use crate::error::Error;
use crate::token::Token;
use crate::value::object::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Environments are shared, not owned: a closure retains the frame chain
/// current at its point of declaration, so a single parent can outlive
/// many child frames (spec.md §3). `Rc<RefCell<_>>` is the teacher's own
/// pattern for this (`value/function.rs`'s `closure: MutableEnvironment`),
/// reconstructed here since the checked-in `environment.rs` only had the
/// earlier, non-closure-sharing `Box<Environment>` shape.
pub type MutableEnvironment = Rc<RefCell<Environment>>;

#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<MutableEnvironment>,
}

impl Environment {
    pub fn new_global() -> MutableEnvironment {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: None,
        }))
    }

    /// A new local scope nested inside `enclosing` — used for blocks,
    /// function-call frames, and the synthetic `this`/`super` scopes
    /// method binding installs (spec.md §4.4).
    pub fn new_enclosed(enclosing: &MutableEnvironment) -> MutableEnvironment {
        Rc::new(RefCell::new(Environment {
            values: HashMap::new(),
            enclosing: Some(Rc::clone(enclosing)),
        }))
    }

    /// A new variable is always declared in the current innermost scope;
    /// redeclaration simply shadows whatever was there (spec.md §4.1).
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, Error> {
        if let Some(value) = self.values.get(&name.lexeme) {
            return Ok(value.clone());
        }
        match &self.enclosing {
            Some(parent) => parent.borrow().get(name),
            None => Err(Error::runtime(
                name.clone(),
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), Error> {
        if self.values.contains_key(&name.lexeme) {
            self.values.insert(name.lexeme.clone(), value);
            return Ok(());
        }
        match &self.enclosing {
            Some(parent) => parent.borrow_mut().assign(name, value),
            None => Err(Error::runtime(
                name.clone(),
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    /// Walks exactly `distance` parent links and reads from that frame
    /// directly — no fallback. The resolver guarantees the frame and the
    /// binding both exist at this distance (spec.md §4.1); a miss here is
    /// a resolver/evaluator disagreement bug, not a user-facing error.
    pub fn get_at(env: &MutableEnvironment, distance: usize, name: &str) -> Value {
        ancestor(env, distance)
            .borrow()
            .values
            .get(name)
            .unwrap_or_else(|| panic!("resolver/evaluator disagreement: '{name}' not found at distance {distance}"))
            .clone()
    }

    pub fn assign_at(env: &MutableEnvironment, distance: usize, name: &Token, value: Value) {
        ancestor(env, distance)
            .borrow_mut()
            .values
            .insert(name.lexeme.clone(), value);
    }
}

fn ancestor(env: &MutableEnvironment, distance: usize) -> MutableEnvironment {
    let mut current = Rc::clone(env);
    for _ in 0..distance {
        let parent = current
            .borrow()
            .enclosing
            .clone()
            .expect("resolver/evaluator disagreement: ran out of enclosing scopes");
        current = parent;
    }
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Literal, TokenKind};

    fn token(name: &str) -> Token {
        Token::new(TokenKind::Identifier, name, Literal::Nil, 1)
    }

    #[test]
    fn get_at_skips_exactly_distance_frames() {
        let global = Environment::new_global();
        global.borrow_mut().define("a", Value::Number(1.0));

        let inner = Environment::new_enclosed(&global);
        inner.borrow_mut().define("a", Value::Number(2.0));

        assert_eq!(Environment::get_at(&inner, 0, "a"), Value::Number(2.0));
        assert_eq!(Environment::get_at(&inner, 1, "a"), Value::Number(1.0));
    }

    #[test]
    fn assign_walks_chain_to_defining_frame() {
        let global = Environment::new_global();
        global.borrow_mut().define("x", Value::Number(1.0));
        let inner = Environment::new_enclosed(&global);

        inner.borrow_mut().assign(&token("x"), Value::Number(42.0)).unwrap();
        assert_eq!(global.borrow().get(&token("x")).unwrap(), Value::Number(42.0));
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let global = Environment::new_global();
        assert!(global.borrow().get(&token("missing")).is_err());
    }
}
