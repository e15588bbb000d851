use crate::error::Error;
use crate::token::Token;
use crate::value::class::Class;
use crate::value::function::Function;
use crate::value::object::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A Lox object: state lives here, behavior lives on `class`.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Fields shadow methods: only once the field map misses do we fall
    /// back to the method chain (spec.md §3), and a resolved method is
    /// bound to `self_value` (the `Value::Instance` this instance is
    /// wrapped in) before being handed back (spec.md §4.4).
    pub fn get(&self, name: &Token, self_value: &Value) -> Result<Value, Error> {
        if let Some(value) = self.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }
        if let Some(method) = self.class.find_method(&name.lexeme) {
            let super_class = self.class.superclass.clone().map(Value::Class);
            return Ok(Value::Callable(Rc::new(
                method.bind(self_value.clone(), super_class),
            )));
        }
        Err(Error::runtime(
            name.clone(),
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    /// Lox allows freely creating new fields on instances, so there's
    /// never a need to check whether the key already exists.
    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} instance", self.class.name)
    }
}
