use crate::environment::{Environment, MutableEnvironment};
use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::stmt::FunctionDecl;
use crate::value::callable::Callable;
use crate::value::object::Value;
use std::fmt;
use std::rc::Rc;

/// The runtime representation of a function or method declaration.
#[derive(Clone)]
pub enum Function {
    Native {
        name: &'static str,
        arity: usize,
        body: Rc<dyn Fn(&[Value]) -> Value>,
    },
    UserDefined {
        declaration: Rc<FunctionDecl>,
        /// The environment active when the function was *declared*, not
        /// when it's called — this is what makes closures close over
        /// their surrounding variables by reference (spec.md §3 invariant).
        closure: MutableEnvironment,
        /// Whether this declaration is a class's `init` method. Tracked
        /// as a flag on construction (set once, in `Class`'s constructor)
        /// rather than re-derived from the name on every call.
        is_initializer: bool,
    },
}

impl Function {
    pub fn bind(&self, this: Value, super_class: Option<Value>) -> Function {
        match self {
            Function::UserDefined {
                declaration,
                closure,
                is_initializer,
            } => {
                // A tiny environment containing just `this` (and `super`,
                // when the owning class has one), parented to the method's
                // defining environment. The resolver's hop counts for
                // `this`/`super` are sized for exactly this shape
                // (spec.md §4.4).
                let scope = Environment::new_enclosed(closure);
                scope.borrow_mut().define("this", this);
                if let Some(super_class) = super_class {
                    scope.borrow_mut().define("super", super_class);
                }
                Function::UserDefined {
                    declaration: Rc::clone(declaration),
                    closure: scope,
                    is_initializer: *is_initializer,
                }
            }
            Function::Native { .. } => self.clone(),
        }
    }
}

impl Callable for Function {
    fn arity(&self) -> usize {
        match self {
            Function::Native { arity, .. } => *arity,
            Function::UserDefined { declaration, .. } => declaration.params.len(),
        }
    }

    fn name(&self) -> String {
        match self {
            Function::Native { name, .. } => name.to_string(),
            Function::UserDefined { declaration, .. } => declaration.name.lexeme.clone(),
        }
    }

    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Error> {
        match self {
            Function::Native { body, .. } => Ok(body(&args)),
            Function::UserDefined {
                declaration,
                closure,
                is_initializer,
            } => {
                // Each call gets its own frame, parented to the closure
                // captured at declaration time — not the caller's
                // environment — so recursive and re-entrant calls don't
                // trample each other's parameters (spec.md §4.3).
                let call_frame = Environment::new_enclosed(closure);
                for (param, arg) in declaration.params.iter().zip(args) {
                    call_frame.borrow_mut().define(param.lexeme.clone(), arg);
                }

                match interpreter.execute_block(&declaration.body, call_frame) {
                    Err(Error::Return(value)) => {
                        if *is_initializer {
                            Ok(Environment::get_at(closure, 0, "this"))
                        } else {
                            Ok(value)
                        }
                    }
                    Err(other) => Err(other),
                    Ok(()) => {
                        if *is_initializer {
                            Ok(Environment::get_at(closure, 0, "this"))
                        } else {
                            Ok(Value::Nil)
                        }
                    }
                }
            }
        }
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Function::Native { .. } => write!(f, "<native fn>"),
            Function::UserDefined { .. } => write!(f, "<fn {}>", self.name()),
        }
    }
}
