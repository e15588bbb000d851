use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::value::callable::Callable;
use crate::value::function::Function;
use crate::value::instance::Instance;
use crate::value::object::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// The runtime representation of a class declaration: a container for
/// methods and a factory for instances (spec.md §3's "instance stores the
/// state, the class stores the behaviour").
pub struct Class {
    pub name: String,
    pub methods: HashMap<String, Function>,
    pub superclass: Option<Rc<Class>>,
}

impl Class {
    pub fn new(
        name: String,
        methods: HashMap<String, Function>,
        superclass: Option<Rc<Class>>,
    ) -> Self {
        Self {
            name,
            methods,
            superclass,
        }
    }

    /// Walks this class's own method table, then its superclass chain —
    /// grounded on `examples/original_source/cpplox/cpplox/LoxClass.cpp`'s
    /// `find_method`, which recurses into `super_class` the same way.
    pub fn find_method(&self, name: &str) -> Option<Function> {
        self.methods.get(name).cloned().or_else(|| {
            self.superclass
                .as_ref()
                .and_then(|superclass| superclass.find_method(name))
        })
    }
    /// If there's an `init`, its arity governs the constructor call;
    /// with no user-defined initializer, arity is zero (spec.md §3: the
    /// synthesized initializer takes no arguments).
    pub fn arity(&self) -> usize {
        self.find_method("init")
            .map(|init| init.arity())
            .unwrap_or(0)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<class {}>", self.name)
    }
}

/// Instantiates `class`: allocates a fresh `Instance`, then invokes its
/// bound `init` (if any) for side effects, regardless of any `return`
/// inside it (spec.md §3 invariant) — `Function::call` already enforces
/// that by always returning the bound `this` for initializers.
pub fn instantiate(
    class: &Rc<Class>,
    interpreter: &mut Interpreter,
    args: Vec<Value>,
) -> Result<Value, Error> {
    let instance = Instance::new(Rc::clone(class));
    let instance = Value::Instance(Rc::new(RefCell::new(instance)));
    if let Some(initializer) = class.find_method("init") {
        let super_class = class.superclass.clone().map(Value::Class);
        initializer
            .bind(instance.clone(), super_class)
            .call(interpreter, args)?;
    }
    Ok(instance)
}
