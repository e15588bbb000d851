use crate::environment::MutableEnvironment;
use crate::value::function::Function;
use crate::value::object::Value;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Installs the language's built-ins into the global environment. The
/// only one spec.md §6 requires is `clock/0`.
pub fn install(globals: &MutableEnvironment) {
    globals.borrow_mut().define(
        "clock",
        Value::Callable(Rc::new(Function::Native {
            name: "clock",
            arity: 0,
            body: Rc::new(|_args| {
                let seconds = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("system clock is after the epoch")
                    .as_secs_f64();
                Value::Number(seconds)
            }),
        })),
    );
}
