use crate::error::Error;
use crate::interpreter::Interpreter;
use crate::value::object::Value;

/// Anything that can appear on the left of `(...)`: user functions,
/// methods, classes (as constructors), and built-ins (spec.md GLOSSARY).
pub trait Callable {
    fn arity(&self) -> usize;
    fn call(&self, interpreter: &mut Interpreter, args: Vec<Value>) -> Result<Value, Error>;
    /// Used only for `Display`; native functions render as `<native fn>`,
    /// user functions/methods as `<fn name>` (spec.md §6 stringify rules).
    fn name(&self) -> String;
}
