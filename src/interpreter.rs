use crate::environment::{Environment, MutableEnvironment};
use crate::error::{Error, ErrorReporter};
use crate::expr::{Expr, ExprId};
use crate::native_functions;
use crate::stmt::Stmt;
use crate::token::{Literal, Token, TokenKind};
use crate::value::callable::Callable;
use crate::value::class::{self, Class};
use crate::value::function::Function;
use crate::value::object::Value;
use log::trace;
use std::collections::HashMap;
use std::rc::Rc;

/// The tree-walking evaluator. Holds the global environment plus a cursor
/// onto whichever environment is "current" — swapped out and restored
/// around blocks and calls rather than threaded as a parameter, which is
/// what lets `execute_block` hand a fresh frame to the body of a `for`
/// loop, a function call, or a REPL line without the caller needing to
/// know which one it was (spec.md §4.3).
pub struct Interpreter {
    pub globals: MutableEnvironment,
    environment: MutableEnvironment,
    locals: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new_global();
        native_functions::install(&globals);
        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
        }
    }

    /// Folds in a resolver pass's output. Called once per script run, and
    /// once per line in the REPL (spec.md §4.5) — each input gets a fresh
    /// resolution map, since `ExprId`s are only stable within the single
    /// parse/resolve/evaluate pipeline that produced them and a later
    /// line's parser restarts id assignment from zero. Replacing (not
    /// merging) is what keeps a stale id from an earlier, already-dropped
    /// line's AST from being misread as resolved for an unrelated
    /// expression in a later line.
    pub fn load_resolution(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals = locals;
    }

    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut ErrorReporter) {
        for statement in statements {
            if let Err(err) = self.execute(statement) {
                reporter.runtime_error(&err);
                return;
            }
        }
    }

    fn execute(&mut self, stmt: &Stmt) -> Result<(), Error> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{value}");
                Ok(())
            }
            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().define(name.lexeme.clone(), value);
                Ok(())
            }
            Stmt::Block(statements) => {
                let enclosed = Environment::new_enclosed(&self.environment);
                self.execute_block(statements, enclosed)
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }
                Ok(())
            }
            Stmt::Function(decl) => {
                let function = Function::UserDefined {
                    declaration: Rc::clone(decl),
                    closure: Rc::clone(&self.environment),
                    is_initializer: false,
                };
                self.environment
                    .borrow_mut()
                    .define(decl.name.lexeme.clone(), Value::Callable(Rc::new(function)));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Error::Return(value))
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<crate::stmt::FunctionDecl>],
    ) -> Result<(), Error> {
        let superclass_value = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => return Err(Error::runtime(superclass_token(expr), "Superclass must be a class.")),
            },
            None => None,
        };

        self.environment
            .borrow_mut()
            .define(name.lexeme.clone(), Value::Nil);

        let previous_environment = Rc::clone(&self.environment);
        if let Some(superclass_value) = &superclass_value {
            let enclosed = Environment::new_enclosed(&self.environment);
            enclosed
                .borrow_mut()
                .define("super", Value::Class(Rc::clone(superclass_value)));
            self.environment = enclosed;
        }

        let mut method_table = HashMap::new();
        for method in methods {
            let is_initializer = method.name.lexeme == "init";
            let function = Function::UserDefined {
                declaration: Rc::clone(method),
                closure: Rc::clone(&self.environment),
                is_initializer,
            };
            method_table.insert(method.name.lexeme.clone(), function);
        }

        let class = Rc::new(Class::new(name.lexeme.clone(), method_table, superclass_value));

        self.environment = previous_environment;
        self.environment.borrow_mut().assign(name, Value::Class(class))
    }

    /// Runs `statements` with `environment` swapped in for the duration,
    /// restoring the caller's environment afterward even if execution
    /// unwinds early via a runtime error or a `return` (spec.md §4.3).
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: MutableEnvironment,
    ) -> Result<(), Error> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, Error> {
        match expr {
            Expr::Literal { value, .. } => Ok(literal_to_value(value)),
            Expr::Grouping { expression, .. } => self.evaluate(expression),
            Expr::Unary { operator, right, .. } => {
                let right = self.evaluate(right)?;
                match operator.kind {
                    TokenKind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(Error::runtime(operator.clone(), "Operand must be a number.")),
                    },
                    TokenKind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    _ => unreachable!("parser only produces - and ! unary operators"),
                }
            }
            Expr::Binary {
                left,
                operator,
                right,
                ..
            } => self.evaluate_binary(left, operator, right),
            Expr::Logical {
                left,
                operator,
                right,
                ..
            } => {
                let left_value = self.evaluate(left)?;
                let short_circuits = match operator.kind {
                    TokenKind::Or => left_value.is_truthy(),
                    TokenKind::And => !left_value.is_truthy(),
                    _ => unreachable!("parser only produces and/or logical operators"),
                };
                if short_circuits {
                    Ok(left_value)
                } else {
                    self.evaluate(right)
                }
            }
            Expr::Variable { name, .. } => self.lookup_variable(name, expr),
            Expr::Assign { name, value, .. } => {
                let value = self.evaluate(value)?;
                match self.locals.get(&expr.id()) {
                    Some(distance) => {
                        Environment::assign_at(&self.environment, *distance, name, value.clone())
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call {
                callee,
                paren,
                arguments,
                ..
            } => self.evaluate_call(callee, paren, arguments),
            Expr::Get { object, name, .. } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let self_value = Value::Instance(Rc::clone(&instance));
                        instance.borrow().get(name, &self_value)
                    }
                    _ => Err(Error::runtime(name.clone(), "Only instances have properties.")),
                }
            }
            Expr::Set {
                object,
                name,
                value,
                ..
            } => {
                let object = self.evaluate(object)?;
                match object {
                    Value::Instance(instance) => {
                        let value = self.evaluate(value)?;
                        instance.borrow_mut().set(name, value.clone());
                        Ok(value)
                    }
                    _ => Err(Error::runtime(name.clone(), "Only instances have fields.")),
                }
            }
            Expr::This { keyword, .. } => self.lookup_variable(keyword, expr),
            Expr::Super { method, .. } => self.evaluate_super(method, expr),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> Result<Value, Error> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        use TokenKind::*;
        match operator.kind {
            Minus | Slash | Star | Greater | GreaterEqual | Less | LessEqual => {
                let (l, r) = match (&left, &right) {
                    (Value::Number(l), Value::Number(r)) => (*l, *r),
                    _ => return Err(Error::runtime(operator.clone(), "Operands must be numbers.")),
                };
                Ok(match operator.kind {
                    Minus => Value::Number(l - r),
                    Slash => Value::Number(l / r),
                    Star => Value::Number(l * r),
                    Greater => Value::Bool(l > r),
                    GreaterEqual => Value::Bool(l >= r),
                    Less => Value::Bool(l < r),
                    LessEqual => Value::Bool(l <= r),
                    _ => unreachable!(),
                })
            }
            Plus => match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::Str(l), Value::Str(r)) => Ok(Value::Str(l + &r)),
                _ => Err(Error::runtime(
                    operator.clone(),
                    "Operands must be two numbers or two strings.",
                )),
            },
            BangEqual => Ok(Value::Bool(!left.lox_eq(&right))),
            EqualEqual => Ok(Value::Bool(left.lox_eq(&right))),
            _ => unreachable!("parser only produces these kinds for Expr::Binary"),
        }
    }

    fn evaluate_call(&mut self, callee: &Expr, paren: &Token, arguments: &[Expr]) -> Result<Value, Error> {
        let callee = self.evaluate(callee)?;
        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
            args.push(self.evaluate(argument)?);
        }

        let arity = match &callee {
            Value::Callable(function) => function.arity(),
            Value::Class(class) => class.arity(),
            _ => return Err(Error::runtime(paren.clone(), "Can only call functions and classes.")),
        };
        if args.len() != arity {
            return Err(Error::runtime(
                paren.clone(),
                format!("Expected {arity} arguments but got {}.", args.len()),
            ));
        }

        match callee {
            Value::Callable(function) => function.call(self, args),
            Value::Class(class) => class::instantiate(&class, self, args),
            _ => unreachable!("checked above"),
        }
    }

    fn evaluate_super(&mut self, method: &Token, expr: &Expr) -> Result<Value, Error> {
        let distance = *self
            .locals
            .get(&expr.id())
            .expect("resolver resolves every 'super' reference");
        let superclass = match Environment::get_at(&self.environment, distance, "super") {
            Value::Class(class) => class,
            _ => unreachable!("environment only ever stores 'super' as a class"),
        };
        let this = Environment::get_at(&self.environment, distance - 1, "this");

        match superclass.find_method(&method.lexeme) {
            Some(bound_method) => {
                let super_of_super = superclass.superclass.clone().map(Value::Class);
                Ok(Value::Callable(Rc::new(bound_method.bind(this, super_of_super))))
            }
            None => Err(Error::runtime(
                method.clone(),
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn lookup_variable(&self, name: &Token, expr: &Expr) -> Result<Value, Error> {
        match self.locals.get(&expr.id()) {
            Some(distance) => {
                trace!("'{}' read via resolved hop-count {distance}", name.lexeme);
                Ok(Environment::get_at(&self.environment, *distance, &name.lexeme))
            }
            None => {
                trace!("'{}' read from globals (no resolved hop-count)", name.lexeme);
                self.globals.borrow().get(name)
            }
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn literal_to_value(literal: &Literal) -> Value {
    match literal {
        Literal::Nil => Value::Nil,
        Literal::Str(s) => Value::Str(s.clone()),
        Literal::Number(n) => Value::Number(*n),
        Literal::Bool(b) => Value::Bool(*b),
    }
}

fn superclass_token(expr: &Expr) -> Token {
    match expr {
        Expr::Variable { name, .. } => name.clone(),
        _ => unreachable!("resolver only allows a variable expression as a superclass"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::parser::Parser;
    use crate::resolver::Resolver;
    use crate::scanner::Scanner;

    fn run(src: &str) -> Interpreter {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(src, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens).parse().expect("parses");
        let locals = Resolver::new().resolve(&statements).expect("resolves");
        let mut interpreter = Interpreter::new();
        interpreter.load_resolution(locals);
        interpreter.interpret(&statements, &mut reporter);
        assert!(!reporter.had_runtime_error(), "unexpected runtime error");
        interpreter
    }

    fn global(interpreter: &Interpreter, name: &str) -> Value {
        let token = Token::new(TokenKind::Identifier, name, Literal::Nil, 1);
        interpreter.globals.borrow().get(&token).unwrap()
    }

    #[test]
    fn arithmetic_honors_precedence() {
        let interpreter = run("var result = 2 + 3 * 4;");
        assert_eq!(global(&interpreter, "result"), Value::Number(14.0));
    }

    #[test]
    fn string_concatenation() {
        let interpreter = run(r#"var result = "foo" + "bar";"#);
        assert_eq!(global(&interpreter, "result"), Value::Str("foobar".to_string()));
    }

    #[test]
    fn string_minus_number_is_a_runtime_error() {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(r#""a" - 1;"#, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens).parse().expect("parses");
        let locals = Resolver::new().resolve(&statements).expect("resolves");
        let mut interpreter = Interpreter::new();
        interpreter.load_resolution(locals);
        interpreter.interpret(&statements, &mut reporter);
        assert!(reporter.had_runtime_error());
    }

    #[test]
    fn closures_capture_shared_mutable_state() {
        let interpreter = run(
            r#"
            fun makeCounter() {
                var count = 0;
                fun increment() {
                    count = count + 1;
                    return count;
                }
                return increment;
            }
            var counter = makeCounter();
            counter();
            var result = counter();
            "#,
        );
        assert_eq!(global(&interpreter, "result"), Value::Number(2.0));
    }

    #[test]
    fn class_fields_and_methods() {
        let interpreter = run(
            r#"
            class Counter {
                init() { this.count = 0; }
                increment() { this.count = this.count + 1; return this.count; }
            }
            var c = Counter();
            c.increment();
            var result = c.increment();
            "#,
        );
        assert_eq!(global(&interpreter, "result"), Value::Number(2.0));
    }

    #[test]
    fn inheritance_dispatches_through_super() {
        let interpreter = run(
            r#"
            class Animal {
                speak() { return "..."; }
            }
            class Dog < Animal {
                speak() { return "Woof, " + super.speak(); }
            }
            var result = Dog().speak();
            "#,
        );
        assert_eq!(global(&interpreter, "result"), Value::Str("Woof, ...".to_string()));
    }

    #[test]
    fn nil_has_no_fields() {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new("nil.field;", &mut reporter).scan_tokens();
        let statements = Parser::new(tokens).parse().expect("parses");
        let locals = Resolver::new().resolve(&statements).expect("resolves");
        let mut interpreter = Interpreter::new();
        interpreter.load_resolution(locals);
        interpreter.interpret(&statements, &mut reporter);
        assert!(reporter.had_runtime_error());
    }

    #[test]
    fn arity_mismatch_is_a_runtime_error() {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new("fun f(a) { return a; } f(1, 2);", &mut reporter).scan_tokens();
        let statements = Parser::new(tokens).parse().expect("parses");
        let locals = Resolver::new().resolve(&statements).expect("resolves");
        let mut interpreter = Interpreter::new();
        interpreter.load_resolution(locals);
        interpreter.interpret(&statements, &mut reporter);
        assert!(reporter.had_runtime_error());
    }
}
