use crate::error::Error;
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::Token;
use log::{debug, trace};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// The static-analysis pass between parsing and evaluation: walks the
/// tree once, tracking a stack of block scopes, and emits a mapping from
/// expression identity to hop-count for every variable/`this`/`super`
/// reference it can bind to a local scope (spec.md §4.2). References that
/// fall off the bottom of the stack are left unresolved — the evaluator's
/// fallback path treats a missing entry as global.
pub struct Resolver {
    scopes: Vec<HashMap<String, bool>>,
    locals: HashMap<ExprId, usize>,
    current_function: FunctionType,
    current_class: ClassType,
    errors: Vec<Error>,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            locals: HashMap::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            errors: Vec::new(),
        }
    }

    pub fn resolve(mut self, statements: &[Stmt]) -> Result<HashMap<ExprId, usize>, Vec<Error>> {
        self.resolve_stmts(statements);
        if self.errors.is_empty() {
            Ok(self.locals)
        } else {
            Err(self.errors)
        }
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) {
        for statement in statements {
            self.resolve_stmt(statement);
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),
            Stmt::Var { name, initializer } => {
                self.declare(name);
                if let Some(init) = initializer {
                    self.resolve_expr(init);
                }
                self.define(name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_stmts(statements);
                self.end_scope();
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }
            Stmt::Function(decl) => {
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.errors.push(Error::resolve(
                        keyword.clone(),
                        "Can't return from top-level code.",
                    ));
                }
                if let Some(value) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.errors.push(Error::resolve(
                            keyword.clone(),
                            "Can't return a value from an initializer.",
                        ));
                    }
                    self.resolve_expr(value);
                }
            }
            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),
        }
    }

    fn resolve_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[std::rc::Rc<FunctionDecl>],
    ) {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(Expr::Variable {
            name: super_name, ..
        }) = superclass
        {
            if super_name.lexeme == name.lexeme {
                self.errors.push(Error::resolve(
                    super_name.clone(),
                    "A class can't inherit from itself.",
                ));
            }
            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass.expect("checked above"));

            self.begin_scope();
            self.scopes
                .last_mut()
                .expect("scope just pushed")
                .insert("super".to_string(), true);
        }

        self.begin_scope();
        self.scopes
            .last_mut()
            .expect("scope just pushed")
            .insert("this".to_string(), true);

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };
            self.resolve_function(method, kind);
        }

        self.end_scope(); // this
        if superclass.is_some() {
            self.end_scope(); // super
        }

        self.current_class = enclosing_class;
    }

    fn resolve_function(&mut self, decl: &FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        self.resolve_stmts(&decl.body);
        self.end_scope();

        self.current_function = enclosing_function;
    }

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Variable { name, .. } => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&name.lexeme) == Some(&false) {
                        self.errors.push(Error::resolve(
                            name.clone(),
                            "Can't read local variable in its own initializer.",
                        ));
                    }
                }
                self.resolve_local(expr, name);
            }
            Expr::Assign { name, value, .. } => {
                self.resolve_expr(value);
                self.resolve_local(expr, name);
            }
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }
            Expr::Unary { right, .. } | Expr::Grouping { expression: right, .. } => {
                self.resolve_expr(right);
            }
            Expr::Literal { .. } => {}
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }
            Expr::Get { object, .. } => self.resolve_expr(object),
            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }
            Expr::This { keyword, .. } => {
                if self.current_class == ClassType::None {
                    self.errors.push(Error::resolve(
                        keyword.clone(),
                        "Can't use 'this' outside of a class.",
                    ));
                    return;
                }
                self.resolve_local(expr, keyword);
            }
            Expr::Super { keyword, .. } => {
                match self.current_class {
                    ClassType::None => self.errors.push(Error::resolve(
                        keyword.clone(),
                        "Can't use 'super' outside of a class.",
                    )),
                    ClassType::Class => self.errors.push(Error::resolve(
                        keyword.clone(),
                        "Can't use 'super' in a class with no superclass.",
                    )),
                    ClassType::Subclass => self.resolve_local(expr, keyword),
                }
            }
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
        trace!("begin_scope: depth {}", self.scopes.len());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
        trace!("end_scope: depth {}", self.scopes.len());
    }

    /// Declares `name` as "not yet ready" in the innermost scope, which is
    /// what lets `var a = a;` be caught as reading a variable in its own
    /// initializer (spec.md §4.2). Redeclaring a name already present in
    /// the same local scope is an error; the same is allowed at global
    /// scope, which isn't tracked on this stack at all.
    fn declare(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                self.errors.push(Error::resolve(
                    name.clone(),
                    "Already a variable with this name in this scope.",
                ));
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, expr: &Expr, name: &Token) {
        for (distance, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                debug!("resolved '{}' at distance {distance}", name.lexeme);
                self.locals.insert(expr.id(), distance);
                return;
            }
        }
        // Not found in any local scope: treat as global, no entry recorded.
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;
    use crate::error::ErrorReporter;

    fn resolve(src: &str) -> Result<HashMap<ExprId, usize>, Vec<Error>> {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(src, &mut reporter).scan_tokens();
        let statements = Parser::new(tokens).parse().expect("parses");
        Resolver::new().resolve(&statements)
    }

    #[test]
    fn shadowing_block_resolves_to_distinct_scopes() {
        // The canonical resolver test (spec.md §8): both `show()` calls
        // must resolve `a` to the *global*, since the block's `var a`
        // declaration comes after the function is defined and closes
        // over the scope as it existed at definition time.
        let locals = resolve(
            r#"
            var a = "global";
            {
                fun show() { print a; }
                show();
                var a = "local";
                show();
            }
            "#,
        )
        .unwrap();
        // `a` inside `show` never resolves locally — it's global, so no
        // entry should exist for either read.
        assert!(locals.is_empty());
    }

    #[test]
    fn read_in_own_initializer_is_a_resolve_error() {
        let result = resolve("{ var a = a; }");
        assert!(result.is_err());
    }

    #[test]
    fn return_from_top_level_is_a_resolve_error() {
        assert!(resolve("return 1;").is_err());
    }

    #[test]
    fn self_inheritance_is_a_resolve_error() {
        assert!(resolve("class Oops < Oops {}").is_err());
    }

    #[test]
    fn this_outside_class_is_a_resolve_error() {
        assert!(resolve("print this;").is_err());
    }
}
