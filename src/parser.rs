use crate::error::Error;
use crate::expr::{Expr, ExprId};
use crate::stmt::{FunctionDecl, Stmt};
use crate::token::{Literal, Token, TokenKind};
use std::rc::Rc;

const MAX_ARGS: usize = 255;

/// A straightforward recursive-descent parser over the grammar in
/// spec.md §4.2, one method per precedence level from `assignment` down
/// to `primary`. Each expression node is stamped with a fresh `ExprId` as
/// it's built, so the resolver and evaluator downstream can key off
/// identity without relying on pointers.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    next_id: ExprId,
}

type ParseResult<T> = Result<T, Error>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            current: 0,
            next_id: 0,
        }
    }

    pub fn parse(mut self) -> Result<Vec<Stmt>, Vec<Error>> {
        let mut statements = Vec::new();
        let mut errors = Vec::new();
        while !self.is_at_end() {
            match self.declaration() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    errors.push(err);
                    self.synchronize();
                }
            }
        }
        if errors.is_empty() {
            Ok(statements)
        } else {
            Err(errors)
        }
    }

    fn next_id(&mut self) -> ExprId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // --- declarations -----------------------------------------------------

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.match_kind(&[TokenKind::Class]) {
            self.class_declaration()
        } else if self.match_kind(&[TokenKind::Fun]) {
            self.function_declaration("function").map(Stmt::Function)
        } else if self.match_kind(&[TokenKind::Var]) {
            self.var_declaration()
        } else {
            self.statement()
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect class name.")?;

        let superclass = if self.match_kind(&[TokenKind::Less]) {
            self.consume(TokenKind::Identifier, "Expect superclass name.")?;
            let name = self.previous().clone();
            Some(Expr::Variable {
                id: self.next_id(),
                name,
            })
        } else {
            None
        };

        self.consume(TokenKind::LeftBrace, "Expect '{' before class body.")?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            methods.push(Rc::new(self.function_declaration("method")?));
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    fn function_declaration(&mut self, kind: &str) -> ParseResult<Rc<FunctionDecl>> {
        let name = self.consume(TokenKind::Identifier, &format!("Expect {kind} name."))?;
        self.consume(TokenKind::LeftParen, &format!("Expect '(' after {kind} name."))?;

        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    return Err(Error::parse(
                        self.peek().clone(),
                        format!("Can't have more than {MAX_ARGS} parameters."),
                    ));
                }
                params.push(self.consume(TokenKind::Identifier, "Expect parameter name.")?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        self.consume(TokenKind::RightParen, "Expect ')' after parameters.")?;

        self.consume(TokenKind::LeftBrace, &format!("Expect '{{' before {kind} body."))?;
        let body = self.block()?;

        Ok(Rc::new(FunctionDecl { name, params, body }))
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(TokenKind::Identifier, "Expect variable name.")?;
        let initializer = if self.match_kind(&[TokenKind::Equal]) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var { name, initializer })
    }

    // --- statements ---------------------------------------------------

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.match_kind(&[TokenKind::Print]) {
            self.print_statement()
        } else if self.match_kind(&[TokenKind::LeftBrace]) {
            Ok(Stmt::Block(self.block()?))
        } else if self.match_kind(&[TokenKind::If]) {
            self.if_statement()
        } else if self.match_kind(&[TokenKind::While]) {
            self.while_statement()
        } else if self.match_kind(&[TokenKind::For]) {
            self.for_statement()
        } else if self.match_kind(&[TokenKind::Return]) {
            self.return_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            statements.push(self.declaration()?);
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_kind(&[TokenKind::Else]) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(TokenKind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While { condition, body })
    }

    /// Desugars to a `while` wrapped in a block, rather than adding a
    /// dedicated AST node — spec.md §4.2 treats `for` purely as sugar.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.match_kind(&[TokenKind::Semicolon]) {
            None
        } else if self.match_kind(&[TokenKind::Var]) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(TokenKind::RightParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.consume(TokenKind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        let condition = condition.unwrap_or(Expr::Literal {
            id: self.next_id(),
            value: Literal::Bool(true),
        });
        body = Stmt::While {
            condition,
            body: Box::new(body),
        };

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    // --- expressions ----------------------------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.or()?;

        if self.match_kind(&[TokenKind::Equal]) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: self.next_id(),
                    name,
                    value: Box::new(value),
                }),
                Expr::Get { object, name, .. } => Ok(Expr::Set {
                    id: self.next_id(),
                    object,
                    name,
                    value: Box::new(value),
                }),
                _ => Err(Error::parse(equals, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.and()?;
        while self.match_kind(&[TokenKind::Or]) {
            let operator = self.previous().clone();
            let right = self.and()?;
            expr = Expr::Logical {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.match_kind(&[TokenKind::And]) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::Logical {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary_left_assoc(
            &[TokenKind::BangEqual, TokenKind::EqualEqual],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary_left_assoc(
            &[
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary_left_assoc(&[TokenKind::Minus, TokenKind::Plus], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary_left_assoc(&[TokenKind::Slash, TokenKind::Star], Self::unary)
    }

    fn binary_left_assoc(
        &mut self,
        kinds: &[TokenKind],
        mut operand: impl FnMut(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr = operand(self)?;
        while self.match_kind(kinds) {
            let operator = self.previous().clone();
            let right = operand(self)?;
            expr = Expr::Binary {
                id: self.next_id(),
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.match_kind(&[TokenKind::Bang, TokenKind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::Unary {
                id: self.next_id(),
                operator,
                right: Box::new(right),
            });
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.match_kind(&[TokenKind::LeftParen]) {
                expr = self.finish_call(expr)?;
            } else if self.match_kind(&[TokenKind::Dot]) {
                let name = self.consume(TokenKind::Identifier, "Expect property name after '.'.")?;
                expr = Expr::Get {
                    id: self.next_id(),
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    return Err(Error::parse(
                        self.peek().clone(),
                        format!("Can't have more than {MAX_ARGS} arguments."),
                    ));
                }
                arguments.push(self.expression()?);
                if !self.match_kind(&[TokenKind::Comma]) {
                    break;
                }
            }
        }
        let paren = self.consume(TokenKind::RightParen, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            id: self.next_id(),
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.match_kind(&[TokenKind::False]) {
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: Literal::Bool(false),
            });
        }
        if self.match_kind(&[TokenKind::True]) {
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: Literal::Bool(true),
            });
        }
        if self.match_kind(&[TokenKind::Nil]) {
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: Literal::Nil,
            });
        }
        if self.match_kind(&[TokenKind::Number, TokenKind::String]) {
            let literal = self.previous().literal.clone();
            return Ok(Expr::Literal {
                id: self.next_id(),
                value: literal,
            });
        }
        if self.match_kind(&[TokenKind::Super]) {
            let keyword = self.previous().clone();
            self.consume(TokenKind::Dot, "Expect '.' after 'super'.")?;
            let method = self.consume(TokenKind::Identifier, "Expect superclass method name.")?;
            return Ok(Expr::Super {
                id: self.next_id(),
                keyword,
                method,
            });
        }
        if self.match_kind(&[TokenKind::This]) {
            let keyword = self.previous().clone();
            return Ok(Expr::This {
                id: self.next_id(),
                keyword,
            });
        }
        if self.match_kind(&[TokenKind::Identifier]) {
            let name = self.previous().clone();
            return Ok(Expr::Variable {
                id: self.next_id(),
                name,
            });
        }
        if self.match_kind(&[TokenKind::LeftParen]) {
            let expression = self.expression()?;
            self.consume(TokenKind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::Grouping {
                id: self.next_id(),
                expression: Box::new(expression),
            });
        }

        Err(Error::parse(self.peek().clone(), "Expect expression."))
    }

    // --- token-stream helpers --------------------------------------------

    fn match_kind(&mut self, kinds: &[TokenKind]) -> bool {
        if kinds.iter().any(|kind| self.check(*kind)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance().clone())
        } else {
            Err(Error::parse(self.peek().clone(), message))
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    /// After a parse error, skips ahead to a plausible statement boundary
    /// so one malformed statement doesn't cascade into dozens of
    /// misleading errors for the rest of the file (spec.md §7).
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == TokenKind::Semicolon {
                return;
            }
            if matches!(
                self.peek().kind,
                TokenKind::Class
                    | TokenKind::Fun
                    | TokenKind::Var
                    | TokenKind::For
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::Print
                    | TokenKind::Return
            ) {
                return;
            }
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorReporter;
    use crate::scanner::Scanner;

    fn parse(src: &str) -> Result<Vec<Stmt>, Vec<Error>> {
        let mut reporter = ErrorReporter::new();
        let tokens = Scanner::new(src, &mut reporter).scan_tokens();
        Parser::new(tokens).parse()
    }

    #[test]
    fn parses_arithmetic_with_precedence() {
        let statements = parse("1 + 2 * 3;").unwrap();
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        assert!(parse("1 = 2;").is_err());
    }

    #[test]
    fn class_with_superclass_parses() {
        let statements = parse("class A {} class B < A { init() {} }").unwrap();
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn for_loop_desugars_to_while() {
        let statements = parse("for (var i = 0; i < 3; i = i + 1) print i;").unwrap();
        assert!(matches!(statements[0], Stmt::Block(_)));
    }

    #[test]
    fn more_than_255_arguments_is_an_error() {
        let args = (0..300).map(|n| n.to_string()).collect::<Vec<_>>().join(", ");
        let src = format!("f({args});");
        assert!(parse(&src).is_err());
    }
}
