use crate::error::ErrorReporter;
use crate::token::TokenKind::*;
use crate::token::{Literal, Token, TokenKind};
use std::collections::HashMap;

/// The first step in any compiler or interpreter is scanning. The scanner
/// takes in raw source code as a series of characters and groups it into
/// a series of chunks we call tokens: the meaningful "words" and
/// "punctuation" that make up the language's grammar.
pub struct Scanner<'r> {
    source: Vec<char>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
    reporter: &'r mut ErrorReporter,
}

impl<'r> Scanner<'r> {
    pub fn new(source: &str, reporter: &'r mut ErrorReporter) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: vec![],
            start: 0,
            current: 0,
            line: 1,
            reporter,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }
        self.tokens
            .push(Token::new(Eof, "", Literal::Nil, self.line));
        self.tokens
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn scan_token(&mut self) {
        let line = self.line;
        let c = self.advance();
        match c {
            '(' => self.add_token(LeftParen),
            ')' => self.add_token(RightParen),
            '{' => self.add_token(LeftBrace),
            '}' => self.add_token(RightBrace),
            ',' => self.add_token(Comma),
            '.' => self.add_token(Dot),
            '-' => self.add_token(Minus),
            '+' => self.add_token(Plus),
            ';' => self.add_token(Semicolon),
            '*' => self.add_token(Star),

            '!' => {
                let kind = if self.match_next('=') { BangEqual } else { Bang };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_next('=') { EqualEqual } else { Equal };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_next('=') { LessEqual } else { Less };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_next('=') { GreaterEqual } else { Greater };
                self.add_token(kind);
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '/' => self.slash_or_comment(),
            '"' => self.string(),
            c if c.is_ascii_digit() => self.number(),
            c if is_alpha(c) => self.identifier(),

            _ => {
                self.reporter
                    .error_at_line(line, format!("Unexpected character: {c}"));
            }
        }
    }

    /// `//` runs to end of line; `/* ... */` nests, per spec.md §6.
    fn slash_or_comment(&mut self) {
        if self.match_next('/') {
            while self.peek() != '\n' && !self.is_at_end() {
                self.advance();
            }
        } else if self.match_next('*') {
            let start_line = self.line;
            let mut depth = 1usize;
            while depth > 0 {
                if self.is_at_end() {
                    self.reporter
                        .error_at_line(start_line, "Unterminated block comment.");
                    return;
                }
                match self.peek() {
                    '\n' => {
                        self.line += 1;
                        self.advance();
                    }
                    '/' if self.peek_next() == '*' => {
                        self.advance();
                        self.advance();
                        depth += 1;
                    }
                    '*' if self.peek_next() == '/' => {
                        self.advance();
                        self.advance();
                        depth -= 1;
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
        } else {
            self.add_token(Slash);
        }
    }

    fn string(&mut self) {
        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.reporter
                .error_at_line(self.line, "Unterminated string.");
            return;
        }

        self.advance(); // the closing "

        let value: String = self.source[self.start + 1..self.current - 1]
            .iter()
            .collect();
        self.add_token_with_literal(String, Literal::Str(value));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        let value: f64 = text.parse().expect("scanned digits always parse");
        self.add_token_with_literal(Number, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while is_alpha_numeric(self.peek()) {
            self.advance();
        }
        let text: String = self.source[self.start..self.current].iter().collect();
        match keyword(&text) {
            Some(True) => self.add_token_with_literal(True, Literal::Bool(true)),
            Some(False) => self.add_token_with_literal(False, Literal::Bool(false)),
            Some(Nil) => self.add_token_with_literal(Nil, Literal::Nil),
            Some(kind) => self.add_token(kind),
            None => self.add_token(Identifier),
        }
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        c
    }

    fn add_token(&mut self, kind: TokenKind) {
        self.add_token_with_literal(kind, Literal::Nil);
    }

    fn add_token_with_literal(&mut self, kind: TokenKind, literal: Literal) {
        let text: String = self.source[self.start..self.current].iter().collect();
        self.tokens.push(Token::new(kind, text, literal, self.line));
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            return false;
        }
        self.current += 1;
        true
    }

    fn peek(&self) -> char {
        *self.source.get(self.current).unwrap_or(&'\0')
    }

    fn peek_next(&self) -> char {
        *self.source.get(self.current + 1).unwrap_or(&'\0')
    }
}

fn is_alpha(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_alpha_numeric(c: char) -> bool {
    is_alpha(c) || c.is_ascii_digit()
}

fn keyword(text: &str) -> Option<TokenKind> {
    thread_local! {
        static KEYWORDS: HashMap<&'static str, TokenKind> = HashMap::from([
            ("and", And),
            ("class", Class),
            ("else", Else),
            ("false", False),
            ("for", For),
            ("fun", Fun),
            ("if", If),
            ("nil", Nil),
            ("or", Or),
            ("print", Print),
            ("return", Return),
            ("super", Super),
            ("this", This),
            ("true", True),
            ("var", Var),
            ("while", While),
        ]);
    }
    KEYWORDS.with(|k| k.get(text).copied())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(src: &str) -> Vec<Token> {
        let mut reporter = ErrorReporter::new();
        Scanner::new(src, &mut reporter).scan_tokens()
    }

    #[test]
    fn nested_block_comments() {
        let tokens = scan("1 /* outer /* inner */ still outer */ + 2;");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Number, Plus, Number, Semicolon, Eof]);
    }

    #[test]
    fn keywords_carry_literal_values() {
        let tokens = scan("true false nil");
        assert_eq!(tokens[0].literal, Literal::Bool(true));
        assert_eq!(tokens[1].literal, Literal::Bool(false));
        assert_eq!(tokens[2].literal, Literal::Nil);
    }
}
