//! Parser for Moorhen scripts.
//!
//! Turns tokens into [`Ast`] forms. The parser never stops at the first
//! problem: a malformed top-level form is recorded as a [`Diagnostic`] and
//! parsing resumes with the next form, so one compile reports every syntax
//! error in the snippet.
//!
//! Nesting is bounded: a form nested deeper than the parser's limit is
//! reported and skipped without recursing into it, so later stages never
//! see a tree deep enough to exhaust the stack.

use moorhen_foundation::{Diagnostic, Error, Result};

use crate::ast::Ast;
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// How deeply lists and vectors may nest unless configured otherwise.
pub const DEFAULT_MAX_NESTING: usize = 64;

/// Forms and diagnostics from one parse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParseOutput {
    /// Top-level forms that parsed cleanly.
    pub forms: Vec<Ast>,
    /// Every syntax error found.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseOutput {
    /// Returns true if any error was reported.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Recursive-descent parser over a [`Lexer`].
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    current: Token,
    diagnostics: Vec<Diagnostic>,
    depth: usize,
    max_nesting: usize,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        let mut parser = Self {
            lexer,
            current,
            diagnostics: Vec::new(),
            depth: 0,
            max_nesting: DEFAULT_MAX_NESTING,
        };
        parser.skip_trivia();
        parser
    }

    /// Sets how deeply forms may nest.
    #[must_use]
    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    /// Parses every top-level form, recovering after malformed ones.
    #[must_use]
    pub fn parse_all(mut self) -> ParseOutput {
        let mut forms = Vec::new();
        while self.current.kind != TokenKind::Eof {
            if let Some(form) = self.parse_form() {
                forms.push(form);
            }
        }
        ParseOutput {
            forms,
            diagnostics: self.diagnostics,
        }
    }

    /// Parses one form. Returns `None` after recording a diagnostic.
    fn parse_form(&mut self) -> Option<Ast> {
        let token = self.current.clone();
        let span = token.span;

        match token.kind {
            TokenKind::LParen => self.parse_sequence(TokenKind::RParen).map(|(items, end)| {
                Ast::List(items, span.to(end))
            }),
            TokenKind::LBracket => self
                .parse_sequence(TokenKind::RBracket)
                .map(|(items, end)| Ast::Vector(items, span.to(end))),
            TokenKind::RParen | TokenKind::RBracket => {
                self.report(span, format!("unexpected {}", token.kind.name()));
                self.advance();
                None
            }
            TokenKind::Error(message) => {
                self.report(span, message);
                self.advance();
                None
            }
            TokenKind::Eof => {
                self.report(span, "unexpected end of input");
                None
            }
            TokenKind::Comment(_) => {
                self.advance();
                self.parse_form()
            }
            atom => {
                self.advance();
                Some(match atom {
                    TokenKind::Nil => Ast::Nil(span),
                    TokenKind::True => Ast::Bool(true, span),
                    TokenKind::False => Ast::Bool(false, span),
                    TokenKind::Int(n) => Ast::Int(n, span),
                    TokenKind::Float(n) => Ast::Float(n, span),
                    TokenKind::String(s) => Ast::String(s, span),
                    TokenKind::Symbol(s) => Ast::Symbol(s, span),
                    TokenKind::Handle(n) => Ast::Handle(n, span),
                    _ => return None,
                })
            }
        }
    }

    /// Parses elements up to `close`, consuming the opening delimiter.
    ///
    /// A sequence containing a malformed element is dropped as a whole, but
    /// its remaining elements are still scanned so their errors surface. A
    /// mismatched closing delimiter ends the sequence.
    fn parse_sequence(&mut self, close: TokenKind) -> Option<(Vec<Ast>, Span)> {
        if self.depth >= self.max_nesting {
            let open = self.current.span;
            self.report(
                open,
                format!("forms nested deeper than {} levels", self.max_nesting),
            );
            self.skip_sequence();
            return None;
        }
        self.depth += 1;
        let result = self.parse_sequence_items(close);
        self.depth -= 1;
        result
    }

    fn parse_sequence_items(&mut self, close: TokenKind) -> Option<(Vec<Ast>, Span)> {
        let open = self.current.span;
        let errors_before = self.diagnostics.len();
        self.advance();

        let mut items = Vec::new();
        loop {
            if self.current.kind == close {
                let end = self.current.span;
                self.advance();
                return (self.diagnostics.len() == errors_before).then_some((items, end));
            }
            match self.current.kind {
                TokenKind::Eof => {
                    self.report(
                        open,
                        format!(
                            "unclosed delimiter opened at {}:{}, expected {}",
                            open.line,
                            open.column,
                            close.name()
                        ),
                    );
                    return None;
                }
                TokenKind::RParen | TokenKind::RBracket => {
                    let span = self.current.span;
                    self.report(
                        span,
                        format!(
                            "mismatched delimiter: expected {}, found {}",
                            close.name(),
                            self.current.kind.name()
                        ),
                    );
                    self.advance();
                    return None;
                }
                _ => {
                    if let Some(item) = self.parse_form() {
                        items.push(item);
                    }
                }
            }
        }
    }

    /// Skips the sequence opening at the current token, and everything
    /// nested in it, without recursing.
    fn skip_sequence(&mut self) {
        let mut open = 0usize;
        loop {
            match self.current.kind {
                TokenKind::LParen | TokenKind::LBracket => open += 1,
                TokenKind::RParen | TokenKind::RBracket => open = open.saturating_sub(1),
                TokenKind::Eof => return,
                _ => {}
            }
            self.advance();
            if open == 0 {
                return;
            }
        }
    }

    fn skip_trivia(&mut self) {
        while self.current.kind.is_trivia() {
            self.current = self.lexer.next_token();
        }
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
        self.skip_trivia();
    }

    fn report(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::error(message, span.line, span.column));
    }
}

/// Parses source into forms plus diagnostics.
#[must_use]
pub fn parse(source: &str) -> ParseOutput {
    Parser::new(source).parse_all()
}

/// Parses source with a nesting limit other than [`DEFAULT_MAX_NESTING`].
#[must_use]
pub fn parse_with_max_nesting(source: &str, max_nesting: usize) -> ParseOutput {
    Parser::new(source)
        .with_max_nesting(max_nesting)
        .parse_all()
}

/// Parses source, failing with every syntax error if there are any.
///
/// # Errors
///
/// Returns [`CompilationError`](moorhen_foundation::ErrorKind::CompilationError)
/// carrying all diagnostics.
pub fn parse_strict(source: &str) -> Result<Vec<Ast>> {
    let output = parse(source);
    if output.has_errors() {
        return Err(Error::compilation(output.diagnostics));
    }
    Ok(output.forms)
}
