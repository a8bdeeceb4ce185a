//! Core parser state machine and low-level operations.
//!
//! The cursor holds the current token and one token of lookahead, pulled
//! lazily from the lexer; nothing earlier is retained. Errors accumulate in
//! an ordered list and the parser never aborts - every entry point returns
//! a (possibly partial) tree.
//!
//! Termination rests on two mechanisms. Every until-delimiter loop calls
//! [`Parser::ensure_progress`] with the offset it started the iteration at
//! and force-bumps when nothing was consumed, and a debug-only fuel counter
//! panics in tests if a loop ever manages to spin without advancing.

#[cfg(debug_assertions)]
use std::cell::Cell;

use crate::diagnostics::Diagnostic;
use crate::lexer::Lexer;
use crate::token::{Position, Token, TokenKind};

#[cfg(debug_assertions)]
const DEFAULT_FUEL: u32 = 4096;

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    source: &'src str,
    pub(super) cur: Token,
    pub(super) peek: Token,
    pub(super) errors: Vec<Diagnostic>,
    /// Suppresses cascading errors reported at the same offset.
    last_error_offset: Option<usize>,
    #[cfg(debug_assertions)]
    fuel: Cell<u32>,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::from_lexer(Lexer::new(source), source)
    }

    /// Parser over a script payload; reported lines are shifted so they
    /// reference the enclosing file.
    pub(super) fn with_line_offset(source: &'src str, line_offset: u32) -> Self {
        Self::from_lexer(Lexer::with_line_offset(source, line_offset), source)
    }

    fn from_lexer(mut lexer: Lexer<'src>, source: &'src str) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        Self {
            lexer,
            source,
            cur,
            peek,
            errors: Vec::new(),
            last_error_offset: None,
            #[cfg(debug_assertions)]
            fuel: Cell::new(DEFAULT_FUEL),
        }
    }

    pub(super) fn source(&self) -> &'src str {
        self.source
    }

    /// Current token kind. Consumes fuel in debug builds so a stuck loop
    /// fails loudly in tests instead of hanging.
    pub(super) fn kind(&self) -> TokenKind {
        #[cfg(debug_assertions)]
        {
            assert!(
                self.fuel.get() > 0,
                "parser is stuck: no progress in {DEFAULT_FUEL} lookups"
            );
            self.fuel.set(self.fuel.get() - 1);
        }
        self.cur.kind
    }

    pub(super) fn at(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }

    pub(super) fn at_eof(&self) -> bool {
        self.cur.kind == TokenKind::Eof
    }

    pub(super) fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.kind == kind
    }

    pub(super) fn offset(&self) -> usize {
        self.cur.position.offset
    }

    /// Advance one token. Resets fuel.
    pub(super) fn bump(&mut self) {
        #[cfg(debug_assertions)]
        self.fuel.set(DEFAULT_FUEL);
        self.cur = std::mem::replace(&mut self.peek, self.lexer.next_token());
    }

    pub(super) fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    /// Expect and consume `kind`. On mismatch: record an error and leave the
    /// token for the caller's recovery.
    pub(super) fn expect(&mut self, kind: TokenKind, what: &str) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error_at_cur(format!("expected {what}, found {}", self.cur.kind));
        false
    }

    /// Expect an identifier and return its literal.
    pub(super) fn expect_ident(&mut self, what: &str) -> Option<String> {
        if self.at(TokenKind::Ident) {
            let name = self.cur.literal.clone();
            self.bump();
            return Some(name);
        }
        self.error_at_cur(format!("expected {what}, found {}", self.cur.kind));
        None
    }

    /// Expect a string literal and return its (unquoted) content.
    pub(super) fn expect_string(&mut self, what: &str) -> Option<String> {
        if self.at(TokenKind::Str) {
            let value = self.cur.literal.clone();
            self.bump();
            return Some(value);
        }
        self.error_at_cur(format!("expected {what}, found {}", self.cur.kind));
        None
    }

    /// Consume a contextual keyword such as `from`, which lexes as an
    /// ordinary identifier.
    pub(super) fn eat_contextual(&mut self, word: &str) -> bool {
        if self.at(TokenKind::Ident) && self.cur.literal == word {
            self.bump();
            return true;
        }
        false
    }

    pub(super) fn error_at_cur(&mut self, message: impl Into<String>) {
        self.error_at(self.cur.position, message);
    }

    pub(super) fn error_at(&mut self, position: Position, message: impl Into<String>) {
        if self.last_error_offset == Some(position.offset) {
            return;
        }
        self.last_error_offset = Some(position.offset);
        self.errors.push(Diagnostic::error(position, message));
    }

    pub(super) fn take_errors(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.errors)
    }

    /// Progress guard: force one token of progress when a loop iteration
    /// left the cursor where it started. `before` is the offset captured at
    /// the top of the iteration.
    pub(super) fn ensure_progress(&mut self, before: usize) {
        if self.cur.position.offset == before && !self.at_eof() {
            self.bump();
        }
    }

    /// Skip ahead to a point the file-level grammar can restart from: a raw
    /// section payload or a closing brace.
    pub(super) fn synchronize(&mut self) {
        while !self.at_eof()
            && !self.cur.kind.is_raw_section()
            && self.cur.kind != TokenKind::RBrace
        {
            self.bump();
        }
    }

    pub(super) fn at_decl_start(&self) -> bool {
        matches!(
            self.cur.kind,
            TokenKind::KwImport
                | TokenKind::KwModel
                | TokenKind::KwService
                | TokenKind::KwLet
                | TokenKind::KwConst
                | TokenKind::KwFunc
        )
    }

    /// Skip ahead to the next declaration keyword. Script-level recovery.
    pub(super) fn synchronize_decl(&mut self) {
        while !self.at_eof() && !self.at_decl_start() {
            self.bump();
        }
    }
}
