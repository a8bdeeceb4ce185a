//! Mode-switching scanner for GMX source files.
//!
//! The scanner produces structured tokens for the declarative grammar and
//! captures the content of top-level sections (`<script>`, `<template>`,
//! `<style>`, `<style scoped>`) verbatim as single raw-payload tokens.
//!
//! Section-tag recognition only fires when the `<` sits at column 1 with
//! brace depth zero, and the attempt is fully reversible: the scanner state
//! is snapshotted before the attempt and restored on failure, so `<` in any
//! expression context degrades to the comparison operator.
//!
//! The scanner never fails. Unclassifiable characters become `Illegal`
//! tokens and both string styles tolerate EOF before the closing quote by
//! returning the content accumulated so far.

use crate::token::{Position, Token, TokenKind, lookup_keyword};

/// Snapshot of the scanner cursor, taken before a section-tag attempt.
#[derive(Debug, Clone, Copy)]
struct State {
    offset: usize,
    line: u32,
    column: u32,
}

pub struct Lexer<'src> {
    source: &'src str,
    offset: usize,
    line: u32,
    column: u32,
    /// `{` increments, `}` decrements. Section tags are only recognized at
    /// depth zero, so `<` inside a model block is unambiguously less-than.
    brace_depth: u32,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self::with_line_offset(source, 0)
    }

    /// Scanner whose first line reports as `line_offset + 1`. Used by the
    /// script sub-parser so diagnostics inside a `<script>` payload point at
    /// source lines rather than payload-relative lines.
    pub fn with_line_offset(source: &'src str, line_offset: u32) -> Self {
        Self {
            source,
            offset: 0,
            line: line_offset + 1,
            column: 1,
            brace_depth: 0,
            finished: false,
        }
    }

    pub fn source(&self) -> &'src str {
        self.source
    }

    fn cur_position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
        }
    }

    fn state(&self) -> State {
        State {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    fn restore(&mut self, state: State) {
        self.offset = state.offset;
        self.line = state.line;
        self.column = state.column;
    }

    fn peek_char(&self) -> Option<char> {
        self.source[self.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        let mut chars = self.source[self.offset..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.offset += c.len_utf8();
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Produce the next token. Linear in the input; returns `Eof` forever
    /// once the end is reached.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let position = self.cur_position();
        let Some(ch) = self.peek_char() else {
            return Token::eof(position);
        };

        match ch {
            '<' => {
                if self.brace_depth == 0 {
                    if let Some(token) = self.try_read_section() {
                        return token;
                    }
                }
                self.advance();
                self.either(position, '=', TokenKind::LtEq, "<=", TokenKind::Lt, "<")
            }
            '>' => {
                self.advance();
                self.either(position, '=', TokenKind::GtEq, ">=", TokenKind::Gt, ">")
            }
            '=' => {
                self.advance();
                self.either(position, '=', TokenKind::Eq, "==", TokenKind::Assign, "=")
            }
            '!' => {
                self.advance();
                self.either(position, '=', TokenKind::NotEq, "!=", TokenKind::Bang, "!")
            }
            '&' => {
                self.advance();
                self.either(
                    position,
                    '&',
                    TokenKind::AndAnd,
                    "&&",
                    TokenKind::Illegal,
                    "&",
                )
            }
            '|' => {
                self.advance();
                self.either(position, '|', TokenKind::OrOr, "||", TokenKind::Illegal, "|")
            }
            '+' => self.single(position, TokenKind::Plus, "+"),
            '-' => self.single(position, TokenKind::Minus, "-"),
            '*' => self.single(position, TokenKind::Star, "*"),
            '/' => self.single(position, TokenKind::Slash, "/"),
            '%' => self.single(position, TokenKind::Percent, "%"),
            ',' => self.single(position, TokenKind::Comma, ","),
            ';' => self.single(position, TokenKind::Semicolon, ";"),
            ':' => self.single(position, TokenKind::Colon, ":"),
            '.' => self.single(position, TokenKind::Dot, "."),
            '(' => self.single(position, TokenKind::LParen, "("),
            ')' => self.single(position, TokenKind::RParen, ")"),
            '{' => {
                self.brace_depth += 1;
                self.single(position, TokenKind::LBrace, "{")
            }
            '}' => {
                self.brace_depth = self.brace_depth.saturating_sub(1);
                self.single(position, TokenKind::RBrace, "}")
            }
            '[' => self.single(position, TokenKind::LBracket, "["),
            ']' => self.single(position, TokenKind::RBracket, "]"),
            '@' => self.single(position, TokenKind::At, "@"),
            '"' => self.read_string(position),
            '`' => self.read_raw_string(position),
            c if c.is_ascii_digit() => self.read_number(position),
            c if is_ident_start(c) => self.read_identifier(position),
            c => {
                self.advance();
                Token::new(TokenKind::Illegal, c.to_string(), position)
            }
        }
    }

    fn single(&mut self, position: Position, kind: TokenKind, literal: &str) -> Token {
        self.advance();
        Token::new(kind, literal, position)
    }

    /// The first character is already consumed; pick the two-character kind
    /// when `second` follows, the one-character kind otherwise.
    fn either(
        &mut self,
        position: Position,
        second: char,
        double: TokenKind,
        double_literal: &str,
        single: TokenKind,
        single_literal: &str,
    ) -> Token {
        if self.peek_char() == Some(second) {
            self.advance();
            Token::new(double, double_literal, position)
        } else {
            Token::new(single, single_literal, position)
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek_char() {
                Some(' ' | '\t' | '\r' | '\n') => self.advance(),
                Some('/') if self.peek_second() == Some('/') => {
                    while self.peek_char().is_some_and(|c| c != '\n') {
                        self.advance();
                    }
                }
                Some('/') if self.peek_second() == Some('*') => {
                    self.advance();
                    self.advance();
                    loop {
                        match self.peek_char() {
                            None => break,
                            Some('*') if self.peek_second() == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Attempt to read a section tag at the cursor (which sits on `<`).
    /// Returns `None` after restoring the cursor when the text is not one of
    /// the recognized openers anchored at column 1.
    fn try_read_section(&mut self) -> Option<Token> {
        if self.column != 1 {
            return None;
        }
        let saved = self.state();
        self.advance(); // '<'

        let src = self.source;
        let name_start = self.offset;
        while self.peek_char().is_some_and(|c| c.is_ascii_lowercase()) {
            self.advance();
        }
        let name = &src[name_start..self.offset];

        let kind = match name {
            "script" => TokenKind::RawScript,
            "template" => TokenKind::RawTemplate,
            "style" => TokenKind::RawStyle,
            _ => {
                self.restore(saved);
                return None;
            }
        };

        let mut scoped = false;
        if kind == TokenKind::RawStyle && matches!(self.peek_char(), Some(' ' | '\t')) {
            while matches!(self.peek_char(), Some(' ' | '\t')) {
                self.advance();
            }
            let word_start = self.offset;
            while self.peek_char().is_some_and(|c| c.is_ascii_lowercase()) {
                self.advance();
            }
            if &src[word_start..self.offset] != "scoped" {
                self.restore(saved);
                return None;
            }
            scoped = true;
            while matches!(self.peek_char(), Some(' ' | '\t')) {
                self.advance();
            }
        }

        if self.peek_char() != Some('>') {
            self.restore(saved);
            return None;
        }
        self.advance(); // '>'

        Some(self.read_section_payload(kind, name, scoped))
    }

    /// Capture everything up to the matching closing tag (or EOF, tolerant),
    /// trimmed of outer whitespace. The token position is the first payload
    /// character, which gives the script sub-parser an exact line offset.
    fn read_section_payload(&mut self, kind: TokenKind, name: &str, scoped: bool) -> Token {
        let src = self.source;
        let closer = format!("</{name}>");
        let body_end = match src[self.offset..].find(&closer) {
            Some(i) => self.offset + i,
            None => src.len(),
        };

        while self.offset < body_end && self.peek_char().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
        let position = self.cur_position();
        let payload = src[self.offset..body_end].trim_end();

        while self.offset < body_end {
            self.advance();
        }
        if body_end < src.len() {
            for _ in 0..closer.len() {
                self.advance();
            }
        }

        let literal = if scoped {
            format!("SCOPED:{payload}")
        } else {
            payload.to_string()
        };
        Token::new(kind, literal, position)
    }

    fn read_string(&mut self, position: Position) -> Token {
        self.advance(); // opening quote
        let mut literal = String::new();
        loop {
            match self.peek_char() {
                None => break, // unterminated: keep what we have
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    // escape pairs are preserved verbatim
                    literal.push('\\');
                    self.advance();
                    if let Some(c) = self.peek_char() {
                        literal.push(c);
                        self.advance();
                    }
                }
                Some(c) => {
                    literal.push(c);
                    self.advance();
                }
            }
        }
        Token::new(TokenKind::Str, literal, position)
    }

    /// Backtick string: raw, multi-line, no escapes.
    fn read_raw_string(&mut self, position: Position) -> Token {
        self.advance(); // opening backtick
        let src = self.source;
        let start = self.offset;
        while self.peek_char().is_some_and(|c| c != '`') {
            self.advance();
        }
        let literal = &src[start..self.offset];
        if self.peek_char() == Some('`') {
            self.advance();
        }
        Token::new(TokenKind::Str, literal, position)
    }

    fn read_number(&mut self, position: Position) -> Token {
        let src = self.source;
        let start = self.offset;
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let mut kind = TokenKind::Int;
        // a trailing '.' is not part of the number
        if self.peek_char() == Some('.') && self.peek_second().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
            }
            kind = TokenKind::Float;
        }
        Token::new(kind, &src[start..self.offset], position)
    }

    fn read_identifier(&mut self, position: Position) -> Token {
        let src = self.source;
        let start = self.offset;
        self.advance();
        while self.peek_char().is_some_and(is_ident_continue) {
            self.advance();
        }
        let literal = &src[start..self.offset];
        let kind = lookup_keyword(literal).unwrap_or(TokenKind::Ident);
        Token::new(kind, literal, position)
    }
}

/// Unicode letters and `_` start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

/// Hyphens continue identifiers so kebab-case attribute names such as
/// `hx-post` lex as a single token.
fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    /// Yields every token including a final `Eof`, then `None`.
    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.finished = true;
        }
        Some(token)
    }
}
