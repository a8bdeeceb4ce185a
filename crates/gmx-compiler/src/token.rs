//! Token model for the GMX source format.
//!
//! Tokens are produced one at a time by the lexer and carry the exact source
//! position of their first character. Raw section payloads (`<script>`,
//! `<template>`, `<style>`) travel as single tokens whose literal is the
//! verbatim section content.

use std::fmt;

use serde::Serialize;

/// A location in the source text. Lines and columns are 1-based, the byte
/// offset is 0-based. Columns reset on every newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The fixed tag set of the GMX surface syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// A character the lexer could not classify.
    Illegal,
    Eof,

    Ident,
    Int,
    Float,
    Str,

    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    AndAnd,
    OrOr,

    Comma,
    Semicolon,
    Colon,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    At,

    KwFunc,
    KwLet,
    KwConst,
    KwIf,
    KwElse,
    KwReturn,
    KwTrue,
    KwFalse,
    KwModel,
    KwService,
    KwImport,
    KwAs,
    KwTry,
    KwRender,
    KwCtx,
    KwError,
    KwTask,

    /// Verbatim `<script>` payload.
    RawScript,
    /// Verbatim `<template>` payload.
    RawTemplate,
    /// Verbatim `<style>` payload, prefixed `SCOPED:` for `<style scoped>`.
    RawStyle,
}

impl TokenKind {
    pub fn is_raw_section(self) -> bool {
        matches!(
            self,
            TokenKind::RawScript | TokenKind::RawTemplate | TokenKind::RawStyle
        )
    }

    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::KwFunc
                | TokenKind::KwLet
                | TokenKind::KwConst
                | TokenKind::KwIf
                | TokenKind::KwElse
                | TokenKind::KwReturn
                | TokenKind::KwTrue
                | TokenKind::KwFalse
                | TokenKind::KwModel
                | TokenKind::KwService
                | TokenKind::KwImport
                | TokenKind::KwAs
                | TokenKind::KwTry
                | TokenKind::KwRender
                | TokenKind::KwCtx
                | TokenKind::KwError
                | TokenKind::KwTask
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Illegal => "illegal character",
            TokenKind::Eof => "end of input",
            TokenKind::Ident => "identifier",
            TokenKind::Int => "integer",
            TokenKind::Float => "float",
            TokenKind::Str => "string",
            TokenKind::Assign => "'='",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Star => "'*'",
            TokenKind::Slash => "'/'",
            TokenKind::Percent => "'%'",
            TokenKind::Bang => "'!'",
            TokenKind::Eq => "'=='",
            TokenKind::NotEq => "'!='",
            TokenKind::Lt => "'<'",
            TokenKind::Gt => "'>'",
            TokenKind::LtEq => "'<='",
            TokenKind::GtEq => "'>='",
            TokenKind::AndAnd => "'&&'",
            TokenKind::OrOr => "'||'",
            TokenKind::Comma => "','",
            TokenKind::Semicolon => "';'",
            TokenKind::Colon => "':'",
            TokenKind::Dot => "'.'",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::LBrace => "'{'",
            TokenKind::RBrace => "'}'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::At => "'@'",
            TokenKind::KwFunc => "'func'",
            TokenKind::KwLet => "'let'",
            TokenKind::KwConst => "'const'",
            TokenKind::KwIf => "'if'",
            TokenKind::KwElse => "'else'",
            TokenKind::KwReturn => "'return'",
            TokenKind::KwTrue => "'true'",
            TokenKind::KwFalse => "'false'",
            TokenKind::KwModel => "'model'",
            TokenKind::KwService => "'service'",
            TokenKind::KwImport => "'import'",
            TokenKind::KwAs => "'as'",
            TokenKind::KwTry => "'try'",
            TokenKind::KwRender => "'render'",
            TokenKind::KwCtx => "'ctx'",
            TokenKind::KwError => "'error'",
            TokenKind::KwTask => "'task'",
            TokenKind::RawScript => "script section",
            TokenKind::RawTemplate => "template section",
            TokenKind::RawStyle => "style section",
        };
        f.write_str(text)
    }
}

/// A single token: kind, the literal text it was built from, and the position
/// of its first character.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub literal: String,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, literal: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            literal: literal.into(),
            position,
        }
    }

    pub fn eof(position: Position) -> Self {
        Self::new(TokenKind::Eof, "", position)
    }
}

/// Map an identifier to its keyword kind, if it is one. `from` is contextual
/// (only meaningful inside import forms) and intentionally absent.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    let kind = match ident {
        "func" => TokenKind::KwFunc,
        "let" => TokenKind::KwLet,
        "const" => TokenKind::KwConst,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "return" => TokenKind::KwReturn,
        "true" => TokenKind::KwTrue,
        "false" => TokenKind::KwFalse,
        "model" => TokenKind::KwModel,
        "service" => TokenKind::KwService,
        "import" => TokenKind::KwImport,
        "as" => TokenKind::KwAs,
        "try" => TokenKind::KwTry,
        "render" => TokenKind::KwRender,
        "ctx" => TokenKind::KwCtx,
        "error" => TokenKind::KwError,
        "task" => TokenKind::KwTask,
        _ => return None,
    };
    Some(kind)
}
