//! Accumulated diagnostics for the compilation pipeline.
//!
//! Every stage appends to an ordered list instead of aborting: the lexer
//! emits `Illegal` tokens, the parser records and recovers, the resolver
//! collects prose errors per import. The driver decides what the sum means.
//!
//! The wire format is `line:column: message`; [`render`] additionally
//! produces annotated terminal output for the CLI.

use std::fmt;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};
use serde::Serialize;

use crate::token::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

/// A single diagnostic. Resolver diagnostics are prose and carry no
/// position; everything the parser produces points at a token.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    pub message: String,
}

impl Diagnostic {
    pub fn error(position: Position, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            position: Some(position),
            message: message.into(),
        }
    }

    /// Positionless error, used by the resolver.
    pub fn prose(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            position: None,
            message: message.into(),
        }
    }

    /// Positionless warning, used for duplicate-merge notices.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            position: None,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(p) => write!(f, "{}:{}: {}", p.line, p.column, self.message),
            None => f.write_str(&self.message),
        }
    }
}

pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(Diagnostic::is_error)
}

/// Render positioned diagnostics as annotated snippets; positionless ones
/// fall back to plain `error:`/`warning:` lines.
pub fn render(source: &str, diagnostics: &[Diagnostic], path: Option<&str>) -> String {
    if diagnostics.is_empty() {
        return String::new();
    }

    let renderer = Renderer::plain();
    let mut output = String::new();

    for diagnostic in diagnostics {
        if !output.is_empty() {
            output.push('\n');
        }

        let level = match diagnostic.severity {
            Severity::Error => Level::ERROR,
            Severity::Warning => Level::WARNING,
        };

        let Some(position) = diagnostic.position else {
            let tag = match diagnostic.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            output.push_str(&format!("{tag}: {}\n", diagnostic.message));
            continue;
        };

        let start = position.offset.min(source.len());
        let end = (start + 1).min(source.len()).max(start);

        let mut snippet = Snippet::source(source).line_start(1).annotation(
            AnnotationKind::Primary
                .span(start..end)
                .label(&diagnostic.message),
        );
        if let Some(p) = path {
            snippet = snippet.path(p);
        }

        let report: Vec<Group> = vec![level.primary_title(&diagnostic.message).element(snippet)];
        output.push_str(&renderer.render(&report).to_string());
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_display_is_line_column_message() {
        let d = Diagnostic::error(
            Position {
                line: 3,
                column: 7,
                offset: 21,
            },
            "expected field name",
        );
        assert_eq!(d.to_string(), "3:7: expected field name");
    }

    #[test]
    fn prose_display_is_the_bare_message() {
        let d = Diagnostic::prose("circular import detected: /a/b.gmx");
        assert_eq!(d.to_string(), "circular import detected: /a/b.gmx");
    }

    #[test]
    fn render_mentions_every_message() {
        let source = "model {\n}";
        let diagnostics = vec![
            Diagnostic::error(
                Position {
                    line: 1,
                    column: 7,
                    offset: 6,
                },
                "expected model name",
            ),
            Diagnostic::prose("parse errors in ./x.gmx"),
        ];
        let out = render(source, &diagnostics, Some("app.gmx"));
        assert!(out.contains("expected model name"));
        assert!(out.contains("parse errors in ./x.gmx"));
    }
}
