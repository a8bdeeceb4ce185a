//! Script sub-parser: the declaration grammar inside a `<script>` payload.
//!
//! Shares every production with the file-level grammar through the parser
//! core; only the entry loop and the error envelope differ. Diagnostics are
//! line-shifted to the enclosing file and prefixed `script parsing: `.

use super::core::Parser;
use crate::ast::ScriptBlock;
use crate::diagnostics::Diagnostic;
use crate::token::TokenKind;

/// Prefix the lexer puts on `<style scoped>` payloads so the scoped flag
/// survives as plain text.
pub(super) const SCOPED_MARKER: &str = "SCOPED:";

/// Parse a script payload. `start_line` is the source line of the payload's
/// first character.
pub(super) fn parse_script(source: String, start_line: u32) -> (ScriptBlock, Vec<Diagnostic>) {
    let mut block = ScriptBlock {
        line: start_line,
        ..Default::default()
    };

    let mut errors = {
        let mut parser = Parser::with_line_offset(&source, start_line.saturating_sub(1));

        while !parser.at_eof() {
            let before = parser.offset();
            match parser.kind() {
                TokenKind::KwImport => match parser.parse_import() {
                    Some(import) => block.imports.push(import),
                    None => parser.synchronize_decl(),
                },
                TokenKind::KwModel => match parser.parse_model() {
                    Some(model) => block.models.push(model),
                    None => parser.synchronize_decl(),
                },
                TokenKind::KwService => match parser.parse_service() {
                    Some(service) => block.services.push(service),
                    None => parser.synchronize_decl(),
                },
                TokenKind::KwLet | TokenKind::KwConst => match parser.parse_var() {
                    Some(var) => block.vars.push(var),
                    None => parser.synchronize_decl(),
                },
                TokenKind::KwFunc => match parser.parse_function() {
                    Some(func) => block.funcs.push(func),
                    None => parser.synchronize_decl(),
                },
                kind => {
                    parser.error_at_cur(format!("unexpected {kind} at script top level"));
                    parser.bump();
                    parser.synchronize_decl();
                }
            }
            parser.ensure_progress(before);
        }

        parser.take_errors()
    };

    for error in &mut errors {
        error.message = format!("script parsing: {}", error.message);
    }

    block.source = source;
    (block, errors)
}
