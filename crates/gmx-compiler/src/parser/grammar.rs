//! Declaration productions shared by the file-level grammar and the script
//! sub-grammar: imports, models, fields, annotations, services, variables,
//! and functions.
//!
//! The file-level entry point handles the three raw-payload tokens directly
//! and silently skips anything else it does not recognize; sections are the
//! canonical carriers of declarations.

use indexmap::IndexMap;

use super::core::Parser;
use super::script;
use crate::ast::{
    Annotation, Field, Function, Import, Model, Param, POSITIONAL_ARG, Service, SourceFile,
    StyleBlock, TemplateBlock, TypeExpr, Var, VarKind,
};
use crate::token::TokenKind;

impl Parser<'_> {
    pub fn parse_file(&mut self) -> SourceFile {
        let mut file = SourceFile::default();

        while !self.at_eof() {
            let before = self.offset();
            match self.kind() {
                TokenKind::RawTemplate => {
                    file.template = Some(TemplateBlock {
                        source: self.cur.literal.clone(),
                    });
                    self.bump();
                }
                TokenKind::RawStyle => {
                    let literal = self.cur.literal.clone();
                    let (source, scoped) = match literal.strip_prefix(script::SCOPED_MARKER) {
                        Some(rest) => (rest.to_string(), true),
                        None => (literal, false),
                    };
                    file.style = Some(StyleBlock { source, scoped });
                    self.bump();
                }
                TokenKind::RawScript => {
                    let payload = self.cur.literal.clone();
                    let line = self.cur.position.line;
                    self.bump();
                    let (block, errors) = script::parse_script(payload, line);
                    self.errors.extend(errors);
                    self.merge_script_block(&mut file, block);
                }
                TokenKind::KwImport => match self.parse_import() {
                    Some(import) => file.imports.push(import),
                    None => self.synchronize(),
                },
                TokenKind::KwModel => match self.parse_model() {
                    Some(model) => file.models.push(model),
                    None => self.synchronize(),
                },
                TokenKind::KwService => match self.parse_service() {
                    Some(service) => file.services.push(service),
                    None => self.synchronize(),
                },
                TokenKind::KwLet | TokenKind::KwConst => match self.parse_var() {
                    Some(var) => file.vars.push(var),
                    None => self.synchronize(),
                },
                TokenKind::KwFunc => match self.parse_function() {
                    Some(func) => file.script.get_or_insert_default().funcs.push(func),
                    None => self.synchronize(),
                },
                _ => self.bump(),
            }
            self.ensure_progress(before);
        }

        file
    }

    /// Lift a parsed script block's declarations to the file level so
    /// downstream consumers need not descend into the block.
    fn merge_script_block(&mut self, file: &mut SourceFile, block: crate::ast::ScriptBlock) {
        file.imports.extend(block.imports.iter().cloned());
        file.models.extend(block.models.iter().cloned());
        file.services.extend(block.services.iter().cloned());
        file.vars.extend(block.vars.iter().cloned());

        match &mut file.script {
            None => file.script = Some(block),
            Some(existing) => {
                existing.source.push_str("\n\n");
                existing.source.push_str(&block.source);
                existing.imports.extend(block.imports);
                existing.models.extend(block.models);
                existing.services.extend(block.services);
                existing.vars.extend(block.vars);
                existing.funcs.extend(block.funcs);
            }
        }
    }

    /// One of the three import forms, dispatched on the token after
    /// `import`: an identifier (default component), `{` (destructured
    /// members) or a string (native library, mandatory alias).
    pub(super) fn parse_import(&mut self) -> Option<Import> {
        let position = self.cur.position;
        self.bump(); // import

        match self.kind() {
            TokenKind::Ident => {
                let name = self.cur.literal.clone();
                self.bump();
                if !self.eat_contextual("from") {
                    self.error_at_cur(format!(
                        "expected 'from' after import name, found {}",
                        self.cur.kind
                    ));
                    return None;
                }
                let path = self.expect_string("import path")?;
                Some(Import::Component {
                    name,
                    path,
                    position,
                })
            }
            TokenKind::LBrace => {
                self.bump();
                let mut names = Vec::new();
                while !self.at(TokenKind::RBrace) && !self.at_eof() {
                    let before = self.offset();
                    if self.at(TokenKind::Ident) {
                        names.push(self.cur.literal.clone());
                        self.bump();
                        if !self.at(TokenKind::RBrace) && !self.eat(TokenKind::Comma) {
                            self.error_at_cur("expected ',' or '}' in import list");
                        }
                    } else {
                        self.error_at_cur(format!(
                            "expected name in import list, found {}",
                            self.cur.kind
                        ));
                    }
                    self.ensure_progress(before);
                }
                self.expect(TokenKind::RBrace, "'}' to close the import list");
                if names.is_empty() {
                    self.error_at(position, "destructured import needs at least one name");
                }
                if !self.eat_contextual("from") {
                    self.error_at_cur(format!(
                        "expected 'from' after import list, found {}",
                        self.cur.kind
                    ));
                    return None;
                }
                let path = self.expect_string("import path")?;
                Some(Import::Destructured {
                    names,
                    path,
                    position,
                })
            }
            TokenKind::Str => {
                let path = self.cur.literal.clone();
                self.bump();
                if !self.expect(TokenKind::KwAs, "'as' after native import path") {
                    return None;
                }
                let alias = self.expect_ident("alias for native import")?;
                Some(Import::Native {
                    path,
                    alias,
                    position,
                })
            }
            _ => {
                self.error_at_cur(format!(
                    "expected import name, list or path, found {}",
                    self.cur.kind
                ));
                None
            }
        }
    }

    pub(super) fn parse_model(&mut self) -> Option<Model> {
        let position = self.cur.position;
        self.bump(); // model
        let name = self.expect_ident("model name")?;
        if !self.expect(TokenKind::LBrace, "'{' after model name") {
            return None;
        }

        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.offset();
            if let Some(field) = self.parse_field() {
                fields.push(field);
            }
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RBrace, "'}' to close model block");

        Some(Model {
            name,
            fields,
            position,
        })
    }

    /// `name: type annotation*`. A field that lacks its type still consumes
    /// the annotations so the following fields are not lost.
    pub(super) fn parse_field(&mut self) -> Option<Field> {
        let position = self.cur.position;
        let name = self.expect_ident("field name")?;
        self.expect(TokenKind::Colon, "':' after field name");

        let ty = if self.at(TokenKind::Ident) {
            self.parse_type()
        } else {
            self.error_at(position, format!("field '{name}' is missing a type"));
            TypeExpr::default()
        };

        let mut annotations = Vec::new();
        while self.at(TokenKind::At) {
            let before = self.offset();
            if let Some(annotation) = self.parse_annotation() {
                annotations.push(annotation);
            }
            self.ensure_progress(before);
        }

        Some(Field {
            name,
            ty,
            annotations,
            env_var: None,
            position,
        })
    }

    /// A bare identifier with an optional `[]` suffix.
    pub(super) fn parse_type(&mut self) -> TypeExpr {
        let name = self.cur.literal.clone();
        self.bump();
        let array = if self.at(TokenKind::LBracket) {
            self.bump();
            self.expect(TokenKind::RBracket, "']' in array type");
            true
        } else {
            false
        };
        TypeExpr { name, array }
    }

    /// `@ident` optionally followed by a parenthesized argument list.
    pub(super) fn parse_annotation(&mut self) -> Option<Annotation> {
        self.bump(); // '@'
        let name = self.expect_ident("annotation name")?;

        let mut args = IndexMap::new();
        if self.eat(TokenKind::LParen) {
            while !self.at(TokenKind::RParen) && !self.at_eof() {
                let before = self.offset();
                self.parse_annotation_arg(&mut args);
                if !self.at(TokenKind::RParen) && !self.eat(TokenKind::Comma) {
                    self.error_at_cur("expected ',' or ')' in annotation arguments");
                }
                self.ensure_progress(before);
            }
            self.expect(TokenKind::RParen, "')' to close annotation arguments");
        }

        Some(Annotation { name, args })
    }

    fn parse_annotation_arg(&mut self, args: &mut IndexMap<String, String>) {
        if self.at(TokenKind::Ident) && self.peek_is(TokenKind::Colon) {
            let key = self.cur.literal.clone();
            self.bump();
            self.bump();
            if let Some(value) = self.parse_annotation_value() {
                args.insert(key, value);
            }
        } else if let Some(value) = self.parse_annotation_value() {
            // positional arguments share the reserved key; the conventional
            // annotations take a single one
            args.insert(POSITIONAL_ARG.to_string(), value);
        }
    }

    /// String, number, identifier, boolean, or `[a, b, c]` stored as the
    /// comma-joined member text.
    fn parse_annotation_value(&mut self) -> Option<String> {
        match self.kind() {
            TokenKind::Str
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Ident
            | TokenKind::KwTrue
            | TokenKind::KwFalse => {
                let value = self.cur.literal.clone();
                self.bump();
                Some(value)
            }
            TokenKind::LBracket => {
                self.bump();
                let mut items = Vec::new();
                while !self.at(TokenKind::RBracket) && !self.at_eof() {
                    let before = self.offset();
                    match self.kind() {
                        TokenKind::Ident | TokenKind::Str | TokenKind::Int | TokenKind::Float => {
                            items.push(self.cur.literal.clone());
                            self.bump();
                        }
                        _ => self.error_at_cur(format!(
                            "expected value in annotation array, found {}",
                            self.cur.kind
                        )),
                    }
                    if !self.at(TokenKind::RBracket) && !self.eat(TokenKind::Comma) {
                        self.error_at_cur("expected ',' or ']' in annotation array");
                    }
                    self.ensure_progress(before);
                }
                self.expect(TokenKind::RBracket, "']' to close annotation array");
                Some(items.join(", "))
            }
            _ => {
                self.error_at_cur(format!(
                    "expected annotation argument, found {}",
                    self.cur.kind
                ));
                None
            }
        }
    }

    /// `service Name { provider? config-field* method* }`. The bareword
    /// `provider` is special; everything else is a method (when it starts
    /// with `func`) or a config field.
    pub(super) fn parse_service(&mut self) -> Option<Service> {
        let position = self.cur.position;
        self.bump(); // service
        let name = self.expect_ident("service name")?;
        if !self.expect(TokenKind::LBrace, "'{' after service name") {
            return None;
        }

        let mut provider = String::new();
        let mut config = Vec::new();
        let mut methods = Vec::new();
        while !self.at(TokenKind::RBrace) && !self.at_eof() {
            let before = self.offset();
            match self.kind() {
                TokenKind::KwFunc => {
                    if let Some(method) = self.parse_method() {
                        methods.push(method);
                    }
                }
                TokenKind::Ident
                    if self.cur.literal == "provider" && self.peek_is(TokenKind::Colon) =>
                {
                    self.bump();
                    self.bump();
                    if let Some(value) = self.expect_string("provider name") {
                        provider = value;
                    }
                }
                TokenKind::Ident => {
                    if let Some(mut field) = self.parse_field() {
                        lift_env_annotation(&mut field);
                        config.push(field);
                    }
                }
                _ => {
                    self.error_at_cur(format!(
                        "expected config field or method in service, found {}",
                        self.cur.kind
                    ));
                    self.bump();
                }
            }
            self.ensure_progress(before);
        }
        self.expect(TokenKind::RBrace, "'}' to close service block");

        Some(Service {
            name,
            provider,
            config,
            methods,
            position,
        })
    }

    /// A method signature inside a service: `func name(params) type?`.
    pub(super) fn parse_method(&mut self) -> Option<crate::ast::Method> {
        self.bump(); // func
        let name = self.expect_ident("method name")?;
        self.expect(TokenKind::LParen, "'(' after method name");
        let params = self.parse_params();
        self.expect(TokenKind::RParen, "')' after parameters");
        let return_type = if self.at(TokenKind::Ident) {
            Some(self.parse_type())
        } else {
            None
        };
        Some(crate::ast::Method {
            name,
            params,
            return_type,
        })
    }

    fn parse_params(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        while !self.at(TokenKind::RParen) && !self.at_eof() {
            let before = self.offset();
            if self.at(TokenKind::Ident) {
                let name = self.cur.literal.clone();
                self.bump();
                let ty = if self.eat(TokenKind::Colon) {
                    if self.at(TokenKind::Ident) {
                        self.parse_type()
                    } else {
                        self.error_at_cur(format!(
                            "expected parameter type, found {}",
                            self.cur.kind
                        ));
                        TypeExpr::default()
                    }
                } else {
                    TypeExpr::default()
                };
                params.push(Param { name, ty });
                if !self.at(TokenKind::RParen) && !self.eat(TokenKind::Comma) {
                    self.error_at_cur("expected ',' or ')' after parameter");
                }
            } else {
                self.error_at_cur(format!("expected parameter name, found {}", self.cur.kind));
            }
            self.ensure_progress(before);
        }
        params
    }

    /// `func name(params) type? { body }` with the body captured verbatim.
    pub(super) fn parse_function(&mut self) -> Option<Function> {
        let position = self.cur.position;
        self.bump(); // func
        let name = self.expect_ident("function name")?;
        self.expect(TokenKind::LParen, "'(' after function name");
        let params = self.parse_params();
        self.expect(TokenKind::RParen, "')' after parameters");
        let return_type = if self.at(TokenKind::Ident) {
            Some(self.parse_type())
        } else {
            None
        };
        let body = self.parse_block_body()?;
        Some(Function {
            name,
            params,
            return_type,
            body,
            position,
        })
    }

    /// Capture the verbatim text of a braced block. Nesting is tracked by
    /// token kind, so braces inside strings or comments cannot unbalance it.
    fn parse_block_body(&mut self) -> Option<String> {
        if !self.at(TokenKind::LBrace) {
            self.error_at_cur(format!(
                "expected '{{' to open function body, found {}",
                self.cur.kind
            ));
            return None;
        }
        let start = self.offset();
        let mut depth = 0u32;
        let end;
        loop {
            match self.kind() {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        end = self.offset();
                        self.bump();
                        break;
                    }
                }
                TokenKind::Eof => {
                    self.error_at_cur("unterminated function body");
                    end = self.source().len();
                    break;
                }
                _ => {}
            }
            self.bump();
        }
        Some(self.source()[start + 1..end].trim().to_string())
    }

    /// `let` / `const` with optional type and a raw-text initializer.
    pub(super) fn parse_var(&mut self) -> Option<Var> {
        let position = self.cur.position;
        let kind = if self.at(TokenKind::KwConst) {
            VarKind::Const
        } else {
            VarKind::Let
        };
        self.bump();
        let name = self.expect_ident("variable name")?;

        let ty = if self.eat(TokenKind::Colon) {
            if self.at(TokenKind::Ident) {
                Some(self.parse_type())
            } else {
                self.error_at_cur(format!("expected type after ':', found {}", self.cur.kind));
                None
            }
        } else {
            None
        };

        let assign_line = self.cur.position.line;
        if !self.expect(TokenKind::Assign, "'=' in variable declaration") {
            return None;
        }
        if self.at_eof() || self.cur.position.line > assign_line {
            self.error_at(position, format!("variable '{name}' is missing an initializer"));
            return Some(Var {
                kind,
                name,
                ty,
                value: String::new(),
                position,
            });
        }

        let value = self.read_statement_text();
        if value.is_empty() {
            self.error_at(position, format!("variable '{name}' is missing an initializer"));
        }
        Some(Var {
            kind,
            name,
            ty,
            value,
            position,
        })
    }

    /// Capture raw initializer text to the end of the statement: a
    /// semicolon, a newline outside brackets, or end of input.
    fn read_statement_text(&mut self) -> String {
        let start = self.offset();
        let mut depth = 0u32;
        let mut last_line = self.cur.position.line;
        let end;
        loop {
            match self.kind() {
                TokenKind::Eof => {
                    end = self.offset();
                    break;
                }
                kind if kind.is_raw_section() => {
                    end = self.offset();
                    break;
                }
                TokenKind::Semicolon if depth == 0 => {
                    end = self.offset();
                    self.bump();
                    break;
                }
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    if depth == 0 {
                        end = self.offset();
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            last_line = self.cur.position.line;
            self.bump();
            if depth == 0 && self.cur.position.line > last_line {
                end = self.offset();
                break;
            }
        }
        self.source()[start..end].trim().to_string()
    }
}

/// On service config fields an `env(VAR)` annotation is lifted into the
/// dedicated attribute, quotes stripped.
fn lift_env_annotation(field: &mut Field) {
    if let Some(index) = field.annotations.iter().position(|a| a.name == "env") {
        let annotation = field.annotations.remove(index);
        if let Some(value) = annotation.positional() {
            field.env_var = Some(value.trim_matches('"').to_string());
        }
    }
}
