//! Go emitter: one resolved file in, one `main.go` text blob out.
//!
//! Emission is a pure function of the resolved file - every collection it
//! walks is insertion-ordered, so identical inputs produce identical text.

use std::fmt::Write;

use crate::ast::{Function, Import, Model, Service, TypeExpr, Var, VarKind};
use crate::resolve::ResolvedFile;

use super::runtime;

/// Stdlib packages the scaffolding always needs. Native imports matching
/// one of these are not emitted a second time.
const STDLIB_IMPORTS: &[&str] = &[
    "crypto/rand",
    "database/sql",
    "encoding/hex",
    "fmt",
    "html/template",
    "log",
    "net/http",
    "os",
    "regexp",
];

const SQLITE_DRIVER: &str = "github.com/mattn/go-sqlite3";

pub fn generate(resolved: &ResolvedFile) -> String {
    Emitter::new(resolved).emit()
}

struct Emitter<'a> {
    resolved: &'a ResolvedFile,
    out: String,
}

impl<'a> Emitter<'a> {
    fn new(resolved: &'a ResolvedFile) -> Self {
        Self {
            resolved,
            out: String::new(),
        }
    }

    fn emit(mut self) -> String {
        self.emit_header();
        self.emit_imports();
        self.emit_assets();
        self.emit_routes();
        self.emit_migrations();
        for model in &self.resolved.file.models {
            self.emit_model(model);
        }
        for service in &self.resolved.file.services {
            self.emit_service(service);
        }
        self.emit_vars();
        for func in self.resolved.file.functions() {
            self.emit_handler(func);
        }
        self.emit_main();
        self.line(runtime::HELPERS);

        // exactly one trailing newline
        self.out.truncate(self.out.trim_end().len());
        self.out.push('\n');
        self.out
    }

    fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    fn blank(&mut self) {
        self.out.push('\n');
    }

    fn emit_header(&mut self) {
        self.line("// Code generated by gmx. DO NOT EDIT.");
        self.line("package main");
        self.blank();
    }

    fn emit_imports(&mut self) {
        self.line("import (");
        for path in STDLIB_IMPORTS {
            self.line(format!("\t{}", go_quote(path)));
        }
        self.blank();
        for import in &self.resolved.file.imports {
            if let Import::Native { path, alias, .. } = import {
                if STDLIB_IMPORTS.contains(&path.as_str()) {
                    continue;
                }
                self.line(format!("\t{alias} {}", go_quote(path)));
            }
        }
        self.line(format!("\t_ {}", go_quote(SQLITE_DRIVER)));
        self.line(")");
        self.blank();
    }

    /// Template and style payloads embedded as constants; component
    /// templates become named sub-templates.
    fn emit_assets(&mut self) {
        let template = self
            .resolved
            .file
            .template
            .as_ref()
            .map(|t| t.source.as_str())
            .unwrap_or_default();
        self.line(format!("const appTemplate = {}", go_quote(template)));

        let (style, scoped) = self
            .resolved
            .file
            .style
            .as_ref()
            .map(|s| (s.source.as_str(), s.scoped))
            .unwrap_or(("", false));
        self.line(format!("const appStyle = {}", go_quote(style)));
        self.line(format!("const appStyleScoped = {scoped}"));
        self.blank();

        if self.resolved.components.is_empty() {
            self.line("var componentTemplates = map[string]string{}");
        } else {
            self.line("var componentTemplates = map[string]string{");
            for component in self.resolved.components.values() {
                let source = component
                    .file
                    .template
                    .as_ref()
                    .map(|t| t.source.as_str())
                    .unwrap_or_default();
                self.line(format!(
                    "\t{}: {},",
                    go_quote(&component.name),
                    go_quote(source)
                ));
            }
            self.line("}");
        }
        self.blank();
    }

    /// Symbolic handler names to URL paths, consumed by the template's
    /// `route` helper.
    fn emit_routes(&mut self) {
        let funcs: Vec<&Function> = self.resolved.file.functions().collect();
        if funcs.is_empty() {
            self.line("var routes = map[string]string{}");
        } else {
            self.line("var routes = map[string]string{");
            for func in funcs {
                self.line(format!(
                    "\t{}: {},",
                    go_quote(&func.name),
                    go_quote(&route_path(&func.name))
                ));
            }
            self.line("}");
        }
        self.blank();
    }

    /// One CREATE TABLE per model, in declaration order.
    fn emit_migrations(&mut self) {
        if self.resolved.file.models.is_empty() {
            self.line("var migrations = []string{}");
            self.blank();
            return;
        }
        self.line("var migrations = []string{");
        for model in &self.resolved.file.models {
            let statement = self.create_table(model);
            self.line(format!("\t{},", go_quote(&statement)));
        }
        self.line("}");
        self.blank();
    }

    fn create_table(&self, model: &Model) -> String {
        let mut columns = Vec::new();
        let mut constraints = Vec::new();
        let mut scoped = false;

        for field in &model.fields {
            let mut column = format!("{} {}", snake(&field.name), self.sql_type(&field.ty));
            if field.has_annotation("pk") {
                column.push_str(" PRIMARY KEY");
            }
            if field.has_annotation("unique") {
                column.push_str(" UNIQUE");
            }
            if let Some(default) = field.annotation("default").and_then(|a| a.positional()) {
                let _ = write!(column, " DEFAULT {}", sql_literal(default, &field.ty));
            }
            if field.has_annotation("scoped") {
                scoped = true;
            }
            columns.push(column);

            if let Some(relation) = field.annotation("relation") {
                let references = relation.arg("references").unwrap_or("id");
                constraints.push(format!(
                    "FOREIGN KEY ({}) REFERENCES {}({})",
                    snake(&field.name),
                    snake(&field.ty.name),
                    references
                ));
            }
        }

        if scoped {
            columns.push("tenant_id TEXT".to_string());
        }
        columns.extend(constraints);

        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            snake(&model.name),
            columns.join(", ")
        )
    }

    fn emit_model(&mut self, model: &Model) {
        self.line(format!("type {} struct {{", model.name));
        for field in &model.fields {
            self.line(format!(
                "\t{} {}",
                exported(&field.name),
                self.go_type(&field.ty)
            ));
        }
        self.line("}");
        self.blank();
        self.emit_validate(model);
    }

    /// Length/range/email checks from `min`, `max` and `email` annotations.
    fn emit_validate(&mut self, model: &Model) {
        self.line(format!("func (m {}) Validate() error {{", model.name));
        for field in &model.fields {
            let access = format!("m.{}", exported(&field.name));
            let numeric = self.is_numeric(&field.ty);
            for annotation in &field.annotations {
                match (annotation.name.as_str(), annotation.positional()) {
                    ("min", Some(bound)) if numeric => {
                        self.check(
                            format!("{access} < {bound}"),
                            format!("{} must be at least {bound}", field.name),
                        );
                    }
                    ("min", Some(bound)) => {
                        self.check(
                            format!("len({access}) < {bound}"),
                            format!("{} must be at least {bound} characters", field.name),
                        );
                    }
                    ("max", Some(bound)) if numeric => {
                        self.check(
                            format!("{access} > {bound}"),
                            format!("{} must be at most {bound}", field.name),
                        );
                    }
                    ("max", Some(bound)) => {
                        self.check(
                            format!("len({access}) > {bound}"),
                            format!("{} must be at most {bound} characters", field.name),
                        );
                    }
                    ("email", _) => {
                        self.check(
                            format!("!emailPattern.MatchString({access})"),
                            format!("{} must be a valid email address", field.name),
                        );
                    }
                    _ => {}
                }
            }
        }
        self.line("\treturn nil");
        self.line("}");
        self.blank();
    }

    fn check(&mut self, condition: String, message: String) {
        self.line(format!("\tif {condition} {{"));
        self.line(format!("\t\treturn fmt.Errorf({})", go_quote(&message)));
        self.line("\t}");
    }

    /// Config struct populated from environment variables; a missing
    /// required variable aborts startup.
    fn emit_service(&mut self, service: &Service) {
        if !service.provider.is_empty() {
            self.line(format!(
                "// {} configuration (provider {}).",
                service.name,
                go_quote(&service.provider)
            ));
        }
        self.line(format!("type {}Config struct {{", service.name));
        for field in &service.config {
            self.line(format!(
                "\t{} {}",
                exported(&field.name),
                self.go_type(&field.ty)
            ));
        }
        self.line("}");
        self.blank();

        self.line(format!(
            "func load{}Config() {}Config {{",
            service.name, service.name
        ));
        self.line(format!("\tcfg := {}Config{{}}", service.name));
        for field in &service.config {
            let target = format!("cfg.{}", exported(&field.name));
            if let Some(env_var) = &field.env_var {
                self.line(format!(
                    "\tif value, ok := os.LookupEnv({}); ok {{",
                    go_quote(env_var)
                ));
                self.line(format!("\t\t{target} = value"));
                self.line("\t} else {");
                self.line(format!(
                    "\t\tlog.Fatalf({})",
                    go_quote(&format!(
                        "missing required environment variable {env_var}"
                    ))
                ));
                self.line("\t}");
            } else if let Some(default) = field.annotation("default").and_then(|a| a.positional()) {
                self.line(format!(
                    "\t{target} = {}",
                    go_value(default, &self.go_type(&field.ty))
                ));
            }
        }
        self.line("\treturn cfg");
        self.line("}");
        self.blank();

        if !service.methods.is_empty() {
            self.line(format!("type {}Service interface {{", service.name));
            for method in &service.methods {
                let params = method
                    .params
                    .iter()
                    .map(|p| format!("{} {}", p.name, self.go_type(&p.ty)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let ret = method
                    .return_type
                    .as_ref()
                    .map(|t| format!(" {}", self.go_type(t)))
                    .unwrap_or_default();
                self.line(format!("\t{}({params}){ret}", exported(&method.name)));
            }
            self.line("}");
            self.blank();
        }
    }

    fn emit_vars(&mut self) {
        let vars = &self.resolved.file.vars;
        if vars.is_empty() {
            return;
        }
        for var in vars {
            self.line(var_decl(var, var.ty.as_ref().map(|t| self.go_type(t))));
        }
        self.blank();
    }

    /// A script function becomes a handler taking the request context, its
    /// parameters bound from the form, and its body embedded verbatim.
    fn emit_handler(&mut self, func: &Function) {
        self.line(format!("func handle{}(ctx *Ctx) {{", exported(&func.name)));
        for param in &func.params {
            self.line(format!(
                "\t{} := ctx.R.FormValue({})",
                param.name,
                go_quote(&param.name)
            ));
            self.line(format!("\t_ = {}", param.name));
        }
        for line in func.body.lines() {
            self.line(format!("\t{line}"));
        }
        self.line("}");
        self.blank();
    }

    fn emit_main(&mut self) {
        self.line("func main() {");
        self.line("\tdb := openDatabase()");
        self.line("\tdefer db.Close()");
        self.line("\trunMigrations(db)");
        for service in &self.resolved.file.services {
            let binding = format!("{}Config", lower_first(&service.name));
            self.line(format!("\t{binding} := load{}Config()", service.name));
            self.line(format!("\t_ = {binding}"));
        }
        self.line("\ttmpl := parseTemplates()");
        self.line("\tmux := http.NewServeMux()");
        for func in self.resolved.file.functions() {
            self.line(format!(
                "\tmux.HandleFunc({}, withCtx(db, handle{}))",
                go_quote(&route_path(&func.name)),
                exported(&func.name)
            ));
        }
        self.line("\tmux.HandleFunc(\"/\", serveIndex(tmpl))");
        self.line("\taddr := listenAddr()");
        self.line("\tlog.Printf(\"listening on %s\", addr)");
        self.line("\tlog.Fatal(http.ListenAndServe(addr, csrfMiddleware(mux)))");
        self.line("}");
        self.blank();
    }

    fn is_model(&self, name: &str) -> bool {
        self.resolved.file.model(name).is_some()
    }

    fn go_type(&self, ty: &TypeExpr) -> String {
        let base = if self.is_model(&ty.name) {
            // relation fields store the referenced key
            "string"
        } else {
            match ty.name.as_str() {
                "int" | "integer" => "int64",
                "float" | "decimal" => "float64",
                "bool" | "boolean" => "bool",
                _ => "string",
            }
        };
        if ty.array {
            format!("[]{base}")
        } else {
            base.to_string()
        }
    }

    fn sql_type(&self, ty: &TypeExpr) -> &'static str {
        if ty.array || self.is_model(&ty.name) {
            return "TEXT";
        }
        match ty.name.as_str() {
            "int" | "integer" => "INTEGER",
            "float" | "decimal" => "REAL",
            "bool" | "boolean" => "INTEGER",
            _ => "TEXT",
        }
    }

    fn is_numeric(&self, ty: &TypeExpr) -> bool {
        !ty.array && matches!(self.go_type(ty).as_str(), "int64" | "float64")
    }
}

fn var_decl(var: &Var, go_type: Option<String>) -> String {
    let keyword = match var.kind {
        VarKind::Let => "var",
        VarKind::Const => "const",
    };
    match go_type {
        Some(ty) => format!("{keyword} {} {ty} = {}", var.name, var.value),
        None => format!("{keyword} {} = {}", var.name, var.value),
    }
}

fn route_path(name: &str) -> String {
    format!("/{}", name.to_lowercase())
}

/// Annotation literal to a Go expression of the target type.
fn go_value(literal: &str, go_type: &str) -> String {
    match go_type {
        "string" => go_quote(literal),
        _ => literal.to_string(),
    }
}

/// SQL literal for a DEFAULT clause: numerics and booleans pass through,
/// everything else is quoted.
fn sql_literal(literal: &str, ty: &TypeExpr) -> String {
    match ty.name.as_str() {
        "int" | "integer" | "float" | "decimal" => literal.to_string(),
        "bool" | "boolean" => match literal {
            "true" => "1".to_string(),
            "false" => "0".to_string(),
            other => other.to_string(),
        },
        _ => format!("'{}'", literal.replace('\'', "''")),
    }
}

/// Go double-quoted string literal.
fn go_quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Exported Go name: capitalize each `_`/`-` separated segment.
fn exported(name: &str) -> String {
    let mut out = String::new();
    for segment in name.split(['_', '-']) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}

fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// snake_case for table and column names.
fn snake(name: &str) -> String {
    let mut out = String::new();
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else if c == '-' {
            out.push('_');
        } else {
            out.push(c);
        }
    }
    out
}
