//! Typed syntax tree for GMX source files.
//!
//! The tree is deliberately flat: a [`SourceFile`] aggregates ordered lists
//! of declarations, and expression/handler bodies stay as verbatim text for
//! the generator. Annotation arguments are stored as literal text in an
//! insertion-ordered map so emission never depends on a value type
//! hierarchy.

use indexmap::IndexMap;
use serde::Serialize;

use crate::token::Position;

/// File extension of GMX sources, without the dot.
pub const SOURCE_EXTENSION: &str = "gmx";

/// Root of a parsed file. Insertion order of every list is source order;
/// downstream ordering (migrations, routes) follows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceFile {
    pub imports: Vec<Import>,
    pub models: Vec<Model>,
    pub services: Vec<Service>,
    pub vars: Vec<Var>,
    pub script: Option<ScriptBlock>,
    pub template: Option<TemplateBlock>,
    pub style: Option<StyleBlock>,
}

impl SourceFile {
    pub fn has_template(&self) -> bool {
        self.template
            .as_ref()
            .is_some_and(|t| !t.source.trim().is_empty())
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.name == name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.script.iter().flat_map(|s| s.funcs.iter())
    }
}

/// An import declaration. Exactly one variant per declaration, distinguished
/// by the shape of the import form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Import {
    /// `import Name from "./widget.gmx"` - a component contributing a
    /// template fragment and auxiliary declarations.
    Component {
        name: String,
        path: String,
        position: Position,
    },
    /// `import { A, B } from "./shared.gmx"` - named members pulled out of
    /// another source file.
    Destructured {
        names: Vec<String>,
        path: String,
        position: Position,
    },
    /// `import "net/http" as http` - a target-ecosystem library, opaque to
    /// the resolver apart from deduplication.
    Native {
        path: String,
        alias: String,
        position: Position,
    },
}

impl Import {
    pub fn path(&self) -> &str {
        match self {
            Import::Component { path, .. }
            | Import::Destructured { path, .. }
            | Import::Native { path, .. } => path,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Import::Component { position, .. }
            | Import::Destructured { position, .. }
            | Import::Native { position, .. } => *position,
        }
    }

    /// Whether the path points at another GMX source file.
    pub fn is_source(&self) -> bool {
        std::path::Path::new(self.path())
            .extension()
            .is_some_and(|ext| ext == SOURCE_EXTENSION)
    }
}

/// `model Name { field* }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Model {
    pub name: String,
    pub fields: Vec<Field>,
    pub position: Position,
}

/// A field declaration: `name: type @annotation*`. Service config fields
/// additionally carry the environment variable lifted out of `@env(VAR)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub ty: TypeExpr,
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_var: Option<String>,
    pub position: Position,
}

impl Field {
    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}

/// A bare identifier or `T[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeExpr {
    pub name: String,
    pub array: bool,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            array: false,
        }
    }
}

/// Reserved argument key for positional annotation arguments.
pub const POSITIONAL_ARG: &str = "_";

/// `@name` or `@name(args)`. Arguments keep their literal text: named ones
/// under their key, positional ones under [`POSITIONAL_ARG`], arrays as the
/// comma-joined member list, strings without their surrounding quotes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub name: String,
    pub args: IndexMap<String, String>,
}

impl Annotation {
    pub fn positional(&self) -> Option<&str> {
        self.args.get(POSITIONAL_ARG).map(String::as_str)
    }

    pub fn arg(&self, key: &str) -> Option<&str> {
        self.args.get(key).map(String::as_str)
    }
}

/// `service Name { provider? config-field* method* }`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Service {
    pub name: String,
    /// Value of the `provider: "..."` entry, empty when absent.
    pub provider: String,
    pub config: Vec<Field>,
    pub methods: Vec<Method>,
    pub position: Position,
}

/// A service method signature: `func name(params) returnType?`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Method {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Let,
    Const,
}

/// `let name: type = expr` / `const name = expr`. The initializer is raw
/// text to the end of the statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Var {
    pub kind: VarKind,
    pub name: String,
    pub ty: Option<TypeExpr>,
    pub value: String,
    pub position: Position,
}

/// `func name(params) returnType? { body }`. The body is verbatim text up
/// to the matching brace; the core never parses it further.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: String,
    pub position: Position,
}

/// Parsed `<script>` section. The declaration lists are also lifted into
/// the owning [`SourceFile`] so consumers need not descend.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScriptBlock {
    pub source: String,
    /// Source line of the first payload character, used to offset
    /// diagnostics from the script sub-parser.
    pub line: u32,
    pub imports: Vec<Import>,
    pub models: Vec<Model>,
    pub services: Vec<Service>,
    pub vars: Vec<Var>,
    pub funcs: Vec<Function>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateBlock {
    pub source: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StyleBlock {
    pub source: String,
    pub scoped: bool,
}
