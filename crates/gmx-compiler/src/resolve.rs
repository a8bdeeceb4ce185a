//! Import resolution: depth-first loading and merging of source imports.
//!
//! Native imports pass through with (path, alias) deduplication. Component
//! and destructured imports are loaded from disk, parsed, resolved
//! transitively, and merged into an enriched copy of the root file; the
//! root itself is never mutated. A parse cache keyed by normalized absolute
//! path makes repeated visits idempotent, and a membership set of
//! in-progress paths turns cycles into diagnostics instead of recursion.

use std::fs;
use std::path::{Component as PathComponent, Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::ast::{Function, Import, Model, SOURCE_EXTENSION, Service, SourceFile};
use crate::diagnostics::{self, Diagnostic};
use crate::parser;

/// A default-imported source file, recorded for template composition.
#[derive(Debug, Clone, Serialize)]
pub struct Component {
    pub file: SourceFile,
    pub path: PathBuf,
    pub name: String,
}

/// The enriched root plus the component bindings discovered on the way.
#[derive(Debug, Serialize)]
pub struct ResolvedFile {
    pub file: SourceFile,
    pub components: IndexMap<String, Component>,
}

/// Outcome of a resolution pass. Errors never abort the pass; the resolved
/// file is returned with the affected merges missing.
#[derive(Debug)]
pub struct Resolution {
    pub resolved: ResolvedFile,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

pub fn resolve(root: &SourceFile, path: &Path) -> Resolution {
    Resolver::default().resolve(root, path)
}

#[derive(Default)]
struct Resolver {
    /// Parsed ASTs by normalized absolute path.
    cache: IndexMap<PathBuf, SourceFile>,
    /// Files whose imports are currently being resolved. Membership is the
    /// cycle check; order is irrelevant.
    loading: IndexSet<PathBuf>,
    /// Files whose transitive imports were already walked into the root.
    visited: IndexSet<PathBuf>,
    /// Provenance of merged declarations, so re-encountering the same
    /// definition is silent while a genuine name clash warns.
    model_sources: IndexMap<String, PathBuf>,
    service_sources: IndexMap<String, PathBuf>,
    func_sources: IndexMap<String, PathBuf>,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl Resolver {
    fn resolve(mut self, root: &SourceFile, path: &Path) -> Resolution {
        let root_path = absolutize(path);

        for model in &root.models {
            self.model_sources
                .insert(model.name.clone(), root_path.clone());
        }
        for service in &root.services {
            self.service_sources
                .insert(service.name.clone(), root_path.clone());
        }
        for func in root.functions() {
            self.func_sources
                .insert(func.name.clone(), root_path.clone());
        }

        let mut out = root.clone();
        out.imports = Vec::new();
        let mut components = IndexMap::new();

        self.loading.insert(root_path.clone());
        let base = parent_dir(&root_path);
        for import in &root.imports {
            self.handle_import(import, &base, &mut out, &mut components);
        }
        self.loading.shift_remove(&root_path);

        Resolution {
            resolved: ResolvedFile {
                file: out,
                components,
            },
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    fn handle_import(
        &mut self,
        import: &Import,
        base: &Path,
        out: &mut SourceFile,
        components: &mut IndexMap<String, Component>,
    ) {
        match import {
            Import::Native { path, alias, .. } => {
                let present = out.imports.iter().any(|existing| {
                    matches!(existing, Import::Native { path: p, alias: a, .. }
                        if p == path && a == alias)
                });
                if !present {
                    out.imports.push(import.clone());
                }
            }
            Import::Component { name, path, .. } => {
                let Some(abs) = self.source_path(path, base) else {
                    return;
                };
                if self.loading.contains(&abs) {
                    self.errors.push(Diagnostic::prose(format!(
                        "circular import detected: {}",
                        abs.display()
                    )));
                    return;
                }
                let Some(imported) = self.load(&abs) else {
                    return;
                };
                if !imported.has_template() {
                    self.errors.push(Diagnostic::prose(format!(
                        "component \"{path}\" has no template block"
                    )));
                    return;
                }

                self.descend(&imported, &abs, out, components);

                for model in &imported.models {
                    self.merge_model(model, &abs, out);
                }
                for service in &imported.services {
                    self.merge_service(service, &abs, out);
                }
                components.insert(
                    name.clone(),
                    Component {
                        file: imported,
                        path: abs,
                        name: name.clone(),
                    },
                );
            }
            Import::Destructured { names, path, .. } => {
                let Some(abs) = self.source_path(path, base) else {
                    return;
                };
                if self.loading.contains(&abs) {
                    self.errors.push(Diagnostic::prose(format!(
                        "circular import detected: {}",
                        abs.display()
                    )));
                    return;
                }
                let Some(imported) = self.load(&abs) else {
                    return;
                };

                self.descend(&imported, &abs, out, components);

                for member in names {
                    if let Some(model) = imported.model(member) {
                        self.merge_model(model, &abs, out);
                    } else if let Some(service) = imported.service(member) {
                        self.merge_service(service, &abs, out);
                    } else if let Some(func) = imported.functions().find(|f| f.name == *member) {
                        self.merge_func(func, &abs, out);
                    } else {
                        self.errors.push(Diagnostic::prose(format!(
                            "'{member}' not found in {path}"
                        )));
                    }
                }
            }
        }
    }

    /// Walk an imported file's own imports into the root before its
    /// declarations merge, so nested components and models bubble up.
    fn descend(
        &mut self,
        imported: &SourceFile,
        abs: &Path,
        out: &mut SourceFile,
        components: &mut IndexMap<String, Component>,
    ) {
        if !self.visited.insert(abs.to_path_buf()) {
            return;
        }
        self.loading.insert(abs.to_path_buf());
        let base = parent_dir(abs);
        for import in &imported.imports {
            self.handle_import(import, &base, out, components);
        }
        self.loading.shift_remove(abs);
    }

    /// Validate and normalize a source-import path against the importing
    /// file's directory.
    fn source_path(&mut self, path: &str, base: &Path) -> Option<PathBuf> {
        let is_source = Path::new(path)
            .extension()
            .is_some_and(|ext| ext == SOURCE_EXTENSION);
        if !is_source {
            self.errors.push(Diagnostic::prose(format!(
                "only .{SOURCE_EXTENSION} files can be imported here: {path}"
            )));
            return None;
        }
        Some(normalize(&base.join(path)))
    }

    /// Read and parse a file, through the cache. Read failures and nested
    /// parse errors are terminal for the import.
    fn load(&mut self, abs: &Path) -> Option<SourceFile> {
        if let Some(file) = self.cache.get(abs) {
            return Some(file.clone());
        }
        let text = match fs::read_to_string(abs) {
            Ok(text) => text,
            Err(err) => {
                self.errors.push(Diagnostic::prose(format!(
                    "could not read {}: {err}",
                    abs.display()
                )));
                return None;
            }
        };
        let parse = parser::parse(&text);
        if diagnostics::has_errors(&parse.errors) {
            for error in parse.errors.iter().filter(|e| e.is_error()) {
                self.errors.push(Diagnostic::prose(format!(
                    "parse errors in {}: {error}",
                    abs.display()
                )));
            }
            return None;
        }
        self.cache.insert(abs.to_path_buf(), parse.file.clone());
        Some(parse.file)
    }

    fn merge_model(&mut self, model: &Model, from: &Path, out: &mut SourceFile) {
        match self.model_sources.get(&model.name) {
            Some(previous) if previous == from => {}
            Some(_) => self.warnings.push(Diagnostic::warning(format!(
                "duplicate model '{}' ignored (first definition wins)",
                model.name
            ))),
            None => {
                self.model_sources
                    .insert(model.name.clone(), from.to_path_buf());
                out.models.push(model.clone());
            }
        }
    }

    fn merge_service(&mut self, service: &Service, from: &Path, out: &mut SourceFile) {
        match self.service_sources.get(&service.name) {
            Some(previous) if previous == from => {}
            Some(_) => self.warnings.push(Diagnostic::warning(format!(
                "duplicate service '{}' ignored (first definition wins)",
                service.name
            ))),
            None => {
                self.service_sources
                    .insert(service.name.clone(), from.to_path_buf());
                out.services.push(service.clone());
            }
        }
    }

    fn merge_func(&mut self, func: &Function, from: &Path, out: &mut SourceFile) {
        match self.func_sources.get(&func.name) {
            Some(previous) if previous == from => {}
            Some(_) => self.warnings.push(Diagnostic::warning(format!(
                "duplicate function '{}' ignored (first definition wins)",
                func.name
            ))),
            None => {
                self.func_sources
                    .insert(func.name.clone(), from.to_path_buf());
                out.script.get_or_insert_default().funcs.push(func.clone());
            }
        }
    }
}

/// Lexically fold `.` and `..` so one file on disk has one cache key
/// regardless of how imports spell the path.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            PathComponent::CurDir => {}
            PathComponent::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return normalize(path);
    }
    match std::env::current_dir() {
        Ok(cwd) => normalize(&cwd.join(path)),
        Err(_) => normalize(path),
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}
