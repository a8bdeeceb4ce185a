use std::fs;
use std::path::{Path, PathBuf};

use indoc::indoc;

use crate::ast::Import;
use crate::parser;
use crate::resolve::{Resolution, resolve};

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Parse `root` source as if it lived at `dir/app.gmx` and resolve it.
fn resolve_in(dir: &Path, root: &str) -> Resolution {
    let parse = parser::parse(root);
    assert!(parse.errors.is_empty(), "root errors: {:?}", parse.errors);
    resolve(&parse.file, &dir.join("app.gmx"))
}

const WIDGET: &str = indoc! {"
    <script>
    model Widget { id: uuid @pk }
    </script>
    <template>
    <div>widget</div>
    </template>
"};

#[test]
fn component_import_binds_and_merges() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "widget.gmx", WIDGET);

    let resolution = resolve_in(
        dir.path(),
        indoc! {r#"
            <script>
            import Widget from "./widget.gmx"
            model App { id: uuid @pk }
            </script>
            <template>
            <p>app</p>
            </template>
        "#},
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);

    let resolved = &resolution.resolved;
    assert!(resolved.components.contains_key("Widget"));
    let component = &resolved.components["Widget"];
    assert_eq!(component.name, "Widget");
    assert!(component.file.has_template());

    // root declarations first, merged declarations after
    let names: Vec<_> = resolved.file.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["App", "Widget"]);
}

#[test]
fn native_import_passes_through_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let resolution = resolve_in(
        dir.path(),
        indoc! {r#"
            <script>
            import "fmt" as fmt
            import "fmt" as fmt
            import "net/http" as http
            </script>
        "#},
    );
    assert!(resolution.errors.is_empty());

    let natives: Vec<_> = resolution
        .resolved
        .file
        .imports
        .iter()
        .map(|i| match i {
            Import::Native { path, alias, .. } => (path.clone(), alias.clone()),
            other => panic!("expected only native imports, got {other:?}"),
        })
        .collect();
    assert_eq!(
        natives,
        vec![
            ("fmt".to_string(), "fmt".to_string()),
            ("net/http".to_string(), "http".to_string()),
        ]
    );
}

#[test]
fn circular_import_is_reported_once_and_terminates() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.gmx",
        indoc! {r#"
            <script>
            import B from "./b.gmx"
            </script>
            <template>
            <p>a</p>
            </template>
        "#},
    );
    write(
        dir.path(),
        "b.gmx",
        indoc! {r#"
            <script>
            import A from "./a.gmx"
            </script>
            <template>
            <p>b</p>
            </template>
        "#},
    );

    let parse = parser::parse(&fs::read_to_string(dir.path().join("a.gmx")).unwrap());
    let resolution = resolve(&parse.file, &dir.path().join("a.gmx"));

    let circular: Vec<_> = resolution
        .errors
        .iter()
        .filter(|e| e.message.contains("circular import"))
        .collect();
    assert_eq!(circular.len(), 1, "errors: {:?}", resolution.errors);
}

#[test]
fn destructured_import_pulls_named_members() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "shared.gmx",
        indoc! {r#"
            <script>
            model User { id: uuid @pk }
            model Session { id: uuid @pk }
            service Mailer { provider: "smtp" }
            func notify() { render("note") }
            </script>
        "#},
    );

    let resolution = resolve_in(
        dir.path(),
        indoc! {r#"
            <script>
            import { User, Mailer, notify } from "./shared.gmx"
            </script>
        "#},
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);

    let resolved = &resolution.resolved.file;
    assert_eq!(resolved.models.len(), 1);
    assert_eq!(resolved.models[0].name, "User");
    assert_eq!(resolved.services.len(), 1);
    assert_eq!(resolved.services[0].name, "Mailer");
    let funcs: Vec<_> = resolved.functions().map(|f| f.name.as_str()).collect();
    assert_eq!(funcs, vec!["notify"]);
    // Session was not requested
    assert!(resolved.model("Session").is_none());
}

#[test]
fn destructured_missing_member_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "u.gmx",
        "<script>\nmodel User { id: uuid @pk }\n</script>",
    );

    let resolution = resolve_in(
        dir.path(),
        "<script>\nimport { doesNotExist } from \"./u.gmx\"\n</script>",
    );
    assert!(
        resolution
            .errors
            .iter()
            .any(|e| e.message.contains("not found")),
        "errors: {:?}",
        resolution.errors
    );
}

#[test]
fn component_without_template_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "plain.gmx",
        "<script>\nmodel P { id: uuid @pk }\n</script>",
    );

    let resolution = resolve_in(
        dir.path(),
        "<script>\nimport Plain from \"./plain.gmx\"\n</script>",
    );
    assert!(
        resolution
            .errors
            .iter()
            .any(|e| e.message.contains("no template")),
        "errors: {:?}",
        resolution.errors
    );
    assert!(resolution.resolved.components.is_empty());
    // the failed import merges nothing
    assert!(resolution.resolved.file.models.is_empty());
}

#[test]
fn nested_components_bubble_up() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "inner.gmx",
        indoc! {"
            <script>
            model Inner { id: uuid @pk }
            </script>
            <template>
            <span>inner</span>
            </template>
        "},
    );
    write(
        dir.path(),
        "outer.gmx",
        indoc! {r#"
            <script>
            import Inner from "./inner.gmx"
            model Outer { id: uuid @pk }
            </script>
            <template>
            <div>outer</div>
            </template>
        "#},
    );

    let resolution = resolve_in(
        dir.path(),
        "<script>\nimport Outer from \"./outer.gmx\"\n</script>",
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);

    let resolved = &resolution.resolved;
    assert!(resolved.components.contains_key("Outer"));
    assert!(resolved.components.contains_key("Inner"));

    // depth-first: the nested file's declarations merge first
    let names: Vec<_> = resolved.file.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Inner", "Outer"]);
}

#[test]
fn duplicate_definitions_warn_and_first_wins() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "a.gmx",
        indoc! {"
            <script>
            model Shared { id: uuid @pk }
            </script>
            <template>
            <p>a</p>
            </template>
        "},
    );
    write(
        dir.path(),
        "b.gmx",
        indoc! {"
            <script>
            model Shared { id: uuid @pk\n  extra: string }
            </script>
            <template>
            <p>b</p>
            </template>
        "},
    );

    let resolution = resolve_in(
        dir.path(),
        indoc! {r#"
            <script>
            import A from "./a.gmx"
            import B from "./b.gmx"
            </script>
        "#},
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
    assert!(
        resolution
            .warnings
            .iter()
            .any(|w| w.message.contains("duplicate model 'Shared'")),
        "warnings: {:?}",
        resolution.warnings
    );

    let resolved = &resolution.resolved.file;
    assert_eq!(resolved.models.len(), 1);
    // first definition wins: a.gmx's single-field version
    assert_eq!(resolved.models[0].fields.len(), 1);
}

#[test]
fn two_spellings_of_one_file_resolve_to_one_parse() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "widget.gmx", WIDGET);

    let resolution = resolve_in(
        dir.path(),
        indoc! {r#"
            <script>
            import Widget from "./widget.gmx"
            import Again from "./sub/../widget.gmx"
            </script>
        "#},
    );
    assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
    // the same normalized path merges silently, with no duplicate warning
    assert!(resolution.warnings.is_empty(), "{:?}", resolution.warnings);
    assert_eq!(resolution.resolved.file.models.len(), 1);
    assert_eq!(resolution.resolved.components.len(), 2);
}

#[test]
fn unreadable_import_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let resolution = resolve_in(
        dir.path(),
        "<script>\nimport Ghost from \"./ghost.gmx\"\n</script>",
    );
    assert!(
        resolution
            .errors
            .iter()
            .any(|e| e.message.contains("could not read")),
        "errors: {:?}",
        resolution.errors
    );
}

#[test]
fn nested_parse_errors_are_wrapped_with_the_path() {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "broken.gmx",
        "<script>\nmodel {\n}\n</script>\n<template>\n<p>x</p>\n</template>",
    );

    let resolution = resolve_in(
        dir.path(),
        "<script>\nimport Broken from \"./broken.gmx\"\n</script>",
    );
    assert!(
        resolution
            .errors
            .iter()
            .any(|e| e.message.contains("parse errors in") && e.message.contains("broken.gmx")),
        "errors: {:?}",
        resolution.errors
    );
}

#[test]
fn non_source_path_in_component_position_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let resolution = resolve_in(
        dir.path(),
        "<script>\nimport Strange from \"./strange.css\"\n</script>",
    );
    assert!(
        resolution
            .errors
            .iter()
            .any(|e| e.message.contains("can be imported")),
        "errors: {:?}",
        resolution.errors
    );
}

#[test]
fn resolving_twice_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "widget.gmx", WIDGET);

    let source = indoc! {r#"
        <script>
        import "fmt" as fmt
        import Widget from "./widget.gmx"
        </script>
    "#};
    let first = resolve_in(dir.path(), source);
    let second = resolve_in(dir.path(), source);
    assert_eq!(first.resolved.file, second.resolved.file);
    assert_eq!(first.errors, second.errors);
    assert_eq!(first.warnings, second.warnings);
}
