use indoc::indoc;

use super::parse;
use crate::ast::{Import, TypeExpr, VarKind};

#[test]
fn basic_model() {
    let source = indoc! {"
        <script>
        model Task {
          id: uuid @pk
          title: string @min(3) @max(255)
        }
        </script>
    "};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);

    let model = &parse.file.models[0];
    assert_eq!(model.name, "Task");
    assert_eq!(model.fields.len(), 2);

    let id = &model.fields[0];
    assert_eq!(id.name, "id");
    assert_eq!(id.ty, TypeExpr::named("uuid"));
    assert_eq!(id.annotations.len(), 1);
    assert_eq!(id.annotations[0].name, "pk");
    assert!(id.annotations[0].args.is_empty());

    let title = &model.fields[1];
    assert_eq!(title.annotations.len(), 2);
    assert_eq!(title.annotations[0].name, "min");
    assert_eq!(title.annotations[0].positional(), Some("3"));
    assert_eq!(title.annotations[1].name, "max");
    assert_eq!(title.annotations[1].positional(), Some("255"));
}

#[test]
fn relation_annotation_with_array_argument() {
    let source = indoc! {"
        <script>
        model Post {
          author: User @relation(references: [id])
        }
        </script>
    "};
    let parse = parse(source);
    assert!(parse.errors.is_empty());

    let field = &parse.file.models[0].fields[0];
    assert_eq!(field.ty, TypeExpr::named("User"));
    let relation = field.annotation("relation").unwrap();
    assert_eq!(relation.arg("references"), Some("id"));
}

#[test]
fn array_annotation_argument_joins_members() {
    let source = indoc! {"
        <script>
        model Doc {
          owner: User @relation(references: [tenant, id])
        }
        </script>
    "};
    let parse = parse(source);
    let relation = parse.file.models[0].fields[0].annotation("relation").unwrap();
    assert_eq!(relation.arg("references"), Some("tenant, id"));
}

#[test]
fn array_field_type() {
    let source = "<script>\nmodel T { tags: string[] }\n</script>";
    let parse = parse(source);
    assert!(parse.errors.is_empty());
    let field = &parse.file.models[0].fields[0];
    assert_eq!(
        field.ty,
        TypeExpr {
            name: "string".to_string(),
            array: true
        }
    );
}

#[test]
fn scoped_style_block() {
    let parse = parse("<style scoped>\n.x{}\n</style>");
    let style = parse.file.style.unwrap();
    assert!(style.scoped);
    assert_eq!(style.source, ".x{}");
}

#[test]
fn plain_style_block_is_not_scoped() {
    let parse = parse("<style>\n.x{}\n</style>");
    let style = parse.file.style.unwrap();
    assert!(!style.scoped);
    assert_eq!(style.source, ".x{}");
}

#[test]
fn template_block_is_verbatim() {
    let parse = parse("<template>\n<h1>{{ .Title }}</h1>\n</template>");
    assert_eq!(parse.file.template.unwrap().source, "<h1>{{ .Title }}</h1>");
}

#[test]
fn import_forms() {
    let source = indoc! {r#"
        <script>
        import Widget from "./widget.gmx"
        import { User, Session } from "./models.gmx"
        import "net/http" as http
        </script>
    "#};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);
    assert_eq!(parse.file.imports.len(), 3);

    match &parse.file.imports[0] {
        Import::Component { name, path, .. } => {
            assert_eq!(name, "Widget");
            assert_eq!(path, "./widget.gmx");
        }
        other => panic!("expected component import, got {other:?}"),
    }
    match &parse.file.imports[1] {
        Import::Destructured { names, path, .. } => {
            assert_eq!(names, &["User".to_string(), "Session".to_string()]);
            assert_eq!(path, "./models.gmx");
        }
        other => panic!("expected destructured import, got {other:?}"),
    }
    match &parse.file.imports[2] {
        Import::Native { path, alias, .. } => {
            assert_eq!(path, "net/http");
            assert_eq!(alias, "http");
            assert!(!parse.file.imports[2].is_source());
        }
        other => panic!("expected native import, got {other:?}"),
    }
}

#[test]
fn service_with_provider_config_and_methods() {
    let source = indoc! {r#"
        <script>
        service Mailer {
          provider: "smtp"
          host: string @env("SMTP_HOST")
          port: int @default(587)
          func send(to: string, subject: string)
        }
        </script>
    "#};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);

    let service = &parse.file.services[0];
    assert_eq!(service.name, "Mailer");
    assert_eq!(service.provider, "smtp");
    assert_eq!(service.config.len(), 2);

    let host = &service.config[0];
    assert_eq!(host.env_var.as_deref(), Some("SMTP_HOST"));
    // the env annotation is lifted, not kept
    assert!(!host.has_annotation("env"));

    let port = &service.config[1];
    assert_eq!(port.env_var, None);
    assert_eq!(port.annotation("default").unwrap().positional(), Some("587"));

    assert_eq!(service.methods.len(), 1);
    let send = &service.methods[0];
    assert_eq!(send.name, "send");
    assert_eq!(send.params.len(), 2);
    assert_eq!(send.params[0].name, "to");
    assert_eq!(send.params[0].ty, TypeExpr::named("string"));
    assert!(send.return_type.is_none());
}

#[test]
fn variable_declarations() {
    let source = indoc! {r#"
        <script>
        let n: int = 42
        const greeting = "hello"
        let a = 1; let b = 2
        </script>
    "#};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);
    assert_eq!(parse.file.vars.len(), 4);

    let n = &parse.file.vars[0];
    assert_eq!(n.kind, VarKind::Let);
    assert_eq!(n.ty, Some(TypeExpr::named("int")));
    assert_eq!(n.value, "42");

    let greeting = &parse.file.vars[1];
    assert_eq!(greeting.kind, VarKind::Const);
    assert_eq!(greeting.value, r#""hello""#);

    assert_eq!(parse.file.vars[2].value, "1");
    assert_eq!(parse.file.vars[3].value, "2");
}

#[test]
fn multiline_initializer_inside_brackets() {
    let source = "<script>\nlet items = [1, 2,\n  3]\n</script>";
    let parse = parse(source);
    assert!(parse.errors.is_empty());
    assert_eq!(parse.file.vars[0].value, "[1, 2,\n  3]");
}

#[test]
fn function_bodies_are_captured_verbatim() {
    let source = indoc! {r#"
        <script>
        func visit(path: string) {
            if path == "/" {
                render("home")
            }
        }
        </script>
    "#};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);

    let funcs: Vec<_> = parse.file.functions().collect();
    assert_eq!(funcs.len(), 1);
    let visit = funcs[0];
    assert_eq!(visit.name, "visit");
    assert_eq!(visit.params[0].name, "path");
    assert!(visit.body.starts_with("if path == \"/\""));
    assert!(visit.body.ends_with('}'));
}

#[test]
fn braces_inside_body_strings_do_not_unbalance_capture() {
    let source = indoc! {r#"
        <script>
        func f() {
            let s = "{not a brace}"
        }
        func g() {
            return 2
        }
        </script>
    "#};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);
    let funcs: Vec<_> = parse.file.functions().collect();
    assert_eq!(funcs.len(), 2);
    assert_eq!(funcs[0].body, r#"let s = "{not a brace}""#);
    assert_eq!(funcs[1].body, "return 2");
}

#[test]
fn function_return_type() {
    let source = "<script>\nfunc count() int {\nreturn 0\n}\n</script>";
    let parse = parse(source);
    assert!(parse.errors.is_empty());
    let funcs: Vec<_> = parse.file.functions().collect();
    assert_eq!(funcs[0].return_type, Some(TypeExpr::named("int")));
}

#[test]
fn script_declarations_are_lifted_to_the_file() {
    let source = indoc! {"
        <script>
        model A { id: uuid @pk }
        let x = 1
        </script>
    "};
    let parse = parse(source);
    let script = parse.file.script.as_ref().unwrap();
    assert_eq!(script.models.len(), 1);
    assert_eq!(parse.file.models.len(), 1);
    assert_eq!(script.models[0], parse.file.models[0]);
    assert_eq!(script.vars.len(), 1);
    assert_eq!(parse.file.vars.len(), 1);
}

#[test]
fn declarations_outside_sections_are_also_recognized() {
    let parse = parse("model M { id: uuid @pk }");
    assert!(parse.errors.is_empty());
    assert_eq!(parse.file.models.len(), 1);
}

#[test]
fn stray_top_level_text_is_skipped() {
    let source = "just some prose\n<script>\nlet x = 1\n</script>\ntrailing";
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);
    assert_eq!(parse.file.vars.len(), 1);
}

#[test]
fn parsing_twice_yields_structurally_equal_trees() {
    let source = indoc! {r#"
        <script>
        import "fmt" as fmt
        model T { id: uuid @pk }
        service S { provider: "stub" }
        let x = 1
        func h() { render("t") }
        </script>
        <template>
        <p>hi</p>
        </template>
        <style scoped>
        p {}
        </style>
    "#};
    let first = parse(source);
    let second = parse(source);
    assert_eq!(first.file, second.file);
    assert_eq!(first.errors, second.errors);
}
