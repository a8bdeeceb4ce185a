use indoc::indoc;

use super::parse;

#[test]
fn script_errors_carry_the_prefix_and_source_lines() {
    let source = indoc! {"
        <template>
        <p>hi</p>
        </template>
        <script>
        model {
        }
        </script>
    "};
    let parse = parse(source);
    assert!(!parse.errors.is_empty());

    let error = &parse.errors[0];
    assert!(
        error.message.starts_with("script parsing: "),
        "message: {}",
        error.message
    );
    // `model` sits on line 5 of the file, not line 1 of the payload
    assert_eq!(error.position.unwrap().line, 5);
}

#[test]
fn script_error_display_format() {
    let parse = parse("<script>\nmodel {\n}\n</script>");
    let rendered = parse.errors[0].to_string();
    // line:column: message with the script prefix
    assert!(
        rendered.starts_with("2:7: script parsing: "),
        "rendered: {rendered}"
    );
}

#[test]
fn declarations_parse_in_any_order() {
    let source = indoc! {r#"
        <script>
        func last() { render("x") }
        const c = 1
        service S { provider: "stub" }
        model M { id: uuid @pk }
        import "fmt" as fmt
        </script>
    "#};
    let parse = parse(source);
    assert!(parse.errors.is_empty(), "errors: {:?}", parse.errors);

    let script = parse.file.script.unwrap();
    assert_eq!(script.funcs.len(), 1);
    assert_eq!(script.vars.len(), 1);
    assert_eq!(script.services.len(), 1);
    assert_eq!(script.models.len(), 1);
    assert_eq!(script.imports.len(), 1);
}

#[test]
fn script_block_records_its_start_line() {
    let source = "<template>\n<p>x</p>\n</template>\n<script>\nlet a = 1\n</script>";
    let parse = parse(source);
    // payload begins on line 5
    assert_eq!(parse.file.script.unwrap().line, 5);
}

#[test]
fn script_keeps_the_raw_payload() {
    let source = "<script>\nlet a = 1\n</script>";
    let parse = parse(source);
    assert_eq!(parse.file.script.unwrap().source, "let a = 1");
}

#[test]
fn unexpected_script_tokens_report_once_per_run() {
    let source = "<script>\n???\nlet ok = 1\n</script>";
    let parse = parse(source);
    // one diagnostic for the garbage run, then recovery at `let`
    assert_eq!(parse.errors.len(), 1);
    assert_eq!(parse.file.vars.len(), 1);
    assert_eq!(parse.file.vars[0].name, "ok");
}

#[test]
fn two_script_sections_merge() {
    let source = indoc! {"
        <script>
        model A { id: uuid @pk }
        </script>
        <script>
        model B { id: uuid @pk }
        </script>
    "};
    let parse = parse(source);
    assert_eq!(parse.file.models.len(), 2);
    let script = parse.file.script.unwrap();
    assert_eq!(script.models.len(), 2);
}
