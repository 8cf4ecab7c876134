use envrender::{EnvSnapshot, Renderer, TemplateError};

fn renderer() -> Renderer {
    Renderer::new(
        "APPCONF",
        EnvSnapshot::from_pairs([("APPCONF_VAR_LIST", "ab,cd"), ("APPCONF_VAR_STANDARD", "value")]),
    )
}

fn render(src: &str) -> Result<String, TemplateError> {
    let r = renderer();
    let tpl = r.parse("test", src)?;
    r.render(&tpl)
}

// Mismatched braces never reach the renderer.
#[test]
fn test_bad_syntax_is_a_parse_error() {
    let err = render("{{.VarStandard} items are made of {.VarList}} are you ok ? {{.VarBool}}")
        .unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)), "{err}");
    assert!(err.to_string().contains("template: test:1:"), "{err}");
}

#[test]
fn test_unknown_function_is_a_parse_error() {
    let err = render("{{ .VarStandard | shout }}").unwrap_err();
    assert!(matches!(err, TemplateError::Parse(_)), "{err}");
    assert!(err.to_string().contains("shout"), "{err}");
}

#[test]
fn test_unbalanced_control_flow() {
    for src in ["{{ if .VarStandard }}open", "{{ range .VarList }}", "{{ else }}", "{{ end }}"] {
        assert!(matches!(render(src), Err(TemplateError::Parse(_))), "{src}");
    }
}

#[test]
fn test_list_into_string_function_is_a_render_error() {
    let err = render("{{ .VarList | upper }}").unwrap_err();
    assert!(matches!(err, TemplateError::Render(_)), "{err}");
    assert!(err.to_string().contains("error calling upper"), "{err}");
}

#[test]
fn test_invalid_regexp_is_a_render_error() {
    let err = render("{{ match .VarStandard \"(\" }}").unwrap_err();
    assert!(matches!(err, TemplateError::Render(_)), "{err}");
}

#[test]
fn test_wrong_arity_is_a_render_error() {
    let err = render("{{ join .VarList }}").unwrap_err();
    assert!(err.to_string().contains("wrong number of args for join"), "{err}");
}

#[test]
fn test_range_over_scalar_is_a_render_error() {
    assert!(matches!(render("{{ range .VarStandard }}x{{ end }}"), Err(TemplateError::Render(_))));
}

// Shape-agnostic helpers accept anything.
#[test]
fn test_predicates_never_fail() {
    assert_eq!(render("{{ .VarList | is_empty }}").unwrap(), "false");
    assert_eq!(render("{{ .VarList | is_enabled }}").unwrap(), "true");
    assert_eq!(render("{{ .VarStandard | length }}").unwrap(), "5");
}
