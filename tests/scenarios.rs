//! End-to-end scenarios, driven entirely through `load_templates`, the way
//! an external caller actually builds and uses templates.

use sgtk_template::{error::TemplateError, key::Value, load_templates};

const ROOTS: &str = "
primary:
  linux2: /studio
  win32: Z:\\studio
  default: true
";

const TEMPLATES: &str = r#"
keys:
  Sequence:
    type: string
  Shot:
    type: string
  Step:
    type: string
  name:
    type: string
  version:
    type: integer
    length: 3
  unrestricted_name:
    type: string
  restricted_name:
    type: string
    choices: [name]

paths:
  shot_work:
    definition: shots/{Sequence}/{Shot}/{Step}/work/{name}.v{version}.ma
  literal_only:
    definition: foo/bar

strings:
  unrestricted_scene:
    definition: "{Shot}_{unrestricted_name}_v{version}.ma"
  restricted_scene:
    definition: "{Shot}_{restricted_name}_v{version}.ma"
  optional_tag:
    definition: "{Shot}[_{name}]"
  fixed_version:
    definition: "{name}.v{version}.ma"
"#;

#[test]
fn shot_work_file_round_trips_under_a_studio_root() {
    let templates = load_templates(ROOTS, TEMPLATES).unwrap();
    let shot_work = &templates.paths["shot_work"];

    let input = "/studio/shots/seq_1/shot_2/comp/work/henry.v003.ma";
    let fields = shot_work.get_fields(input, &[]).unwrap();
    assert_eq!(fields.get("Sequence"), Some(&Value::String("seq_1".into())));
    assert_eq!(fields.get("Shot"), Some(&Value::String("shot_2".into())));
    assert_eq!(fields.get("Step"), Some(&Value::String("comp".into())));
    assert_eq!(fields.get("name"), Some(&Value::String("henry".into())));
    assert_eq!(fields.get("version"), Some(&Value::Integer(3)));

    assert_eq!(shot_work.apply_fields(&fields).unwrap(), input);

    let on_windows = shot_work
        .apply_fields_for_platform(&fields, "win32")
        .unwrap();
    assert_eq!(
        on_windows,
        "Z:\\studio\\shots\\seq_1\\shot_2\\comp\\work\\henry.v003.ma"
    );
}

#[test]
fn unrestricted_name_key_between_repeated_underscores_is_ambiguous() {
    let templates = load_templates(ROOTS, TEMPLATES).unwrap();
    let scene = &templates.strings["unrestricted_scene"];

    let err = scene.get_fields("shot_010_name_v001.ma", &[]).unwrap_err();
    assert!(matches!(err, TemplateError::AmbiguousParse { .. }));
}

#[test]
fn restricting_name_to_a_fixed_choice_resolves_the_ambiguity() {
    let templates = load_templates(ROOTS, TEMPLATES).unwrap();
    let scene = &templates.strings["restricted_scene"];

    let fields = scene.get_fields("shot_010_name_v001.ma", &[]).unwrap();
    assert_eq!(fields.get("Shot"), Some(&Value::String("shot_010".into())));
    assert_eq!(
        fields.get("restricted_name"),
        Some(&Value::String("name".into()))
    );
    assert_eq!(fields.get("version"), Some(&Value::Integer(1)));
}

#[test]
fn optional_trailing_name_section_is_reported_optional_and_parses_both_ways() {
    let templates = load_templates(ROOTS, TEMPLATES).unwrap();
    let tag = &templates.strings["optional_tag"];

    assert!(tag.is_optional("name"));
    assert!(!tag.is_optional("Shot"));

    let short = tag.get_fields("sh010", &[]).unwrap();
    assert_eq!(short.get("Shot"), Some(&Value::String("sh010".into())));
    assert_eq!(short.get("name"), None);

    let long = tag.get_fields("sh010_foo", &[]).unwrap();
    assert_eq!(long.get("Shot"), Some(&Value::String("sh010".into())));
    assert_eq!(long.get("name"), Some(&Value::String("foo".into())));
}

#[test]
fn pure_literal_template_matches_only_its_exact_text() {
    let templates = load_templates(ROOTS, TEMPLATES).unwrap();
    let literal = &templates.paths["literal_only"];

    assert_eq!(
        literal.get_fields("/studio/foo/bar", &[]).unwrap().len(),
        0
    );
    assert!(matches!(
        literal.get_fields("/studio/foo/baz", &[]).unwrap_err(),
        TemplateError::ParseFailure { .. }
    ));
}

#[test]
fn fixed_length_version_rejects_underpadded_input() {
    let templates = load_templates(ROOTS, TEMPLATES).unwrap();
    let scene = &templates.strings["fixed_version"];

    assert!(matches!(
        scene.get_fields("scene.v3.ma", &[]).unwrap_err(),
        TemplateError::ParseFailure { .. }
    ));

    let fields = scene.get_fields("scene.v003.ma", &[]).unwrap();
    assert_eq!(fields.get("name"), Some(&Value::String("scene".into())));
    assert_eq!(fields.get("version"), Some(&Value::Integer(3)));
}
