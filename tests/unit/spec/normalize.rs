use super::*;
use crate::foundation::error::ErrorKind;

#[test]
fn malformed_json_is_invalid_input() {
    for text in [r#"{"mark":"#, "{", "not json", r#"{"a": 1,}"#] {
        let err = parse_spec_text(text).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "{text}");
    }
}

#[test]
fn empty_text_is_invalid_input() {
    let err = parse_spec_text("   \n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("required"));
}

#[test]
fn non_object_json_is_invalid_input() {
    assert_eq!(
        parse_spec_text("[1, 2]").unwrap_err().kind(),
        ErrorKind::InvalidInput
    );
}

#[test]
fn grammar_is_not_checked() {
    let spec = normalize_text(r#"{"mark": "nonexistent"}"#).unwrap();
    assert_eq!(spec.as_value()["mark"], "nonexistent");
}

#[test]
fn container_size_becomes_the_default() {
    let spec = normalize_text(r#"{"mark": "bar", "width": "container", "height": {"step": 30}}"#)
        .unwrap();
    assert_eq!(spec.as_value()["width"], 500.0);
    assert_eq!(spec.as_value()["height"]["step"], 30);
}

#[test]
fn unit_spec_gets_default_size() {
    let spec = normalize_text(r#"{"mark": "bar"}"#).unwrap();
    assert_eq!(spec.as_value()["width"], 500.0);
    assert_eq!(spec.as_value()["height"], 350.0);
}

#[test]
fn explicit_dimensions_are_kept_independently() {
    let spec = normalize_text(r#"{"mark": "bar", "width": 120}"#).unwrap();
    assert_eq!(spec.as_value()["width"], 120);
    assert_eq!(spec.as_value()["height"], 350.0);

    let spec = normalize_text(r#"{"mark": "bar", "height": 90}"#).unwrap();
    assert_eq!(spec.as_value()["width"], 500.0);
    assert_eq!(spec.as_value()["height"], 90);
}

#[test]
fn composite_specs_are_left_untouched() {
    for text in [
        r#"{"facet": {"field": "g", "type": "nominal"}, "spec": {"mark": "bar"}}"#,
        r#"{"hconcat": [{"mark": "bar"}]}"#,
        r#"{"vconcat": [{"mark": "bar"}]}"#,
    ] {
        let before: Value = serde_json::from_str(text).unwrap();
        let after = normalize_text(text).unwrap();
        assert_eq!(after.as_value(), &before, "{text}");
        assert!(after.as_value().get("width").is_none());
    }
}

#[test]
fn normalization_is_pure() {
    let text = r#"{"mark": "point", "data": {"values": [{"a": 1}]}}"#;
    assert_eq!(normalize_text(text).unwrap(), normalize_text(text).unwrap());
}
