use super::*;

fn parse(json: &str) -> ChartSpec {
    serde_json::from_str(json).unwrap()
}

#[test]
fn mark_accepts_string_and_object_forms() {
    let a = parse(r#"{"mark": "bar"}"#);
    assert_eq!(a.mark.as_ref().unwrap().type_name(), "bar");
    assert!(a.mark.as_ref().unwrap().props().is_none());

    let b = parse(r##"{"mark": {"type": "arc", "innerRadius": 40, "color": "#ff0000"}}"##);
    let mark = b.mark.unwrap();
    assert_eq!(mark.type_name(), "arc");
    assert_eq!(mark.props().unwrap().inner_radius, Some(40.0));
    assert_eq!(mark.props().unwrap().color.as_deref(), Some("#ff0000"));
}

#[test]
fn mark_type_parse_covers_the_full_set() {
    for m in MarkType::ALL {
        assert_eq!(MarkType::parse(m.as_str()), Some(m));
    }
    assert_eq!(MarkType::parse("nonexistent"), None);
    assert_eq!(MarkType::parse("Bar"), None);
}

#[test]
fn explicit_null_axis_and_legend_are_distinguished_from_absent() {
    let spec = parse(
        r#"{"encoding": {
            "x": {"field": "a", "type": "nominal", "axis": null},
            "y": {"field": "b", "type": "quantitative"},
            "color": {"field": "c", "type": "nominal", "legend": null, "sort": null}
        }}"#,
    );
    let enc = spec.encoding.unwrap();
    assert!(matches!(enc.x.unwrap().axis, Some(None)));
    assert!(enc.y.unwrap().axis.is_none());
    let color = enc.color.unwrap();
    assert!(matches!(color.legend, Some(None)));
    assert!(matches!(color.sort, Some(None)));
}

#[test]
fn unknown_channels_are_collected() {
    let spec = parse(r#"{"encoding": {"shape": {"field": "a"}, "tooltip": {"field": "b"}}}"#);
    let enc = spec.encoding.unwrap();
    assert!(enc.unsupported.contains_key("shape"));
    assert!(!enc.unsupported.contains_key("tooltip"));
}

#[test]
fn facet_supports_row_column_and_wrapped_forms() {
    let rc = parse(r#"{"facet": {"column": {"field": "g", "type": "nominal"}}, "spec": {"mark": "bar"}}"#);
    let facet = rc.facet.as_ref().unwrap();
    assert_eq!(facet.column.as_ref().unwrap().field.as_deref(), Some("g"));
    assert!(facet.wrapped.field.is_none());
    assert!(rc.is_composite());

    let wrapped = parse(r#"{"facet": {"field": "g", "type": "nominal"}, "columns": 2, "spec": {"mark": "bar"}}"#);
    assert_eq!(wrapped.facet.unwrap().wrapped.field.as_deref(), Some("g"));
    assert_eq!(wrapped.columns, Some(2));
}

#[test]
fn title_accepts_text_and_object() {
    assert_eq!(parse(r#"{"title": "Sales"}"#).title.unwrap().text(), "Sales");
    assert_eq!(
        parse(r#"{"title": {"text": "Sales", "anchor": "start"}}"#)
            .title
            .unwrap()
            .text(),
        "Sales"
    );
}

#[test]
fn unknown_top_level_keys_are_ignored() {
    let spec = parse(r#"{"$schema": "https://vega.github.io/schema/vega-lite/v5.json", "config": {}, "mark": "line"}"#);
    assert!(!spec.is_composite());
}
