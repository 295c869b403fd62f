use super::*;
use crate::foundation::error::ErrorKind;
use serde_json::json;

fn encoding(v: serde_json::Value) -> Encoding {
    serde_json::from_value(v).unwrap()
}

fn table(v: serde_json::Value) -> Table {
    Table::from_values(v.as_array().unwrap())
}

#[test]
fn unknown_channels_and_types_are_rejected() {
    let err = Channels::resolve(Some(&encoding(json!({"shape": {"field": "a"}})))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compilation);
    assert!(err.to_string().contains("shape"));

    let err = Channels::resolve(Some(&encoding(
        json!({"x": {"field": "a", "type": "fancy"}}),
    )))
    .unwrap_err();
    assert!(err.to_string().contains("fancy"));

    let err = Channels::resolve(Some(&encoding(json!({"x": {"field": "a"}})))).unwrap_err();
    assert!(err.to_string().contains("needs a type"));
}

#[test]
fn secondary_channels_inherit_the_primary_type() {
    let ch = Channels::resolve(Some(&encoding(json!({
        "x": {"field": "start", "type": "temporal"},
        "x2": {"field": "end"}
    }))))
    .unwrap();
    assert_eq!(ch.x2.unwrap().ty, FieldType::Temporal);
}

#[test]
fn missing_fields_are_reported_by_name() {
    let ch = Channels::resolve(Some(&encoding(
        json!({"x": {"field": "nope", "type": "nominal"}}),
    )))
    .unwrap();
    let err = ch.check_fields(&table(json!([{"a": 1}]))).unwrap_err();
    assert!(err.to_string().contains("'nope'"));
    assert!(ch.check_fields(&Table::default()).is_ok());
}

#[test]
fn aggregation_groups_by_the_other_fields_in_first_appearance_order() {
    let mut ch = Channels::resolve(Some(&encoding(json!({
        "x": {"field": "cat", "type": "nominal"},
        "y": {"field": "v", "aggregate": "sum", "type": "quantitative"}
    }))))
    .unwrap();
    let out = ch.aggregate(&table(json!([
        {"cat": "B", "v": 1}, {"cat": "A", "v": 2}, {"cat": "B", "v": 3}
    ])));
    assert_eq!(ch.y.as_ref().unwrap().field.as_deref(), Some("sum_v"));
    assert_eq!(ch.y.as_ref().unwrap().title().as_deref(), Some("Sum of v"));
    let sums: Vec<(String, f64)> = out
        .rows()
        .iter()
        .map(|r| (field_value(r, "cat").label(), field_value(r, "sum_v").as_f64().unwrap()))
        .collect();
    assert_eq!(sums, [("B".to_string(), 4.0), ("A".to_string(), 2.0)]);
}

#[test]
fn count_needs_no_field() {
    let mut ch = Channels::resolve(Some(&encoding(json!({
        "x": {"field": "cat", "type": "nominal"},
        "y": {"aggregate": "count"}
    }))))
    .unwrap();
    let out = ch.aggregate(&table(json!([{"cat": "a"}, {"cat": "a"}, {"cat": "b"}])));
    assert_eq!(field_value(&out.rows()[0], "count").as_f64(), Some(2.0));
    assert_eq!(ch.y.unwrap().title().as_deref(), Some("Count of Records"));
}

#[test]
fn median_and_quantiles_interpolate() {
    assert_eq!(quantile_sorted(&[1.0, 2.0, 3.0, 4.0], 0.5), 2.5);
    assert_eq!(quantile_sorted(&[1.0, 2.0, 3.0, 4.0, 5.0], 0.25), 2.0);
    assert_eq!(quantile_sorted(&[7.0], 0.75), 7.0);
}

#[test]
fn stacking_follows_series_order_and_splits_signs() {
    let t = table(json!([
        {"x": "a", "c": "second", "v": 2},
        {"x": "a", "c": "first", "v": 3},
        {"x": "a", "c": "neg", "v": -1},
        {"x": "b", "c": "first", "v": 5}
    ]));
    let order = vec![
        Datum::Text("first".into()),
        Datum::Text("neg".into()),
        Datum::Text("second".into()),
    ];
    let out = stack(&t, "v", Some("x"), "c", &order);
    let interval = |i: usize| {
        (
            field_value(&out.rows()[i], STACK_LO).as_f64().unwrap(),
            field_value(&out.rows()[i], STACK_HI).as_f64().unwrap(),
        )
    };
    assert_eq!(interval(1), (0.0, 3.0));
    assert_eq!(interval(0), (3.0, 5.0));
    assert_eq!(interval(2), (0.0, -1.0));
    assert_eq!(interval(3), (0.0, 5.0));
}

#[test]
fn discrete_domains_honor_sort() {
    let vals = [
        Datum::Text("b".into()),
        Datum::Text("c".into()),
        Datum::Text("a".into()),
        Datum::Text("b".into()),
    ];
    let labels = |d: Vec<Datum>| d.iter().map(Datum::label).collect::<Vec<_>>();
    assert_eq!(labels(discrete_domain(&vals, None)), ["a", "b", "c"]);
    assert_eq!(
        labels(discrete_domain(&vals, Some(&Some(SortDef::Order("descending".into()))))),
        ["c", "b", "a"]
    );
    assert_eq!(labels(discrete_domain(&vals, Some(&None))), ["b", "c", "a"]);
    assert_eq!(
        labels(discrete_domain(
            &vals,
            Some(&Some(SortDef::Values(vec![json!("c"), json!("zzz")])))
        )),
        ["c", "a", "b"]
    );
}

#[test]
fn temporal_extents_are_in_epoch_millis() {
    let vals = [Datum::Text("1970-01-02".into()), Datum::Number(0.0)];
    assert_eq!(
        continuous_extent(&vals, FieldType::Temporal).unwrap(),
        Some((0.0, 86_400_000.0))
    );
    assert!(continuous_extent(&[Datum::Text("x".into())], FieldType::Temporal).is_err());
    assert_eq!(
        continuous_extent(&[Datum::Text("x".into())], FieldType::Quantitative).unwrap(),
        None
    );
}
