use super::*;
use crate::foundation::error::ErrorKind;
use crate::spec::normalize::normalize;
use serde_json::{Value, json};

fn compile(v: Value) -> ChartResult<Scene> {
    compile_chart(&normalize(v))
}

fn two_bars() -> Value {
    json!({
        "data": {"values": [{"a": "A", "b": 28}, {"a": "B", "b": 55}]},
        "mark": "bar",
        "encoding": {
            "x": {"field": "a", "type": "nominal"},
            "y": {"field": "b", "type": "quantitative"}
        }
    })
}

fn roles(scene: &Scene, role: GroupRole) -> usize {
    scene.groups().iter().filter(|g| g.role == role).count()
}

#[test]
fn simple_bar_chart_has_marks_axes_and_frame() {
    let scene = compile(two_bars()).unwrap();
    assert_eq!(scene.mark_count(), 2);
    assert_eq!(roles(&scene, GroupRole::Axis), 2);
    assert_eq!(roles(&scene, GroupRole::Background), 1);
    assert_eq!(roles(&scene, GroupRole::Grid), 1);
    assert!(scene.size.width > 500.0);
    assert!(scene.size.height > 350.0);
    assert_eq!(scene.background, Color::WHITE);
}

#[test]
fn compilation_is_deterministic() {
    assert_eq!(compile(two_bars()).unwrap(), compile(two_bars()).unwrap());
}

#[test]
fn unsupported_constructs_fail_compilation() {
    let mut spec = two_bars();
    spec["mark"] = json!("hexbin");
    let err = compile(spec).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compilation);
    assert!(err.to_string().contains("unsupported mark type 'hexbin'"));

    let err = compile(json!({"layer": []})).unwrap_err();
    assert!(err.to_string().contains("layer"));

    let err = compile(json!({"data": {"url": "cars.json"}, "mark": "point"})).unwrap_err();
    assert!(err.to_string().contains("external data"));

    let err = compile(json!({"data": {"values": []}})).unwrap_err();
    assert!(err.to_string().contains("needs a mark"));

    let mut spec = two_bars();
    spec["encoding"]["y"]["field"] = json!("nope");
    assert!(compile(spec).unwrap_err().to_string().contains("'nope'"));
}

#[test]
fn background_and_title_are_applied() {
    let plain = compile(two_bars()).unwrap();
    let mut spec = two_bars();
    spec["background"] = json!("#fafafa");
    spec["title"] = json!("Hi");
    let scene = compile(spec).unwrap();
    assert_eq!(scene.background.to_hex(), "#fafafa");
    assert_eq!(roles(&scene, GroupRole::Title), 1);
    assert_eq!(scene.size.width, plain.size.width);
    assert_eq!(
        scene.size.height,
        plain.size.height + CHART_PADDING + TITLE_FONT_SIZE + GUIDE_PADDING
    );

    let mut bad = two_bars();
    bad["background"] = json!("not-a-color");
    assert_eq!(compile(bad).unwrap_err().kind(), ErrorKind::Compilation);
}

#[test]
fn stacked_bars_extend_the_measure_domain() {
    let chart: ChartSpec = serde_json::from_value(json!({
        "mark": "bar",
        "width": 200, "height": 200,
        "encoding": {
            "x": {"field": "k", "type": "nominal"},
            "y": {"field": "v", "type": "quantitative"},
            "color": {"field": "s", "type": "nominal"}
        }
    }))
    .unwrap();
    let data = Table::from_values(&[
        json!({"k": "a", "s": "p", "v": 30}),
        json!({"k": "a", "s": "q", "v": 50}),
        json!({"k": "b", "s": "p", "v": 10}),
    ]);
    let plan = plan_unit(&chart, &data, &SharedDomains::default()).unwrap();
    assert!(plan.stacked);
    match plan.domains.y {
        Some(Domain::Continuous(lo, hi)) => {
            assert_eq!(lo, 0.0);
            assert!(hi >= 80.0);
        }
        ref other => panic!("unexpected {other:?}"),
    }
    let scene = render_unit(&plan, true);
    assert_eq!(scene.mark_count(), 3);
    assert_eq!(roles(&scene, GroupRole::Legend), 1);
}

#[test]
fn discrete_panels_default_to_twenty_per_category() {
    let chart: ChartSpec = serde_json::from_value(json!({
        "mark": "point",
        "encoding": {
            "x": {"field": "k", "type": "ordinal"},
            "y": {"field": "v", "type": "quantitative"}
        }
    }))
    .unwrap();
    let data = Table::from_values(&[
        json!({"k": "a", "v": 1}),
        json!({"k": "b", "v": 2}),
        json!({"k": "c", "v": 3}),
    ]);
    let plan = plan_unit(&chart, &data, &SharedDomains::default()).unwrap();
    assert_eq!(plan.plot, Size::new(60.0, CONTINUOUS_PANEL_EXTENT));
}

#[test]
fn step_widths_scale_with_category_count() {
    let chart: ChartSpec = serde_json::from_value(json!({
        "mark": "bar",
        "width": {"step": 40},
        "height": {"step": 40},
        "encoding": {
            "x": {"field": "k", "type": "nominal"},
            "y": {"field": "v", "type": "quantitative"}
        }
    }))
    .unwrap();
    let data = Table::from_values(&[
        json!({"k": "a", "v": 1}),
        json!({"k": "b", "v": 2}),
        json!({"k": "c", "v": 3}),
    ]);
    let plan = plan_unit(&chart, &data, &SharedDomains::default()).unwrap();
    assert_eq!(plan.plot, Size::new(120.0, CONTINUOUS_PANEL_EXTENT));

    let mut spec = two_bars();
    spec["width"] = json!({"step": 40});
    let scene = compile(spec).unwrap();
    assert_eq!(scene.mark_count(), 2);
    assert!(scene.size.width < 500.0);
}

#[test]
fn container_sizes_fall_back_to_defaults() {
    let mut spec = two_bars();
    spec["width"] = json!("container");
    spec["height"] = json!("container");
    assert_eq!(compile(spec).unwrap(), compile(two_bars()).unwrap());

    let chart: ChartSpec = serde_json::from_value(json!({
        "mark": "point",
        "width": "container",
        "encoding": {"x": {"field": "k", "type": "ordinal"}}
    }))
    .unwrap();
    let data = Table::from_values(&[json!({"k": "a"}), json!({"k": "b"})]);
    let plan = plan_unit(&chart, &data, &SharedDomains::default()).unwrap();
    assert_eq!(plan.plot.width, 2.0 * STEP_PER_CATEGORY);
}

#[test]
fn bad_panel_sizes_fail_compilation() {
    for width in [json!("fill"), json!({"step": 0}), json!(-10)] {
        let mut spec = two_bars();
        spec["width"] = width.clone();
        let err = compile(spec).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compilation, "{width}");
    }
}

#[test]
fn explicit_scale_domains_win() {
    let chart: ChartSpec = serde_json::from_value(json!({
        "mark": "point", "width": 100, "height": 100,
        "encoding": {
            "x": {"field": "v", "type": "quantitative", "scale": {"domain": [-5, 5]}}
        }
    }))
    .unwrap();
    let data = Table::from_values(&[json!({"v": 1})]);
    let plan = plan_unit(&chart, &data, &SharedDomains::default()).unwrap();
    assert_eq!(plan.domains.x, Some(Domain::Continuous(-5.0, 5.0)));
}

#[test]
fn arcs_have_no_axes() {
    let scene = compile(json!({
        "data": {"values": [{"c": "a", "v": 1}, {"c": "b", "v": 2}]},
        "mark": "arc",
        "encoding": {
            "theta": {"field": "v", "type": "quantitative"},
            "color": {"field": "c", "type": "nominal"}
        }
    }))
    .unwrap();
    assert_eq!(scene.mark_count(), 2);
    assert_eq!(roles(&scene, GroupRole::Axis), 0);
    assert_eq!(roles(&scene, GroupRole::Legend), 1);
}

#[test]
fn quantitative_color_gets_a_gradient_legend() {
    let chart: ChartSpec = serde_json::from_value(json!({
        "mark": "rect", "width": 100, "height": 100,
        "encoding": {
            "x": {"field": "a", "type": "nominal"},
            "color": {"field": "v", "type": "quantitative"}
        }
    }))
    .unwrap();
    let data = Table::from_values(&[json!({"a": "x", "v": 3}), json!({"a": "y", "v": 9})]);
    let plan = plan_unit(&chart, &data, &SharedDomains::default()).unwrap();
    assert_eq!(plan.domains.color, Some(Domain::Continuous(3.0, 9.0)));
    let legend = legend_for(&plan).unwrap();
    match legend.kind {
        LegendKind::Gradient { domain, labels } => {
            assert_eq!(domain, (3.0, 9.0));
            assert!(!labels.is_empty());
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn hidden_legends_and_axes_are_omitted() {
    let mut spec = two_bars();
    spec["encoding"]["x"]["axis"] = Value::Null;
    spec["encoding"]["color"] = json!({"field": "a", "type": "nominal", "legend": null});
    let scene = compile(spec).unwrap();
    assert_eq!(roles(&scene, GroupRole::Axis), 1);
    assert_eq!(roles(&scene, GroupRole::Legend), 0);
}

#[test]
fn concat_children_inherit_data_and_are_spaced() {
    let child = json!({
        "mark": "bar", "width": 100, "height": 80,
        "encoding": {
            "x": {"field": "a", "type": "nominal"},
            "y": {"field": "b", "type": "quantitative"}
        }
    });
    let mut single = child.clone();
    single["data"] = two_bars()["data"].clone();
    let single = compile(single).unwrap();

    let h = compile(json!({"data": two_bars()["data"], "hconcat": [child, child]})).unwrap();
    assert_eq!(h.mark_count(), 4);
    assert_eq!(h.size.width, single.size.width * 2.0 + COMPOSITE_SPACING);
    assert_eq!(h.size.height, single.size.height);

    let v = compile(json!({"data": two_bars()["data"], "vconcat": [child, child]})).unwrap();
    assert_eq!(v.size.height, single.size.height * 2.0 + COMPOSITE_SPACING);
}

#[test]
fn facets_share_domains_and_draw_one_legend() {
    let scene = compile(json!({
        "data": {"values": [
            {"g": "left", "k": "a", "v": 1},
            {"g": "left", "k": "b", "v": 2},
            {"g": "right", "k": "a", "v": 30}
        ]},
        "facet": {"column": {"field": "g", "type": "nominal"}},
        "spec": {
            "mark": "bar",
            "encoding": {
                "x": {"field": "k", "type": "nominal"},
                "y": {"field": "v", "type": "quantitative"},
                "color": {"field": "k", "type": "nominal"}
            }
        }
    }))
    .unwrap();
    assert_eq!(scene.mark_count(), 3);
    assert_eq!(roles(&scene, GroupRole::Legend), 1);
    assert_eq!(roles(&scene, GroupRole::Header), 1);
    assert_eq!(roles(&scene, GroupRole::Axis), 4);
}

#[test]
fn wrapped_facets_honor_columns() {
    let values: Vec<Value> = (0..4)
        .map(|i| json!({"g": format!("g{i}"), "v": i}))
        .collect();
    let scene = compile(json!({
        "data": {"values": values},
        "facet": {"field": "g", "type": "nominal"},
        "columns": 2,
        "spec": {
            "mark": "point", "width": 50, "height": 50,
            "encoding": {"y": {"field": "v", "type": "quantitative"}}
        }
    }))
    .unwrap();
    assert_eq!(scene.mark_count(), 4);
    let one_row = compile(json!({
        "data": {"values": values},
        "facet": {"field": "g", "type": "nominal"},
        "spec": {
            "mark": "point", "width": 50, "height": 50,
            "encoding": {"y": {"field": "v", "type": "quantitative"}}
        }
    }))
    .unwrap();
    assert!(scene.size.height > one_row.size.height);
    assert!(scene.size.width < one_row.size.width);
}

#[test]
fn facets_need_an_inner_spec() {
    let err = compile(json!({"facet": {"field": "g", "type": "nominal"}})).unwrap_err();
    assert!(err.to_string().contains("'spec'"));
}

#[test]
fn empty_compositions_fail_compilation() {
    for key in ["hconcat", "vconcat"] {
        let mut spec = serde_json::Map::new();
        spec.insert(key.to_string(), json!([]));
        let err = compile(Value::Object(spec)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Compilation);
        assert!(err.to_string().contains("at least one view"), "{err}");
    }

    let err = compile(json!({
        "data": {"values": []},
        "facet": {"column": {"field": "g", "type": "nominal"}},
        "spec": {"mark": "point", "encoding": {"y": {"field": "v", "type": "quantitative"}}}
    }))
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compilation);
    assert!(err.to_string().contains("no data values"));
}
