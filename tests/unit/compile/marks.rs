use super::*;
use crate::compile::data::Table;
use crate::compile::encode::Channels;
use crate::compile::scale::{BandScale, DEFAULT_MARK_COLOR, LinearScale};
use serde_json::json;

fn channels(v: serde_json::Value) -> Channels {
    let enc = serde_json::from_value(v).unwrap();
    Channels::resolve(Some(&enc)).unwrap()
}

fn style() -> MarkStyle {
    MarkStyle {
        color: DEFAULT_MARK_COLOR,
        opacity: None,
        filled: None,
        size: None,
        stroke_width: None,
        inner_radius: 0.0,
    }
}

fn text(s: &str) -> Datum {
    Datum::Text(s.into())
}

fn input<'a>(mark: MarkType, rows: &'a [Record], plot: Size) -> MarkInput<'a> {
    MarkInput {
        mark,
        style: style(),
        rows,
        plot,
        x: None,
        y: None,
        x2: None,
        y2: None,
        stacked: false,
        color: None,
        size: None,
        opacity: None,
        text: None,
        theta: None,
    }
}

fn rect_of(g: &SceneGroup) -> Rect {
    match &g.items[0] {
        Primitive::Rect { rect, .. } => *rect,
        other => panic!("expected rect, got {other:?}"),
    }
}

#[test]
fn vertical_bars_grow_from_the_baseline() {
    let table = Table::from_values(&[json!({"c": "A", "v": 28}), json!({"c": "B", "v": 55})]);
    let ch = channels(json!({
        "x": {"field": "c", "type": "nominal"},
        "y": {"field": "v", "type": "quantitative"}
    }));
    let xs = PositionScale::Band(BandScale::band(vec![text("A"), text("B")], (0.0, 500.0)));
    let ys = PositionScale::Linear(LinearScale::new((0.0, 60.0), (350.0, 0.0)));
    let mut inp = input(MarkType::Bar, table.rows(), Size::new(500.0, 350.0));
    inp.x = Some(Positional { channel: ch.x.as_ref().unwrap(), scale: &xs });
    inp.y = Some(Positional { channel: ch.y.as_ref().unwrap(), scale: &ys });

    assert_eq!(inp.orient(), Orient::Vertical);
    let groups = build_marks(&inp);
    assert_eq!(groups.len(), 2);
    let a = rect_of(&groups[0]);
    assert_eq!(a.y1, 350.0);
    assert!((a.y0 - (350.0 - 28.0 / 60.0 * 350.0)).abs() < 1e-9);
    assert!(rect_of(&groups[1]).x0 > a.x1);
    assert!(groups.iter().all(|g| g.role == GroupRole::Mark(MarkType::Bar)));
}

#[test]
fn horizontal_bars_when_x_is_the_measure() {
    let table = Table::from_values(&[json!({"c": "A", "v": 10})]);
    let ch = channels(json!({
        "y": {"field": "c", "type": "nominal"},
        "x": {"field": "v", "type": "quantitative"}
    }));
    let ys = PositionScale::Band(BandScale::band(vec![text("A")], (0.0, 100.0)));
    let xs = PositionScale::Linear(LinearScale::new((0.0, 10.0), (0.0, 200.0)));
    let mut inp = input(MarkType::Bar, table.rows(), Size::new(200.0, 100.0));
    inp.x = Some(Positional { channel: ch.x.as_ref().unwrap(), scale: &xs });
    inp.y = Some(Positional { channel: ch.y.as_ref().unwrap(), scale: &ys });
    assert_eq!(inp.orient(), Orient::Horizontal);
    let r = rect_of(&build_marks(&inp)[0]);
    assert_eq!((r.x0, r.x1), (0.0, 200.0));
}

#[test]
fn rows_with_unmappable_values_are_skipped() {
    let table = Table::from_values(&[json!({"c": "A", "v": "n/a"}), json!({"c": "Z", "v": 1})]);
    let ch = channels(json!({
        "x": {"field": "c", "type": "nominal"},
        "y": {"field": "v", "type": "quantitative"}
    }));
    let xs = PositionScale::Band(BandScale::band(vec![text("A")], (0.0, 100.0)));
    let ys = PositionScale::Linear(LinearScale::new((0.0, 1.0), (100.0, 0.0)));
    let mut inp = input(MarkType::Point, table.rows(), Size::new(100.0, 100.0));
    inp.x = Some(Positional { channel: ch.x.as_ref().unwrap(), scale: &xs });
    inp.y = Some(Positional { channel: ch.y.as_ref().unwrap(), scale: &ys });
    assert!(build_marks(&inp).is_empty());
}

#[test]
fn points_are_hollow_and_circles_filled() {
    let table = Table::from_values(&[json!({"a": 1})]);
    let plot = Size::new(100.0, 100.0);
    let point = build_marks(&input(MarkType::Point, table.rows(), plot));
    assert!(matches!(
        point[0].items[0],
        Primitive::Circle { fill: None, stroke: Some(_), .. }
    ));
    let circle = build_marks(&input(MarkType::Circle, table.rows(), plot));
    match &circle[0].items[0] {
        Primitive::Circle { fill: Some(p), radius, center, .. } => {
            assert_eq!(p.opacity, DEFAULT_TRANSLUCENT_OPACITY);
            assert!((radius * radius * PI - DEFAULT_SYMBOL_AREA).abs() < 1e-9);
            assert_eq!(*center, Point::new(50.0, 50.0));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn lines_split_into_color_series() {
    let table = Table::from_values(&[
        json!({"t": 2, "v": 1, "s": "b"}),
        json!({"t": 1, "v": 2, "s": "a"}),
        json!({"t": 2, "v": 3, "s": "a"}),
    ]);
    let ch = channels(json!({
        "x": {"field": "t", "type": "quantitative"},
        "y": {"field": "v", "type": "quantitative"},
        "color": {"field": "s", "type": "nominal"}
    }));
    let xs = PositionScale::Linear(LinearScale::new((0.0, 2.0), (0.0, 100.0)));
    let ys = PositionScale::Linear(LinearScale::new((0.0, 4.0), (100.0, 0.0)));
    let cs = ColorScale::Ordinal { domain: vec![text("a"), text("b")] };
    let mut inp = input(MarkType::Line, table.rows(), Size::new(100.0, 100.0));
    inp.x = Some(Positional { channel: ch.x.as_ref().unwrap(), scale: &xs });
    inp.y = Some(Positional { channel: ch.y.as_ref().unwrap(), scale: &ys });
    inp.color = Some((ch.color.as_ref().unwrap(), &cs));
    let groups = build_marks(&inp);
    assert_eq!(groups.len(), 2);
    match &groups[0].items[0] {
        Primitive::Path { path, stroke: Some(s), fill: None } => {
            assert_eq!(s.paint.color.to_hex(), "#4c78a8");
            assert_eq!(path.elements().len(), 2);
            assert_eq!(path.elements()[0], kurbo::PathEl::MoveTo(Point::new(50.0, 50.0)));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn arcs_cover_the_full_circle_starting_at_twelve() {
    let table = Table::from_values(&[json!({"v": 1}), json!({"v": 3}), json!({"v": 0})]);
    let ch = channels(json!({"theta": {"field": "v", "type": "quantitative"}}));
    let mut inp = input(MarkType::Arc, table.rows(), Size::new(200.0, 200.0));
    inp.theta = ch.theta.as_ref();
    let groups = build_marks(&inp);
    assert_eq!(groups.len(), 2);
    match &groups[0].items[0] {
        Primitive::Path { path, .. } => {
            let kurbo::PathEl::MoveTo(start) = path.elements()[0] else {
                panic!("sector must start with move_to");
            };
            assert!((start.x - 100.0).abs() < 1e-9);
            assert!(start.y.abs() < 1e-9);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn box_summary_uses_iqr_fences() {
    let s = BoxSummary::from_values(vec![1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
    assert_eq!(s.median, 3.5);
    assert_eq!(s.q1, 2.25);
    assert_eq!(s.q3, 4.75);
    assert_eq!(s.upper, 5.0);
    assert_eq!(s.lower, 1.0);
    assert_eq!(s.outliers, [100.0]);
    assert!(BoxSummary::from_values(Vec::new()).is_none());
}

#[test]
fn boxplots_emit_one_group_per_category() {
    let table = Table::from_values(&[
        json!({"g": "a", "v": 1}),
        json!({"g": "b", "v": 2}),
        json!({"g": "a", "v": 3}),
    ]);
    let ch = channels(json!({
        "x": {"field": "g", "type": "nominal"},
        "y": {"field": "v", "type": "quantitative"}
    }));
    let xs = PositionScale::Band(BandScale::band(vec![text("a"), text("b")], (0.0, 100.0)));
    let ys = PositionScale::Linear(LinearScale::new((0.0, 4.0), (100.0, 0.0)));
    let mut inp = input(MarkType::Boxplot, table.rows(), Size::new(100.0, 100.0));
    inp.x = Some(Positional { channel: ch.x.as_ref().unwrap(), scale: &xs });
    inp.y = Some(Positional { channel: ch.y.as_ref().unwrap(), scale: &ys });
    assert_eq!(build_marks(&inp).len(), 2);
}

#[test]
fn text_marks_need_a_text_channel() {
    let table = Table::from_values(&[json!({"label": "hi"})]);
    let plot = Size::new(50.0, 50.0);
    assert!(build_marks(&input(MarkType::Text, table.rows(), plot)).is_empty());
    let ch = channels(json!({"text": {"field": "label", "type": "nominal"}}));
    let mut inp = input(MarkType::Text, table.rows(), plot);
    inp.text = ch.text.as_ref();
    match &build_marks(&inp)[0].items[0] {
        Primitive::Text { text, .. } => assert_eq!(text, "hi"),
        other => panic!("unexpected {other:?}"),
    }
}
