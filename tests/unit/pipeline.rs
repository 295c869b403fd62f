use std::sync::Arc;

use super::*;
use crate::foundation::error::ErrorKind;

const TWO_BARS: &str = r#"{"mark":"bar","encoding":{"x":{"field":"category","type":"nominal"},"y":{"field":"value","type":"quantitative"}},"data":{"values":[{"category":"A","value":28},{"category":"B","value":55}]}}"#;

fn bare() -> Rasterizer {
    Rasterizer::with_fontdb(Arc::new(usvg::fontdb::Database::new()))
}

#[test]
fn svg_contains_one_group_per_bar() {
    let doc = render_chart_svg(TWO_BARS).unwrap();
    assert_eq!(doc.svg.matches(r#"class="mark mark-bar""#).count(), 2);
    assert_eq!(render_chart_svg(TWO_BARS).unwrap(), doc);
}

#[test]
fn png_matches_requested_width() {
    let img = render_chart(&bare(), TWO_BARS, 800).unwrap();
    assert_eq!(img.width, 800);
    let doc = render_chart_svg(TWO_BARS).unwrap();
    let expected = (800.0 * doc.height / doc.width).round() as u32;
    assert_eq!(img.height, expected);
}

#[test]
fn failures_keep_their_kind() {
    let err = render_chart(&bare(), r#"{"mark":"#, 800).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let err = render_chart(&bare(), &TWO_BARS.replace("\"bar\"", "\"nonexistent\""), 800).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compilation);
    assert!(err.to_string().contains("nonexistent"));

    let err = render_chart(&bare(), TWO_BARS, 0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rasterization);
}

#[test]
fn missing_input_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = run_pipeline_files(&dir.path().join("nope.json"), &dir.path().join("out.png"), 100)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Other);
    assert!(!dir.path().join("out.png").exists());
}
