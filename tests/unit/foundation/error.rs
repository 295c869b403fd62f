use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        ChartError::invalid_input("x")
            .to_string()
            .starts_with("invalid input:")
    );
    assert!(
        ChartError::compilation("x")
            .to_string()
            .starts_with("compilation failure:")
    );
    assert!(
        ChartError::render("x")
            .to_string()
            .starts_with("render failure:")
    );
    assert!(
        ChartError::rasterization("x")
            .to_string()
            .starts_with("rasterization failure:")
    );
    assert_eq!(
        ChartError::TimeoutExceeded(Duration::from_millis(1500)).to_string(),
        "render timed out after 1500ms"
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = ChartError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Other);
}

#[test]
fn pipeline_diagnostic_round_trips_typed_prefixes() {
    let original = ChartError::compilation("unsupported mark type 'nonexistent'");
    let back = ChartError::from_pipeline_diagnostic(&format!("  {original}\n"));
    assert_eq!(back.kind(), ErrorKind::Compilation);
    assert_eq!(back.to_string(), original.to_string());

    let raster = ChartError::from_pipeline_diagnostic("rasterization failure: width must be > 0");
    assert_eq!(raster.kind(), ErrorKind::Rasterization);
}

#[test]
fn untyped_pipeline_diagnostic_becomes_render_failure() {
    let err = ChartError::from_pipeline_diagnostic("\nSegmentation fault\n");
    assert_eq!(err.kind(), ErrorKind::Render);
    assert_eq!(err.to_string(), "render failure: Segmentation fault");
}
