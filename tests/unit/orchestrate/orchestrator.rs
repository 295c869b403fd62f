use super::*;
use crate::foundation::error::ErrorKind;

fn opts_in(root: &Path) -> OrchestratorOpts {
    OrchestratorOpts {
        output_root: root.join("out"),
        temp_dir: Some(root.join("tmp")),
        ..Default::default()
    }
}

#[test]
fn defaults_match_the_documented_policy() {
    let o = OrchestratorOpts::default();
    assert_eq!(o.timeout(), Duration::from_secs(30));
    assert_eq!((o.min_width, o.max_width), (200, 4000));
    assert_eq!(o.output_subdir, "charts");
    let id = Uuid::nil();
    assert_eq!(
        o.locator_for(id),
        "/storage/charts/00000000-0000-0000-0000-000000000000.png"
    );
}

#[test]
fn config_files_fill_missing_fields_with_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("opts.json");
    std::fs::write(&path, r#"{"timeout_ms": 500, "locator_prefix": "/files/"}"#).unwrap();
    let o = OrchestratorOpts::from_path(&path).unwrap();
    assert_eq!(o.timeout_ms, 500);
    assert_eq!(o.max_width, 4000);
    assert!(o.locator_for(Uuid::nil()).starts_with("/files/charts/"));

    std::fs::write(&path, "{nope").unwrap();
    assert_eq!(OrchestratorOpts::from_path(&path).unwrap_err().kind(), ErrorKind::Other);
}

#[test]
fn malformed_json_fails_before_any_artifact_exists() {
    let dir = tempfile::tempdir().unwrap();
    let orch = RenderOrchestrator::new(opts_in(dir.path()));
    let err = orch.render(r#"{"mark":"#, Some(800)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(!dir.path().join("out").exists());
    assert_eq!(orch.render("   ", None).unwrap_err().kind(), ErrorKind::InvalidInput);
}

#[test]
fn widths_outside_policy_are_invalid_input() {
    let dir = tempfile::tempdir().unwrap();
    let orch = RenderOrchestrator::new(opts_in(dir.path()));
    for w in [0, 199, 4001] {
        let err = orch.render("{}", Some(w)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "width {w}");
    }
    assert!(!dir.path().join("out").exists());
}

#[test]
fn orchestrator_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<RenderOrchestrator>();
}
