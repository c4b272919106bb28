//! Sample and report export against a real filesystem

mod common;

use captcha_lab::export;
use captcha_lab::provider::{RenderSettings, SampleProvider, SyntheticProvider};
use captcha_lab::refinement::{CancelToken, RefinementController, SessionConfig};
use captcha_lab::types::Difficulty;
use common::{CountingProvider, ScriptedClassifier};
use tempfile::TempDir;

#[test]
fn test_saved_sample_reopens_as_png() {
    let dir = TempDir::new().unwrap();
    let settings = RenderSettings::default();
    let mut provider = SyntheticProvider::with_seed(settings, 11);
    let sample = provider.refine(Difficulty::Medium).unwrap();

    let path = export::save_sample(&sample, dir.path()).unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with(sample.text()));
    assert!(name.ends_with(".png"));

    let reopened = image::open(&path).unwrap().to_luma8();
    assert_eq!(reopened.dimensions(), (settings.width, settings.height));
    assert_eq!(reopened.as_raw(), sample.image().as_raw());
}

#[test]
fn test_session_report_written_as_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("reports").join("session.json");

    let mut ctl =
        RefinementController::new(CountingProvider::default(), ScriptedClassifier::constant(0.5));
    let summary = ctl
        .run_session(
            SessionConfig::new(Difficulty::Easy, 2, 2),
            &mut (),
            &CancelToken::new(),
        )
        .unwrap();
    export::save_report(&summary, &path).unwrap();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["history"], serde_json::json!([0.5, 0.5]));
    assert_eq!(written["rounds_completed"], 2);
    assert_eq!(written["target"], "easy");
}
