use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use tapestry_capture::config::{CameraKind, Configuration, MicrophoneKind};

#[test]
fn defaults_describe_a_one_minute_session() {
    let cfg = Configuration::default().validated().unwrap();
    assert_eq!(cfg.session.total_duration, Duration::from_secs(60));
    assert_eq!(cfg.session.capture_interval, Duration::from_secs(5));
    assert_eq!(cfg.session.total_captures(), 12);
    assert_eq!(cfg.tapestry.spacing, 32.0);
    assert_eq!(cfg.tapestry.grain_count, 400);
    assert!(!cfg.tapestry.weave_live_preview);
    assert_eq!(cfg.camera.kind, CameraKind::Pattern);
    assert_eq!(cfg.window.frame_rate, 60);
}

#[test]
fn parse_kebab_case_config() {
    let yaml = r#"
session:
  total-duration: 30s
  capture-interval: 3s
tapestry:
  spacing: 24
  thread-width: 4
  pan-smoothing: 0.2
  weave-live-preview: true
camera:
  type: still
  path: "/photos/desk.jpg"
microphone:
  type: silent
placeholder-path: "/photos/card.png"
seed: 7
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let cfg = cfg.validated().unwrap();
    assert_eq!(cfg.session.total_captures(), 10);
    assert!((cfg.tapestry.spacing - 24.0).abs() < f32::EPSILON);
    assert!((cfg.tapestry.thread_width - 4.0).abs() < f32::EPSILON);
    assert!(cfg.tapestry.weave_live_preview);
    // Unset keys keep their defaults.
    assert!((cfg.tapestry.wobble - 6.0).abs() < f32::EPSILON);
    assert_eq!(cfg.camera.kind, CameraKind::Still);
    assert_eq!(cfg.camera.path, Some(PathBuf::from("/photos/desk.jpg")));
    assert_eq!(cfg.microphone.kind, MicrophoneKind::Silent);
    assert_eq!(cfg.placeholder_path, Some(PathBuf::from("/photos/card.png")));
    assert_eq!(cfg.seed, Some(7));
}

#[test]
fn rejects_duration_not_divisible_by_interval() {
    let yaml = r#"
session:
  total-duration: 61s
  capture-interval: 5s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    let err = cfg.validated().unwrap_err();
    assert!(
        format!("{err:#}").contains("whole multiple"),
        "unexpected error: {err:#}"
    );
}

#[test]
fn rejects_zero_interval() {
    let yaml = r#"
session:
  capture-interval: 0s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn rejects_interval_longer_than_session() {
    let yaml = r#"
session:
  total-duration: 5s
  capture-interval: 10s
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn still_camera_requires_path() {
    let yaml = r#"
camera:
  type: still
"#;
    let cfg: Configuration = serde_yaml::from_str(yaml).unwrap();
    assert!(cfg.validated().is_err());
}

#[test]
fn rejects_unknown_microphone_type() {
    let yaml = r#"
microphone:
  type: telepathy
"#;
    assert!(serde_yaml::from_str::<Configuration>(yaml).is_err());
}

#[test]
fn loads_from_yaml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "session:\n  total-duration: 20s\n  capture-interval: 4s\nwindow:\n  title: Studio\n  fullscreen: true"
    )
    .unwrap();
    let cfg = Configuration::from_yaml_file(file.path())
        .unwrap()
        .validated()
        .unwrap();
    assert_eq!(cfg.session.total_captures(), 5);
    assert_eq!(cfg.window.title, "Studio");
    assert!(cfg.window.fullscreen);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(Configuration::from_yaml_file(dir.path().join("absent.yaml")).is_err());
}
