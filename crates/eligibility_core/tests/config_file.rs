use eligibility_core::{ConfigError, EligibilityConfig, DEFAULT_EXPIRING_WINDOW_DAYS};
use std::io::Write;

#[test]
fn load_reads_json_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("eligibility.json");
    let log_dir = dir.path().join("logs");
    let mut file = std::fs::File::create(&path).unwrap();
    write!(
        file,
        "{}",
        serde_json::json!({
            "expiring_window_days": 5,
            "utc_offset_minutes": -300,
            "log_level": "warn",
            "log_dir": log_dir.to_str().unwrap(),
        })
    )
    .unwrap();

    let config = EligibilityConfig::load(&path).unwrap();
    assert_eq!(config.expiring_window_days, 5);
    assert_eq!(config.utc_offset().unwrap().local_minus_utc(), -300 * 60);
    assert_eq!(config.log_level, "warn");
    assert_eq!(config.log_dir.as_deref(), log_dir.to_str());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = EligibilityConfig::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn default_window_is_eight_days() {
    assert_eq!(DEFAULT_EXPIRING_WINDOW_DAYS, 8);
    assert_eq!(
        EligibilityConfig::default().expiring_window_days,
        DEFAULT_EXPIRING_WINDOW_DAYS
    );
}
