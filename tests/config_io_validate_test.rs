use chargedeck::config::Config;
use std::fs;

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = Config::default();
    cfg.session.rate_per_kwh = 950.0;
    cfg.locale.timezone = "Europe/Amsterdam".to_string();
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert!((loaded.session.rate_per_kwh - 950.0).abs() < f64::EPSILON);
    assert_eq!(loaded.locale.timezone, "Europe/Amsterdam");
    assert_eq!(loaded.logging.file, cfg.logging.file);
    assert_eq!(loaded.chargers, cfg.chargers);
    assert!(loaded.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = Config::default();

    cfg.storage.state_file.clear();
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.supply_decay = 1.5;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.initial_percent = 101.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.locale.date_format = "YY.MM.DD".to_string();
    assert!(cfg.validate().is_err());

    // Commercial charger must exist
    cfg = Config::default();
    cfg.session.commercial_charger_id = "CHG-404".to_string();
    assert!(cfg.validate().is_err());

    // Without chargers there is nothing to cross-check
    cfg = Config::default();
    cfg.chargers.clear();
    cfg.session.commercial_charger_id = "CHG-404".to_string();
    assert!(cfg.validate().is_ok());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn partial_yaml_keeps_defaults() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(
        tmp.path(),
        b"session:\n  tick_interval_ms: 250\nlocale:\n  currency_code: EUR\n",
    )
    .unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();
    assert_eq!(cfg.session.tick_interval_ms, 250);
    assert_eq!(cfg.session.active_charger_id, "CHG-002");
    assert_eq!(cfg.locale.currency_code, "EUR");
    assert_eq!(cfg.locale.timezone, "Africa/Kampala");
    assert_eq!(cfg.chargers.len(), 3);
}

#[test]
fn non_finite_session_values_are_rejected() {
    let mut cfg = Config::default();
    cfg.session.power_jitter_kw = f64::INFINITY;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.power_jitter_kw = 1e308;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.max_power_kw = f64::NAN;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.rate_per_kwh = f64::NAN;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.initial_power_kw = f64::NEG_INFINITY;
    assert!(cfg.validate().is_err());
}

#[test]
fn session_power_and_tick_bounds() {
    let mut cfg = Config::default();
    cfg.session.max_power_kw = 80.5;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.max_power_kw = 22.0;
    cfg.session.power_jitter_kw = 23.0;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.tick_interval_ms = u64::MAX;
    assert!(cfg.validate().is_err());

    cfg = Config::default();
    cfg.session.tick_interval_ms = 60_000;
    cfg.session.max_power_kw = 80.0;
    cfg.session.power_jitter_kw = 80.0;
    assert!(cfg.validate().is_ok());
}

#[test]
fn yaml_infinity_does_not_pass_validation() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"session:\n  power_jitter_kw: .inf\n").unwrap();
    let cfg = Config::from_file(tmp.path()).unwrap();
    let err = cfg.validate().unwrap_err();
    assert!(err.to_string().contains("power_jitter_kw"));
}
