#![cfg(test)]

use super::config::*;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.web.port, 8090);
    assert_eq!(config.session.tick_interval_ms, 1000);
    assert!((config.session.percent_per_tick - 0.05).abs() < f64::EPSILON);
    assert_eq!(config.chargers.len(), 3);
}

#[test]
fn test_config_validation() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());

    config.web.port = 0;
    assert!(config.validate().is_err());

    config = Config::default();
    config.session.tick_interval_ms = 0;
    assert!(config.validate().is_err());

    config = Config::default();
    config.locale.timezone = "Mars/Olympus".to_string();
    assert!(config.validate().is_err());

    config = Config::default();
    config.session.commercial_charger_id = "CHG-404".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_serialization() {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config).unwrap();
    let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(config.web.port, deserialized.web.port);
    assert_eq!(config.chargers.len(), deserialized.chargers.len());
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let yaml = "web:\n  port: 9000\nsession:\n  rate_per_kwh: 900\n";
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.web.port, 9000);
    assert_eq!(config.web.host, "127.0.0.1");
    assert!((config.session.rate_per_kwh - 900.0).abs() < f64::EPSILON);
    assert_eq!(config.session.tick_interval_ms, 1000);
    assert!(config.validate().is_ok());
}
