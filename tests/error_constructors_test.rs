use chargedeck::error::ChargeDeckError;
use chargedeck::session::SessionRejection;
use chargedeck::tariff::{TariffParseError, validate_price_input};

#[test]
fn error_constructors_group_1() {
    assert!(matches!(
        ChargeDeckError::config("x"),
        ChargeDeckError::Config { .. }
    ));
    assert!(matches!(
        ChargeDeckError::storage("x"),
        ChargeDeckError::Storage { .. }
    ));
    assert!(matches!(ChargeDeckError::web("x"), ChargeDeckError::Web { .. }));
    assert!(matches!(ChargeDeckError::io("x"), ChargeDeckError::Io { .. }));
}

#[test]
fn error_constructors_group_2() {
    assert!(matches!(
        ChargeDeckError::validation("f", "m"),
        ChargeDeckError::Validation { .. }
    ));
    assert!(matches!(
        ChargeDeckError::not_found("x"),
        ChargeDeckError::NotFound { .. }
    ));
    assert!(matches!(
        ChargeDeckError::rejected("x"),
        ChargeDeckError::Rejected { .. }
    ));
    assert!(matches!(
        ChargeDeckError::generic("x"),
        ChargeDeckError::Generic { .. }
    ));
}

#[test]
fn domain_errors_convert() {
    let e: ChargeDeckError = SessionRejection::Ended.into();
    assert!(matches!(e, ChargeDeckError::Rejected { .. }));
    assert!(e.to_string().contains("session has ended"));

    let e: ChargeDeckError = TariffParseError::Empty.into();
    assert!(matches!(e, ChargeDeckError::Validation { ref field, .. } if field == "tariff"));

    let e: ChargeDeckError = validate_price_input("abc").unwrap_err().into();
    assert!(matches!(e, ChargeDeckError::Validation { ref field, .. } if field == "price"));
}

#[test]
fn display_messages() {
    let e = ChargeDeckError::validation("field", "bad");
    let s = format!("{}", e);
    assert!(s.contains("Validation error"));
}
