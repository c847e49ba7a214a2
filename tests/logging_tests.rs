use chargedeck::logging::{
    LogContext, get_logger_with_context, parse_line_level, set_web_log_level, should_emit_to_web,
};
use tracing::Level;

#[test]
fn should_emit_filters_below_runtime_level() {
    // Runtime level WARN: INFO lines are filtered out, ERROR passes
    set_web_log_level(Level::WARN);
    assert!(!should_emit_to_web(" INFO message"));
    assert!(should_emit_to_web(" ERROR something"));
    set_web_log_level(Level::INFO);
}

#[test]
fn line_levels_are_detected() {
    assert_eq!(parse_line_level("2026-10-15T09:00:00Z  WARN chargedeck: x"), Some(Level::WARN));
    assert_eq!(parse_line_level("no level here"), None);
}

#[test]
fn contextual_logger_accepts_session_fields() {
    let logger = get_logger_with_context(
        LogContext::new("session")
            .with_session_id("s-1".into())
            .with_charger_id("CHG-002".into())
            .with_field("phase", "charging".into()),
    );
    logger.info("context logging does not panic without a subscriber");
}
