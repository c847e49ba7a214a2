#![no_main]
use chrono::NaiveTime;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(templates) = chargedeck::tariff::parse_tariff_csv(text) else {
        return;
    };
    // Every parsed window must answer rate lookups without panicking
    for template in &templates {
        assert!(!template.windows.is_empty());
        for minute in (0..24 * 60).step_by(37) {
            if let Some(t) = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0)
                && let Some(rate) = template.rate_at(t)
            {
                assert!(rate.is_finite() && rate >= 0.0);
            }
        }
    }
});
