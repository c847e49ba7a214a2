#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    if let Ok(value) = chargedeck::tariff::validate_price_input(&text) {
        assert!(value.is_finite() && value >= 0.0);
    }
});
