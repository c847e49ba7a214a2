use chargedeck::history::{self, HistoryFilter, InvoiceStatus, SessionHistory};
use chargedeck::tariff::{TariffBook, parse_tariff_csv};
use chrono::{NaiveTime, TimeZone, Utc};

#[test]
fn imported_template_replaces_sample_of_same_name() {
    let mut book = TariffBook::sample();
    let before = book.len();
    let imported = parse_tariff_csv("Flat;All day;00:00;00:00;1500\n").unwrap();
    assert_eq!(book.import(imported), 1);
    assert_eq!(book.len(), before);

    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
    assert_eq!(book.get("Flat").unwrap().rate_at(noon), Some(1500.0));
}

#[test]
fn windows_with_seconds_parse() {
    let templates = parse_tariff_csv("Evening,Peak,17:30:00,21:00:00,1800\n").unwrap();
    let t = NaiveTime::from_hms_opt(20, 59, 59).unwrap();
    assert_eq!(templates[0].rate_at(t), Some(1800.0));
}

#[test]
fn filtered_totals_and_export_agree() {
    let history = SessionHistory::with_samples(history::DEFAULT_CAPACITY);
    let filter = HistoryFilter {
        charger_id: Some("CHG-002".into()),
        from: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).single(),
        to: None,
    };
    let records = history.filter(&filter);
    let totals = history::totals(&records);
    assert_eq!(totals.sessions, 2);
    assert!((totals.amount - 70_560.0).abs() < 1e-6);

    let csv = history::export_csv(&records);
    assert_eq!(csv.lines().count(), records.len() + 1);
    assert!(csv.lines().skip(1).all(|l| l.contains(",CHG-002,")));

    let as_of = Utc.with_ymd_and_hms(2026, 11, 2, 0, 0, 0).unwrap();
    let invoices = history::invoices(&records, as_of);
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].id, "INV-CHG-002-202610");
    assert_eq!(invoices[0].period, "2026-10");
    assert_eq!(invoices[0].session_count, 2);
    assert_eq!(invoices[0].status, InvoiceStatus::Due);
}
