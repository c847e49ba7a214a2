//! Past charging sessions, totals and monthly invoices

use crate::events::{DashboardEvent, EventSink};
use crate::logging::{StructuredLogger, get_logger};
use crate::session::SessionNotice;
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, VecDeque};
use std::fmt::Write as _;
use std::sync::{PoisonError, RwLock};

/// Records kept when no capacity is configured
pub const DEFAULT_CAPACITY: usize = 500;

/// How a recorded session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Charged to full
    Completed,
    /// Stopped before the battery was full
    Interrupted,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Whether an invoice period is still accruing sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// The month is still running
    Open,
    /// The month has closed and the invoice can be settled
    Due,
}

/// One finished charging session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub charger_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_seconds: u64,
    pub kwh: f64,
    /// Billed amount; `None` on non-commercial chargers
    pub amount: Option<f64>,
    pub status: SessionStatus,
}

/// Query parameters for the history list
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryFilter {
    pub charger_id: Option<String>,
    /// Inclusive lower bound on `started_at`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `started_at`
    pub to: Option<DateTime<Utc>>,
}

impl HistoryFilter {
    pub fn matches(&self, record: &SessionRecord) -> bool {
        self.charger_id
            .as_deref()
            .is_none_or(|id| record.charger_id == id)
            && self.from.is_none_or(|from| record.started_at >= from)
            && self.to.is_none_or(|to| record.started_at <= to)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Totals {
    pub sessions: usize,
    pub kwh: f64,
    pub amount: f64,
    pub average_kwh: f64,
}

/// Billed sessions of one charger in one calendar month (UTC)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Invoice {
    /// `INV-<charger>-<YYYYMM>`
    pub id: String,
    pub charger_id: String,
    /// `YYYY-MM`
    pub period: String,
    pub session_count: usize,
    pub kwh: f64,
    pub amount: f64,
    pub status: InvoiceStatus,
}

/// Sum a set of records
pub fn totals(records: &[SessionRecord]) -> Totals {
    let (sessions, kwh, amount) = records.iter().fold((0, 0.0, 0.0), |(n, kwh, amt), r| {
        (n + 1, kwh + r.kwh, amt + r.amount.unwrap_or(0.0))
    });
    Totals {
        sessions,
        kwh,
        amount,
        average_kwh: if sessions == 0 {
            0.0
        } else {
            kwh / sessions as f64
        },
    }
}

/// Group billed records by charger and month; unbilled records are skipped
///
/// The invoice for the month containing `as_of` is still open.
pub fn invoices(records: &[SessionRecord], as_of: DateTime<Utc>) -> Vec<Invoice> {
    let current = (as_of.year(), as_of.month());
    let mut grouped: BTreeMap<(String, String), Invoice> = BTreeMap::new();
    for record in records {
        let Some(amount) = record.amount else {
            continue;
        };
        let started = record.started_at;
        let period = started.format("%Y-%m").to_string();
        let invoice = grouped
            .entry((record.charger_id.clone(), period.clone()))
            .or_insert_with(|| Invoice {
                id: format!("INV-{}-{}", record.charger_id, started.format("%Y%m")),
                charger_id: record.charger_id.clone(),
                period,
                session_count: 0,
                kwh: 0.0,
                amount: 0.0,
                status: if (started.year(), started.month()) >= current {
                    InvoiceStatus::Open
                } else {
                    InvoiceStatus::Due
                },
            });
        invoice.session_count += 1;
        invoice.kwh += record.kwh;
        invoice.amount += amount;
    }
    grouped.into_values().collect()
}

/// Header row of [`export_csv`]
pub const CSV_HEADER: &str =
    "id,charger_id,started_at,ended_at,duration_seconds,kwh,amount,status";

/// Quote a field containing a delimiter, quote or line break
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Render records as CSV; amount is empty when not billed
pub fn export_csv(records: &[SessionRecord]) -> String {
    let mut out = String::with_capacity(64 * (records.len() + 1));
    out.push_str(CSV_HEADER);
    out.push('\n');
    for r in records {
        let amount = r.amount.map(|a| format!("{:.2}", a)).unwrap_or_default();
        let _ = writeln!(
            out,
            "{},{},{},{},{},{:.3},{},{}",
            csv_field(&r.id),
            csv_field(&r.charger_id),
            r.started_at.to_rfc3339(),
            r.ended_at.to_rfc3339(),
            r.duration_seconds,
            r.kwh,
            amount,
            r.status.as_str()
        );
    }
    out
}

/// Bounded, newest-last session history
///
/// Also an [`EventSink`]: a `Completed` session notice is recorded.
pub struct SessionHistory {
    records: RwLock<VecDeque<SessionRecord>>,
    capacity: usize,
    logger: StructuredLogger,
}

impl SessionHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
            logger: get_logger("history"),
        }
    }

    /// History seeded with the demo records shown before any live session ends
    pub fn with_samples(capacity: usize) -> Self {
        let history = Self::new(capacity);
        for record in sample_records() {
            history.push(record);
        }
        history
    }

    /// Append a record, dropping the oldest when full
    pub fn push(&self, record: SessionRecord) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All records, oldest first
    pub fn records(&self) -> Vec<SessionRecord> {
        self.filter(&HistoryFilter::default())
    }

    pub fn filter(&self, filter: &HistoryFilter) -> Vec<SessionRecord> {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }
}

impl EventSink for SessionHistory {
    fn emit(&self, event: &DashboardEvent) {
        let DashboardEvent::Session {
            notice: SessionNotice::Completed,
            snapshot,
            ..
        } = event
        else {
            return;
        };
        let duration = i64::try_from(snapshot.elapsed_seconds)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or_default();
        let record = SessionRecord {
            id: snapshot.session_id.clone(),
            charger_id: snapshot.charger_id.clone(),
            started_at: snapshot.updated_at - duration,
            ended_at: snapshot.updated_at,
            duration_seconds: snapshot.elapsed_seconds,
            kwh: snapshot.kwh,
            amount: snapshot.amount,
            status: SessionStatus::Completed,
        };
        self.logger.info(&format!(
            "Recorded completed session {} on {} ({:.2} kWh)",
            record.id, record.charger_id, record.kwh
        ));
        self.push(record);
    }
}

fn sample(
    id: &str,
    charger_id: &str,
    start: (i32, u32, u32, u32, u32),
    minutes: i64,
    kwh: f64,
    amount: Option<f64>,
    status: SessionStatus,
) -> Option<SessionRecord> {
    let (y, mo, d, h, mi) = start;
    let started_at = Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).single()?;
    Some(SessionRecord {
        id: id.to_string(),
        charger_id: charger_id.to_string(),
        started_at,
        ended_at: started_at + Duration::minutes(minutes),
        duration_seconds: (minutes * 60) as u64,
        kwh,
        amount,
        status,
    })
}

/// Fixed demo history
pub fn sample_records() -> Vec<SessionRecord> {
    use SessionStatus::{Completed, Interrupted};
    [
        sample("HIS-1001", "CHG-001", (2026, 9, 2, 18, 5), 142, 16.4, None, Completed),
        sample("HIS-1002", "CHG-002", (2026, 9, 4, 8, 30), 48, 31.2, Some(37_440.0), Completed),
        sample("HIS-1003", "CHG-002", (2026, 9, 19, 13, 10), 35, 22.8, Some(27_360.0), Interrupted),
        sample("HIS-1004", "CHG-003", (2026, 9, 23, 9, 0), 210, 28.1, None, Completed),
        sample("HIS-1005", "CHG-002", (2026, 10, 1, 17, 45), 61, 40.5, Some(48_600.0), Completed),
        sample("HIS-1006", "CHG-001", (2026, 10, 6, 21, 20), 95, 11.0, None, Interrupted),
        sample("HIS-1007", "CHG-002", (2026, 10, 11, 7, 55), 27, 18.3, Some(21_960.0), Completed),
    ]
    .into_iter()
    .flatten()
    .collect()
}
