//! Time-of-use tariff templates and pricing input checks
//!
//! Templates are imported from a small CSV dialect:
//!
//! ```text
//! template,label,start,end,rate
//! Standard,Peak,07:00,22:00,1400
//! Standard,Off-peak,22:00,07:00,900
//! ```
//!
//! The delimiter may be `,` or `;`. Blank lines and lines starting with `#`
//! are skipped. Windows whose end is before their start wrap past midnight.

use chrono::NaiveTime;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Why a tariff CSV could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TariffParseError {
    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
    #[error("no tariff rows found")]
    Empty,
}

impl TariffParseError {
    fn at(line: usize, message: impl Into<String>) -> Self {
        Self::Line {
            line,
            message: message.into(),
        }
    }
}

/// A priced time window within a day
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TouWindow {
    pub label: String,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub rate: f64,
}

impl TouWindow {
    /// Half-open `[start, end)`; wraps midnight when `end <= start`
    pub fn contains(&self, time: NaiveTime) -> bool {
        if self.start < self.end {
            self.start <= time && time < self.end
        } else {
            time >= self.start || time < self.end
        }
    }
}

/// Named set of windows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TariffTemplate {
    pub name: String,
    pub windows: Vec<TouWindow>,
}

impl TariffTemplate {
    /// Rate in effect at `time`; the first matching window wins
    pub fn rate_at(&self, time: NaiveTime) -> Option<f64> {
        self.window_at(time).map(|w| w.rate)
    }

    pub fn window_at(&self, time: NaiveTime) -> Option<&TouWindow> {
        self.windows.iter().find(|w| w.contains(time))
    }
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn is_header(fields: &[&str]) -> bool {
    fields
        .first()
        .is_some_and(|f| f.eq_ignore_ascii_case("template"))
}

/// Parse tariff templates, keeping first-seen template order
pub fn parse_tariff_csv(text: &str) -> Result<Vec<TariffTemplate>, TariffParseError> {
    let mut templates: Vec<TariffTemplate> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut delimiter = None;

    for (pos, raw) in text.lines().enumerate() {
        let line_no = pos + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let delim = *delimiter.get_or_insert(if line.contains(';') { ';' } else { ',' });
        let fields: Vec<&str> = line.split(delim).map(str::trim).collect();

        if templates.is_empty() && is_header(&fields) {
            continue;
        }
        let &[name, label, start, end, rate] = fields.as_slice() else {
            return Err(TariffParseError::at(
                line_no,
                format!("expected 5 fields, found {}", fields.len()),
            ));
        };

        if name.is_empty() {
            return Err(TariffParseError::at(line_no, "template name is empty"));
        }
        let start = parse_time(start)
            .ok_or_else(|| TariffParseError::at(line_no, format!("invalid start time '{}'", start)))?;
        let end = parse_time(end)
            .ok_or_else(|| TariffParseError::at(line_no, format!("invalid end time '{}'", end)))?;
        let rate: f64 = rate
            .parse()
            .ok()
            .filter(|r: &f64| r.is_finite() && *r >= 0.0)
            .ok_or_else(|| TariffParseError::at(line_no, format!("invalid rate '{}'", rate)))?;

        let slot = *index.entry(name.to_string()).or_insert_with(|| {
            templates.push(TariffTemplate {
                name: name.to_string(),
                windows: Vec::new(),
            });
            templates.len() - 1
        });
        templates[slot].windows.push(TouWindow {
            label: label.to_string(),
            start,
            end,
            rate,
        });
    }

    if templates.is_empty() {
        return Err(TariffParseError::Empty);
    }
    Ok(templates)
}

/// Why a price typed into the pricing form is not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PriceInputError {
    #[error("Enter a price")]
    Empty,
    #[error("Use digits and an optional decimal point only")]
    InvalidCharacters,
    #[error("Use at most two decimal places")]
    TooManyDecimals,
    #[error("Price is too large")]
    TooLarge,
}

/// Check a price entered by the owner and return its value
pub fn validate_price_input(text: &str) -> Result<f64, PriceInputError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(PriceInputError::Empty);
    }
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (text, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(int_part) || frac_part.is_some_and(|f| !digits(f)) {
        return Err(PriceInputError::InvalidCharacters);
    }
    if frac_part.is_some_and(|f| f.len() > 2) {
        return Err(PriceInputError::TooManyDecimals);
    }
    let value: f64 = text.parse().map_err(|_| PriceInputError::InvalidCharacters)?;
    if !value.is_finite() {
        return Err(PriceInputError::TooLarge);
    }
    Ok(value)
}

/// The owner's tariff templates, keyed by name
#[derive(Debug, Clone, Default)]
pub struct TariffBook {
    templates: BTreeMap<String, TariffTemplate>,
}

impl TariffBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in templates offered on the pricing screen
    pub fn sample() -> Self {
        let mut book = Self::new();
        if let Ok(templates) = parse_tariff_csv(SAMPLE_TARIFFS) {
            book.import(templates);
        }
        book
    }

    /// Add templates, replacing any with the same name; returns how many were added
    pub fn import(&mut self, templates: Vec<TariffTemplate>) -> usize {
        let count = templates.len();
        for template in templates {
            self.templates.insert(template.name.clone(), template);
        }
        count
    }

    pub fn get(&self, name: &str) -> Option<&TariffTemplate> {
        self.templates.get(name)
    }

    pub fn list(&self) -> Vec<&TariffTemplate> {
        self.templates.values().collect()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

const SAMPLE_TARIFFS: &str = "\
template,label,start,end,rate
Flat,All day,00:00,00:00,1200
Time of use,Peak,07:00,22:00,1400
Time of use,Off-peak,22:00,07:00,900
";

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn parses_semicolons_comments_and_header() {
        let csv = "# exported\n\ntemplate;label;start;end;rate\nNight;Cheap;23:00;06:00;700\n";
        let templates = parse_tariff_csv(csv).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "Night");
        assert_eq!(templates[0].windows[0].rate, 700.0);
    }

    #[test]
    fn groups_rows_by_template() {
        let csv = "A,x,00:00,12:00,1\nB,y,00:00,00:00,2\nA,z,12:00,00:00,3\n";
        let templates = parse_tariff_csv(csv).unwrap();
        let names: Vec<_> = templates.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["A", "B"]);
        assert_eq!(templates[0].windows.len(), 2);
    }

    #[test]
    fn errors_name_the_line() {
        let csv = "template,label,start,end,rate\nA,x,07:00,09:00,10\nA,y,25:00,09:00,10\n";
        assert_eq!(
            parse_tariff_csv(csv).unwrap_err(),
            TariffParseError::Line {
                line: 3,
                message: "invalid start time '25:00'".into()
            }
        );
        assert!(matches!(
            parse_tariff_csv("A,x,07:00\n"),
            Err(TariffParseError::Line { line: 1, .. })
        ));
        assert!(matches!(
            parse_tariff_csv("A,x,07:00,08:00,-1\n"),
            Err(TariffParseError::Line { line: 1, .. })
        ));
        assert_eq!(parse_tariff_csv("# nothing\n\n"), Err(TariffParseError::Empty));
    }

    #[test]
    fn rate_at_wraps_midnight() {
        let book = TariffBook::sample();
        let tou = book.get("Time of use").unwrap();
        assert_eq!(tou.rate_at(t(12, 0)), Some(1400.0));
        assert_eq!(tou.rate_at(t(22, 0)), Some(900.0));
        assert_eq!(tou.rate_at(t(3, 30)), Some(900.0));
        assert_eq!(tou.rate_at(t(7, 0)), Some(1400.0));
        assert_eq!(book.get("Flat").unwrap().rate_at(t(13, 37)), Some(1200.0));
    }

    #[test]
    fn gaps_have_no_rate() {
        let csv = "Short,Morning,06:00,09:00,500\n";
        let templates = parse_tariff_csv(csv).unwrap();
        assert_eq!(templates[0].rate_at(t(10, 0)), None);
    }

    #[test]
    fn price_input_rules() {
        assert_eq!(validate_price_input(" 1200 "), Ok(1200.0));
        assert_eq!(validate_price_input("12.5"), Ok(12.5));
        assert_eq!(validate_price_input("0.99"), Ok(0.99));
        assert_eq!(validate_price_input(""), Err(PriceInputError::Empty));
        assert_eq!(validate_price_input("12.345"), Err(PriceInputError::TooManyDecimals));
        assert_eq!(validate_price_input("-5"), Err(PriceInputError::InvalidCharacters));
        assert_eq!(validate_price_input("1e3"), Err(PriceInputError::InvalidCharacters));
        assert_eq!(validate_price_input("12."), Err(PriceInputError::InvalidCharacters));
        assert_eq!(validate_price_input("1.2.3"), Err(PriceInputError::InvalidCharacters));
        assert_eq!(validate_price_input(&"9".repeat(400)), Err(PriceInputError::TooLarge));
    }
}
