//! Locale-aware rendering of amounts, dates, durations and energy
//!
//! These helpers back the settings preview and every value the dashboard
//! shows next to a currency or a timestamp.

use crate::config::LocaleConfig;
use crate::error::{ChargeDeckError, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Shown where a value exists but does not apply (e.g. cost on a private charger)
pub const NOT_APPLICABLE: &str = "N/A";

/// Shown where a value cannot be computed right now
pub const UNAVAILABLE: &str = "Unavailable";

/// Render seconds as `HH:MM:SS`; hours grow past two digits when needed
pub fn format_hms(total_seconds: u64) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
}

/// Render energy with two decimals
pub fn format_kwh(kwh: f64) -> String {
    format!("{:.2} kWh", kwh)
}

/// Render power with one decimal
pub fn format_power(kw: f64) -> String {
    format!("{:.1} kW", kw)
}

/// Date patterns offered on the locale settings screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DateFormat {
    /// 31/12/2026
    DayMonthYear,
    /// 12/31/2026
    MonthDayYear,
    /// 2026-12-31
    Iso,
}

impl DateFormat {
    /// The user-facing pattern string
    pub fn pattern(self) -> &'static str {
        match self {
            Self::DayMonthYear => "DD/MM/YYYY",
            Self::MonthDayYear => "MM/DD/YYYY",
            Self::Iso => "YYYY-MM-DD",
        }
    }

    fn strftime(self) -> &'static str {
        match self {
            Self::DayMonthYear => "%d/%m/%Y",
            Self::MonthDayYear => "%m/%d/%Y",
            Self::Iso => "%Y-%m-%d",
        }
    }
}

impl FromStr for DateFormat {
    type Err = ChargeDeckError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DD/MM/YYYY" => Ok(Self::DayMonthYear),
            "MM/DD/YYYY" => Ok(Self::MonthDayYear),
            "YYYY-MM-DD" => Ok(Self::Iso),
            other => Err(ChargeDeckError::validation(
                "date_format",
                format!("Unsupported date format '{}'", other),
            )),
        }
    }
}

impl fmt::Display for DateFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.pattern())
    }
}

/// Render an instant as a date plus `HH:MM` in the given timezone
pub fn preview_date(instant: DateTime<Utc>, format: DateFormat, tz: Tz) -> String {
    let local = instant.with_timezone(&tz);
    format!("{} {}", local.format(format.strftime()), local.format("%H:%M"))
}

/// How amounts are rendered for a currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyFormat {
    pub code: String,
    pub symbol: String,
    pub symbol_first: bool,
    pub decimals: u8,
    pub thousands_separator: String,
    pub decimal_separator: String,
}

impl CurrencyFormat {
    /// Render an amount, e.g. `UGX 12,346` or `1.234,50 €`
    pub fn format_amount(&self, amount: f64) -> String {
        let negative = amount < 0.0;
        let fixed = format!("{:.*}", usize::from(self.decimals), amount.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };

        let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
        for (i, ch) in int_part.chars().enumerate() {
            if i > 0 && (int_part.len() - i) % 3 == 0 {
                grouped.push_str(&self.thousands_separator);
            }
            grouped.push(ch);
        }
        if let Some(frac) = frac_part {
            grouped.push_str(&self.decimal_separator);
            grouped.push_str(frac);
        }

        let sign = if negative { "-" } else { "" };
        if self.symbol_first {
            format!("{}{} {}", sign, self.symbol, grouped)
        } else {
            format!("{}{} {}", sign, grouped, self.symbol)
        }
    }
}

/// Rendered previews for the locale settings screen
#[derive(Debug, Clone, Serialize)]
pub struct LocalePreview {
    pub date_format: String,
    pub timezone: String,
    pub date: String,
    pub currency: String,
}

/// Parsed locale settings
#[derive(Debug, Clone)]
pub struct LocaleSettings {
    pub currency: CurrencyFormat,
    pub date_format: DateFormat,
    pub timezone: Tz,
}

impl LocaleSettings {
    /// Sample amount rendered in the currency preview
    pub const PREVIEW_AMOUNT: f64 = 1_234_567.8;

    /// Build from configuration, rejecting unknown patterns and timezones
    pub fn from_config(config: &LocaleConfig) -> Result<Self> {
        let timezone = config.timezone.parse::<Tz>().map_err(|_| {
            ChargeDeckError::validation(
                "timezone",
                format!("Unknown timezone '{}'", config.timezone),
            )
        })?;
        Ok(Self {
            currency: CurrencyFormat {
                code: config.currency_code.clone(),
                symbol: config.currency_symbol.clone(),
                symbol_first: config.symbol_first,
                decimals: config.decimals,
                thousands_separator: config.thousands_separator.clone(),
                decimal_separator: config.decimal_separator.clone(),
            },
            date_format: config.date_format.parse()?,
            timezone,
        })
    }

    /// Render an amount in this locale
    pub fn amount(&self, amount: f64) -> String {
        self.currency.format_amount(amount)
    }

    /// Render an instant in this locale
    pub fn date(&self, instant: DateTime<Utc>) -> String {
        preview_date(instant, self.date_format, self.timezone)
    }

    /// Previews of the sample amount and the given instant
    pub fn preview(&self, instant: DateTime<Utc>) -> LocalePreview {
        LocalePreview {
            date_format: self.date_format.pattern().to_string(),
            timezone: self.timezone.name().to_string(),
            date: self.date(instant),
            currency: self.amount(Self::PREVIEW_AMOUNT),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ugx() -> CurrencyFormat {
        CurrencyFormat {
            code: "UGX".into(),
            symbol: "UGX".into(),
            symbol_first: true,
            decimals: 0,
            thousands_separator: ",".into(),
            decimal_separator: ".".into(),
        }
    }

    #[test]
    fn hms_pads_and_overflows_hours() {
        assert_eq!(format_hms(0), "00:00:00");
        assert_eq!(format_hms(3_725), "01:02:05");
        assert_eq!(format_hms(360_000), "100:00:00");
    }

    #[test]
    fn amounts_group_thousands() {
        assert_eq!(ugx().format_amount(1_234_567.8), "UGX 1,234,568");
        assert_eq!(ugx().format_amount(999.0), "UGX 999");
        assert_eq!(ugx().format_amount(-1500.0), "-UGX 1,500");
    }

    #[test]
    fn euro_style_amounts() {
        let eur = CurrencyFormat {
            code: "EUR".into(),
            symbol: "€".into(),
            symbol_first: false,
            decimals: 2,
            thousands_separator: ".".into(),
            decimal_separator: ",".into(),
        };
        assert_eq!(eur.format_amount(1234.5), "1.234,50 €");
        assert_eq!(eur.format_amount(0.25), "0,25 €");
    }

    #[test]
    fn date_patterns_follow_timezone() {
        let instant = Utc.with_ymd_and_hms(2026, 12, 31, 22, 30, 0).unwrap();
        let kampala: Tz = "Africa/Kampala".parse().unwrap();
        assert_eq!(
            preview_date(instant, DateFormat::DayMonthYear, kampala),
            "01/01/2027 01:30"
        );
        assert_eq!(
            preview_date(instant, DateFormat::Iso, chrono_tz::UTC),
            "2026-12-31 22:30"
        );
        assert_eq!(
            preview_date(instant, DateFormat::MonthDayYear, chrono_tz::UTC),
            "12/31/2026 22:30"
        );
    }

    #[test]
    fn date_format_parse_rejects_unknown() {
        assert_eq!(
            "dd/mm/yyyy".parse::<DateFormat>().unwrap(),
            DateFormat::DayMonthYear
        );
        assert!("YYYY/DD/MM".parse::<DateFormat>().is_err());
    }

    #[test]
    fn locale_preview_from_default_config() {
        let settings = LocaleSettings::from_config(&LocaleConfig::default()).unwrap();
        let instant = Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap();
        let preview = settings.preview(instant);
        assert_eq!(preview.currency, "UGX 1,234,568");
        assert_eq!(preview.date, "15/10/2026 12:00");
        assert_eq!(preview.timezone, "Africa/Kampala");
    }
}
