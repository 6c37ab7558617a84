//! The ledger's date representation.
//!
//! Dates are stored in the sheet as `DD/MM/YYYY` text. Validation is purely syntactic, and parsing
//! is lenient in the way that spreadsheet and browser date primitives are: a day or month that is
//! out of range rolls over into the neighbouring month or year instead of being rejected. For
//! example `31/02/2024` parses as the 2nd of March 2024.

use chrono::{Datelike, Duration, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("date shape regex is valid"));

/// The message returned to callers when a date does not have the `DD/MM/YYYY` shape.
pub const INVALID_DATE_MESSAGE: &str = "Invalid date format. Use dd/mm/yyyy";

/// Returns true if `text` has exactly the `DD/MM/YYYY` shape. Day and month values are not
/// range-checked.
pub fn validate(text: &str) -> bool {
    DATE_SHAPE.is_match(text)
}

/// Parses `DD/MM/YYYY` text (or any `day/month/year` triple of integers) into a calendar date,
/// normalizing out-of-range day and month values. Returns `None` when the text does not split into
/// three integers or the result is outside of the representable range.
pub fn parse(text: &str) -> Option<NaiveDate> {
    let mut parts = text.trim().split('/');
    let day: i64 = parts.next()?.trim().parse().ok()?;
    let month: i64 = parts.next()?.trim().parse().ok()?;
    let year: i64 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    normalized(year, month, day)
}

/// Orders two ledger dates by calendar. Text that cannot be parsed orders before any valid date,
/// and two unparsable values are equal.
pub fn compare(a: &str, b: &str) -> Ordering {
    parse(a).cmp(&parse(b))
}

/// Builds a date the way a lenient date primitive does: months beyond 12 (or below 1) carry into
/// the year, and days beyond the end of the month (or below 1) carry into neighbouring months.
fn normalized(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    let months = year.checked_mul(12)?.checked_add(month - 1)?;
    let y = i32::try_from(months.div_euclid(12)).ok()?;
    let m = u32::try_from(months.rem_euclid(12) + 1).ok()?;
    let first = NaiveDate::from_ymd_opt(y, m, 1)?;
    first.checked_add_signed(Duration::try_days(day - 1)?)
}

/// A validated ledger date. The original text is kept so that it can be written back to the sheet
/// exactly as it was entered.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct LedgerDate {
    text: String,
    date: NaiveDate,
}

impl LedgerDate {
    /// Creates a `LedgerDate` from a calendar date, formatting it as `DD/MM/YYYY`.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self {
            text: format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year()),
            date,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

impl Ord for LedgerDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date.cmp(&other.date)
    }
}

impl PartialOrd for LedgerDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Display for LedgerDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl FromStr for LedgerDate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !validate(s) {
            anyhow::bail!("{INVALID_DATE_MESSAGE}, got '{s}'");
        }
        let date = parse(s).ok_or_else(|| anyhow::anyhow!("{INVALID_DATE_MESSAGE}, got '{s}'"))?;
        Ok(Self {
            text: s.to_string(),
            date,
        })
    }
}

impl Serialize for LedgerDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for LedgerDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        LedgerDate::from_str(&s).map_err(serde::de::Error::custom)
    }
}
