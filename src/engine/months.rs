//! Month buckets derived from row dates, used for navigation.

use crate::model::TransactionRow;
use crate::Result;
use anyhow::{bail, Context};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A `(month, year)` pair taken verbatim from the 2nd and 3rd components of a `DD/MM/YYYY` date.
/// It renders as `MM/YYYY`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct MonthKey {
    month: String,
    year: String,
}

impl MonthKey {
    /// Derives the month bucket of a date cell. Returns `None` when the cell does not have three
    /// `/`-separated components.
    pub fn of_date(date: &str) -> Option<Self> {
        let mut parts = date.split('/');
        let _day = parts.next()?;
        let month = parts.next()?;
        let year = parts.next()?;
        if parts.next().is_some() || month.is_empty() || year.is_empty() {
            return None;
        }
        Some(Self {
            month: month.to_string(),
            year: year.to_string(),
        })
    }

    /// The first and last day of the month, or `None` if the components are not a real month.
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        let month: u32 = self.month.parse().ok()?;
        let year: i32 = self.year.parse().ok()?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some((start, next.pred_opt()?))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.bounds()
            .is_some_and(|(start, end)| start <= date && date <= end)
    }
}

impl From<NaiveDate> for MonthKey {
    fn from(date: NaiveDate) -> Self {
        Self {
            month: format!("{:02}", date.month()),
            year: format!("{:04}", date.year()),
        }
    }
}

impl Display for MonthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.month, self.year)
    }
}

impl FromStr for MonthKey {
    type Err = anyhow::Error;

    /// Parses an `MM/YYYY` token.
    fn from_str(s: &str) -> Result<Self> {
        let (month, year) = s
            .trim()
            .split_once('/')
            .with_context(|| format!("A month must look like MM/YYYY, got '{s}'"))?;
        let key = Self {
            month: month.to_string(),
            year: year.to_string(),
        };
        if key.bounds().is_none() {
            bail!("'{s}' is not a valid MM/YYYY month");
        }
        Ok(key)
    }
}

impl Serialize for MonthKey {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MonthKey {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MonthKey::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Returns the distinct months that appear in `rows`, in the order they are first seen. No
/// chronological sorting is applied. Rows with empty or malformed dates are skipped.
pub fn month_index(rows: &[TransactionRow]) -> Vec<MonthKey> {
    let mut seen = HashSet::new();
    rows.iter()
        .filter_map(|row| MonthKey::of_date(row.date()))
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// The month shown by default: the first entry of the month index, not the month of the clock.
pub fn current_month(index: &[MonthKey]) -> Option<&MonthKey> {
    index.first()
}

/// Returns the rows dated within `month`, in input order.
pub fn rows_in_month(rows: &[TransactionRow], month: &MonthKey) -> Vec<TransactionRow> {
    rows.iter()
        .filter(|row| row.parsed_date().is_some_and(|d| month.contains(d)))
        .cloned()
        .collect()
}
