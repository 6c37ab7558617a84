//! Turns a free-text chat message into a candidate ledger row.
//!
//! Extraction is a fixed, ordered set of pattern rules. Each rule looks at the whole message and
//! either produces a value or does not; the first rule that produces a value wins. Nothing here
//! guesses beyond those rules: when a required field cannot be found the caller asks the user for
//! it instead.

use crate::model::{LedgerDate, TransactionRow, RUPEE};
use crate::Result;
use anyhow::bail;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("extraction patterns are valid")
}

static DATE: Lazy<Regex> = Lazy::new(|| regex(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b"));

const NUMBER: &str = r"(\d+(?:\.\d+)?)";

/// Amount rules in priority order.
static AMOUNT_RULES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        regex(&format!(r"₹\s*{NUMBER}")),
        regex(&format!(r"(?i)credit:\s*{NUMBER}")),
        regex(&format!(r"(?i)debit:\s*{NUMBER}")),
        regex(&format!(r"(?i)\b(?:of|with)\s+{NUMBER}")),
    ]
});

static REMARKS_LABEL: Lazy<Regex> = Lazy::new(|| regex(r"(?i)remarks:\s*([^,]+)"));
static REMARKS_FOR: Lazy<Regex> = Lazy::new(|| regex(r"(?i)\bfor\s+([^,₹]+)"));
static REMARKS_WORD_OF: Lazy<Regex> = Lazy::new(|| regex(r"(?i)\b(?:with|of)\s+(\w+)\s+of\b"));
static ON_DAY: Lazy<Regex> = Lazy::new(|| regex(r"(?i)\s+on\s+\d"));

/// Remarks rules in priority order.
const REMARKS_RULES: &[fn(&str) -> Option<String>] =
    &[remarks_label, remarks_for, remarks_word_of];

/// The remarks used when an amount was found but no remarks rule matched.
pub const FALLBACK_REMARKS: &str = "salary";

/// The coarse purpose of a chat message.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// The message asks for a new ledger entry.
    AddTransaction,
    /// Anything else. Answered by the completion service.
    Query,
}

impl Intent {
    pub fn of(message: &str) -> Self {
        let lower = message.to_lowercase();
        if ["add", "create", "new transaction"]
            .iter()
            .any(|word| lower.contains(word))
        {
            Intent::AddTransaction
        } else {
            Intent::Query
        }
    }
}

/// A required field that could not be extracted.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingField {
    Date,
    Remarks,
    Amount,
}

impl Display for MissingField {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingField::Date => f.write_str("date (in dd/mm/yyyy format)"),
            MissingField::Remarks => f.write_str("remarks"),
            MissingField::Amount => f.write_str("amount"),
        }
    }
}

/// The reply sent when required fields are missing.
pub fn missing_fields_prompt(missing: &[MissingField]) -> String {
    let lines: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
    format!(
        "To add a transaction, I need the following information:\n{}\n\nPlease provide the missing details.",
        lines.join("\n")
    )
}

/// The fields pulled out of a message. At most one of `debit` and `credit` is set. Amounts are
/// kept as the digits that appeared in the message.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Extraction {
    pub date: Option<String>,
    pub remarks: Option<String>,
    pub debit: Option<String>,
    pub credit: Option<String>,
}

impl Extraction {
    /// Runs every rule over `message`.
    pub fn from_message(message: &str) -> Self {
        let mut extraction = Extraction {
            date: extract_date(message),
            ..Default::default()
        };

        if let Some(amount) = extract_amount(message) {
            let lower = message.to_lowercase();
            if ["credit", "salary", "income"]
                .iter()
                .any(|word| lower.contains(word))
            {
                extraction.credit = Some(amount);
            } else {
                extraction.debit = Some(amount);
            }
        }

        let has_amount = extraction.has_amount();
        extraction.remarks = REMARKS_RULES
            .iter()
            .find_map(|rule| rule(message))
            .or_else(|| has_amount.then(|| FALLBACK_REMARKS.to_string()));

        extraction
    }

    fn has_amount(&self) -> bool {
        self.debit.is_some() || self.credit.is_some()
    }

    /// The required fields that are absent, in prompt order.
    pub fn missing(&self) -> Vec<MissingField> {
        let mut missing = Vec::new();
        if self.date.is_none() {
            missing.push(MissingField::Date);
        }
        if self.remarks.is_none() {
            missing.push(MissingField::Remarks);
        }
        if !self.has_amount() {
            missing.push(MissingField::Amount);
        }
        missing
    }

    /// Builds the row to append. Fails if any required field is missing.
    pub fn to_row(&self) -> Result<TransactionRow> {
        let missing = self.missing();
        if !missing.is_empty() {
            let names: Vec<String> = missing.iter().map(|m| m.to_string()).collect();
            bail!("Cannot build a ledger row, missing {}", names.join(", "));
        }
        let date = LedgerDate::from_str(self.date.as_deref().unwrap_or_default())?;
        Ok(TransactionRow::new(
            &date,
            self.remarks.clone().unwrap_or_default(),
            self.debit.clone().unwrap_or_default(),
            self.credit.clone().unwrap_or_default(),
        ))
    }

    /// The reply sent after the row has been appended.
    pub fn confirmation(&self) -> String {
        let amount = match (&self.debit, &self.credit) {
            (Some(debit), _) => format!("Debit: {RUPEE}{debit}"),
            (None, Some(credit)) => format!("Credit: {RUPEE}{credit}"),
            (None, None) => String::new(),
        };
        format!(
            "Transaction added successfully!\n\nDetails:\nDate: {}\nRemarks: {}\n{amount}",
            self.date.as_deref().unwrap_or_default(),
            self.remarks.as_deref().unwrap_or_default(),
        )
    }
}

/// The first `d/m/yyyy` date in the message, zero-padded to `DD/MM/YYYY`.
fn extract_date(message: &str) -> Option<String> {
    let caps = DATE.captures(message)?;
    Some(format!("{:0>2}/{:0>2}/{}", &caps[1], &caps[2], &caps[3]))
}

fn extract_amount(message: &str) -> Option<String> {
    AMOUNT_RULES
        .iter()
        .find_map(|rule| rule.captures(message))
        .map(|caps| caps[1].to_string())
}

fn remarks_label(message: &str) -> Option<String> {
    non_empty(&REMARKS_LABEL.captures(message)?[1])
}

/// `for <text>` up to a comma or `₹`, with a trailing date clause removed.
fn remarks_for(message: &str) -> Option<String> {
    let caps = REMARKS_FOR.captures(message)?;
    let text = &caps[1];
    let cut = [ON_DAY.find(text), DATE.find(text)]
        .into_iter()
        .flatten()
        .map(|m| m.start())
        .min()
        .unwrap_or(text.len());
    non_empty(&text[..cut])
}

fn remarks_word_of(message: &str) -> Option<String> {
    non_empty(&REMARKS_WORD_OF.captures(message)?[1])
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
