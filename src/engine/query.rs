//! Search, date-range filtering and ordering of ledger rows.

use crate::model::TransactionRow;
use chrono::NaiveDate;
use std::cmp::Reverse;

/// The parameters of a ledger listing.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct LedgerQuery {
    /// Free text to search for. Empty text matches every row.
    pub query: Option<String>,
    /// Inclusive lower bound. Ignored unless `to` is also given.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound. Ignored unless `from` is also given.
    pub to: Option<NaiveDate>,
}

impl LedgerQuery {
    pub fn new(query: Option<String>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { query, from, to }
    }

    /// Applies the query to `rows` and returns the selected rows. `rows` is not modified.
    ///
    /// - A non-empty query keeps rows whose remarks contain it (case-insensitively) or whose raw
    ///   date, debit or credit text contains the lower-cased query.
    /// - When both bounds are present, only rows dated within `[from, to]` are kept and the result
    ///   stays in input order. Rows without a parsable date never fall within a range.
    /// - Otherwise the rows are ordered most recent first. Equal dates keep their input order and
    ///   rows without a parsable date go last.
    pub fn apply(&self, rows: &[TransactionRow]) -> Vec<TransactionRow> {
        let mut selected: Vec<TransactionRow> = match self.needle() {
            Some(needle) => rows
                .iter()
                .filter(|row| matches_search(row, &needle))
                .cloned()
                .collect(),
            None => rows.to_vec(),
        };

        match (self.from, self.to) {
            // A range filter replaces the sort, so the rows keep their input order here.
            (Some(from), Some(to)) => {
                selected.retain(|row| {
                    row.parsed_date()
                        .is_some_and(|date| from <= date && date <= to)
                });
            }
            _ => selected.sort_by_key(|row| Reverse(row.parsed_date())),
        }
        selected
    }

    fn needle(&self) -> Option<String> {
        self.query
            .as_deref()
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

fn matches_search(row: &TransactionRow, needle: &str) -> bool {
    row.remarks().to_lowercase().contains(needle)
        || row.date().contains(needle)
        || row.debit().contains(needle)
        || row.credit().contains(needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::date;

    fn row(date: &str, remarks: &str, debit: &str, credit: &str) -> TransactionRow {
        TransactionRow::from_cells(vec![date, remarks, debit, credit, ""]).unwrap()
    }

    fn day(s: &str) -> NaiveDate {
        date::parse(s).unwrap()
    }

    #[test]
    fn test_default_sorts_descending_and_stable() {
        let rows = vec![
            row("01/01/2024", "first", "1", ""),
            row("15/01/2024", "copy one", "2", ""),
            row("15/01/2024", "copy two", "3", ""),
        ];
        let out = LedgerQuery::default().apply(&rows);
        let remarks: Vec<&str> = out.iter().map(|r| r.remarks()).collect();
        assert_eq!(remarks, vec!["copy one", "copy two", "first"]);
        // The input is untouched.
        assert_eq!(rows[0].remarks(), "first");
    }

    #[test]
    fn test_range_filters_without_sorting() {
        let rows = vec![
            row("01/01/2024", "early", "", ""),
            row("15/01/2024", "mid", "", ""),
            row("01/02/2024", "february", "", ""),
            row("31/01/2024", "late", "", ""),
        ];
        let query = LedgerQuery::new(None, Some(day("01/01/2024")), Some(day("31/01/2024")));
        let out = query.apply(&rows);
        let remarks: Vec<&str> = out.iter().map(|r| r.remarks()).collect();
        assert_eq!(remarks, vec!["early", "mid", "late"]);
    }

    #[test]
    fn test_range_example() {
        let rows = vec![row("15/01/2024", "a", "", ""), row("01/02/2024", "b", "", "")];
        let query = LedgerQuery::new(None, Some(day("01/01/2024")), Some(day("31/01/2024")));
        let out = query.apply(&rows);
        assert_eq!(out, vec![rows[0].clone()]);
    }

    #[test]
    fn test_single_bound_is_ignored() {
        let rows = vec![row("01/01/2024", "a", "", ""), row("01/03/2024", "b", "", "")];
        let query = LedgerQuery::new(None, Some(day("01/02/2024")), None);
        let out = query.apply(&rows);
        let remarks: Vec<&str> = out.iter().map(|r| r.remarks()).collect();
        assert_eq!(remarks, vec!["b", "a"]);
    }

    #[test]
    fn test_range_excludes_rows_without_dates() {
        let rows = vec![row("", "undated", "", ""), row("10/01/2024", "dated", "", "")];
        let query = LedgerQuery::new(None, Some(day("01/01/2024")), Some(day("31/01/2024")));
        let out = query.apply(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].remarks(), "dated");
    }

    #[test]
    fn test_sort_puts_unparsable_dates_last() {
        let rows = vec![
            row("garbage", "bad", "", ""),
            row("01/01/2024", "old", "", ""),
            row("", "empty", "", ""),
            row("01/06/2024", "new", "", ""),
        ];
        let out = LedgerQuery::default().apply(&rows);
        let remarks: Vec<&str> = out.iter().map(|r| r.remarks()).collect();
        assert_eq!(remarks, vec!["new", "old", "bad", "empty"]);
    }

    #[test]
    fn test_search_remarks_case_insensitive() {
        let rows = vec![
            row("01/01/2024", "Groceries at Market", "500", ""),
            row("02/01/2024", "Rent", "15000", ""),
        ];
        let query = LedgerQuery::new(Some("GROCER".to_string()), None, None);
        let out = query.apply(&rows);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].remarks(), "Groceries at Market");
    }

    #[test]
    fn test_search_raw_columns() {
        let rows = vec![
            row("01/01/2024", "a", "500", ""),
            row("02/02/2024", "b", "", "1500"),
            row("03/03/2023", "c", "20", ""),
        ];
        let by_amount = LedgerQuery::new(Some("500".to_string()), None, None).apply(&rows);
        let remarks: Vec<&str> = by_amount.iter().map(|r| r.remarks()).collect();
        assert_eq!(remarks, vec!["b", "a"]);

        let by_date = LedgerQuery::new(Some("/2023".to_string()), None, None).apply(&rows);
        assert_eq!(by_date.len(), 1);
        assert_eq!(by_date[0].remarks(), "c");
    }

    #[test]
    fn test_search_then_range() {
        let rows = vec![
            row("05/01/2024", "coffee", "100", ""),
            row("06/01/2024", "tea", "50", ""),
            row("05/02/2024", "coffee beans", "900", ""),
        ];
        let query = LedgerQuery::new(
            Some("coffee".to_string()),
            Some(day("01/01/2024")),
            Some(day("31/01/2024")),
        );
        let out = query.apply(&rows);
        assert_eq!(out, vec![rows[0].clone()]);
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let rows = vec![row("01/01/2024", "a", "", "")];
        let out = LedgerQuery::new(Some(String::new()), None, None).apply(&rows);
        assert_eq!(out, rows);
    }
}
