//! Parsing of A1-notation ranges such as `Sheet1!A4:E` or `Sheet1!F1:G3`.

use crate::Result;
use anyhow::{bail, Context};

/// One corner of a range. `row` is absent for whole-column references like `A:E`.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub(crate) struct Cell {
    /// 0-based column index.
    pub(crate) col: usize,
    /// 0-based row index.
    pub(crate) row: Option<usize>,
}

/// A parsed A1 range. An absent `end` means a single cell.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct A1Range {
    pub(crate) sheet: String,
    pub(crate) start: Cell,
    pub(crate) end: Option<Cell>,
}

impl A1Range {
    pub(crate) fn parse(range: &str) -> Result<Self> {
        let (sheet, cells) = range
            .rsplit_once('!')
            .with_context(|| format!("The range '{range}' has no sheet name"))?;
        let sheet = sheet.trim_matches('\'');
        if sheet.is_empty() {
            bail!("The range '{range}' has an empty sheet name");
        }
        let (start, end) = match cells.split_once(':') {
            Some((start, end)) => (parse_cell(start)?, Some(parse_cell(end)?)),
            None => (parse_cell(cells)?, None),
        };
        Ok(Self {
            sheet: sheet.to_string(),
            start,
            end,
        })
    }

    pub(crate) fn first_row(&self) -> usize {
        self.start.row.unwrap_or(0)
    }

    /// The last row, inclusive, or `None` when the range is open-ended.
    pub(crate) fn last_row(&self) -> Option<usize> {
        match self.end {
            Some(end) => end.row,
            None => self.start.row,
        }
    }

    /// The last column, inclusive.
    pub(crate) fn last_col(&self) -> usize {
        self.end.map(|end| end.col).unwrap_or(self.start.col)
    }
}

fn parse_cell(text: &str) -> Result<Cell> {
    let letters: String = text.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    let digits = &text[letters.len()..];
    if letters.is_empty() {
        bail!("The cell reference '{text}' has no column");
    }
    let col = letters
        .chars()
        .fold(0usize, |acc, c| {
            acc * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1)
        })
        - 1;
    let row = if digits.is_empty() {
        None
    } else {
        let number: usize = digits
            .parse()
            .with_context(|| format!("The cell reference '{text}' has a bad row number"))?;
        if number == 0 {
            bail!("Row numbers start at 1, got '{text}'");
        }
        Some(number - 1)
    };
    Ok(Cell { col, row })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open_ended_range() {
        let range = A1Range::parse("Sheet1!A4:E").unwrap();
        assert_eq!(range.sheet, "Sheet1");
        assert_eq!(range.start, Cell { col: 0, row: Some(3) });
        assert_eq!(range.end, Some(Cell { col: 4, row: None }));
        assert_eq!(range.first_row(), 3);
        assert_eq!(range.last_row(), None);
        assert_eq!(range.last_col(), 4);
    }

    #[test]
    fn test_parse_closed_range() {
        let range = A1Range::parse("'My Ledger'!F1:G3").unwrap();
        assert_eq!(range.sheet, "My Ledger");
        assert_eq!(range.start, Cell { col: 5, row: Some(0) });
        assert_eq!(range.last_row(), Some(2));
        assert_eq!(range.last_col(), 6);
    }

    #[test]
    fn test_parse_single_cell_and_wide_column() {
        let range = A1Range::parse("Sheet1!AA10").unwrap();
        assert_eq!(range.start, Cell { col: 26, row: Some(9) });
        assert_eq!(range.end, None);
        assert_eq!(range.last_row(), Some(9));
    }

    #[test]
    fn test_parse_errors() {
        assert!(A1Range::parse("A1:B2").is_err());
        assert!(A1Range::parse("Sheet1!4:5").is_err());
        assert!(A1Range::parse("Sheet1!A0").is_err());
        assert!(A1Range::parse("!A1").is_err());
    }
}
