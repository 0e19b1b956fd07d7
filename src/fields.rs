// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use rust_decimal::Decimal;

use crate::error::{EvalError, FieldError, TableError};

pub const SUPPLIER: &str = "Supplier";
pub const AMOUNT: &str = "Amount";
pub const DESCRIPTION: &str = "Description";

pub const DEFAULT_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m/%d/%Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%b %d, %Y",
    "%Y%m%d",
];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Turns date cells into calendar dates using an ordered list of formats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateParser {
    formats: Vec<String>,
}

impl Default for DateParser {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect())
    }
}

impl DateParser {
    pub fn new(formats: Vec<String>) -> Self {
        Self { formats }
    }

    pub fn formats(&self) -> &[String] {
        &self.formats
    }

    pub fn parse(&self, raw: &str) -> Result<NaiveDate, FieldError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(FieldError::UnparsableDate(s.to_string()));
        }
        for fmt in &self.formats {
            if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
                return Ok(d);
            }
        }
        for fmt in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(dt.date());
            }
        }
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.date_naive())
            .map_err(|_| FieldError::UnparsableDate(s.to_string()))
    }
}

/// Parse a cell as a number, accepting plain and scientific notation.
pub fn coerce_amount(raw: &str) -> Result<Decimal, FieldError> {
    let s = raw.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|_| FieldError::NotNumeric(s.to_string()))
}

/// An in-memory transaction table: a header row plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let path = path.as_ref();
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|source| TableError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Self::read_all(rdr)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        Self::read_all(rdr)
    }

    fn read_all<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, TableError> {
        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(TableError::NoHeader);
        }
        let mut rows = Vec::new();
        for rec in rdr.records() {
            let rec = rec?;
            rows.push(rec.iter().map(|c| c.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        self.rows.iter().enumerate().map(|(index, values)| Row {
            index,
            headers: &self.headers,
            values,
        })
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        self.rows.get(index).map(|values| Row {
            index,
            headers: &self.headers,
            values,
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        column_index(&self.headers, name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Columns whose name mentions "date", or whose every non-empty cell
    /// parses as a date. Bare digit runs never count as dates here, so
    /// reference numbers are not mistaken for `%Y%m%d`.
    pub fn date_columns(&self, dates: &DateParser) -> Vec<String> {
        self.headers
            .iter()
            .enumerate()
            .filter(|(idx, name)| {
                if name.to_lowercase().contains("date") {
                    return true;
                }
                let mut cells = self
                    .rows
                    .iter()
                    .filter_map(|r| r.get(*idx))
                    .map(|c| c.trim())
                    .filter(|c| !c.is_empty())
                    .peekable();
                cells.peek().is_some()
                    && cells.all(|c| {
                        !c.chars().all(|ch| ch.is_ascii_digit()) && dates.parse(c).is_ok()
                    })
            })
            .map(|(_, name)| name.clone())
            .collect()
    }

    /// Sorted, de-duplicated, non-empty values of a column.
    pub fn distinct_values(&self, column: &str) -> Vec<String> {
        let Some(idx) = self.column_index(column) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.get(idx))
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name).or_else(|| {
        let wanted = name.trim();
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(wanted))
    })
}

/// Borrowed view of one table row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    index: usize,
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> Row<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn values(&self) -> &'a [String] {
        self.values
    }

    /// Raw cell for a column; `None` when the column or the cell is absent.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        column_index(self.headers, column)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
    }

    pub fn supplier(&self) -> String {
        self.text(SUPPLIER)
    }

    pub fn description(&self) -> String {
        self.text(DESCRIPTION)
    }

    pub fn amount(&self) -> Result<Decimal, FieldError> {
        let raw = self
            .get(AMOUNT)
            .ok_or_else(|| FieldError::Missing(AMOUNT.to_string()))?;
        coerce_amount(raw)
    }

    pub fn date(&self, column: &str, dates: &DateParser) -> Result<NaiveDate, FieldError> {
        let raw = self
            .get(column)
            .ok_or_else(|| FieldError::Missing(column.to_string()))?;
        dates.parse(raw)
    }

    /// Rows with more cells than the header cannot be mapped to columns.
    pub fn check_shape(&self) -> Result<(), EvalError> {
        if self.values.len() > self.headers.len() {
            return Err(EvalError::RaggedRow {
                row: self.index + 1,
                expected: self.headers.len(),
                found: self.values.len(),
            });
        }
        Ok(())
    }

    fn text(&self, column: &str) -> String {
        self.get(column).map(|s| s.trim().to_string()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn text_fields_are_trimmed_and_default_to_empty() {
        let t = table("Supplier,Amount\n  Acme Ltd ,10\n");
        let row = t.row(0).unwrap();
        assert_eq!(row.supplier(), "Acme Ltd");
        assert_eq!(row.description(), "");
    }

    #[test]
    fn amount_coercion_failures_are_values_not_panics() {
        let t = table("Supplier,Amount\nA, 1250.50 \nB,abc\nC,\nD,1.5e2\n");
        assert_eq!(t.row(0).unwrap().amount(), Ok(Decimal::new(125050, 2)));
        assert_eq!(
            t.row(1).unwrap().amount(),
            Err(FieldError::NotNumeric("abc".into()))
        );
        assert!(t.row(2).unwrap().amount().is_err());
        assert_eq!(t.row(3).unwrap().amount(), Ok(Decimal::from(150)));

        let no_amount = table("Supplier\nA\n");
        assert_eq!(
            no_amount.row(0).unwrap().amount(),
            Err(FieldError::Missing("Amount".into()))
        );
    }

    #[test]
    fn column_lookup_falls_back_to_case_insensitive() {
        let t = table("supplier , AMOUNT\nAcme,5\n");
        let row = t.row(0).unwrap();
        assert_eq!(row.supplier(), "Acme");
        assert_eq!(row.amount(), Ok(Decimal::from(5)));
    }

    #[test]
    fn date_parser_accepts_common_layouts() {
        let p = DateParser::default();
        let want = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        for raw in [
            "2024-03-05",
            "2024/03/05",
            "03-05-2024",
            "03/05/2024",
            "05 Mar 2024",
            "2024-03-05 10:15:00",
            "2024-03-05T10:15:00+05:30",
        ] {
            assert_eq!(p.parse(raw), Ok(want), "{raw}");
        }
        assert_eq!(p.parse("05-03-2024"), Ok(NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()));
        assert_eq!(p.parse("25-03-2024"), Ok(NaiveDate::from_ymd_opt(2024, 3, 25).unwrap()));
        assert!(p.parse("next tuesday").is_err());
        assert!(p.parse("").is_err());
    }

    #[test]
    fn short_rows_read_as_missing_cells() {
        let t = table("Supplier,Amount,Description\nAcme\n");
        let row = t.row(0).unwrap();
        assert!(row.check_shape().is_ok());
        assert!(row.amount().is_err());
        assert_eq!(row.description(), "");
    }

    #[test]
    fn wide_rows_fail_the_shape_check() {
        let t = table("Supplier,Amount\nAcme,5,extra\n");
        let err = t.row(0).unwrap().check_shape().unwrap_err();
        assert_eq!(
            err,
            EvalError::RaggedRow {
                row: 1,
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn detects_date_columns_by_name_and_content() {
        let t = table(
            "Invoice Date,Posted,Supplier,Amount\n2024-01-02,2024-01-05,Acme,5\n,2024-02-01,Beta,7\n",
        );
        let cols = t.date_columns(&DateParser::default());
        assert_eq!(cols, vec!["Invoice Date".to_string(), "Posted".to_string()]);
    }

    #[test]
    fn numeric_reference_columns_are_not_dates() {
        let t = table("Ref,Posted
20240105,2024-01-05
20231231,2023-12-31
");
        assert_eq!(t.date_columns(&DateParser::default()), vec!["Posted".to_string()]);
        assert!(DateParser::default().parse("20240105").is_ok());
    }

    #[test]
    fn distinct_values_are_sorted_and_unique() {
        let t = table("Supplier\nBeta\nAcme\n\nBeta\n");
        assert_eq!(t.distinct_values("Supplier"), vec!["Acme", "Beta"]);
        assert!(t.distinct_values("Nope").is_empty());
    }
}
