// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// A cell that could not be read as the requested type.
///
/// These never reach the user: the condition evaluator turns them into a
/// plain "does not match".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("column '{0}' is missing")]
    Missing(String),
    #[error("'{0}' is not a number")]
    NotNumeric(String),
    #[error("'{0}' is not a recognised date")]
    UnparsableDate(String),
}

/// Unexpected failure while matching a single row.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("row {row} has {found} cells but the header has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("amount range {min}..={max} is inverted")]
    InvertedAmountRange { min: Decimal, max: Decimal },
    #[error("date range {start}..={end} is inverted")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
}

/// Reasons a rule is refused before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    #[error("condition {0}: no field selected")]
    FieldNotSelected(u8),
    #[error("condition {position}: unknown field '{field}' (use supplier, amount, description or date:<column>)")]
    UnknownField { position: u8, field: String },
    #[error("condition {position}: {input} is required")]
    MissingInput {
        position: u8,
        input: &'static str,
    },
    #[error("condition {position}: invalid amount '{value}'")]
    InvalidAmount { position: u8, value: String },
    #[error("condition {position}: invalid date '{value}', expected YYYY-MM-DD")]
    InvalidDate { position: u8, value: String },
    #[error("minimum amount {min} is greater than maximum amount {max}")]
    InvertedAmountRange { min: Decimal, max: Decimal },
    #[error("start date {start} is after end date {end}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("date column '{0}' is not in the table")]
    UnknownDateColumn(String),
    #[error("no category selected")]
    CategoryNotSelected,
    #[error("'Uncategorized' is reserved and cannot be a rule category")]
    ReservedCategory,
    #[error("category '{0}' is not one of the standard categories")]
    UnknownCategory(String),
    #[error("a supplier-amount rule needs a supplier condition followed by an amount condition")]
    WrongShape,
}

/// Failures reading or writing the persisted rule document.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read rules from {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write rules to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("rules document is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("rules document version {0} is not supported (expected {1})")]
    UnsupportedVersion(u32, u32),
    #[error("rule {position} in the document is invalid: {source}")]
    InvalidRule { position: usize, source: RuleError },
    #[error("no rule at position {position} (store holds {len})")]
    NoSuchRule { position: usize, len: usize },
}

/// Failures loading or writing a transaction table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("failed to open {path}: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("failed to read table: {0}")]
    Csv(#[from] csv::Error),
    #[error("table has no header row")]
    NoHeader,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
