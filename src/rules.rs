// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Building rules from raw user input.
//!
//! Drafts hold exactly what the user typed; [`RuleDraft::build`] and
//! [`SupplierAmountDraft::build`] turn them into a [`Rule`] or say why not.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::error::RuleError;
use crate::fields::{Table, coerce_amount};
use crate::models::{Category, Condition, Logic, Rule};

/// Which field a condition reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSelector {
    Supplier,
    Amount,
    Description,
    Date(String),
}

impl FromStr for FieldSelector {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_lowercase().as_str() {
            "supplier" => return Ok(FieldSelector::Supplier),
            "amount" => return Ok(FieldSelector::Amount),
            "description" => return Ok(FieldSelector::Description),
            _ => {}
        }
        match s.split_once(':') {
            Some((prefix, column))
                if prefix.eq_ignore_ascii_case("date") && !column.trim().is_empty() =>
            {
                Ok(FieldSelector::Date(column.trim().to_string()))
            }
            _ => Err(s.to_string()),
        }
    }
}

/// Raw inputs for one condition. Only the inputs relevant to `field` are read.
#[derive(Debug, Clone, Default)]
pub struct ConditionDraft {
    pub field: Option<String>,
    pub value: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl ConditionDraft {
    fn build(&self, position: u8, table: Option<&Table>) -> Result<Condition, RuleError> {
        let field = non_empty(&self.field)
            .filter(|f| *f != "--Select--")
            .ok_or(RuleError::FieldNotSelected(position))?;
        let selector = field
            .parse::<FieldSelector>()
            .map_err(|field| RuleError::UnknownField { position, field })?;
        match selector {
            FieldSelector::Supplier => {
                let value = required(&self.value, position, "supplier value")?;
                Ok(Condition::supplier(value))
            }
            FieldSelector::Amount => {
                let min = amount_input(&self.min, position, "minimum amount")?;
                let max = amount_input(&self.max, position, "maximum amount")?;
                Condition::amount(min, max)
            }
            FieldSelector::Description => {
                let keyword = required(&self.value, position, "description keyword")?;
                Ok(Condition::description(keyword))
            }
            FieldSelector::Date(column) => {
                if let Some(t) = table {
                    if !t.has_column(&column) {
                        return Err(RuleError::UnknownDateColumn(column));
                    }
                }
                let start = date_input(&self.start, position, "start date")?;
                let end = date_input(&self.end, position, "end date")?;
                Condition::date(column, start, end)
            }
        }
    }
}

/// A general two-field rule as entered by the user.
#[derive(Debug, Clone)]
pub struct RuleDraft {
    pub first: ConditionDraft,
    pub second: ConditionDraft,
    pub logic: Logic,
    pub category: Option<String>,
}

impl RuleDraft {
    /// Validate the draft. When `table` is given, date columns must exist in it.
    pub fn build(&self, table: Option<&Table>) -> Result<Rule, RuleError> {
        let first = self.first.build(1, table)?;
        let second = self.second.build(2, table)?;
        let category = Category::parse(self.category.as_deref().unwrap_or(""))?;
        Rule::general(first, second, self.logic, category)
    }
}

/// The specialised supplier + amount-range rule as entered by the user.
#[derive(Debug, Clone)]
pub struct SupplierAmountDraft {
    pub supplier: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub logic: Logic,
    pub category: Option<String>,
}

impl SupplierAmountDraft {
    pub fn build(&self) -> Result<Rule, RuleError> {
        let supplier = required(&self.supplier, 1, "supplier value")?;
        let min = amount_input(&self.min, 2, "minimum amount")?;
        let max = amount_input(&self.max, 2, "maximum amount")?;
        let category = Category::parse(self.category.as_deref().unwrap_or(""))?;
        Rule::supplier_amount(supplier, min, max, self.logic, category)
    }
}

fn non_empty(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn required<'a>(
    v: &'a Option<String>,
    position: u8,
    input: &'static str,
) -> Result<&'a str, RuleError> {
    non_empty(v)
        .filter(|s| *s != "--Select--")
        .ok_or(RuleError::MissingInput { position, input })
}

fn amount_input(
    v: &Option<String>,
    position: u8,
    input: &'static str,
) -> Result<Decimal, RuleError> {
    let raw = required(v, position, input)?;
    coerce_amount(raw).map_err(|_| RuleError::InvalidAmount {
        position,
        value: raw.to_string(),
    })
}

fn date_input(
    v: &Option<String>,
    position: u8,
    input: &'static str,
) -> Result<NaiveDate, RuleError> {
    let raw = required(v, position, input)?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| RuleError::InvalidDate {
        position,
        value: raw.to_string(),
    })
}
