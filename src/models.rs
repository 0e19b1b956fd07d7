// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RuleError;

/// Label given to rows no rule claimed.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// `Rule_Applied` value for rows no rule claimed.
pub const NO_RULE: &str = "None";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Category {
    Stationery,
    Consulting,
    Training,
    Maintenance,
    Insurance,
    Miscellaneous,
    Travel,
    OfficeSupplies,
    Utilities,
    Marketing,
    ItServices,
    /// Any other label. Never holds the text of a standard label.
    Custom(String),
}

impl Category {
    pub const STANDARD: [Category; 11] = [
        Category::Stationery,
        Category::Consulting,
        Category::Training,
        Category::Maintenance,
        Category::Insurance,
        Category::Miscellaneous,
        Category::Travel,
        Category::OfficeSupplies,
        Category::Utilities,
        Category::Marketing,
        Category::ItServices,
    ];

    pub fn label(&self) -> &str {
        match self {
            Category::Stationery => "Stationery",
            Category::Consulting => "Consulting",
            Category::Training => "Training",
            Category::Maintenance => "Maintenance",
            Category::Insurance => "Insurance",
            Category::Miscellaneous => "Miscellaneous",
            Category::Travel => "Travel",
            Category::OfficeSupplies => "Office Supplies",
            Category::Utilities => "Utilities",
            Category::Marketing => "Marketing",
            Category::ItServices => "IT Services",
            Category::Custom(s) => s,
        }
    }

    pub fn is_standard(&self) -> bool {
        !matches!(self, Category::Custom(_))
    }

    /// Fold a custom label that spells a standard one onto that variant.
    pub fn canonical(self) -> Self {
        match self {
            Category::Custom(s) => Self::STANDARD
                .iter()
                .find(|c| c.label().eq_ignore_ascii_case(s.trim()))
                .cloned()
                .unwrap_or(Category::Custom(s)),
            other => other,
        }
    }

    /// Parse a user selection. Standard labels match case-insensitively;
    /// anything else becomes a custom label.
    pub fn parse(input: &str) -> Result<Self, RuleError> {
        let s = input.trim();
        if s.is_empty() || s == "--Select--" {
            return Err(RuleError::CategoryNotSelected);
        }
        if s.eq_ignore_ascii_case(UNCATEGORIZED) {
            return Err(RuleError::ReservedCategory);
        }
        Ok(Self::STANDARD
            .iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .cloned()
            .unwrap_or_else(|| Category::Custom(s.to_string())))
    }
}

impl From<String> for Category {
    fn from(s: String) -> Self {
        Category::Custom(s).canonical()
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        match c {
            Category::Custom(s) => s,
            other => other.label().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Logic {
    And,
    Or,
}

impl Logic {
    pub fn combine(self, first: bool, second: bool) -> bool {
        match self {
            Logic::And => first && second,
            Logic::Or => first || second,
        }
    }
}

impl FromStr for Logic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "and" => Ok(Logic::And),
            "or" => Ok(Logic::Or),
            other => Err(format!("Unknown logic '{other}' (use AND or OR)")),
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Logic::And => f.write_str("AND"),
            Logic::Or => f.write_str("OR"),
        }
    }
}

/// One typed predicate over a single field of a row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field")]
pub enum Condition {
    #[serde(rename = "supplier")]
    SupplierEquals { value: String },
    #[serde(rename = "amount")]
    AmountBetween { min: Decimal, max: Decimal },
    #[serde(rename = "description")]
    DescriptionContains { keyword: String },
    #[serde(rename = "date")]
    DateBetween {
        column: String,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl Condition {
    pub fn supplier(value: impl Into<String>) -> Self {
        let value: String = value.into();
        Condition::SupplierEquals {
            value: value.trim().to_string(),
        }
    }

    pub fn amount(min: Decimal, max: Decimal) -> Result<Self, RuleError> {
        if min > max {
            return Err(RuleError::InvertedAmountRange { min, max });
        }
        Ok(Condition::AmountBetween { min, max })
    }

    pub fn description(keyword: impl Into<String>) -> Self {
        Condition::DescriptionContains {
            keyword: keyword.into(),
        }
    }

    pub fn date(
        column: impl Into<String>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Self, RuleError> {
        if start > end {
            return Err(RuleError::InvertedDateRange { start, end });
        }
        Ok(Condition::DateBetween {
            column: column.into(),
            start,
            end,
        })
    }

    /// Name of the field this condition reads, as shown in `Rule_Applied`.
    pub fn label(&self) -> &str {
        match self {
            Condition::SupplierEquals { .. } => "Supplier",
            Condition::AmountBetween { .. } => "Amount",
            Condition::DescriptionContains { .. } => "Description",
            Condition::DateBetween { column, .. } => column,
        }
    }

    /// Re-check the construction invariants, for conditions that arrived
    /// through deserialization.
    pub fn validate(&self) -> Result<(), RuleError> {
        match self {
            Condition::AmountBetween { min, max } if min > max => {
                Err(RuleError::InvertedAmountRange {
                    min: *min,
                    max: *max,
                })
            }
            Condition::DateBetween { start, end, .. } if start > end => {
                Err(RuleError::InvertedDateRange {
                    start: *start,
                    end: *end,
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::SupplierEquals { value } => write!(f, "Supplier = '{value}'"),
            Condition::AmountBetween { min, max } => {
                write!(f, "Amount between {min} - {max}")
            }
            Condition::DescriptionContains { keyword } => {
                write!(f, "Description contains '{keyword}'")
            }
            Condition::DateBetween { column, start, end } => {
                write!(f, "{column} between {start} - {end}")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RuleKind {
    /// Any two fields.
    General,
    /// Supplier equality followed by an amount range.
    SupplierAmount,
}

/// Two conditions, how to combine them, and the label they assign.
///
/// Rules are built through [`Rule::general`] or [`Rule::supplier_amount`]
/// and never change once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    kind: RuleKind,
    first: Condition,
    second: Condition,
    logic: Logic,
    category: Category,
}

impl Rule {
    pub fn general(
        first: Condition,
        second: Condition,
        logic: Logic,
        category: Category,
    ) -> Result<Self, RuleError> {
        let rule = Rule {
            kind: RuleKind::General,
            first,
            second,
            logic,
            category: category.canonical(),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn supplier_amount(
        supplier: impl Into<String>,
        min: Decimal,
        max: Decimal,
        logic: Logic,
        category: Category,
    ) -> Result<Self, RuleError> {
        let rule = Rule {
            kind: RuleKind::SupplierAmount,
            first: Condition::supplier(supplier),
            second: Condition::amount(min, max)?,
            logic,
            category: category.canonical(),
        };
        rule.validate()?;
        Ok(rule)
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        self.first.validate()?;
        self.second.validate()?;
        if let Category::Custom(label) = &self.category {
            if label.trim().is_empty() {
                return Err(RuleError::CategoryNotSelected);
            }
            if label.trim().eq_ignore_ascii_case(UNCATEGORIZED) {
                return Err(RuleError::ReservedCategory);
            }
        }
        if self.kind == RuleKind::SupplierAmount {
            let shaped = matches!(self.first, Condition::SupplierEquals { .. })
                && matches!(self.second, Condition::AmountBetween { .. });
            if !shaped {
                return Err(RuleError::WrongShape);
            }
            if !self.category.is_standard() {
                return Err(RuleError::UnknownCategory(self.category.to_string()));
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn first(&self) -> &Condition {
        &self.first
    }

    pub fn second(&self) -> &Condition {
        &self.second
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    /// `"<field1> AND <field2>"` style summary written to `Rule_Applied`.
    pub fn applied_label(&self) -> String {
        format!("{} {} {}", self.first.label(), self.logic, self.second.label())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "If {} {} {} → {}",
            self.first, self.logic, self.second, self.category
        )
    }
}
