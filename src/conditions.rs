// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::EvalError;
use crate::fields::{DateParser, Row};
use crate::models::{Condition, Rule};

/// Outcome of checking both conditions of a rule against one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub first: bool,
    pub second: bool,
    pub matched: bool,
}

impl Condition {
    /// Check this condition against a row.
    ///
    /// Missing columns and cells that do not coerce to the needed type give
    /// `Ok(false)`. `Err` is reserved for rows or conditions that are broken
    /// in a way a normal non-match cannot describe.
    pub fn evaluate(&self, row: &Row<'_>, dates: &DateParser) -> Result<bool, EvalError> {
        row.check_shape()?;
        let hit = match self {
            Condition::SupplierEquals { value } => {
                row.supplier().to_lowercase() == value.trim().to_lowercase()
            }
            Condition::AmountBetween { min, max } => {
                if min > max {
                    return Err(EvalError::InvertedAmountRange {
                        min: *min,
                        max: *max,
                    });
                }
                match row.amount() {
                    Ok(amount) => *min <= amount && amount <= *max,
                    Err(_) => false,
                }
            }
            Condition::DescriptionContains { keyword } => row
                .description()
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            Condition::DateBetween { column, start, end } => {
                if start > end {
                    return Err(EvalError::InvertedDateRange {
                        start: *start,
                        end: *end,
                    });
                }
                match row.date(column, dates) {
                    Ok(date) => *start <= date && date <= *end,
                    Err(_) => false,
                }
            }
        };
        Ok(hit)
    }
}

impl Rule {
    pub fn evaluate(&self, row: &Row<'_>, dates: &DateParser) -> Result<Verdict, EvalError> {
        let first = self.first().evaluate(row, dates)?;
        let second = self.second().evaluate(row, dates)?;
        Ok(Verdict {
            first,
            second,
            matched: self.logic().combine(first, second),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::Table;
    use crate::models::{Category, Logic};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn eval(cond: &Condition, t: &Table, idx: usize) -> bool {
        cond.evaluate(&t.row(idx).unwrap(), &DateParser::default())
            .unwrap()
    }

    #[test]
    fn supplier_equality_ignores_case_and_padding() {
        let t = table("Supplier\n acme \nAcme Corp\n");
        let cond = Condition::supplier("Acme");
        assert!(eval(&cond, &t, 0));
        assert!(!eval(&cond, &t, 1));
    }

    #[test]
    fn amount_range_is_closed_and_tolerates_junk() {
        let t = table("Amount\n100\n200\n200.01\nn/a\n\n");
        let cond = Condition::amount(Decimal::from(100), Decimal::from(200)).unwrap();
        assert!(eval(&cond, &t, 0));
        assert!(eval(&cond, &t, 1));
        assert!(!eval(&cond, &t, 2));
        assert!(!eval(&cond, &t, 3));
        assert!(!eval(&cond, &t, 4));
    }

    #[test]
    fn amount_condition_is_false_without_amount_column() {
        let t = table("Supplier\nAcme\n");
        let cond = Condition::amount(Decimal::ZERO, Decimal::from(1000)).unwrap();
        assert!(!eval(&cond, &t, 0));
    }

    #[test]
    fn description_contains_is_case_insensitive() {
        let t = table("Description\nDiesel FUEL top-up\nLunch\n");
        let cond = Condition::description("fuel");
        assert!(eval(&cond, &t, 0));
        assert!(!eval(&cond, &t, 1));
    }

    #[test]
    fn empty_keyword_matches_everything() {
        let t = table("Description,Supplier\n,Acme\n");
        assert!(eval(&Condition::description(""), &t, 0));
    }

    #[test]
    fn unparsable_dates_do_not_match() {
        let t = table("Txn Date\n2024-02-10\nsoon\n2024-05-01\n");
        let cond = Condition::date("Txn Date", d(2024, 1, 1), d(2024, 3, 31)).unwrap();
        assert!(eval(&cond, &t, 0));
        assert!(!eval(&cond, &t, 1));
        assert!(!eval(&cond, &t, 2));
    }

    #[test]
    fn ambiguous_dash_dates_read_month_first() {
        let t = table("Txn Date\n05-03-2024\n25-03-2024\n");
        let may = Condition::date("Txn Date", d(2024, 5, 1), d(2024, 5, 31)).unwrap();
        let march = Condition::date("Txn Date", d(2024, 3, 1), d(2024, 3, 31)).unwrap();
        assert!(eval(&may, &t, 0));
        assert!(!eval(&march, &t, 0));
        assert!(eval(&march, &t, 1));
    }

    #[test]
    fn hand_built_inverted_range_is_an_error() {
        let t = table("Amount\n5\n");
        let cond = Condition::AmountBetween {
            min: Decimal::TEN,
            max: Decimal::ONE,
        };
        let err = cond
            .evaluate(&t.row(0).unwrap(), &DateParser::default())
            .unwrap_err();
        assert!(matches!(err, EvalError::InvertedAmountRange { .. }));
    }

    #[test]
    fn rule_verdict_combines_with_logic() {
        let t = table("Supplier,Amount\nAcme,150\nAcme,50\nBeta,150\nBeta,50\n");
        let build = |logic| {
            Rule::general(
                Condition::supplier("acme"),
                Condition::amount(Decimal::from(100), Decimal::from(200)).unwrap(),
                logic,
                Category::Travel,
            )
            .unwrap()
        };
        let and = build(Logic::And);
        let or = build(Logic::Or);
        let dates = DateParser::default();
        let and_hits: Vec<bool> = t
            .rows()
            .map(|r| and.evaluate(&r, &dates).unwrap().matched)
            .collect();
        let or_hits: Vec<bool> = t
            .rows()
            .map(|r| or.evaluate(&r, &dates).unwrap().matched)
            .collect();
        assert_eq!(and_hits, vec![true, false, false, false]);
        assert_eq!(or_hits, vec![true, true, true, false]);
    }
}
