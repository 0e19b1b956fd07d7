// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::fields::{AMOUNT, DESCRIPTION, DateParser, SUPPLIER, Table};
use crate::models::Condition;
use crate::settings::Settings;
use crate::store::{RuleStore, Session};
use crate::utils::pretty_table;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

fn issue(kind: &'static str, detail: String) -> Issue {
    Issue { kind, detail }
}

/// Things that keep rules from matching this table, or rows that will be
/// skipped. Nothing here stops `apply` from running.
pub fn diagnose(store: &RuleStore, table: &Table, dates: &DateParser) -> Vec<Issue> {
    let mut issues = Vec::new();
    let suppliers: Vec<String> = table
        .distinct_values(SUPPLIER)
        .into_iter()
        .map(|s| s.to_lowercase())
        .collect();

    for (idx, rule) in store.rules().iter().enumerate() {
        let pos = idx + 1;
        for cond in [rule.first(), rule.second()] {
            match cond {
                Condition::SupplierEquals { value } => {
                    if !table.has_column(SUPPLIER) {
                        issues.push(issue("missing_column", format!("rule {pos}: {SUPPLIER}")));
                    } else if !suppliers.contains(&value.trim().to_lowercase()) {
                        issues.push(issue(
                            "supplier_not_in_table",
                            format!("rule {pos}: '{value}'"),
                        ));
                    }
                }
                Condition::AmountBetween { .. } if !table.has_column(AMOUNT) => {
                    issues.push(issue("missing_column", format!("rule {pos}: {AMOUNT}")));
                }
                Condition::DescriptionContains { .. } if !table.has_column(DESCRIPTION) => {
                    issues.push(issue(
                        "missing_column",
                        format!("rule {pos}: {DESCRIPTION}"),
                    ));
                }
                Condition::DateBetween { column, .. } => {
                    if !table.has_column(column) {
                        issues.push(issue("missing_column", format!("rule {pos}: {column}")));
                    } else if !table
                        .rows()
                        .any(|r| r.date(column, dates).is_ok())
                    {
                        issues.push(issue(
                            "no_parsable_dates",
                            format!("rule {pos}: {column}"),
                        ));
                    }
                }
                _ => {}
            }
        }
    }

    for row in table.rows() {
        if let Err(e) = row.check_shape() {
            issues.push(issue("ragged_row", e.to_string()));
            continue;
        }
        if let Some(raw) = row.get(AMOUNT).filter(|s| !s.trim().is_empty()) {
            if row.amount().is_err() {
                issues.push(issue(
                    "non_numeric_amount",
                    format!("row {}: '{}'", row.index() + 1, raw.trim()),
                ));
            }
        }
    }
    issues
}

pub fn handle(session: &Session, settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    let input = m.get_one::<String>("input").unwrap().trim();
    let table = Table::from_path(input).with_context(|| format!("Load table {}", input))?;
    let issues = diagnose(session.store(), &table, &settings.date_parser());
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Logic, Rule};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    #[test]
    fn flags_unmatchable_rules_and_bad_rows() {
        let table = Table::from_reader(
            "Supplier,Amount,Bill Date\nAcme,12,2024-01-01\nBeta,twelve,2024-01-02\nGamma,1,x,y\n"
                .as_bytes(),
        )
        .unwrap();
        let store = RuleStore::from_rules(vec![
            Rule::supplier_amount("Zeta", Decimal::ZERO, Decimal::TEN, Logic::And, Category::Travel)
                .unwrap(),
            Rule::general(
                Condition::description("cab"),
                Condition::date(
                    "Due Date",
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
                )
                .unwrap(),
                Logic::Or,
                Category::Travel,
            )
            .unwrap(),
        ]);
        let issues = diagnose(&store, &table, &DateParser::default());
        let kinds: Vec<&str> = issues.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                "supplier_not_in_table",
                "missing_column",
                "missing_column",
                "non_numeric_amount",
                "ragged_row",
            ]
        );
        assert_eq!(issues[3].detail, "row 2: 'twelve'");
    }

    #[test]
    fn clean_table_has_no_issues() {
        let table = Table::from_reader("Supplier,Amount\nAcme,12\n".as_bytes()).unwrap();
        let store = RuleStore::from_rules(vec![
            Rule::supplier_amount("ACME", Decimal::ZERO, Decimal::TEN, Logic::Or, Category::Travel)
                .unwrap(),
        ]);
        assert!(diagnose(&store, &table, &DateParser::default()).is_empty());
    }
}
