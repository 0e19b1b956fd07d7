// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::TableError;
use crate::fields::{DateParser, Row, Table};
use crate::models::{NO_RULE, Rule, UNCATEGORIZED};
use crate::store::RuleStore;

pub const CATEGORY_COLUMN: &str = "Category";
pub const RULE_APPLIED_COLUMN: &str = "Rule_Applied";

/// How stored rules combine when a table is categorized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplyMode {
    /// Only the most recently added rule labels the table.
    Latest,
    /// Every rule runs on its own and yields its own filtered table.
    PerRule,
}

impl FromStr for ApplyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "latest" => Ok(ApplyMode::Latest),
            "per-rule" | "per_rule" => Ok(ApplyMode::PerRule),
            other => Err(format!("Unknown mode '{other}' (use latest|per-rule)")),
        }
    }
}

impl fmt::Display for ApplyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyMode::Latest => f.write_str("latest"),
            ApplyMode::PerRule => f.write_str("per-rule"),
        }
    }
}

/// Derived columns for one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub category: String,
    pub rule_applied: String,
    #[serde(skip)]
    pub failed: bool,
}

impl Annotation {
    fn uncategorized() -> Self {
        Self {
            category: UNCATEGORIZED.to_string(),
            rule_applied: NO_RULE.to_string(),
            failed: false,
        }
    }

    pub fn is_categorized(&self) -> bool {
        self.category != UNCATEGORIZED
    }
}

/// Label one row with one rule. Never fails: row-level errors become an
/// `Error: ...` annotation.
pub fn annotate(rule: &Rule, row: &Row<'_>, dates: &DateParser) -> Annotation {
    match rule.evaluate(row, dates) {
        Ok(verdict) => {
            debug!(
                row = row.index() + 1,
                first = verdict.first,
                second = verdict.second,
                matched = verdict.matched,
                "evaluated rule"
            );
            if verdict.matched {
                Annotation {
                    category: rule.category().to_string(),
                    rule_applied: rule.applied_label(),
                    failed: false,
                }
            } else {
                Annotation::uncategorized()
            }
        }
        Err(e) => {
            warn!(row = row.index() + 1, error = %e, "row could not be evaluated");
            Annotation {
                category: UNCATEGORIZED.to_string(),
                rule_applied: format!("Error: {e}"),
                failed: true,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub categorized: usize,
    pub uncategorized: usize,
    pub errors: usize,
}

/// A source table with `Category` and `Rule_Applied` attached to each row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatedTable {
    headers: Vec<String>,
    rows: Vec<(Vec<String>, Annotation)>,
}

impl AnnotatedTable {
    fn new(table: &Table) -> Self {
        Self {
            headers: table.headers().to_vec(),
            rows: Vec::with_capacity(table.len()),
        }
    }

    fn push(&mut self, row: &Row<'_>, annotation: Annotation) {
        self.rows.push((row.values().to_vec(), annotation));
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn annotations(&self) -> impl Iterator<Item = &Annotation> + '_ {
        self.rows.iter().map(|(_, a)| a)
    }

    pub fn summary(&self) -> Summary {
        let mut s = Summary {
            total: self.rows.len(),
            ..Summary::default()
        };
        for (_, a) in &self.rows {
            if a.failed {
                s.errors += 1;
            }
            if a.is_categorized() {
                s.categorized += 1;
            } else {
                s.uncategorized += 1;
            }
        }
        s
    }

    /// Output header: source columns (minus any stale derived columns) then
    /// `Category` and `Rule_Applied`.
    pub fn output_headers(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .headers
            .iter()
            .filter(|h| !is_derived(h))
            .cloned()
            .collect();
        out.push(CATEGORY_COLUMN.to_string());
        out.push(RULE_APPLIED_COLUMN.to_string());
        out
    }

    pub fn output_rows(&self) -> Vec<Vec<String>> {
        let keep: Vec<usize> = (0..self.headers.len())
            .filter(|&i| !is_derived(&self.headers[i]))
            .collect();
        self.rows
            .iter()
            .map(|(values, a)| {
                let mut out: Vec<String> = keep
                    .iter()
                    .map(|&i| values.get(i).cloned().unwrap_or_default())
                    .collect();
                out.push(a.category.clone());
                out.push(a.rule_applied.clone());
                out
            })
            .collect()
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), TableError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.output_headers())?;
        for row in self.output_rows() {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<(), TableError> {
        let file = std::fs::File::create(path)?;
        self.write_csv(file)
    }
}

fn is_derived(header: &str) -> bool {
    header == CATEGORY_COLUMN || header == RULE_APPLIED_COLUMN
}

/// Filtered result of one rule in per-rule mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleOutput {
    /// One-based store position.
    pub position: usize,
    pub category: String,
    pub table: AnnotatedTable,
}

impl RuleOutput {
    pub fn file_name(&self) -> String {
        format!("rule_{}_output.csv", self.position)
    }
}

/// Result of an apply pass in either mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Categorization {
    Latest(AnnotatedTable),
    PerRule(Vec<RuleOutput>),
}

impl Categorization {
    /// Write results: a single CSV file for `Latest`, one CSV per rule inside
    /// the directory `out` for `PerRule`. Returns the files written.
    pub fn export(&self, out: &Path) -> Result<Vec<PathBuf>, TableError> {
        match self {
            Categorization::Latest(table) => {
                if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                table.write_csv_path(out)?;
                Ok(vec![out.to_path_buf()])
            }
            Categorization::PerRule(outputs) => {
                std::fs::create_dir_all(out)?;
                clear_rule_outputs(out)?;
                let mut written = Vec::with_capacity(outputs.len());
                for o in outputs {
                    let path = out.join(o.file_name());
                    o.table.write_csv_path(&path)?;
                    written.push(path);
                }
                Ok(written)
            }
        }
    }
}

fn is_rule_output(name: &str) -> bool {
    name.strip_prefix("rule_")
        .and_then(|rest| rest.strip_suffix("_output.csv"))
        .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
}

/// Remove per-rule files left in `dir` by an earlier pass.
fn clear_rule_outputs(dir: &Path) -> Result<(), TableError> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let stale = entry.file_name().to_str().is_some_and(is_rule_output);
        if stale && entry.file_type()?.is_file() {
            debug!(path = %entry.path().display(), "removing stale rule output");
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Applies a rule store to transaction tables.
pub struct Categorizer<'a> {
    store: &'a RuleStore,
    dates: &'a DateParser,
}

impl<'a> Categorizer<'a> {
    pub fn new(store: &'a RuleStore, dates: &'a DateParser) -> Self {
        Self { store, dates }
    }

    pub fn run(&self, table: &Table, mode: ApplyMode) -> Categorization {
        match mode {
            ApplyMode::Latest => Categorization::Latest(self.latest(table)),
            ApplyMode::PerRule => Categorization::PerRule(self.per_rule(table)),
        }
    }

    /// Label every row using only the last rule in the store. With no rules,
    /// every row is uncategorized.
    pub fn latest(&self, table: &Table) -> AnnotatedTable {
        let mut out = AnnotatedTable::new(table);
        for row in table.rows() {
            let annotation = match self.store.latest() {
                Some(rule) => annotate(rule, &row, self.dates),
                None => Annotation::uncategorized(),
            };
            out.push(&row, annotation);
        }
        out
    }

    /// Run each rule over the whole table and keep only the rows it claimed.
    pub fn per_rule(&self, table: &Table) -> Vec<RuleOutput> {
        self.store
            .rules()
            .iter()
            .enumerate()
            .map(|(idx, rule)| {
                let category = rule.category().to_string();
                let mut out = AnnotatedTable::new(table);
                for row in table.rows() {
                    let annotation = annotate(rule, &row, self.dates);
                    if annotation.category == category {
                        out.push(&row, annotation);
                    }
                }
                debug!(rule = idx + 1, rows = out.len(), "per-rule output");
                RuleOutput {
                    position: idx + 1,
                    category,
                    table: out,
                }
            })
            .collect()
    }
}
