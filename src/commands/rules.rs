// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use tracing::{info, warn};

use crate::fields::Table;
use crate::models::{Logic, Rule, RuleKind};
use crate::rules::{ConditionDraft, RuleDraft, SupplierAmountDraft};
use crate::store::Session;
use crate::utils::{arg_trimmed, maybe_print_json, pretty_table};

pub fn handle(session: &mut Session, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(session, sub)?,
        Some(("add-supplier", sub)) => add_supplier(session, sub)?,
        Some(("list", sub)) => list(session, sub)?,
        Some(("rm", sub)) => {
            let raw = sub.get_one::<String>("pos").unwrap();
            let pos = raw
                .trim()
                .parse::<usize>()
                .with_context(|| format!("Invalid position '{}'", raw.trim()))?;
            let removed = session.delete_rule(pos)?;
            info!(position = pos, "rule removed");
            println!("Removed rule {}: {}", pos, removed);
            print_rules(session);
        }
        Some(("save", sub)) => {
            let out = sub.get_one::<String>("out").unwrap().trim();
            session.save_as(Path::new(out))?;
            println!(
                "Saved {} rule(s) to {}",
                session.store().len(),
                out
            );
        }
        Some(("load", sub)) => {
            let from = sub.get_one::<String>("from").unwrap().trim();
            let n = session.replace_from(Path::new(from))?;
            println!("Loaded {} rule(s) from {}", n, from);
        }
        _ => {}
    }
    Ok(())
}

fn logic(sub: &clap::ArgMatches) -> Result<Logic> {
    let raw = sub.get_one::<String>("logic").map(String::as_str).unwrap_or("AND");
    raw.parse::<Logic>().map_err(|e| anyhow!(e))
}

fn condition(sub: &clap::ArgMatches, n: u8) -> ConditionDraft {
    let arg = |name: &str| arg_trimmed(sub, &format!("{name}{n}"));
    ConditionDraft {
        field: arg("field"),
        value: arg("value"),
        min: arg("min"),
        max: arg("max"),
        start: arg("start"),
        end: arg("end"),
    }
}

fn add(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let table = match arg_trimmed(sub, "table") {
        Some(path) => Some(
            Table::from_path(&path).with_context(|| format!("Open table {}", path))?,
        ),
        None => None,
    };
    let draft = RuleDraft {
        first: condition(sub, 1),
        second: condition(sub, 2),
        logic: logic(sub)?,
        category: arg_trimmed(sub, "category"),
    };
    let rule = draft.build(table.as_ref()).map_err(reject)?;
    store(session, rule)
}

fn add_supplier(session: &mut Session, sub: &clap::ArgMatches) -> Result<()> {
    let draft = SupplierAmountDraft {
        supplier: arg_trimmed(sub, "supplier"),
        min: arg_trimmed(sub, "min"),
        max: arg_trimmed(sub, "max"),
        logic: logic(sub)?,
        category: arg_trimmed(sub, "category"),
    };
    let rule = draft.build().map_err(reject)?;
    store(session, rule)
}

fn reject(e: crate::error::RuleError) -> anyhow::Error {
    warn!(error = %e, "rule rejected");
    anyhow!("Rule rejected: {}", e)
}

fn store(session: &mut Session, rule: Rule) -> Result<()> {
    let shown = rule.to_string();
    session
        .add_rule(rule)
        .context("Rule was not stored")?;
    info!(rules = session.store().len(), "rule added");
    println!("Added rule {}: {}", session.store().len(), shown);
    Ok(())
}

#[derive(Serialize)]
struct RuleRow<'a> {
    position: usize,
    #[serde(flatten)]
    rule: &'a Rule,
}

fn list(session: &Session, sub: &clap::ArgMatches) -> Result<()> {
    let rows: Vec<RuleRow<'_>> = session
        .store()
        .rules()
        .iter()
        .enumerate()
        .map(|(i, rule)| RuleRow {
            position: i + 1,
            rule,
        })
        .collect();
    if !maybe_print_json(sub.get_flag("json"), &rows)? {
        print_rules(session);
    }
    Ok(())
}

fn print_rules(session: &Session) {
    let rules = session.store().rules();
    if rules.is_empty() {
        println!("No rules defined");
        return;
    }
    let data = rules
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                match r.kind() {
                    RuleKind::General => "general".to_string(),
                    RuleKind::SupplierAmount => "supplier-amount".to_string(),
                },
                r.first().to_string(),
                r.logic().to_string(),
                r.second().to_string(),
                r.category().to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["#", "Kind", "Condition 1", "Logic", "Condition 2", "Category"],
            data
        )
    );
}
