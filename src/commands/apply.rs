// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::engine::{AnnotatedTable, ApplyMode, Categorization, Categorizer};
use crate::fields::Table;
use crate::settings::Settings;
use crate::store::Session;
use crate::utils::pretty_table;

pub fn handle(session: &Session, settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    let input = m.get_one::<String>("input").unwrap().trim();
    let out = m.get_one::<String>("out").unwrap().trim();
    let preview = m.get_one::<usize>("preview").copied().unwrap_or(20);
    let mode = settings.resolve_mode(m.get_one::<String>("mode").map(String::as_str))?;

    let table = Table::from_path(input).with_context(|| format!("Load table {}", input))?;
    let store = session.store();
    if store.is_empty() {
        println!("No rules defined; every row stays Uncategorized");
    }
    let dates = settings.date_parser();
    let result = Categorizer::new(store, &dates).run(&table, mode);

    match &result {
        Categorization::Latest(annotated) => {
            let s = annotated.summary();
            info!(
                mode = %mode,
                total = s.total,
                categorized = s.categorized,
                errors = s.errors,
                "applied latest rule"
            );
            if let Some(rule) = store.latest() {
                println!("Applied rule {}: {}", store.len(), rule);
            }
            println!(
                "{} rows: {} categorized, {} uncategorized, {} errors",
                s.total, s.categorized, s.uncategorized, s.errors
            );
            print_preview(annotated, preview);
        }
        Categorization::PerRule(outputs) => {
            info!(mode = %mode, rules = outputs.len(), "applied rules independently");
            for o in outputs {
                println!(
                    "Rule {} output, category {}: {} row(s)",
                    o.position,
                    o.category,
                    o.table.len()
                );
                print_preview(&o.table, preview);
            }
        }
    }

    let written = result
        .export(Path::new(out))
        .with_context(|| format!("Write output to {}", out))?;
    for path in &written {
        println!("Wrote {}", path.display());
    }
    if mode == ApplyMode::PerRule && written.is_empty() {
        println!("No rules, nothing written");
    }
    Ok(())
}

fn print_preview(table: &AnnotatedTable, limit: usize) {
    if table.is_empty() || limit == 0 {
        return;
    }
    let headers = table.output_headers();
    let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
    let rows: Vec<Vec<String>> = table.output_rows().into_iter().take(limit).collect();
    println!("{}", pretty_table(&header_refs, rows));
    if table.len() > limit {
        println!("… {} more row(s)", table.len() - limit);
    }
}
