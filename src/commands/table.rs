// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::fields::{SUPPLIER, Table};
use crate::settings::Settings;
use crate::utils::{maybe_print_json, pretty_table};

#[derive(Debug, Serialize)]
pub struct TableOverview {
    pub rows: usize,
    pub columns: Vec<String>,
    pub date_columns: Vec<String>,
    pub suppliers: Vec<String>,
}

pub fn overview(table: &Table, settings: &Settings) -> TableOverview {
    TableOverview {
        rows: table.len(),
        columns: table.headers().to_vec(),
        date_columns: table.date_columns(&settings.date_parser()),
        suppliers: table.distinct_values(SUPPLIER),
    }
}

pub fn handle(settings: &Settings, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("inspect", sub)) => {
            let input = sub.get_one::<String>("input").unwrap().trim();
            let table =
                Table::from_path(input).with_context(|| format!("Load table {}", input))?;
            let info = overview(&table, settings);
            if !maybe_print_json(sub.get_flag("json"), &info)? {
                println!("{} rows", info.rows);
                let rows = vec![
                    vec!["Columns".to_string(), info.columns.join(", ")],
                    vec!["Date columns".to_string(), info.date_columns.join(", ")],
                    vec!["Suppliers".to_string(), info.suppliers.join(", ")],
                ];
                println!("{}", pretty_table(&["", "Values"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
