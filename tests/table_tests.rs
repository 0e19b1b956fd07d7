// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use rulebook::commands::{config, table};
use rulebook::engine::ApplyMode;
use rulebook::fields::Table;
use rulebook::settings::Settings;
use rulebook::cli;
use tempfile::{NamedTempFile, tempdir};

#[test]
fn overview_lists_date_columns_and_supplier_options() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "Supplier,Amount,Description,Bill Date,Paid On\n\
         Beta,10,pens,2024-01-03,03 Jan 2024\n\
         Acme,25,taxi,2024-01-04,\n\
          beta ,5,ink,,05 Jan 2024"
    )
    .unwrap();
    file.flush().unwrap();

    let t = Table::from_path(file.path()).unwrap();
    let info = table::overview(&t, &Settings::default());
    assert_eq!(info.rows, 3);
    assert_eq!(info.date_columns, vec!["Bill Date", "Paid On"]);
    assert_eq!(info.suppliers, vec!["Acme", "Beta", "beta"]);

    let matches = cli::build_cli().get_matches_from([
        "rulebook",
        "table",
        "inspect",
        "--input",
        file.path().to_str().unwrap(),
        "--json",
    ]);
    if let Some(("table", table_m)) = matches.subcommand() {
        table::handle(&Settings::default(), table_m).unwrap();
    } else {
        panic!("table command not parsed");
    }
}

#[test]
fn missing_input_file_is_an_error() {
    let matches = cli::build_cli().get_matches_from([
        "rulebook",
        "table",
        "inspect",
        "--input",
        "/definitely/not/here.csv",
    ]);
    if let Some(("table", table_m)) = matches.subcommand() {
        assert!(table::handle(&Settings::default(), table_m).is_err());
    } else {
        panic!("table command not parsed");
    }
}

#[test]
fn config_set_persists_mode_and_formats() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let mut settings = Settings::default();

    let matches = cli::build_cli().get_matches_from([
        "rulebook",
        "config",
        "set",
        "--mode",
        "per-rule",
        "--date-format",
        "%d.%m.%Y",
        "--date-format",
        "%Y-%m-%d",
    ]);
    if let Some(("config", config_m)) = matches.subcommand() {
        config::handle(&mut settings, &path, config_m).unwrap();
    } else {
        panic!("config command not parsed");
    }

    let saved = Settings::load(&path).unwrap();
    assert_eq!(saved.mode, Some(ApplyMode::PerRule));
    assert_eq!(saved.date_formats, vec!["%d.%m.%Y", "%Y-%m-%d"]);
    assert_eq!(saved, settings);

    let matches =
        cli::build_cli().get_matches_from(["rulebook", "config", "set", "--mode", "sideways"]);
    if let Some(("config", config_m)) = matches.subcommand() {
        assert!(config::handle(&mut settings, &path, config_m).is_err());
    } else {
        panic!("config command not parsed");
    }
    assert_eq!(Settings::load(&path).unwrap().mode, Some(ApplyMode::PerRule));
}
