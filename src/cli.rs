// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, command};

const FIRST: [&str; 6] = ["field1", "value1", "min1", "max1", "start1", "end1"];
const SECOND: [&str; 6] = ["field2", "value2", "min2", "max2", "start2", "end2"];

fn condition_args(cmd: Command, ids: [&'static str; 6]) -> Command {
    let [field, value, min, max, start, end] = ids;
    cmd.arg(
        Arg::new(field)
            .long(field)
            .help("supplier | amount | description | date:<column>"),
    )
    .arg(
        Arg::new(value)
            .long(value)
            .help("Supplier name or description keyword"),
    )
    .arg(Arg::new(min).long(min).allow_hyphen_values(true))
    .arg(Arg::new(max).long(max).allow_hyphen_values(true))
    .arg(Arg::new(start).long(start).help("YYYY-MM-DD"))
    .arg(Arg::new(end).long(end).help("YYYY-MM-DD"))
}

fn logic_arg() -> Arg {
    Arg::new("logic")
        .long("logic")
        .default_value("AND")
        .help("How the two conditions combine: AND | OR")
}

fn category_arg() -> Arg {
    Arg::new("category")
        .long("category")
        .help("Target category label")
}

pub fn build_cli() -> Command {
    let add = condition_args(
        condition_args(
            Command::new("add")
                .about("Add a two-condition rule over any fields")
                .arg(logic_arg())
                .arg(category_arg())
                .arg(
                    Arg::new("table")
                        .long("table")
                        .help("CSV used to check that date columns exist"),
                ),
            FIRST,
        ),
        SECOND,
    );

    command!()
        .name("rulebook")
        .about("Categorize transaction tables with two-condition rules")
        .arg(
            Arg::new("rules")
                .long("rules")
                .global(true)
                .help("Rules file (defaults to the platform data dir)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .help("Settings file (defaults to the platform config dir)"),
        )
        .subcommand(
            Command::new("rules")
                .about("Manage stored rules")
                .subcommand(add)
                .subcommand(
                    Command::new("add-supplier")
                        .about("Add a supplier + amount-range rule")
                        .arg(Arg::new("supplier").long("supplier"))
                        .arg(Arg::new("min").long("min").allow_hyphen_values(true))
                        .arg(Arg::new("max").long("max").allow_hyphen_values(true))
                        .arg(logic_arg())
                        .arg(category_arg()),
                )
                .subcommand(
                    Command::new("list").about("Show rules in order").arg(
                        Arg::new("json")
                            .long("json")
                            .action(ArgAction::SetTrue),
                    ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a rule by its listed position")
                        .arg(Arg::new("pos").long("pos").required(true)),
                )
                .subcommand(
                    Command::new("save")
                        .about("Write the rules to another file")
                        .arg(Arg::new("out").long("out").required(true)),
                )
                .subcommand(
                    Command::new("load")
                        .about("Replace the rules with those from a file")
                        .arg(Arg::new("from").long("from").required(true)),
                ),
        )
        .subcommand(
            Command::new("apply")
                .about("Categorize a CSV and write the annotated output")
                .arg(Arg::new("input").long("input").required(true))
                .arg(
                    Arg::new("mode")
                        .long("mode")
                        .help("latest | per-rule (falls back to settings)"),
                )
                .arg(
                    Arg::new("out")
                        .long("out")
                        .required(true)
                        .help("Output CSV (latest) or directory (per-rule)"),
                )
                .arg(
                    Arg::new("preview")
                        .long("preview")
                        .default_value("20")
                        .value_parser(clap::value_parser!(usize))
                        .help("Rows to print per table"),
                ),
        )
        .subcommand(
            Command::new("table").about("Look at a transaction CSV").subcommand(
                Command::new("inspect")
                    .about("Columns, date columns and supplier options")
                    .arg(Arg::new("input").long("input").required(true))
                    .arg(Arg::new("json").long("json").action(ArgAction::SetTrue)),
            ),
        )
        .subcommand(
            Command::new("category")
                .about("Standard categories")
                .subcommand(Command::new("list")),
        )
        .subcommand(
            Command::new("config")
                .about("Show or change settings")
                .subcommand(Command::new("show"))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("mode").long("mode"))
                        .arg(Arg::new("rules_path").long("rules-path"))
                        .arg(
                            Arg::new("date_format")
                                .long("date-format")
                                .action(ArgAction::Append)
                                .help("Replace the date formats (repeatable, chrono syntax)"),
                        ),
                ),
        )
        .subcommand(
            Command::new("doctor")
                .about("Find rules that can never match a table")
                .arg(Arg::new("input").long("input").required(true)),
        )
}
