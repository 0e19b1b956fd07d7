// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::PathBuf;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use rulebook::{cli, commands, settings, store::Session};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config_path = match matches.get_one::<String>("config") {
        Some(p) => PathBuf::from(p.trim()),
        None => settings::config_path()?,
    };
    let mut settings = settings::Settings::load(&config_path)?;

    match matches.subcommand() {
        Some(("rules", sub)) => {
            let mut session = open_session(&settings, sub)?;
            commands::rules::handle(&mut session, sub)?
        }
        Some(("apply", sub)) => {
            let session = open_session(&settings, sub)?;
            commands::apply::handle(&session, &settings, sub)?
        }
        Some(("doctor", sub)) => {
            let session = open_session(&settings, sub)?;
            commands::doctor::handle(&session, &settings, sub)?
        }
        Some(("table", sub)) => commands::table::handle(&settings, sub)?,
        Some(("category", sub)) => commands::categories::handle(sub)?,
        Some(("config", sub)) => commands::config::handle(&mut settings, &config_path, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

fn open_session(settings: &settings::Settings, sub: &clap::ArgMatches) -> Result<Session> {
    let path = settings.resolve_rules_path(sub.get_one::<String>("rules").map(String::as_str))?;
    Ok(Session::open(path)?)
}
