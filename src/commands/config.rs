// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use tracing::info;

use crate::engine::ApplyMode;
use crate::settings::Settings;
use crate::utils::{arg_trimmed, pretty_table};

pub fn handle(settings: &mut Settings, path: &Path, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let rows = vec![
                vec!["settings file".into(), path.display().to_string()],
                vec![
                    "mode".into(),
                    settings
                        .mode
                        .map(|mode| mode.to_string())
                        .unwrap_or_else(|| "(not set)".into()),
                ],
                vec![
                    "rules path".into(),
                    settings
                        .rules_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "(default)".into()),
                ],
                vec!["date formats".into(), settings.date_formats.join("  ")],
            ];
            println!("{}", pretty_table(&["Setting", "Value"], rows));
        }
        Some(("set", sub)) => {
            if let Some(raw) = arg_trimmed(sub, "mode") {
                settings.mode = Some(raw.parse::<ApplyMode>().map_err(|e| anyhow!(e))?);
            }
            if let Some(p) = arg_trimmed(sub, "rules_path") {
                settings.rules_path = Some(PathBuf::from(p));
            }
            if let Some(formats) = sub.get_many::<String>("date_format") {
                let formats: Vec<String> = formats
                    .map(|f| f.trim().to_string())
                    .filter(|f| !f.is_empty())
                    .collect();
                if formats.is_empty() {
                    return Err(anyhow!("At least one date format is required"));
                }
                settings.date_formats = formats;
            }
            settings.save(path)?;
            info!(path = %path.display(), "settings saved");
            println!("Saved settings to {}", path.display());
        }
        _ => {}
    }
    Ok(())
}
