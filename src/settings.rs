// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::engine::ApplyMode;
use crate::fields::{DEFAULT_DATE_FORMATS, DateParser};
use crate::store::{APP, default_rules_path};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Precedence policy used by `apply` when `--mode` is not given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ApplyMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules_path: Option<PathBuf>,
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: None,
            rules_path: None,
            date_formats: default_date_formats(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Read settings {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create config dir")?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)
            .with_context(|| format!("Write settings {}", path.display()))
    }

    pub fn date_parser(&self) -> DateParser {
        DateParser::new(self.date_formats.clone())
    }

    /// Rules file: explicit override, then settings, then the platform default.
    pub fn resolve_rules_path(&self, cli_override: Option<&str>) -> Result<PathBuf> {
        if let Some(p) = cli_override.map(str::trim).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(p));
        }
        match &self.rules_path {
            Some(p) => Ok(p.clone()),
            None => default_rules_path(),
        }
    }

    /// The apply mode must be chosen explicitly somewhere.
    pub fn resolve_mode(&self, cli_mode: Option<&str>) -> Result<ApplyMode> {
        if let Some(raw) = cli_mode {
            return raw.parse::<ApplyMode>().map_err(|e| anyhow!(e));
        }
        self.mode.ok_or_else(|| {
            anyhow!(
                "No categorization mode selected: pass --mode latest|per-rule \
                 or run `rulebook config set --mode <mode>`"
            )
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific config dir")?;
    Ok(proj.config_dir().join("settings.json"))
}
