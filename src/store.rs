// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::models::Rule;

pub(crate) static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Rulebook", "rulebook"));

/// Version written into every rules document.
pub const SCHEMA_VERSION: u32 = 1;

pub fn default_rules_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("rules.json"))
}

#[derive(Serialize, Deserialize)]
struct RuleDocument {
    version: u32,
    rules: Vec<Rule>,
}

/// Ordered rules. Position decides display order and, in latest-rule mode,
/// which rule governs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleStore {
    rules: Vec<Rule>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rules(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Most recently appended rule.
    pub fn latest(&self) -> Option<&Rule> {
        self.rules.last()
    }

    pub fn append(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    /// Remove the rule at a zero-based index, keeping the others in order.
    pub fn delete(&mut self, index: usize) -> Result<Rule, StoreError> {
        if index >= self.rules.len() {
            return Err(StoreError::NoSuchRule {
                position: index + 1,
                len: self.rules.len(),
            });
        }
        Ok(self.rules.remove(index))
    }

    pub fn to_json(&self) -> Result<String, StoreError> {
        let doc = RuleDocument {
            version: SCHEMA_VERSION,
            rules: self.rules.clone(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn from_json(text: &str) -> Result<Self, StoreError> {
        let doc: RuleDocument = serde_json::from_str(text)?;
        if doc.version != SCHEMA_VERSION {
            return Err(StoreError::UnsupportedVersion(doc.version, SCHEMA_VERSION));
        }
        for (idx, rule) in doc.rules.iter().enumerate() {
            rule.validate().map_err(|source| StoreError::InvalidRule {
                position: idx + 1,
                source,
            })?;
        }
        Ok(Self { rules: doc.rules })
    }

    /// Overwrite `path` with the full rule list.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let text = self.to_json()?;
        let write_err = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(write_err)?;
        fs::rename(&tmp, path).map_err(write_err)?;
        debug!(path = %path.display(), rules = self.rules.len(), "saved rules");
        Ok(())
    }

    /// Read a rules document. A missing file is an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        match fs::read_to_string(path) {
            Ok(text) => Self::from_json(&text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no rules file yet");
                Ok(Self::new())
            }
            Err(source) => Err(StoreError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

/// The rule list a user is working on, tied to the file it lives in.
///
/// Mutations are written through immediately; if the write fails the
/// in-memory list is restored so it never drifts from disk.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    store: RuleStore,
}

impl Session {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let store = RuleStore::load(&path)?;
        info!(path = %path.display(), rules = store.len(), "opened rule store");
        Ok(Self { path, store })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn add_rule(&mut self, rule: Rule) -> Result<(), StoreError> {
        self.store.append(rule);
        if let Err(e) = self.store.save(&self.path) {
            self.store.rules.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Delete by one-based display position.
    pub fn delete_rule(&mut self, position: usize) -> Result<Rule, StoreError> {
        let index = position.checked_sub(1).ok_or(StoreError::NoSuchRule {
            position,
            len: self.store.len(),
        })?;
        let removed = self.store.delete(index)?;
        if let Err(e) = self.store.save(&self.path) {
            self.store.rules.insert(index, removed);
            return Err(e);
        }
        Ok(removed)
    }

    pub fn save(&self) -> Result<(), StoreError> {
        self.store.save(&self.path)
    }

    /// Write a copy of the rules elsewhere without switching files.
    pub fn save_as(&self, path: &Path) -> Result<(), StoreError> {
        self.store.save(path)
    }

    /// Replace the session's rules with those in another document.
    pub fn replace_from(&mut self, path: &Path) -> Result<usize, StoreError> {
        let incoming = match fs::read_to_string(path) {
            Ok(text) => RuleStore::from_json(&text)?,
            Err(source) => {
                return Err(StoreError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        let previous = std::mem::replace(&mut self.store, incoming);
        if let Err(e) = self.store.save(&self.path) {
            self.store = previous;
            return Err(e);
        }
        Ok(self.store.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, Condition, Logic};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use tempfile::tempdir;

    fn sample_rules() -> Vec<Rule> {
        vec![
            Rule::supplier_amount(
                "Acme",
                Decimal::from(100),
                Decimal::new(20050, 2),
                Logic::And,
                Category::Travel,
            )
            .unwrap(),
            Rule::general(
                Condition::description("paper"),
                Condition::date(
                    "Invoice Date",
                    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
                )
                .unwrap(),
                Logic::Or,
                Category::Custom("Printing".into()),
            )
            .unwrap(),
            Rule::general(
                Condition::supplier("Beta"),
                Condition::supplier("Gamma"),
                Logic::Or,
                Category::ItServices,
            )
            .unwrap(),
        ]
    }

    #[test]
    fn save_then_load_returns_same_rules() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let store = RuleStore::from_rules(sample_rules());
        store.save(&path).unwrap();
        assert_eq!(RuleStore::load(&path).unwrap(), store);
    }

    #[test]
    fn custom_category_matching_standard_label_survives_round_trip() {
        let store = RuleStore::from_rules(vec![
            Rule::general(
                Condition::supplier("a"),
                Condition::description("b"),
                Logic::And,
                Category::Custom("Travel".into()),
            )
            .unwrap(),
            Rule::general(
                Condition::supplier("a"),
                Condition::description("b"),
                Logic::Or,
                Category::Custom("Courier".into()),
            )
            .unwrap(),
        ]);
        let back = RuleStore::from_json(&store.to_json().unwrap()).unwrap();
        assert_eq!(back, store);
    }

    #[test]
    fn save_overwrites_previous_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        RuleStore::from_rules(sample_rules()).save(&path).unwrap();
        let smaller = RuleStore::from_rules(sample_rules()[..1].to_vec());
        smaller.save(&path).unwrap();
        assert_eq!(RuleStore::load(&path).unwrap().len(), 1);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().unwrap();
        let store = RuleStore::load(&dir.path().join("absent.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn delete_keeps_relative_order() {
        let rules = sample_rules();
        let mut store = RuleStore::from_rules(rules.clone());
        let removed = store.delete(1).unwrap();
        assert_eq!(removed, rules[1]);
        assert_eq!(store.rules(), &[rules[0].clone(), rules[2].clone()]);
        assert!(matches!(
            store.delete(5),
            Err(StoreError::NoSuchRule { position: 6, len: 2 })
        ));
    }

    #[test]
    fn document_carries_version() {
        let json = RuleStore::from_rules(sample_rules()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["rules"][0]["first"]["field"], "supplier");
        assert_eq!(value["rules"][0]["second"]["max"], "200.50");
        assert_eq!(value["rules"][1]["category"], "Printing");
    }

    #[test]
    fn rejects_unknown_version_and_invalid_rules() {
        let err = RuleStore::from_json(r#"{"version": 2, "rules": []}"#).unwrap_err();
        assert!(matches!(err, StoreError::UnsupportedVersion(2, 1)));

        let inverted = r#"{"version": 1, "rules": [{
            "kind": "general",
            "first": {"field": "amount", "min": "10", "max": "1"},
            "second": {"field": "supplier", "value": "Acme"},
            "logic": "AND",
            "category": "Travel"
        }]}"#;
        let err = RuleStore::from_json(inverted).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRule { position: 1, .. }));

        let bare_list = r#"[{"supplier": "acme"}]"#;
        assert!(matches!(
            RuleStore::from_json(bare_list),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn session_rolls_back_when_save_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut session = Session::open(&path).unwrap();
        // a directory squatting on the temp name makes the write fail
        std::fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let rule = sample_rules().remove(0);
        assert!(session.add_rule(rule).is_err());
        assert!(session.store().is_empty());
    }

    #[test]
    fn session_delete_uses_display_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rules.json");
        let mut session = Session::open(&path).unwrap();
        for rule in sample_rules() {
            session.add_rule(rule).unwrap();
        }
        assert!(session.delete_rule(0).is_err());
        let removed = session.delete_rule(3).unwrap();
        assert_eq!(removed.category(), &Category::ItServices);
        assert_eq!(RuleStore::load(&path).unwrap().len(), 2);
    }
}
