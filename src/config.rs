//! YAML persistence for column-resolution rules.
//!
//! A rules file has one entry per role:
//!
//! ```yaml
//! identifier:
//!   rules:
//!     - kind: header
//!       required: [BARCODE]
//!     - kind: sampled
//!       prefix: "280"
//!       sample_size: 20
//!   fallback: first
//! old_price:
//!   rules:
//!     - kind: header
//!       required: [ΧΟΝΔΡΙΚΗ, ΤΙΜΗ]
//!       forbidden: [ΛΙΑΝΙΚΗ]
//! ```
//!
//! `active_substance` may be omitted; every other role must be present.

use std::{
    fs::File,
    io::{Read, Write},
    path::Path,
};

use anyhow::{Context, Result};

use crate::resolve::RuleSet;

pub fn rules_from_str(input: &str) -> Result<RuleSet> {
    let rules: RuleSet = serde_yaml::from_str(input).context("Parsing column rules")?;
    rules.validate()?;
    Ok(rules)
}

pub fn rules_to_string(rules: &RuleSet) -> Result<String> {
    Ok(serde_yaml::to_string(rules)?)
}

pub fn load_rules(path: &Path) -> Result<RuleSet> {
    let mut file = File::open(path).with_context(|| format!("Opening rules file {path:?}"))?;
    let mut buf = String::new();
    file.read_to_string(&mut buf)?;
    rules_from_str(&buf).with_context(|| format!("Loading rules from {path:?}"))
}

pub fn save_rules(path: &Path, rules: &RuleSet) -> Result<()> {
    let serialized = rules_to_string(rules)?;
    let mut file = File::create(path).with_context(|| format!("Creating rules file {path:?}"))?;
    file.write_all(serialized.as_bytes())?;
    file.flush()?;
    Ok(())
}

/// Rules from `path` when given, the built-in set otherwise.
pub fn rules_or_default(path: Option<&Path>) -> Result<RuleSet> {
    match path {
        Some(path) => load_rules(path),
        None => Ok(RuleSet::default()),
    }
}
