//! Column resolution: mapping semantic roles onto human-authored headers.
//!
//! Each [`ColumnRole`] owns an ordered list of [`MatchRule`]s plus a
//! [`PositionalFallback`]. Rules are tried in order and the first rule that
//! matches any column wins; inside a rule, columns are scanned left to right.
//! Header rules compare folded labels (see [`fold_label`]) by substring
//! containment only. There is no fuzzy matching: an unmatched mandatory role
//! is reported as [`PriceDeltaError::MissingColumn`] instead of guessed.
//!
//! The one rule that looks at data rather than headers is
//! [`MatchRule::Sampled`], which recognizes identifier columns whose header
//! says nothing useful but whose values share a known prefix.

use std::fmt;

use itertools::Itertools;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Column, RawTable},
    error::{PriceDeltaError, Result},
    normalize::normalize_key,
    text::fold_label,
};

pub const DEFAULT_SAMPLE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnRole {
    Identifier,
    DisplayName,
    ActiveSubstance,
    OldPrice,
    NewPrice,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 5] = [
        ColumnRole::Identifier,
        ColumnRole::DisplayName,
        ColumnRole::ActiveSubstance,
        ColumnRole::OldPrice,
        ColumnRole::NewPrice,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Identifier => "identifier",
            ColumnRole::DisplayName => "product name",
            ColumnRole::ActiveSubstance => "active substance",
            ColumnRole::OldPrice => "old wholesale price",
            ColumnRole::NewPrice => "new wholesale price",
        }
    }

    pub fn is_mandatory(&self) -> bool {
        matches!(
            self,
            ColumnRole::Identifier | ColumnRole::OldPrice | ColumnRole::NewPrice
        )
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableSide {
    Old,
    New,
}

impl TableSide {
    pub fn price_role(&self) -> ColumnRole {
        match self {
            TableSide::Old => ColumnRole::OldPrice,
            TableSide::New => ColumnRole::NewPrice,
        }
    }

    /// Roles resolved for this side, mandatory ones first.
    pub fn roles(&self) -> [ColumnRole; 4] {
        [
            ColumnRole::Identifier,
            self.price_role(),
            ColumnRole::DisplayName,
            ColumnRole::ActiveSubstance,
        ]
    }
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSide::Old => f.write_str("old price list"),
            TableSide::New => f.write_str("new price list"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchRule {
    /// Folded label contains every `required` keyword and no `forbidden` one.
    Header {
        required: Vec<String>,
        #[serde(default)]
        forbidden: Vec<String>,
    },
    /// More than half of the first `sample_size` non-empty values start with
    /// `prefix`.
    Sampled {
        prefix: String,
        #[serde(default = "default_sample_size")]
        sample_size: usize,
    },
}

fn default_sample_size() -> usize {
    DEFAULT_SAMPLE_SIZE
}

impl MatchRule {
    pub fn header(required: &[&str], forbidden: &[&str]) -> Self {
        MatchRule::Header {
            required: required.iter().map(|k| k.to_string()).collect(),
            forbidden: forbidden.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn sampled(prefix: &str) -> Self {
        MatchRule::Sampled {
            prefix: prefix.to_string(),
            sample_size: DEFAULT_SAMPLE_SIZE,
        }
    }

    fn describe(&self) -> String {
        match self {
            MatchRule::Header {
                required,
                forbidden,
            } => {
                let mut text = format!("a header containing {}", required.join(" + "));
                if !forbidden.is_empty() {
                    text.push_str(&format!(" (but not {})", forbidden.join(", ")));
                }
                text
            }
            MatchRule::Sampled { prefix, .. } => {
                format!("a column whose values mostly start with '{prefix}'")
            }
        }
    }
}

/// Column picked by position when every rule of a role fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionalFallback {
    #[default]
    None,
    First,
    Last,
    /// Zero-based column position.
    Nth(usize),
}

impl PositionalFallback {
    fn pick(&self, column_count: usize) -> Option<usize> {
        match self {
            PositionalFallback::None => None,
            PositionalFallback::First => (column_count > 0).then_some(0),
            PositionalFallback::Last => column_count.checked_sub(1),
            PositionalFallback::Nth(idx) => (*idx < column_count).then_some(*idx),
        }
    }
}

impl fmt::Display for PositionalFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionalFallback::None => f.write_str("none"),
            PositionalFallback::First => f.write_str("first column"),
            PositionalFallback::Last => f.write_str("last column"),
            PositionalFallback::Nth(idx) => write!(f, "column #{}", idx + 1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRules {
    pub rules: Vec<MatchRule>,
    #[serde(default)]
    pub fallback: PositionalFallback,
}

impl RoleRules {
    pub fn new(rules: Vec<MatchRule>, fallback: PositionalFallback) -> Self {
        Self { rules, fallback }
    }

    /// Union of the forbidden keywords of all header rules, folded.
    fn forbidden_keywords(&self) -> Vec<String> {
        self.rules
            .iter()
            .filter_map(|rule| match rule {
                MatchRule::Header { forbidden, .. } => Some(forbidden),
                MatchRule::Sampled { .. } => None,
            })
            .flatten()
            .filter(|k| !k.trim().is_empty())
            .map(|k| fold_label(k))
            .unique()
            .collect()
    }

    pub fn describe(&self) -> String {
        let mut parts = self.rules.iter().map(MatchRule::describe).collect_vec();
        if self.fallback != PositionalFallback::None {
            parts.push(format!("the {}", self.fallback));
        }
        if parts.is_empty() {
            "no rules configured".to_string()
        } else {
            parts.join(", or ")
        }
    }
}

/// Rules for every role. `RuleSet::default()` carries the built-in Greek and
/// English keyword tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub identifier: RoleRules,
    pub display_name: RoleRules,
    #[serde(default)]
    pub active_substance: RoleRules,
    pub old_price: RoleRules,
    pub new_price: RoleRules,
}

impl Default for RuleSet {
    fn default() -> Self {
        const NOT_RETAIL: &[&str] = &["ΛΙΑΝΙΚΗ", "RETAIL"];
        Self {
            identifier: RoleRules::new(
                vec![
                    MatchRule::header(&["BARCODE"], &[]),
                    MatchRule::header(&["EAN"], &[]),
                    MatchRule::sampled("280"),
                    MatchRule::header(&["ΚΩΔΙΚΟΣ"], &[]),
                    MatchRule::header(&["CODE"], &[]),
                ],
                PositionalFallback::First,
            ),
            display_name: RoleRules::new(
                vec![
                    MatchRule::header(&["ΠΡΟΙΟΝ"], &[]),
                    MatchRule::header(&["ΟΝΟΜΑΣΙΑ"], &[]),
                    MatchRule::header(&["ΠΕΡΙΓΡΑΦΗ"], &[]),
                    MatchRule::header(&["PRODUCT"], &[]),
                    MatchRule::header(&["NAME"], &[]),
                    MatchRule::header(&["DESCRIPTION"], &[]),
                ],
                PositionalFallback::None,
            ),
            active_substance: RoleRules::new(
                vec![
                    MatchRule::header(&["ΔΡΑΣΤΙΚΗ"], &[]),
                    MatchRule::header(&["ACTIVE"], &[]),
                    MatchRule::header(&["SUBSTANCE"], &[]),
                    MatchRule::header(&["INN"], &[]),
                ],
                PositionalFallback::None,
            ),
            old_price: RoleRules::new(
                vec![
                    MatchRule::header(&["ΧΟΝΔΡΙΚΗ", "ΤΙΜΗ"], NOT_RETAIL),
                    MatchRule::header(&["WHOLESALE"], &["RETAIL"]),
                ],
                PositionalFallback::None,
            ),
            new_price: RoleRules::new(
                vec![
                    MatchRule::header(&["ΠΡΟΤΕΙΝΟΜΕΝΗ", "ΧΟΝΔΡΙΚΗ"], NOT_RETAIL),
                    MatchRule::header(&["ΧΟΝΔΡΙΚΗ"], NOT_RETAIL),
                    MatchRule::header(&["WHOLESALE"], &["RETAIL"]),
                ],
                PositionalFallback::None,
            ),
        }
    }
}

impl RuleSet {
    pub fn for_role(&self, role: ColumnRole) -> &RoleRules {
        match role {
            ColumnRole::Identifier => &self.identifier,
            ColumnRole::DisplayName => &self.display_name,
            ColumnRole::ActiveSubstance => &self.active_substance,
            ColumnRole::OldPrice => &self.old_price,
            ColumnRole::NewPrice => &self.new_price,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for role in ColumnRole::ALL {
            let role_rules = self.for_role(role);
            for rule in &role_rules.rules {
                match rule {
                    MatchRule::Header { required, .. } => {
                        if required.iter().all(|k| k.trim().is_empty()) {
                            return Err(PriceDeltaError::InvalidRules(format!(
                                "a header rule for the {role} has no required keyword"
                            )));
                        }
                    }
                    MatchRule::Sampled {
                        prefix,
                        sample_size,
                    } => {
                        if prefix.is_empty() || *sample_size == 0 {
                            return Err(PriceDeltaError::InvalidRules(format!(
                                "a sampling rule for the {role} needs a prefix and a sample size above zero"
                            )));
                        }
                    }
                }
            }
            if role.is_mandatory()
                && role_rules.rules.is_empty()
                && role_rules.fallback == PositionalFallback::None
            {
                return Err(PriceDeltaError::InvalidRules(format!(
                    "the {role} is mandatory but has neither rules nor a fallback"
                )));
            }
        }
        Ok(())
    }
}

/// How a column was chosen, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    Header { rule: usize },
    Sampled { rule: usize, hits: usize, sampled: usize },
    Positional(PositionalFallback),
}

impl fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedBy::Header { rule } => write!(f, "header rule #{}", rule + 1),
            ResolvedBy::Sampled {
                rule,
                hits,
                sampled,
            } => write!(f, "value sampling rule #{} ({hits}/{sampled})", rule + 1),
            ResolvedBy::Positional(fallback) => write!(f, "fallback: {fallback}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumn {
    pub index: usize,
    pub label: String,
    pub resolved_by: ResolvedBy,
}

/// Columns chosen for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedColumns {
    pub side: TableSide,
    pub identifier: ResolvedColumn,
    pub price: ResolvedColumn,
    pub name: Option<ResolvedColumn>,
    pub active_substance: Option<ResolvedColumn>,
}

impl ResolvedColumns {
    pub fn get(&self, role: ColumnRole) -> Option<&ResolvedColumn> {
        match role {
            ColumnRole::Identifier => Some(&self.identifier),
            ColumnRole::DisplayName => self.name.as_ref(),
            ColumnRole::ActiveSubstance => self.active_substance.as_ref(),
            role if role == self.side.price_role() => Some(&self.price),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPair {
    pub old: ResolvedColumns,
    pub new: ResolvedColumns,
}

/// Returns true when the folded `label` contains all `required` keywords and
/// none of the `forbidden` ones.
pub fn header_matches(label: &str, required: &[String], forbidden: &[String]) -> bool {
    let folded = fold_label(label);
    required.iter().all(|k| folded.contains(&fold_label(k)))
        && !forbidden
            .iter()
            .filter(|k| !k.trim().is_empty())
            .any(|k| folded.contains(&fold_label(k)))
}

/// Counts how many of the leading non-empty values start with `prefix`.
/// Returns `(hits, sampled)`.
pub fn sample_prefix(column: &Column, prefix: &str, sample_size: usize) -> (usize, usize) {
    let sample = column
        .non_empty()
        .take(sample_size)
        .map(normalize_key)
        .collect_vec();
    let hits = sample.iter().filter(|v| v.starts_with(prefix)).count();
    (hits, sample.len())
}

/// Resolves one role against `table`. Pure: no logging, no side effects.
pub fn resolve(table: &RawTable, role_rules: &RoleRules) -> Option<ResolvedColumn> {
    for (rule_idx, rule) in role_rules.rules.iter().enumerate() {
        let found = match rule {
            MatchRule::Header {
                required,
                forbidden,
            } => table
                .columns
                .iter()
                .position(|c| header_matches(&c.label, required, forbidden))
                .map(|idx| (idx, ResolvedBy::Header { rule: rule_idx })),
            MatchRule::Sampled {
                prefix,
                sample_size,
            } => table.columns.iter().enumerate().find_map(|(idx, column)| {
                let (hits, sampled) = sample_prefix(column, prefix, *sample_size);
                (sampled > 0 && hits * 2 > sampled).then_some((
                    idx,
                    ResolvedBy::Sampled {
                        rule: rule_idx,
                        hits,
                        sampled,
                    },
                ))
            }),
        };
        if let Some((index, resolved_by)) = found {
            return Some(ResolvedColumn {
                index,
                label: table.columns[index].label.clone(),
                resolved_by,
            });
        }
    }

    let index = role_rules.fallback.pick(table.columns.len())?;
    let label = &table.columns[index].label;
    let folded = fold_label(label);
    if role_rules
        .forbidden_keywords()
        .iter()
        .any(|k| folded.contains(k.as_str()))
    {
        return None;
    }
    Some(ResolvedColumn {
        index,
        label: label.clone(),
        resolved_by: ResolvedBy::Positional(role_rules.fallback),
    })
}

pub fn resolve_role(
    table: &RawTable,
    side: TableSide,
    role: ColumnRole,
    rule_set: &RuleSet,
) -> Option<ResolvedColumn> {
    let resolved = resolve(table, rule_set.for_role(role));
    match &resolved {
        Some(column) => match column.resolved_by {
            ResolvedBy::Positional(_) => warn!(
                "{side}: no header matched the {role}; using '{}' ({})",
                column.label, column.resolved_by
            ),
            _ => info!(
                "{side}: {role} -> '{}' ({})",
                column.label, column.resolved_by
            ),
        },
        None => debug!("{side}: no column matched the {role}"),
    }
    resolved
}

/// Resolves every role relevant to `side`. Mandatory roles that cannot be
/// resolved produce [`PriceDeltaError::MissingColumn`]; so does an identifier
/// that landed on the price column.
pub fn resolve_table(
    table: &RawTable,
    side: TableSide,
    rule_set: &RuleSet,
) -> Result<ResolvedColumns> {
    if table.is_empty() {
        return Err(PriceDeltaError::EmptyTable { side });
    }
    let mandatory = |role: ColumnRole| {
        resolve_role(table, side, role, rule_set).ok_or_else(|| PriceDeltaError::MissingColumn {
            side,
            role,
            expected: rule_set.for_role(role).describe(),
        })
    };
    let identifier = mandatory(ColumnRole::Identifier)?;
    let price = mandatory(side.price_role())?;
    if identifier.index == price.index {
        warn!(
            "{side}: '{}' cannot be both the identifier and the price",
            price.label
        );
        return Err(PriceDeltaError::MissingColumn {
            side,
            role: ColumnRole::Identifier,
            expected: rule_set.for_role(ColumnRole::Identifier).describe(),
        });
    }
    let name = resolve_role(table, side, ColumnRole::DisplayName, rule_set);
    let active_substance = resolve_role(table, side, ColumnRole::ActiveSubstance, rule_set);
    Ok(ResolvedColumns {
        side,
        identifier,
        price,
        name,
        active_substance,
    })
}

pub fn resolve_pair(old: &RawTable, new: &RawTable, rule_set: &RuleSet) -> Result<ResolvedPair> {
    let old = resolve_table(old, TableSide::Old, rule_set)?;
    let new = resolve_table(new, TableSide::New, rule_set)?;
    Ok(ResolvedPair { old, new })
}
