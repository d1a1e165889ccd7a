//! Reconciliation of an old and a new price list.
//!
//! The new list drives a left-outer join: every (deduplicated) new record
//! yields exactly one [`ReconciledRow`], in new-list order. Keys missing from
//! the old list get an old price of zero, and a zero old price always yields a
//! zero percentage.

use std::collections::HashMap;

use log::{debug, info};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::{
    data::RawTable,
    error::PriceDeltaError,
    normalize::{NormalizedRecord, dedup_first, project},
    resolve::{ResolvedPair, RuleSet, resolve_pair},
};

pub const DISPLAY_SCALE: u32 = 2;
pub const NAME_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciledRow {
    pub key: String,
    pub name: String,
    pub active_substance: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub diff_value: Decimal,
    pub diff_percent: Decimal,
    /// False when the key does not exist in the old list.
    pub matched: bool,
}

impl ReconciledRow {
    pub fn is_change(&self) -> bool {
        !self.diff_value.is_zero()
    }
}

pub fn round_display(value: Decimal) -> Decimal {
    let rounded =
        value.round_dp_with_strategy(DISPLAY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded.is_zero() {
        Decimal::ZERO
    } else {
        rounded
    }
}

/// `new - old`, or zero when the difference does not fit in a `Decimal`.
fn price_difference(new_price: Decimal, old_price: Decimal) -> Decimal {
    new_price.checked_sub(old_price).unwrap_or_else(|| {
        debug!("Difference {new_price} - {old_price} overflows; using 0");
        Decimal::ZERO
    })
}

/// Zero without a positive old price, and zero when the ratio overflows.
fn percent_change(diff: Decimal, old_price: Decimal) -> Decimal {
    if old_price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    diff.checked_div(old_price)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| {
            debug!("Percentage of {diff} over {old_price} overflows; using 0");
            Decimal::ZERO
        })
}

/// Joins the two tables through the already resolved columns.
pub fn reconcile(old: &RawTable, new: &RawTable, columns: &ResolvedPair) -> Vec<ReconciledRow> {
    let old_records = dedup_first(project(old, &columns.old));
    let new_records = dedup_first(project(new, &columns.new));

    let substance_placeholder =
        if columns.old.active_substance.is_none() && columns.new.active_substance.is_none() {
            NAME_PLACEHOLDER
        } else {
            ""
        };

    let lookup: HashMap<&str, &NormalizedRecord> = old_records
        .iter()
        .map(|record| (record.key.as_str(), record))
        .collect();

    new_records
        .into_iter()
        .map(|record| {
            let previous = lookup.get(record.key.as_str()).copied();
            let old_price = previous.map(|p| p.price).unwrap_or(Decimal::ZERO);
            let diff = price_difference(record.price, old_price);
            let diff_percent = percent_change(diff, old_price);
            let name = record
                .name
                .or_else(|| previous.and_then(|p| p.name.clone()))
                .unwrap_or_else(|| NAME_PLACEHOLDER.to_string());
            let active_substance = record
                .active_substance
                .or_else(|| previous.and_then(|p| p.active_substance.clone()))
                .unwrap_or_else(|| substance_placeholder.to_string());
            ReconciledRow {
                key: record.key,
                name,
                active_substance,
                old_price: round_display(old_price),
                new_price: round_display(record.price),
                diff_value: round_display(diff),
                diff_percent: round_display(diff_percent),
                matched: previous.is_some(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Diagnostic {
    Resolved(ResolvedPair),
    Failed {
        message: String,
        #[serde(skip)]
        error: PriceDeltaError,
    },
}

impl Diagnostic {
    pub fn is_success(&self) -> bool {
        matches!(self, Diagnostic::Resolved(_))
    }

    /// Human-readable message for a failed resolution.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Diagnostic::Resolved(_) => None,
            Diagnostic::Failed { message, .. } => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub rows: Vec<ReconciledRow>,
    pub diagnostic: Diagnostic,
}

/// Resolves columns in both tables and reconciles them. A missing mandatory
/// column yields no rows and a failed diagnostic.
pub fn compare(old: &RawTable, new: &RawTable, rules: &RuleSet) -> Comparison {
    match resolve_pair(old, new, rules) {
        Ok(columns) => {
            info!(
                "Comparing '{}' (old) with '{}' (new)",
                columns.old.price.label, columns.new.price.label
            );
            let rows = reconcile(old, new, &columns);
            Comparison {
                rows,
                diagnostic: Diagnostic::Resolved(columns),
            }
        }
        Err(error) => Comparison {
            rows: Vec::new(),
            diagnostic: Diagnostic::Failed {
                message: error.to_string(),
                error,
            },
        },
    }
}

/// Rows whose rounded delta is non-zero.
pub fn changes_only(rows: &[ReconciledRow]) -> Vec<ReconciledRow> {
    rows.iter().filter(|row| row.is_change()).cloned().collect()
}

/// Largest absolute delta first; ties keep their input order.
pub fn sort_by_magnitude(rows: &mut [ReconciledRow]) {
    rows.sort_by(|a, b| b.diff_value.abs().cmp(&a.diff_value.abs()));
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub matched: usize,
    pub new_items: usize,
    pub increases: usize,
    pub decreases: usize,
    pub unchanged: usize,
}

impl Summary {
    pub fn from_rows(rows: &[ReconciledRow]) -> Self {
        let mut summary = Summary {
            rows: rows.len(),
            ..Default::default()
        };
        for row in rows {
            if row.matched {
                summary.matched += 1;
            } else {
                summary.new_items += 1;
            }
            if row.diff_value > Decimal::ZERO {
                summary.increases += 1;
            } else if row.diff_value < Decimal::ZERO {
                summary.decreases += 1;
            } else {
                summary.unchanged += 1;
            }
        }
        summary
    }
}
