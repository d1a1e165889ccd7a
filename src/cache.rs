//! Caller-owned memoization of comparisons keyed by content digests.
//!
//! The engine itself never caches. Callers that compare the same inputs
//! repeatedly (an interactive front end re-rendering on every option change,
//! a batch driver) hold a [`ComparisonCache`] and go through it instead.

use std::collections::HashMap;

use log::debug;
use sha2::{Digest, Sha256};

use crate::{
    data::{Cell, RawTable},
    reconcile::{Comparison, compare},
    resolve::RuleSet,
};

const FIELD_SEPARATOR: u8 = 0x1f;
const COLUMN_SEPARATOR: u8 = 0x1e;

pub type ContentDigest = [u8; 32];

/// SHA-256 over labels and cell contents, in order.
pub fn table_digest(table: &RawTable) -> ContentDigest {
    let mut hasher = Sha256::new();
    for column in &table.columns {
        hasher.update(column.label.as_bytes());
        hasher.update([FIELD_SEPARATOR]);
        for cell in &column.cells {
            match cell {
                Cell::Text(text) => {
                    hasher.update([b't']);
                    hasher.update(text.as_bytes());
                }
                Cell::Number(number) => {
                    hasher.update([b'n']);
                    hasher.update(number.to_bits().to_le_bytes());
                }
                Cell::Empty => hasher.update([b'e']),
            }
            hasher.update([FIELD_SEPARATOR]);
        }
        hasher.update([COLUMN_SEPARATOR]);
    }
    hasher.finalize().into()
}

pub fn rules_digest(rules: &RuleSet) -> ContentDigest {
    let encoded = serde_json::to_vec(rules).unwrap_or_default();
    Sha256::digest(&encoded).into()
}

pub fn hex_digest(digest: &ContentDigest) -> String {
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    old: ContentDigest,
    new: ContentDigest,
    rules: ContentDigest,
}

#[derive(Debug, Default)]
pub struct ComparisonCache {
    entries: HashMap<CacheKey, Comparison>,
    hits: usize,
    misses: usize,
}

impl ComparisonCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compare(
        &mut self,
        old: &RawTable,
        new: &RawTable,
        rules: &RuleSet,
    ) -> &Comparison {
        let key = CacheKey {
            old: table_digest(old),
            new: table_digest(new),
            rules: rules_digest(rules),
        };
        if self.entries.contains_key(&key) {
            self.hits += 1;
            debug!("Comparison cache hit ({})", hex_digest(&key.new));
        } else {
            self.misses += 1;
            self.entries.insert(key, compare(old, new, rules));
        }
        &self.entries[&key]
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
