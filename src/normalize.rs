//! Projection of raw rows into join-ready records.
//!
//! Keys are compared as opaque strings after trimming and removing the
//! trailing `.0` that spreadsheet tools leave behind when a numeric barcode is
//! coerced to text. Prices accept a decimal comma and fall back to zero when a
//! cell cannot be read as a number.

use std::str::FromStr;

use itertools::Itertools;
use log::debug;
use rust_decimal::{Decimal, prelude::FromPrimitive};

use crate::{
    data::{Cell, RawTable},
    resolve::ResolvedColumns,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub key: String,
    pub price: Decimal,
    pub name: Option<String>,
    pub active_substance: Option<String>,
}

pub fn normalize_key(cell: &Cell) -> String {
    let display = cell.as_display();
    let trimmed = display.trim();
    trimmed.strip_suffix(".0").unwrap_or(trimmed).to_string()
}

/// Reads a price cell. Text is trimmed and `,` is treated as the decimal
/// separator; anything unparseable is zero.
pub fn parse_price(cell: &Cell) -> Decimal {
    match cell {
        Cell::Number(n) => Decimal::from_f64(*n).unwrap_or(Decimal::ZERO),
        Cell::Empty => Decimal::ZERO,
        Cell::Text(raw) => {
            let candidate = raw.trim().replace(',', ".");
            if candidate.is_empty() {
                return Decimal::ZERO;
            }
            Decimal::from_str(&candidate)
                .or_else(|_| Decimal::from_scientific(&candidate))
                .unwrap_or_else(|_| {
                    debug!("Price '{raw}' is not numeric; using 0");
                    Decimal::ZERO
                })
        }
    }
}

fn optional_text(table: &RawTable, column: Option<usize>, row: usize) -> Option<String> {
    let cell = table.cell(column?, row);
    if cell.is_empty() {
        None
    } else {
        Some(cell.as_display().trim().to_string())
    }
}

/// Extracts the resolved columns of every row into [`NormalizedRecord`]s, in
/// table order. Duplicates are kept; see [`dedup_first`].
pub fn project(table: &RawTable, columns: &ResolvedColumns) -> Vec<NormalizedRecord> {
    let name_idx = columns.name.as_ref().map(|c| c.index);
    let active_idx = columns.active_substance.as_ref().map(|c| c.index);
    (0..table.row_count())
        .map(|row| NormalizedRecord {
            key: normalize_key(table.cell(columns.identifier.index, row)),
            price: parse_price(table.cell(columns.price.index, row)),
            name: optional_text(table, name_idx, row),
            active_substance: optional_text(table, active_idx, row),
        })
        .collect()
}

/// Keeps the first record for every key, preserving order.
pub fn dedup_first(records: Vec<NormalizedRecord>) -> Vec<NormalizedRecord> {
    let before = records.len();
    let unique = records
        .into_iter()
        .unique_by(|record| record.key.clone())
        .collect_vec();
    if unique.len() < before {
        debug!("Dropped {} duplicate key(s)", before - unique.len());
    }
    unique
}
