//! Presentation of the result table: header labels, number formatting, CSV
//! serialization and the plain-text report.
//!
//! Nothing here feeds back into the comparison. Values arrive already rounded
//! to two decimals.

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use encoding_rs::Encoding;
use rust_decimal::Decimal;

use crate::{
    io_utils,
    reconcile::{ReconciledRow, Summary},
    table::{self, Align},
    text::{transliterate_greek, truncate_chars},
};

const TEXT_NAME_WIDTH: usize = 45;
const TEXT_SUBSTANCE_WIDTH: usize = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum HeaderLanguage {
    #[default]
    #[value(name = "el")]
    Greek,
    #[value(name = "en")]
    English,
}

impl HeaderLanguage {
    pub fn headers(&self) -> [&'static str; 7] {
        match self {
            HeaderLanguage::Greek => [
                "Barcode",
                "Όνομα Φαρμάκου",
                "Δραστική",
                "Παλιά ΧΤ",
                "Νέα ΧΤ",
                "Διαφορά",
                "δ%",
            ],
            HeaderLanguage::English => [
                "Barcode",
                "Product",
                "Active substance",
                "Old wholesale",
                "New wholesale",
                "Difference",
                "Change %",
            ],
        }
    }

    pub fn title(&self, count: usize) -> String {
        match self {
            HeaderLanguage::Greek => format!("Λίστα Αλλαγών Τιμών ({count} είδη)"),
            HeaderLanguage::English => format!("Price changes ({count} items)"),
        }
    }
}

/// Two decimals, no sign for positives.
pub fn format_amount(value: Decimal) -> String {
    format!("{:.2}", normalize_zero(value))
}

/// Two decimals with an explicit `+` for positive values.
pub fn format_signed(value: Decimal, scale: usize) -> String {
    let value = normalize_zero(value);
    if value > Decimal::ZERO {
        format!("+{value:.scale$}")
    } else {
        format!("{value:.scale$}")
    }
}

fn normalize_zero(value: Decimal) -> Decimal {
    if value.is_zero() { Decimal::ZERO } else { value }
}

/// Plain fields for machine-readable output.
pub fn row_fields(row: &ReconciledRow) -> Vec<String> {
    vec![
        row.key.clone(),
        row.name.clone(),
        row.active_substance.clone(),
        format_amount(row.old_price),
        format_amount(row.new_price),
        format_amount(row.diff_value),
        format_amount(row.diff_percent),
    ]
}

pub fn csv_string(rows: &[ReconciledRow], language: HeaderLanguage, delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer
        .write_record(language.headers())
        .context("Writing result headers")?;
    for row in rows {
        writer
            .write_record(row_fields(row))
            .with_context(|| format!("Writing result row for '{}'", row.key))?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("Flushing CSV output: {}", err.error()))?;
    Ok(String::from_utf8(bytes)?)
}

pub fn write_csv(
    rows: &[ReconciledRow],
    path: Option<&Path>,
    language: HeaderLanguage,
    delimiter: u8,
    encoding: &'static Encoding,
) -> Result<()> {
    let text = csv_string(rows, language, delimiter)?;
    io_utils::write_encoded(path, &text, encoding)
}

/// Title, aligned table and a one-line summary. With `ascii` Greek text is
/// transliterated so the report survives terminals and fonts without Greek
/// glyphs.
pub fn render_text_report(
    rows: &[ReconciledRow],
    language: HeaderLanguage,
    ascii: bool,
) -> String {
    let fold = |value: &str| -> String {
        if ascii {
            transliterate_greek(value).into_owned()
        } else {
            value.to_string()
        }
    };
    let headers = language
        .headers()
        .iter()
        .map(|&h| fold(h))
        .collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| {
            vec![
                row.key.clone(),
                fold(&truncate_chars(&row.name, TEXT_NAME_WIDTH).into_owned()),
                fold(&truncate_chars(&row.active_substance, TEXT_SUBSTANCE_WIDTH).into_owned()),
                format_amount(row.old_price),
                format_amount(row.new_price),
                format_signed(row.diff_value, 2),
                format!("{}%", format_signed(row.diff_percent, 1)),
            ]
        })
        .collect::<Vec<_>>();
    let aligns = [
        Align::Left,
        Align::Left,
        Align::Left,
        Align::Right,
        Align::Right,
        Align::Right,
        Align::Right,
    ];

    let summary = Summary::from_rows(rows);
    let mut output = String::new();
    output.push_str(&fold(&language.title(rows.len())));
    output.push_str("\n\n");
    output.push_str(&table::render_table(&headers, &body, &aligns));
    output.push_str(&format!(
        "\n{} increase(s), {} decrease(s), {} new item(s)\n",
        summary.increases, summary.decreases, summary.new_items
    ));
    output
}
