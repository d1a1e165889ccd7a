//! Styled XLSX export of the result table.
//!
//! One sheet, `Changes`: bold frozen header with an autofilter, euro number
//! formats on the price columns, a signed euro format on the difference, and
//! conditional colouring of the difference column. Which direction is shown
//! as "bad" is chosen by [`DeltaPalette`].

use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use rust_xlsxwriter::{
    Color, ConditionalFormatCell, ConditionalFormatCellRule, Format, FormatAlign, Workbook,
    Worksheet, XlsxError,
};

use crate::{reconcile::ReconciledRow, report::HeaderLanguage};

pub const SHEET_NAME: &str = "Changes";

const EURO_FORMAT: &str = "#,##0.00€";
const SIGNED_EURO_FORMAT: &str = "+#,##0.00€;-#,##0.00€;0.00€";
const SIGNED_PERCENT_FORMAT: &str = "+0.00;-0.00;0.00";
const COLUMN_WIDTHS: [f64; 7] = [16.0, 40.0, 25.0, 12.0, 12.0, 12.0, 10.0];
const DIFF_COLUMN: u16 = 5;
const PERCENT_COLUMN: u16 = 6;

const RED_FONT: u32 = 0x9C0006;
const RED_FILL: u32 = 0xFFC7CE;
const GREEN_FONT: u32 = 0x006100;
const GREEN_FILL: u32 = 0xC6EFCE;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum DeltaPalette {
    /// Price increases red, decreases green.
    #[default]
    IncreaseIsBad,
    /// Price increases green, decreases red.
    IncreaseIsGood,
}

impl DeltaPalette {
    fn increase_format(&self) -> Format {
        match self {
            DeltaPalette::IncreaseIsBad => fill_format(RED_FONT, RED_FILL),
            DeltaPalette::IncreaseIsGood => fill_format(GREEN_FONT, GREEN_FILL),
        }
    }

    fn decrease_format(&self) -> Format {
        match self {
            DeltaPalette::IncreaseIsBad => fill_format(GREEN_FONT, GREEN_FILL),
            DeltaPalette::IncreaseIsGood => fill_format(RED_FONT, RED_FILL),
        }
    }
}

fn fill_format(font: u32, fill: u32) -> Format {
    Format::new()
        .set_font_color(Color::RGB(font))
        .set_background_color(Color::RGB(fill))
}

fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Writes `rows` to `path` and returns the number of data rows written.
pub fn write_report(
    rows: &[ReconciledRow],
    path: &Path,
    language: HeaderLanguage,
    palette: DeltaPalette,
) -> Result<usize> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    fill_sheet(worksheet, rows, language, palette)
        .with_context(|| format!("Building sheet '{SHEET_NAME}'"))?;
    workbook
        .save(path)
        .with_context(|| format!("Saving XLSX report to {path:?}"))?;
    Ok(rows.len())
}

fn fill_sheet(
    worksheet: &mut Worksheet,
    rows: &[ReconciledRow],
    language: HeaderLanguage,
    palette: DeltaPalette,
) -> Result<(), XlsxError> {
    worksheet.set_name(SHEET_NAME)?;

    let header = Format::new()
        .set_bold()
        .set_align(FormatAlign::Center)
        .set_background_color(Color::RGB(0xDCDCDC));
    let centered = Format::new().set_align(FormatAlign::Center);
    let euro = centered.clone().set_num_format(EURO_FORMAT);
    let signed_euro = centered.clone().set_bold().set_num_format(SIGNED_EURO_FORMAT);
    let percent = centered.clone().set_num_format(SIGNED_PERCENT_FORMAT);

    for (col, (title, width)) in language.headers().iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, *title, &header)?;
        worksheet.set_column_width(col, width)?;
    }

    for (idx, row) in rows.iter().enumerate() {
        let r = (idx + 1) as u32;
        worksheet.write_string_with_format(r, 0, &row.key, &centered)?;
        worksheet.write_string_with_format(r, 1, &row.name, &centered)?;
        worksheet.write_string_with_format(r, 2, &row.active_substance, &centered)?;
        worksheet.write_number_with_format(r, 3, to_f64(row.old_price), &euro)?;
        worksheet.write_number_with_format(r, 4, to_f64(row.new_price), &euro)?;
        worksheet.write_number_with_format(r, DIFF_COLUMN, to_f64(row.diff_value), &signed_euro)?;
        worksheet.write_number_with_format(
            r,
            PERCENT_COLUMN,
            to_f64(row.diff_percent),
            &percent,
        )?;
    }

    worksheet.set_freeze_panes(1, 0)?;
    if rows.is_empty() {
        return Ok(());
    }

    let last_row = rows.len() as u32;
    worksheet.autofilter(0, 0, last_row, PERCENT_COLUMN)?;
    let increase = ConditionalFormatCell::new()
        .set_rule(ConditionalFormatCellRule::GreaterThan(0))
        .set_format(palette.increase_format());
    let decrease = ConditionalFormatCell::new()
        .set_rule(ConditionalFormatCellRule::LessThan(0))
        .set_format(palette.decrease_format());
    worksheet.add_conditional_format(1, DIFF_COLUMN, last_row, DIFF_COLUMN, &increase)?;
    worksheet.add_conditional_format(1, DIFF_COLUMN, last_row, DIFF_COLUMN, &decrease)?;
    Ok(())
}
