use anyhow::{Context, Result, anyhow, bail};
use log::{error, info};

use crate::{
    cli::CompareArgs,
    config, io_utils,
    io_utils::LoadOptions,
    printable_delimiter,
    reconcile::{self, ReconciledRow, Summary},
    report, xlsx,
};

pub fn execute(args: &CompareArgs) -> Result<()> {
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;
    let rules = config::rules_or_default(args.rules.as_deref())?;

    let old = io_utils::load_table(
        &args.old,
        &LoadOptions {
            delimiter: args.delimiter,
            encoding: input_encoding,
            sheet: args.old_sheet.clone(),
        },
    )
    .with_context(|| format!("Loading old price list {:?}", args.old))?;
    let new = io_utils::load_table(
        &args.new,
        &LoadOptions {
            delimiter: args.delimiter,
            encoding: input_encoding,
            sheet: args.new_sheet.clone(),
        },
    )
    .with_context(|| format!("Loading new price list {:?}", args.new))?;

    let comparison = reconcile::compare(&old, &new, &rules);
    if let Some(message) = comparison.diagnostic.error_message() {
        bail!("{message}");
    }

    let summary = Summary::from_rows(&comparison.rows);
    info!(
        "Reconciled {} item(s): {} matched, {} new, {} increase(s), {} decrease(s)",
        summary.rows, summary.matched, summary.new_items, summary.increases, summary.decreases
    );

    let rows = select_rows(comparison.rows, args.all, args.keep_order);
    if !args.all {
        info!("Found {} price change(s)", rows.len());
    }
    emit_outputs(args, &rows, output_encoding)
}

/// Changes only unless `all`; largest change first unless `keep_order`.
pub fn select_rows(rows: Vec<ReconciledRow>, all: bool, keep_order: bool) -> Vec<ReconciledRow> {
    let mut selected = if all {
        rows
    } else {
        reconcile::changes_only(&rows)
    };
    if !keep_order {
        reconcile::sort_by_magnitude(&mut selected);
    }
    selected
}

/// Every requested output is attempted; a failing one does not prevent the
/// others from being written.
fn emit_outputs(
    args: &CompareArgs,
    rows: &[ReconciledRow],
    encoding: &'static encoding_rs::Encoding,
) -> Result<()> {
    let mut failures = Vec::new();

    if args.table {
        print!(
            "{}",
            report::render_text_report(rows, args.labels, args.ascii)
        );
    }

    if args.output.is_some() || (args.xlsx.is_none() && !args.table) {
        let target = args.output.as_deref();
        match report::write_csv(rows, target, args.labels, args.output_delimiter, encoding) {
            Ok(()) => {
                if let Some(path) = target.filter(|p| !io_utils::is_dash(p)) {
                    info!(
                        "Wrote {} row(s) to {:?} (delimiter '{}')",
                        rows.len(),
                        path,
                        printable_delimiter(args.output_delimiter)
                    );
                }
            }
            Err(err) => {
                error!("CSV output failed: {err:#}");
                failures.push("csv");
            }
        }
    }

    if let Some(path) = &args.xlsx {
        match xlsx::write_report(rows, path, args.labels, args.palette) {
            Ok(count) => info!("Wrote {count} row(s) to {path:?}"),
            Err(err) => {
                error!("XLSX output failed: {err:#}");
                failures.push("xlsx");
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Failed to write {} output", failures.join(", ")))
    }
}
