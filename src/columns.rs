//! Column resolution report for a single price list.
//!
//! Resolves every role for the chosen side and renders the outcome as an
//! aligned table, so a user can see why a file is or is not accepted before
//! running a comparison.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::ColumnsArgs,
    config,
    data::RawTable,
    io_utils::{self, LoadOptions},
    resolve::{ColumnRole, RuleSet, TableSide, resolve_role},
    table::{self, Align},
};

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let rules = config::rules_or_default(args.rules.as_deref())?;
    let table = io_utils::load_table(
        &args.input,
        &LoadOptions {
            delimiter: args.delimiter,
            encoding,
            sheet: args.sheet.clone(),
        },
    )
    .with_context(|| format!("Loading {:?}", args.input))?;

    let side = TableSide::from(args.side);
    let (headers, rows) = resolution_rows(&table, side, &rules);
    table::print_table(&headers, &rows, &[Align::Left]);

    let missing = rows.iter().filter(|row| row[2] == MISSING).count();
    info!(
        "Resolved {} of {} role(s) for the {side}",
        rows.len() - missing,
        rows.len()
    );
    Ok(())
}

const MISSING: &str = "MISSING";

/// One row per role: role, column label, status, strategy.
pub fn resolution_rows(
    table: &RawTable,
    side: TableSide,
    rules: &RuleSet,
) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = ["role", "column", "status", "matched by"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows = side
        .roles()
        .iter()
        .map(|role| describe_role(table, side, *role, rules))
        .collect();
    (headers, rows)
}

fn describe_role(table: &RawTable, side: TableSide, role: ColumnRole, rules: &RuleSet) -> Vec<String> {
    match resolve_role(table, side, role, rules) {
        Some(column) => vec![
            role.to_string(),
            column.label,
            "ok".to_string(),
            column.resolved_by.to_string(),
        ],
        None => {
            let status = if role.is_mandatory() { MISSING } else { "absent" };
            vec![
                role.to_string(),
                String::new(),
                status.to_string(),
                format!("expected {}", rules.for_role(role).describe()),
            ]
        }
    }
}
