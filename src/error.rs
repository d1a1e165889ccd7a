use thiserror::Error;

use crate::resolve::{ColumnRole, TableSide};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceDeltaError {
    /// A mandatory role has no matching column in one of the tables.
    #[error("{side}: no column found for the {role} (expected {expected})")]
    MissingColumn {
        side: TableSide,
        role: ColumnRole,
        expected: String,
    },
    #[error("{side}: the table has no header row")]
    EmptyTable { side: TableSide },
    #[error("invalid column rules: {0}")]
    InvalidRules(String),
}

pub type Result<T> = std::result::Result<T, PriceDeltaError>;
