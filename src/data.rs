//! In-memory tabular model shared by the resolver and the reconciliation engine.
//!
//! A [`RawTable`] is column-oriented: every [`Column`] carries its free-text
//! label and a vector of [`Cell`] values. All columns of a table have the same
//! length. Labels are not required to be unique, so columns are addressed by
//! position everywhere inside the crate.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Parses a raw CSV field. Everything except the empty string is text;
    /// numeric interpretation happens later, per role.
    pub fn from_field(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// Renders the cell as text. Integral numbers are printed without a
    /// fractional part so that spreadsheet-coerced barcodes keep their digits.
    pub fn as_display(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    (*n as i64).to_string()
                } else {
                    n.to_string()
                }
            }
            Cell::Empty => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub label: String,
    pub cells: Vec<Cell>,
}

impl Column {
    /// Iterates over the non-empty cells in row order.
    pub fn non_empty(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|cell| !cell.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<Column>,
}

impl RawTable {
    /// Builds a table from a header row and data rows. Short rows are padded
    /// with [`Cell::Empty`]; cells beyond the header width are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut columns = headers
            .into_iter()
            .map(|label| Column {
                label,
                cells: Vec::with_capacity(rows.len()),
            })
            .collect::<Vec<_>>();
        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(cells.next().unwrap_or(Cell::Empty));
            }
        }
        Self { columns }
    }

    /// Convenience constructor for text-only tables, mostly used by tests.
    pub fn from_text_columns(columns: &[(&str, &[&str])]) -> Self {
        Self {
            columns: columns
                .iter()
                .map(|(label, values)| Column {
                    label: (*label).to_string(),
                    cells: values.iter().map(|v| Cell::from_field(v)).collect(),
                })
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|c| c.cells.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn cell(&self, column: usize, row: usize) -> &Cell {
        self.columns
            .get(column)
            .and_then(|c| c.cells.get(row))
            .unwrap_or(&Cell::Empty)
    }
}
