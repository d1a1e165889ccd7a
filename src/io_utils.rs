//! Loading price lists into [`RawTable`]s and writing encoded output.
//!
//! - **Workbooks** (`.xlsx`, `.xlsm`, `.xls`, `.xlsb`, `.ods`) are read with
//!   `calamine`; the first sheet is used unless a sheet name is given.
//! - **Delimited text** is read with `csv`. The delimiter comes from the
//!   caller, the extension (`.tsv` → tab), or a look at the header line
//!   (`;` wins over `,` when it is more frequent, as Excel exports in Greek
//!   locales use it).
//! - **Encoding**: input decoding and output transcoding via `encoding_rs`,
//!   defaulting to UTF-8. A UTF-8 byte order mark is dropped.
//!
//! The first row is always the header row. Rows with no content at all are
//! skipped.

use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use calamine::{Data, Reader, open_workbook_auto};
use encoding_rs::{Encoding, UTF_8};
use log::{debug, info};

use crate::data::{Cell, RawTable};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

const WORKBOOK_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "xlsb", "ods"];

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub sheet: Option<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            encoding: UTF_8,
            sheet: None,
        }
    }
}

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn is_workbook(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            WORKBOOK_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
        .unwrap_or(false)
}

/// Picks the delimiter for a text input: explicit value, then extension, then
/// whichever of `;` and `,` occurs more often in the header line.
pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>, header_line: &[u8]) -> u8 {
    if let Some(delimiter) = provided {
        return delimiter;
    }
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => {
            let count = |needle: u8| header_line.iter().filter(|b| **b == needle).count();
            if count(b';') > count(b',') {
                b';'
            } else {
                DEFAULT_CSV_DELIMITER
            }
        }
    }
}

pub fn load_table(path: &Path, options: &LoadOptions) -> Result<RawTable> {
    let table = if is_workbook(path) {
        load_workbook(path, options.sheet.as_deref())?
    } else {
        load_delimited(path, options.delimiter, options.encoding)?
    };
    info!(
        "Loaded {} row(s) x {} column(s) from {:?}",
        table.row_count(),
        table.columns.len(),
        path
    );
    Ok(table)
}

fn load_delimited(
    path: &Path,
    delimiter: Option<u8>,
    encoding: &'static Encoding,
) -> Result<RawTable> {
    let bytes = fs::read(path).with_context(|| format!("Opening input file {path:?}"))?;
    let header_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let delimiter = resolve_input_delimiter(path, delimiter, header_line);
    debug!("Reading {path:?} with delimiter {:?}", delimiter as char);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true)
        .from_reader(bytes.as_slice());

    let header_record = reader.byte_headers()?.clone();
    let headers = decode_record(&header_record, encoding)
        .with_context(|| format!("Decoding headers of {path:?}"))?;
    let mut rows = Vec::new();
    for (row_idx, record) in reader.byte_records().enumerate() {
        let record = record.with_context(|| format!("Reading row {}", row_idx + 2))?;
        let decoded = decode_record(&record, encoding)
            .with_context(|| format!("Decoding row {} of {path:?}", row_idx + 2))?;
        if decoded.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(decoded.iter().map(|field| Cell::from_field(field)).collect());
    }
    Ok(RawTable::from_rows(headers, rows))
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<RawTable> {
    let mut workbook =
        open_workbook_auto(path).with_context(|| format!("Opening workbook {path:?}"))?;
    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("Workbook {path:?} contains no sheets"))?,
    };
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("Reading sheet '{sheet_name}' of {path:?}"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|cell| data_to_cell(cell).as_display()).collect(),
        None => Vec::new(),
    };
    let body = rows
        .map(|row| row.iter().map(data_to_cell).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(Cell::is_empty))
        .collect();
    Ok(RawTable::from_rows(headers, body))
}

fn data_to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::from_field(s),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from_field(s),
    }
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

/// Writes `text` to `path` (stdout for `None` or `-`), transcoding from UTF-8
/// when another encoding is requested.
pub fn write_encoded(path: Option<&Path>, text: &str, encoding: &'static Encoding) -> Result<()> {
    let bytes: Vec<u8> = if encoding == UTF_8 {
        text.as_bytes().to_vec()
    } else {
        let (encoded, _, had_errors) = encoding.encode(text);
        if had_errors {
            return Err(anyhow!(
                "Output contains characters that cannot be encoded as {}",
                encoding.name()
            ));
        }
        encoded.into_owned()
    };
    match path {
        Some(p) if !is_dash(p) => {
            let mut file =
                File::create(p).with_context(|| format!("Creating output file {p:?}"))?;
            file.write_all(&bytes)?;
            file.flush()?;
        }
        _ => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn delimiter_prefers_explicit_then_extension_then_header() {
        let csv = PathBuf::from("prices.csv");
        assert_eq!(resolve_input_delimiter(&csv, Some(b'|'), b"a;b"), b'|');
        assert_eq!(resolve_input_delimiter(&PathBuf::from("p.tsv"), None, b"a;b;c"), b'\t');
        assert_eq!(resolve_input_delimiter(&csv, None, b"a;b;c,d"), b';');
        assert_eq!(resolve_input_delimiter(&csv, None, b"a,b"), b',');
    }

    #[test]
    fn workbook_detection_is_case_insensitive() {
        assert!(is_workbook(Path::new("old.XLSX")));
        assert!(is_workbook(Path::new("old.ods")));
        assert!(!is_workbook(Path::new("old.csv")));
        assert!(!is_workbook(Path::new("old")));
    }

    #[test]
    fn decode_bytes_drops_utf8_bom() {
        let decoded = decode_bytes(b"\xEF\xBB\xBFBarcode", UTF_8).expect("decode");
        assert_eq!(decoded, "Barcode");
    }

    #[test]
    fn data_to_cell_maps_calamine_values() {
        assert_eq!(data_to_cell(&Data::Int(7)), Cell::Number(7.0));
        assert_eq!(data_to_cell(&Data::String(String::new())), Cell::Empty);
        assert_eq!(
            data_to_cell(&Data::String("x".into())),
            Cell::Text("x".into())
        );
    }
}
