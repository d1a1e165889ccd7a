use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::{report::HeaderLanguage, resolve::TableSide, xlsx::DeltaPalette};

#[derive(Debug, Parser)]
#[command(author, version, about = "Compare two wholesale price lists and report price changes", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare an old and a new price list and report per-item deltas
    Compare(CompareArgs),
    /// Show which column of a price list is used for each role
    Columns(ColumnsArgs),
    /// Write the built-in column rules as a YAML template
    Rules(RulesArgs),
}

#[derive(Debug, Args)]
pub struct CompareArgs {
    /// Old price list (CSV, TSV, XLSX, XLS, ODS)
    #[arg(long = "old")]
    pub old: PathBuf,
    /// New price list (CSV, TSV, XLSX, XLS, ODS)
    #[arg(long = "new")]
    pub new: PathBuf,
    /// Sheet to read from the old workbook (defaults to the first sheet)
    #[arg(long = "old-sheet")]
    pub old_sheet: Option<String>,
    /// Sheet to read from the new workbook (defaults to the first sheet)
    #[arg(long = "new-sheet")]
    pub new_sheet: Option<String>,
    /// CSV output file ('-' for stdout; stdout when no other output is requested)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Styled XLSX report destination
    #[arg(long = "xlsx")]
    pub xlsx: Option<PathBuf>,
    /// Print an aligned text report to stdout
    #[arg(long = "table")]
    pub table: bool,
    /// Transliterate Greek text in the text report
    #[arg(long = "ascii")]
    pub ascii: bool,
    /// Include rows whose price did not change
    #[arg(long = "all")]
    pub all: bool,
    /// Keep the new list's row order instead of sorting by largest change
    #[arg(long = "keep-order")]
    pub keep_order: bool,
    /// Language of the result headers
    #[arg(long = "labels", value_enum, default_value = "el")]
    pub labels: HeaderLanguage,
    /// Colouring of the difference column in the XLSX report
    #[arg(long = "palette", value_enum, default_value = "increase-is-bad")]
    pub palette: DeltaPalette,
    /// YAML file overriding the built-in column rules
    #[arg(long = "rules")]
    pub rules: Option<PathBuf>,
    /// CSV delimiter character for inputs (auto-detected when omitted)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter for the CSV output
    #[arg(long = "output-delimiter", value_parser = parse_delimiter, default_value = ",")]
    pub output_delimiter: u8,
    /// Character encoding of CSV inputs (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the CSV output (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
#[value(rename_all = "kebab-case")]
pub enum SideArg {
    Old,
    New,
}

impl From<SideArg> for TableSide {
    fn from(value: SideArg) -> Self {
        match value {
            SideArg::Old => TableSide::Old,
            SideArg::New => TableSide::New,
        }
    }
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Price list to inspect
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Whether the file plays the old or the new price list
    #[arg(long = "side", value_enum, default_value = "new")]
    pub side: SideArg,
    /// Sheet to read from a workbook (defaults to the first sheet)
    #[arg(long = "sheet")]
    pub sheet: Option<String>,
    /// YAML file overriding the built-in column rules
    #[arg(long = "rules")]
    pub rules: Option<PathBuf>,
    /// CSV delimiter character (auto-detected when omitted)
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of a CSV input (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Destination YAML file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_delimiter_accepts_names_and_single_ascii_chars() {
        assert_eq!(parse_delimiter("semicolon"), Ok(b';'));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("#"), Ok(b'#'));
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("·").is_err());
    }

    #[test]
    fn compare_args_parse_with_defaults() {
        let cli = Cli::parse_from(["price-delta", "compare", "--old", "a.csv", "--new", "b.xlsx"]);
        match cli.command {
            Commands::Compare(args) => {
                assert_eq!(args.labels, HeaderLanguage::Greek);
                assert_eq!(args.palette, DeltaPalette::IncreaseIsBad);
                assert_eq!(args.output_delimiter, b',');
                assert!(!args.all);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
