pub mod cache;
pub mod cli;
pub mod columns;
pub mod compare;
pub mod config;
pub mod data;
pub mod error;
pub mod io_utils;
pub mod normalize;
pub mod reconcile;
pub mod report;
pub mod resolve;
pub mod table;
pub mod text;
pub mod xlsx;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, info};

use crate::{
    cli::{Cli, Commands},
    resolve::RuleSet,
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("price_delta", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Compare(args) => compare::execute(&args),
        Commands::Columns(args) => columns::execute(&args),
        Commands::Rules(args) => handle_rules(&args),
    }
}

fn handle_rules(args: &cli::RulesArgs) -> Result<()> {
    let rules = RuleSet::default();
    match &args.output {
        Some(path) if !io_utils::is_dash(path) => {
            config::save_rules(path, &rules)
                .with_context(|| format!("Writing column rules to {path:?}"))?;
            info!("Built-in column rules written to {path:?}");
        }
        _ => print!("{}", config::rules_to_string(&rules)?),
    }
    Ok(())
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
