//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "prowl",
    version,
    about = "Collect launch listings, check their websites and enrich them with funding data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Answer every prompt with its default
    #[arg(short = 'y', long, global = true)]
    pub yes: bool,

    /// Spreadsheet to write (.xlsx or .csv)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Show the browser window for every browser session
    #[arg(long, global = true)]
    pub headful: bool,

    #[command(flatten)]
    pub collect: CollectArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect fresh listings, replacing the spreadsheet
    Collect(CollectArgs),
    /// Enrich the records of an existing spreadsheet
    Enrich(EnrichArgs),
    /// Show the configuration file location and effective values
    Config,
}

#[derive(Debug, Clone, Default, Args)]
pub struct CollectArgs {
    /// How many years back to collect
    #[arg(long, value_name = "N")]
    pub years: Option<u32>,

    /// Comma separated words; products whose name contains one are skipped
    #[arg(long, value_name = "WORDS")]
    pub blacklist: Option<String>,

    /// Skip products with more makers than this
    #[arg(long, value_name = "N")]
    pub max_makers: Option<u32>,

    /// Stop after this many products
    #[arg(long, value_name = "N")]
    pub max_products: Option<usize>,

    /// Discovery API developer token (saved config and PROWL_TOKEN otherwise)
    #[arg(long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Continue with enrichment without asking
    #[arg(long)]
    pub enrich: bool,

    /// Stop after the first export without asking
    #[arg(long, conflicts_with = "enrich")]
    pub no_enrich: bool,

    #[command(flatten)]
    pub session: EnrichArgs,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EnrichArgs {
    /// Reuse the saved browser session instead of opening the login page
    #[arg(long)]
    pub skip_login: bool,
}
