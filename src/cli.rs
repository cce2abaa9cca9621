use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::{config::DEFAULT_MAX_FILE_BYTES, duplicates::DuplicatePolicy};

#[derive(Debug, Parser)]
#[command(author, version, about = "Import client records from CSV files", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show each column with its sample value and the field it maps to
    Columns(ColumnsArgs),
    /// Validate, de-duplicate and import client rows from a CSV file
    Import(ImportArgs),
    /// Write a sample CSV with the expected columns
    Template(TemplateArgs),
}

#[derive(Debug, Args)]
pub struct ColumnsArgs {
    /// Input CSV file to inspect ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Mapping override of the form `Column=field` (repeatable)
    #[arg(long = "map", action = clap::ArgAction::Append)]
    pub map: Vec<String>,
    /// YAML or JSON file mapping column names to fields
    #[arg(long = "mapping")]
    pub mapping: Option<PathBuf>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Reject inputs larger than this many bytes
    #[arg(long = "max-file-bytes", default_value_t = DEFAULT_MAX_FILE_BYTES)]
    pub max_file_bytes: u64,
}

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// Input CSV file to import ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// CSV of existing clients with `id` and `email` columns
    #[arg(short = 'e', long = "existing")]
    pub existing: Option<PathBuf>,
    /// What to do when a row's email matches an existing client
    #[arg(short = 'p', long = "policy", value_enum)]
    pub policy: Option<DuplicatePolicy>,
    /// Mapping override of the form `Column=field` (repeatable)
    #[arg(long = "map", action = clap::ArgAction::Append)]
    pub map: Vec<String>,
    /// YAML or JSON file mapping column names to fields
    #[arg(long = "mapping")]
    pub mapping: Option<PathBuf>,
    /// YAML settings file (limits, encoding, default policy)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
    /// Write the resulting client list as CSV ('-' for stdout)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Write the full import report as JSON
    #[arg(short = 'r', long = "report")]
    pub report: Option<PathBuf>,
    /// Number of row errors to print (0 = all); the JSON report is never truncated
    #[arg(long = "max-errors", default_value_t = 10)]
    pub max_errors: usize,
    /// Character encoding of the input file (overrides the settings file)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Reject inputs larger than this many bytes (overrides the settings file)
    #[arg(long = "max-file-bytes")]
    pub max_file_bytes: Option<u64>,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    /// Destination file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}
