//! Bulk client import.
//!
//! A delimited file of prospective clients flows through
//! [`tokenizer`] → [`columns`] → [`mapping`] → [`pipeline`] (which drives
//! [`client`] normalization, [`duplicates`] resolution and commits through a
//! [`store::ClientStore`]) → [`report`]. Row failures are isolated and
//! collected; only an unreadable or empty file fails the whole batch.
//!
//! ```
//! use client_import::{
//!     duplicates::DuplicatePolicy,
//!     mapping::FieldMapping,
//!     pipeline::import_text,
//!     store::{InMemoryClientStore, KnownClients},
//! };
//!
//! let mut store = InMemoryClientStore::new();
//! let report = import_text(
//!     "Full Name,Client Email\nAda Lovelace,ada@example.com\n,missing-name@example.com\n",
//!     &FieldMapping::new(),
//!     DuplicatePolicy::Skip,
//!     &KnownClients::new(),
//!     &mut store,
//! );
//! assert!(report.result.success);
//! assert_eq!(report.result.imported, 1);
//! assert_eq!(report.result.errors[0].field, "name");
//! ```

pub mod cli;
pub mod client;
pub mod columns;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod import_cmd;
pub mod io_utils;
pub mod mapping;
pub mod pipeline;
pub mod report;
pub mod store;
pub mod table;
pub mod template;
pub mod tokenizer;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::LevelFilter;

use crate::cli::{Cli, Commands};

pub use error::{PipelineError, PipelineResult};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("client_import", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Columns(args) => columns::execute(&args),
        Commands::Import(args) => import_cmd::execute(&args),
        Commands::Template(args) => template::execute(&args),
    }
}
