//! The `import` command: settings layering, snapshot loading, running the
//! pipeline against an in-memory store and writing its outputs.

use anyhow::{Context, Result, bail};
use chrono::Utc;
use log::{debug, info, warn};

use crate::{
    cli::ImportArgs,
    config::ImportSettings,
    io_utils, mapping,
    pipeline::{BatchReport, CancellationToken, ImportProgress, Importer},
    report::ImportResult,
    store::{InMemoryClientStore, KnownClients},
};

const PROGRESS_LOG_INTERVAL: usize = 1_000;

pub fn execute(args: &ImportArgs) -> Result<()> {
    let settings = resolve_settings(args)?;
    let importer = Importer::new(settings)?;
    let overrides = mapping::collect_overrides(&args.map, args.mapping.as_deref())?;
    let known = match &args.existing {
        Some(path) => KnownClients::load_csv(path)
            .with_context(|| format!("Loading existing clients from {path:?}"))?,
        None => KnownClients::new(),
    };
    let mut store = InMemoryClientStore::from_known(&known);
    let seeded = store.len();

    info!(
        "Importing '{}' against {} known client(s)",
        args.input.display(),
        known.len()
    );
    let started_at = Utc::now();
    let report = match io_utils::read_input(&args.input, importer.settings().max_file_bytes) {
        Ok(payload) => importer.run(
            &payload,
            &overrides,
            &known,
            &mut store,
            log_progress,
            &CancellationToken::new(),
        ),
        Err(err) => {
            warn!("Import aborted before processing rows: {err}");
            BatchReport {
                result: ImportResult::from_batch_error(&err, started_at),
                outcomes: Vec::new(),
            }
        }
    };
    let result = report.result;

    if let Some(path) = &args.report {
        result
            .save_json(path)
            .with_context(|| format!("Writing report to {path:?}"))?;
        info!("Import report written to {:?}", path);
    }
    if !result.success {
        let reason = result
            .errors
            .first()
            .map(|e| e.message.clone())
            .unwrap_or_default();
        bail!("Import of {:?} failed: {reason}", args.input);
    }

    if let Some(path) = &args.output {
        store
            .write_csv(Some(path))
            .with_context(|| format!("Writing clients to {path:?}"))?;
        info!(
            "{} client(s) ({} new) written to {}",
            store.len(),
            store.len() - seeded,
            io_utils::describe_destination(Some(path))
        );
    }

    print!("{}", result.render_summary());
    if !result.errors.is_empty() {
        println!();
        print!("{}", result.render_errors(args.max_errors));
    }
    if result.is_partial() {
        warn!(
            "Only {} of {} row(s) were processed",
            result.processed_rows, result.total_rows
        );
    }
    Ok(())
}

fn resolve_settings(args: &ImportArgs) -> Result<ImportSettings> {
    let mut settings = match &args.config {
        Some(path) => ImportSettings::load(path)?,
        None => ImportSettings::default(),
    };
    if let Some(policy) = args.policy {
        settings.duplicate_policy = policy;
    }
    if let Some(label) = &args.input_encoding {
        settings.encoding = label.clone();
    }
    if let Some(limit) = args.max_file_bytes {
        settings.max_file_bytes = limit;
    }
    debug!("Effective settings: {:?}", settings);
    Ok(settings)
}

fn log_progress(progress: ImportProgress) {
    if progress.processed % PROGRESS_LOG_INTERVAL == 0 || progress.processed == progress.total {
        info!("Processed {}/{} row(s)", progress.processed, progress.total);
    } else {
        debug!("Processed {}/{} row(s)", progress.processed, progress.total);
    }
}
