//! The batch executor.
//!
//! Rows are processed strictly in source order, one at a time: normalize,
//! validate, resolve duplicates, commit. Each row ends in exactly one
//! [`RowOutcome`]; a failing row never stops the batch. Cancellation is only
//! observed between rows.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use chrono::Utc;
use encoding_rs::Encoding;
use log::{debug, info, warn};

use crate::{
    client::normalize_row,
    columns::{ColumnDescriptor, profile_columns},
    config::ImportSettings,
    duplicates::{DuplicatePolicy, DuplicateResolver},
    error::PipelineResult,
    io_utils,
    mapping::{self, FieldMapping},
    report::{ImportError, ImportResult, ResultAggregator, RowOutcome},
    store::{ClientStore, CommitDecision, KnownClients},
    tokenizer::{self, RawRow, TokenizedFile},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportProgress {
    pub processed: usize,
    pub total: usize,
}

pub trait ProgressSink {
    fn on_progress(&mut self, progress: ImportProgress);
}

impl<F: FnMut(ImportProgress)> ProgressSink for F {
    fn on_progress(&mut self, progress: ImportProgress) {
        self(progress)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_progress(&mut self, _progress: ImportProgress) {}
}

#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A tokenized file with its resolved mapping, ready to execute.
#[derive(Debug, Clone)]
pub struct PreparedImport {
    pub file: TokenizedFile,
    pub columns: Vec<ColumnDescriptor>,
    pub proposal: FieldMapping,
    pub mapping: FieldMapping,
}

impl PreparedImport {
    pub fn from_text(text: &str, overrides: &FieldMapping) -> PipelineResult<Self> {
        let file = tokenizer::tokenize(text)?;
        let columns = profile_columns(&file);
        let proposal = mapping::auto_map(&file.headers);
        let mapping = mapping::resolve_mapping(&proposal, overrides);
        Ok(Self {
            file,
            columns,
            proposal,
            mapping,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub result: ImportResult,
    /// One entry per processed row, in source order.
    pub outcomes: Vec<RowOutcome>,
}

#[derive(Debug, Clone)]
pub struct Importer {
    settings: ImportSettings,
    encoding: &'static Encoding,
}

impl Importer {
    pub fn new(settings: ImportSettings) -> anyhow::Result<Self> {
        settings.ensure_valid()?;
        let encoding = io_utils::resolve_encoding(Some(settings.encoding.as_str()))?;
        Ok(Self { settings, encoding })
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    /// Size check, decoding, tokenizing and mapping. Any error here is
    /// batch-level.
    pub fn prepare(&self, payload: &[u8], overrides: &FieldMapping) -> PipelineResult<PreparedImport> {
        let bytes = io_utils::read_bounded(payload, self.settings.max_file_bytes)?;
        let text = io_utils::decode_bytes(&bytes, self.encoding)?;
        PreparedImport::from_text(&text, overrides)
    }

    /// Runs the whole pipeline. Batch-level failures become a report with
    /// `success == false`.
    pub fn run<S, P>(
        &self,
        payload: &[u8],
        overrides: &FieldMapping,
        known: &KnownClients,
        store: S,
        progress: P,
        cancel: &CancellationToken,
    ) -> BatchReport
    where
        S: ClientStore,
        P: ProgressSink,
    {
        let started_at = Utc::now();
        match self.prepare(payload, overrides) {
            Ok(prepared) => self.execute(&prepared, known, store, progress, cancel),
            Err(err) => {
                warn!("Import aborted before processing rows: {err}");
                BatchReport {
                    result: ImportResult::from_batch_error(&err, started_at),
                    outcomes: Vec::new(),
                }
            }
        }
    }

    pub fn execute<S, P>(
        &self,
        prepared: &PreparedImport,
        known: &KnownClients,
        mut store: S,
        mut progress: P,
        cancel: &CancellationToken,
    ) -> BatchReport
    where
        S: ClientStore,
        P: ProgressSink,
    {
        let policy = self.settings.duplicate_policy;
        let total = prepared.file.row_count();
        info!(
            "Importing {} row(s) across {} column(s) with duplicate policy '{:?}'",
            total,
            prepared.file.headers.len(),
            policy
        );

        let mut resolver = DuplicateResolver::new(known, policy);
        let mut aggregator = ResultAggregator::new(total, Utc::now());
        let mut outcomes = Vec::with_capacity(total);
        let mut cancelled = false;

        for row in &prepared.file.rows {
            if cancel.is_cancelled() {
                warn!(
                    "Import cancelled after {} of {} row(s); result is partial",
                    aggregator.processed_rows(),
                    total
                );
                cancelled = true;
                break;
            }
            let outcome = self.process_row(row, prepared, &mut resolver, &mut store, &mut aggregator);
            aggregator.record(&outcome);
            progress.on_progress(ImportProgress {
                processed: aggregator.processed_rows(),
                total,
            });
            outcomes.push(outcome);
        }

        let result = aggregator.finish(cancelled);
        info!(
            "Import finished: {} imported, {} updated, {} skipped, {} failed ({} error(s), {} duplicate(s))",
            result.imported,
            result.updated,
            result.skipped,
            result.failed,
            result.errors.len(),
            result.duplicates.len()
        );
        BatchReport { result, outcomes }
    }

    fn process_row<S: ClientStore>(
        &self,
        row: &RawRow,
        prepared: &PreparedImport,
        resolver: &mut DuplicateResolver<'_>,
        store: &mut S,
        aggregator: &mut ResultAggregator,
    ) -> RowOutcome {
        let client = match normalize_row(
            row,
            &prepared.file.headers,
            &prepared.mapping,
            &self.settings.field_limits,
        ) {
            Ok(client) => client,
            Err(errors) => {
                debug!("Row {} failed validation: {:?}", row.number, errors);
                return RowOutcome::Failed(errors);
            }
        };

        let resolution = resolver.resolve(&client.email);
        let outcome = match resolution.commit_decision() {
            None => RowOutcome::Skipped,
            Some(decision) => match store.commit(&client, decision) {
                Ok(id) => match decision {
                    CommitDecision::Create => {
                        resolver.record_created(&client.email, id);
                        RowOutcome::Created(id)
                    }
                    CommitDecision::Update(_) => RowOutcome::Updated(id),
                },
                Err(err) => {
                    debug!("Row {} was not committed: {err}", row.number);
                    RowOutcome::Failed(vec![ImportError::new(row.number, "store", err.to_string())])
                }
            },
        };

        if let Some(existing) = resolution.reported_duplicate() {
            if !matches!(outcome, RowOutcome::Failed(_)) {
                debug!(
                    "Row {} duplicates client {} ({})",
                    row.number, existing, client.email
                );
                aggregator.record_duplicate(&client.email, row.number, existing);
            }
        }
        outcome
    }
}

impl Default for Importer {
    fn default() -> Self {
        Self {
            settings: ImportSettings::default(),
            encoding: encoding_rs::UTF_8,
        }
    }
}

/// Convenience entry point with default settings and the given policy.
pub fn import_text<S: ClientStore>(
    text: &str,
    overrides: &FieldMapping,
    policy: DuplicatePolicy,
    known: &KnownClients,
    store: S,
) -> BatchReport {
    let importer = Importer {
        settings: ImportSettings {
            duplicate_policy: policy,
            ..ImportSettings::default()
        },
        encoding: encoding_rs::UTF_8,
    };
    importer.run(
        text.as_bytes(),
        overrides,
        known,
        store,
        NoProgress,
        &CancellationToken::new(),
    )
}
