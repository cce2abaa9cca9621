//! Import outcomes, the aggregated [`ImportResult`] and its rendering.

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::PipelineError, io_utils, store::ClientId, table};

/// Row used for errors that concern the whole file rather than one row.
pub const FILE_SCOPE_ROW: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    /// 1-based data row; [`FILE_SCOPE_ROW`] for batch-level errors.
    pub row: usize,
    pub field: String,
    pub message: String,
}

impl ImportError {
    pub fn new(row: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row,
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateEntry {
    pub email: String,
    pub row: usize,
    /// The client the row's email matched.
    pub existing_id: ClientId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Created(ClientId),
    Updated(ClientId),
    Skipped,
    Failed(Vec<ImportError>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    /// True when the batch ran to completion (or was cancelled between rows),
    /// regardless of row failures.
    pub success: bool,
    pub imported: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    pub total_rows: usize,
    pub processed_rows: usize,
    pub cancelled: bool,
    pub errors: Vec<ImportError>,
    pub duplicates: Vec<DuplicateEntry>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ImportResult {
    pub fn from_batch_error(error: &PipelineError, started_at: DateTime<Utc>) -> Self {
        Self {
            success: false,
            imported: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            total_rows: 0,
            processed_rows: 0,
            cancelled: false,
            errors: vec![ImportError::new(FILE_SCOPE_ROW, "file", error.to_string())],
            duplicates: Vec::new(),
            started_at,
            finished_at: Utc::now(),
        }
    }

    /// True when some rows were never processed.
    pub fn is_partial(&self) -> bool {
        self.processed_rows < self.total_rows
    }

    pub fn save_json(&self, path: &Path) -> Result<()> {
        let mut writer = io_utils::open_output(Some(path))?;
        serde_json::to_writer_pretty(&mut writer, self).context("Writing import report JSON")?;
        writeln!(writer).context("Writing import report JSON")?;
        writer.flush().context("Flushing import report")
    }

    pub fn render_summary(&self) -> String {
        let headers = vec!["metric".to_string(), "count".to_string()];
        let rows = [
            ("rows", self.total_rows),
            ("processed", self.processed_rows),
            ("imported", self.imported),
            ("updated", self.updated),
            ("skipped", self.skipped),
            ("failed", self.failed),
            ("duplicates", self.duplicates.len()),
        ]
        .into_iter()
        .map(|(label, count)| vec![label.to_string(), count.to_string()])
        .collect::<Vec<_>>();
        table::render_table(&headers, &rows)
    }

    /// Renders at most `limit` errors (0 = all), noting how many were left out.
    pub fn render_errors(&self, limit: usize) -> String {
        let shown = if limit == 0 {
            self.errors.len()
        } else {
            limit.min(self.errors.len())
        };
        let headers = vec!["row".to_string(), "field".to_string(), "message".to_string()];
        let rows = self.errors[..shown]
            .iter()
            .map(|e| vec![e.row.to_string(), e.field.clone(), e.message.clone()])
            .collect::<Vec<_>>();
        let mut rendered = table::render_table(&headers, &rows);
        let hidden = self.errors.len() - shown;
        if hidden > 0 {
            rendered.push_str(&format!("... and {hidden} more error(s)\n"));
        }
        rendered
    }
}

/// Folds row outcomes into counts. Outcomes must arrive in source order.
#[derive(Debug)]
pub struct ResultAggregator {
    total_rows: usize,
    processed_rows: usize,
    imported: usize,
    updated: usize,
    skipped: usize,
    failed: usize,
    errors: Vec<ImportError>,
    duplicates: Vec<DuplicateEntry>,
    started_at: DateTime<Utc>,
}

impl ResultAggregator {
    pub fn new(total_rows: usize, started_at: DateTime<Utc>) -> Self {
        Self {
            total_rows,
            processed_rows: 0,
            imported: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            errors: Vec::new(),
            duplicates: Vec::new(),
            started_at,
        }
    }

    pub fn record_duplicate(&mut self, email: &str, row: usize, existing_id: ClientId) {
        self.duplicates.push(DuplicateEntry {
            email: email.to_string(),
            row,
            existing_id,
        });
    }

    pub fn record(&mut self, outcome: &RowOutcome) {
        self.processed_rows += 1;
        match outcome {
            RowOutcome::Created(_) => self.imported += 1,
            RowOutcome::Updated(_) => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed(errors) => {
                self.failed += 1;
                self.errors.extend(errors.iter().cloned());
            }
        }
    }

    pub fn processed_rows(&self) -> usize {
        self.processed_rows
    }

    pub fn finish(self, cancelled: bool) -> ImportResult {
        ImportResult {
            success: true,
            imported: self.imported,
            updated: self.updated,
            skipped: self.skipped,
            failed: self.failed,
            total_rows: self.total_rows,
            processed_rows: self.processed_rows,
            cancelled,
            errors: self.errors,
            duplicates: self.duplicates,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregator_tallies_each_outcome() {
        let mut aggregator = ResultAggregator::new(4, Utc::now());
        aggregator.record(&RowOutcome::Created(ClientId::new()));
        aggregator.record(&RowOutcome::Updated(ClientId::new()));
        aggregator.record(&RowOutcome::Skipped);
        aggregator.record(&RowOutcome::Failed(vec![
            ImportError::new(4, "name", "Name is required"),
            ImportError::new(4, "email", "Email is required"),
        ]));
        let existing = ClientId::new();
        aggregator.record_duplicate("a@example.com", 3, existing);
        let result = aggregator.finish(false);

        assert!(result.success);
        assert_eq!(
            (result.imported, result.updated, result.skipped, result.failed),
            (1, 1, 1, 1)
        );
        assert_eq!(result.errors.len(), 2);
        assert_eq!(result.duplicates[0].existing_id, existing);
        assert!(!result.is_partial());
    }

    #[test]
    fn batch_errors_use_the_file_scope_row() {
        let result = ImportResult::from_batch_error(&PipelineError::EmptyInput, Utc::now());
        assert!(!result.success);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].row, FILE_SCOPE_ROW);
        assert_eq!(result.errors[0].field, "file");
    }

    #[test]
    fn render_errors_notes_hidden_entries() {
        let mut aggregator = ResultAggregator::new(3, Utc::now());
        for row in 1..=3 {
            aggregator.record(&RowOutcome::Failed(vec![ImportError::new(
                row,
                "email",
                "Email is required",
            )]));
        }
        let result = aggregator.finish(false);
        let rendered = result.render_errors(2);
        assert!(rendered.contains("... and 1 more error(s)"));
        assert_eq!(result.errors.len(), 3);
        assert!(!result.render_errors(0).contains("more error"));
    }

    #[test]
    fn json_uses_camel_case_keys() {
        let result = ResultAggregator::new(0, Utc::now()).finish(false);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("totalRows").is_some());
        assert!(json.get("processedRows").is_some());
        assert_eq!(json["success"], serde_json::Value::Bool(true));
    }
}
