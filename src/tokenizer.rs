//! Splits decoded file text into a header and positionally aligned rows.
//!
//! Fields are comma-delimited and may be wrapped in double quotes; one layer
//! of quoting and surrounding whitespace is removed from every field. Every
//! returned [`RawRow`] has exactly the header's arity: short rows are padded
//! with empty strings and surplus trailing fields are dropped.

use csv::{ReaderBuilder, StringRecord, Trim};
use log::debug;

use crate::error::{PipelineError, PipelineResult};

/// One data row. `number` is 1-based and excludes the header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub number: usize,
    pub values: Vec<String>,
}

impl RawRow {
    pub fn get(&self, idx: usize) -> &str {
        self.values.get(idx).map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenizedFile {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl TokenizedFile {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

pub fn tokenize(text: &str) -> PipelineResult<TokenizedFile> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(b',')
        .double_quote(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(text.as_bytes());

    let mut records = reader.records();
    let headers = match records.next() {
        Some(record) => record_values(&record?),
        None => return Err(PipelineError::EmptyInput),
    };
    if headers.iter().all(|h| h.is_empty()) {
        return Err(PipelineError::EmptyInput);
    }

    let arity = headers.len();
    let mut rows = Vec::new();
    for (idx, record) in records.enumerate() {
        let mut values = record_values(&record?);
        if values.len() > arity {
            debug!(
                "Row {} has {} field(s); dropping {} beyond the header",
                idx + 1,
                values.len(),
                values.len() - arity
            );
        }
        values.resize(arity, String::new());
        rows.push(RawRow {
            number: idx + 1,
            values,
        });
    }

    Ok(TokenizedFile { headers, rows })
}

fn record_values(record: &StringRecord) -> Vec<String> {
    record.iter().map(clean_field).collect()
}

/// The reader only unquotes a field whose opening quote is its first byte.
/// A quote preceded by whitespace is left literal, so that layer is removed
/// here; already-unquoted values keep any quotes they contain.
fn clean_field(field: &str) -> String {
    let trimmed = field.trim();
    if !field.starts_with(char::is_whitespace) {
        return trimmed.to_string();
    }
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.trim().to_string()
}
