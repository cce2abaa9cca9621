//! I/O utilities for reading import payloads and writing CSV/JSON output.
//!
//! - **Input**: whole-file reads bounded by the configured size ceiling. The
//!   size is checked against file metadata before any bytes are read, and
//!   stdin reads stop one byte past the limit.
//! - **Encoding**: a single input encoding resolved via `encoding_rs`,
//!   defaulting to UTF-8. A leading BOM is dropped.
//! - **stdin/stdout**: the `-` path convention routes through standard streams.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};

use crate::error::{PipelineError, PipelineResult};

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

/// Reads the whole payload, rejecting anything larger than `max_bytes`.
pub fn read_input(path: &Path, max_bytes: u64) -> PipelineResult<Vec<u8>> {
    if is_dash(path) {
        return read_bounded(io::stdin().lock(), max_bytes);
    }
    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(PipelineError::InputTooLarge {
            size,
            limit: max_bytes,
        });
    }
    read_bounded(File::open(path)?, max_bytes)
}

pub fn read_bounded<R: Read>(reader: R, max_bytes: u64) -> PipelineResult<Vec<u8>> {
    let mut buffer = Vec::new();
    reader
        .take(max_bytes.saturating_add(1))
        .read_to_end(&mut buffer)?;
    let size = buffer.len() as u64;
    if size > max_bytes {
        return Err(PipelineError::InputTooLarge {
            size,
            limit: max_bytes,
        });
    }
    Ok(buffer)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> PipelineResult<String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        Err(PipelineError::Decode {
            encoding: encoding.name().to_string(),
        })
    } else {
        Ok(text.into_owned())
    }
}

pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(io::stdout()),
    };
    Ok(writer)
}

pub fn open_csv_writer(path: Option<&Path>) -> Result<csv::Writer<Box<dyn Write>>> {
    let base = open_output(path)?;
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b',')
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    Ok(builder.from_writer(base))
}

pub fn describe_destination(path: Option<&Path>) -> String {
    match path {
        Some(p) if !is_dash(p) => p.display().to_string(),
        _ => "stdout".to_string(),
    }
}
