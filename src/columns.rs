//! Column profiling and the `columns` command.
//!
//! Pairs each header with the first data row's value and renders the
//! resolved mapping so unmapped columns can be corrected before importing.

use anyhow::{Context, Result};
use itertools::Itertools;
use log::{info, warn};
use serde::Serialize;

use crate::{
    cli::ColumnsArgs,
    io_utils,
    mapping::{self, CanonicalField, FieldMapping},
    table,
    tokenizer::{self, TokenizedFile},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnDescriptor {
    pub name: String,
    pub sample_value: String,
}

/// One descriptor per header cell; samples come from the first data row only.
pub fn profile_columns(file: &TokenizedFile) -> Vec<ColumnDescriptor> {
    let first = file.rows.first();
    file.headers
        .iter()
        .enumerate()
        .map(|(idx, name)| ColumnDescriptor {
            name: name.clone(),
            sample_value: first.map(|row| row.get(idx).to_string()).unwrap_or_default(),
        })
        .collect()
}

pub fn render_columns(columns: &[ColumnDescriptor], mapping: &FieldMapping) -> String {
    let headers = vec![
        "#".to_string(),
        "column".to_string(),
        "sample".to_string(),
        "field".to_string(),
    ];
    let rows = columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            vec![
                (idx + 1).to_string(),
                column.name.clone(),
                column.sample_value.clone(),
                mapping.field_for(&column.name).to_string(),
            ]
        })
        .collect::<Vec<_>>();
    table::render_table(&headers, &rows)
}

pub fn execute(args: &ColumnsArgs) -> Result<()> {
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let bytes = io_utils::read_input(&args.input, args.max_file_bytes)
        .with_context(|| format!("Reading {:?}", args.input))?;
    let text = io_utils::decode_bytes(&bytes, encoding)?;
    let file = tokenizer::tokenize(&text).with_context(|| format!("Tokenizing {:?}", args.input))?;

    let overrides = mapping::collect_overrides(&args.map, args.mapping.as_deref())?;
    let resolved = mapping::resolve_mapping(&mapping::auto_map(&file.headers), &overrides);
    let columns = profile_columns(&file);

    print!("{}", render_columns(&columns, &resolved));
    let ignored = resolved.ignored_columns(&file.headers);
    if !ignored.is_empty() {
        warn!(
            "{} column(s) will be ignored: {}. Map them with --map 'Column=<{}>'",
            ignored.len(),
            ignored.iter().join(", "),
            CanonicalField::ALL.iter().join("|")
        );
    }
    info!(
        "Profiled {} column(s) across {} data row(s) in {:?}",
        columns.len(),
        file.row_count(),
        args.input
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_come_from_the_first_row() {
        let file = tokenizer::tokenize("Name,Email,Tags\nAda,ada@example.com\nBob,b@x.io,z\n")
            .unwrap();
        let columns = profile_columns(&file);
        assert_eq!(columns.len(), 3);
        assert_eq!(columns[0].sample_value, "Ada");
        assert_eq!(columns[2].sample_value, "");
    }

    #[test]
    fn header_only_files_have_empty_samples() {
        let file = tokenizer::tokenize("Name,Email\n").unwrap();
        let columns = profile_columns(&file);
        assert!(columns.iter().all(|c| c.sample_value.is_empty()));
    }

    #[test]
    fn rendered_table_lists_resolved_fields() {
        let file = tokenizer::tokenize("Company Name,Cell\nAcme,555\n").unwrap();
        let mapping = mapping::auto_map(&file.headers);
        let rendered = render_columns(&profile_columns(&file), &mapping);
        assert!(rendered.contains("company"));
        assert!(rendered.contains("phone"));
    }
}
