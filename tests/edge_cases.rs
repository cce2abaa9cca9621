//! Boundary conditions for the tokenizer and batch-level error handling:
//! quoting, BOMs, blank lines, alternate encodings and the empty file.

mod common;

use client_import::{
    PipelineError,
    config::ImportSettings,
    duplicates::DuplicatePolicy,
    mapping::FieldMapping,
    pipeline::{CancellationToken, Importer, NoProgress, PreparedImport, import_text},
    store::{InMemoryClientStore, KnownClients},
};

#[test]
fn quoted_fields_with_commas_and_escaped_quotes() {
    let csv = "name,email,address,notes\n\"Doe, Jane\",jane@example.com,\"1 Main St, Springfield\",\"said \"\"hi\"\"\"\n";
    let mut store = InMemoryClientStore::new();
    let report = import_text(
        csv,
        &FieldMapping::new(),
        DuplicatePolicy::Skip,
        &KnownClients::new(),
        &mut store,
    );
    assert_eq!(report.result.imported, 1);
    let jane = &store.clients()[0].client;
    assert_eq!(jane.name, "Doe, Jane");
    assert_eq!(jane.address.as_deref(), Some("1 Main St, Springfield"));
    assert_eq!(jane.notes.as_deref(), Some("said \"hi\""));
}

#[test]
fn literal_quotes_inside_a_quoted_field_are_stored() {
    let csv = "name,email,notes\nAda,ada@example.com,\"\"\"VIP\"\"\"\n";
    let mut store = InMemoryClientStore::new();
    let report = import_text(
        csv,
        &FieldMapping::new(),
        DuplicatePolicy::Skip,
        &KnownClients::new(),
        &mut store,
    );
    assert_eq!(report.result.imported, 1);
    assert_eq!(store.clients()[0].client.notes.as_deref(), Some("\"VIP\""));
}

#[test]
fn blank_lines_do_not_count_as_rows() {
    let csv = "name,email\n\nAda,ada@example.com\n\n\nBob,bob@example.com\n";
    let prepared = PreparedImport::from_text(csv, &FieldMapping::new()).unwrap();
    assert_eq!(prepared.file.row_count(), 2);
    assert_eq!(prepared.file.rows[1].number, 2);
}

#[test]
fn utf8_bom_is_not_part_of_the_first_header() {
    let importer = Importer::default();
    let prepared = importer
        .prepare(b"\xEF\xBB\xBFname,email\nAda,ada@example.com\n", &FieldMapping::new())
        .unwrap();
    assert_eq!(prepared.file.headers[0], "name");
    assert_eq!(prepared.columns[0].sample_value, "Ada");
}

#[test]
fn configured_encoding_decodes_latin1_input() {
    let importer = Importer::new(ImportSettings {
        encoding: "windows-1252".to_string(),
        ..ImportSettings::default()
    })
    .unwrap();
    let mut store = InMemoryClientStore::new();
    let report = importer.run(
        b"name,email\nRen\xE9e,renee@example.com\n",
        &FieldMapping::new(),
        &KnownClients::new(),
        &mut store,
        NoProgress,
        &CancellationToken::new(),
    );
    assert_eq!(report.result.imported, 1);
    assert_eq!(store.clients()[0].client.name, "Ren\u{e9}e");
}

#[test]
fn invalid_bytes_for_the_encoding_fail_the_batch() {
    let importer = Importer::default();
    let err = importer
        .prepare(b"name,email\nRen\xE9e,renee@example.com\n", &FieldMapping::new())
        .unwrap_err();
    assert!(matches!(err, PipelineError::Decode { .. }));
}

#[test]
fn whitespace_only_input_is_empty() {
    let err = PreparedImport::from_text("\n\n", &FieldMapping::new()).unwrap_err();
    assert!(matches!(err, PipelineError::EmptyInput));
}

#[test]
fn unknown_encoding_label_is_a_configuration_error() {
    let result = Importer::new(ImportSettings {
        encoding: "klingon".to_string(),
        ..ImportSettings::default()
    });
    assert!(result.is_err());
}

#[test]
fn control_characters_are_collapsed() {
    let csv = "name,email,notes\nAda\u{7},ada@example.com,\"line one\r\n\r\nline two\"\n";
    let mut store = InMemoryClientStore::new();
    import_text(
        csv,
        &FieldMapping::new(),
        DuplicatePolicy::Skip,
        &KnownClients::new(),
        &mut store,
    );
    let ada = &store.clients()[0].client;
    assert_eq!(ada.name, "Ada");
    assert_eq!(ada.notes.as_deref(), Some("line one line two"));
}
