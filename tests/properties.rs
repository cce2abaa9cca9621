mod common;

use client_import::{
    duplicates::DuplicatePolicy,
    mapping::{CanonicalField, FieldMapping, auto_map, auto_map_header, resolve_mapping},
    pipeline::import_text,
    store::InMemoryClientStore,
};
use common::known_clients;
use proptest::prelude::*;

fn policy_strategy() -> impl Strategy<Value = DuplicatePolicy> {
    prop_oneof![
        Just(DuplicatePolicy::Skip),
        Just(DuplicatePolicy::Update),
        Just(DuplicatePolicy::Import),
    ]
}

/// Names may be blank; emails come from a small pool so duplicates are
/// common, plus blank and malformed values.
fn row_strategy() -> impl Strategy<Value = (String, String)> {
    (
        prop_oneof![Just(String::new()), "[A-Z][a-z]{1,8}"],
        prop_oneof![
            Just(String::new()),
            Just("not-an-email".to_string()),
            "[a-c]@example\\.com",
            "[A-C]@EXAMPLE\\.com",
        ],
    )
}

proptest! {
    #[test]
    fn auto_mapper_is_total(header in ".{0,40}") {
        let field = auto_map_header(&header);
        prop_assert!(CanonicalField::ALL.contains(&field));
    }

    #[test]
    fn company_headers_never_map_to_name(prefix in "[a-z ]{0,8}", suffix in "[a-z ]{0,8}") {
        let header = format!("{prefix}Company{suffix} name");
        prop_assert_ne!(auto_map_header(&header), CanonicalField::Name);
    }

    #[test]
    fn resolved_mapping_prefers_overrides(headers in proptest::collection::vec("[A-Za-z ]{1,12}", 1..6)) {
        let proposal = auto_map(&headers);
        let mut overrides = FieldMapping::new();
        overrides.insert(headers[0].clone(), CanonicalField::Notes);
        let resolved = resolve_mapping(&proposal, &overrides);
        prop_assert_eq!(resolved.field_for(&headers[0]), CanonicalField::Notes);
        for header in headers.iter().skip(1).filter(|h| **h != headers[0]) {
            prop_assert_eq!(resolved.field_for(header), proposal.field_for(header));
        }
    }

    #[test]
    fn every_row_is_counted_exactly_once(
        rows in proptest::collection::vec(row_strategy(), 0..20),
        policy in policy_strategy(),
    ) {
        let mut csv = String::from("name,email\n");
        for (name, email) in &rows {
            csv.push_str(&format!("{name},{email}\n"));
        }
        let known = known_clients(&["a@example.com"]);
        let report = import_text(
            &csv,
            &FieldMapping::new(),
            policy,
            &known,
            InMemoryClientStore::from_known(&known),
        );
        let result = report.result;
        prop_assert!(result.success);
        prop_assert_eq!(
            result.imported + result.updated + result.skipped + result.failed,
            rows.len()
        );
        prop_assert_eq!(report.outcomes.len(), rows.len());
        prop_assert!(result.errors.iter().all(|e| e.row >= 1 && e.row <= rows.len()));
        if policy == DuplicatePolicy::Import {
            prop_assert_eq!(result.skipped, 0);
            prop_assert_eq!(result.updated, 0);
        }
    }
}
