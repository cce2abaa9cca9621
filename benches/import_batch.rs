use std::fmt::Write as _;

use client_import::{
    duplicates::DuplicatePolicy,
    mapping::FieldMapping,
    pipeline::import_text,
    store::{ClientId, InMemoryClientStore, KnownClients},
};
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};

fn generate_clients(rows: usize) -> String {
    let mut csv = String::from("Full Name,Email Address,Mobile,Company Name,Address,Notes\n");
    for i in 0..rows {
        // Every fifth row repeats an earlier email; every thirteenth is invalid.
        let email = if i % 13 == 0 {
            format!("client{i}-at-example.com")
        } else if i % 5 == 0 && i > 0 {
            format!("client{}@example.com", i - 1)
        } else {
            format!("client{i}@example.com")
        };
        let _ = writeln!(
            csv,
            "Client {i},{email},555-{:04},Company {},\"{} Main St, Springfield\",",
            i % 10_000,
            i % 50,
            i
        );
    }
    csv
}

fn known_half(rows: usize) -> KnownClients {
    let mut known = KnownClients::new();
    for i in (0..rows).step_by(2) {
        known.insert(&format!("client{i}@example.com"), ClientId::new());
    }
    known
}

fn bench_import(c: &mut Criterion) {
    let rows = 10_000;
    let csv = generate_clients(rows);
    let known = known_half(rows);
    let mut group = c.benchmark_group("import_batch");
    for policy in [DuplicatePolicy::Skip, DuplicatePolicy::Update, DuplicatePolicy::Import] {
        group.bench_function(format!("{policy:?}_{rows}"), |b| {
            b.iter_batched(
                || InMemoryClientStore::from_known(&known),
                |store| {
                    let report = import_text(&csv, &FieldMapping::new(), policy, &known, store);
                    assert!(report.result.success);
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_import);
criterion_main!(benches);
