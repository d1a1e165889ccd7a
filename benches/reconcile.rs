use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use price_delta::cache::ComparisonCache;
use price_delta::data::{Cell, RawTable};
use price_delta::io_utils::{self, LoadOptions};
use price_delta::reconcile::compare;
use price_delta::resolve::RuleSet;
use tempfile::TempDir;

fn generate_list(rows: usize, price_label: &str, bump: u64) -> RawTable {
    let headers = vec![
        "Barcode".to_string(),
        "Ονομασία".to_string(),
        price_label.to_string(),
    ];
    let body = (0..rows)
        .map(|i| {
            let cents = 100 + (i as u64 * 37 + bump * (i as u64 % 5)) % 10_000;
            vec![
                Cell::Text(format!("280{i:07}")),
                Cell::Text(format!("Item {i}")),
                Cell::Text(format!("{},{:02}", cents / 100, cents % 100)),
            ]
        })
        .collect();
    RawTable::from_rows(headers, body)
}

fn write_list(dir: &TempDir, name: &str, rows: usize, price_label: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = File::create(&path).expect("create csv");
    writeln!(file, "Barcode;Ονομασία;{price_label}").expect("header");
    for i in 0..rows {
        writeln!(file, "280{i:07};Item {i};{},{:02}", i % 90 + 1, i % 100).expect("row");
    }
    path
}

fn bench_compare(c: &mut Criterion) {
    let old = generate_list(20_000, "Χονδρική Τιμή", 0);
    let new = generate_list(20_000, "Προτεινόμενη Χονδρική", 3);
    let rules = RuleSet::default();

    c.bench_function("compare_20k", |b| {
        b.iter(|| compare(&old, &new, &rules))
    });

    c.bench_function("compare_cached_20k", |b| {
        b.iter_batched(
            || {
                let mut cache = ComparisonCache::new();
                cache.get_or_compare(&old, &new, &rules);
                cache
            },
            |mut cache| cache.get_or_compare(&old, &new, &rules).rows.len(),
            BatchSize::LargeInput,
        )
    });
}

fn bench_load(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = write_list(&dir, "list.csv", 20_000, "Χονδρική Τιμή");
    c.bench_function("load_csv_20k", |b| {
        b.iter(|| io_utils::load_table(&path, &LoadOptions::default()).expect("load"))
    });
}

criterion_group!(benches, bench_compare, bench_load);
criterion_main!(benches);
