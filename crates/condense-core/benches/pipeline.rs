use condense_core::condense::Condenser;
use condense_core::config::FieldRules;
use condense_core::record::Record;
use condense_core::sort::sort_by_cluster_key;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use uuid::Uuid;

const TIERS: [(&str, usize); 3] = [("small", 1_000), ("medium", 10_000), ("large", 100_000)];

/// Rows in scrambled key order, about four rows per cluster.
fn synthetic_rows(count: usize) -> Vec<Record<i64>> {
    let clusters = (count / 4).max(1);
    (0..count)
        .map(|i| {
            let key = i64::try_from((i * 7_919) % clusters).unwrap_or_default();
            Record::new(Some(key))
                .with("ID", i.to_string())
                .with("FULL_NAME", format!("Provider {}", i % 3))
                .with("EMAIL", format!("p{}@example.com", i % 2))
                .with("SPECIALTY", "General")
        })
        .collect()
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline");
    let condenser = Condenser::new(FieldRules::default());

    for (name, count) in TIERS {
        let rows = synthetic_rows(count);
        group.throughput(Throughput::Elements(count as u64));

        group.bench_with_input(BenchmarkId::new("sort", name), &rows, |b, rows| {
            b.iter(|| black_box(sort_by_cluster_key(rows.clone())));
        });

        let sorted = sort_by_cluster_key(rows.clone());
        group.bench_with_input(BenchmarkId::new("condense", name), &sorted, |b, sorted| {
            b.iter(|| black_box(condenser.condense_with_ids(sorted, Uuid::nil)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline);
criterion_main!(benches);
