//! Criterion benchmarks for rust_data_access

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_data_access::backends::memory::{MemoryCursor, ResultSet};
use rust_data_access::core::mapping::{PropertyMap, TableMap};
use rust_data_access::core::materializer::{all_rows, paged_rows, rows_to_typed};
use rust_data_access::core::translator::{rebuild_named_query, translate_positional_query};
use rust_data_access::prelude::*;

// ============================================================================
// Parameter Translation Benchmarks
// ============================================================================

fn bench_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("translation");
    let registry = DialectRegistry::new();
    let sqlite = registry.get(ConnectionKind::Sqlite).unwrap();
    let odbc = registry.get(ConnectionKind::MsSqlOdbc).unwrap();

    for count in [1usize, 10, 100].iter() {
        let query = format!(
            "INSERT INTO t VALUES ({})",
            vec!["?"; *count].join(", ")
        );
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("positional_named", count), &query, |b, query| {
            b.iter(|| {
                let translated = translate_positional_query(black_box(query), &sqlite).unwrap();
                black_box(translated)
            });
        });

        group.bench_with_input(BenchmarkId::new("positional_odbc", count), &query, |b, query| {
            b.iter(|| {
                let translated = translate_positional_query(black_box(query), &odbc).unwrap();
                black_box(translated)
            });
        });
    }

    let names: Vec<String> = (0..20).map(|i| format!("param{}", i)).collect();
    let query = format!(
        "SELECT * FROM t WHERE {}",
        names
            .iter()
            .map(|n| format!("{} = :{}", n, n))
            .collect::<Vec<_>>()
            .join(" AND ")
    );
    group.bench_function("rebuild_named_20", |b| {
        b.iter(|| {
            let rebuilt = rebuild_named_query(black_box(&query), &names, "@", ':').unwrap();
            black_box(rebuilt)
        });
    });

    group.finish();
}

// ============================================================================
// Dialect Benchmarks
// ============================================================================

fn bench_dialects(c: &mut Criterion) {
    let mut group = c.benchmark_group("dialects");
    group.throughput(Throughput::Elements(1));
    let registry = DialectRegistry::new();

    group.bench_function("registry_hit", |b| {
        registry.get(ConnectionKind::Oracle).unwrap();
        b.iter(|| {
            let dialect = registry.get(black_box(ConnectionKind::Oracle)).unwrap();
            black_box(dialect)
        });
    });

    let oracle = registry.get(ConnectionKind::Oracle).unwrap();
    let page = PageInfo::from_page_number(5, 25);
    group.bench_function("paging_sql", |b| {
        b.iter(|| {
            let sql = oracle
                .paging_sql(black_box("SELECT * FROM orders ORDER BY id"), page)
                .unwrap();
            black_box(sql)
        });
    });

    group.finish();
}

// ============================================================================
// Materializer Benchmarks
// ============================================================================

fn result_set(rows: usize) -> ResultSet {
    let mut set = ResultSet::new(&["id", "name", "amount", "id"]);
    for i in 0..rows {
        set = set.row(vec![
            DatabaseValue::Long(i as i64),
            DatabaseValue::from(format!("name_{}", i)),
            DatabaseValue::Double(i as f64 * 1.5),
            DatabaseValue::Long(i as i64),
        ]);
    }
    set
}

fn bench_materializer(c: &mut Criterion) {
    let mut group = c.benchmark_group("materializer");

    for size in [10, 100, 1000].iter() {
        let set = result_set(*size);
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("all_rows", size), &set, |b, set| {
            b.iter(|| {
                let mut cursor = MemoryCursor::new(set.clone());
                let rows = all_rows(&mut cursor).unwrap();
                black_box(rows)
            });
        });

        group.bench_with_input(BenchmarkId::new("paged_rows", size), &set, |b, set| {
            b.iter(|| {
                let mut cursor = MemoryCursor::new(set.clone());
                let rows = paged_rows(&mut cursor, (*size / 2) as u64, 10).unwrap();
                black_box(rows)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Typed Mapping Benchmarks
// ============================================================================

#[derive(Debug, Default)]
struct Order {
    id: i64,
    name: String,
    amount: f64,
}

fn bench_typed_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("typed_mapping");
    let map = TableMap::new("orders")
        .with(PropertyMap::new("id", |o: &Order| o.id, |o, v| o.id = v).key())
        .with(PropertyMap::new("name", |o: &Order| o.name.clone(), |o, v| o.name = v))
        .with(PropertyMap::new("amount", |o: &Order| o.amount, |o, v| o.amount = v));
    let options = MappingOptions::default();

    for size in [10, 100, 1000].iter() {
        let mut cursor = MemoryCursor::new(result_set(*size));
        let rows = all_rows(&mut cursor).unwrap();
        group.throughput(Throughput::Elements(*size as u64));

        group.bench_with_input(BenchmarkId::new("rows_to_typed", size), &rows, |b, rows| {
            b.iter(|| {
                let orders = rows_to_typed(black_box(rows), &map, &options).unwrap();
                black_box(orders)
            });
        });

        group.bench_with_input(BenchmarkId::new("row_json", size), &rows, |b, rows| {
            b.iter(|| {
                let json = serde_json::to_string(black_box(rows)).unwrap();
                black_box(json)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_translation,
    bench_dialects,
    bench_materializer,
    bench_typed_mapping
);

criterion_main!(benches);
