//! Performance benchmarks for cspbypass components.
//!
//! Every keystroke in interactive use runs a full scan of the dataset, so
//! parsing and searching need to stay fast on datasets much larger than the
//! public one.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use cspbypass::csp::{self, Policy};
use cspbypass::dataset::{self, Dataset};
use cspbypass::query;

const HOSTS: &[&str] = &[
    "www.google.com",
    "ajax.googleapis.com",
    "cdnjs.cloudflare.com",
    "cdn.jsdelivr.net",
    "www.youtube.com",
    "accounts.google.com",
    "unpkg.com",
    "api.vk.com",
];

/// Dataset text with `rows` entries (plus header)
fn generate_dataset(rows: usize) -> String {
    let mut raw = String::with_capacity(rows * 120);
    raw.push_str("Domain\tCode\tAuthor\n");
    for i in 0..rows {
        let host = HOSTS[i % HOSTS.len()];
        raw.push_str(&format!(
            "{i}.{host}\t<script src=\"https://{i}.{host}/jsonp?callback=alert({i})\"></script>\tuser{}\n",
            i % 17
        ));
    }
    raw
}

const POLICY: &str = "Content-Security-Policy: default-src 'none'; \
    script-src 'self' 'unsafe-inline' https://*.googleapis.com https://www.google.com \
    *.cloudflare.com cdn.jsdelivr.net https://*.a.*.example.com; object-src 'none'";

/// Benchmark dataset parsing
fn bench_dataset_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("dataset_parsing");

    for rows in [100usize, 1_000, 10_000] {
        let raw = generate_dataset(rows);
        group.throughput(Throughput::Bytes(raw.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse", rows), &raw, |b, raw| {
            b.iter(|| dataset::parse(black_box(raw)))
        });
    }

    group.finish();
}

/// Benchmark policy interpretation
fn bench_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("policy");

    group.bench_function("parse", |b| b.iter(|| Policy::parse(black_box(POLICY))));

    let policy = Policy::parse(POLICY);
    let (_, effective) = policy.effective_sources();
    group.bench_function("extract_terms", |b| {
        b.iter(|| csp::extract_terms(black_box(effective)))
    });
    group.bench_function("shows_unsafe_inline", |b| {
        b.iter(|| csp::shows_unsafe_inline(black_box(effective)))
    });

    group.finish();
}

/// Benchmark searches against datasets of growing size
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for rows in [1_000usize, 10_000] {
        let dataset: Dataset = dataset::parse(&generate_dataset(rows));
        group.throughput(Throughput::Elements(rows as u64));

        group.bench_with_input(BenchmarkId::new("plain", rows), &dataset, |b, ds| {
            b.iter(|| query::search(ds, black_box("googleapis")))
        });
        group.bench_with_input(BenchmarkId::new("policy", rows), &dataset, |b, ds| {
            b.iter(|| query::search(ds, black_box(POLICY)))
        });
        group.bench_with_input(BenchmarkId::new("no_match", rows), &dataset, |b, ds| {
            b.iter(|| query::search(ds, black_box("zzz-not-present")))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_dataset_parsing, bench_policy, bench_search);
criterion_main!(benches);
