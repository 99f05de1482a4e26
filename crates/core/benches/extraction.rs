use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use precis_core::{Document, ExtractConfig, compile_domain_pattern, explain_candidates, extract_body, list_matches_host};

fn bench_parse(c: &mut Criterion) {
    let single = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let combined = std::fs::read_to_string("../../tests/fixtures/multi_column.html").unwrap();

    let mut group = c.benchmark_group("parse");

    group.bench_with_input(BenchmarkId::new("article", "single"), &single, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.bench_with_input(BenchmarkId::new("article", "combined"), &combined, |b, html| {
        b.iter(|| Document::parse(black_box(html)))
    });

    group.finish();
}

fn bench_extraction(c: &mut Criterion) {
    let html = std::fs::read_to_string("../../tests/fixtures/article.html").unwrap();
    let doc = Document::parse(&html).unwrap();
    let config = ExtractConfig::default();

    c.bench_function("extract_body", |b| b.iter(|| extract_body(black_box(&doc), black_box(&config))));
    c.bench_function("explain_candidates", |b| {
        b.iter(|| explain_candidates(black_box(&doc), black_box(&config)))
    });
}

fn bench_domain_patterns(c: &mut Criterion) {
    let patterns: Vec<String> = (0..50)
        .map(|i| match i % 3 {
            0 => format!("site{}.example.com", i),
            1 => format!("*.cdn{}.example.net", i),
            _ => format!("/^intranet{}\\d*$/", i),
        })
        .collect();

    c.bench_function("compile_domain_pattern", |b| {
        b.iter(|| patterns.iter().filter_map(|p| compile_domain_pattern(black_box(p))).count())
    });

    c.bench_function("list_matches_host", |b| {
        b.iter(|| list_matches_host(black_box(patterns.as_slice()), black_box("assets.cdn49.example.net")))
    });
}

criterion_group!(benches, bench_parse, bench_extraction, bench_domain_patterns);
criterion_main!(benches);
