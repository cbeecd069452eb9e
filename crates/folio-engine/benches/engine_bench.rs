// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the folio-engine crate: page-range parsing and
// output path allocation in a crowded directory.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use folio_engine::{page_range, paths};

fn bench_page_range(c: &mut Criterion) {
    let short = "1-3,5,8-10";
    let long: String = (0..200)
        .map(|n| format!("{}-{}", n * 10 + 1, n * 10 + 4))
        .collect::<Vec<_>>()
        .join(",");

    c.bench_function("page_range::parse (short)", |b| {
        b.iter(|| black_box(page_range::parse(black_box(short))));
    });
    c.bench_function("page_range::parse (200 ranges)", |b| {
        b.iter(|| black_box(page_range::parse(black_box(&long))));
    });
    c.bench_function("page_range::parse_strict (200 ranges)", |b| {
        b.iter(|| black_box(page_range::parse_strict(black_box(&long))));
    });
}

/// Fifty existing `report*.pdf` files, so allocation walks the suffixes.
fn bench_allocate(c: &mut Criterion) {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("report.pdf"), b"").expect("seed");
    for n in 1..50 {
        std::fs::write(dir.path().join(format!("report_{n}.pdf")), b"").expect("seed");
    }
    let base = dir.path().join("report");

    c.bench_function("paths::allocate_file (50 taken)", |b| {
        b.iter(|| black_box(paths::allocate_file(black_box(&base), ".pdf")));
    });
    c.bench_function("paths::allocate_file (free)", |b| {
        let free = dir.path().join("fresh");
        b.iter(|| black_box(paths::allocate_file(black_box(&free), ".pdf")));
    });
}

criterion_group!(benches, bench_page_range, bench_allocate);
criterion_main!(benches);
