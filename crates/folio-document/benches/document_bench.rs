// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the folio-document crate: table detection on a
// text page and alpha flattening of a mid-sized image.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, Rgba, RgbaImage};

use folio_document::{ImageProcessor, detect_tables};

/// A page of prose with two embedded tables.
fn sample_page() -> String {
    let mut page = String::from("Quarterly summary\n\n");
    for row in 0..40 {
        page.push_str(&format!("Item {row}    {}.50    {}\n", row * 3, row % 7));
    }
    page.push_str("\nNotes follow here as ordinary sentences.\n\n");
    for row in 0..20 {
        page.push_str(&format!("Region {row}\t{}\t{}\n", row * 11, row * 13));
    }
    page
}

fn bench_detect_tables(c: &mut Criterion) {
    let page = sample_page();
    c.bench_function("detect_tables (60 rows)", |b| {
        b.iter(|| black_box(detect_tables(black_box(&page))));
    });
}

/// 500x500 half-transparent image, as produced by screenshots with alpha.
fn bench_flatten(c: &mut Criterion) {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(500, 500, Rgba([40, 80, 120, 128])));
    c.bench_function("flatten_onto_white (500x500)", |b| {
        b.iter(|| {
            let flat = ImageProcessor::from_dynamic(black_box(image.clone())).flatten_onto_white();
            black_box(flat.into_dynamic());
        });
    });
}

criterion_group!(benches, bench_detect_tables, bench_flatten);
criterion_main!(benches);
