//! Benchmarks for the conversion pipeline.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use hengban::epub::write_package_to_bytes;
use hengban::glyph::{TextRun, reconstruct_lines};
use hengban::markdown::html_to_markdown;
use hengban::transform::LayoutRules;
use hengban::transform::css::rewrite_stylesheet;
use hengban::transform::html::rewrite_markup;
use hengban::{ArchiveEntry, ConversionConfig, Converter, OutputKind};

const STYLESHEET: &str = "html { -epub-writing-mode: vertical-rl; writing-mode: vertical-rl; }\n\
                          p { text-indent: 2em; margin: 0; -webkit-text-orientation: upright; }\n\
                          h1 { font-size: 1.4em; }\n";

/// A long vertical-layout chapter in Simplified script.
fn sample_chapter(n: usize) -> String {
    let mut body = format!("<h1>第{n}章 这个问题</h1>\n");
    for i in 0..200 {
        body.push_str(&format!(
            "<p>第{i}段：他们说<em>时间</em>会过去，<strong>问题</strong>还没有答案。</p>\n"
        ));
    }
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<!DOCTYPE html>\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\" style=\"writing-mode: vertical-rl\">\n\
         <head><title>第{n}章</title><link rel=\"stylesheet\" href=\"main.css\"/></head>\n\
         <body>\n{body}</body>\n</html>\n"
    )
}

fn sample_epub() -> Vec<u8> {
    let mut entries = vec![
        ArchiveEntry::new("mimetype", b"application/epub+zip".to_vec()),
        ArchiveEntry::new("OEBPS/main.css", STYLESHEET.as_bytes().to_vec()),
    ];
    for n in 1..=20 {
        entries.push(ArchiveEntry::new(
            format!("OEBPS/ch{n:02}.xhtml"),
            sample_chapter(n).into_bytes(),
        ));
    }
    write_package_to_bytes(&entries).unwrap()
}

fn sample_runs() -> Vec<TextRun> {
    (0..2000)
        .map(|i| TextRun::new(format!("字{i}"), 800.0 - (i / 8) as f32 * 14.0))
        .collect()
}

// ============================================================================
// Stage Benchmarks
// ============================================================================

fn bench_rewrite_markup(c: &mut Criterion) {
    let html = sample_chapter(1);
    let rules = LayoutRules::default();

    c.bench_function("rewrite_markup", |b| {
        b.iter(|| rewrite_markup(black_box(&html), &rules));
    });
}

fn bench_rewrite_stylesheet(c: &mut Criterion) {
    let rules = LayoutRules::default();

    c.bench_function("rewrite_stylesheet", |b| {
        b.iter(|| rewrite_stylesheet(black_box(STYLESHEET), &rules));
    });
}

fn bench_html_to_markdown(c: &mut Criterion) {
    let html = sample_chapter(1);

    c.bench_function("html_to_markdown", |b| {
        b.iter(|| html_to_markdown(black_box(&html)));
    });
}

fn bench_reconstruct_lines(c: &mut Criterion) {
    let runs = sample_runs();

    c.bench_function("reconstruct_lines", |b| {
        b.iter(|| reconstruct_lines(black_box(&runs), 5.0));
    });
}

// ============================================================================
// End-to-end Benchmarks
// ============================================================================

fn bench_restyle_epub(c: &mut Criterion) {
    let data = sample_epub();
    let converter = Converter::new(ConversionConfig::new(OutputKind::Archive)).unwrap();

    c.bench_function("restyle_epub", |b| {
        b.iter(|| converter.convert(black_box(&data), None).unwrap());
    });
}

fn bench_flatten_epub(c: &mut Criterion) {
    let data = sample_epub();
    let converter = Converter::new(ConversionConfig::new(OutputKind::StructuredText)).unwrap();

    c.bench_function("flatten_epub", |b| {
        b.iter(|| converter.convert(black_box(&data), None).unwrap());
    });
}

criterion_group!(
    benches,
    // Stages
    bench_rewrite_markup,
    bench_rewrite_stylesheet,
    bench_html_to_markdown,
    bench_reconstruct_lines,
    // End to end
    bench_restyle_epub,
    bench_flatten_epub,
);
criterion_main!(benches);
