//! Benchmarks for the conversion pipeline.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use docsplit::dom::{parse_html, parse_html_bytes};
use docsplit::{ConvertConfig, convert_document};

const MODERN: &[u8] = include_bytes!("../tests/fixtures/modern.html");

/// A modern-layout page with `sections` top-level sections, each holding
/// prose, a code figure, a table and cross-references.
fn synthetic_document(sections: usize) -> String {
    let mut html = String::from(r#"<nav aria-labelledby="table-of-contents"><ul>"#);
    for i in 0..sections {
        html.push_str(&format!(
            r##"<li><a href="#Section-{i}">Section {i}</a><ul><li><a href="#Detail-{i}">Detail {i}</a></li></ul></li>"##
        ));
    }
    html.push_str(r#"</ul></nav><div id="contents">"#);
    for i in 0..sections {
        let next = (i + 1) % sections;
        html.push_str(&format!(
            r##"<h2 id="Section-{i}"><a href="#toc-Section-{i}">Section {i}</a></h2>
<p>Some <strong>prose</strong> about section {i}, see <a href="#Section-{next}">the next one</a>.</p>
<figure><figcaption class="zig-cap"><cite>s{i}.zig</cite></figcaption>
<pre><code>const x: u32 = {i};
pub fn main() void {{}}</code></pre></figure>
<h3 id="Detail-{i}">Detail {i}</h3>
<table><tr><th>Name</th><th>Value</th></tr><tr><td><code>x</code></td><td>{i}</td></tr></table>
<ul><li>one <a href="#Detail-{next}">detail</a></li><li>two</li></ul>
"##
        ));
    }
    html.push_str("</div>");
    html
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_modern_fixture", |b| {
        b.iter(|| parse_html_bytes(black_box(MODERN)));
    });
}

fn bench_convert_fixture(c: &mut Criterion) {
    let dom = parse_html_bytes(MODERN);
    let config = ConvertConfig::default();
    c.bench_function("convert_modern_fixture", |b| {
        b.iter(|| convert_document(black_box(&dom), "master", &config).unwrap());
    });
}

fn bench_convert_synthetic(c: &mut Criterion) {
    let config = ConvertConfig::default();
    let mut group = c.benchmark_group("convert_synthetic");
    for sections in [10, 100, 400] {
        let dom = parse_html(&synthetic_document(sections));
        group.bench_with_input(BenchmarkId::from_parameter(sections), &dom, |b, dom| {
            b.iter(|| convert_document(black_box(dom), "master", &config).unwrap());
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_parse,
    bench_convert_fixture,
    bench_convert_synthetic
);
criterion_main!(benches);
