//! Key decoding and grammar benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use typed_prompt::grammar::{builtin, Grammar};
use typed_prompt::input::KeyDecoder;

fn bench_decode_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");

    // Plain ASCII, as delivered by a paste
    let pasted = "1,234,567.89 ".repeat(500);
    group.throughput(Throughput::Bytes(pasted.len() as u64));

    group.bench_function("paste", |b| {
        let decoder = KeyDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box(pasted.as_bytes()))))
    });

    group.finish();
}

fn bench_decode_cursor_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");

    // Cursor keys mixed with edits
    let keys = "\x1b[D\x1b[Dx\x7f\x1bOC\x1b[1;5C".repeat(200);
    group.throughput(Throughput::Bytes(keys.len() as u64));

    group.bench_function("cursor_keys", |b| {
        let decoder = KeyDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box(keys.as_bytes()))))
    });

    group.finish();
}

fn bench_decode_utf8(c: &mut Criterion) {
    let mut group = c.benchmark_group("decoder");

    let text = "日本語テキスト ".repeat(200);
    group.throughput(Throughput::Bytes(text.len() as u64));

    group.bench_function("utf8", |b| {
        let decoder = KeyDecoder::new();
        b.iter(|| black_box(decoder.decode(black_box(text.as_bytes()))))
    });

    group.finish();
}

fn bench_grammar_accept(c: &mut Criterion) {
    let mut group = c.benchmark_group("grammar");

    let integer = builtin::integer();
    group.bench_function("integer", |b| {
        b.iter(|| black_box(integer.accept(black_box("12,345,678"))))
    });

    let date = builtin::date();
    group.bench_function("date", |b| {
        b.iter(|| black_box(date.accept(black_box("12/31/1999"))))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_decode_typing,
    bench_decode_cursor_keys,
    bench_decode_utf8,
    bench_grammar_accept,
);
criterion_main!(benches);
