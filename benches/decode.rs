//! Benchmarks for registry value decoding and string marshaling.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use reg_marshal::strings::{allocate_string, get_bytes, read_string};
use reg_marshal::{CharWidth, ValueData, ValueType};

fn bench_decode(c: &mut Criterion) {
    let mut multi = Vec::new();
    for i in 0..64 {
        multi.extend(get_bytes(&format!("entry-{}", i), true, CharWidth::Wide));
    }
    multi.extend_from_slice(&[0, 0]);

    c.bench_function("decode_multi_string_64", |b| {
        b.iter(|| ValueData::from_bytes(black_box(&multi), ValueType::MultiString))
    });

    let dword = [0x00, 0x00, 0x00, 0x2A];
    c.bench_function("decode_dword_big_endian", |b| {
        b.iter(|| ValueData::from_bytes(black_box(&dword), ValueType::DwordBigEndian))
    });
}

fn bench_strings(c: &mut Criterion) {
    let text = "HKEY_LOCAL_MACHINE\\SOFTWARE\\Microsoft\\Windows\\CurrentVersion";

    c.bench_function("allocate_and_read_wide", |b| {
        b.iter(|| {
            let buffer = allocate_string(Some(black_box(text)), CharWidth::Wide)?;
            read_string(buffer.as_ref(), CharWidth::Wide)
        })
    });
}

criterion_group!(benches, bench_decode, bench_strings);
criterion_main!(benches);
