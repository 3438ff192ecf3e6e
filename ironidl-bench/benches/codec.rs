//! Codec benchmarks.
//!
//! Run with: cargo bench -p ironidl-bench --bench codec

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ironidl_bench::workload::Workload;
use ironidl_core::{decode_args, idl_hash};
use std::hint::black_box;

fn benchmark_hash(c: &mut Criterion) {
    c.bench_function("idl_hash_short", |b| b.iter(|| idl_hash(black_box("owner"))));
    c.bench_function("idl_hash_long", |b| {
        b.iter(|| idl_hash(black_box("a_rather_long_field_name_for_a_record")))
    });
}

fn benchmark_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_batch");

    for count in [1usize, 16, 256] {
        let workload = Workload::transfers(count).unwrap();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &workload, |b, workload| {
            b.iter(|| black_box(workload.encode().unwrap()))
        });
    }

    group.finish();
}

fn benchmark_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for count in [1usize, 16, 256] {
        let workload = Workload::transfers(count).unwrap();
        let bytes = workload.encode().unwrap();
        let types = [workload.batch.clone()];
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &bytes, |b, bytes| {
            b.iter(|| black_box(decode_args(bytes, &workload.table, &types).unwrap()))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_hash, benchmark_encode, benchmark_decode);
criterion_main!(benches);
