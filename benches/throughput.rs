//! Throughput Benchmark for MintKV
//!
//! Measures the store, the request decoder and the reply encoder.

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mintkv::protocol::{Reply, RespParser, RespValue};
use mintkv::storage::Store;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Benchmark SET operations
fn bench_set(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    let mut group = c.benchmark_group("set");
    group.throughput(Throughput::Elements(1));

    group.bench_function("set_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            store.set(key, Bytes::from("small_value"));
            i += 1;
        });
    });

    group.bench_function("set_large", |b| {
        let mut i = 0u64;
        let value = Bytes::from("x".repeat(64 * 1024)); // 64KB value
        b.iter(|| {
            let key = Bytes::from(format!("key:{}", i));
            store.set(key, value.clone());
            i += 1;
        });
    });

    group.bench_function("set_with_expiry", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = Bytes::from(format!("ttl:{}", i));
            let deadline = Instant::now() + Duration::from_secs(3600);
            store.set_with_expiry(key, Bytes::from("value"), deadline);
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark GET operations
fn bench_get(c: &mut Criterion) {
    let store = Arc::new(Store::new());

    for i in 0..100_000 {
        let key = Bytes::from(format!("key:{}", i));
        let value = Bytes::from(format!("value:{}", i));
        store.set(key, value);
    }

    let mut group = c.benchmark_group("get");
    group.throughput(Throughput::Elements(1));

    group.bench_function("get_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(store.get(key.as_bytes()));
            i += 1;
        });
    });

    group.bench_function("get_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(store.get(key.as_bytes()));
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark concurrent access against the single store lock
fn bench_concurrent(c: &mut Criterion) {
    use std::thread;

    let mut group = c.benchmark_group("concurrent");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("4_threads_mixed", |b| {
        b.iter(|| {
            let store = Arc::new(Store::new());
            let handles: Vec<_> = (0..4)
                .map(|t| {
                    let store = Arc::clone(&store);
                    thread::spawn(move || {
                        for i in 0..10_000 {
                            let key = Bytes::from(format!("key:{}:{}", t, i));
                            store.set(key.clone(), Bytes::from("value"));
                            store.get(&key);
                        }
                    })
                })
                .collect();

            for handle in handles {
                handle.join().unwrap();
            }

            black_box(store.len());
        });
    });

    group.finish();
}

/// Benchmark request decoding
fn bench_parse(c: &mut Criterion) {
    let set = RespValue::command(&["SET", "user:1000", "some value", "PX", "60000"]).serialize();
    let mut pipeline = Vec::new();
    for _ in 0..100 {
        pipeline.extend_from_slice(&RespValue::command(&["GET", "user:1000"]).serialize());
    }

    let mut group = c.benchmark_group("parse");

    group.throughput(Throughput::Bytes(set.len() as u64));
    group.bench_function("resp_set", |b| {
        let mut parser = RespParser::new();
        b.iter(|| black_box(parser.parse(&set).unwrap()));
    });

    group.throughput(Throughput::Bytes(6));
    group.bench_function("inline_ping", |b| {
        let mut parser = RespParser::new();
        b.iter(|| black_box(parser.parse(b"PING\r\n").unwrap()));
    });

    group.throughput(Throughput::Elements(100));
    group.bench_function("pipeline_100_get", |b| {
        let mut parser = RespParser::new();
        b.iter(|| {
            let mut offset = 0;
            while let Some((decoded, consumed)) = parser.parse(&pipeline[offset..]).unwrap() {
                black_box(decoded);
                offset += consumed;
            }
        });
    });

    group.finish();
}

/// Benchmark reply encoding
fn bench_encode(c: &mut Criterion) {
    let bulk = Reply::Bulk(Bytes::from("x".repeat(1024)));
    let list = Reply::BulkList(
        (0..16)
            .map(|i| RespValue::bulk_string(format!("item:{}", i)))
            .collect(),
    );

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Elements(1));

    group.bench_function("status_ok", |b| {
        b.iter(|| black_box(Reply::ok().encode()));
    });

    group.bench_function("bulk_1kb", |b| {
        let mut buf = Vec::with_capacity(2048);
        b.iter(|| {
            buf.clear();
            bulk.encode_into(&mut buf);
            black_box(buf.len());
        });
    });

    group.bench_function("bulk_list_16", |b| {
        b.iter(|| black_box(list.encode()));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_set,
    bench_get,
    bench_concurrent,
    bench_parse,
    bench_encode,
);

criterion_main!(benches);
