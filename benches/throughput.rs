//! Throughput Benchmark for the tuple store
//!
//! Measures put / get / read on the sharded store under single-threaded and
//! contended workloads, plus the cost of a stats snapshot.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;
use std::thread;
use tuplespace::space::TupleSpace;
use tuplespace::storage::TupleStore;

/// Benchmark PUT of fresh keys
fn bench_put(c: &mut Criterion) {
    let store = Arc::new(TupleStore::new());

    let mut group = c.benchmark_group("put");
    group.throughput(Throughput::Elements(1));

    group.bench_function("put_small", |b| {
        let mut i = 0u64;
        b.iter(|| {
            black_box(store.put(format!("key:{}", i), "small_value")).ok();
            i += 1;
        });
    });

    group.bench_function("put_existing", |b| {
        store.put("taken", "value").ok();
        b.iter(|| black_box(store.put("taken", "other")).ok());
    });

    group.finish();
}

/// Benchmark READ of present and missing keys
fn bench_read(c: &mut Criterion) {
    let store = Arc::new(TupleStore::new());
    for i in 0..100_000 {
        store.put(format!("key:{}", i), format!("value:{}", i)).ok();
    }

    let mut group = c.benchmark_group("read");
    group.throughput(Throughput::Elements(1));

    group.bench_function("read_existing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 100_000);
            black_box(store.read(&key)).ok();
            i += 1;
        });
    });

    group.bench_function("read_missing", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("missing:{}", i);
            black_box(store.read(&key)).ok();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark a PUT followed by the GET that takes it back
fn bench_put_get(c: &mut Criterion) {
    let store = Arc::new(TupleStore::new());

    let mut group = c.benchmark_group("put_get");
    group.throughput(Throughput::Elements(2));

    group.bench_function("put_then_get", |b| {
        let mut i = 0u64;
        b.iter(|| {
            let key = format!("key:{}", i % 1_000);
            store.put(key.clone(), "value").ok();
            black_box(store.get(&key)).ok();
            i += 1;
        });
    });

    group.finish();
}

/// Benchmark contended access from several threads
fn bench_concurrent(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent");

    for threads in [2usize, 4, 8] {
        group.throughput(Throughput::Elements((threads * 1_000) as u64));
        group.bench_function(format!("{}_threads_mixed", threads), |b| {
            b.iter(|| {
                let store = Arc::new(TupleStore::new());
                let handles: Vec<_> = (0..threads)
                    .map(|t| {
                        let store = Arc::clone(&store);
                        thread::spawn(move || {
                            for i in 0..1_000 {
                                let key = format!("key:{}", i % 64);
                                match i % 3 {
                                    0 => store.put(key, format!("t{}", t)).ok(),
                                    1 => store.read(&key).ok(),
                                    _ => store.get(&key).ok(),
                                };
                            }
                        })
                    })
                    .collect();

                for handle in handles {
                    handle.join().ok();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark the stats snapshot scan
fn bench_snapshot(c: &mut Criterion) {
    let space = TupleSpace::new();
    for i in 0..100_000 {
        space.put(&format!("key:{}", i), "value").ok();
    }

    c.bench_function("snapshot_100k", |b| {
        b.iter(|| black_box(space.snapshot()));
    });
}

criterion_group!(
    benches,
    bench_put,
    bench_read,
    bench_put_get,
    bench_concurrent,
    bench_snapshot,
);

criterion_main!(benches);
