use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlfluent::prelude::*;
use sqlfluent::{Explain, MemoryCache, cache::cache_key};

/// `SELECT * FROM t WHERE col0 = :col0 AND col1 = :col1 ...` with `n` conditions.
fn flat_query(n: usize) -> Query {
    let mut q = Query::new();
    q.table("t");
    for i in 0..n {
        q.and(&format!("col{i}"), "=", i as i64);
    }
    q
}

/// `n` conditions on the same column, forcing collision suffixes.
fn colliding_query(n: usize) -> Query {
    let mut q = Query::new();
    q.table("t");
    for i in 0..n {
        q.or("status", "=", i as i64);
    }
    q
}

fn bench_compile_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/flat");

    for n in [1, 5, 10, 50, 100] {
        let q = flat_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.compile(&Operation::Select)));
        });
    }

    group.finish();
}

fn bench_compile_colliding(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/colliding");

    for n in [5, 20, 100] {
        let q = colliding_query(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.compile(&Operation::Select)));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut q = Query::new();
                q.table("t").where_in("id", values.iter().copied());
                black_box(q.compile(&Operation::Select))
            });
        });
    }

    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    c.bench_function("compile/nested_group", |b| {
        b.iter(|| {
            let mut q = Query::new();
            q.table("orders o")
                .left_join("users u", "u.id = o.user_id")
                .where_("o.state", "=", "paid")
                .nested(
                    [col("o.total", ">", 100), col("u.vip", "=", true)],
                    [col("o.created_at", ">=", raw("NOW() - INTERVAL 1 DAY"))],
                    "OR",
                    "AND",
                )
                .order_by("o.id", "DESC")
                .limit(50);
            black_box(q.compile(&Operation::Select))
        });
    });
}

fn bench_explain_and_key(c: &mut Criterion) {
    let compiled = match flat_query(20).compile(&Operation::Select) {
        Ok(compiled) => compiled,
        Err(e) => panic!("benchmark query failed to compile: {e}"),
    };

    c.bench_function("explain/positional_20", |b| {
        b.iter(|| black_box(Explain::new(&compiled)));
    });
    c.bench_function("cache/key_20", |b| {
        b.iter(|| black_box(cache_key("bench", &compiled)));
    });

    let cache = MemoryCache::new(1024);
    let rows = vec![Row::new().with("id", 1).with("name", "A")];
    let gate = sqlfluent::CacheGate::new(&cache);
    c.bench_function("cache/store_lookup", |b| {
        b.iter(|| {
            let _ = gate.store("bench:rows", &rows, None);
            black_box(gate.lookup("bench:rows"))
        });
    });
}

criterion_group!(
    benches,
    bench_compile_flat,
    bench_compile_colliding,
    bench_in_list,
    bench_nested,
    bench_explain_and_key,
);
criterion_main!(benches);
