use criterion::{black_box, criterion_group, criterion_main, Criterion};
use seqops_core::cursor::{drain, Cursor};
use seqops_core::order::Natural;
use seqops_operators::{
    cluster::{linear_scan, points},
    DbScan, ExternalSort, HashGrouper, RunGenerator, VecSource,
};

fn make_values(n: usize) -> Vec<u64> {
    let mut x = 0x2545_f491_4f6c_dd1du64;
    (0..n)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 7;
            x ^= x << 17;
            x % 100_000
        })
        .collect()
}

fn bench_run_generation(c: &mut Criterion) {
    let values = make_values(16 * 1024);
    c.bench_function("run_generation_16k_m256", |b| {
        b.iter(|| {
            let mut runs =
                RunGenerator::new(VecSource::new(values.clone()), 256, Natural).unwrap();
            runs.open().unwrap();
            black_box(drain(&mut runs).unwrap())
        })
    });
}

fn bench_external_sort(c: &mut Criterion) {
    let values = make_values(16 * 1024);
    c.bench_function("external_sort_16k_m256_f16", |b| {
        b.iter(|| {
            let mut sort =
                ExternalSort::new(VecSource::new(values.clone()), 256, 16, Natural).unwrap();
            sort.open().unwrap();
            black_box(drain(&mut sort).unwrap())
        })
    });
}

fn bench_hash_grouping(c: &mut Criterion) {
    let values = make_values(16 * 1024);
    c.bench_function("hash_grouper_16k_keys_64", |b| {
        b.iter(|| {
            let mut groups = HashGrouper::new(VecSource::new(values.clone()), |v: &u64| v % 64);
            groups.open().unwrap();
            black_box(drain(&mut groups).unwrap().len())
        })
    });
}

fn bench_dbscan(c: &mut Criterion) {
    let raw: Vec<f64> = make_values(1024).iter().map(|v| *v as f64 / 1000.0).collect();
    c.bench_function("dbscan_linear_scan_1k", |b| {
        b.iter(|| {
            let pts = points(raw.iter().copied());
            let range = linear_scan(&pts, |x: &f64, y: &f64| (x - y).abs());
            let mut scan = DbScan::new(VecSource::new(pts.clone()), range, 0.5, 4).unwrap();
            scan.open().unwrap();
            let mut members = 0usize;
            while scan.has_next().unwrap() {
                let mut cluster = scan.next().unwrap();
                members += drain(&mut cluster).unwrap().len();
            }
            black_box(members)
        })
    });
}

criterion_group!(
    benches,
    bench_run_generation,
    bench_external_sort,
    bench_hash_grouping,
    bench_dbscan
);
criterion_main!(benches);
