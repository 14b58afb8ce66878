use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use stakevault_types::UsdValue;
use stakevault_vip::{isqrt, tier};

fn bench_isqrt(c: &mut Criterion) {
    let mut group = c.benchmark_group("isqrt");

    for n in [99u128, 40_000, u64::MAX as u128, u128::MAX] {
        group.bench_with_input(BenchmarkId::new("newton", n), &n, |b, &n| {
            b.iter(|| black_box(isqrt(black_box(n))));
        });
    }

    group.finish();
}

fn bench_tier(c: &mut Criterion) {
    let mut group = c.benchmark_group("vip_tier");

    for usd in [0u128, 22_500, 1_000_000, u128::MAX] {
        group.bench_with_input(BenchmarkId::new("tier", usd), &usd, |b, &usd| {
            b.iter(|| black_box(tier(black_box(UsdValue::new(usd)))));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_isqrt, bench_tier);
criterion_main!(benches);
