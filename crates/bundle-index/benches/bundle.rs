use bundle_core::graph::{GraphBuilder, WeightedDigraph};
use bundle_core::quota::QuotaTable;
use bundle_index::{BundleIndex, BundleIndexConfig};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

fn star(leaves: usize) -> WeightedDigraph {
    let mut b = GraphBuilder::new();
    for i in 0..leaves {
        b.add_edge(&format!("L{i}"), "H", 10.0).expect("edge");
    }
    b.build()
}

/// Seeded sparse digraph, roughly `degree` out-edges per vertex.
fn random(n: usize, degree: usize, seed: u64) -> WeightedDigraph {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        state >> 33
    };

    let mut b = GraphBuilder::new();
    for i in 0..n {
        b.add_vertex(&format!("v{i}"));
    }
    for i in 0..n {
        for _ in 0..degree {
            let j = usize::try_from(next()).unwrap_or(0) % n;
            let w = f64::from(u32::try_from(next() % 8 + 1).unwrap_or(1)) / 4.0;
            b.add_edge(&format!("v{i}"), &format!("v{j}"), w).expect("edge");
        }
    }
    b.build()
}

fn bench_star(c: &mut Criterion) {
    let mut group = c.benchmark_group("bundle.star");
    let g = star(200);
    let q = QuotaTable::uniform(&g, 1.0);

    for k in [1, 2, 3] {
        let config = BundleIndexConfig {
            k,
            ..BundleIndexConfig::default()
        };
        group.bench_with_input(BenchmarkId::new("k", k), &config, |b, config| {
            b.iter(|| black_box(BundleIndex::compute(&g, &q, config).expect("compute")));
        });
    }
    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("bundle.random");
    let g = random(400, 6, 0xB0_4D1E);
    let q = QuotaTable::uniform(&g, 1.0);

    for k in [1, 2, 3] {
        for workers in [1, 4] {
            let config = BundleIndexConfig {
                k,
                workers,
                ..BundleIndexConfig::default()
            };
            group.bench_with_input(
                BenchmarkId::new(format!("k{k}"), format!("workers{workers}")),
                &config,
                |b, config| {
                    b.iter(|| black_box(BundleIndex::compute(&g, &q, config).expect("compute")));
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, bench_star, bench_random);
criterion_main!(benches);
