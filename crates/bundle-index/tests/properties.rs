use bundle_core::graph::{Direction, GraphBuilder, ParallelEdgePolicy, WeightedDigraph, WeightedGraph};
use bundle_core::quota::QuotaTable;
use bundle_index::{BundleIndex, BundleIndexConfig, Enumeration, SubsetGenerator};
use proptest::prelude::*;

/// Random directed multigraph on `n` vertices with weights in `(0, 2]`.
fn arb_graph() -> impl Strategy<Value = WeightedDigraph> {
    (1usize..8).prop_flat_map(|n| {
        let edge = (0..n, 0..n, 1u32..=8);
        proptest::collection::vec(edge, 0..(n * n)).prop_map(move |edges| {
            let mut b = GraphBuilder::new();
            for i in 0..n {
                b.add_vertex(&format!("v{i}"));
            }
            for (from, to, w) in edges {
                b.add_edge(&format!("v{from}"), &format!("v{to}"), f64::from(w) / 4.0)
                    .expect("finite weight");
            }
            b.build()
        })
    })
}

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Incoming), Just(Direction::Outgoing)]
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(128))]

    #[test]
    fn normalized_scores_sum_to_one(
        g in arb_graph(),
        k in 1usize..4,
        quota in 0u32..12,
        direction in arb_direction(),
    ) {
        let config = BundleIndexConfig { k, direction, ..BundleIndexConfig::default() };
        let q = QuotaTable::uniform(&g, f64::from(quota) / 4.0);
        let index = BundleIndex::compute(&g, &q, &config).expect("compute");

        let total: f64 = index.scores().values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "sum = {}", total);
        prop_assert_eq!(index.len(), g.vertex_count());
    }

    #[test]
    fn worker_count_and_strategy_do_not_change_scores(
        g in arb_graph(),
        k in 1usize..4,
        quota in 0u32..12,
        direction in arb_direction(),
    ) {
        let q = QuotaTable::uniform(&g, f64::from(quota) / 4.0);
        let base = BundleIndexConfig {
            k,
            direction,
            normalize: false,
            enumeration: Enumeration::Recursive,
            ..BundleIndexConfig::default()
        };
        let sequential = BundleIndex::compute(&g, &q, &base).expect("sequential");

        let parallel_iterative = BundleIndexConfig {
            workers: 4,
            enumeration: Enumeration::Iterative,
            ..base.clone()
        };
        let parallel = BundleIndex::compute(&g, &q, &parallel_iterative).expect("parallel");

        prop_assert_eq!(sequential.scores(), parallel.scores());
    }

    #[test]
    fn critical_sets_are_adjacent_and_bounded(
        g in arb_graph(),
        k in 0usize..4,
        direction in arb_direction(),
    ) {
        for v in g.vertices() {
            let candidates: Vec<_> = g.vertices().into_iter().filter(|&u| u != v).collect();
            let generator = SubsetGenerator::new(&g, v, k, direction);
            let sets = generator.generate(&candidates);

            prop_assert!(sets.iter().any(|s| s.is_empty()));
            for set in &sets {
                prop_assert!(set.len() <= k);
                prop_assert!(set.members().iter().all(|&m| generator.is_adjacent(m)));
            }

            // Every adjacent candidate subset of size ≤ k is present: the count
            // is Σ C(d, i) over i = 0..=k for d adjacent candidates.
            let d = candidates.iter().filter(|&&u| generator.is_adjacent(u)).count();
            let expected: usize = (0..=k.min(d)).map(|i| binomial(d, i)).sum();
            prop_assert_eq!(sets.len(), expected);
        }
    }

    #[test]
    fn sum_policy_never_scores_below_first(
        g in arb_graph(),
        k in 1usize..3,
        quota in 0u32..12,
    ) {
        let q = QuotaTable::uniform(&g, f64::from(quota) / 4.0);
        let config = |parallel_edges| BundleIndexConfig {
            k,
            normalize: false,
            parallel_edges,
            ..BundleIndexConfig::default()
        };
        let sum = BundleIndex::compute(&g, &q, &config(ParallelEdgePolicy::Sum)).expect("sum");
        let first = BundleIndex::compute(&g, &q, &config(ParallelEdgePolicy::First)).expect("first");

        for (label, s) in sum.scores() {
            prop_assert!(*s >= first.score(label).expect("same vertex set"));
        }
    }
}

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}
