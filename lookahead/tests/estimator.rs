//! End-to-end behaviour of the estimator on reference and synthetic fabrics.

use eda_common::characterization::{Characterization, GroupCharacterization};
use eda_common::fabric::{Axis, HierarchyEntry, HierarchyError, TileCoord, TimingGroup};
use eda_common::util::config::LookaheadConfig;
use eda_lookahead::planner::Route;
use eda_lookahead::{ConstructionError, Estimator, InvariantViolation, LookaheadError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use TimingGroup::*;

fn entry(group: TimingGroup, next: &[TimingGroup]) -> HierarchyEntry {
    HierarchyEntry {
        group,
        next: next.to_vec(),
    }
}

fn flat(group: TimingGroup, k0: f64, k2: f64) -> GroupCharacterization {
    GroupCharacterization::new(group, k0, 0.0, k2, 0.0)
}

fn reference(width: u32, height: u32) -> Estimator {
    let config = LookaheadConfig::default().with_tables(width, height);
    Estimator::build(&Characterization::reference(), &config).unwrap()
}

#[test]
fn straight_delays_grow_with_distance() {
    let est = reference(12, 24);
    for (axis, limit) in [(Axis::Horizontal, 12), (Axis::Vertical, 24)] {
        let src = TileCoord::new(3, 3);
        let mut previous = 0;
        for d in 0..=limit {
            let sink = match axis {
                Axis::Horizontal => TileCoord::new(3 + d, 3),
                Axis::Vertical => TileCoord::new(3, 3 + d),
            };
            let delay = est.estimate_delay(src, sink).unwrap();
            assert!(
                delay >= previous,
                "{axis} distance {d}: {delay} < {previous}"
            );
            previous = delay;
        }
    }
}

#[test]
fn straight_delays_grow_past_the_table() {
    let est = reference(12, 24);
    let src = TileCoord::new(0, 0);
    let mut previous = (0, 0);
    for d in 0..=90 {
        let h = est.estimate_delay(src, TileCoord::new(d, 0)).unwrap();
        let v = est.estimate_delay(src, TileCoord::new(0, d)).unwrap();
        assert!(h >= previous.0, "horizontal {d}: {h} < {}", previous.0);
        assert!(v >= previous.1, "vertical {d}: {v} < {}", previous.1);
        previous = (h, v);
    }
}

#[test]
fn diagonal_delays_grow_with_either_offset() {
    let est = reference(12, 24);
    let src = TileCoord::new(0, 0);
    let mut previous = 0;
    for dx in 1..=40 {
        let delay = est.estimate_delay(src, TileCoord::new(dx, 3)).unwrap();
        assert!(delay >= previous, "dx {dx}: {delay} < {previous}");
        previous = delay;
    }
    previous = 0;
    for dy in 1..=50 {
        let delay = est.estimate_delay(src, TileCoord::new(2, dy)).unwrap();
        assert!(delay >= previous, "dy {dy}: {delay} < {previous}");
        previous = delay;
    }
}

#[test]
fn reference_horizontal_sweep() {
    let est = reference(8, 14);
    let src = TileCoord::new(0, 0);
    let delays: Vec<u32> = (0..=8)
        .map(|x| est.estimate_delay(src, TileCoord::new(x, 0)).unwrap())
        .collect();
    assert_eq!(delays, vec![11, 29, 51, 75, 97, 117, 139, 163, 184]);
}

#[test]
fn every_table_cell_is_legal_and_pruned() {
    let est = reference(7, 13);
    let h = est.hierarchy();
    let tables = est.tables();
    let mut seen = 0;
    for axis in Axis::ALL {
        for distance in 0..=tables.limit(axis) {
            for from in TimingGroup::ALL {
                for to in TimingGroup::ALL {
                    let Some(graph) = tables.get(axis, distance, from, to) else {
                        continue;
                    };
                    seen += 1;
                    for edge in graph.edges() {
                        let a = graph.vertex(edge.from).group;
                        let b = graph.vertex(edge.to).group;
                        assert!(h.is_legal(a, b), "{axis} {from}->{to}@{distance}: {a}->{b}");
                    }
                    assert!(graph.dead_vertices().is_empty());
                    assert!(graph.topological_order().is_some());
                }
            }
        }
    }
    assert_eq!(seen, est.stats().cells);
}

#[test]
fn blob_round_trip_preserves_answers() {
    let est = reference(8, 14);
    let bytes = est.serialize().unwrap();
    let back = Estimator::deserialize(&bytes).unwrap();
    assert_eq!(back.stats(), est.stats());
    assert_eq!(back.config(), est.config());

    let mut rng = StdRng::seed_from_u64(0x1ead);
    for _ in 0..200 {
        let a = TileCoord::new(rng.gen_range(0..30), rng.gen_range(0..30));
        let b = TileCoord::new(rng.gen_range(0..30), rng.gen_range(0..30));
        assert_eq!(
            est.estimate_delay(a, b).ok(),
            back.estimate_delay(a, b).ok(),
            "{a} -> {b}"
        );
    }
}

#[test]
fn corrupt_blob_is_a_serialization_error() {
    let est = reference(7, 13);
    let mut bytes = est.serialize().unwrap();
    bytes.truncate(bytes.len() / 2);
    let err = Estimator::deserialize(&bytes).unwrap_err();
    assert!(matches!(err, LookaheadError::Serialization(_)));
}

/// Doubles only, 10 ps + 1 ps per tile each.
fn doubles_only() -> (Characterization, LookaheadConfig) {
    let characterization = Characterization {
        groups: vec![
            flat(LogicOut, 0.0, 0.0),
            flat(LogicIn, 0.0, 0.0),
            flat(HorzDouble, 10.0, 1.0),
            flat(VertDouble, 10.0, 1.0),
        ],
        hierarchy: Some(vec![
            entry(LogicOut, &[HorzDouble, VertDouble]),
            entry(HorzDouble, &[HorzDouble, VertDouble, LogicIn]),
            entry(VertDouble, &[HorzDouble, VertDouble, LogicIn]),
            entry(LogicIn, &[]),
        ]),
    };
    let mut config = LookaheadConfig::default().with_tables(8, 8);
    config.strict_tables = false;
    config.detour_budget = 2;
    (characterization, config)
}

#[test]
fn diagonal_query_bends_once() {
    let (characterization, config) = doubles_only();
    let est = Estimator::build(&characterization, &config).unwrap();
    let e = est
        .explain(TileCoord::new(0, 0), TileCoord::new(4, 4))
        .unwrap();
    assert_eq!(e.delay, 48);
    assert!(matches!(e.route, Route::Bend { key: VertDouble, .. }));
    assert_eq!(e.legs.len(), 2);
    assert_eq!(
        est.estimate_delay(TileCoord::new(4, 4), TileCoord::new(0, 0))
            .unwrap(),
        48
    );
}

#[test]
fn odd_offsets_have_no_table_entry_or_split() {
    let (characterization, config) = doubles_only();
    let est = Estimator::build(&characterization, &config).unwrap();
    // Inside the table the direct cell itself is missing.
    let err = est
        .estimate_delay(TileCoord::new(0, 0), TileCoord::new(3, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        LookaheadError::Invariant(InvariantViolation::MissingTable {
            axis: Axis::Horizontal,
            distance: 3,
            from: LogicOut,
            to: LogicIn,
        })
    ));
    // Past it, no split exists.
    let err = est
        .estimate_delay(TileCoord::new(0, 0), TileCoord::new(11, 0))
        .unwrap_err();
    assert!(matches!(
        err,
        LookaheadError::Invariant(InvariantViolation::NoDecomposition { .. })
    ));
}

/// Cheap six-tile long wires, expensive singles.
fn long_wires(width: u32) -> Estimator {
    long_wires_driving(width, &[HorzLong, HorzSingle, LogicIn])
}

fn long_wires_driving(width: u32, long_next: &[TimingGroup]) -> Estimator {
    let characterization = Characterization {
        groups: vec![
            flat(LogicOut, 0.0, 0.0),
            flat(LogicIn, 0.0, 0.0),
            flat(HorzSingle, 50.0, 1.0),
            flat(HorzLong, 5.0, 1.0),
            flat(VertSingle, 50.0, 1.0),
        ],
        hierarchy: Some(vec![
            entry(LogicOut, &[HorzSingle, HorzLong, VertSingle]),
            entry(HorzSingle, &[HorzSingle, HorzLong, LogicIn]),
            entry(HorzLong, long_next),
            entry(VertSingle, &[VertSingle, LogicIn]),
            entry(LogicIn, &[]),
        ]),
    };
    let config = LookaheadConfig::default().with_tables(width, 4);
    Estimator::build(&characterization, &config).unwrap()
}

#[test]
fn extension_matches_a_wide_table() {
    let narrow = long_wires(6);
    let wide = long_wires(18);
    let src = TileCoord::new(0, 0);

    let far = TileCoord::new(18, 0);
    let e = narrow.explain(src, far).unwrap();
    assert_eq!(e.delay, 33);
    assert!(e.legs[0].extension.is_some());
    assert_eq!(wide.estimate_delay(src, far).unwrap(), 33);

    for x in 7..=18 {
        let sink = TileCoord::new(x, 0);
        assert_eq!(
            narrow.estimate_delay(src, sink).unwrap(),
            wide.estimate_delay(src, sink).unwrap(),
            "x = {x}"
        );
    }
}

#[test]
fn extension_never_chains_long_wires_the_hierarchy_forbids() {
    let narrow = long_wires_driving(6, &[HorzSingle, LogicIn]);
    let wide = long_wires_driving(24, &[HorzSingle, LogicIn]);
    let src = TileCoord::new(0, 0);

    for x in 7..=12 {
        let sink = TileCoord::new(x, 0);
        let e = narrow.explain(src, sink).unwrap();
        assert_eq!(e.legs[0].extension.map(|ext| ext.long_hops), Some(0));
        assert_eq!(e.delay, wide.estimate_delay(src, sink).unwrap(), "x = {x}");
    }

    // long, single, long, then singles.
    assert_eq!(wide.estimate_delay(src, TileCoord::new(18, 0)).unwrap(), 328);
    for x in 13..=24 {
        let err = narrow.estimate_delay(src, TileCoord::new(x, 0)).unwrap_err();
        assert!(
            matches!(
                err,
                LookaheadError::Invariant(InvariantViolation::NoDecomposition { .. })
            ),
            "x = {x}: {err}"
        );
    }
}

#[test]
fn very_slow_long_runs_saturate() {
    let characterization = Characterization {
        groups: vec![
            flat(LogicOut, 0.0, 0.0),
            flat(LogicIn, 0.0, 0.0),
            flat(HorzSingle, 50.0, 1.0),
            flat(HorzLong, 3.0e9, 1.0),
        ],
        hierarchy: Some(vec![
            entry(LogicOut, &[HorzSingle, HorzLong]),
            entry(HorzSingle, &[HorzSingle, HorzLong, LogicIn]),
            entry(HorzLong, &[HorzLong, HorzSingle, LogicIn]),
            entry(LogicIn, &[]),
        ]),
    };
    let config = LookaheadConfig::default().with_tables(6, 4);
    let est = Estimator::build(&characterization, &config).unwrap();
    // Every split needs at least three long wires.
    let delay = est
        .estimate_delay(TileCoord::new(0, 0), TileCoord::new(24, 0))
        .unwrap();
    assert_eq!(delay, u32::MAX);
}

#[test]
fn tables_that_cannot_hold_a_begin_cell_are_rejected() {
    let config = LookaheadConfig::default().with_tables(12, 12);
    let err = Estimator::build(&Characterization::reference(), &config).unwrap_err();
    assert!(matches!(
        err,
        LookaheadError::Construction(ConstructionError::TableTooNarrow {
            axis: Axis::Vertical,
            limit: 12,
            required: 13,
        })
    ));
}

#[test]
fn group_that_cannot_reach_logic_in_fails_construction() {
    let characterization = Characterization {
        groups: Characterization::reference().groups,
        hierarchy: Some(vec![
            entry(LogicOut, &[HorzSingle, VertSingle]),
            entry(HorzSingle, &[HorzSingle]),
            entry(VertSingle, &[VertSingle, LogicIn]),
            entry(LogicIn, &[]),
        ]),
    };
    let err = Estimator::build(&characterization, &LookaheadConfig::default()).unwrap_err();
    assert!(matches!(
        err,
        LookaheadError::Construction(ConstructionError::Hierarchy(
            HierarchyError::InputUnreachable(HorzSingle)
        ))
    ));
}

#[test]
fn queries_run_concurrently() {
    let est = reference(8, 14);
    let pairs: Vec<(TileCoord, TileCoord)> = (0..8)
        .map(|i| (TileCoord::new(i, 0), TileCoord::new(8 - i, 5)))
        .collect();
    let expected: Vec<_> = pairs
        .iter()
        .map(|&(a, b)| est.estimate_delay(a, b).unwrap())
        .collect();
    std::thread::scope(|s| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                s.spawn(|| {
                    pairs
                        .iter()
                        .map(|&(a, b)| est.estimate_delay(a, b).unwrap())
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
