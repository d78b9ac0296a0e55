#![allow(missing_docs)]

use staticgraph::types::Endpoint;
use staticgraph::{build, try_build, Dir, GraphBuilder, StaticDiGraph, StaticGraphError};

fn reference_graph() -> StaticDiGraph {
    build(4, vec![(0, 1), (0, 2), (1, 2), (2, 3)], 10).expect("build reference graph")
}

#[test]
fn reference_graph_arrays() {
    let g = reference_graph();
    assert_eq!(g.order(), 4);
    assert_eq!(g.size(), 4);
    assert_eq!(g.s_indptr(), &[0, 2, 3, 4, 4]);
    assert_eq!(g.s_indices(), &[1, 2, 2, 3]);
    assert_eq!(g.p_indptr(), &[0, 0, 1, 3, 4]);
    assert_eq!(g.p_indices(), &[0, 0, 1, 2]);
    assert!(g.has_edge(0, 2).unwrap());
    assert!(!g.has_edge(3, 0).unwrap());
}

#[test]
fn neighbor_queries_follow_direction() {
    let g = reference_graph();
    assert_eq!(g.successors(0).unwrap(), &[1, 2]);
    assert_eq!(g.predecessors(2).unwrap(), &[0, 1]);
    assert_eq!(g.neighbors(2, Dir::Out).unwrap(), g.successors(2).unwrap());
    assert_eq!(g.neighbors(2, Dir::In).unwrap(), g.predecessors(2).unwrap());
    assert_eq!(g.out_degree(0).unwrap(), 2);
    assert_eq!(g.in_degree(0).unwrap(), 0);
    assert_eq!(g.degree(3, Dir::In).unwrap(), 1);
    assert_eq!(g.degree(3, Dir::Out).unwrap(), 0);
    assert!(g.successors(3).unwrap().is_empty());
}

#[test]
fn node_membership_handles_any_integer() {
    let g = reference_graph();
    assert!(g.has_node(0u32));
    assert!(g.has_node(3i64));
    assert!(!g.has_node(-1i64));
    assert!(!g.has_node(4u32));
    assert!(!g.has_node(u64::MAX));
    assert_eq!(g.nodes().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}

#[test]
fn out_of_range_queries_are_rejected() {
    let g = reference_graph();
    for result in [g.successors(4), g.predecessors(7)] {
        match result {
            Err(StaticGraphError::InvalidNode {
                n_nodes, endpoint, ..
            }) => {
                assert_eq!(n_nodes, 4);
                assert_eq!(endpoint, Endpoint::Query);
            }
            other => panic!("expected InvalidNode, got {other:?}"),
        }
    }
    assert!(g.out_degree(4).is_err());
    assert!(matches!(
        g.has_edge(4, 0),
        Err(StaticGraphError::InvalidNode { node: 4, .. })
    ));
    assert!(!g.has_edge(0, 4).unwrap());
}

#[test]
fn duplicates_and_self_loops_are_kept() {
    let g = build(3, vec![(1, 1), (0, 2), (1, 1), (0, 2), (2, 0)], 5).unwrap();
    assert_eq!(g.size(), 5);
    assert_eq!(g.successors(1).unwrap(), &[1, 1]);
    assert_eq!(g.predecessors(1).unwrap(), &[1, 1]);
    assert_eq!(g.successors(0).unwrap(), &[2, 2]);
    assert_eq!(
        g.edges().collect::<Vec<_>>(),
        vec![(0, 2), (0, 2), (1, 1), (1, 1), (2, 0)]
    );
    assert_eq!(g.edges().len(), 5);
}

#[test]
fn edges_iterator_restarts() {
    let g = reference_graph();
    let first: Vec<_> = g.edges().collect();
    let second: Vec<_> = g.edges().collect();
    assert_eq!(first, second);
    assert_eq!(first, vec![(0, 1), (0, 2), (1, 2), (2, 3)]);
}

#[test]
fn isolated_and_empty_graphs() {
    let g = build(5, Vec::new(), 0).unwrap();
    assert_eq!(g.order(), 5);
    assert_eq!(g.size(), 0);
    assert_eq!(g.s_indptr(), &[0, 0, 0, 0, 0, 0]);
    for u in g.nodes() {
        assert!(g.successors(u).unwrap().is_empty());
        assert!(g.predecessors(u).unwrap().is_empty());
    }

    let empty = build(0, Vec::new(), 0).unwrap();
    assert_eq!(empty.order(), 0);
    assert_eq!(empty.s_indptr(), &[0]);
    assert_eq!(empty.nodes().count(), 0);
    assert!(!empty.has_node(0u32));
}

#[test]
fn invalid_source_reports_position_and_component() {
    let err = build(3, vec![(0, 1), (1, 2), (0, 3)], 3).unwrap_err();
    match err {
        StaticGraphError::InvalidNode {
            node,
            n_nodes,
            endpoint,
            position,
        } => {
            assert_eq!(node, 3);
            assert_eq!(n_nodes, 3);
            assert_eq!(endpoint, Endpoint::Target);
            assert_eq!(position, Some(2));
        }
        other => panic!("expected InvalidNode, got {other:?}"),
    }
    let err = build(0, vec![(0, 0)], 1).unwrap_err();
    assert!(err.to_string().contains("source"), "{err}");
}

#[test]
fn capacity_overflow_fails_explicitly() {
    let err = build(2, vec![(0, 1), (1, 0), (0, 0)], 2).unwrap_err();
    assert!(matches!(err, StaticGraphError::CapacityExceeded { capacity: 2 }));
}

#[test]
fn larger_capacity_than_needed_is_fine() {
    let g = build(2, vec![(1, 0)], 1_000).unwrap();
    assert_eq!(g.size(), 1);
    assert_eq!(g.p_indices().len(), 1);
}

#[test]
fn fallible_source_error_aborts_build() {
    let source = vec![
        Ok((0, 1)),
        Err(StaticGraphError::InvalidArgument("stream broke".into())),
        Ok((1, 0)),
    ];
    let err = try_build(2, source, 4).unwrap_err();
    assert!(err.to_string().contains("stream broke"));
}

#[test]
fn source_is_consumed_once() {
    let mut pulled = 0usize;
    let source = (0..6u32).map(|k| {
        pulled += 1;
        (k % 3, (k + 1) % 3)
    });
    let g = GraphBuilder::new(3).capacity(6).build(source).unwrap();
    assert_eq!(pulled, 6);
    assert_eq!(g.size(), 6);
}

#[test]
fn degree_sums_match_size() {
    let g = build(
        6,
        vec![(0, 5), (5, 0), (3, 3), (2, 4), (2, 1), (4, 2), (1, 1)],
        16,
    )
    .unwrap();
    let out: usize = g.nodes().map(|u| g.out_degree(u).unwrap()).sum();
    let inn: usize = g.nodes().map(|u| g.in_degree(u).unwrap()).sum();
    assert_eq!(out, g.size());
    assert_eq!(inn, g.size());
    for (u, v) in g.edges() {
        assert!(g.predecessors(v).unwrap().contains(&u));
    }
}

#[test]
fn memory_accounting_counts_all_arrays() {
    let g = reference_graph();
    assert_eq!(g.total_bytes(), 5 * 8 * 2 + 4 * 4 * 2);
    assert!(!g.is_mapped());
}
