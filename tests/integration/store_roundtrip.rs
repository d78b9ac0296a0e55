#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use staticgraph::store::{self, ArrayName, LoadOptions, META_FILE};
use staticgraph::{build, StaticDiGraph, StaticGraphError};
use tempfile::TempDir;

fn random_graph(n_nodes: u32, n_edges: usize, seed: u64) -> StaticDiGraph {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let edges: Vec<(u32, u32)> = (0..n_edges)
        .map(|_| (rng.gen_range(0..n_nodes), rng.gen_range(0..n_nodes)))
        .collect();
    build(n_nodes, edges, n_edges).expect("build random graph")
}

fn assert_same_graph(a: &StaticDiGraph, b: &StaticDiGraph) {
    assert_eq!(a.order(), b.order());
    assert_eq!(a.size(), b.size());
    for u in a.nodes() {
        assert_eq!(a.successors(u).unwrap(), b.successors(u).unwrap(), "successors of {u}");
        assert_eq!(
            a.predecessors(u).unwrap(),
            b.predecessors(u).unwrap(),
            "predecessors of {u}"
        );
    }
}

fn npy_payload_offset(path: &Path) -> usize {
    let bytes = fs::read(path).unwrap();
    let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
    10 + header_len
}

#[test]
fn roundtrip_owned_and_mapped() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("random");
    let g = random_graph(500, 20_000, 7);
    store::save(&path, &g).unwrap();

    let owned = store::load_with(&path, &LoadOptions::in_memory()).unwrap();
    assert!(!owned.is_mapped());
    assert_same_graph(&g, &owned);

    let mapped = store::load(&path).unwrap();
    if cfg!(target_endian = "little") {
        assert!(mapped.is_mapped(), "payloads above the threshold are mapped");
    }
    assert_same_graph(&g, &mapped);
    assert_eq!(mapped.total_bytes(), g.total_bytes());
    assert_eq!(
        mapped.edges().collect::<Vec<_>>(),
        g.edges().collect::<Vec<_>>()
    );
}

#[test]
fn small_arrays_are_read_not_mapped() {
    let dir = TempDir::new().unwrap();
    let g = build(3, vec![(0, 1), (1, 2)], 2).unwrap();
    store::save(dir.path(), &g).unwrap();
    let loaded = store::load(dir.path()).unwrap();
    assert!(!loaded.is_mapped());
    assert_same_graph(&g, &loaded);
}

#[test]
fn mapped_graph_outlives_store_removal() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("g");
    let g = random_graph(50, 400, 3);
    store::save(&path, &g).unwrap();
    let mapped = store::load_with(&path, &LoadOptions::default().mmap_min_bytes(0)).unwrap();
    drop(dir);
    assert_same_graph(&g, &mapped);
}

#[test]
fn arrays_use_npy_layout() {
    let dir = TempDir::new().unwrap();
    let g = build(4, vec![(0, 1), (0, 2), (1, 2), (2, 3)], 10).unwrap();
    store::save(dir.path(), &g).unwrap();

    let indptr = fs::read(ArrayName::SIndptr.path(dir.path())).unwrap();
    assert_eq!(&indptr[..8], b"\x93NUMPY\x01\x00");
    let header = String::from_utf8_lossy(&indptr[10..npy_payload_offset(&ArrayName::SIndptr.path(dir.path()))]).to_string();
    assert!(header.contains("'descr': '<u8'"), "{header}");
    assert!(header.contains("'fortran_order': False"), "{header}");
    assert!(header.contains("'shape': (5,)"), "{header}");
    assert!(header.ends_with('\n'));

    for name in ArrayName::ALL {
        let path = name.path(dir.path());
        assert_eq!(npy_payload_offset(&path) % 64, 0, "{name:?} payload misaligned");
    }

    let indices = fs::read(ArrayName::SIndices.path(dir.path())).unwrap();
    let offset = npy_payload_offset(&ArrayName::SIndices.path(dir.path()));
    let payload: Vec<u32> = indices[offset..]
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    assert_eq!(payload, vec![1, 2, 2, 3]);
}

#[test]
fn metadata_records_counts_and_checksums() {
    let dir = TempDir::new().unwrap();
    let g = random_graph(10, 30, 11);
    let meta = store::save(dir.path(), &g).unwrap();

    let raw: serde_json::Value =
        serde_json::from_slice(&fs::read(dir.path().join(META_FILE)).unwrap()).unwrap();
    assert_eq!(raw["format_version"], 1);
    assert_eq!(raw["n_nodes"], 10);
    assert_eq!(raw["n_edges"], 30);
    assert!(raw["checksums"]["s_indices"].is_number());
    assert_eq!(store::read_meta(dir.path()).unwrap(), meta);
}

#[test]
fn save_overwrites_existing_store() {
    let dir = TempDir::new().unwrap();
    store::save(dir.path(), &random_graph(20, 100, 1)).unwrap();
    let second = build(2, vec![(1, 0)], 1).unwrap();
    store::save(dir.path(), &second).unwrap();
    let loaded = store::load_with(dir.path(), &LoadOptions::in_memory()).unwrap();
    assert_same_graph(&second, &loaded);
}

#[test]
fn empty_graph_roundtrips() {
    let dir = TempDir::new().unwrap();
    let g = build(0, Vec::new(), 0).unwrap();
    store::save(dir.path(), &g).unwrap();
    for opts in [LoadOptions::in_memory(), LoadOptions::default().mmap_min_bytes(0)] {
        let loaded = store::load_with(dir.path(), &opts).unwrap();
        assert_eq!(loaded.order(), 0);
        assert_eq!(loaded.size(), 0);
        assert_eq!(loaded.s_indptr(), &[0]);
    }
}

#[test]
fn truncated_array_is_rejected() {
    let dir = TempDir::new().unwrap();
    store::save(dir.path(), &random_graph(8, 16, 5)).unwrap();
    let path = ArrayName::PIndices.path(dir.path());
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 4]).unwrap();

    for opts in [LoadOptions::in_memory(), LoadOptions::default().mmap_min_bytes(0)] {
        let err = store::load_with(dir.path(), &opts).unwrap_err();
        assert!(matches!(err, StaticGraphError::Storage(_)), "{err}");
    }
}

#[test]
fn wrong_dtype_is_rejected() {
    let dir = TempDir::new().unwrap();
    store::save(dir.path(), &random_graph(8, 16, 9)).unwrap();
    // Swap an indices file in where an indptr file is expected.
    fs::copy(
        ArrayName::SIndices.path(dir.path()),
        ArrayName::SIndptr.path(dir.path()),
    )
    .unwrap();
    let err = store::load_with(dir.path(), &LoadOptions::in_memory()).unwrap_err();
    assert!(matches!(err, StaticGraphError::Storage(_)), "{err}");
}

#[test]
fn corrupt_interior_indptr_entry_is_rejected() {
    let dir = TempDir::new().unwrap();
    let g = build(4, vec![(0, 1), (0, 2), (1, 2), (2, 3)], 10).unwrap();
    store::save(dir.path(), &g).unwrap();
    let path = ArrayName::SIndptr.path(dir.path());
    let offset = npy_payload_offset(&path);
    let mut bytes = fs::read(&path).unwrap();
    // [0, 2, 3, 4, 4] becomes [0, 9, 3, 4, 4].
    bytes[offset + 8..offset + 16].copy_from_slice(&9u64.to_le_bytes());
    fs::write(&path, bytes).unwrap();

    for opts in [LoadOptions::in_memory(), LoadOptions::default().mmap_min_bytes(0)] {
        let err = store::load_with(dir.path(), &opts).unwrap_err();
        assert!(matches!(err, StaticGraphError::Storage(_)), "{err}");
        assert!(err.to_string().contains("indptr decreases"), "{err}");
    }
}
