use std::path::Path;

use serde::Serialize;

use crate::primitives::npy::Element;
use crate::storage::{Dir, StaticDiGraph};
use crate::types::NodeId;

use crate::admin::options::AdminOpenOptions;
use crate::admin::util::{open_graph, store_files};
use crate::admin::Result;

/// Everything `stats` reports about one store.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    /// Shape and degree figures.
    pub graph: GraphStats,
    /// Resident size of each CSR array.
    pub memory: MemoryStats,
    /// Files in the store directory.
    pub filesystem: FilesystemStats,
}

/// Shape and degree statistics of a graph.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    /// Number of nodes.
    pub order: u64,
    /// Number of edges, duplicates included.
    pub size: u64,
    /// Edges `u -> u`.
    pub self_loops: u64,
    /// Nodes with neither successors nor predecessors.
    pub isolated_nodes: u64,
    /// Largest successor count.
    pub max_out_degree: u64,
    /// Largest predecessor count.
    pub max_in_degree: u64,
    /// `size / order`, or `0.0` for an empty graph.
    pub mean_degree: f64,
}

/// Byte sizes of the four CSR arrays.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    /// Predecessor offsets.
    pub p_indptr_bytes: u64,
    /// Predecessor ids.
    pub p_indices_bytes: u64,
    /// Successor offsets.
    pub s_indptr_bytes: u64,
    /// Successor ids.
    pub s_indices_bytes: u64,
    /// Sum of the four arrays.
    pub total_bytes: u64,
    /// Whether any array is a view into a mapped file.
    pub mapped: bool,
}

/// On-disk layout of a store.
#[derive(Debug, Clone, Serialize)]
pub struct FilesystemStats {
    /// Store directory as given.
    pub store_path: String,
    /// `format_version` from `base.json`.
    pub format_version: u32,
    /// Expected store files that exist.
    pub files: Vec<FileStat>,
    /// Sum of `files` sizes.
    pub total_size_bytes: u64,
}

/// One file in a store directory.
#[derive(Debug, Clone, Serialize)]
pub struct FileStat {
    /// File name relative to the store.
    pub name: String,
    /// Length in bytes.
    pub size_bytes: u64,
}

/// Collects statistics about the store at `path`.
pub fn stats(path: impl AsRef<Path>, opts: &AdminOpenOptions) -> Result<StatsReport> {
    let path = path.as_ref();
    let handle = open_graph(path, opts)?;
    let files: Vec<FileStat> = store_files(path)
        .into_iter()
        .map(|(name, size_bytes)| FileStat { name, size_bytes })
        .collect();
    let total_size_bytes = files.iter().map(|f| f.size_bytes).sum();

    Ok(StatsReport {
        graph: graph_stats(&handle.graph),
        memory: memory_stats(&handle.graph),
        filesystem: FilesystemStats {
            store_path: path.display().to_string(),
            format_version: handle.meta.format_version,
            files,
            total_size_bytes,
        },
    })
}

/// Degree and shape statistics of an in-memory or loaded graph.
pub fn graph_stats(graph: &StaticDiGraph) -> GraphStats {
    let max_out_degree = max_degree(graph.indptr(Dir::Out));
    let max_in_degree = max_degree(graph.indptr(Dir::In));
    let s_indptr = graph.s_indptr();
    let p_indptr = graph.p_indptr();
    let isolated_nodes = (0..graph.order())
        .filter(|&k| s_indptr[k] == s_indptr[k + 1] && p_indptr[k] == p_indptr[k + 1])
        .count() as u64;
    let self_loops = graph.edges().filter(|(u, v)| u == v).count() as u64;
    let mean_degree = if graph.order() == 0 {
        0.0
    } else {
        graph.size() as f64 / graph.order() as f64
    };
    GraphStats {
        order: graph.order() as u64,
        size: graph.size() as u64,
        self_loops,
        isolated_nodes,
        max_out_degree,
        max_in_degree,
        mean_degree,
    }
}

fn max_degree(indptr: &[u64]) -> u64 {
    indptr.windows(2).map(|w| w[1].saturating_sub(w[0])).max().unwrap_or(0)
}

fn memory_stats(graph: &StaticDiGraph) -> MemoryStats {
    let offsets = |arr: &[u64]| (arr.len() * <u64 as Element>::SIZE) as u64;
    let ids = |arr: &[NodeId]| (arr.len() * <NodeId as Element>::SIZE) as u64;
    MemoryStats {
        p_indptr_bytes: offsets(graph.p_indptr()),
        p_indices_bytes: ids(graph.p_indices()),
        s_indptr_bytes: offsets(graph.s_indptr()),
        s_indices_bytes: ids(graph.s_indices()),
        total_bytes: graph.total_bytes() as u64,
        mapped: graph.is_mapped(),
    }
}
