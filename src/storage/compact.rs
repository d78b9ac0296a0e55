use crate::types::{Endpoint, NodeId, Result, StaticGraphError};

/// A compressed-sparse-row adjacency: `indices[indptr[k]..indptr[k + 1]]`
/// are the neighbors of node `k`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Csr {
    /// Per-node start offsets; `n_nodes + 1` entries ending at `n_edges`.
    pub indptr: Vec<u64>,
    /// Concatenated neighbor lists.
    pub indices: Vec<NodeId>,
}

/// Compacts pairs sorted by source into CSR form in a single forward pass.
///
/// Ties on the source keep their relative order, so pairs sorted by
/// `(source, target)` produce ascending neighbor lists. A source that goes
/// backwards or falls outside `0..n_nodes` is rejected rather than producing
/// a corrupt `indptr`.
pub fn compact(n_nodes: NodeId, sorted: &[(NodeId, NodeId)]) -> Result<Csr> {
    let n = n_nodes as usize;
    let mut indptr: Vec<u64> = Vec::with_capacity(n + 1);
    let mut indices: Vec<NodeId> = Vec::with_capacity(sorted.len());

    for (pos, &(src, dst)) in sorted.iter().enumerate() {
        if src >= n_nodes {
            return Err(StaticGraphError::InvalidNode {
                node: i64::from(src),
                n_nodes,
                endpoint: Endpoint::Source,
                position: Some(pos as u64),
            });
        }
        let k = src as usize;
        if k + 1 < indptr.len() {
            return Err(StaticGraphError::InvalidArgument(format!(
                "pairs not sorted by source: node {src} at position {pos} follows node {}",
                indptr.len() - 1
            )));
        }
        // Nodes up to `src` that have no offset yet start here.
        while indptr.len() <= k {
            indptr.push(pos as u64);
        }
        indices.push(dst);
    }

    let total = indices.len() as u64;
    indptr.resize(n + 1, total);
    Ok(Csr { indptr, indices })
}
