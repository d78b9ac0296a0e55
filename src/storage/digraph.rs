use std::fmt;
use std::iter::FusedIterator;
use std::ops::Range;

use crate::storage::adjacency::Dir;
use crate::storage::array::CsrArray;
use crate::storage::compact::Csr;
use crate::types::{NodeId, Result, StaticGraphError};

/// Immutable directed graph stored as two CSR pairs, one for successors and
/// one for predecessors.
///
/// Every query is index arithmetic over the four backing arrays. Neighbor
/// lists are returned as borrowed ascending slices; nothing is copied.
pub struct StaticDiGraph {
    n_nodes: NodeId,
    n_edges: usize,
    p_indptr: CsrArray<u64>,
    p_indices: CsrArray<NodeId>,
    s_indptr: CsrArray<u64>,
    s_indices: CsrArray<NodeId>,
}

impl StaticDiGraph {
    pub(crate) fn from_csr(n_nodes: NodeId, predecessors: Csr, successors: Csr) -> Result<Self> {
        let n_edges = successors.indices.len();
        Self::from_parts(
            n_nodes,
            n_edges,
            predecessors.indptr.into(),
            predecessors.indices.into(),
            successors.indptr.into(),
            successors.indices.into(),
        )
    }

    /// Assembles a graph after shape checks on each CSR pair.
    ///
    /// Lengths are checked and each `indptr` is scanned to be non-decreasing
    /// from `0` to `n_edges`, which keeps every neighbor range in bounds. The
    /// `indices` payloads are not read so mapped lists stay unfaulted; their
    /// contents are validated by [`crate::admin::verify`].
    pub(crate) fn from_parts(
        n_nodes: NodeId,
        n_edges: usize,
        p_indptr: CsrArray<u64>,
        p_indices: CsrArray<NodeId>,
        s_indptr: CsrArray<u64>,
        s_indices: CsrArray<NodeId>,
    ) -> Result<Self> {
        check_shape("predecessor", n_nodes, n_edges, &p_indptr, &p_indices)?;
        check_shape("successor", n_nodes, n_edges, &s_indptr, &s_indices)?;
        Ok(Self {
            n_nodes,
            n_edges,
            p_indptr,
            p_indices,
            s_indptr,
            s_indices,
        })
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.n_nodes as usize
    }

    /// Number of edges, duplicates included.
    pub fn size(&self) -> usize {
        self.n_edges
    }

    /// Whether `u` lies in `0..order()`. Accepts any integer type, so
    /// negative ids simply answer `false`.
    pub fn has_node<N: TryInto<NodeId>>(&self, u: N) -> bool {
        u.try_into().map(|u| u < self.n_nodes).unwrap_or(false)
    }

    fn check(&self, u: NodeId) -> Result<usize> {
        if u < self.n_nodes {
            Ok(u as usize)
        } else {
            Err(StaticGraphError::invalid_query(u, self.n_nodes))
        }
    }

    /// Ascending targets of edges leaving `u`.
    pub fn successors(&self, u: NodeId) -> Result<&[NodeId]> {
        let k = self.check(u)?;
        Ok(&self.s_indices[span(&self.s_indptr, k)])
    }

    /// Ascending sources of edges entering `v`.
    pub fn predecessors(&self, v: NodeId) -> Result<&[NodeId]> {
        let k = self.check(v)?;
        Ok(&self.p_indices[span(&self.p_indptr, k)])
    }

    /// Successors or predecessors depending on `dir`.
    pub fn neighbors(&self, u: NodeId, dir: Dir) -> Result<&[NodeId]> {
        match dir {
            Dir::Out => self.successors(u),
            Dir::In => self.predecessors(u),
        }
    }

    /// Number of edges leaving `u`.
    pub fn out_degree(&self, u: NodeId) -> Result<usize> {
        let k = self.check(u)?;
        Ok(span(&self.s_indptr, k).len())
    }

    /// Number of edges entering `v`.
    pub fn in_degree(&self, v: NodeId) -> Result<usize> {
        let k = self.check(v)?;
        Ok(span(&self.p_indptr, k).len())
    }

    /// Degree in the given direction.
    pub fn degree(&self, u: NodeId, dir: Dir) -> Result<usize> {
        match dir {
            Dir::Out => self.out_degree(u),
            Dir::In => self.in_degree(u),
        }
    }

    /// Whether at least one edge `u -> v` exists.
    ///
    /// An out-of-range `u` is an error like any other query; a target outside
    /// the graph simply has no edge.
    pub fn has_edge(&self, u: NodeId, v: NodeId) -> Result<bool> {
        let targets = self.successors(u)?;
        Ok(v < self.n_nodes && targets.binary_search(&v).is_ok())
    }

    /// All node ids in ascending order.
    pub fn nodes(&self) -> Range<NodeId> {
        0..self.n_nodes
    }

    /// All edges ordered by source, then target.
    pub fn edges(&self) -> Edges<'_> {
        Edges {
            indptr: &self.s_indptr,
            indices: &self.s_indices,
            node: 0,
            pos: 0,
        }
    }

    /// Bytes held by the four backing arrays.
    pub fn total_bytes(&self) -> usize {
        self.p_indptr.nbytes()
            + self.p_indices.nbytes()
            + self.s_indptr.nbytes()
            + self.s_indices.nbytes()
    }

    /// Whether any backing array is memory-mapped.
    pub fn is_mapped(&self) -> bool {
        self.p_indptr.is_mapped()
            || self.p_indices.is_mapped()
            || self.s_indptr.is_mapped()
            || self.s_indices.is_mapped()
    }

    /// Predecessor offsets.
    pub fn p_indptr(&self) -> &[u64] {
        &self.p_indptr
    }

    /// Concatenated predecessor lists.
    pub fn p_indices(&self) -> &[NodeId] {
        &self.p_indices
    }

    /// Successor offsets.
    pub fn s_indptr(&self) -> &[u64] {
        &self.s_indptr
    }

    /// Concatenated successor lists.
    pub fn s_indices(&self) -> &[NodeId] {
        &self.s_indices
    }

    /// Offsets for one direction.
    pub fn indptr(&self, dir: Dir) -> &[u64] {
        match dir {
            Dir::Out => self.s_indptr(),
            Dir::In => self.p_indptr(),
        }
    }

    /// Neighbor lists for one direction.
    pub fn indices(&self, dir: Dir) -> &[NodeId] {
        match dir {
            Dir::Out => self.s_indices(),
            Dir::In => self.p_indices(),
        }
    }
}

fn span(indptr: &[u64], k: usize) -> Range<usize> {
    indptr[k] as usize..indptr[k + 1] as usize
}

fn check_shape(
    which: &str,
    n_nodes: NodeId,
    n_edges: usize,
    indptr: &[u64],
    indices: &[NodeId],
) -> Result<()> {
    let expected = n_nodes as usize + 1;
    if indptr.len() != expected {
        return Err(StaticGraphError::Storage(format!(
            "{which} indptr has {} entries, expected {expected}",
            indptr.len()
        )));
    }
    if indices.len() != n_edges {
        return Err(StaticGraphError::Storage(format!(
            "{which} indices has {} entries, expected {n_edges}",
            indices.len()
        )));
    }
    let first = indptr[0];
    let last = indptr[expected - 1];
    if first != 0 || last != n_edges as u64 {
        return Err(StaticGraphError::Storage(format!(
            "{which} indptr spans {first}..{last}, expected 0..{n_edges}"
        )));
    }
    if let Some(k) = indptr.windows(2).position(|w| w[1] < w[0]) {
        return Err(StaticGraphError::Storage(format!(
            "{which} indptr decreases at node {k}: {} -> {}",
            indptr[k],
            indptr[k + 1]
        )));
    }
    Ok(())
}

impl fmt::Debug for StaticDiGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticDiGraph")
            .field("n_nodes", &self.n_nodes)
            .field("n_edges", &self.n_edges)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}

/// Iterator over `(source, target)` pairs in successor-CSR order.
#[derive(Clone, Debug)]
pub struct Edges<'a> {
    indptr: &'a [u64],
    indices: &'a [NodeId],
    node: usize,
    pos: usize,
}

impl Iterator for Edges<'_> {
    type Item = (NodeId, NodeId);

    fn next(&mut self) -> Option<Self::Item> {
        let target = *self.indices.get(self.pos)?;
        while self.indptr[self.node + 1] as usize <= self.pos {
            self.node += 1;
        }
        self.pos += 1;
        Some((self.node as NodeId, target))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.indices.len() - self.pos;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Edges<'_> {}

impl FusedIterator for Edges<'_> {}
