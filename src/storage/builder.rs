use std::time::Instant;

use tracing::{debug, info};

use crate::storage::compact::compact;
use crate::storage::digraph::StaticDiGraph;
use crate::storage::edgelist::EdgeBuffer;
use crate::types::{NodeId, Result};

/// Builds a [`StaticDiGraph`] from a one-shot edge source.
///
/// The source is consumed exactly once. The reverse adjacency is derived by
/// transposing and re-sorting the already collected pairs in place, so peak
/// memory is one edge buffer plus the arrays produced so far.
#[derive(Clone, Debug)]
pub struct GraphBuilder {
    n_nodes: NodeId,
    capacity: usize,
}

impl GraphBuilder {
    /// Starts a builder for the node range `0..n_nodes` with no edge room.
    pub fn new(n_nodes: NodeId) -> Self {
        Self {
            n_nodes,
            capacity: 0,
        }
    }

    /// Sets the capacity estimate: an upper bound on the number of edges the
    /// source will yield.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Consumes `edges` and builds the graph.
    pub fn build<I>(&self, edges: I) -> Result<StaticDiGraph>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        self.try_build(edges.into_iter().map(Ok))
    }

    /// Like [`GraphBuilder::build`] for sources that can fail mid-stream.
    pub fn try_build<I>(&self, edges: I) -> Result<StaticDiGraph>
    where
        I: IntoIterator<Item = Result<(NodeId, NodeId)>>,
    {
        let started = Instant::now();
        let buffer = EdgeBuffer::try_populate(self.n_nodes, edges, self.capacity)?;
        debug!(
            n_nodes = self.n_nodes,
            edges = buffer.len(),
            capacity = self.capacity,
            "edge source drained"
        );
        self.assemble(buffer, started)
    }

    /// Builds the graph from an already populated buffer.
    pub fn from_buffer(buffer: EdgeBuffer) -> Result<StaticDiGraph> {
        let builder = Self::new(buffer.n_nodes()).capacity(buffer.capacity());
        builder.assemble(buffer, Instant::now())
    }

    fn assemble(&self, mut buffer: EdgeBuffer, started: Instant) -> Result<StaticDiGraph> {
        buffer.sort();
        let successors = compact(self.n_nodes, buffer.as_slice())?;
        debug!(edges = successors.indices.len(), "successor csr compacted");

        let mut buffer = buffer.transpose();
        buffer.sort();
        let predecessors = compact(self.n_nodes, buffer.as_slice())?;
        drop(buffer);
        debug!(edges = predecessors.indices.len(), "predecessor csr compacted");

        let graph = StaticDiGraph::from_csr(self.n_nodes, predecessors, successors)?;
        info!(
            n_nodes = graph.order(),
            n_edges = graph.size(),
            bytes = graph.total_bytes(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "static graph built"
        );
        Ok(graph)
    }
}

/// Builds a graph over `0..n_nodes` from `edges`, reserving room for
/// `capacity` edges. Yielding more than `capacity` edges is an error.
pub fn build<I>(n_nodes: NodeId, edges: I, capacity: usize) -> Result<StaticDiGraph>
where
    I: IntoIterator<Item = (NodeId, NodeId)>,
{
    GraphBuilder::new(n_nodes).capacity(capacity).build(edges)
}

/// [`build`] for fallible edge sources.
pub fn try_build<I>(n_nodes: NodeId, edges: I, capacity: usize) -> Result<StaticDiGraph>
where
    I: IntoIterator<Item = Result<(NodeId, NodeId)>>,
{
    GraphBuilder::new(n_nodes).capacity(capacity).try_build(edges)
}
