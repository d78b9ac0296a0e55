use tracing::trace;

use crate::types::{Endpoint, NodeId, Result, StaticGraphError};

/// Fixed-capacity store of `(source, target)` pairs collected before compaction.
///
/// Storage for `capacity` pairs is reserved up front; the logical length is the
/// number of pairs actually appended. Appending beyond the capacity fails with
/// [`StaticGraphError::CapacityExceeded`] instead of reallocating.
#[derive(Debug, Clone)]
pub struct EdgeBuffer {
    n_nodes: NodeId,
    capacity: usize,
    pairs: Vec<(NodeId, NodeId)>,
}

impl EdgeBuffer {
    /// Reserves room for `capacity` pairs over the node range `0..n_nodes`.
    pub fn with_capacity(n_nodes: NodeId, capacity: usize) -> Result<Self> {
        let mut pairs = Vec::new();
        pairs.try_reserve_exact(capacity).map_err(|err| {
            StaticGraphError::InvalidArgument(format!(
                "cannot reserve room for {capacity} edges: {err}"
            ))
        })?;
        Ok(Self {
            n_nodes,
            capacity,
            pairs,
        })
    }

    /// Creates a buffer and drains `edges` into it.
    pub fn populate<I>(n_nodes: NodeId, edges: I, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = (NodeId, NodeId)>,
    {
        Self::try_populate(n_nodes, edges.into_iter().map(Ok), capacity)
    }

    /// Like [`EdgeBuffer::populate`] for sources that can fail mid-stream.
    ///
    /// The first error from the source aborts population and is returned as is.
    pub fn try_populate<I>(n_nodes: NodeId, edges: I, capacity: usize) -> Result<Self>
    where
        I: IntoIterator<Item = Result<(NodeId, NodeId)>>,
    {
        let mut buffer = Self::with_capacity(n_nodes, capacity)?;
        for edge in edges {
            let (src, dst) = edge?;
            buffer.push(src, dst)?;
        }
        trace!(
            edges = buffer.len(),
            capacity = buffer.capacity,
            "edge buffer populated"
        );
        Ok(buffer)
    }

    /// Appends one edge after validating both endpoints.
    pub fn push(&mut self, src: NodeId, dst: NodeId) -> Result<()> {
        let position = self.pairs.len();
        if position == self.capacity {
            return Err(StaticGraphError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.check(src, Endpoint::Source, position)?;
        self.check(dst, Endpoint::Target, position)?;
        self.pairs.push((src, dst));
        Ok(())
    }

    fn check(&self, node: NodeId, endpoint: Endpoint, position: usize) -> Result<()> {
        if node < self.n_nodes {
            return Ok(());
        }
        Err(StaticGraphError::InvalidNode {
            node: i64::from(node),
            n_nodes: self.n_nodes,
            endpoint,
            position: Some(position as u64),
        })
    }

    /// Number of node ids the buffer accepts.
    pub fn n_nodes(&self) -> NodeId {
        self.n_nodes
    }

    /// Number of pairs appended so far.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Whether no pairs were appended.
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The capacity estimate the buffer was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The appended pairs, in their current order.
    pub fn as_slice(&self) -> &[(NodeId, NodeId)] {
        &self.pairs
    }

    /// Sorts pairs ascending by `(source, target)`.
    pub fn sort(&mut self) {
        self.pairs.sort_unstable();
    }

    /// Exchanges source and target of every pair in place.
    pub fn swap(&mut self) {
        for pair in &mut self.pairs {
            *pair = (pair.1, pair.0);
        }
    }

    /// Consumes the buffer and returns it with every pair reversed, reusing
    /// the same allocation.
    pub fn transpose(mut self) -> Self {
        self.swap();
        self
    }
}
