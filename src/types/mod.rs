//! Core identifiers, error type and result alias shared across the crate.

use std::io;

use thiserror::Error;

/// Checksums over persisted array payloads.
pub mod checksum;

/// Identifier of a node. Nodes always form the contiguous range `0..n_nodes`.
pub type NodeId = u32;

/// Result type for staticgraph operations.
pub type Result<T> = std::result::Result<T, StaticGraphError>;

/// Which half of an edge a rejected node id came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Endpoint {
    /// The edge source.
    Source,
    /// The edge target.
    Target,
    /// A node id passed directly to a query.
    Query,
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Source => f.write_str("source"),
            Endpoint::Target => f.write_str("target"),
            Endpoint::Query => f.write_str("query"),
        }
    }
}

/// Errors raised while building, querying or persisting a graph.
#[derive(Debug, Error)]
pub enum StaticGraphError {
    /// A node id outside `[0, n_nodes)` was supplied.
    #[error("invalid node {node} ({endpoint}{}): graph has {n_nodes} nodes", edge_suffix(.position))]
    InvalidNode {
        /// The offending id, widened so negative input can be reported.
        node: i64,
        /// Number of nodes in the graph being built or queried.
        n_nodes: u32,
        /// Which component of the pair carried the id.
        endpoint: Endpoint,
        /// Zero-based position of the pair in the edge source, if any.
        position: Option<u64>,
    },
    /// The edge source produced more pairs than the capacity estimate.
    #[error("edge source exceeded capacity estimate of {capacity} edges")]
    CapacityExceeded {
        /// The capacity estimate supplied by the caller.
        capacity: usize,
    },
    /// Missing or corrupt store contents, or an unusable store path.
    #[error("storage error: {0}")]
    Storage(String),
    /// I/O error from the underlying filesystem.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Metadata could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
    /// Invalid argument or precondition violation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

fn edge_suffix(position: &Option<u64>) -> String {
    match position {
        Some(p) => format!(" of edge #{p}"),
        None => String::new(),
    }
}

impl StaticGraphError {
    pub(crate) fn invalid_query(node: NodeId, n_nodes: u32) -> Self {
        StaticGraphError::InvalidNode {
            node: i64::from(node),
            n_nodes,
            endpoint: Endpoint::Query,
            position: None,
        }
    }

    pub(crate) fn storage(msg: impl Into<String>) -> Self {
        StaticGraphError::Storage(msg.into())
    }
}

impl From<serde_json::Error> for StaticGraphError {
    fn from(err: serde_json::Error) -> Self {
        StaticGraphError::Serialization(err.to_string())
    }
}
