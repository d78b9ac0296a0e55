//! In-memory graph construction and the query engine.
//!
//! Construction runs a linear pipeline: an [`EdgeBuffer`] is filled from the
//! edge source, sorted and compacted into the successor CSR, transposed in
//! place, re-sorted and compacted into the predecessor CSR. The resulting
//! [`StaticDiGraph`] never changes afterwards.

mod adjacency;
mod array;
mod builder;
mod compact;
mod digraph;
mod edgelist;

/// Lookup direction for neighbor and degree queries.
pub use adjacency::Dir;

/// Owned or memory-mapped backing array.
pub use array::CsrArray;

/// Graph construction entry points.
pub use builder::{build, try_build, GraphBuilder};

/// Linear-time compaction of sorted pairs into CSR form.
pub use compact::{compact, Csr};

/// The immutable query engine.
pub use digraph::{Edges, StaticDiGraph};

/// Pair storage used during construction.
pub use edgelist::EdgeBuffer;
