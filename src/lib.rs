//! Static directed graphs stored as a pair of CSR adjacency arrays.
//!
//! A graph is built once from a stream of `(source, target)` pairs, after
//! which successor and predecessor queries are constant-time slice lookups.
//! Graphs can be saved to a directory of `.npy` arrays and loaded back,
//! optionally memory-mapped.

pub mod admin;
pub mod cli;
pub mod logging;
pub mod primitives;
pub mod storage;
pub mod store;
pub mod types;

pub use storage::{build, try_build, Dir, EdgeBuffer, GraphBuilder, StaticDiGraph};
pub use store::{load, load_with, save, LoadOptions};
pub use types::{NodeId, Result, StaticGraphError};
