#![forbid(unsafe_code)]

//! Command-line interface utilities and data import/export functionality.
//!
//! This module backs the `staticgraph` binary, moving edge lists between CSV
//! files and stores.

/// Edge list import and export.
///
/// Streams a CSV edge list into the graph builder and writes stored edges
/// back out as CSV.
pub mod import_export;
