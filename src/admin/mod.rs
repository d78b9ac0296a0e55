#![forbid(unsafe_code)]

//! Store administration and inspection utilities.
//!
//! This module provides the administrative functions behind the CLI:
//! statistics reporting and integrity verification of a saved store.

mod error;
mod options;
mod stats;
mod util;
mod verify;

/// Error types for administrative operations.
pub use error::{AdminError, Result};

/// Configuration options for opening a store in admin mode.
pub use options::AdminOpenOptions;

/// Statistics collection and reporting.
///
/// Gathers degree statistics, in-memory footprint, and on-disk file sizes.
pub use stats::{
    graph_stats, stats, FileStat, FilesystemStats, GraphStats, MemoryStats, StatsReport,
};

/// Store integrity verification.
///
/// Verifies the structural integrity of the stored arrays and reports any
/// issues found.
pub use verify::{
    verify, verify_graph, VerifyCounts, VerifyFinding, VerifyLevel, VerifyReport, VerifySeverity,
};

/// Utility functions for opening a store.
pub use util::{open_graph, GraphHandle};
