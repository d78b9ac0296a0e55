use std::fs;
use std::path::PathBuf;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::admin::{open_graph, AdminOpenOptions};
use crate::storage::GraphBuilder;
use crate::store;
use crate::types::{Endpoint, NodeId, StaticGraphError};

/// Shortest possible data row: one-digit source, delimiter, one-digit target
/// and a line terminator.
const MIN_ROW_BYTES: u64 = 4;

/// Configuration for importing a CSV edge list into a new store.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// Path to the CSV file containing one edge per row.
    pub edges_path: PathBuf,
    /// Directory the store is written to.
    pub store_path: PathBuf,
    /// Number of nodes; every id must lie in `0..n_nodes`.
    pub n_nodes: NodeId,
    /// Upper bound on the number of rows. Derived from the file size if unset.
    pub capacity: Option<usize>,
    /// Name of the CSV column containing source node ids.
    pub src_column: String,
    /// Name of the CSV column containing target node ids.
    pub dst_column: String,
    /// Whether the first row names the columns. Without a header the first two
    /// columns are used.
    pub has_headers: bool,
    /// Field delimiter.
    pub delimiter: u8,
}

impl ImportConfig {
    /// Config with the default `src`/`dst` header layout.
    pub fn new(edges_path: impl Into<PathBuf>, store_path: impl Into<PathBuf>, n_nodes: NodeId) -> Self {
        Self {
            edges_path: edges_path.into(),
            store_path: store_path.into(),
            n_nodes,
            capacity: None,
            src_column: "src".into(),
            dst_column: "dst".into(),
            has_headers: true,
            delimiter: b',',
        }
    }
}

/// Summary statistics from an import operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    /// Number of nodes in the stored graph.
    pub nodes: u64,
    /// Number of edges imported.
    pub edges_imported: u64,
    /// Capacity estimate the edge buffer was sized with.
    pub capacity: u64,
}

/// Configuration for exporting a store's edges to CSV.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Directory of the store to read.
    pub store_path: PathBuf,
    /// Output path for the edges CSV.
    pub edges_out: PathBuf,
    /// Whether to write a `src,dst` header row.
    pub header: bool,
    /// Field delimiter.
    pub delimiter: u8,
}

/// Summary statistics from an export operation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExportSummary {
    /// Total number of edges exported.
    pub edges_exported: u64,
}

/// Error type for CLI import/export operations.
#[derive(Error, Debug)]
pub enum CliError {
    /// Generic error message.
    #[error("{0}")]
    Message(String),
    /// IO error from file operations.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// CSV parsing or writing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Admin operation error.
    #[error(transparent)]
    Admin(#[from] crate::admin::AdminError),
    /// Graph construction or storage error.
    #[error(transparent)]
    Core(#[from] StaticGraphError),
}

impl From<&str> for CliError {
    fn from(value: &str) -> Self {
        CliError::Message(value.to_string())
    }
}

impl From<String> for CliError {
    fn from(value: String) -> Self {
        CliError::Message(value)
    }
}

/// Builds a graph from a CSV edge list and saves it as a store.
///
/// Rows are streamed straight into the edge buffer; nothing is buffered
/// between the CSV reader and the builder. The first malformed row aborts the
/// import and no store is written.
pub fn run_import(cfg: &ImportConfig) -> Result<ImportSummary, CliError> {
    let capacity = match cfg.capacity {
        Some(capacity) => capacity,
        None => estimate_capacity(fs::metadata(&cfg.edges_path)?.len()),
    };
    let mut reader = ReaderBuilder::new()
        .has_headers(cfg.has_headers)
        .delimiter(cfg.delimiter)
        .flexible(true)
        .from_path(&cfg.edges_path)?;
    let (src_index, dst_index) = if cfg.has_headers {
        let headers = reader.headers()?.clone();
        (
            find_column(&headers, &cfg.src_column)?,
            find_column(&headers, &cfg.dst_column)?,
        )
    } else {
        (0, 1)
    };
    debug!(
        path = %cfg.edges_path.display(),
        capacity,
        src_index,
        dst_index,
        "importing edge list"
    );

    let n_nodes = cfg.n_nodes;
    let mut read_failure: Option<csv::Error> = None;
    let rows = reader
        .records()
        .enumerate()
        .map(|(row, record)| -> Result<(NodeId, NodeId), StaticGraphError> {
            let record = record.map_err(|err| {
                let message = err.to_string();
                read_failure = Some(err);
                StaticGraphError::InvalidArgument(message)
            })?;
            let row = row as u64;
            let src = parse_node(&record, src_index, n_nodes, Endpoint::Source, row)?;
            let dst = parse_node(&record, dst_index, n_nodes, Endpoint::Target, row)?;
            Ok((src, dst))
        });
    let built = GraphBuilder::new(n_nodes).capacity(capacity).try_build(rows);
    if let Some(err) = read_failure {
        return Err(err.into());
    }
    let graph = built?;

    store::save(&cfg.store_path, &graph)?;
    let summary = ImportSummary {
        nodes: graph.order() as u64,
        edges_imported: graph.size() as u64,
        capacity: capacity as u64,
    };
    info!(
        store = %cfg.store_path.display(),
        nodes = summary.nodes,
        edges = summary.edges_imported,
        "import complete"
    );
    Ok(summary)
}

/// Writes every edge of a store to CSV in `(source, target)` order.
pub fn run_export(cfg: &ExportConfig, opts: &AdminOpenOptions) -> Result<ExportSummary, CliError> {
    let handle = open_graph(&cfg.store_path, opts)?;
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .delimiter(cfg.delimiter)
        .from_path(&cfg.edges_out)?;
    if cfg.header {
        writer.write_record(["src", "dst"])?;
    }
    let mut summary = ExportSummary::default();
    for edge in handle.graph.edges() {
        writer.serialize(edge)?;
        summary.edges_exported += 1;
    }
    writer.flush()?;
    info!(
        out = %cfg.edges_out.display(),
        edges = summary.edges_exported,
        "export complete"
    );
    Ok(summary)
}

/// Capacity estimate for a CSV file of `len` bytes: every row takes at least
/// [`MIN_ROW_BYTES`], except the last which may lack its terminator.
pub fn estimate_capacity(len: u64) -> usize {
    ((len + 1) / MIN_ROW_BYTES) as usize
}

fn parse_node(
    record: &StringRecord,
    index: usize,
    n_nodes: NodeId,
    endpoint: Endpoint,
    row: u64,
) -> Result<NodeId, StaticGraphError> {
    let raw = record.get(index).map(str::trim).unwrap_or("");
    let node: i64 = raw.parse().map_err(|_| {
        StaticGraphError::InvalidArgument(format!(
            "row {row}: {endpoint} '{raw}' is not an integer node id"
        ))
    })?;
    if node < 0 || node >= i64::from(n_nodes) {
        return Err(StaticGraphError::InvalidNode {
            node,
            n_nodes,
            endpoint,
            position: Some(row),
        });
    }
    Ok(node as NodeId)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize, CliError> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .ok_or_else(|| CliError::Message(format!("column '{}' not found", name)))
}
