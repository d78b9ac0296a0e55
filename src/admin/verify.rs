use std::path::Path;

use serde::Serialize;

use crate::storage::{Dir, StaticDiGraph};
use crate::store::{self, ArrayName, StoreMeta};
use crate::types::StaticGraphError;

use crate::admin::options::AdminOpenOptions;
use crate::admin::util::ensure_store_dir;
use crate::admin::Result;

const MAX_FINDINGS: usize = 32;

/// Specifies the depth of verification checks to perform.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyLevel {
    /// Metadata and the shape checks done on every load.
    Fast,
    /// Full scan of both CSR pairs, their duality, and payload checksums.
    Full,
}

/// Indicates the severity level of a verification finding.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifySeverity {
    /// Informational message about the verification process.
    Info,
    /// Non-critical issue that may indicate a problem.
    Warning,
    /// Critical issue indicating data corruption or integrity failure.
    Error,
}

/// Represents a single issue discovered during verification.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyFinding {
    /// The severity level of this finding.
    pub severity: VerifySeverity,
    /// Human-readable description of the issue.
    pub message: String,
}

impl VerifyFinding {
    fn error(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: VerifySeverity::Warning,
            message: message.into(),
        }
    }
}

/// Statistics collected during the verification process.
#[derive(Clone, Debug, Default, Serialize)]
pub struct VerifyCounts {
    /// Nodes whose adjacency ranges were scanned (both directions).
    pub nodes_checked: u64,
    /// Successor entries matched against the predecessor CSR.
    pub edges_checked: u64,
    /// Array payloads whose checksum was recomputed.
    pub checksums_checked: u64,
}

/// Complete report of a verification operation.
#[derive(Clone, Debug, Serialize)]
pub struct VerifyReport {
    /// The verification level that was performed.
    pub level: VerifyLevel,
    /// Whether verification passed without any error finding.
    pub success: bool,
    /// List of issues discovered during verification.
    pub findings: Vec<VerifyFinding>,
    /// Statistics about the data structures examined.
    pub counts: VerifyCounts,
}

/// Verifies the integrity of a store.
///
/// - `VerifyLevel::Fast`: metadata, array headers, and `indptr` shape
/// - `VerifyLevel::Full`: additionally every index range,
///   ascending neighbor lists, successor/predecessor duality, and checksums
///
/// Corruption is reported as findings; only a missing store or an I/O failure
/// is returned as an error.
pub fn verify(
    path: impl AsRef<Path>,
    opts: &AdminOpenOptions,
    level: VerifyLevel,
) -> Result<VerifyReport> {
    let path = path.as_ref();
    ensure_store_dir(path)?;
    let mut findings = Vec::new();
    let mut counts = VerifyCounts::default();

    match store::open(path, &opts.load) {
        Ok((meta, graph)) => {
            if meta.checksums.is_none() {
                findings.push(VerifyFinding::warning(
                    "metadata carries no payload checksums",
                ));
            }
            if matches!(level, VerifyLevel::Full) {
                check_graph(&graph, &mut findings, &mut counts);
                check_checksums(path, &meta, &mut findings, &mut counts)?;
            }
        }
        Err(StaticGraphError::Storage(msg)) => push_error(&mut findings, msg),
        Err(err) => return Err(err.into()),
    }

    let success = !findings
        .iter()
        .any(|f| matches!(f.severity, VerifySeverity::Error));
    Ok(VerifyReport {
        level,
        success,
        findings,
        counts,
    })
}

/// Runs the full structural checks against an in-memory or loaded graph.
pub fn verify_graph(graph: &StaticDiGraph) -> VerifyReport {
    let mut findings = Vec::new();
    let mut counts = VerifyCounts::default();
    check_graph(graph, &mut findings, &mut counts);
    VerifyReport {
        level: VerifyLevel::Full,
        success: findings.is_empty(),
        findings,
        counts,
    }
}

fn check_graph(graph: &StaticDiGraph, findings: &mut Vec<VerifyFinding>, counts: &mut VerifyCounts) {
    let out_ok = check_csr(graph, Dir::Out, findings, counts);
    let in_ok = check_csr(graph, Dir::In, findings, counts);
    if out_ok && in_ok {
        check_duality(graph, findings, counts);
    }
}

/// Checks every neighbor list of one CSR pair; returns whether all were clean.
///
/// `indptr` monotonicity is already enforced when the graph is assembled.
fn check_csr(
    graph: &StaticDiGraph,
    dir: Dir,
    findings: &mut Vec<VerifyFinding>,
    counts: &mut VerifyCounts,
) -> bool {
    let indptr = graph.indptr(dir);
    let indices = graph.indices(dir);
    let n_nodes = graph.order();
    let before = findings.len();

    for (k, w) in indptr.windows(2).enumerate() {
        let list = &indices[w[0] as usize..w[1] as usize];
        for pair in list.windows(2) {
            if pair[1] < pair[0] {
                push_error(
                    findings,
                    format!("{dir} neighbors of node {k} are not ascending"),
                );
                break;
            }
        }
        if let Some(bad) = list.iter().find(|&&v| v as usize >= n_nodes) {
            push_error(
                findings,
                format!("{dir} neighbors of node {k} reference node {bad} outside 0..{n_nodes}"),
            );
        }
        counts.nodes_checked += 1;
        if findings.len() >= MAX_FINDINGS {
            break;
        }
    }
    findings.len() == before
}

/// Walks the successor CSR in order; for every target `v` the sources seen so
/// far must be exactly the prefix of `predecessors(v)`.
fn check_duality(graph: &StaticDiGraph, findings: &mut Vec<VerifyFinding>, counts: &mut VerifyCounts) {
    let p_indptr = graph.p_indptr();
    let p_indices = graph.p_indices();
    let mut cursor: Vec<u64> = p_indptr[..graph.order()].to_vec();

    for (u, v) in graph.edges() {
        let k = v as usize;
        let slot = cursor[k];
        if slot >= p_indptr[k + 1] || p_indices[slot as usize] != u {
            push_error(
                findings,
                format!("edge {u} -> {v} has no matching predecessor entry"),
            );
            if findings.len() >= MAX_FINDINGS {
                return;
            }
            continue;
        }
        cursor[k] += 1;
        counts.edges_checked += 1;
    }

    for (k, &slot) in cursor.iter().enumerate() {
        if slot != p_indptr[k + 1] {
            push_error(
                findings,
                format!(
                    "predecessors of node {k} hold {} entries without a matching successor",
                    p_indptr[k + 1] - slot
                ),
            );
            if findings.len() >= MAX_FINDINGS {
                return;
            }
        }
    }
}

fn check_checksums(
    path: &Path,
    meta: &StoreMeta,
    findings: &mut Vec<VerifyFinding>,
    counts: &mut VerifyCounts,
) -> Result<()> {
    let Some(expected) = meta.checksums.as_ref() else {
        return Ok(());
    };
    for name in ArrayName::ALL {
        let actual = match store::array_checksum(path, name) {
            Ok(crc) => crc,
            Err(StaticGraphError::Storage(msg)) => {
                push_error(findings, msg);
                continue;
            }
            Err(err) => return Err(err.into()),
        };
        counts.checksums_checked += 1;
        if actual != expected.get(name) {
            push_error(
                findings,
                format!(
                    "{} checksum mismatch: recorded {:#010x}, computed {actual:#010x}",
                    name.as_str(),
                    expected.get(name)
                ),
            );
        }
    }
    Ok(())
}

fn push_error(findings: &mut Vec<VerifyFinding>, message: impl Into<String>) {
    if findings.len() < MAX_FINDINGS {
        findings.push(VerifyFinding::error(message.into()));
    }
}
