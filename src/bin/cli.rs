//! Binary entry point for the staticgraph CLI.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use staticgraph::{
    admin::{open_graph, stats, verify, AdminOpenOptions, VerifyLevel},
    cli::import_export::{run_export, run_import, ExportConfig, ImportConfig},
    logging::init_logging,
    storage::Dir,
    types::{Endpoint, NodeId, StaticGraphError},
};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(
    name = "staticgraph",
    version,
    about = "Build, inspect and query static directed graph stores",
    disable_help_subcommand = true
)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[arg(
        long,
        global = true,
        env = "STATICGRAPH_LOG",
        default_value = "warn",
        help = "Log filter directive (e.g. info, staticgraph::store=debug)"
    )]
    log_level: String,

    #[arg(
        long,
        global = true,
        help = "Read arrays into memory instead of memory-mapping them"
    )]
    no_mmap: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Build a store from a CSV edge list")]
    Import(ImportCmd),

    #[command(about = "Export the edges of a store to CSV")]
    Export(ExportCmd),

    #[command(about = "Display graph, memory and file statistics")]
    Stats {
        #[arg(value_name = "STORE")]
        store: PathBuf,
    },

    #[command(about = "Verify the integrity of a store")]
    Verify {
        #[arg(value_name = "STORE")]
        store: PathBuf,

        #[arg(
            long,
            value_enum,
            default_value_t = VerifyLevelArg::Fast,
            help = "Verification level"
        )]
        level: VerifyLevelArg,
    },

    #[command(about = "List the successors or predecessors of a node")]
    Neighbors {
        #[arg(value_name = "STORE")]
        store: PathBuf,

        #[arg(value_name = "NODE", allow_negative_numbers = true)]
        node: i64,

        #[arg(long, value_enum, default_value_t = DirArg::Out, help = "Edge direction")]
        dir: DirArg,
    },
}

#[derive(Args, Debug)]
struct ImportCmd {
    #[arg(value_name = "STORE")]
    store: PathBuf,

    #[arg(long, value_name = "FILE", help = "CSV file containing one edge per row")]
    edges: PathBuf,

    #[arg(long, help = "Number of nodes; ids must lie in 0..N")]
    nodes: NodeId,

    #[arg(long, help = "Upper bound on the number of edges (default: derived from file size)")]
    capacity: Option<usize>,

    #[arg(long, default_value = "src", help = "Edge source column name")]
    src_column: String,

    #[arg(long, default_value = "dst", help = "Edge destination column name")]
    dst_column: String,

    #[arg(long, help = "Input has no header row; the first two columns are used")]
    no_header: bool,

    #[arg(long, default_value_t = ',', help = "Field delimiter")]
    delimiter: char,
}

#[derive(Args, Debug)]
struct ExportCmd {
    #[arg(value_name = "STORE")]
    store: PathBuf,

    #[arg(long, value_name = "FILE", help = "Output CSV file")]
    edges: PathBuf,

    #[arg(long, help = "Omit the src,dst header row")]
    no_header: bool,

    #[arg(long, default_value_t = ',', help = "Field delimiter")]
    delimiter: char,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum VerifyLevelArg {
    Fast,
    Full,
}

impl From<VerifyLevelArg> for VerifyLevel {
    fn from(level: VerifyLevelArg) -> Self {
        match level {
            VerifyLevelArg::Fast => VerifyLevel::Fast,
            VerifyLevelArg::Full => VerifyLevel::Full,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum DirArg {
    Out,
    In,
}

impl From<DirArg> for Dir {
    fn from(dir: DirArg) -> Self {
        match dir {
            DirArg::Out => Dir::Out,
            DirArg::In => Dir::In,
        }
    }
}

#[derive(Serialize)]
struct NeighborsReport<'a> {
    node: NodeId,
    dir: &'static str,
    degree: usize,
    neighbors: &'a [NodeId],
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;
    let open_opts = if cli.no_mmap {
        AdminOpenOptions::in_memory()
    } else {
        AdminOpenOptions::default()
    };
    debug!(command = ?cli.command, "running command");

    match cli.command {
        Command::Stats { store } => {
            let report = stats(&store, &open_opts)?;
            emit(&cli.format, &report, |fmt| print_stats_text(fmt, &report))?;
        }
        Command::Verify { store, level } => {
            let report = verify(&store, &open_opts, level.into())?;
            emit(&cli.format, &report, |fmt| print_verify_text(fmt, &report))?;
            if !report.success {
                std::process::exit(2);
            }
        }
        Command::Import(cmd) => {
            let import_cfg = build_import_config(&cmd)?;
            let result = run_import(&import_cfg)?;
            emit(&cli.format, &result, |_| {
                println!(
                    "Imported {} edges over {} nodes into {}",
                    result.edges_imported,
                    result.nodes,
                    cmd.store.display()
                )
            })?;
        }
        Command::Export(cmd) => {
            let export_cfg = ExportConfig {
                store_path: cmd.store.clone(),
                edges_out: cmd.edges.clone(),
                header: !cmd.no_header,
                delimiter: delimiter_byte(cmd.delimiter)?,
            };
            let result = run_export(&export_cfg, &open_opts)?;
            emit(&cli.format, &result, |_| {
                println!("Exported {} edges", result.edges_exported)
            })?;
        }
        Command::Neighbors { store, node, dir } => {
            let handle = open_graph(&store, &open_opts)?;
            let dir = Dir::from(dir);
            if !handle.graph.has_node(node) {
                return Err(Box::new(StaticGraphError::InvalidNode {
                    node,
                    n_nodes: handle.graph.order() as NodeId,
                    endpoint: Endpoint::Query,
                    position: None,
                }));
            }
            let node = node as NodeId;
            let neighbors = handle.graph.neighbors(node, dir)?;
            let report = NeighborsReport {
                node,
                dir: dir.as_str(),
                degree: neighbors.len(),
                neighbors,
            };
            emit(&cli.format, &report, |_| print_neighbors_text(&report))?;
        }
    }

    Ok(())
}

fn build_import_config(cmd: &ImportCmd) -> Result<ImportConfig, Box<dyn Error>> {
    Ok(ImportConfig {
        capacity: cmd.capacity,
        src_column: cmd.src_column.clone(),
        dst_column: cmd.dst_column.clone(),
        has_headers: !cmd.no_header,
        delimiter: delimiter_byte(cmd.delimiter)?,
        ..ImportConfig::new(&cmd.edges, &cmd.store, cmd.nodes)
    })
}

fn delimiter_byte(delimiter: char) -> Result<u8, Box<dyn Error>> {
    u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| format!("delimiter '{delimiter}' must be a single ASCII character").into())
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_stats_text(_: OutputFormat, report: &staticgraph::admin::StatsReport) {
    let g = &report.graph;
    println!(
        "Graph: order={} size={} self_loops={} isolated_nodes={}",
        g.order, g.size, g.self_loops, g.isolated_nodes
    );
    println!(
        "       max_out_degree={} max_in_degree={} mean_degree={:.3}",
        g.max_out_degree, g.max_in_degree, g.mean_degree
    );
    println!();
    let m = &report.memory;
    println!(
        "Memory: p_indptr={} p_indices={} s_indptr={} s_indices={} total={} mapped={}",
        m.p_indptr_bytes,
        m.p_indices_bytes,
        m.s_indptr_bytes,
        m.s_indices_bytes,
        m.total_bytes,
        m.mapped
    );
    println!();
    let fs = &report.filesystem;
    println!(
        "Filesystem: path={} format_version={} total_size={}",
        fs.store_path, fs.format_version, fs.total_size_bytes
    );
    for file in &fs.files {
        println!("  {} {}", file.name, file.size_bytes);
    }
}

fn print_verify_text(_: OutputFormat, report: &staticgraph::admin::VerifyReport) {
    println!(
        "Verify ({:?}) => success={} nodes_checked={} edges_checked={} checksums_checked={}",
        report.level,
        report.success,
        report.counts.nodes_checked,
        report.counts.edges_checked,
        report.counts.checksums_checked,
    );
    for finding in &report.findings {
        println!("- {:?}: {}", finding.severity, finding.message);
    }
}

fn print_neighbors_text(report: &NeighborsReport<'_>) {
    let list: Vec<String> = report.neighbors.iter().map(u32::to_string).collect();
    println!(
        "{} {} ({}): {}",
        report.node,
        report.dir,
        report.degree,
        list.join(" ")
    );
}
