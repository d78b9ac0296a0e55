use std::fs;
use std::path::{Path, PathBuf};

use crate::storage::StaticDiGraph;
use crate::store::{self, ArrayName, StoreMeta, META_FILE};

use crate::admin::error::{AdminError, Result};
use crate::admin::options::AdminOpenOptions;

/// A loaded store together with its metadata record.
pub struct GraphHandle {
    /// Store directory.
    pub path: PathBuf,
    /// Metadata record as read from disk.
    pub meta: StoreMeta,
    /// The loaded graph.
    pub graph: StaticDiGraph,
}

/// Loads the store at `path`.
///
/// # Errors
///
/// Returns [`AdminError::MissingStore`] if nothing exists at `path`, or the
/// underlying storage error if the store is incomplete or corrupt.
pub fn open_graph(path: &Path, opts: &AdminOpenOptions) -> Result<GraphHandle> {
    ensure_store_dir(path)?;
    let (meta, graph) = store::open(path, &opts.load)?;
    Ok(GraphHandle {
        path: path.to_path_buf(),
        meta,
        graph,
    })
}

pub(crate) fn ensure_store_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(AdminError::missing_store(path));
    }
    if !path.is_dir() {
        return Err(AdminError::Message(format!(
            "{} is not a store directory",
            path.display()
        )));
    }
    Ok(())
}

/// Files making up a store, with their on-disk sizes (missing files are skipped).
pub(crate) fn store_files(path: &Path) -> Vec<(String, u64)> {
    let mut files = vec![META_FILE.to_string()];
    files.extend(ArrayName::ALL.iter().map(|name| format!("{}.npy", name.as_str())));
    files
        .into_iter()
        .filter_map(|name| {
            let size = fs::metadata(path.join(&name)).ok()?.len();
            Some((name, size))
        })
        .collect()
}
