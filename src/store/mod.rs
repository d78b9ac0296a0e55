//! Directory stores holding a persisted [`StaticDiGraph`].
//!
//! A store is a directory with a JSON metadata record ([`META_FILE`]) and four
//! `.npy` array files, one per CSR array. Arrays are written to a temporary
//! name and renamed into place, and the metadata record is written last, so a
//! store with metadata is always complete. Loading can memory-map the arrays
//! read-only so that no payload is read before the first query touches it.

use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::Mmap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::primitives::npy::{self, ArrayHeader, Element};
use crate::storage::{CsrArray, StaticDiGraph};
use crate::types::checksum::payload_crc32;
use crate::types::{NodeId, Result, StaticGraphError};

/// Name of the metadata record inside a store.
pub const META_FILE: &str = "base.json";
/// Store layout version written by [`save`].
pub const FORMAT_VERSION: u32 = 1;

/// The four persisted arrays.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ArrayName {
    /// Predecessor offsets.
    PIndptr,
    /// Concatenated predecessor lists.
    PIndices,
    /// Successor offsets.
    SIndptr,
    /// Concatenated successor lists.
    SIndices,
}

impl ArrayName {
    /// Every array, in the order they are written.
    pub const ALL: [ArrayName; 4] = [
        ArrayName::PIndptr,
        ArrayName::PIndices,
        ArrayName::SIndptr,
        ArrayName::SIndices,
    ];

    /// Stem used for the array file name.
    pub fn as_str(self) -> &'static str {
        match self {
            ArrayName::PIndptr => "p_indptr",
            ArrayName::PIndices => "p_indices",
            ArrayName::SIndptr => "s_indptr",
            ArrayName::SIndices => "s_indices",
        }
    }

    /// Path of the array file inside `store`.
    pub fn path(self, store: &Path) -> PathBuf {
        store.join(format!("{}.npy", self.as_str()))
    }
}

/// CRC32 of each array payload, recorded at save time.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayChecksums {
    /// Checksum of the predecessor offsets.
    pub p_indptr: u32,
    /// Checksum of the predecessor lists.
    pub p_indices: u32,
    /// Checksum of the successor offsets.
    pub s_indptr: u32,
    /// Checksum of the successor lists.
    pub s_indices: u32,
}

impl ArrayChecksums {
    /// Checksum recorded for `name`.
    pub fn get(&self, name: ArrayName) -> u32 {
        match name {
            ArrayName::PIndptr => self.p_indptr,
            ArrayName::PIndices => self.p_indices,
            ArrayName::SIndptr => self.s_indptr,
            ArrayName::SIndices => self.s_indices,
        }
    }

    fn set(&mut self, name: ArrayName, crc: u32) {
        match name {
            ArrayName::PIndptr => self.p_indptr = crc,
            ArrayName::PIndices => self.p_indices = crc,
            ArrayName::SIndptr => self.s_indptr = crc,
            ArrayName::SIndices => self.s_indices = crc,
        }
    }
}

/// Contents of the metadata record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMeta {
    /// Store layout version.
    pub format_version: u32,
    /// Number of nodes.
    pub n_nodes: NodeId,
    /// Number of edges.
    pub n_edges: u64,
    /// Payload checksums; absent for stores produced by other writers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksums: Option<ArrayChecksums>,
}

/// Options controlling how [`load_with`] materializes arrays.
#[derive(Clone, Debug)]
pub struct LoadOptions {
    /// Memory-map array files instead of reading them.
    pub mmap: bool,
    /// Files smaller than this are read even when `mmap` is set.
    pub mmap_min_bytes: u64,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            mmap: true,
            mmap_min_bytes: 64 * 1024,
        }
    }
}

impl LoadOptions {
    /// Options that read every array into memory.
    pub fn in_memory() -> Self {
        Self {
            mmap: false,
            ..Self::default()
        }
    }

    /// Enables or disables memory-mapping.
    pub fn mmap(mut self, enabled: bool) -> Self {
        self.mmap = enabled;
        self
    }

    /// Sets the smallest file size that is memory-mapped.
    pub fn mmap_min_bytes(mut self, bytes: u64) -> Self {
        self.mmap_min_bytes = bytes;
        self
    }
}

/// Writes `graph` to the directory `store`, creating it if needed.
///
/// Fails with [`StaticGraphError::Storage`] if `store` exists and is not a
/// directory. Existing array files are replaced.
pub fn save(store: impl AsRef<Path>, graph: &StaticDiGraph) -> Result<StoreMeta> {
    let store = store.as_ref();
    prepare_dir(store)?;

    let mut checksums = ArrayChecksums::default();
    checksums.set(
        ArrayName::PIndptr,
        write_array(store, ArrayName::PIndptr, graph.p_indptr())?,
    );
    checksums.set(
        ArrayName::PIndices,
        write_array(store, ArrayName::PIndices, graph.p_indices())?,
    );
    checksums.set(
        ArrayName::SIndptr,
        write_array(store, ArrayName::SIndptr, graph.s_indptr())?,
    );
    checksums.set(
        ArrayName::SIndices,
        write_array(store, ArrayName::SIndices, graph.s_indices())?,
    );

    let meta = StoreMeta {
        format_version: FORMAT_VERSION,
        n_nodes: graph.order() as NodeId,
        n_edges: graph.size() as u64,
        checksums: Some(checksums),
    };
    write_atomic(&store.join(META_FILE), |out| {
        serde_json::to_writer_pretty(&mut *out, &meta)?;
        out.write_all(b"\n")?;
        Ok(())
    })?;
    info!(
        store = %store.display(),
        n_nodes = meta.n_nodes,
        n_edges = meta.n_edges,
        "graph saved"
    );
    Ok(meta)
}

/// Loads a store with [`LoadOptions::default`].
pub fn load(store: impl AsRef<Path>) -> Result<StaticDiGraph> {
    load_with(store, &LoadOptions::default())
}

/// Loads a store with explicit options.
pub fn load_with(store: impl AsRef<Path>, opts: &LoadOptions) -> Result<StaticDiGraph> {
    open(store, opts).map(|(_, graph)| graph)
}

/// Loads a store and returns its metadata record alongside the graph.
pub fn open(store: impl AsRef<Path>, opts: &LoadOptions) -> Result<(StoreMeta, StaticDiGraph)> {
    let store = store.as_ref();
    let meta = read_meta(store)?;
    let n_edges = usize::try_from(meta.n_edges).map_err(|_| {
        StaticGraphError::Storage(format!(
            "store holds {} edges, more than this platform can address",
            meta.n_edges
        ))
    })?;
    let graph = StaticDiGraph::from_parts(
        meta.n_nodes,
        n_edges,
        open_array(store, ArrayName::PIndptr, opts)?,
        open_array(store, ArrayName::PIndices, opts)?,
        open_array(store, ArrayName::SIndptr, opts)?,
        open_array(store, ArrayName::SIndices, opts)?,
    )?;
    debug!(
        store = %store.display(),
        n_nodes = meta.n_nodes,
        n_edges = meta.n_edges,
        mapped = graph.is_mapped(),
        "graph loaded"
    );
    Ok((meta, graph))
}

/// Reads and validates the metadata record of `store`.
pub fn read_meta(store: impl AsRef<Path>) -> Result<StoreMeta> {
    let path = store.as_ref().join(META_FILE);
    let bytes = fs::read(&path).map_err(|err| missing_as_storage(err, &path))?;
    let meta: StoreMeta = serde_json::from_slice(&bytes).map_err(|err| {
        StaticGraphError::Storage(format!("corrupt metadata {}: {err}", path.display()))
    })?;
    if meta.format_version != FORMAT_VERSION {
        return Err(StaticGraphError::Storage(format!(
            "unsupported store format version {} (expected {FORMAT_VERSION})",
            meta.format_version
        )));
    }
    Ok(meta)
}

/// Recomputes the CRC32 of one array payload by reading its file.
pub fn array_checksum(store: impl AsRef<Path>, name: ArrayName) -> Result<u32> {
    let path = name.path(store.as_ref());
    let bytes = fs::read(&path).map_err(|err| missing_as_storage(err, &path))?;
    let header = ArrayHeader::parse(&bytes)?;
    let range = match name {
        ArrayName::PIndptr | ArrayName::SIndptr => header.payload_range::<u64>(bytes.len())?,
        ArrayName::PIndices | ArrayName::SIndices => {
            header.payload_range::<NodeId>(bytes.len())?
        }
    };
    Ok(payload_crc32(&bytes[range]))
}

fn prepare_dir(store: &Path) -> Result<()> {
    match fs::metadata(store) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(StaticGraphError::Storage(format!(
            "{} exists and is not a directory",
            store.display()
        ))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(store)?;
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn write_array<T: Element>(store: &Path, name: ArrayName, data: &[T]) -> Result<u32> {
    let crc = write_atomic(&name.path(store), |out| npy::write_vector(out, data))?;
    debug!(array = name.as_str(), len = data.len(), "array written");
    Ok(crc)
}

fn write_atomic<T>(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> Result<T>,
) -> Result<T> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let mut out = BufWriter::new(File::create(&tmp)?);
    let value = write(&mut out)?;
    out.flush()?;
    let file = out.into_inner().map_err(|err| err.into_error())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp, path)?;
    Ok(value)
}

fn open_array<T: Element>(store: &Path, name: ArrayName, opts: &LoadOptions) -> Result<CsrArray<T>> {
    let path = name.path(store);
    let mut file = File::open(&path).map_err(|err| missing_as_storage(err, &path))?;
    let file_len = file.metadata()?.len();

    if opts.mmap && file_len >= opts.mmap_min_bytes {
        let map = Arc::new(map_file(&file)?);
        let header = ArrayHeader::parse(&map).map_err(|err| in_file(err, &path))?;
        let range = header
            .payload_range::<T>(map.len())
            .map_err(|err| in_file(err, &path))?;
        let len = range.len() / T::SIZE;
        if let Some(array) = CsrArray::mapped(Arc::clone(&map), range.start, len) {
            debug!(array = name.as_str(), len, "array memory-mapped");
            return Ok(array);
        }
        warn!(
            array = name.as_str(),
            "payload cannot be viewed in place; decoding into memory"
        );
        return Ok(CsrArray::owned(npy::decode_vector(&map[range])));
    }

    let mut bytes = Vec::with_capacity(file_len as usize);
    file.read_to_end(&mut bytes)?;
    let header = ArrayHeader::parse(&bytes).map_err(|err| in_file(err, &path))?;
    let range = header
        .payload_range::<T>(bytes.len())
        .map_err(|err| in_file(err, &path))?;
    Ok(CsrArray::owned(npy::decode_vector(&bytes[range])))
}

#[allow(unsafe_code)]
fn map_file(file: &File) -> Result<Mmap> {
    // SAFETY: the map is read-only, and stores are only ever rewritten by
    // renaming fresh files over old ones, so a mapped file is never modified
    // in place by this crate.
    let map = unsafe { Mmap::map(file) }?;
    Ok(map)
}

fn missing_as_storage(err: io::Error, path: &Path) -> StaticGraphError {
    if err.kind() == io::ErrorKind::NotFound {
        StaticGraphError::Storage(format!("missing {}", path.display()))
    } else {
        StaticGraphError::Io(err)
    }
}

fn in_file(err: StaticGraphError, path: &Path) -> StaticGraphError {
    match err {
        StaticGraphError::Storage(msg) => {
            StaticGraphError::Storage(format!("{}: {msg}", path.display()))
        }
        other => other,
    }
}
