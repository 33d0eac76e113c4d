//! Dumps a block's CSR arrays as flat native-endian binary files.
//!
//! If you have x.svm, the files written next to it are x.y.bin (f32 labels),
//! x.indptr.bin (u64 offsets), x.indices.bin and x.data.bin (feature ids and
//! values at the parsed widths), plus x.weight.bin (f32) and x.qid.bin (u64)
//! when the block carries them.
//!
//! Call an appropriately-typed np.fromfile to load, then hand the arrays to
//! scipy.sparse.csr_matrix.

use byte_slice_cast::{AsByteSlice, ToByteSlice};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::block::{FeatureId, FeatureValue, SparseBlock};

/// `dir/name.ext` becomes `dir/name.<new_ext>`.
pub fn replace_extension(path: &Path, new_ext: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{}.{}", stem, new_ext))
}

fn write_array(path: PathBuf, bytes: &[u8]) -> io::Result<PathBuf> {
    if path.exists() {
        warn!("out file {:?} exists, will overwrite", path);
    }
    // 64KB buffer
    let mut writer = BufWriter::with_capacity(64 * 1024, File::create(&path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    debug!("wrote {} bytes to {:?}", bytes.len(), path);
    Ok(path)
}

/// Writes every array of `block` next to `stem`, returning the paths written.
pub fn write_bins<I, V>(block: &SparseBlock<I, V>, stem: &Path) -> io::Result<Vec<PathBuf>>
where
    I: FeatureId + ToByteSlice,
    V: FeatureValue + ToByteSlice,
{
    let mut written = vec![
        write_array(replace_extension(stem, "y.bin"), block.label.as_byte_slice())?,
        write_array(replace_extension(stem, "indptr.bin"), block.offset.as_byte_slice())?,
        write_array(replace_extension(stem, "indices.bin"), block.index.as_byte_slice())?,
        write_array(replace_extension(stem, "data.bin"), block.value.as_byte_slice())?,
    ];
    if block.has_weight() {
        written.push(write_array(
            replace_extension(stem, "weight.bin"),
            block.weight.as_byte_slice(),
        )?);
    }
    if block.has_qid() {
        written.push(write_array(
            replace_extension(stem, "qid.bin"),
            block.qid.as_byte_slice(),
        )?);
    }
    Ok(written)
}
