//! Converts one LibSVM file to flat CSR binaries.
//!
//! If you have x.svm, then running
//!
//! cargo run --bin svm2bins x.svm
//!
//! Generates x.data.bin, x.indices.bin, x.indptr.bin, and x.y.bin,
//! always as flat f64, u32, u64, f32 arrays, in native endianness
//! (plus x.weight.bin and x.qid.bin if the file has weights or qids).
//!
//! Parser arguments go in the query part of the path, e.g.
//! `x.svm?indexing_mode=-1` to convert 1-based ids to 0-based when the
//! file never uses id 0.
use std::error::Error;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use svmblock::{ChunkSource, LibSvmParser, ParserConfig};

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let uri = std::env::args()
        .nth(1)
        .ok_or("Usage: cargo run --bin svm2bins x.svm[?indexing_mode=<n>]")?;
    let (path, config) = ParserConfig::from_uri(&uri)?;
    let path = PathBuf::from(path);
    let parser = LibSvmParser::new(&config)?;

    let scan = ChunkSource::open(vec![path.clone()], rayon::current_num_threads())?;
    let block = scan.parse::<u32, f64>(&parser)?;
    for written in svmblock::bins::write_bins(&block, &path)? {
        info!("wrote {:?}", written);
    }
    Ok(())
}
