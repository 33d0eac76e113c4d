//! Chunked, parallel reading of LibSVM files.
//!
//! A [`ChunkSource`] memory-maps its input files and divides them into
//! line-aligned byte ranges, which are the unit of parallelism. Each range is
//! parsed into its own block by an independent pass, and the finished blocks
//! are concatenated in the order their ranges appear in the input.

use bstr::ByteSlice;
use memmap::{Mmap, MmapOptions};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::fs::File;
use std::iter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::block::{FeatureId, FeatureValue, SparseBlock};
use crate::error::{ParseError, ScanError};
use crate::indexing::IndexingMode;
use crate::line::count_lines;
use crate::parser::{LibSvmParser, ParsedBlock};

/// Stores which file this byte block refers to, its offset within that
/// file, and its length.
#[derive(Debug, Clone)]
struct ByteBlock {
    mmap_index: usize,
    mmap_offset: usize,
    length: usize,
}

enum Source {
    Mapped(Mmap),
    // zero-length files can't be mapped
    Empty,
}

impl Source {
    fn bytes(&self) -> &[u8] {
        match self {
            Source::Mapped(mmap) => &mmap[..],
            Source::Empty => &[],
        }
    }
}

/// One line-aligned byte range of an input file.
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub path: &'a Path,
    /// Byte offset of the chunk within its file.
    pub offset: usize,
    pub bytes: &'a [u8],
}

/// Line-aligned access to a sequence of files, read as if concatenated.
///
/// This is done through mmapping, so the user must promise the files won't
/// be concurrently modified for the duration of use.
pub struct ChunkSource {
    paths: Vec<PathBuf>,
    sources: Vec<Source>,
    blocks: Vec<ByteBlock>,
}

impl ChunkSource {
    /// `nthreads` is the desired parallelism level for parsing, and should
    /// align with the `rayon` pool used to parse.
    ///
    /// Internally, this parameter affects the number of chunks used: a few
    /// more than `nthreads` to smooth out imbalance, but no more than one per
    /// MiB of input.
    pub fn open(paths: Vec<PathBuf>, nthreads: usize) -> Result<ChunkSource, ScanError> {
        let sources = map_files(&paths)?;
        let tot_bytes: usize = sources.iter().map(|s| s.bytes().len()).sum();
        let nblocks = (nthreads * 4).min(tot_bytes / 1024 / 1024).max(1);
        Ok(ChunkSource::split(paths, sources, nblocks))
    }

    /// Like [`ChunkSource::open`], with an explicit target chunk count.
    pub fn with_chunks(paths: Vec<PathBuf>, nchunks: usize) -> Result<ChunkSource, ScanError> {
        let sources = map_files(&paths)?;
        Ok(ChunkSource::split(paths, sources, nchunks.max(1)))
    }

    fn split(paths: Vec<PathBuf>, sources: Vec<Source>, nblocks: usize) -> ChunkSource {
        let file_lengths: Vec<usize> = sources.iter().map(|s| s.bytes().len()).collect();
        let tot_bytes: usize = file_lengths.iter().sum();

        // Position of each file in the concatenated input, plus a final
        // entry for the end of the input.
        let file_starts: Vec<usize> = iter::once(0)
            .chain(file_lengths.iter().scan(0, |end, &flen| {
                *end += flen;
                Some(*end)
            }))
            .collect();

        // Cut at evenly spaced positions and at every file start, so that no
        // chunk spans two files. A cut at the end of the input opens nothing.
        let mut cuts: Vec<usize> = (0..nblocks)
            .map(|b| b * tot_bytes / nblocks)
            .chain(file_starts.iter().copied())
            .filter(|&cut| cut < tot_bytes)
            .collect();
        cuts.sort_unstable();

        // Move each cut back to the start of its line. Empty files own no
        // bytes, so their cuts land at offset 0 of the next non-empty file.
        let mut mmap_index = 0;
        let starts: Vec<(usize, usize)> = cuts
            .into_iter()
            .map(|cut| {
                while cut >= file_starts[mmap_index + 1] {
                    mmap_index += 1;
                }
                let local = cut - file_starts[mmap_index];
                (mmap_index, start_of_line(local, sources[mmap_index].bytes()))
            })
            .collect();

        // A chunk ends where the next one starts; repeated cuts give empty
        // chunks, which are dropped.
        let global: Vec<usize> = starts
            .iter()
            .map(|&(mmap_index, local)| file_starts[mmap_index] + local)
            .collect();
        let ends = global.iter().skip(1).copied().chain(iter::once(tot_bytes));
        let blocks: Vec<_> = starts
            .into_iter()
            .zip(global.iter().copied().zip(ends))
            .filter(|&(_, (start, end))| end > start)
            .map(|((mmap_index, mmap_offset), (start, end))| ByteBlock {
                mmap_index,
                mmap_offset,
                length: end - start,
            })
            .collect();

        ChunkSource {
            paths,
            sources,
            blocks,
        }
    }

    pub fn num_chunks(&self) -> usize {
        self.blocks.len()
    }

    /// Chunks in input order.
    pub fn chunks(&self) -> impl Iterator<Item = Chunk<'_>> + '_ {
        self.blocks.iter().map(move |block| self.chunk(block))
    }

    fn chunk(&self, block: &ByteBlock) -> Chunk<'_> {
        let start = block.mmap_offset;
        let stop = start + block.length;
        Chunk {
            path: &self.paths[block.mmap_index],
            offset: start,
            bytes: &self.sources[block.mmap_index].bytes()[start..stop],
        }
    }

    /// Parses every chunk in parallel and concatenates the results in input
    /// order. Any failing chunk aborts the whole read.
    pub fn parse<I: FeatureId, V: FeatureValue>(
        &self,
        parser: &LibSvmParser,
    ) -> Result<SparseBlock<I, V>, ScanError> {
        let start = Instant::now();
        let parsed: Vec<ParsedBlock<I, V>> = self
            .blocks
            .par_iter()
            .map(|block| -> Result<ParsedBlock<I, V>, ScanError> {
                let chunk = self.chunk(block);
                let parsed = parser
                    .parse_block::<I, V>(chunk.bytes)
                    .map_err(|e| self.locate(block, e))?;
                debug!(
                    "chunk {:?}@{}: {} rows, {} nonzeros, shifted {}",
                    chunk.path,
                    chunk.offset,
                    parsed.block.num_rows(),
                    parsed.block.num_nonzeros(),
                    parsed.shifted
                );
                Ok(parsed)
            })
            .collect::<Result<_, ScanError>>()?;

        if parser.indexing() == IndexingMode::Auto {
            let with_features = || parsed.iter().filter(|p| p.min_feature_id.is_some());
            let shifted = with_features().filter(|p| p.shifted).count();
            if shifted > 0 && shifted < with_features().count() {
                warn!(
                    "indexing origin detected per chunk disagrees: {} of {} chunks shifted to 0-based",
                    shifted,
                    with_features().count()
                );
            }
        }

        let nchunks = parsed.len();
        let mut merged = SparseBlock::new();
        for p in parsed {
            merged.append(p.block).map_err(ScanError::Merge)?;
        }
        debug_assert_eq!(merged.check_invariants(), Ok(()));
        info!(
            "parsed {} rows, {} nonzeros from {} chunks in {:.0?}",
            merged.num_rows(),
            merged.num_nonzeros(),
            nchunks,
            Instant::now().duration_since(start)
        );
        Ok(merged)
    }

    /// Attaches the file name and file-relative position to a chunk's error.
    fn locate(&self, block: &ByteBlock, e: ParseError) -> ScanError {
        let prefix = &self.sources[block.mmap_index].bytes()[..block.mmap_offset];
        ScanError::Parse {
            path: self.paths[block.mmap_index].clone(),
            source: e.rebase(count_lines(prefix), block.mmap_offset),
        }
    }
}

fn map_files(paths: &[PathBuf]) -> Result<Vec<Source>, ScanError> {
    paths
        .iter()
        .map(|path| {
            let io = |source| ScanError::Io {
                path: path.clone(),
                source,
            };
            let file = File::open(path).map_err(io)?;
            if file.metadata().map_err(io)?.len() == 0 {
                return Ok(Source::Empty);
            }
            // SAFETY: caller must guarantee this file is not
            // mutated during use, per struct documentation.
            // https://users.rust-lang.org/t/how-unsafe-is-mmap/19635/24
            let mmap = unsafe { MmapOptions::new().map(&file) }.map_err(io)?;
            Ok(Source::Mapped(mmap))
        })
        .collect()
}

/// First byte of the line containing position `buflen`, never splitting a
/// `\r\n` pair.
fn start_of_line(buflen: usize, buf: &[u8]) -> usize {
    match buf[..buflen].rfind_byteset(b"\r\n") {
        None => 0,
        Some(ix) if buf[ix] == b'\r' && buf.get(ix + 1) == Some(&b'\n') => ix + 2,
        Some(ix) => ix + 1,
    }
}
