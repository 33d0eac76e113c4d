//! `svmblock` turns LibSVM text into CSR-style sparse blocks.
//!
//! Each line of input looks like
//!
//! ```text
//! <label>[:<weight>] [qid:<query id>] <feature>:<value> <feature>:<value>... [# comment]
//! ```
//!
//! A [`LibSvmParser`] parses one contiguous byte range into a
//! [`SparseBlock`] in a single sequential pass. Passes share no state, so a
//! large input is handled by splitting it into line-aligned chunks with a
//! [`ChunkSource`], parsing the chunks in parallel, and concatenating the
//! blocks in input order.
//!
//! Feature ids may count from 0 or from 1 in the text; see [`IndexingMode`]
//! for how the origin is chosen. Ids read as 1-based are shifted so every
//! finished block is 0-based.
//!
//! ```
//! use svmblock::{LibSvmParser, ParserConfig};
//!
//! let parser = LibSvmParser::new(&ParserConfig::default()).unwrap();
//! let parsed = parser.parse_block::<u32, f32>(b"1 1:0.5 3:0.2\n0 2:0.1\n").unwrap();
//! assert_eq!(parsed.block.offset, vec![0, 2, 3]);
//! assert_eq!(parsed.block.index, vec![1, 3, 2]);
//! ```

pub mod bins;
mod block;
mod config;
mod error;
mod indexing;
pub mod line;
pub mod pair;
mod parser;
mod scanner;

pub use block::{FeatureId, FeatureValue, Row, SparseBlock};
pub use config::{ParserConfig, LIBSVM};
pub use error::{Field, ParseError, Presence, ScanError};
pub use indexing::IndexingMode;
pub use parser::{LibSvmParser, ParsedBlock};
pub use scanner::{Chunk, ChunkSource};
