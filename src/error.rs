//! Errors raised while configuring a parser, parsing a pass, or reading
//! input files.
//!
//! Every pass-level error is fatal to the pass that raised it and carries
//! the 1-based line number and the byte offset of the start of the offending
//! line, both relative to the bytes handed to that pass.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Which optional per-record field broke the all-or-nothing rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Weight,
    Qid,
}

/// Whether the first record of a pass carried an optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Forbidden,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Required => write!(f, "required"),
            Presence::Forbidden => write!(f, "forbidden"),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Weight => write!(f, "weight"),
            Field::Qid => write!(f, "qid"),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    /// The parser was configured with something it can't honor.
    #[error("configuration error: {0}")]
    Config(String),

    /// `expected` is what the first record of the pass established.
    #[error("line {line}: {field} is {expected} for all records of this pass")]
    FieldConsistency {
        field: Field,
        expected: Presence,
        line: usize,
        offset: usize,
    },

    #[error("line {line}: incomplete or malformed feature:value pair {token:?}")]
    MalformedPair {
        line: usize,
        offset: usize,
        token: String,
    },

    #[error("line {line}: label[:weight] {token:?} is not numeric")]
    InvalidLabel {
        line: usize,
        offset: usize,
        token: String,
    },

    #[error("line {line}: qid {token:?} is not an unsigned integer")]
    InvalidQid {
        line: usize,
        offset: usize,
        token: String,
    },

    #[error("line {line}: feature id 0 found while indices are declared 1-based")]
    ZeroFeatureId { line: usize, offset: usize },

    /// Two finished blocks disagree on whether `field` is carried at all.
    #[error("cannot merge blocks: {field} present in some blocks but not others")]
    MixedBlocks { field: Field },
}

impl ParseError {
    /// Line the error was raised on, if it came from input text.
    pub fn line(&self) -> Option<usize> {
        match *self {
            ParseError::Config(_) | ParseError::MixedBlocks { .. } => None,
            ParseError::FieldConsistency { line, .. }
            | ParseError::MalformedPair { line, .. }
            | ParseError::InvalidLabel { line, .. }
            | ParseError::InvalidQid { line, .. }
            | ParseError::ZeroFeatureId { line, .. } => Some(line),
        }
    }

    /// Byte offset of the start of the offending line.
    pub fn offset(&self) -> Option<usize> {
        match *self {
            ParseError::Config(_) | ParseError::MixedBlocks { .. } => None,
            ParseError::FieldConsistency { offset, .. }
            | ParseError::MalformedPair { offset, .. }
            | ParseError::InvalidLabel { offset, .. }
            | ParseError::InvalidQid { offset, .. }
            | ParseError::ZeroFeatureId { offset, .. } => Some(offset),
        }
    }

    /// Moves a pass-relative position into the coordinates of the enclosing
    /// input, given the number of lines and bytes preceding the pass.
    pub(crate) fn rebase(mut self, lines_before: usize, bytes_before: usize) -> Self {
        match &mut self {
            ParseError::Config(_) | ParseError::MixedBlocks { .. } => {}
            ParseError::FieldConsistency { line, offset, .. }
            | ParseError::MalformedPair { line, offset, .. }
            | ParseError::InvalidLabel { line, offset, .. }
            | ParseError::InvalidQid { line, offset, .. }
            | ParseError::ZeroFeatureId { line, offset } => {
                *line += lines_before;
                *offset += bytes_before;
            }
        }
        self
    }
}

/// Errors from reading whole files through a [`crate::ChunkSource`].
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("merging chunks: {0}")]
    Merge(#[source] ParseError),
}
