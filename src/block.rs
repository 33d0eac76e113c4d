//! The sparse block: a CSR-style structure-of-arrays holding the records of
//! one parse pass.
//!
//! For record `i`, its features live at `index[offset[i]..offset[i + 1]]`
//! and `value[offset[i]..offset[i + 1]]`. Weights and query ids are either
//! absent for the whole block or present for every record.

use itertools::Itertools;
use std::fmt::Debug;
use std::str::FromStr;

use crate::error::{Field, ParseError};

/// Integer types usable as feature identifiers.
pub trait FeatureId: Copy + Ord + Debug + FromStr + Send + Sync + 'static {
    const ZERO: Self;

    /// Converts a 1-based id to 0-based. Callers guarantee `self > ZERO`.
    fn one_based_to_zero(self) -> Self;
}

/// Floating-point types usable as feature values.
pub trait FeatureValue: Copy + PartialEq + Debug + FromStr + Send + Sync + 'static {}

macro_rules! impl_feature_id {
    ($($t:ty),*) => {
        $(impl FeatureId for $t {
            const ZERO: Self = 0;

            #[inline]
            fn one_based_to_zero(self) -> Self {
                self - 1
            }
        })*
    };
}

impl_feature_id!(u32, u64);
impl FeatureValue for f32 {}
impl FeatureValue for f64 {}

#[derive(Debug, Clone, PartialEq)]
pub struct SparseBlock<I = u32, V = f32> {
    pub label: Vec<f32>,
    pub weight: Vec<f32>,
    pub qid: Vec<u64>,
    pub offset: Vec<u64>,
    pub index: Vec<I>,
    pub value: Vec<V>,
}

/// A borrowed view of one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Row<'a, I, V> {
    pub label: f32,
    pub weight: Option<f32>,
    pub qid: Option<u64>,
    pub index: &'a [I],
    pub value: &'a [V],
}

impl<'a, I, V> Row<'a, I, V> {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl<I: FeatureId, V: FeatureValue> Default for SparseBlock<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: FeatureId, V: FeatureValue> SparseBlock<I, V> {
    pub fn new() -> Self {
        SparseBlock {
            label: Vec::new(),
            weight: Vec::new(),
            qid: Vec::new(),
            offset: vec![0],
            index: Vec::new(),
            value: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.label.clear();
        self.weight.clear();
        self.qid.clear();
        self.offset.clear();
        self.offset.push(0);
        self.index.clear();
        self.value.clear();
    }

    pub fn num_rows(&self) -> usize {
        self.label.len()
    }

    pub fn num_nonzeros(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label.is_empty()
    }

    pub fn has_weight(&self) -> bool {
        !self.weight.is_empty()
    }

    pub fn has_qid(&self) -> bool {
        !self.qid.is_empty()
    }

    /// Largest feature id in the block, or `None` if there are no features.
    pub fn max_index(&self) -> Option<I> {
        self.index.iter().copied().max()
    }

    /// Closes the current record's feature range.
    pub(crate) fn close_row(&mut self) {
        self.offset.push(self.index.len() as u64);
    }

    pub fn row(&self, i: usize) -> Row<'_, I, V> {
        let (lo, hi) = (self.offset[i] as usize, self.offset[i + 1] as usize);
        Row {
            label: self.label[i],
            weight: self.weight.get(i).copied(),
            qid: self.qid.get(i).copied(),
            index: &self.index[lo..hi],
            value: &self.value[lo..hi],
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_, I, V>> + '_ {
        (0..self.num_rows()).map(move |i| self.row(i))
    }

    /// Returns a description of the first broken structural invariant.
    pub fn check_invariants(&self) -> Result<(), String> {
        let nrows = self.label.len();
        if self.offset.len() != nrows + 1 {
            return Err(format!(
                "offset has {} entries for {} rows",
                self.offset.len(),
                nrows
            ));
        }
        if self.offset[0] != 0 {
            return Err(format!("offset starts at {}", self.offset[0]));
        }
        if self.index.len() != self.value.len() {
            return Err(format!(
                "{} indices but {} values",
                self.index.len(),
                self.value.len()
            ));
        }
        if let Some((i, (lo, hi))) = self
            .offset
            .iter()
            .tuple_windows()
            .find_position(|(lo, hi)| lo > hi)
        {
            return Err(format!("offset decreases at row {}: {} > {}", i, lo, hi));
        }
        if self.offset[nrows] != self.index.len() as u64 {
            return Err(format!(
                "last offset {} but {} indices",
                self.offset[nrows],
                self.index.len()
            ));
        }
        if !self.weight.is_empty() && self.weight.len() != nrows {
            return Err(format!("{} weights for {} rows", self.weight.len(), nrows));
        }
        if !self.qid.is_empty() && self.qid.len() != nrows {
            return Err(format!("{} qids for {} rows", self.qid.len(), nrows));
        }
        Ok(())
    }

    /// Concatenates `other` after the rows of `self`.
    ///
    /// Empty blocks merge with anything; otherwise both sides must agree on
    /// carrying weights and query ids.
    pub fn append(&mut self, mut other: Self) -> Result<(), ParseError> {
        if other.is_empty() {
            return Ok(());
        }
        if self.is_empty() {
            *self = other;
            return Ok(());
        }
        if self.has_weight() != other.has_weight() {
            return Err(ParseError::MixedBlocks {
                field: Field::Weight,
            });
        }
        if self.has_qid() != other.has_qid() {
            return Err(ParseError::MixedBlocks { field: Field::Qid });
        }

        let rstart = self.index.len() as u64;
        self.label.append(&mut other.label);
        self.weight.append(&mut other.weight);
        self.qid.append(&mut other.qid);
        self.offset
            .extend(other.offset.into_iter().skip(1).map(|o| o + rstart));
        self.index.append(&mut other.index);
        self.value.append(&mut other.value);
        Ok(())
    }
}
