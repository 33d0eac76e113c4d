//! Feature index origin: whether ids in the text count from 0 or from 1.
//!
//! The decision is made once per finished block, after every id has been
//! collected, so a block is never shifted incrementally.

use crate::block::{FeatureId, FeatureValue, SparseBlock};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexingMode {
    /// Ids are 1-based; every id is shifted down by one.
    OneBased,
    /// Ids are already 0-based.
    ZeroBased,
    /// Shift only if the block has features and id 0 never appears.
    Auto,
}

impl IndexingMode {
    /// `> 0` forces 1-based, `0` forces 0-based, `< 0` detects.
    pub fn from_flag(flag: i32) -> Self {
        if flag > 0 {
            IndexingMode::OneBased
        } else if flag == 0 {
            IndexingMode::ZeroBased
        } else {
            IndexingMode::Auto
        }
    }

    /// Whether a block whose smallest id is `min_id` should be shifted.
    pub fn shifts<I: FeatureId>(self, min_id: Option<I>) -> bool {
        match self {
            IndexingMode::OneBased => true,
            IndexingMode::ZeroBased => false,
            IndexingMode::Auto => matches!(min_id, Some(min) if min > I::ZERO),
        }
    }

    /// Rewrites `block.index` in place to 0-based ids if this mode calls for
    /// it, returning whether a shift happened.
    ///
    /// The smallest id is taken from the block itself. A block that already
    /// holds id 0 is never shifted, whatever the mode.
    pub fn resolve<I: FeatureId, V: FeatureValue>(self, block: &mut SparseBlock<I, V>) -> bool {
        let min_id = block.index.iter().copied().min();
        match min_id {
            Some(min) if min > I::ZERO && self.shifts(min_id) => {}
            _ => return false,
        }
        for id in block.index.iter_mut() {
            *id = id.one_based_to_zero();
        }
        true
    }
}

impl Default for IndexingMode {
    fn default() -> Self {
        IndexingMode::ZeroBased
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_ids(ids: &[u32]) -> SparseBlock {
        let mut b = SparseBlock::new();
        b.label.push(1.0);
        b.index.extend_from_slice(ids);
        b.value.extend(ids.iter().map(|_| 1.0));
        b.close_row();
        b
    }

    #[test]
    fn flag_decoding() {
        assert_eq!(IndexingMode::from_flag(1), IndexingMode::OneBased);
        assert_eq!(IndexingMode::from_flag(7), IndexingMode::OneBased);
        assert_eq!(IndexingMode::from_flag(0), IndexingMode::ZeroBased);
        assert_eq!(IndexingMode::from_flag(-1), IndexingMode::Auto);
    }

    #[test]
    fn decision_table() {
        assert!(IndexingMode::OneBased.shifts(Some(1u32)));
        assert!(!IndexingMode::ZeroBased.shifts(Some(1u32)));
        assert!(IndexingMode::Auto.shifts(Some(1u32)));
        assert!(!IndexingMode::Auto.shifts(Some(0u32)));
        assert!(!IndexingMode::Auto.shifts::<u32>(None));
    }

    #[test]
    fn forced_shift() {
        let mut b = with_ids(&[1, 3, 2]);
        assert!(IndexingMode::OneBased.resolve(&mut b));
        assert_eq!(b.index, vec![0, 2, 1]);
    }

    #[test]
    fn auto_keeps_blocks_that_use_zero() {
        let mut b = with_ids(&[0, 3]);
        assert!(!IndexingMode::Auto.resolve(&mut b));
        assert_eq!(b.index, vec![0, 3]);
    }

    #[test]
    fn auto_leaves_featureless_blocks() {
        let mut b: SparseBlock = SparseBlock::new();
        b.label.push(1.0);
        b.close_row();
        assert!(!IndexingMode::Auto.resolve(&mut b));
        assert!(!IndexingMode::OneBased.resolve(&mut b));
    }

    #[test]
    fn zero_based_resolution_is_a_noop() {
        let mut b = with_ids(&[4, 2]);
        assert!(IndexingMode::Auto.resolve(&mut b));
        let resolved = b.clone();
        assert!(!IndexingMode::ZeroBased.resolve(&mut b));
        assert_eq!(b, resolved);
    }

    #[test]
    fn forced_shift_leaves_zero_ids_alone() {
        let mut b = with_ids(&[0, 2]);
        assert!(!IndexingMode::OneBased.resolve(&mut b));
        assert_eq!(b.index, vec![0, 2]);

        let mut wide: SparseBlock<u64, f64> = SparseBlock::new();
        wide.label.push(0.0);
        wide.index.extend_from_slice(&[5, 0]);
        wide.value.extend_from_slice(&[1.0, 1.0]);
        wide.close_row();
        assert!(!IndexingMode::OneBased.resolve(&mut wide));
        assert_eq!(wide.index, vec![5, 0]);
    }
}
