//! The LibSVM record parser.
//!
//! Each line follows
//!
//! ```text
//! <line>    -> <label> <qid> (<id>:<value>)* <comment>
//! <label>   -> <float> : <weight> | <float>
//! <qid>     -> qid:<unsigned int> | e
//! <comment> -> # <anything> | e
//! ```
//!
//! Blank and comment-only lines are skipped. Weights and query ids are all or
//! nothing within a pass: the first record decides, and every later record
//! must agree.

use crate::block::{FeatureId, FeatureValue, SparseBlock};
use crate::config::ParserConfig;
use crate::error::{Field, ParseError, Presence};
use crate::indexing::IndexingMode;
use crate::line::{is_blank, skip_blank_and_comment, Line, Lines};
use crate::pair::{parse_num, parse_pair, word_end, Pair};

const QID_PREFIX: &[u8] = b"qid:";

/// The output of one pass over a byte range.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBlock<I, V> {
    pub block: SparseBlock<I, V>,
    /// Smallest feature id as written in the text, before any shift.
    pub min_feature_id: Option<I>,
    /// Whether ids were moved from 1-based to 0-based.
    pub shifted: bool,
}

#[derive(Debug, Clone)]
pub struct LibSvmParser {
    indexing: IndexingMode,
}

impl LibSvmParser {
    pub fn new(config: &ParserConfig) -> Result<Self, ParseError> {
        config.validate()?;
        Ok(LibSvmParser {
            indexing: config.indexing(),
        })
    }

    pub fn indexing(&self) -> IndexingMode {
        self.indexing
    }

    /// Parses every line of `bytes` into a fresh block.
    ///
    /// Any malformed record aborts the pass; no partial block is returned.
    pub fn parse_block<I: FeatureId, V: FeatureValue>(
        &self,
        bytes: &[u8],
    ) -> Result<ParsedBlock<I, V>, ParseError> {
        let mut pass = Pass::new(self.indexing);
        for line in Lines::new(bytes) {
            pass.parse_line(line)?;
        }
        Ok(pass.finish())
    }
}

/// Whether an optional field has been seen yet in this pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HasField {
    Unknown,
    Known(Presence),
}

impl HasField {
    fn observe(&mut self, present: bool, field: Field, line: &Line<'_>) -> Result<(), ParseError> {
        let seen = if present {
            Presence::Required
        } else {
            Presence::Forbidden
        };
        match *self {
            HasField::Unknown => {
                *self = HasField::Known(seen);
                Ok(())
            }
            HasField::Known(expected) if expected == seen => Ok(()),
            HasField::Known(expected) => Err(ParseError::FieldConsistency {
                field,
                expected,
                line: line.number,
                offset: line.offset,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Label,
    Qid,
    Features,
    Comment,
    Done,
}

struct Pass<I, V> {
    block: SparseBlock<I, V>,
    indexing: IndexingMode,
    has_weight: HasField,
    has_qid: HasField,
    min_id: Option<I>,
}

impl<I: FeatureId, V: FeatureValue> Pass<I, V> {
    fn new(indexing: IndexingMode) -> Self {
        Pass {
            block: SparseBlock::new(),
            indexing,
            has_weight: HasField::Unknown,
            has_qid: HasField::Unknown,
            min_id: None,
        }
    }

    fn parse_line(&mut self, line: Line<'_>) -> Result<(), ParseError> {
        let bytes = line.bytes;
        let mut p = skip_blank_and_comment(bytes);
        let mut state = State::Label;
        loop {
            state = match state {
                State::Label => {
                    let (pair, end) =
                        parse_pair::<f32, f32>(bytes, p).map_err(|bad| ParseError::InvalidLabel {
                            line: line.number,
                            offset: line.offset,
                            token: bad.text(bytes),
                        })?;
                    let (label, weight) = match pair {
                        Pair::Empty => return Ok(()),
                        Pair::Key(label) => (label, None),
                        Pair::KeyValue(label, weight) => (label, Some(weight)),
                    };
                    self.has_weight
                        .observe(weight.is_some(), Field::Weight, &line)?;
                    self.block.label.push(label);
                    self.block.weight.extend(weight);
                    p = end;
                    State::Qid
                }
                State::Qid => {
                    p += bytes[p..].iter().take_while(|&&b| is_blank(b)).count();
                    let qid = if bytes[p..].starts_with(QID_PREFIX) {
                        let start = p + QID_PREFIX.len();
                        let digits = bytes[start..]
                            .iter()
                            .take_while(|b| b.is_ascii_digit())
                            .count();
                        let qid = parse_num::<u64>(&bytes[start..start + digits]).ok_or_else(
                            || ParseError::InvalidQid {
                                line: line.number,
                                offset: line.offset,
                                token: String::from_utf8_lossy(&bytes[p..word_end(bytes, p)])
                                    .into_owned(),
                            },
                        )?;
                        p = start + digits;
                        Some(qid)
                    } else {
                        None
                    };
                    self.has_qid.observe(qid.is_some(), Field::Qid, &line)?;
                    self.block.qid.extend(qid);
                    State::Comment
                }
                State::Features => {
                    let malformed = |start: usize, end: usize| ParseError::MalformedPair {
                        line: line.number,
                        offset: line.offset,
                        token: String::from_utf8_lossy(&bytes[start..end]).into_owned(),
                    };
                    let (pair, end) = parse_pair::<I, V>(bytes, p)
                        .map_err(|bad| malformed(bad.start, bad.end))?;
                    match pair {
                        Pair::Empty => State::Done,
                        Pair::Key(_) => return Err(malformed(p, end)),
                        Pair::KeyValue(id, value) => {
                            if id == I::ZERO && self.indexing == IndexingMode::OneBased {
                                return Err(ParseError::ZeroFeatureId {
                                    line: line.number,
                                    offset: line.offset,
                                });
                            }
                            self.min_id = Some(self.min_id.map_or(id, |min| min.min(id)));
                            self.block.index.push(id);
                            self.block.value.push(value);
                            p = end;
                            State::Comment
                        }
                    }
                }
                State::Comment => {
                    p += skip_blank_and_comment(&bytes[p..]);
                    State::Features
                }
                State::Done => {
                    self.block.close_row();
                    return Ok(());
                }
            }
        }
    }

    fn finish(mut self) -> ParsedBlock<I, V> {
        debug_assert_eq!(self.block.check_invariants(), Ok(()));
        let shifted = self.indexing.resolve(&mut self.block);
        ParsedBlock {
            block: self.block,
            min_feature_id: self.min_id,
            shifted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str, indexing_mode: i32) -> Result<ParsedBlock<u32, f32>, ParseError> {
        LibSvmParser::new(&ParserConfig::with_indexing_mode(indexing_mode))?
            .parse_block(text.as_bytes())
    }

    #[test]
    fn rejects_other_formats() {
        let config = ParserConfig {
            format: "csv".to_owned(),
            indexing_mode: 0,
        };
        assert!(matches!(
            LibSvmParser::new(&config),
            Err(ParseError::Config(_))
        ));
    }

    #[test]
    fn labels_and_features() {
        let parsed = parse("1 1:0.5 3:0.2\n0 2:0.1\n", 0).unwrap();
        let b = &parsed.block;
        assert_eq!(b.label, vec![1.0, 0.0]);
        assert_eq!(b.offset, vec![0, 2, 3]);
        assert_eq!(b.index, vec![1, 3, 2]);
        assert_eq!(b.value, vec![0.5, 0.2, 0.1]);
        assert!(b.weight.is_empty() && b.qid.is_empty());
        assert_eq!(parsed.min_feature_id, Some(1));
        assert!(!parsed.shifted);
    }

    #[test]
    fn weight_and_qid() {
        let b = parse("1:2.0 qid:7 1:0.5\n", 0).unwrap().block;
        assert_eq!(b.label, vec![1.0]);
        assert_eq!(b.weight, vec![2.0]);
        assert_eq!(b.qid, vec![7]);
        assert_eq!(b.index, vec![1]);
        assert_eq!(b.value, vec![0.5]);
    }

    #[test]
    fn record_without_features() {
        let b = parse("3\n-1 qid:2\n", 0);
        assert!(matches!(b, Err(ParseError::FieldConsistency { field: Field::Qid, .. })));

        let b = parse("3\n-1 # nothing here\n2 4:1", 0).unwrap().block;
        assert_eq!(b.label, vec![3.0, -1.0, 2.0]);
        assert_eq!(b.offset, vec![0, 0, 0, 1]);
    }

    #[test]
    fn trailing_comments_and_blanks() {
        let b = parse("1 1:0.5 \t# c 2:9\n0 2:0.1#x\n", 0).unwrap().block;
        assert_eq!(b.index, vec![1, 2]);
        assert_eq!(b.offset, vec![0, 1, 2]);
    }

    #[test]
    fn carriage_returns() {
        let b = parse("1 1:1\r\n0 2:1\r3 3:1", 0).unwrap().block;
        assert_eq!(b.label, vec![1.0, 0.0, 3.0]);
        assert_eq!(b.index, vec![1, 2, 3]);
    }

    #[test]
    fn weight_must_be_consistent() {
        let err = parse("1:1 1:0.5\n2 1:0.3\n", 0).unwrap_err();
        assert_eq!(
            err,
            ParseError::FieldConsistency {
                field: Field::Weight,
                expected: Presence::Required,
                line: 2,
                offset: 10,
            }
        );

        let err = parse("1 1:0.5\n2:1 1:0.3\n", 0).unwrap_err();
        assert!(matches!(
            err,
            ParseError::FieldConsistency {
                field: Field::Weight,
                expected: Presence::Forbidden,
                ..
            }
        ));
    }

    #[test]
    fn qid_must_be_consistent() {
        let err = parse("1 qid:1 1:0.5\n2 1:0.3\n", 0).unwrap_err();
        assert!(matches!(
            err,
            ParseError::FieldConsistency {
                field: Field::Qid,
                expected: Presence::Required,
                line: 2,
                ..
            }
        ));
        let err = parse("1 1:0.5\n\n2 qid:4 1:0.3\n", 0).unwrap_err();
        assert_eq!(err.line(), Some(3));
    }

    #[test]
    fn malformed_pairs() {
        let err = parse("1 1:0.5\n2 1:0.3:extra\n", 0).unwrap_err();
        assert_eq!(
            err,
            ParseError::MalformedPair {
                line: 2,
                offset: 8,
                token: "1:0.3:extra".to_owned(),
            }
        );
        assert!(matches!(
            parse("1 4 5:1\n", 0),
            Err(ParseError::MalformedPair { .. })
        ));
        assert!(matches!(
            parse("1 4:\n", 0),
            Err(ParseError::MalformedPair { .. })
        ));
        assert!(matches!(
            parse("1 -4:1\n", 0),
            Err(ParseError::MalformedPair { .. })
        ));
    }

    #[test]
    fn malformed_token_after_qid_is_trimmed() {
        assert_eq!(
            parse("1 qid:3    4\n", 0).unwrap_err(),
            ParseError::MalformedPair {
                line: 1,
                offset: 0,
                token: "4".to_owned(),
            }
        );
        assert_eq!(
            parse("1 qid:3\t 2:1 \t9\n", 0).unwrap_err(),
            ParseError::MalformedPair {
                line: 1,
                offset: 0,
                token: "9".to_owned(),
            }
        );
        let b = parse("1 qid:3   # trailing\n", 0).unwrap().block;
        assert_eq!(b.qid, vec![3]);
        assert_eq!(b.offset, vec![0, 0]);
    }

    #[test]
    fn near_miss_qid_falls_through_to_features() {
        // not the literal prefix, so it is read as a feature word and fails there
        for text in &["1 QID:3 1:1\n", "1 qid3 1:1\n", "1 qid :3 1:1\n"] {
            assert!(
                matches!(parse(text, 0), Err(ParseError::MalformedPair { .. })),
                "{}",
                text
            );
        }
    }

    #[test]
    fn qid_needs_digits() {
        assert!(matches!(
            parse("1 qid:x 1:1\n", 0),
            Err(ParseError::InvalidQid { .. })
        ));
        assert!(matches!(
            parse("1 qid:99999999999999999999 1:1\n", 0),
            Err(ParseError::InvalidQid { .. })
        ));
        // digits stop the qid, the rest is a feature word
        assert!(matches!(
            parse("1 qid:7x 1:1\n", 0),
            Err(ParseError::MalformedPair { .. })
        ));
    }

    #[test]
    fn non_numeric_label() {
        let err = parse("  yes 1:1\n", 0).unwrap_err();
        assert_eq!(
            err,
            ParseError::InvalidLabel {
                line: 1,
                offset: 0,
                token: "yes".to_owned(),
            }
        );
    }

    #[test]
    fn forced_one_based_shifts() {
        let parsed = parse("1 1:0.5 3:0.2\n0 2:0.1\n", 1).unwrap();
        assert_eq!(parsed.block.index, vec![0, 2, 1]);
        assert!(parsed.shifted);
        assert_eq!(parsed.min_feature_id, Some(1));
    }

    #[test]
    fn forced_one_based_rejects_zero() {
        let err = parse("1 1:0.5\n0 0:0.1\n", 1).unwrap_err();
        assert_eq!(err, ParseError::ZeroFeatureId { line: 2, offset: 8 });
    }

    #[test]
    fn auto_detects_origin() {
        let parsed = parse("1 1:0.5 3:0.2\n0 2:0.1\n", -1).unwrap();
        assert_eq!(parsed.block.index, vec![0, 2, 1]);

        let parsed = parse("1 1:0.5 3:0.2\n0 0:0.1\n", -1).unwrap();
        assert_eq!(parsed.block.index, vec![1, 3, 0]);
        assert!(!parsed.shifted);

        let parsed = parse("1\n0\n", -1).unwrap();
        assert!(!parsed.shifted);
        assert_eq!(parsed.min_feature_id, None);
    }

    #[test]
    fn empty_input() {
        let parsed = parse("", -1).unwrap();
        assert!(parsed.block.is_empty());
        assert_eq!(parsed.block.offset, vec![0]);

        let parsed = parse("\n  \n# only comments\n\t# here\n", 0).unwrap();
        assert!(parsed.block.is_empty());
    }

    #[test]
    fn wide_types() {
        let parser = LibSvmParser::new(&ParserConfig::default()).unwrap();
        let parsed = parser
            .parse_block::<u64, f64>(b"1 5000000000:0.125\n")
            .unwrap();
        assert_eq!(parsed.block.index, vec![5_000_000_000u64]);
        assert_eq!(parsed.block.value, vec![0.125f64]);
    }
}
