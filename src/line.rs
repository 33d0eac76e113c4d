//! Line-level scanning: splitting a byte range into physical lines and
//! skipping the blank or comment-only tail of a line.

use bstr::ByteSlice;

pub const COMMENT: u8 = b'#';

/// Whitespace that doesn't end a line.
#[inline]
pub fn is_blank(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

/// Returns how far to advance into `bytes` to reach meaningful content.
///
/// If a comment marker comes before any non-blank byte, or there is no
/// non-blank byte at all, the whole range is skipped.
pub fn skip_blank_and_comment(bytes: &[u8]) -> usize {
    for (i, &b) in bytes.iter().enumerate() {
        if b == COMMENT {
            return bytes.len();
        }
        if !is_blank(b) {
            return i;
        }
    }
    bytes.len()
}

/// One physical line, without its terminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based.
    pub number: usize,
    /// Byte offset of the first byte of the line within the scanned range.
    pub offset: usize,
    pub bytes: &'a [u8],
}

/// An iterator over the lines of a byte range, split on `\n`, `\r` or `\r\n`.
#[derive(Clone)]
pub struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
    number: usize,
}

impl<'a> Lines<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Lines {
            bytes,
            pos: 0,
            number: 0,
        }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = Line<'a>;

    fn next(&mut self) -> Option<Line<'a>> {
        if self.pos == self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let rest = &self.bytes[start..];
        let (end, new_pos) = match rest.find_byteset(b"\r\n") {
            None => (rest.len(), rest.len()),
            Some(i) if rest[i] == b'\r' && rest.get(i + 1) == Some(&b'\n') => (i, i + 2),
            Some(i) => (i, i + 1),
        };
        self.pos = start + new_pos;
        self.number += 1;
        Some(Line {
            number: self.number,
            offset: start,
            bytes: &rest[..end],
        })
    }
}

/// Number of line terminators in `bytes`, counting `\r\n` once.
pub fn count_lines(bytes: &[u8]) -> usize {
    let count = Lines::new(bytes).count();
    // an unterminated tail is a line, not a terminator
    match bytes.last() {
        Some(b'\n') | Some(b'\r') | None => count,
        Some(_) => count - 1,
    }
}
