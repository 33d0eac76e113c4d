//! The pair tokenizer: reads one `<key>[:<value>]` word from a line.
//!
//! Words are maximal runs of bytes that are neither blank nor the comment
//! marker `#`. The first `:` in a word separates the key from the value.

use bstr::ByteSlice;
use std::str::FromStr;

use crate::line::{is_blank, COMMENT};

/// What a single word held, by number of fields present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pair<A, B> {
    /// Nothing left on the line (or only a comment).
    Empty,
    Key(A),
    KeyValue(A, B),
}

impl<A, B> Pair<A, B> {
    pub fn fields(&self) -> usize {
        match self {
            Pair::Empty => 0,
            Pair::Key(_) => 1,
            Pair::KeyValue(_, _) => 2,
        }
    }
}

/// Span of a word whose key or value didn't parse as the requested type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadToken {
    pub start: usize,
    pub end: usize,
}

impl BadToken {
    pub fn text(&self, line: &[u8]) -> String {
        line[self.start..self.end].to_str_lossy().into_owned()
    }
}

/// Position directly after the word starting at `start`.
pub fn word_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| is_blank(b) || b == COMMENT)
        .map(|len| start + len)
        .unwrap_or_else(|| bytes.len())
}

pub(crate) fn parse_num<T: FromStr>(text: &[u8]) -> Option<T> {
    text.to_str().ok()?.parse().ok()
}

/// Parses the next `<key>[:<value>]` word at or after `start`, returning what
/// was found and the position where parsing stopped.
///
/// `key:` with nothing after the colon counts as a key alone.
pub fn parse_pair<A: FromStr, B: FromStr>(
    bytes: &[u8],
    start: usize,
) -> Result<(Pair<A, B>, usize), BadToken> {
    let start = bytes[start..]
        .iter()
        .position(|&b| !is_blank(b))
        .map(|skip| start + skip)
        .unwrap_or_else(|| bytes.len());
    if start == bytes.len() || bytes[start] == COMMENT {
        return Ok((Pair::Empty, start));
    }

    let end = word_end(bytes, start);
    let word = &bytes[start..end];
    let bad = BadToken { start, end };
    let (key, value) = match word.find_byte(b':') {
        None => (word, &word[word.len()..]),
        Some(colon) => (&word[..colon], &word[colon + 1..]),
    };

    let key: A = parse_num(key).ok_or(bad)?;
    if value.is_empty() {
        return Ok((Pair::Key(key), end));
    }
    let value: B = parse_num(value).ok_or(bad)?;
    Ok((Pair::KeyValue(key, value), end))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(s: &str) -> Result<(Pair<u32, f32>, usize), BadToken> {
        parse_pair(s.as_bytes(), 0)
    }

    #[test]
    fn key_and_value() {
        assert_eq!(pair("3:0.25 7:1"), Ok((Pair::KeyValue(3, 0.25), 6)));
        assert_eq!(pair("  12:-1e3"), Ok((Pair::KeyValue(12, -1e3), 9)));
    }

    #[test]
    fn key_only() {
        assert_eq!(pair("5 6:1"), Ok((Pair::Key(5), 1)));
        assert_eq!(pair("5:"), Ok((Pair::Key(5), 2)));
        assert_eq!(pair("5#x").map(|(p, _)| p.fields()), Ok(1));
    }

    #[test]
    fn nothing_left() {
        assert_eq!(pair(""), Ok((Pair::Empty, 0)));
        assert_eq!(pair(" \t "), Ok((Pair::Empty, 3)));
        assert_eq!(pair("  # 1:2"), Ok((Pair::Empty, 2)));
    }

    #[test]
    fn resumes_from_start() {
        let line = b"1 2:3.5 4:1";
        let (_, next) = parse_pair::<f32, f32>(line, 0).unwrap();
        let (p, next) = parse_pair::<u32, f32>(line, next).unwrap();
        assert_eq!(p, Pair::KeyValue(2, 3.5));
        let (p, next) = parse_pair::<u32, f32>(line, next).unwrap();
        assert_eq!(p, Pair::KeyValue(4, 1.0));
        assert_eq!(next, line.len());
    }

    #[test]
    fn bad_words_report_their_span() {
        let line = b"1 1:0.3:extra";
        let bad = parse_pair::<u32, f32>(line, 1).unwrap_err();
        assert_eq!(bad, BadToken { start: 2, end: 13 });
        assert_eq!(bad.text(line), "1:0.3:extra");

        assert!(pair("x:1").is_err());
        assert!(pair("-1:1").is_err());
        assert!(pair("1:abc").is_err());
    }
}
