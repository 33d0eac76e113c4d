//! Parser configuration, given either as key/value arguments or as the
//! query part of an input URI such as `train.svm?indexing_mode=-1`.

use crate::error::ParseError;
use crate::indexing::IndexingMode;

pub const LIBSVM: &str = "libsvm";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserConfig {
    /// Must be `libsvm`; checked when a parser is built.
    pub format: String,
    /// `> 0` 1-based, `0` 0-based, `< 0` auto-detect.
    pub indexing_mode: i32,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            format: LIBSVM.to_owned(),
            indexing_mode: 0,
        }
    }
}

impl ParserConfig {
    pub fn with_indexing_mode(indexing_mode: i32) -> Self {
        ParserConfig {
            indexing_mode,
            ..Default::default()
        }
    }

    /// Starts from the defaults and applies each `(key, value)` argument.
    pub fn from_args<I, K, V>(args: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = ParserConfig::default();
        for (key, value) in args {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                "format" => config.format = value.to_owned(),
                "indexing_mode" => {
                    config.indexing_mode = value.trim().parse().map_err(|_| {
                        ParseError::Config(format!(
                            "indexing_mode must be an integer, got {:?}",
                            value
                        ))
                    })?
                }
                _ => {
                    return Err(ParseError::Config(format!(
                        "unknown parser argument {:?}",
                        key
                    )))
                }
            }
        }
        Ok(config)
    }

    /// Splits `path?key=value&key=value` into the path and its configuration.
    pub fn from_uri(uri: &str) -> Result<(&str, Self), ParseError> {
        let (path, query) = match uri.find('?') {
            None => return Ok((uri, ParserConfig::default())),
            Some(q) => (&uri[..q], &uri[q + 1..]),
        };
        let args = query
            .split('&')
            .filter(|kv| !kv.is_empty())
            .map(|kv| match kv.find('=') {
                Some(eq) => Ok((&kv[..eq], &kv[eq + 1..])),
                None => Err(ParseError::Config(format!(
                    "expected key=value in {:?}, got {:?}",
                    uri, kv
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((path, ParserConfig::from_args(args)?))
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if self.format != LIBSVM {
            return Err(ParseError::Config(format!(
                "unsupported format {:?}, expected {:?}",
                self.format, LIBSVM
            )));
        }
        Ok(())
    }

    pub fn indexing(&self) -> IndexingMode {
        IndexingMode::from_flag(self.indexing_mode)
    }
}
