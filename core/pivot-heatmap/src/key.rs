//! FILENAME: core/pivot-heatmap/src/key.rs
//! Composite keys - the identity of a row or column group.
//!
//! A key holds one token per axis field, in field order. Tokens are kept
//! apart instead of being joined into one string, so a value that contains
//! the separator cannot alias a different tuple. The joined form is only
//! used for display.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::Result;
use crate::record::Record;

/// Separator used by the printable form of a key.
pub const KEY_SEPARATOR: &str = " | ";

/// The ordered tuple of field tokens identifying a group on one axis.
///
/// Ordering is lexicographic over the tokens, which keeps keys that share a
/// prefix contiguous once sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompositeKey {
    tokens: SmallVec<[String; 4]>,
}

impl CompositeKey {
    /// Builds the key of `record` for the axis described by `fields`.
    ///
    /// An empty field list yields the empty key, so every record lands in
    /// the same group. A field missing from the record is an error.
    pub fn from_record(fields: &[String], record_index: usize, record: &Record) -> Result<Self> {
        let mut tokens = SmallVec::with_capacity(fields.len());
        for field in fields {
            tokens.push(record.lookup(record_index, field)?.to_string());
        }
        Ok(CompositeKey { tokens })
    }

    pub fn from_tokens<I>(tokens: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        CompositeKey {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Token at header depth `level`.
    pub fn level(&self, level: usize) -> Option<&str> {
        self.tokens.get(level).map(String::as_str)
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn depth(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True when both keys agree on every level up to and including `level`.
    /// A level a key does not have reads as an empty token.
    pub fn shares_prefix(&self, other: &CompositeKey, level: usize) -> bool {
        (0..=level).all(|l| self.level(l).unwrap_or("") == other.level(l).unwrap_or(""))
    }

    /// The printable form, tokens joined with `KEY_SEPARATOR`.
    pub fn display(&self) -> String {
        self.tokens.join(KEY_SEPARATOR)
    }
}

impl fmt::Display for CompositeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
