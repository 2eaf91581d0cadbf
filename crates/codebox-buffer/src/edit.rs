//! Edit descriptors.
//!
//! Two shapes describe a single contiguous mutation:
//! - [`TextChange`] carries the inserted text and is what a host applies to the buffer.
//! - [`Edit`] only carries lengths and is what the buffer reports back to caches
//!   that re-read the text themselves.

use serde::{Deserialize, Serialize};
use std::ops::Range;
use std::str::FromStr;

use crate::BufferError;

/// A single contiguous text mutation, expressed in byte lengths.
///
/// `offset` and `removed_len` refer to the text *before* the edit;
/// `inserted_len` describes the text that replaced the removed range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Edit {
    /// Byte offset where the edit starts
    pub offset: usize,
    /// Number of bytes removed at `offset`
    pub removed_len: usize,
    /// Number of bytes inserted at `offset`
    pub inserted_len: usize,
}

impl Edit {
    pub const fn new(offset: usize, removed_len: usize, inserted_len: usize) -> Self {
        Self {
            offset,
            removed_len,
            inserted_len,
        }
    }

    /// An insertion of `len` bytes at `offset`.
    pub const fn insert(offset: usize, len: usize) -> Self {
        Self::new(offset, 0, len)
    }

    /// A deletion of the byte range `range`.
    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range.start, range.end.saturating_sub(range.start), 0)
    }

    /// Returns true if the edit neither removes nor inserts anything.
    pub fn is_noop(&self) -> bool {
        self.removed_len == 0 && self.inserted_len == 0
    }

    /// End of the removed range in the old text.
    pub fn old_end(&self) -> usize {
        self.offset.saturating_add(self.removed_len)
    }

    /// End of the inserted range in the new text.
    pub fn new_end(&self) -> usize {
        self.offset.saturating_add(self.inserted_len)
    }

    /// Change in document length caused by this edit.
    pub fn delta(&self) -> isize {
        self.inserted_len as isize - self.removed_len as isize
    }
}

/// A replacement request: remove `removed` bytes at `offset`, insert `text`.
///
/// The textual form used on the command line is `OFFSET:REMOVED:TEXT`, where
/// `TEXT` may contain `\n`, `\t` and `\\` escapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    pub offset: usize,
    #[serde(default)]
    pub removed: usize,
    #[serde(default)]
    pub text: String,
}

impl TextChange {
    pub fn new(offset: usize, removed: usize, text: impl Into<String>) -> Self {
        Self {
            offset,
            removed,
            text: text.into(),
        }
    }

    pub fn insert(offset: usize, text: impl Into<String>) -> Self {
        Self::new(offset, 0, text)
    }

    pub fn delete(range: Range<usize>) -> Self {
        Self::new(range.start, range.end.saturating_sub(range.start), String::new())
    }

    /// Byte range removed from the old text.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset.saturating_add(self.removed)
    }

    /// The length-only descriptor of this change.
    pub fn edit(&self) -> Edit {
        Edit::new(self.offset, self.removed, self.text.len())
    }
}

impl FromStr for TextChange {
    type Err = BufferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || BufferError::MalformedChange(s.to_string());

        let mut parts = s.splitn(3, ':');
        let offset: usize = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or_else(malformed)?;
        let removed: usize = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .ok_or_else(malformed)?;
        let text = unescape(parts.next().unwrap_or_default());
        if offset.checked_add(removed).is_none() {
            return Err(malformed());
        }

        Ok(Self::new(offset, removed, text))
    }
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
