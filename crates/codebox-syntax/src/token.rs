//! Token model shared by the cache, the lexer adapter and the backends.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::state::ResumeState;

/// Classification of a token.
///
/// The set is closed and defined by the lexer backends. The cache treats it
/// opaquely except for [`TokenCategory::EndOfStream`], which terminates a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenCategory {
    Keyword,
    Identifier,
    Comment,
    LineComment,
    StringLiteral,
    NumericLiteral,
    Operator,
    Error,
    EndOfStream,
    Other,
}

impl TokenCategory {
    /// Number of categories; sizes per-category lookup tables.
    pub const COUNT: usize = 10;

    pub const ALL: [TokenCategory; Self::COUNT] = [
        TokenCategory::Keyword,
        TokenCategory::Identifier,
        TokenCategory::Comment,
        TokenCategory::LineComment,
        TokenCategory::StringLiteral,
        TokenCategory::NumericLiteral,
        TokenCategory::Operator,
        TokenCategory::Error,
        TokenCategory::EndOfStream,
        TokenCategory::Other,
    ];

    /// Dense index in `0..COUNT`.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Configuration name of the category.
    pub fn name(self) -> &'static str {
        match self {
            TokenCategory::Keyword => "keyword",
            TokenCategory::Identifier => "identifier",
            TokenCategory::Comment => "comment",
            TokenCategory::LineComment => "line_comment",
            TokenCategory::StringLiteral => "string_literal",
            TokenCategory::NumericLiteral => "numeric_literal",
            TokenCategory::Operator => "operator",
            TokenCategory::Error => "error",
            TokenCategory::EndOfStream => "end_of_stream",
            TokenCategory::Other => "other",
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TokenCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TokenCategory::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown token category `{s}`"))
    }
}

/// A classified span of source text, in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub category: TokenCategory,
    pub start: usize,
    pub len: usize,
}

impl Token {
    pub const fn new(category: TokenCategory, start: usize, len: usize) -> Self {
        Self {
            category,
            start,
            len,
        }
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    #[inline]
    pub fn range(&self) -> std::ops::Range<usize> {
        self.start..self.end()
    }

    /// The source text covered by this token.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }
}

/// A token together with the lexer state captured right after it.
///
/// `resume_state` is `None` for backends that cannot resume.
#[derive(Debug, Clone)]
pub struct CachedToken {
    pub token: Token,
    pub resume_state: Option<ResumeState>,
}
