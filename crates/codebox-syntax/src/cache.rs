//! The incremental token cache.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use codebox_buffer::Edit;

use crate::lexer::{IncrementalLexer, ResumePoint};
use crate::token::{CachedToken, Token};
use crate::{EditError, LexError, SyntaxResult};

/// Which cached tokens survive an edit at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditBoundary {
    /// Keep tokens with `end <= offset`. A token ending exactly at the edit
    /// point is trusted, so text glued onto it starts a new token.
    #[default]
    Retain,
    /// Keep tokens with `end < offset`, so a token touching the edit point is
    /// re-lexed together with the inserted text.
    Reopen,
}

/// Tuning knobs for a [`TokenCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub edit_boundary: EditBoundary,
    /// Stop after this many new tokens per edit; `None` or `0` lexes to the end.
    pub max_tokens_per_edit: Option<usize>,
}

/// How much of the document the cached tokens describe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Coverage {
    /// Lexed to the end of the document.
    #[default]
    Complete,
    /// The backend failed; the rest of the document is unclassified.
    Failed(LexError),
    /// The per-edit token budget ran out.
    Budget,
}

impl Coverage {
    pub fn is_complete(&self) -> bool {
        matches!(self, Coverage::Complete)
    }
}

/// What the most recent edit did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EditStats {
    pub tokens_reused: usize,
    pub tokens_lexed: usize,
    pub full_relex: bool,
}

/// Running totals since the cache was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub edits: usize,
    pub full_relexes: usize,
    pub tokens_lexed: usize,
    pub tokens_reused: usize,
}

/// Ordered token list kept consistent with a document across edits.
///
/// The cache does not own the text. Every call receives the document as it is
/// *after* the edit, and the cache trusts nothing beyond its own record of the
/// previous length.
#[derive(Debug)]
pub struct TokenCache {
    lexer: IncrementalLexer,
    config: CacheConfig,
    tokens: Vec<CachedToken>,
    doc_len: usize,
    lexed_end: usize,
    coverage: Coverage,
    last_edit: EditStats,
    stats: CacheStats,
}

impl TokenCache {
    /// Creates an empty cache for an empty document.
    pub fn new(lexer: IncrementalLexer, mut config: CacheConfig) -> Self {
        config.max_tokens_per_edit = config.max_tokens_per_edit.filter(|&max| max > 0);
        Self {
            lexer,
            config,
            tokens: Vec::new(),
            doc_len: 0,
            lexed_end: 0,
            coverage: Coverage::Complete,
            last_edit: EditStats::default(),
            stats: CacheStats::default(),
        }
    }

    /// Language of the backend.
    pub fn language(&self) -> &str {
        self.lexer.language()
    }

    /// Whether edits can resume from a cached token.
    pub fn supports_resume(&self) -> bool {
        self.lexer.supports_resume()
    }

    /// Settings in effect, with a zero budget normalized to `None`.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// The cached tokens in document order.
    pub fn tokens(&self) -> impl ExactSizeIterator<Item = Token> + '_ {
        self.tokens.iter().map(|cached| cached.token)
    }

    /// The cached tokens with their resume states.
    pub fn cached(&self) -> &[CachedToken] {
        &self.tokens
    }

    /// Number of cached tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Whether no tokens are cached.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// How far the last lex got.
    pub fn coverage(&self) -> &Coverage {
        &self.coverage
    }

    /// End of the region the cached tokens account for: the document length
    /// when coverage is complete, otherwise the end of the last token.
    pub fn lexed_end(&self) -> usize {
        self.lexed_end
    }

    /// Document length as of the last edit.
    pub fn doc_len(&self) -> usize {
        self.doc_len
    }

    /// Trailing region no token describes, if lexing stopped early.
    pub fn unclassified(&self) -> Option<Range<usize>> {
        (self.lexed_end < self.doc_len).then(|| self.lexed_end..self.doc_len)
    }

    /// Counters for the most recent edit.
    pub fn last_edit(&self) -> EditStats {
        self.last_edit
    }

    /// Counters accumulated since creation.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Drops every cached token and lexes `text` from the start.
    pub fn invalidate_all(&mut self, text: &str) -> Range<usize> {
        self.tokens.clear();
        self.doc_len = text.len();
        self.relex(text, 0)
    }

    /// Brings the cache in line with `text` after `edit`.
    ///
    /// Returns the byte range whose tokens may differ from before. A resumable
    /// backend keeps every token that ends before the edit point and continues
    /// from the state of the last one; a non-resumable backend re-lexes the
    /// whole document.
    pub fn apply_edit(&mut self, text: &str, edit: Edit) -> SyntaxResult<Range<usize>> {
        self.check_edit(text, &edit)?;
        self.doc_len = text.len();
        self.stats.edits += 1;

        let keep = if edit.is_noop() {
            if self.coverage.is_complete() {
                self.last_edit = EditStats {
                    tokens_reused: self.tokens.len(),
                    ..EditStats::default()
                };
                return Ok(edit.offset..edit.offset);
            }
            // nothing changed, so every cached token is still good
            if self.lexer.supports_resume() {
                self.tokens.len()
            } else {
                0
            }
        } else if self.lexer.supports_resume() {
            self.retained_prefix(edit.offset)
        } else {
            0
        };

        self.tokens.truncate(keep);
        Ok(self.relex(text, keep))
    }

    fn check_edit(&self, text: &str, edit: &Edit) -> Result<(), EditError> {
        let old_end = edit.offset.saturating_add(edit.removed_len);
        if old_end > self.doc_len {
            return Err(EditError::OutOfBounds {
                offset: edit.offset,
                end: old_end,
                len: self.doc_len,
            });
        }

        let expected = (self.doc_len - edit.removed_len)
            .checked_add(edit.inserted_len)
            .ok_or(EditError::LengthMismatch {
                expected: usize::MAX,
                actual: text.len(),
            })?;
        if text.len() != expected {
            return Err(EditError::LengthMismatch {
                expected,
                actual: text.len(),
            });
        }

        let new_end = edit
            .offset
            .checked_add(edit.inserted_len)
            .ok_or(EditError::OutOfBounds {
                offset: edit.offset,
                end: usize::MAX,
                len: text.len(),
            })?;
        for offset in [edit.offset, new_end] {
            if !text.is_char_boundary(offset) {
                return Err(EditError::NotCharBoundary(offset));
            }
        }
        Ok(())
    }

    /// Number of leading tokens an edit at `offset` cannot have affected.
    fn retained_prefix(&self, offset: usize) -> usize {
        match self.config.edit_boundary {
            EditBoundary::Retain => self.tokens.partition_point(|c| c.token.end() <= offset),
            EditBoundary::Reopen => self.tokens.partition_point(|c| c.token.end() < offset),
        }
    }

    /// Lexes from the end of the retained prefix and appends the results.
    fn relex(&mut self, text: &str, reused: usize) -> Range<usize> {
        let resume = self.tokens.last().and_then(|cached| {
            cached.resume_state.clone().map(|state| ResumePoint {
                offset: cached.token.end(),
                state,
            })
        });
        let start = resume.as_ref().map_or(0, |point| point.offset);
        let budget = self.config.max_tokens_per_edit;

        let mut lexed = 0;
        let mut coverage = Coverage::Complete;
        for item in self.lexer.tokenize_from(text, resume) {
            match item {
                Ok(cached) => {
                    if budget.is_some_and(|max| lexed >= max) {
                        coverage = Coverage::Budget;
                        break;
                    }
                    self.tokens.push(cached);
                    lexed += 1;
                }
                Err(error) => {
                    coverage = Coverage::Failed(error);
                    break;
                }
            }
        }

        let end = self.tokens.last().map_or(0, |cached| cached.token.end());
        self.lexed_end = if coverage.is_complete() { text.len() } else { end };

        match &coverage {
            Coverage::Failed(error) => warn!(
                language = self.lexer.language(),
                lexed_end = self.lexed_end,
                %error,
                "Tokenization stopped early"
            ),
            Coverage::Budget => debug!(
                language = self.lexer.language(),
                lexed_end = self.lexed_end,
                "Token budget exhausted"
            ),
            Coverage::Complete => {}
        }
        self.coverage = coverage;

        self.last_edit = EditStats {
            tokens_reused: reused,
            tokens_lexed: lexed,
            full_relex: reused == 0,
        };
        self.stats.tokens_lexed += lexed;
        self.stats.tokens_reused += reused;
        if reused == 0 {
            self.stats.full_relexes += 1;
        }
        debug!(
            language = self.lexer.language(),
            from = start,
            reused,
            lexed,
            "Re-tokenized"
        );

        start..end.max(start)
    }
}
