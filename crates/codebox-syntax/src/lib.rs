//! # CodeBox Syntax
//!
//! Incremental tokenization for a code-editing widget.
//!
//! ## Pipeline
//!
//! ```text
//!  edit ──▶ TokenCache ──resume point──▶ IncrementalLexer ──▶ LexerBackend
//!              ▲                                │
//!              └──────── (Token, state) ◀───────┘
//! ```
//!
//! - [`LexerBackend`] is the pluggable tokenizer, one per language. Backends that
//!   can snapshot their internals after every token report `supports_resume()`.
//! - [`IncrementalLexer`] normalizes a backend: it slices the suffix to lex,
//!   rebases offsets, validates the output and stops at `EndOfStream`.
//! - [`TokenCache`] keeps the token list consistent with the text. On an edit it
//!   keeps the tokens the edit cannot have touched, resumes lexing from the last
//!   of them and re-lexes the rest of the document.
//! - [`StyleMap`] maps token categories to colours for the render path.
//!
//! ## Example
//!
//! ```rust
//! use codebox_buffer::Edit;
//! use codebox_syntax::{CacheConfig, IncrementalLexer, LanguageRegistry, TokenCache};
//!
//! let registry = LanguageRegistry::new();
//! let lexer = IncrementalLexer::new(registry.create("python").unwrap());
//! let mut cache = TokenCache::new(lexer, CacheConfig::default());
//!
//! let mut text = String::from("x = 1");
//! cache.invalidate_all(&text);
//!
//! // replace "1" with "10"
//! text.replace_range(4..5, "10");
//! let changed = cache.apply_edit(&text, Edit::new(4, 1, 2)).unwrap();
//! assert_eq!(changed, 3..6);
//! ```

mod backend;
mod cache;
mod lexer;
mod state;
mod style;
mod token;

#[cfg(test)]
mod testing;

pub mod languages;

pub use backend::{LexerBackend, RawToken, RawTokens};
pub use cache::{CacheConfig, CacheStats, Coverage, EditBoundary, EditStats, TokenCache};
pub use languages::{detect_language, LanguageRegistry};
pub use lexer::{IncrementalLexer, ResumePoint, TokenStream};
pub use state::ResumeState;
pub use style::{Color, ColorError, StyleMap};
pub use token::{CachedToken, Token, TokenCategory};

/// Result type for syntax operations
pub type SyntaxResult<T> = Result<T, SyntaxError>;

/// Errors surfaced to the caller of the syntax layer.
#[derive(Debug, thiserror::Error)]
pub enum SyntaxError {
    /// No backend is registered for the language; colorization is skipped.
    #[error("No lexer registered for language `{0}`")]
    BackendUnavailable(String),

    /// The edit descriptor contradicts the cached document; a caller bug.
    #[error("Invalid edit: {0}")]
    InvalidEdit(#[from] EditError),

    #[error("Failed to load grammar for {language}: {message}")]
    Grammar { language: String, message: String },
}

/// Ways an edit descriptor can disagree with the document the cache knows.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("range {offset}..{end} exceeds the previous document length {len}")]
    OutOfBounds { offset: usize, end: usize, len: usize },

    #[error("expected a new document length of {expected} bytes, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("offset {0} is not on a character boundary")]
    NotCharBoundary(usize),
}

/// A failure partway through a token stream.
///
/// The cache keeps what was produced before the failure and reports the rest
/// of the document as unclassified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("lexer failed at offset {offset}: {message}")]
    Backend { offset: usize, message: String },

    #[error("backend `{0}` cannot resume from a saved state")]
    ResumeUnsupported(String),

    #[error("resume state at offset {0} was not produced by this backend")]
    ForeignState(usize),

    #[error("resumable backend produced a token without a state at offset {0}")]
    MissingState(usize),

    #[error("malformed token {start}..{end}: {reason}")]
    MalformedToken {
        start: usize,
        end: usize,
        reason: &'static str,
    },
}

impl LexError {
    /// Shifts offsets reported relative to a lexed suffix into document offsets.
    pub(crate) fn rebase(self, base: usize) -> Self {
        match self {
            LexError::Backend { offset, message } => LexError::Backend {
                offset: offset + base,
                message,
            },
            LexError::ForeignState(offset) => LexError::ForeignState(offset + base),
            LexError::MissingState(offset) => LexError::MissingState(offset + base),
            LexError::MalformedToken { start, end, reason } => LexError::MalformedToken {
                start: start + base,
                end: end + base,
                reason,
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rebase_shifts_offsets() {
        let err = LexError::Backend {
            offset: 3,
            message: "bad byte".into(),
        };
        assert_eq!(
            err.rebase(10),
            LexError::Backend {
                offset: 13,
                message: "bad byte".into()
            }
        );
        assert_eq!(
            LexError::ResumeUnsupported("json".into()).rebase(4),
            LexError::ResumeUnsupported("json".into())
        );
    }

    #[test]
    fn test_error_messages() {
        let err = SyntaxError::from(EditError::OutOfBounds {
            offset: 4,
            end: 9,
            len: 6,
        });
        assert_eq!(
            err.to_string(),
            "Invalid edit: range 4..9 exceeds the previous document length 6"
        );
    }
}
