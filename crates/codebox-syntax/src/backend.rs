//! The pluggable tokenizer contract.

use crate::state::ResumeState;
use crate::token::TokenCategory;
use crate::LexError;

/// A token as produced by a backend, relative to the source it was given.
#[derive(Debug, Clone)]
pub struct RawToken {
    pub category: TokenCategory,
    pub start: usize,
    pub len: usize,
    /// State right after this token; required when the backend is resumable.
    pub state: Option<ResumeState>,
}

impl RawToken {
    pub fn new(category: TokenCategory, start: usize, len: usize) -> Self {
        Self {
            category,
            start,
            len,
            state: None,
        }
    }

    /// Attaches the state lexing can resume from after this token.
    pub fn with_state(mut self, state: ResumeState) -> Self {
        self.state = Some(state);
        self
    }
}

/// Lazy, finite stream of backend tokens.
pub type RawTokens<'a> = Box<dyn Iterator<Item = Result<RawToken, LexError>> + 'a>;

/// A tokenizer for one language.
///
/// Implementations yield tokens in source order and finish either with an
/// [`TokenCategory::EndOfStream`] token or by exhausting the iterator. Each call
/// to [`tokenize`](LexerBackend::tokenize) starts a fresh stream.
pub trait LexerBackend: Send {
    /// Name of the language this backend tokenizes.
    fn language(&self) -> &str;

    /// Whether every token carries a state from which lexing can continue.
    fn supports_resume(&self) -> bool;

    /// Tokenizes `source`, optionally continuing from a state this backend
    /// produced earlier. Offsets are relative to `source`.
    fn tokenize<'a>(&'a mut self, source: &'a str, state: Option<ResumeState>) -> RawTokens<'a>;
}
