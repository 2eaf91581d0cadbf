//! Adapter that turns any [`LexerBackend`] into a document-level token source.

use crate::backend::{LexerBackend, RawToken, RawTokens};
use crate::state::ResumeState;
use crate::token::{CachedToken, Token, TokenCategory};
use crate::LexError;

/// Where to continue lexing: the end of the last trusted token and the state
/// the backend captured there.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub offset: usize,
    pub state: ResumeState,
}

/// Normalizes a backend to the `(supports_resume, tokenize_from)` contract.
///
/// The adapter never touches the cache; it only shapes the backend's output
/// into document-relative [`CachedToken`]s.
pub struct IncrementalLexer {
    backend: Box<dyn LexerBackend>,
}

impl IncrementalLexer {
    pub fn new(backend: Box<dyn LexerBackend>) -> Self {
        Self { backend }
    }

    /// Language of the wrapped backend.
    pub fn language(&self) -> &str {
        self.backend.language()
    }

    /// Whether the backend can continue from a saved state.
    pub fn supports_resume(&self) -> bool {
        self.backend.supports_resume()
    }

    /// Starts a fresh token stream over `text`.
    ///
    /// With a resume point, only `text[offset..]` is handed to the backend and
    /// the produced offsets are shifted back into document coordinates. A
    /// non-resumable backend is always lexed from the start of the document.
    pub fn tokenize_from<'a>(
        &'a mut self,
        text: &'a str,
        resume: Option<ResumePoint>,
    ) -> TokenStream<'a> {
        let resumable = self.backend.supports_resume();

        let (base, state) = match resume {
            None => (0, None),
            Some(_) if !resumable => {
                let language = self.backend.language().to_string();
                return TokenStream::failed(LexError::ResumeUnsupported(language));
            }
            Some(point) if !text.is_char_boundary(point.offset) => {
                return TokenStream::failed(LexError::MalformedToken {
                    start: point.offset,
                    end: point.offset,
                    reason: "resume point is outside the text",
                });
            }
            Some(point) => (point.offset, Some(point.state)),
        };

        let inner = self.backend.tokenize(&text[base..], state);
        TokenStream {
            inner: Some(inner),
            pending: None,
            base,
            limit: text.len(),
            cursor: base,
            resumable,
        }
    }
}

impl std::fmt::Debug for IncrementalLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalLexer")
            .field("language", &self.language())
            .field("supports_resume", &self.supports_resume())
            .finish()
    }
}

/// Lazy sequence of validated tokens in document coordinates.
///
/// Ends (exclusive) at the backend's `EndOfStream` token or when the backend
/// is exhausted, and fuses after yielding an error.
pub struct TokenStream<'a> {
    inner: Option<RawTokens<'a>>,
    pending: Option<LexError>,
    base: usize,
    limit: usize,
    cursor: usize,
    resumable: bool,
}

impl TokenStream<'_> {
    fn failed(error: LexError) -> Self {
        Self {
            inner: None,
            pending: Some(error),
            base: 0,
            limit: 0,
            cursor: 0,
            resumable: false,
        }
    }

    /// Offset at which the stream will accept its next token.
    pub fn position(&self) -> usize {
        self.cursor
    }

    fn accept(&mut self, raw: RawToken) -> Result<Option<CachedToken>, LexError> {
        let start = self.base + raw.start;
        let end = start.checked_add(raw.len).ok_or(LexError::MalformedToken {
            start,
            end: usize::MAX,
            reason: "length overflows",
        })?;
        let malformed = |reason| LexError::MalformedToken { start, end, reason };

        if raw.category == TokenCategory::EndOfStream {
            return Ok(None);
        }
        if raw.len == 0 {
            return Err(malformed("empty token"));
        }
        if start < self.cursor {
            return Err(malformed("overlaps the previous token"));
        }
        if end > self.limit {
            return Err(malformed("extends past the end of the text"));
        }

        let resume_state = match (self.resumable, raw.state) {
            (true, Some(state)) => Some(state),
            (true, None) => return Err(LexError::MissingState(start)),
            (false, _) => None,
        };

        self.cursor = end;
        Ok(Some(CachedToken {
            token: Token::new(raw.category, start, raw.len),
            resume_state,
        }))
    }
}

impl Iterator for TokenStream<'_> {
    type Item = Result<CachedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(error) = self.pending.take() {
            return Some(Err(error));
        }

        let item = self.inner.as_mut()?.next();
        let outcome = match item {
            None => None,
            Some(Err(error)) => Some(Err(error.rebase(self.base))),
            Some(Ok(raw)) => self.accept(raw).transpose(),
        };

        if !matches!(outcome, Some(Ok(_))) {
            self.inner = None;
        }
        outcome
    }
}
