//! Test backend: a tiny word lexer with call recording and failure injection.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{LexerBackend, RawToken, RawTokens};
use crate::state::ResumeState;
use crate::token::TokenCategory;
use crate::LexError;

/// State after a token: how many tokens the document has up to and including it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordState {
    pub index: usize,
}

/// One call to `tokenize`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub source: String,
    pub resumed_at: Option<usize>,
}

#[derive(Clone)]
pub struct WordLexer {
    resumable: bool,
    keywords: &'static [&'static str],
    pub calls: Arc<Mutex<Vec<Invocation>>>,
    /// Document token index at which to fail; `usize::MAX` disables.
    pub fail_at: Arc<AtomicUsize>,
}

impl WordLexer {
    pub fn new(resumable: bool) -> Self {
        Self {
            resumable,
            keywords: &["let"],
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_at: Arc::new(AtomicUsize::new(usize::MAX)),
        }
    }

    pub fn failing_at(self, index: usize) -> Self {
        self.fail_at.store(index, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }
}

impl LexerBackend for WordLexer {
    fn language(&self) -> &str {
        "words"
    }

    fn supports_resume(&self) -> bool {
        self.resumable
    }

    fn tokenize<'a>(&'a mut self, source: &'a str, state: Option<ResumeState>) -> RawTokens<'a> {
        let start_index = match &state {
            Some(state) => match state.downcast_ref::<WordState>() {
                Some(word) => word.index,
                None => return Box::new(std::iter::once(Err(LexError::ForeignState(0)))),
            },
            None => 0,
        };
        self.calls.lock().unwrap().push(Invocation {
            source: source.to_string(),
            resumed_at: state.as_ref().map(|_| start_index),
        });

        let bytes = source.as_bytes();
        let fail_at = self.fail_at.load(Ordering::SeqCst);
        let keywords = self.keywords;
        let resumable = self.resumable;
        let mut pos = 0;
        let mut index = start_index;
        let mut done = false;

        Box::new(std::iter::from_fn(move || {
            if done {
                return None;
            }
            while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
            if pos >= bytes.len() {
                done = true;
                return Some(Ok(RawToken::new(TokenCategory::EndOfStream, pos, 0)));
            }
            if index == fail_at {
                done = true;
                return Some(Err(LexError::Backend {
                    offset: pos,
                    message: "injected failure".into(),
                }));
            }

            let start = pos;
            let category = if bytes[pos].is_ascii_alphabetic() || bytes[pos] == b'_' {
                while pos < bytes.len() && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_') {
                    pos += 1;
                }
                if keywords.contains(&&source[start..pos]) {
                    TokenCategory::Keyword
                } else {
                    TokenCategory::Identifier
                }
            } else if bytes[pos].is_ascii_digit() {
                while pos < bytes.len() && bytes[pos].is_ascii_digit() {
                    pos += 1;
                }
                TokenCategory::NumericLiteral
            } else {
                pos += source[pos..].chars().next().map_or(1, char::len_utf8);
                TokenCategory::Operator
            };

            index += 1;
            let token = RawToken::new(category, start, pos - start);
            Some(Ok(if resumable {
                token.with_state(ResumeState::new(WordState { index }))
            } else {
                token
            }))
        }))
    }
}
