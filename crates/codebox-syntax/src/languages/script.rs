//! Table-driven resumable lexer shared by the scripting languages.
//!
//! A language is described by a [`ScriptRules`] table. The lexer skips
//! whitespace between tokens, and strings or comments that span lines are
//! emitted as one token per line segment (each segment includes its `'\n'`),
//! so every token end is a point the lexer can resume from.
//!
//! Lexing decisions look at most one byte past the end of the token being
//! produced, and the state after a token is just the mode plus whether the
//! token finished a line. Lexing a suffix from a saved state therefore yields
//! the same tokens as lexing the whole document.

use crate::backend::{LexerBackend, RawToken, RawTokens};
use crate::state::ResumeState;
use crate::token::TokenCategory;
use crate::LexError;

/// Lexical description of one language.
#[derive(Debug)]
pub struct ScriptRules {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    /// Literal words highlighted as keywords (`True`, `nil`, ...).
    pub constants: &'static [&'static str],
    /// Every prefix of an operator must itself be an operator.
    pub operators: &'static [&'static str],
    /// `#` starts a comment running to the end of the line.
    pub hash_comments: bool,
    /// Prefix at the start of a line that opens a block comment, and the one
    /// that closes it.
    pub block_comment: Option<(&'static str, &'static str)>,
    pub quotes: &'static [u8],
    /// Quotes whose strings may continue onto the next line.
    pub multiline_quotes: &'static [u8],
    /// `"""` and `'''` open strings that may span lines.
    pub triple_quotes: bool,
    /// Words that turn a directly following quote into a prefixed string.
    pub string_prefixes: &'static [&'static str],
    /// Bytes that may end an identifier (`empty?`, `save!`).
    pub word_suffixes: &'static [u8],
    /// `@ivar`, `@@cvar` and `$global` names.
    pub sigils: bool,
    /// `:symbol` literals.
    pub symbols: bool,
}

/// What the lexer is in the middle of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Code,
    Quoted {
        quote: u8,
        triple: bool,
    },
    BlockComment,
}

/// Resume state of a [`ScriptLexer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptState {
    pub mode: Mode,
    /// The previous token ended a line.
    pub line_start: bool,
}

impl Default for ScriptState {
    fn default() -> Self {
        Self {
            mode: Mode::Code,
            line_start: true,
        }
    }
}

/// A resumable backend driven by a [`ScriptRules`] table.
#[derive(Debug, Clone, Copy)]
pub struct ScriptLexer {
    rules: &'static ScriptRules,
}

impl ScriptLexer {
    pub const fn new(rules: &'static ScriptRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &'static ScriptRules {
        self.rules
    }
}

impl LexerBackend for ScriptLexer {
    fn language(&self) -> &str {
        self.rules.name
    }

    fn supports_resume(&self) -> bool {
        true
    }

    fn tokenize<'a>(&'a mut self, source: &'a str, state: Option<ResumeState>) -> RawTokens<'a> {
        let state = match state {
            None => ScriptState::default(),
            Some(handle) => match handle.downcast_ref::<ScriptState>() {
                Some(state) => *state,
                None => return Box::new(std::iter::once(Err(LexError::ForeignState(0)))),
            },
        };

        Box::new(ScriptTokens {
            rules: self.rules,
            source,
            bytes: source.as_bytes(),
            pos: 0,
            state,
            last: None,
            done: false,
        })
    }
}

#[inline]
fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

#[inline]
fn is_ident(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

struct ScriptTokens<'a> {
    rules: &'static ScriptRules,
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    state: ScriptState,
    /// Last handed-out state, reused while the state does not change.
    last: Option<(ScriptState, ResumeState)>,
    done: bool,
}

impl Iterator for ScriptTokens<'_> {
    type Item = Result<RawToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.state.mode == Mode::Code {
            self.skip_whitespace();
        }
        if self.pos >= self.bytes.len() {
            self.done = true;
            return Some(Ok(RawToken::new(TokenCategory::EndOfStream, self.pos, 0)));
        }

        let start = self.pos;
        let (category, end) = match self.state.mode {
            Mode::Code => self.lex_code(start),
            Mode::Quoted { quote, triple } => self.lex_quoted(start, quote, triple),
            Mode::BlockComment => self.lex_block_comment(start),
        };

        self.pos = end;
        self.state.line_start = self.bytes[end - 1] == b'\n';
        let state = self.snapshot();
        Some(Ok(RawToken::new(category, start, end - start).with_state(state)))
    }
}

impl ScriptTokens<'_> {
    fn snapshot(&mut self) -> ResumeState {
        match &self.last {
            Some((state, handle)) if *state == self.state => handle.clone(),
            _ => {
                let handle = ResumeState::new(self.state);
                self.last = Some((self.state, handle.clone()));
                handle
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn at_line_start(&self, pos: usize) -> bool {
        match pos {
            0 => self.state.line_start,
            _ => self.bytes[pos - 1] == b'\n',
        }
    }

    /// Index just past the next `'\n'` at or after `from`, or the end.
    fn line_end(&self, from: usize) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| b == b'\n')
            .map_or(self.bytes.len(), |i| from + i + 1)
    }

    fn scan_while(&self, from: usize, pred: impl Fn(u8) -> bool) -> usize {
        self.bytes[from..]
            .iter()
            .position(|&b| !pred(b))
            .map_or(self.bytes.len(), |i| from + i)
    }

    fn lex_code(&mut self, start: usize) -> (TokenCategory, usize) {
        let rules = self.rules;
        let b = self.bytes[start];
        let next = self.bytes.get(start + 1).copied();

        if let Some((open, _)) = rules.block_comment {
            if b == open.as_bytes()[0]
                && self.at_line_start(start)
                && next.is_some_and(|n| n.is_ascii_alphabetic())
            {
                let end = self.scan_while(start + 1, |c| c.is_ascii_alphabetic());
                if &self.source[start..end] == open {
                    self.state.mode = Mode::BlockComment;
                    return (TokenCategory::Comment, self.line_end(end));
                }
                return (TokenCategory::Error, end);
            }
        }

        if rules.hash_comments && b == b'#' {
            let end = self.line_end(start);
            let end = if self.bytes[end - 1] == b'\n' { end - 1 } else { end };
            return (TokenCategory::LineComment, end);
        }

        if is_ident_start(b) {
            let mut end = self.scan_while(start, is_ident);
            if self
                .bytes
                .get(end)
                .is_some_and(|c| rules.word_suffixes.contains(c))
            {
                end += 1;
            }
            let word = &self.source[start..end];

            if self.bytes.get(end).is_some_and(|c| rules.quotes.contains(c))
                && rules
                    .string_prefixes
                    .iter()
                    .any(|prefix| prefix.eq_ignore_ascii_case(word))
            {
                return self.lex_string(end);
            }

            let category = if rules.keywords.contains(&word) || rules.constants.contains(&word) {
                TokenCategory::Keyword
            } else {
                TokenCategory::Identifier
            };
            return (category, end);
        }

        if b.is_ascii_digit() {
            return (TokenCategory::NumericLiteral, self.scan_number(start));
        }

        if rules.quotes.contains(&b) {
            return self.lex_string(start);
        }

        if rules.sigils && (b == b'@' || b == b'$') {
            return self.lex_sigil(start);
        }

        if rules.symbols && b == b':' && next.is_some_and(is_ident_start) {
            let mut end = self.scan_while(start + 1, is_ident);
            if self
                .bytes
                .get(end)
                .is_some_and(|c| rules.word_suffixes.contains(c))
            {
                end += 1;
            }
            return (TokenCategory::StringLiteral, end);
        }

        if let Some(end) = self.scan_operator(start) {
            return (TokenCategory::Operator, end);
        }

        // identifiers absorb non-ASCII bytes, so `b` is a single-byte char
        (TokenCategory::Error, start + 1)
    }

    /// A string whose opening quote is at `quote`.
    fn lex_string(&mut self, quote: usize) -> (TokenCategory, usize) {
        let bytes = self.bytes;
        let q = bytes[quote];

        if self.rules.triple_quotes && bytes.get(quote + 1) == Some(&q) {
            if bytes.get(quote + 2) == Some(&q) {
                let (_, end) = self.lex_quoted(quote + 3, q, true);
                return (TokenCategory::StringLiteral, end);
            }
            return (TokenCategory::StringLiteral, quote + 2);
        }

        if self.rules.multiline_quotes.contains(&q) {
            let (_, end) = self.lex_quoted(quote + 1, q, false);
            return (TokenCategory::StringLiteral, end);
        }

        // a single-line string never continues past a line break, escaped or not
        let mut i = quote + 1;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if bytes.get(i + 1) == Some(&b'\n') => return (TokenCategory::Error, i + 1),
                b'\\' => i += 2,
                b'\n' => return (TokenCategory::Error, i),
                c if c == q => return (TokenCategory::StringLiteral, i + 1),
                _ => i += 1,
            }
        }
        // unterminated at end of text
        (TokenCategory::Error, bytes.len())
    }

    /// Body of a string that may span lines, up to its closing quote or the
    /// end of the current line.
    fn lex_quoted(&mut self, from: usize, quote: u8, triple: bool) -> (TokenCategory, usize) {
        let bytes = self.bytes;
        let mut i = from;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if bytes.get(i + 1) != Some(&b'\n') => i += 2,
                b'\n' => {
                    self.state.mode = Mode::Quoted { quote, triple };
                    return (TokenCategory::StringLiteral, i + 1);
                }
                c if c == quote => {
                    if !triple {
                        self.state.mode = Mode::Code;
                        return (TokenCategory::StringLiteral, i + 1);
                    }
                    if bytes.get(i + 1) == Some(&quote) && bytes.get(i + 2) == Some(&quote) {
                        self.state.mode = Mode::Code;
                        return (TokenCategory::StringLiteral, i + 3);
                    }
                    i += 1;
                }
                _ => i += 1,
            }
        }
        self.state.mode = Mode::Quoted { quote, triple };
        (TokenCategory::StringLiteral, bytes.len())
    }

    /// One line of a block comment.
    fn lex_block_comment(&mut self, start: usize) -> (TokenCategory, usize) {
        let end = self.line_end(start);
        if let Some((_, close)) = self.rules.block_comment {
            let line = &self.bytes[start..end];
            if line.starts_with(close.as_bytes())
                && line
                    .get(close.len())
                    .is_none_or(|c| c.is_ascii_whitespace())
            {
                self.state.mode = Mode::Code;
            }
        }
        (TokenCategory::Comment, end)
    }

    fn scan_number(&self, start: usize) -> usize {
        let bytes = self.bytes;
        let hex = bytes[start] == b'0' && matches!(bytes.get(start + 1), Some(b'x' | b'X'));
        let mut seen_dot = false;
        let mut i = start + 1;
        while i < bytes.len() {
            match bytes[i] {
                c if c.is_ascii_alphanumeric() || c == b'_' => i += 1,
                b'.' if !seen_dot && !hex => {
                    seen_dot = true;
                    i += 1;
                }
                b'+' | b'-' if !hex && matches!(bytes[i - 1], b'e' | b'E') => i += 1,
                _ => break,
            }
        }
        i
    }

    /// Greedy operator match. Prefix-closed tables make this maximal munch
    /// with one byte of lookahead.
    fn scan_operator(&self, start: usize) -> Option<usize> {
        let operators = self.rules.operators;
        let is_operator = |end: usize| {
            operators
                .iter()
                .any(|op| op.as_bytes() == &self.bytes[start..end])
        };

        if !is_operator(start + 1) {
            return None;
        }
        let mut end = start + 1;
        while end < self.bytes.len() && is_operator(end + 1) {
            end += 1;
        }
        Some(end)
    }

    fn lex_sigil(&self, start: usize) -> (TokenCategory, usize) {
        let bytes = self.bytes;
        let mut name = start + 1;
        if bytes[start] == b'@' {
            if bytes.get(name) == Some(&b'@') {
                name += 1;
            }
            if bytes.get(name).copied().is_some_and(is_ident_start) {
                return (TokenCategory::Identifier, self.scan_while(name, is_ident));
            }
            return (TokenCategory::Error, name);
        }

        match bytes.get(name).copied() {
            Some(c) if is_ident(c) => (TokenCategory::Identifier, self.scan_while(name, is_ident)),
            // special globals such as `$!` and `$:`
            Some(c) if c.is_ascii_punctuation() => (TokenCategory::Identifier, name + 1),
            _ => (TokenCategory::Error, name),
        }
    }
}
