//! The code box widget model.
//!
//! `CodeBox` composes a [`TextBuffer`], an optional [`TokenCache`] and the
//! [`StyleMap`] derived from its [`Config`]. Rendering is left to the host:
//! [`CodeBox::styled_spans`] hands out coloured byte ranges covering the whole
//! document.

use std::borrow::Cow;
use std::ops::Range;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use codebox_buffer::{Edit, TextBuffer, TextChange};
use codebox_syntax::{
    Color, Coverage, IncrementalLexer, LanguageRegistry, StyleMap, Token, TokenCache,
    TokenCategory,
};

use crate::config::Config;
use crate::event::{CodeBoxEvent, EventQueue};
use crate::CoreResult;

/// A coloured byte range of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StyledSpan {
    pub start: usize,
    pub end: usize,
    /// `None` for whitespace gaps, unclassified text and plain-text mode
    pub category: Option<TokenCategory>,
    pub color: Color,
}

impl StyledSpan {
    fn plain(start: usize, end: usize, color: Color) -> Self {
        Self {
            start,
            end,
            category: None,
            color,
        }
    }

    /// Byte range of the span.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The span's slice of `source`, which must be the text it was built from.
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.range()]
    }
}

/// Editable, syntax-coloured text.
///
/// Every mutation goes to the buffer first and the resulting [`Edit`] is then
/// forwarded to the token cache, so tokens always describe the current text.
/// Without a backend for the language the widget shows plain text.
#[derive(Debug)]
pub struct CodeBox {
    buffer: TextBuffer,
    registry: LanguageRegistry,
    language: Option<String>,
    cache: Option<TokenCache>,
    styles: StyleMap,
    config: Config,
    events: EventQueue,
}

impl CodeBox {
    /// Creates an empty widget with the built-in languages.
    pub fn new(config: Config) -> Self {
        Self::with_registry(config, LanguageRegistry::new())
    }

    /// Creates an empty widget that takes its backends from `registry`.
    pub fn with_registry(config: Config, registry: LanguageRegistry) -> Self {
        let language = config.highlighting.language.clone();
        let mut codebox = Self::from_parts(TextBuffer::new(), config, registry);
        if let Some(language) = language {
            codebox.set_language(&language);
        }
        codebox
    }

    /// Opens a file, taking the language from the config or the file name.
    pub fn open(path: impl AsRef<Path>, config: Config) -> CoreResult<Self> {
        let path = path.as_ref();
        let buffer = TextBuffer::from_file(path)?;
        let language = config
            .highlighting
            .language
            .clone()
            .or_else(|| config.language_for(path));

        info!(path = %path.display(), ?language, "Opened file");
        let mut codebox = Self::from_parts(buffer, config, LanguageRegistry::new());
        if let Some(language) = language {
            codebox.set_language(&language);
        }
        Ok(codebox)
    }

    fn from_parts(buffer: TextBuffer, config: Config, registry: LanguageRegistry) -> Self {
        Self {
            buffer,
            registry,
            language: None,
            cache: None,
            styles: config.style_map(),
            config,
            events: EventQueue::new(),
        }
    }

    // ==================== Accessors ====================

    /// The current text.
    pub fn text(&self) -> Cow<'_, str> {
        self.buffer.text()
    }

    /// Length of the text in bytes.
    pub fn len(&self) -> usize {
        self.buffer.len_bytes()
    }

    /// Whether the text is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The underlying text buffer.
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    /// The configuration in effect.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Colours used for each token category.
    pub fn style_map(&self) -> &StyleMap {
        &self.styles
    }

    /// The token cache, when highlighting is active.
    pub fn cache(&self) -> Option<&TokenCache> {
        self.cache.as_ref()
    }

    /// The selected language, even when no backend could be created for it.
    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// Whether a token cache is active.
    pub fn is_highlighting(&self) -> bool {
        self.cache.is_some()
    }

    // ==================== Editing ====================

    /// Replaces the whole text.
    pub fn set_text(&mut self, text: &str) -> CoreResult<Range<usize>> {
        let edit = self.buffer.set_text(text)?;
        self.retokenize(edit)
    }

    /// Inserts `text` at byte `offset`.
    ///
    /// Returns the byte range whose tokens were rebuilt.
    pub fn insert(&mut self, offset: usize, text: &str) -> CoreResult<Range<usize>> {
        let edit = self.buffer.insert(offset, text)?;
        self.retokenize(edit)
    }

    /// Removes the bytes in `range`.
    pub fn delete(&mut self, range: Range<usize>) -> CoreResult<Range<usize>> {
        let edit = self.buffer.delete(range)?;
        self.retokenize(edit)
    }

    /// Replaces the bytes in `range` with `text`.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> CoreResult<Range<usize>> {
        let edit = self.buffer.replace(range, text)?;
        self.retokenize(edit)
    }

    /// Applies one replacement request.
    pub fn apply_change(&mut self, change: &TextChange) -> CoreResult<Range<usize>> {
        let edit = self.buffer.apply(change)?;
        self.retokenize(edit)
    }

    /// Applies changes in order, each against the text left by the previous.
    ///
    /// Returns a range covering everything rebuilt. On error the changes
    /// before the failing one stay applied.
    pub fn apply_changes(&mut self, changes: &[TextChange]) -> CoreResult<Range<usize>> {
        let mut dirty: Option<Range<usize>> = None;
        for change in changes {
            let range = self.apply_change(change)?;
            dirty = Some(match dirty {
                Some(prev) => prev.start.min(range.start)..prev.end.max(range.end),
                None => range,
            });
        }

        let len = self.len();
        Ok(dirty.map_or(len..len, |range| range.start.min(len)..range.end.min(len)))
    }

    /// Resumes lexing after a failure or an exhausted token budget.
    pub fn retry(&mut self) -> CoreResult<Range<usize>> {
        let len = self.len();
        let partial = self
            .cache
            .as_ref()
            .is_some_and(|cache| !cache.coverage().is_complete());

        if partial {
            self.retokenize(Edit::insert(len, 0))
        } else {
            Ok(len..len)
        }
    }

    fn retokenize(&mut self, edit: Edit) -> CoreResult<Range<usize>> {
        let Some(cache) = self.cache.as_mut() else {
            return Ok(edit.offset..edit.offset);
        };

        let text = self.buffer.text();
        match cache.apply_edit(&text, edit) {
            Ok(range) => {
                report(cache, range.clone(), &self.events);
                Ok(range)
            }
            Err(error) => {
                warn!(%error, "Edit rejected by the token cache, re-tokenizing");
                let range = cache.invalidate_all(&text);
                report(cache, range, &self.events);
                Err(error.into())
            }
        }
    }

    // ==================== Language & Style ====================

    /// Selects the language by name or alias.
    ///
    /// Returns whether highlighting is active. An unknown language leaves
    /// the text unstyled and queues [`CodeBoxEvent::BackendUnavailable`].
    pub fn set_language(&mut self, name: &str) -> bool {
        let language = self.registry.resolve(name).unwrap_or(name).to_string();
        debug!(%language, "Language selected");

        self.language = Some(language);
        self.events
            .emit(CodeBoxEvent::LanguageChanged(self.language.clone()));
        self.rebuild_cache();
        self.is_highlighting()
    }

    /// Switches to plain text.
    pub fn clear_language(&mut self) {
        self.language = None;
        self.cache = None;
        self.events.emit(CodeBoxEvent::LanguageChanged(None));
    }

    /// Replaces the configuration wholesale.
    ///
    /// Colours are re-derived when the appearance changed; the cache is
    /// rebuilt from scratch when highlighting settings changed.
    pub fn set_config(&mut self, config: Config) {
        let old = std::mem::replace(&mut self.config, config);

        if old.appearance != self.config.appearance {
            self.styles = self.config.style_map();
            self.events.emit(CodeBoxEvent::StyleChanged);
        }

        if old.highlighting != self.config.highlighting {
            match self.config.highlighting.language.clone() {
                Some(language) if old.highlighting.language.as_ref() != Some(&language) => {
                    self.set_language(&language);
                }
                _ => self.rebuild_cache(),
            }
        }
    }

    fn rebuild_cache(&mut self) {
        self.cache = None;
        let Some(language) = self.language.as_deref() else {
            return;
        };
        if !self.config.highlighting.enabled {
            debug!(language, "Highlighting disabled by config");
            return;
        }

        match self.registry.create(language) {
            Ok(backend) => {
                let mut cache =
                    TokenCache::new(IncrementalLexer::new(backend), self.config.cache_config());
                let range = cache.invalidate_all(&self.buffer.text());
                report(&cache, range, &self.events);
                self.cache = Some(cache);
            }
            Err(error) => {
                warn!(language, %error, "Showing plain text");
                self.events
                    .emit(CodeBoxEvent::BackendUnavailable(language.to_string()));
            }
        }
    }

    // ==================== Rendering ====================

    /// The cached tokens; empty in plain-text mode.
    pub fn tokens(&self) -> impl Iterator<Item = Token> + '_ {
        self.cache.iter().flat_map(|cache| cache.tokens())
    }

    /// Ordered spans covering the whole document.
    ///
    /// Gaps between tokens, the unclassified tail and categories without a
    /// colour use the default foreground.
    pub fn styled_spans(&self) -> Vec<StyledSpan> {
        let len = self.len();
        let foreground = self.config.appearance.foreground;
        let mut spans = Vec::new();
        let mut cursor = 0;

        for token in self.tokens() {
            if token.start > cursor {
                spans.push(StyledSpan::plain(cursor, token.start, foreground));
            }
            spans.push(StyledSpan {
                start: token.start,
                end: token.end(),
                category: Some(token.category),
                color: self.styles.color_or(token.category, foreground),
            });
            cursor = token.end();
        }
        if cursor < len {
            spans.push(StyledSpan::plain(cursor, len, foreground));
        }
        spans
    }

    /// Trailing text no token describes, if lexing stopped early.
    pub fn unclassified(&self) -> Option<Range<usize>> {
        self.cache.as_ref().and_then(TokenCache::unclassified)
    }

    /// Takes the pending notifications, oldest first.
    pub fn drain_events(&mut self) -> Vec<CodeBoxEvent> {
        self.events.drain()
    }

    /// Receives notifications on another task or thread.
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<CodeBoxEvent> {
        self.events.subscribe()
    }
}

impl Default for CodeBox {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn report(cache: &TokenCache, range: Range<usize>, events: &EventQueue) {
    if !range.is_empty() {
        events.emit(CodeBoxEvent::Retokenized { range });
    }
    if let Coverage::Failed(error) = cache.coverage() {
        events.emit(CodeBoxEvent::LexFailed {
            error: error.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyntaxColor;
    use crate::CoreError;
    use codebox_syntax::TokenCategory::*;

    fn python() -> CodeBox {
        let mut codebox = CodeBox::default();
        assert!(codebox.set_language("py"));
        codebox.drain_events();
        codebox
    }

    fn fresh_tokens(language: &str, text: &str) -> Vec<Token> {
        let mut codebox = CodeBox::default();
        codebox.set_language(language);
        codebox.set_text(text).unwrap();
        codebox.tokens().collect()
    }

    fn assert_covers(codebox: &CodeBox) {
        let spans = codebox.styled_spans();
        let mut cursor = 0;
        for span in &spans {
            assert_eq!(span.start, cursor, "spans must be contiguous: {spans:?}");
            assert!(span.end > span.start);
            cursor = span.end;
        }
        assert_eq!(cursor, codebox.len());
    }

    #[test]
    fn test_plain_text_without_language() {
        let mut codebox = CodeBox::default();
        let range = codebox.set_text("x = 1").unwrap();

        assert_eq!(range, 0..0);
        assert!(!codebox.is_highlighting());
        assert_eq!(codebox.tokens().count(), 0);
        assert_eq!(
            codebox.styled_spans(),
            vec![StyledSpan::plain(0, 5, Color::WHITE)]
        );
    }

    #[test]
    fn test_highlighted_spans() {
        let mut codebox = python();
        codebox.set_text("def f(): pass").unwrap();

        let spans = codebox.styled_spans();
        assert_eq!(spans[0].category, Some(Keyword));
        assert_eq!(spans[0].color, Color::from_hex(0xFF6600));
        assert_eq!(spans[1], StyledSpan::plain(3, 4, Color::WHITE));
        assert_eq!(spans[2].text(&codebox.text()), "f");
        assert_covers(&codebox);
    }

    #[test]
    fn test_insert_at_line_start_reuses_prefix() {
        let mut codebox = python();
        codebox.set_text("x = 1\ny = 2").unwrap();

        let range = codebox.insert(6, "z = 3\n").unwrap();
        assert_eq!(codebox.text(), "x = 1\nz = 3\ny = 2");
        assert_eq!(range, 5..17);

        let stats = codebox.cache().unwrap().last_edit();
        assert_eq!(stats.tokens_reused, 3);
        assert!(!stats.full_relex);
        assert_eq!(
            codebox.tokens().collect::<Vec<_>>(),
            fresh_tokens("python", &codebox.text())
        );
    }

    #[test]
    fn test_edits_emit_events() {
        let mut codebox = python();
        codebox.set_text("a = 1").unwrap();
        codebox.delete(4..5).unwrap();

        assert_eq!(
            codebox.drain_events(),
            vec![CodeBoxEvent::Retokenized { range: 0..5 }]
        );
        assert!(codebox.drain_events().is_empty());
    }

    #[test]
    fn test_subscribers_receive_edit_events() {
        let mut codebox = python();
        let mut receiver = codebox.subscribe_events();
        codebox.insert(0, "x").unwrap();

        assert_eq!(
            receiver.try_recv(),
            Ok(CodeBoxEvent::Retokenized { range: 0..1 })
        );
        assert_eq!(codebox.drain_events().len(), 1);
    }

    #[test]
    fn test_unknown_language_shows_plain_text() {
        let mut codebox = CodeBox::default();
        assert!(!codebox.set_language("cobol"));
        assert_eq!(codebox.language(), Some("cobol"));
        assert_eq!(
            codebox.drain_events(),
            vec![
                CodeBoxEvent::LanguageChanged(Some("cobol".into())),
                CodeBoxEvent::BackendUnavailable("cobol".into()),
            ]
        );

        codebox.insert(0, "IDENTIFICATION DIVISION.").unwrap();
        assert_covers(&codebox);
    }

    #[test]
    fn test_alias_resolves_to_canonical_name() {
        let mut codebox = CodeBox::default();
        codebox.set_language("RB");
        assert_eq!(codebox.language(), Some("ruby"));
    }

    #[test]
    fn test_batch_changes_apply_in_order() {
        let mut codebox = CodeBox::default();
        codebox.set_language("ruby");
        codebox.set_text("a = 1").unwrap();

        let changes = [
            TextChange::insert(0, "b = 2\n"),
            TextChange::new(10, 1, "42"),
            TextChange::insert(12, " # answer"),
        ];
        codebox.apply_changes(&changes).unwrap();

        assert_eq!(codebox.text(), "b = 2\na = 42 # answer");
        assert_eq!(
            codebox.tokens().collect::<Vec<_>>(),
            fresh_tokens("ruby", &codebox.text())
        );
    }

    #[test]
    fn test_buffer_error_leaves_state() {
        let mut codebox = python();
        codebox.set_text("x").unwrap();
        let before: Vec<_> = codebox.tokens().collect();

        let err = codebox.insert(100, "y").unwrap_err();
        assert!(matches!(err, CoreError::Buffer(_)));
        assert_eq!(codebox.text(), "x");
        assert_eq!(codebox.tokens().collect::<Vec<_>>(), before);
    }

    #[test]
    fn test_non_resumable_language_relexes_everything() {
        let mut codebox = CodeBox::default();
        codebox.set_language("json");
        codebox.set_text("{\"a\": 1}").unwrap();
        codebox.insert(7, "0").unwrap();

        assert!(codebox.cache().unwrap().last_edit().full_relex);
        assert_eq!(
            codebox.tokens().collect::<Vec<_>>(),
            fresh_tokens("json", "{\"a\": 10}")
        );
    }

    #[test]
    fn test_token_budget_and_retry() {
        let mut config = Config::default();
        config.highlighting.language = Some("python".into());
        config.highlighting.max_tokens_per_edit = Some(2);
        let mut codebox = CodeBox::new(config);

        codebox.set_text("a b c d e").unwrap();
        assert_eq!(codebox.unclassified(), Some(3..9));
        assert_eq!(
            codebox.styled_spans().last(),
            Some(&StyledSpan::plain(3, 9, Color::WHITE))
        );
        assert_covers(&codebox);

        assert_eq!(codebox.retry().unwrap(), 3..7);
        assert_eq!(codebox.unclassified(), Some(7..9));

        codebox.retry().unwrap();
        assert_eq!(codebox.unclassified(), None);
        assert_eq!(codebox.tokens().count(), 5);
        assert_eq!(codebox.retry().unwrap(), 9..9);
    }

    #[test]
    fn test_set_config_replaces_colors() {
        let mut codebox = python();
        codebox.set_text("if x").unwrap();
        codebox.drain_events();

        let mut config = Config::default();
        config.appearance.syntax_colors = vec![SyntaxColor {
            category: Identifier,
            color: Color::from_hex(0x123456),
        }];
        codebox.set_config(config);

        assert_eq!(codebox.drain_events(), vec![CodeBoxEvent::StyleChanged]);
        let spans = codebox.styled_spans();
        assert_eq!(spans[0].color, Color::WHITE);
        assert_eq!(spans[2].color, Color::from_hex(0x123456));
    }

    #[test]
    fn test_set_config_toggles_highlighting() {
        let mut codebox = python();
        codebox.set_text("x = 1").unwrap();

        let mut config = Config::default();
        config.highlighting.enabled = false;
        codebox.set_config(config.clone());
        assert!(!codebox.is_highlighting());
        assert_eq!(codebox.language(), Some("python"));

        config.highlighting.enabled = true;
        config.highlighting.edit_boundary = codebox_syntax::EditBoundary::Reopen;
        codebox.set_config(config);
        assert!(codebox.is_highlighting());
        assert_eq!(codebox.tokens().count(), 3);
        assert_eq!(
            codebox.cache().unwrap().config().edit_boundary,
            codebox_syntax::EditBoundary::Reopen
        );
    }

    #[test]
    fn test_clear_language() {
        let mut codebox = python();
        codebox.set_text("x").unwrap();
        codebox.clear_language();

        assert!(!codebox.is_highlighting());
        assert_eq!(codebox.language(), None);
        assert_eq!(
            codebox.drain_events(),
            vec![
                CodeBoxEvent::Retokenized { range: 0..1 },
                CodeBoxEvent::LanguageChanged(None),
            ]
        );
    }

    #[test]
    fn test_open_detects_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.rb");
        std::fs::write(&path, "puts :hello\n").unwrap();

        let codebox = CodeBox::open(&path, Config::default()).unwrap();
        assert_eq!(codebox.language(), Some("ruby"));
        assert_eq!(codebox.tokens().count(), 2);
        assert_eq!(codebox.tokens().nth(1).map(|t| t.category), Some(StringLiteral));
    }

    #[test]
    fn test_open_prefers_configured_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.txt");
        std::fs::write(&path, "x = None").unwrap();

        let mut config = Config::default();
        config.highlighting.language = Some("python".into());
        let codebox = CodeBox::open(&path, config).unwrap();
        assert!(codebox.is_highlighting());
        assert_eq!(codebox.tokens().last().map(|t| t.category), Some(Keyword));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = CodeBox::open(dir.path().join("absent.py"), Config::default()).unwrap_err();
        assert!(matches!(err, CoreError::Buffer(_)));
    }
}
