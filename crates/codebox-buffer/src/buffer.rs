//! Core text buffer implementation using a rope.
//!
//! The rope indexes characters while the rest of the widget speaks UTF-8
//! byte offsets, so every public method takes byte offsets and validates
//! them before touching the rope.

use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;
use std::path::{Path, PathBuf};

use crate::edit::{Edit, TextChange};
use crate::{BufferError, BufferResult};

/// A text buffer backed by a rope data structure.
///
/// `TextBuffer` is `Send` but not `Sync`: the widget owns it on the UI thread
/// and mutates it through `&mut self`.
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Whether the buffer changed since it was loaded
    modified: bool,

    /// Associated file path (if any)
    file_path: Option<PathBuf>,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use codebox_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a buffer from a file.
    pub fn from_file(path: impl AsRef<Path>) -> BufferResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        Ok(Self {
            rope: Rope::from_str(&content),
            modified: false,
            file_path: Some(path.to_path_buf()),
        })
    }

    // ==================== Text Access ====================

    /// Returns the entire text content.
    ///
    /// Borrowed when the rope is a single chunk, allocated otherwise.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns the text in a byte range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<Cow<'_, str>> {
        let chars = self.char_range(range)?;
        Ok(self.rope.slice(chars).into())
    }

    /// Returns a specific line (0-indexed), including its trailing newline.
    pub fn line(&self, line_idx: usize) -> BufferResult<Cow<'_, str>> {
        if line_idx >= self.len_lines() {
            return Err(BufferError::LineOutOfBounds(line_idx));
        }
        Ok(self.rope.line(line_idx).into())
    }

    /// Returns the byte offset at which a line starts.
    pub fn line_to_byte(&self, line_idx: usize) -> BufferResult<usize> {
        if line_idx >= self.len_lines() {
            return Err(BufferError::LineOutOfBounds(line_idx));
        }
        Ok(self.rope.line_to_byte(line_idx))
    }

    // ==================== Measurements ====================

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_bytes() == 0
    }

    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.rope.len_bytes()
    }

    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines in the buffer.
    ///
    /// An empty buffer has 1 line. A buffer ending with `\n` counts
    /// the empty line after it.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    // ==================== Mutations ====================

    /// Inserts text at a byte offset.
    pub fn insert(&mut self, offset: usize, text: &str) -> BufferResult<Edit> {
        self.replace(offset..offset, text)
    }

    /// Deletes a byte range.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<Edit> {
        self.replace(range, "")
    }

    /// Replaces a byte range with new text and reports the edit.
    ///
    /// The buffer is left untouched when the range is invalid.
    pub fn replace(&mut self, range: Range<usize>, text: &str) -> BufferResult<Edit> {
        let chars = self.char_range(range.clone())?;
        let edit = Edit::new(range.start, range.end - range.start, text.len());
        if edit.is_noop() {
            return Ok(edit);
        }

        self.rope.remove(chars.clone());
        self.rope.insert(chars.start, text);
        self.modified = true;

        Ok(edit)
    }

    /// Applies a [`TextChange`].
    pub fn apply(&mut self, change: &TextChange) -> BufferResult<Edit> {
        self.replace(change.range(), &change.text)
    }

    /// Replaces the whole content.
    pub fn set_text(&mut self, text: &str) -> BufferResult<Edit> {
        let len = self.len_bytes();
        self.replace(0..len, text)
    }

    // ==================== State Queries ====================

    /// Returns true if the buffer has been mutated since it was loaded.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns the associated file path, if any.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    // ==================== Offset Conversion ====================

    /// Converts a byte range into a character range, validating bounds and
    /// character boundaries.
    fn char_range(&self, range: Range<usize>) -> BufferResult<Range<usize>> {
        let len = self.len_bytes();
        if range.start > range.end || range.end > len {
            return Err(BufferError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(self.byte_to_char(range.start)?..self.byte_to_char(range.end)?)
    }

    fn byte_to_char(&self, offset: usize) -> BufferResult<usize> {
        let char_idx = self.rope.byte_to_char(offset);
        if self.rope.char_to_byte(char_idx) != offset {
            return Err(BufferError::NotCharBoundary(offset));
        }
        Ok(char_idx)
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            modified: false,
            file_path: None,
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}
