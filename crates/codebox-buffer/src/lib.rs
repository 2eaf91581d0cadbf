//! # CodeBox Buffer
//!
//! Rope-backed text buffer for the code box widget.
//!
//! Every mutation is reported as an [`Edit`] descriptor (offset, removed length,
//! inserted length) so that downstream caches can be notified in the same order
//! the text changed.
//!
//! ## Offsets
//!
//! All offsets are UTF-8 byte offsets. The rope stores characters, so byte
//! offsets are converted at the boundary and rejected when they would split a
//! character.

mod buffer;
mod edit;

pub use buffer::TextBuffer;
pub use edit::{Edit, TextChange};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Byte range {start}..{end} is out of bounds for a buffer of {len} bytes")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },

    #[error("Byte offset {0} is not on a character boundary")]
    NotCharBoundary(usize),

    #[error("Line {0} is out of bounds")]
    LineOutOfBounds(usize),

    #[error("Malformed change `{0}`")]
    MalformedChange(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
