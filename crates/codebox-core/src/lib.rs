//! # CodeBox Core
//!
//! The model behind a syntax-highlighting code box.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                       CodeBox                         │
//! │  ┌────────────┐   Edit   ┌────────────┐              │
//! │  │ TextBuffer │ ───────▶ │ TokenCache │──▶ Token     │
//! │  └────────────┘          └────────────┘      │       │
//! │  ┌────────────┐          ┌────────────┐      ▼       │
//! │  │   Config   │ ───────▶ │  StyleMap  │──▶ StyledSpan│
//! │  └────────────┘          └────────────┘              │
//! │                 EventQueue ◀── notifications         │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! Every text mutation goes through the buffer first; the [`Edit`] it reports
//! is forwarded to the token cache in the same order, so the cache never sees
//! a text it was not told about.
//!
//! [`Edit`]: codebox_buffer::Edit

pub mod codebox;
pub mod config;
pub mod event;

pub use codebox::{CodeBox, StyledSpan};
pub use config::{AppearanceConfig, Config, ConfigError, HighlightingConfig, SyntaxColor};
pub use event::{CodeBoxEvent, EventQueue};

/// Result type for core operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core operations
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Buffer error: {0}")]
    Buffer(#[from] codebox_buffer::BufferError),

    #[error("Syntax error: {0}")]
    Syntax(#[from] codebox_syntax::SyntaxError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
