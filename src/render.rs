//! Output formats for the command line host.

use std::fmt::Write as _;

use clap::ValueEnum;
use serde::Serialize;

use codebox_core::{CodeBox, StyledSpan};
use codebox_syntax::{Color, TokenCategory};

/// How the highlighted document is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// 24-bit ANSI colours for a terminal
    #[default]
    Ansi,
    /// Spans as JSON
    Json,
    /// One token per line
    Tokens,
}

pub fn render(codebox: &CodeBox, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Ansi => ansi(codebox),
        OutputFormat::Json => json(codebox)?,
        OutputFormat::Tokens => tokens(codebox),
    })
}

/// The document with a colour escape wherever the colour changes.
pub fn ansi(codebox: &CodeBox) -> String {
    let text = codebox.text();
    let mut out = String::with_capacity(text.len() * 2);
    let mut current: Option<Color> = None;

    for span in codebox.styled_spans() {
        if current != Some(span.color) {
            let Color { r, g, b, .. } = span.color;
            let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
            current = Some(span.color);
        }
        out.push_str(span.text(&text));
    }
    if current.is_some() {
        out.push_str("\x1b[0m");
    }
    out
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    language: Option<&'a str>,
    highlighting: bool,
    length: usize,
    unclassified: Option<[usize; 2]>,
    spans: Vec<JsonSpan<'a>>,
}

#[derive(Serialize)]
struct JsonSpan<'a> {
    #[serde(flatten)]
    span: StyledSpan,
    text: &'a str,
}

pub fn json(codebox: &CodeBox) -> anyhow::Result<String> {
    let text = codebox.text();
    let spans = codebox
        .styled_spans()
        .into_iter()
        .map(|span| JsonSpan {
            text: span.text(&text),
            span,
        })
        .collect();

    let document = JsonDocument {
        language: codebox.language(),
        highlighting: codebox.is_highlighting(),
        length: text.len(),
        unclassified: codebox.unclassified().map(|range| [range.start, range.end]),
        spans,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}

/// `start..end  category  "text"` per token.
pub fn tokens(codebox: &CodeBox) -> String {
    let text = codebox.text();
    let width = TokenCategory::ALL
        .iter()
        .map(|category| category.name().len())
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    for token in codebox.tokens() {
        let range = format!("{}..{}", token.start, token.end());
        let _ = writeln!(
            out,
            "{range:<12} {:<width$} {:?}",
            token.category.name(),
            token.text(&text)
        );
    }
    if let Some(range) = codebox.unclassified() {
        let _ = writeln!(out, "{:<12} unclassified", format!("{}..{}", range.start, range.end));
    }
    out
}
