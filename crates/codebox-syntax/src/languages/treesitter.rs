//! Grammar-backed lexers built on tree-sitter.
//!
//! Tree-sitter parses whole documents, so these backends cannot resume and
//! the cache re-lexes them from the start after every edit. The token list is
//! the parse tree's leaves, with strings, comments and numbers taken whole.

use tree_sitter::{Language, Node, Parser};

use crate::backend::{LexerBackend, RawToken, RawTokens};
use crate::state::ResumeState;
use crate::token::TokenCategory;
use crate::{LexError, SyntaxError, SyntaxResult};

/// A non-resumable backend for one tree-sitter grammar.
pub struct TreeSitterLexer {
    name: &'static str,
    parser: Parser,
}

impl TreeSitterLexer {
    /// Creates a lexer for `language`, reported under `name`.
    pub fn new(name: &'static str, language: Language) -> SyntaxResult<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| SyntaxError::Grammar {
                language: name.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { name, parser })
    }

    pub fn rust() -> SyntaxResult<Self> {
        Self::new("rust", tree_sitter_rust::LANGUAGE.into())
    }

    pub fn javascript() -> SyntaxResult<Self> {
        Self::new("javascript", tree_sitter_javascript::LANGUAGE.into())
    }

    pub fn json() -> SyntaxResult<Self> {
        Self::new("json", tree_sitter_json::LANGUAGE.into())
    }
}

impl std::fmt::Debug for TreeSitterLexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterLexer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl LexerBackend for TreeSitterLexer {
    fn language(&self) -> &str {
        self.name
    }

    fn supports_resume(&self) -> bool {
        false
    }

    fn tokenize<'a>(&'a mut self, source: &'a str, _state: Option<ResumeState>) -> RawTokens<'a> {
        let Some(tree) = self.parser.parse(source, None) else {
            return Box::new(std::iter::once(Err(LexError::Backend {
                offset: 0,
                message: format!("{} parser produced no tree", self.name),
            })));
        };

        let tokens = collect_tokens(tree.root_node(), source);
        let end = RawToken::new(TokenCategory::EndOfStream, source.len(), 0);
        Box::new(tokens.into_iter().chain(std::iter::once(end)).map(Ok::<_, LexError>))
    }
}

/// Walks the tree in document order and emits one token per leaf, or per
/// whole-token node such as a string.
fn collect_tokens(root: Node<'_>, source: &str) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut last_end = 0;
    let mut cursor = root.walk();

    loop {
        let node = cursor.node();
        let whole = whole_category(&node, source);
        let descend = whole.is_none() && node.child_count() > 0;

        if !descend {
            let (start, end) = (node.start_byte(), node.end_byte());
            let category = whole.or_else(|| leaf_category(&node));
            if let Some(category) = category {
                if end > start && start >= last_end && !node.is_missing() {
                    tokens.push(RawToken::new(category, start, end - start));
                    last_end = end;
                }
            }
        }

        if descend && cursor.goto_first_child() {
            continue;
        }
        loop {
            if cursor.goto_next_sibling() {
                break;
            }
            if !cursor.goto_parent() {
                return tokens;
            }
        }
    }
}

/// Nodes emitted as a single token without looking at their children.
fn whole_category(node: &Node<'_>, source: &str) -> Option<TokenCategory> {
    if node.is_error() {
        return Some(TokenCategory::Error);
    }
    match node.kind() {
        "string_literal" | "raw_string_literal" | "char_literal" | "string" | "template_string"
        | "regex" => Some(TokenCategory::StringLiteral),

        "integer_literal" | "float_literal" | "number" => Some(TokenCategory::NumericLiteral),

        "line_comment" => Some(TokenCategory::LineComment),
        "block_comment" => Some(TokenCategory::Comment),
        "comment" => {
            let text = source.get(node.start_byte()..).unwrap_or_default();
            Some(if text.starts_with("//") {
                TokenCategory::LineComment
            } else {
                TokenCategory::Comment
            })
        }

        _ => None,
    }
}

/// Category of a leaf that is not a whole-token node.
fn leaf_category(node: &Node<'_>) -> Option<TokenCategory> {
    let kind = node.kind();
    if !node.is_named() {
        // anonymous leaves are the grammar's literal keywords and punctuation
        let first = kind.chars().next()?;
        return Some(if first.is_ascii_alphabetic() {
            TokenCategory::Keyword
        } else {
            TokenCategory::Operator
        });
    }

    Some(match kind {
        "true" | "false" | "null" | "undefined" | "this" | "self" | "super" | "crate"
        | "primitive_type" | "boolean_literal" => TokenCategory::Keyword,
        "escape_sequence" | "string_content" => TokenCategory::StringLiteral,
        _ if kind.ends_with("identifier") => TokenCategory::Identifier,
        _ => TokenCategory::Other,
    })
}
