//! Ruby lexer rules.

use super::script::{ScriptLexer, ScriptRules};

pub static RUBY: ScriptRules = ScriptRules {
    name: "ruby",
    keywords: &[
        "alias", "and", "begin", "break", "case", "class", "def", "defined?",
        "do", "else", "elsif", "end", "ensure", "for", "if", "in",
        "module", "next", "not", "or", "redo", "rescue", "retry",
        "return", "super", "then", "undef", "unless", "until",
        "when", "while", "yield", "require", "include", "extend", "attr_reader",
        "attr_writer", "attr_accessor", "private", "protected", "public",
        "raise", "lambda", "proc",
    ],
    constants: &["true", "false", "nil", "self", "__FILE__", "__LINE__", "__dir__"],
    operators: &[
        "+", "-", "*", "/", "%", "=", "<", ">", "!", "&", "|", "^", "~", "?",
        ":", ",", ".", ";", "(", ")", "[", "]", "{", "}", "\\",
        "**", "==", "!=", ">=", "<=", "&&", "||", "<<", ">>", "+=", "-=",
        "*=", "/=", "%=", "|=", "&=", "^=", "=~", "!~", "=>", "->", "&.",
        "::", "..",
        "**=", "<=>", "===", "...", "&&=", "||=", "<<=", ">>=",
    ],
    hash_comments: true,
    block_comment: Some(("=begin", "=end")),
    quotes: b"'\"`",
    multiline_quotes: b"'\"`",
    triple_quotes: false,
    string_prefixes: &[],
    word_suffixes: b"?!",
    sigils: true,
    symbols: true,
};

/// A fresh Ruby backend.
pub fn lexer() -> ScriptLexer {
    ScriptLexer::new(&RUBY)
}
