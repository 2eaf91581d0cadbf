//! Python lexer rules.

use super::script::{ScriptLexer, ScriptRules};

pub static PYTHON: ScriptRules = ScriptRules {
    name: "python",
    keywords: &[
        "and", "as", "assert", "async", "await", "break", "class", "continue",
        "def", "del", "elif", "else", "except", "finally", "for", "from",
        "global", "if", "import", "in", "is", "lambda", "nonlocal", "not",
        "or", "pass", "raise", "return", "try", "while", "with", "yield",
    ],
    constants: &["True", "False", "None"],
    operators: &[
        "+", "-", "*", "/", "%", "@", "&", "|", "^", "~", "<", ">", "=", "!",
        ".", ",", ":", ";", "(", ")", "[", "]", "{", "}", "\\",
        "**", "//", "<<", ">>", "<=", ">=", "==", "!=", "->", ":=",
        "+=", "-=", "*=", "/=", "%=", "@=", "&=", "|=", "^=",
        "**=", "//=", "<<=", ">>=",
    ],
    hash_comments: true,
    block_comment: None,
    quotes: b"'\"",
    multiline_quotes: b"",
    triple_quotes: true,
    string_prefixes: &["r", "u", "b", "f", "br", "rb", "fr", "rf"],
    word_suffixes: b"",
    sigils: false,
    symbols: false,
};

/// A fresh Python backend.
pub fn lexer() -> ScriptLexer {
    ScriptLexer::new(&PYTHON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::languages::script::tests::{assert_prefix_closed, lex};
    use crate::token::Token;
    use crate::token::TokenCategory::*;

    #[test]
    fn test_operator_table_is_prefix_closed() {
        assert_prefix_closed(&PYTHON);
    }

    #[test]
    fn test_function_definition() {
        let tokens = lex(&PYTHON, "def f(x):\n    return x ** 2  # square");
        assert_eq!(
            tokens,
            vec![
                Token::new(Keyword, 0, 3),
                Token::new(Identifier, 4, 1),
                Token::new(Operator, 5, 1),
                Token::new(Identifier, 6, 1),
                Token::new(Operator, 7, 1),
                Token::new(Operator, 8, 1),
                Token::new(Keyword, 14, 6),
                Token::new(Identifier, 21, 1),
                Token::new(Operator, 23, 2),
                Token::new(NumericLiteral, 26, 1),
                Token::new(LineComment, 29, 8),
            ]
        );
    }

    #[test]
    fn test_constants_are_keywords() {
        let tokens = lex(&PYTHON, "None True");
        assert!(tokens.iter().all(|t| t.category == Keyword));
    }

    #[test]
    fn test_prefixed_strings() {
        let tokens = lex(&PYTHON, r#"rb'\x00' f"{x}" b"#);
        assert_eq!(
            tokens,
            vec![
                Token::new(StringLiteral, 0, 8),
                Token::new(StringLiteral, 9, 6),
                Token::new(Identifier, 16, 1),
            ]
        );
    }

    #[test]
    fn test_escaped_quote() {
        let tokens = lex(&PYTHON, r#"'it\'s' x"#);
        assert_eq!(tokens[0], Token::new(StringLiteral, 0, 7));
    }

    #[test]
    fn test_triple_quoted_string_spans_lines() {
        let source = "s = \"\"\"one\ntwo\"\"\" + 1";
        let tokens = lex(&PYTHON, source);
        assert_eq!(
            tokens,
            vec![
                Token::new(Identifier, 0, 1),
                Token::new(Operator, 2, 1),
                Token::new(StringLiteral, 4, 7),
                Token::new(StringLiteral, 11, 6),
                Token::new(Operator, 18, 1),
                Token::new(NumericLiteral, 20, 1),
            ]
        );
        assert_eq!(tokens[2].text(source), "\"\"\"one\n");
    }

    #[test]
    fn test_empty_string_is_not_triple() {
        let tokens = lex(&PYTHON, "'' x");
        assert_eq!(tokens[0], Token::new(StringLiteral, 0, 2));
        assert_eq!(tokens[1], Token::new(Identifier, 3, 1));
    }

    #[test]
    fn test_numbers() {
        let source = "0xFF 1_000 3.14 1e-5 2j 7.";
        let tokens = lex(&PYTHON, source);
        let texts: Vec<_> = tokens.iter().map(|t| t.text(source)).collect();
        assert_eq!(texts, ["0xFF", "1_000", "3.14", "1e-5", "2j", "7."]);
        assert!(tokens.iter().all(|t| t.category == NumericLiteral));
    }

    #[test]
    fn test_hex_does_not_absorb_sign() {
        let source = "0xE+1";
        let texts: Vec<_> = lex(&PYTHON, source)
            .iter()
            .map(|t| t.text(source).to_string())
            .collect();
        assert_eq!(texts, ["0xE", "+", "1"]);
    }

    #[test]
    fn test_unknown_characters_are_errors() {
        let tokens = lex(&PYTHON, "a $ b ?");
        assert_eq!(tokens[1], Token::new(Error, 2, 1));
        assert_eq!(tokens[3], Token::new(Error, 6, 1));
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = lex(&PYTHON, "x = 'abc\ny = 2");
        assert_eq!(tokens[2], Token::new(Error, 4, 4));
        assert_eq!(tokens[3], Token::new(Identifier, 9, 1));
    }
}
