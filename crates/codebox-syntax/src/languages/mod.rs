//! Built-in lexer backends and the registry that selects them by name.
//!
//! | Language     | Backend            | Resumable |
//! |--------------|--------------------|-----------|
//! | `python`     | [`ScriptLexer`]    | yes       |
//! | `ruby`       | [`ScriptLexer`]    | yes       |
//! | `rust`       | [`TreeSitterLexer`]| no        |
//! | `javascript` | [`TreeSitterLexer`]| no        |
//! | `json`       | [`TreeSitterLexer`]| no        |

pub mod python;
pub mod ruby;
mod script;
mod treesitter;

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

pub use script::{Mode, ScriptLexer, ScriptRules, ScriptState};
pub use treesitter::TreeSitterLexer;

use crate::backend::LexerBackend;
use crate::{SyntaxError, SyntaxResult};

type Factory = Box<dyn Fn() -> SyntaxResult<Box<dyn LexerBackend>> + Send + Sync>;

/// Maps language names and aliases to backend factories.
///
/// Every [`create`](LanguageRegistry::create) builds a fresh backend, so two
/// widgets never share lexer state.
pub struct LanguageRegistry {
    factories: HashMap<String, Factory>,
    aliases: HashMap<String, String>,
}

impl LanguageRegistry {
    /// A registry with the built-in languages.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register("python", || Ok(Box::new(python::lexer())));
        registry.register("ruby", || Ok(Box::new(ruby::lexer())));
        registry.register("rust", || Ok(Box::new(TreeSitterLexer::rust()?)));
        registry.register("javascript", || Ok(Box::new(TreeSitterLexer::javascript()?)));
        registry.register("json", || Ok(Box::new(TreeSitterLexer::json()?)));

        for (alias, name) in [
            ("py", "python"),
            ("rb", "ruby"),
            ("rs", "rust"),
            ("js", "javascript"),
            ("jsx", "javascript"),
        ] {
            registry.alias(alias, name);
        }
        registry
    }

    /// A registry without any languages.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
            aliases: HashMap::new(),
        }
    }

    /// Registers (or replaces) the backend factory for `name`.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> SyntaxResult<Box<dyn LexerBackend>> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.to_ascii_lowercase(), Box::new(factory));
    }

    /// Makes `alias` resolve to the language `name`.
    pub fn alias(&mut self, alias: &str, name: &str) {
        self.aliases
            .insert(alias.to_ascii_lowercase(), name.to_ascii_lowercase());
    }

    /// Canonical name for a language name or alias, if registered.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let key = name.trim().to_ascii_lowercase();
        let key = self.aliases.get(&key).cloned().unwrap_or(key);
        self.factories.get_key_value(&key).map(|(name, _)| name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    /// Builds a fresh backend for `name`.
    pub fn create(&self, name: &str) -> SyntaxResult<Box<dyn LexerBackend>> {
        let canonical = self
            .resolve(name)
            .ok_or_else(|| SyntaxError::BackendUnavailable(name.to_string()))?;
        let backend = (self.factories[canonical])()?;
        tracing::debug!(
            language = canonical,
            resumable = backend.supports_resume(),
            "Created lexer backend"
        );
        Ok(backend)
    }

    /// Registered language names, sorted.
    pub fn languages(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LanguageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LanguageRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}

/// Detects the language of a file from its name.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let file_name = path.file_name()?.to_str()?;
    if matches!(file_name, "Rakefile" | "Gemfile" | "Guardfile") {
        return Some("ruby");
    }

    let ext = path.extension()?.to_str()?;
    match ext {
        "py" | "pyw" | "pyi" => Some("python"),
        "rb" | "rake" | "gemspec" | "ru" => Some("ruby"),
        "rs" => Some("rust"),
        "js" | "mjs" | "cjs" | "jsx" => Some("javascript"),
        "json" => Some("json"),
        _ => None,
    }
}
