//! Widget configuration.
//!
//! Stored as TOML. Every struct is `#[serde(default)]`, so a file only needs
//! the keys it changes:
//!
//! ```toml
//! [appearance]
//! foreground = "#E0E0E0"
//!
//! [[appearance.syntax_colors]]
//! category = "keyword"
//! color = "#569CD6"
//!
//! [highlighting]
//! edit_boundary = "reopen"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use codebox_syntax::{detect_language, CacheConfig, Color, EditBoundary, StyleMap, TokenCategory};

/// Main widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Colours and font
    pub appearance: AppearanceConfig,

    /// Language selection and cache tuning
    pub highlighting: HighlightingConfig,
}

impl Config {
    /// Loads config from the default location.
    pub fn load() -> Self {
        Self::load_from_default_path().unwrap_or_default()
    }

    /// Loads config from a file.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads from the default config path.
    fn load_from_default_path() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the default config file path.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("codebox").join("config.toml"))
    }

    /// Saves the config to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(Self::default_path()?)
    }

    /// Saves the config to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// The category colours this config asks for.
    pub fn style_map(&self) -> StyleMap {
        StyleMap::from_overrides(
            self.appearance
                .syntax_colors
                .iter()
                .map(|entry| (entry.category, entry.color)),
        )
    }

    /// Token cache settings from the `[highlighting]` table.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            edit_boundary: self.highlighting.edit_boundary,
            max_tokens_per_edit: self.highlighting.max_tokens_per_edit,
        }
    }

    /// Language for a file: the configured extension mapping first, then the
    /// built-in detection.
    pub fn language_for(&self, path: &Path) -> Option<String> {
        let mapped = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.highlighting.extensions.get(&ext.to_ascii_lowercase()));

        mapped
            .cloned()
            .or_else(|| detect_language(path).map(str::to_string))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            appearance: AppearanceConfig::default(),
            highlighting: HighlightingConfig::default(),
        }
    }
}

/// Colours and font of the widget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppearanceConfig {
    /// Colour of text without a category colour
    pub foreground: Color,

    pub background: Color,

    pub font_family: String,

    /// Font size in points
    pub font_size: f32,

    /// Category colours; an empty list means the built-in palette, any
    /// entries replace it entirely
    pub syntax_colors: Vec<SyntaxColor>,
}

impl Default for AppearanceConfig {
    fn default() -> Self {
        Self {
            foreground: Color::WHITE,
            background: Color::BLACK,
            font_family: "Consolas".to_string(),
            font_size: 12.0,
            syntax_colors: Vec::new(),
        }
    }
}

/// One entry of [`AppearanceConfig::syntax_colors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyntaxColor {
    pub category: TokenCategory,
    pub color: Color,
}

/// Language selection and token cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightingConfig {
    /// Disable to show plain text
    pub enabled: bool,

    /// Forced language; detected from the file name when unset
    pub language: Option<String>,

    pub edit_boundary: EditBoundary,

    /// Token budget per edit (unlimited when unset or 0)
    pub max_tokens_per_edit: Option<usize>,

    /// Extra extension to language mappings, e.g. `pyx = "python"`
    pub extensions: HashMap<String, String>,
}

impl Default for HighlightingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            language: None,
            edit_boundary: EditBoundary::default(),
            max_tokens_per_edit: None,
            extensions: HashMap::new(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config directory not found")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.appearance.foreground, Color::WHITE);
        assert_eq!(config.appearance.background, Color::BLACK);
        assert_eq!(config.appearance.font_family, "Consolas");
        assert!(config.highlighting.enabled);
        assert_eq!(config.style_map(), StyleMap::default_palette());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.appearance.syntax_colors.push(SyntaxColor {
            category: TokenCategory::Keyword,
            color: Color::from_hex(0x569CD6),
        });
        config
            .highlighting
            .extensions
            .insert("pyx".to_string(), "python".to_string());

        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file() {
        let parsed: Config = toml::from_str(
            r##"
            [appearance]
            foreground = "#E0E0E0"

            [[appearance.syntax_colors]]
            category = "string_literal"
            color = "#CE9178"

            [highlighting]
            edit_boundary = "reopen"
            max_tokens_per_edit = 500
            "##,
        )
        .unwrap();

        assert_eq!(parsed.appearance.foreground, Color::from_hex(0xE0E0E0));
        assert_eq!(parsed.appearance.font_family, "Consolas");
        assert_eq!(
            parsed.cache_config(),
            CacheConfig {
                edit_boundary: EditBoundary::Reopen,
                max_tokens_per_edit: Some(500),
            }
        );

        let styles = parsed.style_map();
        assert_eq!(
            styles.get(TokenCategory::StringLiteral),
            Some(Color::from_hex(0xCE9178))
        );
        assert_eq!(styles.get(TokenCategory::Keyword), None);
    }

    #[test]
    fn test_bad_color_is_parse_error() {
        let err = toml::from_str::<Config>("[appearance]\nforeground = \"white\"").unwrap_err();
        assert!(err.to_string().contains("white"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.highlighting.language = Some("ruby".to_string());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_language_for() {
        let mut config = Config::default();
        config
            .highlighting
            .extensions
            .insert("pyx".to_string(), "python".to_string());

        assert_eq!(config.language_for(Path::new("a/b.PYX")), Some("python".into()));
        assert_eq!(config.language_for(Path::new("Rakefile")), Some("ruby".into()));
        assert_eq!(config.language_for(Path::new("notes.txt")), None);
    }
}
