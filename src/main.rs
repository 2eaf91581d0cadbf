//! # CodeBox
//!
//! Command line host for the code box widget: loads a document, replays
//! edits through the incremental token cache and prints the result.
//!
//! ## Quick Start
//!
//! ```bash
//! # Highlight a file in the terminal
//! cargo run -- path/to/script.py
//!
//! # Replay edits and list the resulting tokens
//! cargo run -- script.rb -e '0:0:# header\n' -e '12:3:' --format tokens
//!
//! # Read from stdin with an explicit language
//! echo 'x = 1' | cargo run -- -l python --format json
//! ```

mod render;

use anyhow::Context;
use clap::Parser;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use codebox_buffer::TextChange;
use codebox_core::{CodeBox, CodeBoxEvent, Config};
use codebox_syntax::LanguageRegistry;

use render::OutputFormat;

/// CodeBox - incremental syntax highlighting from the command line
#[derive(Parser, Debug)]
#[command(name = "codebox")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// File to highlight (reads stdin when omitted)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Language name or alias, overriding detection
    #[arg(short, long, value_name = "LANG")]
    language: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Edit to apply after loading, as OFFSET:REMOVED:TEXT (repeatable)
    #[arg(short, long = "edit", value_name = "EDIT")]
    edits: Vec<TextChange>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Ansi)]
    format: OutputFormat,

    /// Print cache statistics to stderr
    #[arg(long)]
    stats: bool,

    /// List the available languages and exit
    #[arg(long)]
    list_languages: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting CodeBox v{}", env!("CARGO_PKG_VERSION"));

    if args.list_languages {
        for language in LanguageRegistry::new().languages() {
            println!("{language}");
        }
        return Ok(());
    }

    let config = load_config(&args)?;
    let mut codebox = open(&args, config)?;

    for change in &args.edits {
        codebox
            .apply_change(change)
            .with_context(|| format!("Failed to apply edit at offset {}", change.offset))?;
    }

    for event in codebox.drain_events() {
        match event {
            CodeBoxEvent::BackendUnavailable(language) => {
                eprintln!("codebox: no highlighter for `{language}`, showing plain text");
            }
            CodeBoxEvent::LexFailed { error } => {
                eprintln!("codebox: highlighting stopped early: {error}");
            }
            other => tracing::debug!(?other, "Event"),
        }
    }

    print!("{}", render::render(&codebox, args.format)?);

    if args.stats {
        if let Some(cache) = codebox.cache() {
            let stats = cache.stats();
            eprintln!(
                "{} tokens, {} edits, {} full re-lexes, {} lexed, {} reused",
                cache.len(),
                stats.edits,
                stats.full_relexes,
                stats.tokens_lexed,
                stats.tokens_reused
            );
        }
    }

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(language) = &args.language {
        config.highlighting.language = Some(language.clone());
    }
    Ok(config)
}

fn open(args: &Args, config: Config) -> anyhow::Result<CodeBox> {
    if let Some(path) = &args.file {
        return CodeBox::open(path, config)
            .with_context(|| format!("Failed to open {}", path.display()));
    }

    let mut stdin = std::io::stdin();
    if stdin.is_terminal() {
        tracing::warn!("Reading document from the terminal, end with Ctrl-D");
    }
    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .context("Failed to read stdin")?;

    let mut codebox = CodeBox::new(config);
    codebox.set_text(&text)?;
    Ok(codebox)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["codebox"]);
        assert!(args.file.is_none());
        assert!(args.edits.is_empty());
        assert_eq!(args.format, OutputFormat::Ansi);
    }

    #[test]
    fn test_args_with_file_and_edits() {
        let args = Args::parse_from([
            "codebox", "test.py", "-l", "rb", "-e", "0:0:x\\n", "--edit", "4:2:", "-f", "tokens",
        ]);
        assert_eq!(args.file, Some(PathBuf::from("test.py")));
        assert_eq!(args.language.as_deref(), Some("rb"));
        assert_eq!(
            args.edits,
            vec![TextChange::new(0, 0, "x\n"), TextChange::new(4, 2, "")]
        );
        assert_eq!(args.format, OutputFormat::Tokens);
    }

    #[test]
    fn test_malformed_edit_is_rejected() {
        assert!(Args::try_parse_from(["codebox", "-e", "nope"]).is_err());
    }

    #[test]
    fn test_open_file_with_language_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snippet.txt");
        std::fs::write(&path, "puts :ok").unwrap();

        let args = Args::parse_from(["codebox", path.to_str().unwrap(), "-l", "ruby"]);
        let config = load_config(&args).unwrap();
        let codebox = open(&args, config).unwrap();

        assert_eq!(codebox.language(), Some("ruby"));
        assert_eq!(codebox.tokens().count(), 2);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        let args = Args::parse_from(["codebox", "-c", missing.to_str().unwrap()]);
        assert!(load_config(&args).is_err());
    }
}
