//! Binary entry point: resolve the data directory, start logging, load both
//! collections and drive the Ratatui event loop until the user exits.
use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use library_manager::{
    run_app, App, Book, Collection, LibraryConfig, LineStore, SkippedLine, StudentCard,
};
use tracing_subscriber::{prelude::*, EnvFilter};

const DEFAULT_LOG_LEVEL: &str = "info";

fn main() -> Result<()> {
    let config = LibraryConfig::default_location()?;
    fs::create_dir_all(&config.data_dir).context("failed to create data directory")?;
    init_logging(&config)?;

    let (books, skipped_books) =
        Collection::<Book>::open(LineStore::new(&config.books_path), config.id_policy)
            .context("failed to load books")?;
    let (cards, skipped_cards) =
        Collection::<StudentCard>::open(LineStore::new(&config.students_path), config.id_policy)
            .context("failed to load student cards")?;

    let mut app = App::new(books, cards);
    app.report_skipped(&skipped_books, &skipped_cards);
    log_skipped(&skipped_books, &skipped_cards);

    let result = run_app(&mut app);
    if let Err(err) = &result {
        tracing::error!("terminal session ended with an error: {err:#}");
    }
    result
}

fn log_skipped(books: &[SkippedLine], cards: &[SkippedLine]) {
    let total = books.len() + cards.len();
    if total > 0 {
        tracing::warn!(
            books = books.len(),
            cards = cards.len(),
            "some data file lines could not be read and will be dropped on the next save"
        );
    }
}

/// Log to a file in the data directory; the terminal UI owns stdout.
fn init_logging(config: &LibraryConfig) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)
        .with_context(|| format!("failed to open log file {}", config.log_path.display()))?;

    let env_filter = log_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(Mutex::new(log_file));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}

/// Level directives from `RUST_LOG`, the one environment variable the program
/// reads. Unset or unparseable values fall back to `info`.
fn log_filter(directives: Option<String>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_LEVEL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_defaults_to_info_and_follows_rust_log() {
        assert_eq!(log_filter(None).to_string(), "info");
        assert_eq!(log_filter(Some("debug".to_string())).to_string(), "debug");
    }
}
