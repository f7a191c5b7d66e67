use anyhow::Error;
use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::store::SkippedLine;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

/// Startup notice for data file lines that could not be read, or `None` when
/// both files loaded cleanly.
pub(crate) fn skipped_lines_notice(books: &[SkippedLine], cards: &[SkippedLine]) -> Option<String> {
    let describe = |count: usize, what: &str| match count {
        0 => None,
        1 => Some(format!("1 {what} line")),
        n => Some(format!("{n} {what} lines")),
    };
    let parts: Vec<String> = [describe(books.len(), "book"), describe(cards.len(), "card")]
        .into_iter()
        .flatten()
        .collect();
    if parts.is_empty() {
        return None;
    }
    let (file, first) = books
        .first()
        .map(|line| ("books", line))
        .or_else(|| cards.first().map(|line| ("students", line)))?;
    Some(format!(
        "Skipped {} that could not be read ({file} file line {}: {}).",
        parts.join(" and "),
        first.line_number,
        first.error
    ))
}
