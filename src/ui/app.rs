use std::mem;

use anyhow::{anyhow, Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tracing::{debug, warn};

use crate::collection::Collection;
use crate::loans::{describe_card, is_overdue};
use crate::models::{Book, Item, StudentCard};
use crate::store::SkippedLine;

use super::forms::{BookForm, CardForm, ConfirmDelete, DeleteTarget};
use super::helpers::{centered_rect, skipped_lines_notice, surface_error};
use super::screens::{ListView, SearchFieldCycle};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Rows skipped by PageUp/PageDown.
const PAGE_STEP: isize = 5;

/// Which collection is on screen.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum Screen {
    Books,
    Cards,
}

/// Fine-grained modes scoped to the current screen.
enum Mode {
    Normal,
    AddingBook(BookForm),
    EditingBook { index: usize, form: BookForm },
    AddingCard(CardForm),
    EditingCard { index: usize, form: CardForm },
    ConfirmDelete(ConfirmDelete),
    Searching(SearchState),
}

/// State for an active inline search on the current screen.
struct SearchState {
    query: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Central application state shared across the TUI.
pub struct App {
    books: Collection<Book>,
    cards: Collection<StudentCard>,
    book_view: ListView<Book>,
    card_view: ListView<StudentCard>,
    overdue_only: bool,
    screen: Screen,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(books: Collection<Book>, cards: Collection<StudentCard>) -> Self {
        let book_view = ListView::new(&books);
        let card_view = ListView::new(&cards);
        Self {
            books,
            cards,
            book_view,
            card_view,
            overdue_only: false,
            screen: Screen::Books,
            mode: Mode::Normal,
            status: None,
        }
    }

    /// Surface lines dropped while loading the data files in the footer.
    pub fn report_skipped(&mut self, books: &[SkippedLine], cards: &[SkippedLine]) {
        if let Some(notice) = skipped_lines_notice(books, cards) {
            self.set_status(notice, StatusKind::Error);
        }
    }

    /// Dispatch a key press. Returns `true` when the user asked to quit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit)?,
            Mode::AddingBook(form) => self.handle_book_form(code, None, form),
            Mode::EditingBook { index, form } => self.handle_book_form(code, Some(index), form),
            Mode::AddingCard(form) => self.handle_card_form(code, None, form),
            Mode::EditingCard { index, form } => self.handle_card_form(code, Some(index), form),
            Mode::ConfirmDelete(confirm) => self.handle_confirm_delete(code, confirm),
            Mode::Searching(state) => self.handle_search(code, state),
        };

        Ok(exit)
    }

    /// Ctrl+N: add a borrowed-book row to the open card form.
    pub(crate) fn handle_ctrl_n(&mut self) {
        match &mut self.mode {
            Mode::AddingCard(form) | Mode::EditingCard { form, .. } => {
                form.add_loan();
                form.error = None;
            }
            _ => {}
        }
    }

    /// Ctrl+D: drop the focused borrowed-book row from the open card form.
    pub(crate) fn handle_ctrl_d(&mut self) {
        let removed = match &mut self.mode {
            Mode::AddingCard(form) | Mode::EditingCard { form, .. } => form.remove_loan(),
            _ => return,
        };
        if !removed {
            self.set_status("Select a borrowed book row to remove.", StatusKind::Error);
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Result<Mode> {
        match code {
            KeyCode::Char('q') => *exit = true,
            KeyCode::Esc => {
                if self.has_filter() {
                    self.clear_filter();
                    self.set_status("Filter cleared.", StatusKind::Info);
                } else {
                    *exit = true;
                }
            }
            KeyCode::Tab | KeyCode::BackTab => {
                self.clear_status();
                self.screen = match self.screen {
                    Screen::Books => Screen::Cards,
                    Screen::Cards => Screen::Books,
                };
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Home => match self.screen {
                Screen::Books => self.book_view.select_first(),
                Screen::Cards => self.card_view.select_first(),
            },
            KeyCode::End => match self.screen {
                Screen::Books => self.book_view.select_last(),
                Screen::Cards => self.card_view.select_last(),
            },
            KeyCode::Char('f') | KeyCode::Char('/') => {
                self.clear_status();
                if self.screen == Screen::Cards && self.overdue_only {
                    self.overdue_only = false;
                }
                let query = match self.screen {
                    Screen::Books => self.book_view.query.clone(),
                    Screen::Cards => self.card_view.query.clone(),
                }
                .unwrap_or_default();
                let mode = Mode::Searching(SearchState { query });
                self.apply_search_query(&mode);
                return Ok(mode);
            }
            KeyCode::Char('o') | KeyCode::Char('O') if self.screen == Screen::Cards => {
                self.toggle_overdue();
            }
            KeyCode::Char('+') | KeyCode::Char('a') => {
                self.clear_status();
                return Ok(match self.screen {
                    Screen::Books => Mode::AddingBook(BookForm::default()),
                    Screen::Cards => Mode::AddingCard(CardForm::default()),
                });
            }
            KeyCode::Char('e') | KeyCode::Char('E') | KeyCode::Enter => {
                if let Some(mode) = self.open_edit_form() {
                    self.clear_status();
                    return Ok(mode);
                }
                self.set_status("No record selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') | KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(confirm) = self.confirm_for_selection() {
                    self.clear_status();
                    return Ok(Mode::ConfirmDelete(confirm));
                }
                self.set_status("No record selected to delete.", StatusKind::Error);
            }
            _ => {}
        }
        Ok(Mode::Normal)
    }

    fn handle_book_form(&mut self, code: KeyCode, index: Option<usize>, mut form: BookForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status(
                    if index.is_some() {
                        "Edit cancelled."
                    } else {
                        "Add book cancelled."
                    },
                    StatusKind::Info,
                );
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(false),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let saved = match index {
                    Some(index) => self.save_existing_book(index, &form),
                    None => self.save_new_book(&form),
                };
                match saved {
                    Ok(()) => keep_open = false,
                    Err(err) => {
                        let message = surface_error(&err);
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        match (keep_open, index) {
            (false, _) => Mode::Normal,
            (true, Some(index)) => Mode::EditingBook { index, form },
            (true, None) => Mode::AddingBook(form),
        }
    }

    fn handle_card_form(&mut self, code: KeyCode, index: Option<usize>, mut form: CardForm) -> Mode {
        let mut keep_open = true;
        match code {
            KeyCode::Esc => {
                self.set_status(
                    if index.is_some() {
                        "Edit cancelled."
                    } else {
                        "Add student cancelled."
                    },
                    StatusKind::Info,
                );
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.move_focus(true),
            KeyCode::BackTab | KeyCode::Up => form.move_focus(false),
            KeyCode::Left => {
                form.cycle_book(self.books.records(), false);
            }
            KeyCode::Right => {
                form.cycle_book(self.books.records(), true);
            }
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => {
                let saved = match index {
                    Some(index) => self.save_existing_card(index, &form),
                    None => self.save_new_card(&form),
                };
                match saved {
                    Ok(()) => keep_open = false,
                    Err(err) => {
                        let message = surface_error(&err);
                        form.error = Some(message.clone());
                        self.set_status(message, StatusKind::Error);
                    }
                }
            }
            KeyCode::Char(ch) => {
                if form.push_char(ch) {
                    form.error = None;
                }
            }
            _ => {}
        }

        match (keep_open, index) {
            (false, _) => Mode::Normal,
            (true, Some(index)) => Mode::EditingCard { index, form },
            (true, None) => Mode::AddingCard(form),
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, confirm: ConfirmDelete) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.perform_delete(&confirm) {
                    Ok(()) => Mode::Normal,
                    Err(err) => {
                        self.set_status(surface_error(&err), StatusKind::Error);
                        Mode::Normal
                    }
                }
            }
            _ => Mode::ConfirmDelete(confirm),
        }
    }

    fn handle_search(&mut self, code: KeyCode, mut state: SearchState) -> Mode {
        match code {
            KeyCode::Esc => {
                self.clear_filter();
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Tab => match self.screen {
                Screen::Books => self.book_view.cycle_field(&self.books),
                Screen::Cards => self.card_view.cycle_field(&self.cards),
            },
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-PAGE_STEP),
            KeyCode::PageDown => self.move_selection(PAGE_STEP),
            KeyCode::Backspace => {
                state.query.pop();
            }
            KeyCode::Char(ch) if !ch.is_control() => state.query.push(ch),
            _ => {}
        }

        let mode = Mode::Searching(state);
        self.apply_search_query(&mode);
        mode
    }

    /// Push the query held by a search mode into the current list view.
    fn apply_search_query(&mut self, mode: &Mode) {
        let Mode::Searching(state) = mode else {
            return;
        };
        let query = if state.query.is_empty() {
            None
        } else {
            Some(state.query.clone())
        };
        match self.screen {
            Screen::Books => self.book_view.set_query(query, &self.books),
            Screen::Cards => self.card_view.set_query(query, &self.cards),
        }
    }

    fn has_filter(&self) -> bool {
        match self.screen {
            Screen::Books => self.book_view.query.is_some(),
            Screen::Cards => self.card_view.query.is_some() || self.overdue_only,
        }
    }

    fn clear_filter(&mut self) {
        match self.screen {
            Screen::Books => self.book_view.set_query(None, &self.books),
            Screen::Cards => {
                self.overdue_only = false;
                self.card_view.set_query(None, &self.cards);
            }
        }
    }

    fn toggle_overdue(&mut self) {
        self.overdue_only = !self.overdue_only;
        if self.overdue_only {
            self.card_view.query = None;
        }
        self.refresh_cards(None);
        if self.overdue_only {
            let count = self.card_view.len();
            self.set_status(
                format!("{count} student(s) with overdue books as of {}.", today()),
                StatusKind::Info,
            );
        } else if self.status_is_info() {
            self.set_status("Showing all students.", StatusKind::Info);
        }
    }

    fn move_selection(&mut self, offset: isize) {
        match self.screen {
            Screen::Books => self.book_view.move_selection(offset),
            Screen::Cards => self.card_view.move_selection(offset),
        }
    }

    fn open_edit_form(&self) -> Option<Mode> {
        match self.screen {
            Screen::Books => self.book_view.current().map(|hit| Mode::EditingBook {
                index: hit.index,
                form: BookForm::from_book(&hit.record),
            }),
            Screen::Cards => self.card_view.current().map(|hit| Mode::EditingCard {
                index: hit.index,
                form: CardForm::from_card(&hit.record),
            }),
        }
    }

    fn confirm_for_selection(&self) -> Option<ConfirmDelete> {
        match self.screen {
            Screen::Books => self.book_view.current().map(|hit| ConfirmDelete {
                target: DeleteTarget::Book,
                index: hit.index,
                id: hit.record.id(),
                label: format!("book #{} \"{}\"", hit.record.id(), hit.record.title),
            }),
            Screen::Cards => self.card_view.current().map(|hit| ConfirmDelete {
                target: DeleteTarget::Card,
                index: hit.index,
                id: hit.record.id(),
                label: format!("card #{} of {}", hit.record.id(), hit.record.student_name),
            }),
        }
    }

    fn save_new_book(&mut self, form: &BookForm) -> Result<()> {
        let book = self
            .books
            .add(&form.to_fields())
            .context("failed to add book")?;
        let message = format!("Added book #{} \"{}\".", book.id, book.title);
        let index = self.books.len() - 1;
        self.refresh_books(Some(index));
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn save_existing_book(&mut self, index: usize, form: &BookForm) -> Result<()> {
        let book = self
            .books
            .edit(index, &form.to_fields())
            .context("failed to update book")?;
        let message = format!("Updated book #{} \"{}\".", book.id, book.title);
        self.refresh_books(Some(index));
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn save_new_card(&mut self, form: &CardForm) -> Result<()> {
        let card = self
            .cards
            .add(&form.to_fields())
            .context("failed to add student card")?;
        let message = format!("Added card #{} for {}.", card.id, card.student_name);
        let index = self.cards.len() - 1;
        self.refresh_cards(Some(index));
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn save_existing_card(&mut self, index: usize, form: &CardForm) -> Result<()> {
        let card = self
            .cards
            .edit(index, &form.to_fields())
            .context("failed to update student card")?;
        let message = format!("Updated card #{} for {}.", card.id, card.student_name);
        self.refresh_cards(Some(index));
        self.set_status(message, StatusKind::Info);
        Ok(())
    }

    fn perform_delete(&mut self, confirm: &ConfirmDelete) -> Result<()> {
        let current_id = match confirm.target {
            DeleteTarget::Book => self.books.get(confirm.index).map(|book| book.id()),
            DeleteTarget::Card => self.cards.get(confirm.index).map(|card| card.id()),
        };
        if current_id != Some(confirm.id) {
            warn!(
                index = confirm.index,
                id = confirm.id,
                "delete target moved, refusing to delete"
            );
            return Err(anyhow!("The selected record changed; nothing was deleted."));
        }

        match confirm.target {
            DeleteTarget::Book => {
                self.books
                    .delete(confirm.index)
                    .context("failed to delete book")?;
                self.refresh_books(None);
            }
            DeleteTarget::Card => {
                self.cards
                    .delete(confirm.index)
                    .context("failed to delete student card")?;
                self.refresh_cards(None);
            }
        }
        self.set_status(format!("Deleted {}.", confirm.label), StatusKind::Info);
        Ok(())
    }

    fn refresh_books(&mut self, focus: Option<usize>) {
        self.book_view.refresh(&self.books);
        if let Some(index) = focus {
            self.book_view.focus_index(index);
        }
        // Card rows show book titles, but those are resolved while drawing.
    }

    /// Recompute the card rows, honouring the overdue filter. A malformed due
    /// date switches the filter off and is reported instead.
    fn refresh_cards(&mut self, focus: Option<usize>) {
        if self.overdue_only {
            match self.cards.overdue(today()) {
                Ok(hits) => self.card_view.set_hits(hits),
                Err(err) => {
                    warn!("overdue filter failed: {err}");
                    self.overdue_only = false;
                    self.card_view.refresh(&self.cards);
                    self.set_status(
                        format!("Cannot check overdue books: {err}."),
                        StatusKind::Error,
                    );
                }
            }
        } else {
            self.card_view.refresh(&self.cards);
        }
        if let Some(index) = focus {
            self.card_view.focus_index(index);
        }
        debug!(rows = self.card_view.len(), "refreshed card list");
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    fn status_is_info(&self) -> bool {
        !matches!(
            self.status,
            Some(StatusMessage {
                kind: StatusKind::Error,
                ..
            })
        )
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let footer_height = FOOTER_HEIGHT.min(area.height);

        let (content_area, footer_area) = if area.height > footer_height {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(0), Constraint::Length(footer_height)])
                .split(area);
            (chunks[0], chunks[1])
        } else {
            (area, area)
        };

        match self.screen {
            Screen::Books => self.draw_books(frame, content_area),
            Screen::Cards => self.draw_cards(frame, content_area),
        }

        if area.height >= footer_height {
            self.draw_footer(frame, footer_area);
        }

        match &self.mode {
            Mode::AddingBook(form) => self.draw_book_form(frame, area, "Add Book", form),
            Mode::EditingBook { form, .. } => self.draw_book_form(frame, area, "Edit Book", form),
            Mode::AddingCard(form) => self.draw_card_form(frame, area, "Add Student", form),
            Mode::EditingCard { form, .. } => {
                self.draw_card_form(frame, area, "Edit Student", form)
            }
            Mode::ConfirmDelete(confirm) => self.draw_confirm_delete(frame, area, confirm),
            Mode::Searching(state) => self.draw_search_bar(frame, content_area, state),
            Mode::Normal => {}
        }
    }

    fn draw_books(&self, frame: &mut Frame, area: Rect) {
        let view = &self.book_view;
        let mut title = format!(" Books ({} of {}) ", view.len(), self.books.len());
        if let Some(query) = &view.query {
            title.push_str(&format!("· {} contains \"{}\" ", view.field.display_name(), query));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.books.is_empty() {
            let message = Paragraph::new("No books yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = view
            .hits
            .iter()
            .map(|hit| ListItem::new(hit.record.display_info()))
            .collect();
        self.render_list(frame, area, block, items, view.selected);
    }

    fn draw_cards(&self, frame: &mut Frame, area: Rect) {
        let view = &self.card_view;
        let mut title = format!(" Student Cards ({} of {}) ", view.len(), self.cards.len());
        if self.overdue_only {
            title.push_str("· overdue only ");
        } else if let Some(query) = &view.query {
            title.push_str(&format!("· {} matches \"{}\" ", view.field.display_name(), query));
        }
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.cards.is_empty() {
            let message = Paragraph::new("No student cards yet. Press '+' to add one.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let today = today();
        let books = self.books.records();
        let items: Vec<ListItem> = view
            .hits
            .iter()
            .map(|hit| {
                let (text, style) = card_row(&hit.record, books, today);
                ListItem::new(text).style(style)
            })
            .collect();
        self.render_list(frame, area, block, items, view.selected);
    }

    fn render_list(
        &self,
        frame: &mut Frame,
        area: Rect,
        block: Block,
        items: Vec<ListItem>,
        selected: usize,
    ) {
        if items.is_empty() {
            let message = Paragraph::new("Nothing matches the current filter.")
                .alignment(Alignment::Center)
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default();
        state.select(Some(selected));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = if let Some(status) = &self.status {
            Line::from(vec![Span::styled(status.text.clone(), status.kind.style())])
        } else {
            Line::from("")
        };

        let instructions = self.footer_instructions();

        let paragraph = Paragraph::new(vec![status_line, instructions]).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect, state: &SearchState) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let field = match self.screen {
            Screen::Books => self.book_view.field.display_name(),
            Screen::Cards => self.card_view.field.display_name(),
        };
        let prefix = format!("{field}: ");
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Search (Tab changes field) ");
        let paragraph = Paragraph::new(Span::raw(format!("{prefix}{}", state.query)))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + prefix.chars().count() as u16 + state.query.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let hints: &[(&'static str, &'static str)] = match (&self.mode, self.screen) {
            (Mode::AddingCard(_) | Mode::EditingCard { .. }, _) => &[
                ("[Tab/↑↓]", "Field"),
                ("[←→]", "Pick Book"),
                ("[Ctrl+N]", "Add Row"),
                ("[Ctrl+D]", "Remove Row"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (Mode::AddingBook(_) | Mode::EditingBook { .. }, _) => &[
                ("[Tab/↑↓]", "Field"),
                ("[Enter]", "Save"),
                ("[Esc]", "Cancel"),
            ],
            (Mode::ConfirmDelete(_), _) => &[("[y/Enter]", "Delete"), ("[n/Esc]", "Cancel")],
            (Mode::Searching(_), _) => &[
                ("[Tab]", "Field"),
                ("[↑↓]", "Select"),
                ("[Enter]", "Keep Filter"),
                ("[Esc]", "Clear"),
            ],
            (Mode::Normal, Screen::Books) => &[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[Tab]", "Students"),
                ("[q]", "Quit"),
            ],
            (Mode::Normal, Screen::Cards) => &[
                ("[↑↓]", "Select"),
                ("[f]", "Search"),
                ("[o]", "Overdue"),
                ("[+]", "Add"),
                ("[e]", "Edit"),
                ("[-]", "Delete"),
                ("[Tab]", "Books"),
                ("[q]", "Quit"),
            ],
        };

        let mut spans = Vec::with_capacity(hints.len() * 2);
        for (idx, (key, action)) in hints.iter().enumerate() {
            spans.push(Span::styled(*key, key_style));
            let separator = if idx + 1 < hints.len() { "   " } else { "" };
            spans.push(Span::raw(format!(" {action}{separator}")));
        }
        Line::from(spans)
    }

    fn draw_book_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &BookForm) {
        let popup_area = centered_rect(60, 40, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines = form.lines();
        lines.push(Line::from(""));
        lines.push(form_hint(form.error.as_deref(), "Enter to save • Tab to switch • Esc to cancel"));

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);

        let (column, row) = form.cursor();
        frame.set_cursor_position((inner.x + column, inner.y + row));
    }

    fn draw_card_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &CardForm) {
        let popup_area = centered_rect(70, 60, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let books = self.books.records();
        let mut lines = form.lines(books);
        lines.push(Line::from(""));
        lines.push(form_hint(
            form.error.as_deref(),
            "Enter to save • ←→ to pick a book • Ctrl+N/Ctrl+D add/remove row • Esc to cancel",
        ));

        let paragraph = Paragraph::new(lines);
        frame.render_widget(paragraph, inner);

        let (column, row) = form.cursor(books);
        if row < inner.height {
            frame.set_cursor_position((inner.x + column.min(inner.width), inner.y + row));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, confirm: &ConfirmDelete) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title("Confirm Delete")
            .borders(Borders::ALL);
        let lines = vec![
            Line::from(format!("Delete {}?", confirm.label)),
            Line::from(""),
            Line::from(Span::styled(
                "y / Enter to delete • n / Esc to cancel",
                Style::default().fg(Color::Gray),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}

/// Error text when the last save failed, otherwise the key hint.
fn form_hint(error: Option<&str>, hint: &'static str) -> Line<'static> {
    match error {
        Some(error) => Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    }
}

/// Listing text and style for one card. Overdue cards are red; a card whose
/// due dates cannot be checked is flagged with the parse error, the same
/// failure the overdue filter reports.
fn card_row(card: &StudentCard, books: &[Book], today: NaiveDate) -> (String, Style) {
    let text = describe_card(card, books);
    match is_overdue(card, today) {
        Ok(true) => (text, Style::default().fg(Color::Red)),
        Ok(false) => (text, Style::default()),
        Err(err) => (
            format!("{text}  [{err}]"),
            Style::default().fg(Color::Yellow),
        ),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
