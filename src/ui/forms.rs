use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::loans::{borrowed_from_pairs, find_book, UNKNOWN_TITLE};
use crate::models::{Book, BookFields, CardFields, Item, StudentCard};

/// Style for a form value depending on focus and emptiness.
fn value_style(is_active: bool, is_empty: bool) -> Style {
    if is_active {
        Style::default().fg(Color::Yellow)
    } else if is_empty {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    }
}

fn field_line(field_name: &str, value: &str, is_active: bool) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, value_style(is_active, value.is_empty())),
    ])
}

/// Internal representation of the book form fields.
#[derive(Default, Clone)]
pub(crate) struct BookForm {
    pub(crate) title: String,
    pub(crate) author: String,
    pub(crate) year: String,
    pub(crate) quantity: String,
    pub(crate) active: BookField,
    pub(crate) error: Option<String>,
}

/// Fields available within the book form.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum BookField {
    #[default]
    Title,
    Author,
    Year,
    Quantity,
}

impl BookField {
    pub(crate) const ORDER: [BookField; 4] = [
        BookField::Title,
        BookField::Author,
        BookField::Year,
        BookField::Quantity,
    ];

    pub(crate) fn label(self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Year => "Year",
            BookField::Quantity => "Quantity",
        }
    }
}

impl BookForm {
    /// Populate the form from an existing book when editing.
    pub(crate) fn from_book(book: &Book) -> Self {
        let fields = BookFields::from(book);
        Self {
            title: fields.title,
            author: fields.author,
            year: fields.year,
            quantity: fields.quantity,
            active: BookField::Title,
            error: None,
        }
    }

    /// Cycle focus forward or backward through the four fields.
    pub(crate) fn move_focus(&mut self, forward: bool) {
        let order = BookField::ORDER;
        let position = order.iter().position(|f| *f == self.active).unwrap_or(0);
        let next = if forward {
            (position + 1) % order.len()
        } else {
            (position + order.len() - 1) % order.len()
        };
        self.active = order[next];
    }

    fn value_mut(&mut self, field: BookField) -> &mut String {
        match field {
            BookField::Title => &mut self.title,
            BookField::Author => &mut self.author,
            BookField::Year => &mut self.year,
            BookField::Quantity => &mut self.quantity,
        }
    }

    pub(crate) fn value(&self, field: BookField) -> &str {
        match field {
            BookField::Title => &self.title,
            BookField::Author => &self.author,
            BookField::Year => &self.year,
            BookField::Quantity => &self.quantity,
        }
    }

    /// Append a character to the active field. Numeric fields only take
    /// digits and a sign.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let numeric = matches!(self.active, BookField::Year | BookField::Quantity);
        if numeric && !(ch.is_ascii_digit() || ch == '-') {
            return false;
        }
        self.value_mut(self.active).push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.value_mut(self.active).pop();
    }

    /// Raw input handed to the collection, which performs the validation.
    pub(crate) fn to_fields(&self) -> BookFields {
        BookFields::new(
            self.title.clone(),
            self.author.clone(),
            self.year.clone(),
            self.quantity.clone(),
        )
    }

    pub(crate) fn lines(&self) -> Vec<Line<'static>> {
        BookField::ORDER
            .iter()
            .map(|field| field_line(field.label(), self.value(*field), self.active == *field))
            .collect()
    }

    /// Row and column of the text cursor relative to the form body.
    pub(crate) fn cursor(&self) -> (u16, u16) {
        let row = BookField::ORDER
            .iter()
            .position(|f| *f == self.active)
            .unwrap_or(0);
        let prefix = self.active.label().len() + 2;
        let column = prefix + self.value(self.active).chars().count();
        (column as u16, row as u16)
    }
}

/// One row of the borrowed-books editor. `book_id` is kept as stored so a
/// reference to a book that no longer exists survives an edit.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub(crate) struct LoanRow {
    pub(crate) book_id: Option<String>,
    pub(crate) due_date: String,
}

/// Focus targets within the student card form.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub(crate) enum CardFocus {
    #[default]
    Name,
    IssueDate,
    Group,
    Loan(usize),
}

/// Form state for student card creation/editing, including its loan rows.
#[derive(Clone)]
pub(crate) struct CardForm {
    pub(crate) student_name: String,
    pub(crate) issue_date: String,
    pub(crate) group: String,
    pub(crate) loans: Vec<LoanRow>,
    pub(crate) active: CardFocus,
    pub(crate) error: Option<String>,
}

impl Default for CardForm {
    /// A new card starts with one empty loan row ready to fill in.
    fn default() -> Self {
        Self {
            student_name: String::new(),
            issue_date: String::new(),
            group: String::new(),
            loans: vec![LoanRow::default()],
            active: CardFocus::Name,
            error: None,
        }
    }
}

impl CardForm {
    pub(crate) fn from_card(card: &StudentCard) -> Self {
        Self {
            student_name: card.student_name.clone(),
            issue_date: card.issue_date.clone(),
            group: card.group.clone(),
            loans: card
                .borrowed_books
                .iter()
                .map(|entry| LoanRow {
                    book_id: Some(entry.book_id.clone()),
                    due_date: entry.due_date.clone(),
                })
                .collect(),
            active: CardFocus::Name,
            error: None,
        }
    }

    fn focus_order(&self) -> Vec<CardFocus> {
        let mut order = vec![CardFocus::Name, CardFocus::IssueDate, CardFocus::Group];
        order.extend((0..self.loans.len()).map(CardFocus::Loan));
        order
    }

    pub(crate) fn move_focus(&mut self, forward: bool) {
        let order = self.focus_order();
        let position = order.iter().position(|f| *f == self.active).unwrap_or(0);
        let next = if forward {
            (position + 1) % order.len()
        } else {
            (position + order.len() - 1) % order.len()
        };
        self.active = order[next];
    }

    fn active_text_mut(&mut self) -> &mut String {
        match self.active {
            CardFocus::Name => &mut self.student_name,
            CardFocus::IssueDate => &mut self.issue_date,
            CardFocus::Group => &mut self.group,
            CardFocus::Loan(idx) => &mut self.loans[idx].due_date,
        }
    }

    /// Insert a character into the focused field. On a loan row this edits
    /// the due date.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        let date_field = matches!(self.active, CardFocus::IssueDate | CardFocus::Loan(_));
        if date_field && !(ch.is_ascii_digit() || ch == '-') {
            return false;
        }
        self.active_text_mut().push(ch);
        true
    }

    pub(crate) fn backspace(&mut self) {
        self.active_text_mut().pop();
    }

    /// Step the focused loan row's book through "no book" followed by every
    /// book in collection order. Does nothing outside a loan row.
    pub(crate) fn cycle_book(&mut self, books: &[Book], forward: bool) -> bool {
        let CardFocus::Loan(idx) = self.active else {
            return false;
        };
        let row = &mut self.loans[idx];
        // Slot 0 is "no book"; slot n is books[n - 1].
        let slots = books.len() + 1;
        let current = row
            .book_id
            .as_deref()
            .and_then(|id| {
                let book = find_book(books, id)?;
                books.iter().position(|b| b.id() == book.id())
            })
            .map(|position| position + 1)
            .unwrap_or(0);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        row.book_id = if next == 0 {
            None
        } else {
            Some(books[next - 1].id().to_string())
        };
        true
    }

    pub(crate) fn add_loan(&mut self) {
        self.loans.push(LoanRow::default());
        self.active = CardFocus::Loan(self.loans.len() - 1);
    }

    /// Remove the focused loan row. Returns false when focus is not on a row.
    pub(crate) fn remove_loan(&mut self) -> bool {
        let CardFocus::Loan(idx) = self.active else {
            return false;
        };
        self.loans.remove(idx);
        self.active = if self.loans.is_empty() {
            CardFocus::Group
        } else {
            CardFocus::Loan(idx.min(self.loans.len() - 1))
        };
        true
    }

    /// Raw input for the collection. Loan rows missing a book or a due date
    /// are dropped here.
    pub(crate) fn to_fields(&self) -> CardFields {
        let borrowed = borrowed_from_pairs(self.loans.iter().map(|row| {
            (
                row.book_id.clone().unwrap_or_default(),
                row.due_date.clone(),
            )
        }));
        CardFields::new(
            self.student_name.clone(),
            self.issue_date.clone(),
            self.group.clone(),
            borrowed,
        )
    }

    pub(crate) fn lines(&self, books: &[Book]) -> Vec<Line<'static>> {
        let mut lines = vec![
            field_line("Name", &self.student_name, self.active == CardFocus::Name),
            field_line(
                "Issue Date",
                &self.issue_date,
                self.active == CardFocus::IssueDate,
            ),
            field_line("Group", &self.group, self.active == CardFocus::Group),
            Line::from("Borrowed Books:"),
        ];

        if self.loans.is_empty() {
            lines.push(Line::from(Span::styled(
                "  (none, Ctrl+N to add)",
                Style::default().fg(Color::DarkGray),
            )));
        }

        for (idx, row) in self.loans.iter().enumerate() {
            let is_active = self.active == CardFocus::Loan(idx);
            let book_label = match row.book_id.as_deref() {
                None => "<pick a book>".to_string(),
                Some(id) => match find_book(books, id) {
                    Some(book) => book.title().to_string(),
                    None => format!("{UNKNOWN_TITLE} (#{id})"),
                },
            };
            let due = if row.due_date.is_empty() {
                "YYYY-MM-DD".to_string()
            } else {
                row.due_date.clone()
            };
            lines.push(Line::from(vec![
                Span::raw(if is_active { "> " } else { "  " }),
                Span::styled(
                    format!("< {book_label} >"),
                    value_style(is_active, row.book_id.is_none()),
                ),
                Span::raw("  due "),
                Span::styled(due, value_style(is_active, row.due_date.is_empty())),
            ]));
        }

        lines
    }

    /// Row and column of the text cursor relative to the form body.
    pub(crate) fn cursor(&self, books: &[Book]) -> (u16, u16) {
        match self.active {
            CardFocus::Name => (("Name: ".len() + self.student_name.chars().count()) as u16, 0),
            CardFocus::IssueDate => (
                ("Issue Date: ".len() + self.issue_date.chars().count()) as u16,
                1,
            ),
            CardFocus::Group => (("Group: ".len() + self.group.chars().count()) as u16, 2),
            CardFocus::Loan(idx) => {
                let mut column = self.lines(books)[4 + idx].width();
                if self.loans[idx].due_date.is_empty() {
                    column -= "YYYY-MM-DD".len();
                }
                (column as u16, (4 + idx) as u16)
            }
        }
    }
}

/// Which collection a pending deletion targets.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum DeleteTarget {
    Book,
    Card,
}

/// State for confirming a deletion. The id is checked again before deleting
/// so a stale position never removes a different record.
#[derive(Clone, Debug)]
pub(crate) struct ConfirmDelete {
    pub(crate) target: DeleteTarget,
    pub(crate) index: usize,
    pub(crate) id: u32,
    pub(crate) label: String,
}
