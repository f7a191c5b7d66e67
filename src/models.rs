//! Domain models for the two record collections. A book and a student card
//! share the identity shape described by [`Item`]; everything else about them
//! is independent, so they are plain structs rather than variants of one enum.

use std::fmt;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::{breaks_line, LineCodec, FIELD_SEPARATOR};
use crate::error::{FieldIssue, FieldProblem, ValidationError};

/// Label every student card reports as its title.
pub const STUDENT_CARD_TITLE: &str = "Student Card";

/// Identity shared by every record kind.
pub trait Item {
    fn id(&self) -> u32;
    fn title(&self) -> &str;
    /// One-line summary used by list views.
    fn display_info(&self) -> String;
}

/// A record kind that can live in a [`Collection`](crate::collection::Collection).
pub trait Record: Item + LineCodec + Clone {
    /// Raw user input for add/edit, validated by [`Record::from_fields`].
    type Fields;
    /// Which attribute a search looks at.
    type SearchField: Copy;

    /// Short noun used in log lines.
    const KIND: &'static str;

    /// Validate `fields` and build a record carrying `id`.
    fn from_fields(id: u32, fields: &Self::Fields) -> Result<Self, ValidationError>;

    /// Whether this record matches an already lowercased search term.
    fn matches(&self, field: Self::SearchField, term: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: u32,
    pub title: String,
    pub author: String,
    pub year: i32,
    /// Copies on the shelf.
    pub quantity: u32,
}

impl Item for Book {
    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn display_info(&self) -> String {
        format!(
            "ID: {} | Title: {} | Author: {} | Year: {} | Quantity: {}",
            self.id, self.title, self.author, self.year, self.quantity
        )
    }
}

/// Raw form input for a book. Numeric fields stay textual until validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub year: String,
    pub quantity: String,
}

impl BookFields {
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        year: impl Into<String>,
        quantity: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            year: year.into(),
            quantity: quantity.into(),
        }
    }
}

impl From<&Book> for BookFields {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            year: book.year.to_string(),
            quantity: book.quantity.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookSearchField {
    Title,
    Author,
    Year,
}

impl BookSearchField {
    pub const ALL: [BookSearchField; 3] = [Self::Title, Self::Author, Self::Year];

    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::Author => "Author",
            Self::Year => "Year",
        }
    }
}

impl Record for Book {
    type Fields = BookFields;
    type SearchField = BookSearchField;

    const KIND: &'static str = "book";

    fn from_fields(id: u32, fields: &BookFields) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        let title = required(&mut issues, "title", &fields.title);
        let author = required(&mut issues, "author", &fields.author);
        let year = integer::<i32>(&mut issues, "year", &fields.year);
        let quantity = count(&mut issues, "quantity", &fields.quantity);

        match (year, quantity) {
            (Some(year), Some(quantity)) if issues.is_empty() => Ok(Book {
                id,
                title: title.to_string(),
                author: author.to_string(),
                year,
                quantity,
            }),
            _ => Err(ValidationError { issues }),
        }
    }

    fn matches(&self, field: BookSearchField, term: &str) -> bool {
        match field {
            BookSearchField::Title => self.title.to_lowercase().contains(term),
            BookSearchField::Author => self.author.to_lowercase().contains(term),
            BookSearchField::Year => self.year.to_string() == term,
        }
    }
}

/// One loan on a student card: a book id (kept as text, exactly as stored)
/// mapped to its due date. Serialized as a single-key JSON object such as
/// `{"2": "2024-01-01"}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowedBook {
    pub book_id: String,
    pub due_date: String,
}

impl BorrowedBook {
    pub fn new(book_id: impl Into<String>, due_date: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            due_date: due_date.into(),
        }
    }
}

impl Serialize for BorrowedBook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.book_id, &self.due_date)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for BorrowedBook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = BorrowedBook;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping exactly one book id to a due date")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let (book_id, due_date): (String, String) = map
                    .next_entry()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                if map.next_key::<IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(2, &self));
                }
                Ok(BorrowedBook { book_id, due_date })
            }
        }

        deserializer.deserialize_map(EntryVisitor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentCard {
    pub id: u32,
    pub student_name: String,
    /// Expected as `YYYY-MM-DD`, never validated.
    pub issue_date: String,
    pub group: String,
    /// Loans in the order they were recorded. The same book may appear twice.
    pub borrowed_books: Vec<BorrowedBook>,
}

impl Item for StudentCard {
    fn id(&self) -> u32 {
        self.id
    }

    fn title(&self) -> &str {
        STUDENT_CARD_TITLE
    }

    fn display_info(&self) -> String {
        format!(
            "ID: {} | Name: {} | Issue Date: {} | Group: {}",
            self.id, self.student_name, self.issue_date, self.group
        )
    }
}

/// Raw form input for a student card.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardFields {
    pub student_name: String,
    pub issue_date: String,
    pub group: String,
    pub borrowed_books: Vec<BorrowedBook>,
}

impl CardFields {
    pub fn new(
        student_name: impl Into<String>,
        issue_date: impl Into<String>,
        group: impl Into<String>,
        borrowed_books: Vec<BorrowedBook>,
    ) -> Self {
        Self {
            student_name: student_name.into(),
            issue_date: issue_date.into(),
            group: group.into(),
            borrowed_books,
        }
    }
}

impl From<&StudentCard> for CardFields {
    fn from(card: &StudentCard) -> Self {
        Self {
            student_name: card.student_name.clone(),
            issue_date: card.issue_date.clone(),
            group: card.group.clone(),
            borrowed_books: card.borrowed_books.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSearchField {
    Name,
    Id,
    Group,
}

impl CardSearchField {
    pub const ALL: [CardSearchField; 3] = [Self::Name, Self::Id, Self::Group];

    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name",
            Self::Id => "ID",
            Self::Group => "Group",
        }
    }
}

impl Record for StudentCard {
    type Fields = CardFields;
    type SearchField = CardSearchField;

    const KIND: &'static str = "student card";

    fn from_fields(id: u32, fields: &CardFields) -> Result<Self, ValidationError> {
        let mut issues = Vec::new();
        let student_name = required(&mut issues, "name", &fields.student_name);
        let issue_date = required(&mut issues, "issue date", &fields.issue_date);
        let group = required(&mut issues, "group", &fields.group);
        let unsafe_loan = fields.borrowed_books.iter().any(|entry| {
            entry.book_id.contains(FIELD_SEPARATOR) || entry.due_date.contains(FIELD_SEPARATOR)
        });
        if unsafe_loan {
            issues.push(FieldIssue {
                field: "borrowed books",
                problem: FieldProblem::BreaksLine,
            });
        }

        if !issues.is_empty() {
            return Err(ValidationError { issues });
        }

        Ok(StudentCard {
            id,
            student_name: student_name.to_string(),
            issue_date: issue_date.to_string(),
            group: group.to_string(),
            borrowed_books: fields.borrowed_books.clone(),
        })
    }

    fn matches(&self, field: CardSearchField, term: &str) -> bool {
        match field {
            CardSearchField::Name => self.student_name.to_lowercase().contains(term),
            CardSearchField::Id => self.id.to_string() == term,
            CardSearchField::Group => self.group.to_lowercase().contains(term),
        }
    }
}

fn required<'a>(issues: &mut Vec<FieldIssue>, field: &'static str, value: &'a str) -> &'a str {
    let trimmed = value.trim();
    let problem = if trimmed.is_empty() {
        Some(FieldProblem::Missing)
    } else if breaks_line(trimmed) {
        Some(FieldProblem::BreaksLine)
    } else {
        None
    };
    if let Some(problem) = problem {
        issues.push(FieldIssue { field, problem });
    }
    trimmed
}

fn integer<T: std::str::FromStr>(
    issues: &mut Vec<FieldIssue>,
    field: &'static str,
    value: &str,
) -> Option<T> {
    let raw = required(issues, field, value);
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            issues.push(FieldIssue {
                field,
                problem: FieldProblem::NotAnInteger,
            });
            None
        }
    }
}

/// Like [`integer`] but rejects negative values with their own message.
fn count(issues: &mut Vec<FieldIssue>, field: &'static str, value: &str) -> Option<u32> {
    let parsed = integer::<i64>(issues, field, value)?;
    if parsed < 0 {
        issues.push(FieldIssue {
            field,
            problem: FieldProblem::Negative,
        });
        return None;
    }
    match u32::try_from(parsed) {
        Ok(count) => Some(count),
        Err(_) => {
            issues.push(FieldIssue {
                field,
                problem: FieldProblem::NotAnInteger,
            });
            None
        }
    }
}
