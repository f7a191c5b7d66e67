//! Line format shared by both data files: one record per line, five fields
//! joined by `" | "`.
//!
//! Fields are not escaped. A text field that contains `" | "` or a line break,
//! ends with `" |"` or starts with `"| "` produces a line that no longer
//! decodes to the same record (for example the title `"Cats |"` comes back as
//! `"Cats"` with the author prefixed by `"| "`). Record validation rejects such
//! text with [`breaks_line`] so it never reaches a data file.

use crate::error::FormatError;
use crate::models::{Book, BorrowedBook, StudentCard};

/// Separator between fields on a record line.
pub const FIELD_SEPARATOR: &str = " | ";
/// Number of fields every record line carries.
pub const FIELD_COUNT: usize = 5;

/// Conversion between a record and its text line (without the trailing newline).
pub trait LineCodec: Sized {
    fn encode(&self) -> String;
    fn decode(line: &str) -> Result<Self, FormatError>;
}

impl LineCodec for Book {
    fn encode(&self) -> String {
        [
            self.id.to_string(),
            self.title.clone(),
            self.author.clone(),
            self.year.to_string(),
            self.quantity.to_string(),
        ]
        .join(FIELD_SEPARATOR)
    }

    fn decode(line: &str) -> Result<Self, FormatError> {
        let [id, title, author, year, quantity] = split_fields(line)?;
        Ok(Book {
            id: parse_int("id", id)?,
            title: title.to_string(),
            author: author.to_string(),
            year: parse_int("year", year)?,
            quantity: parse_int("quantity", quantity)?,
        })
    }
}

impl LineCodec for StudentCard {
    fn encode(&self) -> String {
        // A Vec of string pairs always serializes.
        let borrowed = serde_json::to_string(&self.borrowed_books).unwrap_or_else(|_| "[]".into());
        [
            self.id.to_string(),
            self.student_name.clone(),
            self.issue_date.clone(),
            self.group.clone(),
            borrowed,
        ]
        .join(FIELD_SEPARATOR)
    }

    fn decode(line: &str) -> Result<Self, FormatError> {
        let [id, student_name, issue_date, group, borrowed] = split_fields(line)?;
        let borrowed_books: Vec<BorrowedBook> = serde_json::from_str(borrowed)
            .map_err(|err| FormatError::BorrowedBooks(err.to_string()))?;
        Ok(StudentCard {
            id: parse_int("id", id)?,
            student_name: student_name.to_string(),
            issue_date: issue_date.to_string(),
            group: group.to_string(),
            borrowed_books,
        })
    }
}

/// Split a line into exactly [`FIELD_COUNT`] fields. Surrounding whitespace of
/// the whole line (including the line terminator) is ignored.
fn split_fields(line: &str) -> Result<[&str; FIELD_COUNT], FormatError> {
    let parts: Vec<&str> = line.trim().split(FIELD_SEPARATOR).collect();
    let found = parts.len();
    parts.try_into().map_err(|_| FormatError::FieldCount {
        expected: FIELD_COUNT,
        found,
    })
}

/// Whether `text` cannot be stored as one field of a record line without
/// changing how the line splits.
pub fn breaks_line(text: &str) -> bool {
    text.contains(FIELD_SEPARATOR)
        || text.contains(['\n', '\r'])
        || text.ends_with(" |")
        || text.starts_with("| ")
}

fn parse_int<T: std::str::FromStr>(field: &'static str, raw: &str) -> Result<T, FormatError> {
    raw.trim()
        .parse()
        .map_err(|_| FormatError::InvalidInteger {
            field,
            value: raw.to_string(),
        })
}
