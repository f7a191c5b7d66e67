//! Cross-references between student cards and the book collection: resolving
//! borrowed book ids to titles and working out which cards are overdue.

use chrono::NaiveDate;

use crate::error::FormatError;
use crate::models::{Book, BorrowedBook, Item, StudentCard};

/// Title shown for a borrowed book id with no matching book.
pub const UNKNOWN_TITLE: &str = "Unknown";

/// Date format used for due dates and issue dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A borrowed-book entry with its book id resolved to a display title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLoan {
    pub title: String,
    pub due_date: String,
}

/// Find the book a borrowed entry refers to. Ids are compared numerically, so
/// `"02"` refers to book 2; an id that is not a number refers to nothing.
pub fn find_book<'a>(books: &'a [Book], book_id: &str) -> Option<&'a Book> {
    let id: u32 = book_id.trim().parse().ok()?;
    books.iter().find(|book| book.id() == id)
}

/// Resolve every loan on `card` to `(title, due date)`, in card order and
/// without deduplication. Missing books resolve to [`UNKNOWN_TITLE`].
pub fn resolve_borrowed(card: &StudentCard, books: &[Book]) -> Vec<ResolvedLoan> {
    card.borrowed_books
        .iter()
        .map(|entry| ResolvedLoan {
            title: find_book(books, &entry.book_id)
                .map(|book| book.title().to_string())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            due_date: entry.due_date.clone(),
        })
        .collect()
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, FormatError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| FormatError::InvalidDate {
        value: raw.to_string(),
    })
}

/// Whether any loan on `card` was due strictly before `as_of`.
///
/// Every due date is parsed, and a malformed one is an error even when another
/// loan is already known to be overdue, so the outcome never depends on the
/// order of the loans.
pub fn is_overdue(card: &StudentCard, as_of: NaiveDate) -> Result<bool, FormatError> {
    let mut overdue = false;
    for entry in &card.borrowed_books {
        if parse_date(&entry.due_date)? < as_of {
            overdue = true;
        }
    }
    Ok(overdue)
}

/// Cards with at least one overdue loan, in their original order. Fails on
/// the first card carrying a malformed due date.
pub fn filter_overdue(
    cards: &[StudentCard],
    as_of: NaiveDate,
) -> Result<Vec<&StudentCard>, FormatError> {
    let mut overdue = Vec::new();
    for card in cards {
        if is_overdue(card, as_of)? {
            overdue.push(card);
        }
    }
    Ok(overdue)
}

/// Build the ordered loan list from the sub-editor rows of
/// `(selected book id, due date)`. Rows with either side blank are dropped.
pub fn borrowed_from_pairs<I, B, D>(pairs: I) -> Vec<BorrowedBook>
where
    I: IntoIterator<Item = (B, D)>,
    B: AsRef<str>,
    D: AsRef<str>,
{
    pairs
        .into_iter()
        .filter_map(|(book_id, due_date)| {
            let book_id = book_id.as_ref().trim();
            let due_date = due_date.as_ref().trim();
            if book_id.is_empty() || due_date.is_empty() {
                None
            } else {
                Some(BorrowedBook::new(book_id, due_date))
            }
        })
        .collect()
}

/// Full listing line for a card, borrowed books included.
pub fn describe_card(card: &StudentCard, books: &[Book]) -> String {
    let loans = resolve_borrowed(card, books)
        .into_iter()
        .map(|loan| format!("{} (Due: {})", loan.title, loan.due_date))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} | Borrowed Books: {}", card.display_info(), loans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: u32, title: &str) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: "A".to_string(),
            year: 1990,
            quantity: 1,
        }
    }

    fn card(id: u32, loans: &[(&str, &str)]) -> StudentCard {
        StudentCard {
            id,
            student_name: format!("Student {id}"),
            issue_date: "2024-01-01".to_string(),
            group: "G".to_string(),
            borrowed_books: loans
                .iter()
                .map(|(book_id, due)| BorrowedBook::new(*book_id, *due))
                .collect(),
        }
    }

    fn date(raw: &str) -> NaiveDate {
        parse_date(raw).unwrap()
    }

    #[test]
    fn resolves_known_titles() {
        let resolved = resolve_borrowed(&card(1, &[("2", "2024-01-01")]), &[book(2, "Dune")]);
        assert_eq!(
            resolved,
            vec![ResolvedLoan {
                title: "Dune".to_string(),
                due_date: "2024-01-01".to_string()
            }]
        );
    }

    #[test]
    fn missing_and_non_numeric_ids_are_unknown() {
        let card = card(1, &[("2", "2024-01-01"), ("abc", "2024-02-02")]);
        let resolved = resolve_borrowed(&card, &[book(5, "Emma")]);
        assert_eq!(resolved[0].title, UNKNOWN_TITLE);
        assert_eq!(resolved[1].title, UNKNOWN_TITLE);
        assert_eq!(resolved[1].due_date, "2024-02-02");
    }

    #[test]
    fn repeated_loans_are_kept_in_order() {
        let card = card(1, &[("2", "2024-01-01"), ("3", "2024-01-02"), ("2", "2024-03-01")]);
        let titles: Vec<_> = resolve_borrowed(&card, &[book(2, "Dune"), book(3, "Emma")])
            .into_iter()
            .map(|loan| loan.title)
            .collect();
        assert_eq!(titles, vec!["Dune", "Emma", "Dune"]);
    }

    #[test]
    fn overdue_is_strictly_before() {
        let as_of = date("2025-01-01");
        assert!(!is_overdue(&card(1, &[]), as_of).unwrap());
        assert!(!is_overdue(&card(1, &[("1", "2025-06-01")]), as_of).unwrap());
        assert!(!is_overdue(&card(1, &[("1", "2025-01-01")]), as_of).unwrap());
        assert!(is_overdue(&card(1, &[("1", "2024-01-01")]), as_of).unwrap());
        assert!(is_overdue(&card(1, &[("1", "2025-06-01"), ("2", "2024-12-31")]), as_of).unwrap());
    }

    #[test]
    fn malformed_due_date_is_an_error_wherever_it_appears() {
        let as_of = date("2025-01-01");
        let err = is_overdue(&card(1, &[("1", "2024-01-01"), ("2", "soon")]), as_of).unwrap_err();
        assert_eq!(
            err,
            FormatError::InvalidDate {
                value: "soon".to_string()
            }
        );
    }

    #[test]
    fn filter_keeps_order_and_lists_each_card_once() {
        let cards = vec![
            card(1, &[("1", "2024-01-01"), ("2", "2024-02-01")]),
            card(2, &[("1", "2026-01-01")]),
            card(3, &[("3", "2023-05-05")]),
        ];
        let overdue = filter_overdue(&cards, date("2025-01-01")).unwrap();
        let ids: Vec<u32> = overdue.iter().map(|card| card.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn pairs_with_a_blank_side_are_dropped() {
        let loans = borrowed_from_pairs(vec![
            ("2", "2024-01-01"),
            ("", "2024-01-02"),
            ("3", " "),
            ("4", "2024-01-04"),
        ]);
        assert_eq!(
            loans,
            vec![
                BorrowedBook::new("2", "2024-01-01"),
                BorrowedBook::new("4", "2024-01-04")
            ]
        );
    }

    #[test]
    fn card_description_lists_resolved_loans() {
        let card = card(3, &[("2", "2024-01-01"), ("9", "2024-02-01")]);
        assert_eq!(
            describe_card(&card, &[book(2, "Dune")]),
            "ID: 3 | Name: Student 3 | Issue Date: 2024-01-01 | Group: G | Borrowed Books: Dune (Due: 2024-01-01), Unknown (Due: 2024-02-01)"
        );
    }
}
