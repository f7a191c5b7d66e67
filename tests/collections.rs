use std::fs;

use chrono::NaiveDate;
use library_manager::{
    describe_card, filter_overdue, is_overdue, resolve_borrowed, Book, BookFields,
    BookSearchField, BorrowedBook, CardFields, CardSearchField, Collection, IdPolicy,
    LibraryConfig, LibraryError, LineStore, ResolvedLoan, StudentCard,
};
use tempfile::{tempdir, TempDir};

fn open_books(dir: &TempDir, policy: IdPolicy) -> Collection<Book> {
    let config = LibraryConfig::in_dir(dir.path());
    let (books, skipped) = Collection::open(LineStore::new(config.books_path), policy).unwrap();
    assert!(skipped.is_empty());
    books
}

fn open_cards(dir: &TempDir) -> Collection<StudentCard> {
    let config = LibraryConfig::in_dir(dir.path());
    let (cards, skipped) =
        Collection::open(LineStore::new(config.students_path), IdPolicy::Sequential).unwrap();
    assert!(skipped.is_empty());
    cards
}

fn card(id: u32, loans: &[(&str, &str)]) -> StudentCard {
    StudentCard {
        id,
        student_name: format!("Student {id}"),
        issue_date: "2024-01-01".to_string(),
        group: "G1".to_string(),
        borrowed_books: loans
            .iter()
            .map(|(book_id, due)| BorrowedBook::new(*book_id, *due))
            .collect(),
    }
}

fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

#[test]
fn ids_follow_positions_not_the_other_way_round() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);

    let dune = books
        .add(&BookFields::new("Dune", "Herbert", "1965", "3"))
        .unwrap();
    assert_eq!(dune.id, 1);
    let foundation = books
        .add(&BookFields::new("Foundation", "Asimov", "1951", "2"))
        .unwrap();
    assert_eq!(foundation.id, 2);

    let removed = books.delete(0).unwrap();
    assert_eq!(removed.title, "Dune");
    assert_eq!(books.len(), 1);
    let remaining = books.get(0).unwrap();
    assert_eq!(remaining.title, "Foundation");
    assert_eq!(remaining.id, 2);

    let reopened = open_books(&dir, IdPolicy::Sequential);
    assert_eq!(reopened.records(), books.records());
}

#[test]
fn sequential_ids_can_collide_after_delete_but_after_max_does_not() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);
    for title in ["A", "B", "C"] {
        books
            .add(&BookFields::new(title, "X", "2000", "1"))
            .unwrap();
    }
    books.delete(0).unwrap();
    let added = books.add(&BookFields::new("D", "X", "2000", "1")).unwrap();
    assert_eq!(added.id, 3, "count + 1 reuses the id of C");

    let other = tempdir().unwrap();
    let mut books = open_books(&other, IdPolicy::AfterMax);
    for title in ["A", "B", "C"] {
        books
            .add(&BookFields::new(title, "X", "2000", "1"))
            .unwrap();
    }
    books.delete(0).unwrap();
    let added = books.add(&BookFields::new("D", "X", "2000", "1")).unwrap();
    assert_eq!(added.id, 4);
}

#[test]
fn rejected_add_leaves_collection_and_file_alone() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);
    books
        .add(&BookFields::new("Dune", "Herbert", "1965", "3"))
        .unwrap();
    let before = fs::read_to_string(books.store().path()).unwrap();

    let err = books
        .add(&BookFields::new("", "Herbert", "nineteen", "3"))
        .unwrap_err();
    match err {
        LibraryError::Validation(validation) => {
            assert_eq!(validation.fields(), vec!["title", "year"]);
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert_eq!(books.len(), 1);
    assert_eq!(fs::read_to_string(books.store().path()).unwrap(), before);
}

#[test]
fn out_of_range_delete_and_edit_are_bounds_errors() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);
    books
        .add(&BookFields::new("Dune", "Herbert", "1965", "3"))
        .unwrap();
    let before = fs::read_to_string(books.store().path()).unwrap();

    for index in [books.len(), usize::MAX] {
        let err = books.delete(index).unwrap_err();
        assert!(
            matches!(err, LibraryError::Bounds { len: 1, .. }),
            "unexpected error {err:?}"
        );
    }
    let err = books
        .edit(5, &BookFields::new("Emma", "Austen", "1815", "1"))
        .unwrap_err();
    assert!(matches!(err, LibraryError::Bounds { index: 5, len: 1 }));

    assert_eq!(books.len(), 1);
    assert_eq!(fs::read_to_string(books.store().path()).unwrap(), before);
}

#[test]
fn edit_keeps_id_and_position() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);
    books
        .add(&BookFields::new("Dune", "Herbert", "1965", "3"))
        .unwrap();
    books
        .add(&BookFields::new("Emma", "Austen", "1815", "1"))
        .unwrap();

    let updated = books
        .edit(0, &BookFields::new("Dune Messiah", "Herbert", "1969", "2"))
        .unwrap();
    assert_eq!(updated.id, 1);
    assert_eq!(books.records()[0].title, "Dune Messiah");
    assert_eq!(books.records()[1].title, "Emma");
}

#[test]
fn searches_report_collection_positions() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);
    books
        .add(&BookFields::new("Dune", "Frank Herbert", "1965", "3"))
        .unwrap();
    books
        .add(&BookFields::new("Emma", "Jane Austen", "1815", "1"))
        .unwrap();
    books
        .add(&BookFields::new("Children of Dune", "Frank Herbert", "1976", "1"))
        .unwrap();

    let hits = books.search(BookSearchField::Title, "DUNE");
    let positions: Vec<usize> = hits.iter().map(|hit| hit.index).collect();
    assert_eq!(positions, vec![0, 2]);

    assert_eq!(books.search(BookSearchField::Author, "austen").len(), 1);
    assert_eq!(books.search(BookSearchField::Year, "1965").len(), 1);
    assert!(books.search(BookSearchField::Year, "196").is_empty());

    let mut cards = open_cards(&dir);
    cards
        .add(&CardFields::new("Ada", "2024-01-01", "CS-1", vec![]))
        .unwrap();
    cards
        .add(&CardFields::new("Grace", "2024-01-02", "cs-2", vec![]))
        .unwrap();
    assert_eq!(cards.search(CardSearchField::Group, "cs").len(), 2);
    let by_id = cards.search(CardSearchField::Id, "2");
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].record.student_name, "Grace");
}

#[test]
fn borrowed_ids_resolve_to_titles_or_unknown() {
    let loaned = card(1, &[("2", "2024-01-01")]);
    let dune = Book {
        id: 2,
        title: "Dune".to_string(),
        author: "Herbert".to_string(),
        year: 1965,
        quantity: 1,
    };
    assert_eq!(
        resolve_borrowed(&loaned, std::slice::from_ref(&dune)),
        vec![ResolvedLoan {
            title: "Dune".to_string(),
            due_date: "2024-01-01".to_string(),
        }]
    );

    let other = Book { id: 5, ..dune };
    let resolved = resolve_borrowed(&loaned, &[other]);
    assert_eq!(resolved[0].title, "Unknown");
    assert_eq!(resolved[0].due_date, "2024-01-01");

    assert_eq!(
        describe_card(&loaned, &[]),
        "ID: 1 | Name: Student 1 | Issue Date: 2024-01-01 | Group: G1 | Borrowed Books: Unknown (Due: 2024-01-01)"
    );
}

#[test]
fn overdue_is_strictly_before_the_reference_date() {
    let as_of = date("2025-01-01");
    assert!(!is_overdue(&card(1, &[("1", "2025-06-01")]), as_of).unwrap());
    assert!(is_overdue(&card(2, &[("1", "2024-01-01")]), as_of).unwrap());
    assert!(!is_overdue(&card(3, &[("1", "2025-01-01")]), as_of).unwrap());
    assert!(!is_overdue(&card(4, &[]), as_of).unwrap());

    let cards = vec![
        card(1, &[("1", "2024-01-01"), ("2", "2024-02-01")]),
        card(2, &[("1", "2026-01-01")]),
        card(3, &[("3", "2023-12-31")]),
    ];
    let ids: Vec<u32> = filter_overdue(&cards, as_of)
        .unwrap()
        .into_iter()
        .map(|card| card.id)
        .collect();
    assert_eq!(ids, vec![1, 3]);

    let broken = vec![card(1, &[("1", "2024-01-01"), ("2", "soon")])];
    assert!(filter_overdue(&broken, as_of).is_err());
}

#[test]
fn collection_overdue_keeps_positions() {
    let dir = tempdir().unwrap();
    let mut cards = open_cards(&dir);
    cards
        .add(&CardFields::new(
            "Ada",
            "2024-01-01",
            "CS-1",
            vec![BorrowedBook::new("1", "2026-01-01")],
        ))
        .unwrap();
    cards
        .add(&CardFields::new(
            "Grace",
            "2024-01-01",
            "CS-1",
            vec![BorrowedBook::new("1", "2024-01-01")],
        ))
        .unwrap();

    let hits = cards.overdue(date("2025-01-01")).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].index, 1);
    assert_eq!(hits[0].record.student_name, "Grace");
}

#[test]
fn text_that_would_corrupt_the_file_is_rejected_before_saving() {
    let dir = tempdir().unwrap();
    let mut books = open_books(&dir, IdPolicy::Sequential);
    books
        .add(&BookFields::new("Dune", "Herbert", "1965", "3"))
        .unwrap();
    let before = fs::read_to_string(books.store().path()).unwrap();

    let err = books
        .add(&BookFields::new("Cats |", "Anon", "2001", "1"))
        .unwrap_err();
    assert!(
        matches!(&err, LibraryError::Validation(validation) if validation.has_issue("title")),
        "unexpected error {err:?}"
    );
    assert!(books
        .edit(0, &BookFields::new("Dune", "| Herbert", "1965", "3"))
        .is_err());

    assert_eq!(fs::read_to_string(books.store().path()).unwrap(), before);
    let reopened = open_books(&dir, IdPolicy::Sequential);
    assert_eq!(reopened.records(), books.records());
    assert_eq!(reopened.records()[0].author, "Herbert");
}
