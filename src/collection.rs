//! In-memory record collections. A [`Collection`] owns the authoritative
//! sequence of records and rewrites its backing file after every successful
//! mutation, so the file always mirrors memory between operations.

use std::mem;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::IdPolicy;
use crate::error::{FormatError, LibraryError, Result};
use crate::loans;
use crate::models::{Record, StudentCard};
use crate::store::{LineStore, SkippedLine};

/// A record returned by a search, together with its position in the
/// authoritative collection. The record is a copy; changing it does not touch
/// the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit<R> {
    pub index: usize,
    pub record: R,
}

#[derive(Debug)]
pub struct Collection<R> {
    records: Vec<R>,
    store: LineStore,
    id_policy: IdPolicy,
}

impl<R: Record> Collection<R> {
    /// Load the collection from its store. Lines that failed to decode are
    /// returned alongside so the caller can report them.
    pub fn open(store: LineStore, id_policy: IdPolicy) -> Result<(Self, Vec<SkippedLine>)> {
        let report = store.load::<R>()?;
        info!(
            kind = R::KIND,
            path = %store.path().display(),
            records = report.records.len(),
            skipped = report.skipped.len(),
            "opened collection"
        );
        let collection = Self {
            records: report.records,
            store,
            id_policy,
        };
        Ok((collection, report.skipped))
    }

    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&R> {
        self.records.get(index)
    }

    pub fn store(&self) -> &LineStore {
        &self.store
    }

    /// Validate `fields`, append a new record with a fresh id and persist.
    pub fn add(&mut self, fields: &R::Fields) -> Result<&R> {
        let id = self
            .id_policy
            .next_id(self.records.iter().map(|record| record.id()));
        let record = R::from_fields(id, fields)?;
        self.records.push(record);

        if let Err(err) = self.persist() {
            self.records.pop();
            return Err(err);
        }

        info!(kind = R::KIND, id, "added record");
        Ok(&self.records[self.records.len() - 1])
    }

    /// Replace the record at `index` with one built from `fields`, keeping its
    /// id, and persist.
    pub fn edit(&mut self, index: usize, fields: &R::Fields) -> Result<&R> {
        let id = self.checked(index)?.id();
        let updated = R::from_fields(id, fields)?;
        let previous = mem::replace(&mut self.records[index], updated);

        if let Err(err) = self.persist() {
            self.records[index] = previous;
            return Err(err);
        }

        info!(kind = R::KIND, id, index, "edited record");
        Ok(&self.records[index])
    }

    /// Remove the record at `index` (a position in [`Collection::records`],
    /// not an id) and persist.
    pub fn delete(&mut self, index: usize) -> Result<R> {
        self.checked(index)?;
        let removed = self.records.remove(index);

        if let Err(err) = self.persist() {
            self.records.insert(index, removed);
            return Err(err);
        }

        info!(kind = R::KIND, id = removed.id(), index, "deleted record");
        Ok(removed)
    }

    /// Records matching `term` on `field`: a case-insensitive substring match
    /// for text fields, an exact match on the decimal text for numeric ones.
    pub fn search(&self, field: R::SearchField, term: &str) -> Vec<SearchHit<R>> {
        let term = term.to_lowercase();
        self.records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches(field, &term))
            .map(|(index, record)| SearchHit {
                index,
                record: record.clone(),
            })
            .collect()
    }

    /// Every record, as an unfiltered view.
    pub fn all(&self) -> Vec<SearchHit<R>> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| SearchHit {
                index,
                record: record.clone(),
            })
            .collect()
    }

    fn checked(&self, index: usize) -> Result<&R> {
        self.records.get(index).ok_or(LibraryError::Bounds {
            index,
            len: self.records.len(),
        })
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.records).inspect_err(|err| {
            warn!(kind = R::KIND, "failed to persist collection: {err}");
        })
    }
}

impl Collection<StudentCard> {
    /// Cards with at least one loan due strictly before `as_of`.
    pub fn overdue(
        &self,
        as_of: NaiveDate,
    ) -> std::result::Result<Vec<SearchHit<StudentCard>>, FormatError> {
        let mut hits = Vec::new();
        for (index, card) in self.records.iter().enumerate() {
            if loans::is_overdue(card, as_of)? {
                hits.push(SearchHit {
                    index,
                    record: card.clone(),
                });
            }
        }
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Book, BookFields, BookSearchField};
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn open_books(policy: IdPolicy) -> (TempDir, Collection<Book>) {
        let dir = tempdir().unwrap();
        let store = LineStore::new(dir.path().join("books.txt"));
        let (books, skipped) = Collection::<Book>::open(store, policy).unwrap();
        assert!(skipped.is_empty());
        (dir, books)
    }

    fn fields(title: &str) -> BookFields {
        BookFields::new(title, "Author", "2000", "1")
    }

    #[test]
    fn failed_validation_leaves_collection_and_file_alone() {
        let (dir, mut books) = open_books(IdPolicy::Sequential);
        books.add(&fields("Dune")).unwrap();
        let before = fs::read_to_string(dir.path().join("books.txt")).unwrap();

        let err = books
            .edit(0, &BookFields::new("Dune", "Herbert", "soon", "1"))
            .unwrap_err();
        assert!(matches!(err, LibraryError::Validation(ref v) if v.has_issue("year")));
        assert_eq!(books.records()[0].author, "Author");
        assert_eq!(
            fs::read_to_string(dir.path().join("books.txt")).unwrap(),
            before
        );
    }

    #[test]
    fn edit_keeps_id_and_position() {
        let (_dir, mut books) = open_books(IdPolicy::Sequential);
        books.add(&fields("Dune")).unwrap();
        books.add(&fields("Emma")).unwrap();

        let edited = books
            .edit(1, &BookFields::new("Emma", "Austen", "1815", "4"))
            .unwrap();
        assert_eq!(edited.id, 2);
        assert_eq!(books.records()[1].author, "Austen");
        assert_eq!(books.records()[1].quantity, 4);
    }

    #[test]
    fn edit_out_of_bounds() {
        let (_dir, mut books) = open_books(IdPolicy::Sequential);
        let err = books.edit(0, &fields("Dune")).unwrap_err();
        assert!(matches!(err, LibraryError::Bounds { index: 0, len: 0 }));
    }

    #[test]
    fn sequential_ids_can_repeat_after_delete() {
        let (_dir, mut books) = open_books(IdPolicy::Sequential);
        books.add(&fields("A")).unwrap();
        books.add(&fields("B")).unwrap();
        books.add(&fields("C")).unwrap();
        books.delete(0).unwrap();

        let added = books.add(&fields("D")).unwrap();
        assert_eq!(added.id, 3);
        let ids: Vec<u32> = books.records().iter().map(|book| book.id).collect();
        assert_eq!(ids, vec![2, 3, 3]);
    }

    #[test]
    fn after_max_ids_stay_unique() {
        let (_dir, mut books) = open_books(IdPolicy::AfterMax);
        books.add(&fields("A")).unwrap();
        books.add(&fields("B")).unwrap();
        books.add(&fields("C")).unwrap();
        books.delete(0).unwrap();

        let added = books.add(&fields("D")).unwrap();
        assert_eq!(added.id, 4);
    }

    #[test]
    fn search_hits_point_back_into_the_collection() {
        let (_dir, mut books) = open_books(IdPolicy::Sequential);
        books.add(&fields("Dune")).unwrap();
        books.add(&fields("Emma")).unwrap();
        books.add(&fields("Dune Messiah")).unwrap();

        let hits = books.search(BookSearchField::Title, "DUNE");
        let indices: Vec<usize> = hits.iter().map(|hit| hit.index).collect();
        assert_eq!(indices, vec![0, 2]);

        books.delete(hits[1].index).unwrap();
        let titles: Vec<&str> = books.records().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma"]);
    }

    #[test]
    fn year_search_is_exact() {
        let (_dir, mut books) = open_books(IdPolicy::Sequential);
        books
            .add(&BookFields::new("Dune", "Herbert", "1965", "1"))
            .unwrap();
        assert_eq!(books.search(BookSearchField::Year, "1965").len(), 1);
        assert!(books.search(BookSearchField::Year, "196").is_empty());
        assert!(books.search(BookSearchField::Year, "").is_empty());
        assert_eq!(books.search(BookSearchField::Title, "").len(), 1);
    }

    #[test]
    fn failed_save_rolls_back_the_mutation() {
        let dir = tempdir().unwrap();
        // A directory where the file should be makes the rename fail.
        let path = dir.path().join("books.txt");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();
        let (mut books, _) =
            Collection::<Book>::open(LineStore::new(dir.path().join("other.txt")), IdPolicy::Sequential)
                .unwrap();
        books.add(&fields("Dune")).unwrap();

        books.store = LineStore::new(&path);
        let err = books.add(&fields("Emma")).unwrap_err();
        assert!(matches!(err, LibraryError::Io { .. }));
        assert_eq!(books.len(), 1);

        let err = books.delete(0).unwrap_err();
        assert!(matches!(err, LibraryError::Io { .. }));
        assert_eq!(books.records()[0].title, "Dune");
    }
}
