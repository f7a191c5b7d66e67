use std::cmp::min;

use crate::collection::{Collection, SearchHit};
use crate::models::{BookSearchField, CardSearchField, Record};

/// Search fields the list views can cycle through.
pub(crate) trait SearchFieldCycle: Copy + PartialEq + 'static {
    const FIELDS: &'static [Self];

    fn display_name(self) -> &'static str;

    fn next(self) -> Self {
        let fields = Self::FIELDS;
        let position = fields.iter().position(|field| *field == self).unwrap_or(0);
        fields[(position + 1) % fields.len()]
    }
}

impl SearchFieldCycle for BookSearchField {
    const FIELDS: &'static [Self] = &BookSearchField::ALL;

    fn display_name(self) -> &'static str {
        self.label()
    }
}

impl SearchFieldCycle for CardSearchField {
    const FIELDS: &'static [Self] = &CardSearchField::ALL;

    fn display_name(self) -> &'static str {
        self.label()
    }
}

/// Filtered, selectable view over one collection. Each row remembers where it
/// lives in the collection so edits and deletes land on the right record.
pub(crate) struct ListView<R: Record> {
    pub(crate) hits: Vec<SearchHit<R>>,
    pub(crate) selected: usize,
    pub(crate) field: R::SearchField,
    pub(crate) query: Option<String>,
}

impl<R> ListView<R>
where
    R: Record,
    R::SearchField: SearchFieldCycle,
{
    pub(crate) fn new(collection: &Collection<R>) -> Self {
        let mut view = Self {
            hits: Vec::new(),
            selected: 0,
            field: <R::SearchField as SearchFieldCycle>::FIELDS[0],
            query: None,
        };
        view.refresh(collection);
        view
    }

    /// Recompute the rows from the collection using the current search.
    pub(crate) fn refresh(&mut self, collection: &Collection<R>) {
        let hits = match self.query.as_deref() {
            Some(query) if !query.trim().is_empty() => collection.search(self.field, query),
            _ => collection.all(),
        };
        self.set_hits(hits);
    }

    /// Replace the rows with an externally computed set (the overdue filter).
    pub(crate) fn set_hits(&mut self, hits: Vec<SearchHit<R>>) {
        self.hits = hits;
        self.ensure_in_bounds();
    }

    pub(crate) fn set_query(&mut self, query: Option<String>, collection: &Collection<R>) {
        self.query = query;
        self.refresh(collection);
    }

    pub(crate) fn cycle_field(&mut self, collection: &Collection<R>) {
        self.field = self.field.next();
        self.refresh(collection);
    }

    pub(crate) fn current(&self) -> Option<&SearchHit<R>> {
        self.hits.get(self.selected)
    }

    /// Move the selection onto the row showing collection position `index`,
    /// if it is visible.
    pub(crate) fn focus_index(&mut self, index: usize) {
        if let Some(row) = self.hits.iter().position(|hit| hit.index == index) {
            self.selected = row;
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.hits.is_empty() {
            self.selected = 0;
            return;
        }
        let len = self.hits.len() as isize;
        let next = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = next as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.hits.len().saturating_sub(1);
    }

    pub(crate) fn len(&self) -> usize {
        self.hits.len()
    }

    fn ensure_in_bounds(&mut self) {
        self.selected = min(self.selected, self.hits.len().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IdPolicy;
    use crate::models::{Book, BookFields};
    use crate::store::LineStore;
    use tempfile::tempdir;

    #[test]
    fn search_field_cycles_and_wraps() {
        assert_eq!(BookSearchField::Title.next(), BookSearchField::Author);
        assert_eq!(BookSearchField::Year.next(), BookSearchField::Title);
        assert_eq!(CardSearchField::Group.next(), CardSearchField::Name);
    }

    #[test]
    fn selection_follows_filter_and_stays_in_bounds() {
        let dir = tempdir().unwrap();
        let (mut books, _) = Collection::<Book>::open(
            LineStore::new(dir.path().join("books.txt")),
            IdPolicy::Sequential,
        )
        .unwrap();
        for title in ["Dune", "Emma", "Dracula"] {
            books
                .add(&BookFields::new(title, "Someone", "1900", "1"))
                .unwrap();
        }

        let mut view = ListView::new(&books);
        assert_eq!(view.len(), 3);
        view.select_last();
        assert_eq!(view.selected, 2);

        view.set_query(Some("d".to_string()), &books);
        let indices: Vec<usize> = view.hits.iter().map(|hit| hit.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(view.selected, 1);

        view.focus_index(0);
        assert_eq!(view.current().map(|hit| hit.record.title.as_str()), Some("Dune"));

        view.move_selection(-5);
        assert_eq!(view.selected, 0);
        view.move_selection(5);
        assert_eq!(view.selected, 1);
    }
}
