//! Core library surface for the Library Manager TUI application.
//!
//! Two record collections (books and student cards) live in memory and are
//! mirrored to one flat text file each. The modules below cover the record
//! shapes, their line encoding, the file store, loan cross-referencing and the
//! collection operations the terminal front-end drives.
pub mod codec;
pub mod collection;
pub mod config;
pub mod error;
pub mod loans;
pub mod models;
pub mod store;
pub mod ui;

pub use codec::LineCodec;
pub use collection::{Collection, SearchHit};
pub use config::{IdPolicy, LibraryConfig};
pub use error::{FormatError, LibraryError, ValidationError};
pub use loans::{describe_card, filter_overdue, is_overdue, resolve_borrowed, ResolvedLoan};
pub use models::{
    Book, BookFields, BookSearchField, BorrowedBook, CardFields, CardSearchField, Item, Record,
    StudentCard,
};
pub use store::{LineStore, LoadReport, SkippedLine};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
