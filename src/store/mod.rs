//! Persistence gateway between the in-memory collections and their flat text
//! files.

mod line_store;

pub use line_store::{LineStore, LoadReport, SkippedLine};
