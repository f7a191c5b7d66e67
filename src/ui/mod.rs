//! Ratatui front-end: two list screens (books and student cards) with search,
//! an overdue filter and modal forms for add/edit/delete.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
