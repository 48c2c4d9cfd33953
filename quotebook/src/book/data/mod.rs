//! Data Structures Module
//!
//! Core storage for the quote book: the per-symbol dual index that keeps
//! quotes reachable by id and ordered by price at the same time.

pub mod symbol_book;

pub use symbol_book::SymbolBook;
