//! Quote Management Module
//!
//! The manager facade that keeps the id routing and the per-symbol price
//! ladders consistent across add, update, remove, and trade execution.

pub mod quote_manager;

pub use quote_manager::QuoteManager;
