//! In-memory execution engine
//!
//! A reference [`UnitOfWork`](crate::repository::UnitOfWork) implementation
//! that evaluates criteria queries against metadata snapshots of stored rows.
//! Useful for tests and for services that keep small reference data sets in
//! process.

mod eval;
mod store;

pub use store::{ExecutedQuery, InMemorySession, InMemoryStore};
