//! `TaskDeck` reference task service library.
//!
//! Exposes the HTTP task service for use in tests and embedding. The service
//! keeps one insertion-ordered task collection per user in memory and speaks
//! the same JSON wire format as the client's remote store.

pub mod config;
pub mod service;
pub mod store;
