//! `TaskDeck`: personal task list synchronized with a remote task service.
//!
//! The remote service is authoritative. The client keeps a cached view that
//! is refreshed on focus and after every successful mutation; it never
//! patches the view locally.

pub mod app;
pub mod cli;
pub mod config;
pub mod identity;
pub mod session;
pub mod store;
pub mod tasks;
