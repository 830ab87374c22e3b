//! Note store abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the fetch/import contract the service layer depends on.
//! - Isolate SQLite query details from snapshot orchestration.

pub mod note_store;
