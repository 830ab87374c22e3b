//! Full-text search over corpus content.
//!
//! # Responsibility
//! - Tokenize and index text notes in memory.
//! - Project ranked keys back onto the current corpus for display.
//!
//! # Invariants
//! - An index is built once per corpus snapshot and never updated in place
//!   after the snapshot is published.

pub mod index;
pub mod projector;
pub mod tokenizer;
