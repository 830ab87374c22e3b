//! Domain model for the note corpus.
//!
//! # Responsibility
//! - Define the flat corpus shape both derived views are built from.
//!
//! # Invariants
//! - A corpus is replaced wholesale; individual notes are never mutated in place
//!   once a snapshot has been built from it.

pub mod corpus;
