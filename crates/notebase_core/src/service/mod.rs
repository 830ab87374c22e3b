//! Service layer entry points.
//!
//! # Responsibility
//! - Orchestrate store fetches, snapshot rebuilds and queries.
//! - Keep the current snapshot swap explicit instead of ambient UI state.

pub mod notes_service;
pub mod snapshot;
