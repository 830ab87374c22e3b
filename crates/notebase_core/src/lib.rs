//! Core logic for Notebase.
//! Corpus model, path-tree projection, in-memory search and the snapshot
//! service that ties them to a note store.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod search;
pub mod service;
pub mod shell;
pub mod tree;

pub use config::{
    CaseFolding, ConfigError, CoreConfig, IndexConfigError, IndexOptions, MatchMode,
    Tokenization, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT,
};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::corpus::{parse_import_payload, Corpus, CorpusDecodeError, NoteContent};
pub use repo::note_store::{
    ImportBatch, ImportOutcome, NoteStore, SqliteNoteStore, StoreError, StoreResult,
};
pub use search::index::{IndexBuildReport, SearchIndex, SkippedNote};
pub use search::projector::{project, ProjectedNote};
pub use service::notes_service::{
    CorpusStatus, NoteHit, NotesService, ServiceError, ServiceResult,
};
pub use service::snapshot::{InstallOutcome, RefreshTicket, Snapshot, SnapshotCell};
pub use shell::{Tab, TabState};
pub use tree::path_tree::{build_tree, key_to_node_id, node_id_to_key, PathTree, PathTreeNode};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
