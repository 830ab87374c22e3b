//! Notes use-case service.
//!
//! # Responsibility
//! - Refresh the corpus from a [`NoteStore`] and publish snapshots.
//! - Forward imports and refresh after a successful one.
//! - Answer search, tree and note-view requests from the current snapshot.
//!
//! # Invariants
//! - A failed fetch installs nothing; the previous snapshot stays current.
//! - Search never fails: a missing index or blank query yields no hits.
//! - A status written by an older refresh never replaces one written by a
//!   newer refresh.
//! - Caller-provided limits are clamped to `0..=MAX_SEARCH_LIMIT`.

use crate::config::{CoreConfig, IndexOptions, MAX_SEARCH_LIMIT};
use crate::model::corpus::NoteContent;
use crate::repo::note_store::{ImportOutcome, NoteStore, StoreError};
use crate::service::snapshot::{InstallOutcome, RefreshTicket, Snapshot, SnapshotCell};
use crate::tree::path_tree::{node_id_to_key, PathTreeNode};
use log::{debug, error, info, warn};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors from notes service operations.
#[derive(Debug)]
pub enum ServiceError {
    /// Corpus fetch failed; previous snapshot retained.
    Unavailable(StoreError),
    /// Import request failed at the store.
    Store(StoreError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "notes unavailable: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) | Self::Store(err) => Some(err),
        }
    }
}

/// Corpus availability as shown next to the search box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorpusStatus {
    /// Nothing fetched yet, or a fetch is in flight.
    Loading,
    /// Fetch succeeded with zero notes.
    Empty,
    Ready,
    /// Last fetch failed.
    Unavailable { message: String },
}

impl CorpusStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Loading => "Fetching notes and preparing index...",
            Self::Empty => "No notes found. Please import.",
            Self::Ready => "Ready to search!",
            Self::Unavailable { .. } => "Error fetching notes. Please try again.",
        }
    }
}

/// Owned search hit handed to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteHit {
    pub key: String,
    pub content: NoteContent,
}

/// Notes service facade over a note store.
pub struct NotesService<S: NoteStore> {
    store: S,
    options: IndexOptions,
    default_limit: usize,
    snapshots: SnapshotCell,
    status: RwLock<TicketedStatus>,
}

/// Status plus the generation of the refresh that wrote it.
#[derive(Debug)]
struct TicketedStatus {
    generation: u64,
    status: CorpusStatus,
}

impl<S: NoteStore> NotesService<S> {
    /// Creates a service; nothing is fetched until [`NotesService::refresh`].
    pub fn new(store: S, config: &CoreConfig) -> Self {
        Self {
            store,
            options: config.index,
            default_limit: config.search_limit.clamp(1, MAX_SEARCH_LIMIT),
            snapshots: SnapshotCell::new(),
            status: RwLock::new(TicketedStatus {
                generation: 0,
                status: CorpusStatus::Loading,
            }),
        }
    }

    /// Fetches the corpus and installs a new snapshot.
    ///
    /// # Errors
    /// - [`ServiceError::Unavailable`] when the store fetch fails. The status
    ///   switches to `Unavailable` unless a newer refresh has started, and the
    ///   previous snapshot stays current.
    pub fn refresh(&self) -> ServiceResult<Arc<Snapshot>> {
        let started_at = Instant::now();
        let ticket = self.snapshots.begin_refresh();
        self.set_status(ticket, CorpusStatus::Loading);

        let corpus = match self.store.fetch_corpus() {
            Ok(corpus) => corpus,
            Err(err) => {
                error!(
                    "event=corpus_refresh module=service status=error ticket={} duration_ms={} error={}",
                    ticket.generation(),
                    started_at.elapsed().as_millis(),
                    err
                );
                self.set_status(
                    ticket,
                    CorpusStatus::Unavailable {
                        message: err.to_string(),
                    },
                );
                return Err(ServiceError::Unavailable(err));
            }
        };

        let outcome = self.snapshots.install(ticket, corpus, self.options);
        let current = Arc::clone(outcome.current());
        if let InstallOutcome::Installed(snapshot) = &outcome {
            info!(
                "event=corpus_refresh module=service status=ok generation={} notes={} skipped={} duration_ms={}",
                snapshot.generation(),
                snapshot.corpus().len(),
                snapshot.report().skipped.len(),
                started_at.elapsed().as_millis()
            );
        }
        let status = if current.corpus().is_empty() {
            CorpusStatus::Empty
        } else {
            CorpusStatus::Ready
        };
        self.set_status(ticket, status);
        Ok(current)
    }

    /// Sends files to the store and refreshes on success.
    ///
    /// A `Failure` outcome leaves the snapshot untouched. If the import
    /// succeeds but the follow-up refresh fails, the outcome is still
    /// `Success` and the status reports `Unavailable`.
    pub fn import(&self, files: &BTreeMap<String, String>) -> ServiceResult<ImportOutcome> {
        let outcome = self
            .store
            .import_files(files)
            .map_err(ServiceError::Store)?;

        match &outcome {
            ImportOutcome::Success { imported } => {
                info!(
                    "event=notes_import module=service status=ok count={}",
                    imported
                );
                if let Err(err) = self.refresh() {
                    warn!(
                        "event=notes_import module=service status=refresh_failed error={}",
                        err
                    );
                }
            }
            ImportOutcome::Failure { reason } => {
                warn!(
                    "event=notes_import module=service status=rejected reason={}",
                    reason
                );
            }
        }
        Ok(outcome)
    }

    /// Searches the current snapshot. `None` limit uses the configured default.
    pub fn search(&self, query: Option<&str>, limit: Option<usize>) -> Vec<NoteHit> {
        let limit = normalize_limit(limit, self.default_limit);
        let snapshot = self.snapshots.load();
        snapshot
            .search(query, limit)
            .into_iter()
            .map(|hit| NoteHit {
                key: hit.key.to_string(),
                content: hit.content.clone(),
            })
            .collect()
    }

    /// Root of the current path tree.
    pub fn tree(&self) -> PathTreeNode {
        self.snapshots.load().tree().root().clone()
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.load()
    }

    pub fn status(&self) -> CorpusStatus {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .status
            .clone()
    }

    /// Content for one corpus key.
    pub fn note(&self, key: &str) -> Option<NoteContent> {
        self.snapshots.load().corpus().get(key).cloned()
    }

    /// Resolves a tree node id such as `root/vault/a.md` to its note.
    pub fn note_for_node_id(&self, node_id: &str) -> Option<NoteHit> {
        let key = node_id_to_key(node_id)?;
        self.note(key).map(|content| NoteHit {
            key: key.to_string(),
            content,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Records `status` unless a newer refresh already wrote one.
    fn set_status(&self, ticket: RefreshTicket, status: CorpusStatus) -> bool {
        let mut guard = self.status.write().unwrap_or_else(PoisonError::into_inner);
        if ticket.generation() < guard.generation {
            debug!(
                "event=corpus_status module=service status=stale ticket={} current={}",
                ticket.generation(),
                guard.generation
            );
            return false;
        }
        guard.generation = ticket.generation();
        guard.status = status;
        true
    }
}

fn normalize_limit(limit: Option<usize>, default_limit: usize) -> usize {
    limit.unwrap_or(default_limit).min(MAX_SEARCH_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::{normalize_limit, CorpusStatus, NotesService};
    use crate::config::{CoreConfig, MAX_SEARCH_LIMIT};
    use crate::model::corpus::Corpus;
    use crate::repo::note_store::{ImportOutcome, NoteStore, StoreResult};
    use std::collections::BTreeMap;

    struct EmptyStore;

    impl NoteStore for EmptyStore {
        fn fetch_corpus(&self) -> StoreResult<Corpus> {
            Ok(Corpus::new())
        }

        fn import_files(&self, files: &BTreeMap<String, String>) -> StoreResult<ImportOutcome> {
            Ok(ImportOutcome::Success {
                imported: files.len(),
            })
        }
    }

    #[test]
    fn older_ticket_cannot_overwrite_newer_status() {
        let service = NotesService::new(EmptyStore, &CoreConfig::default());
        let older = service.snapshots.begin_refresh();
        let newer = service.snapshots.begin_refresh();

        assert!(service.set_status(newer, CorpusStatus::Ready));
        assert!(!service.set_status(
            older,
            CorpusStatus::Unavailable {
                message: "late failure".to_string()
            }
        ));
        assert_eq!(service.status(), CorpusStatus::Ready);

        assert!(service.set_status(newer, CorpusStatus::Empty));
        assert_eq!(service.status(), CorpusStatus::Empty);
    }

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(normalize_limit(None, 15), 15);
        assert_eq!(normalize_limit(Some(3), 15), 3);
        assert_eq!(normalize_limit(Some(0), 15), 0);
        assert_eq!(normalize_limit(Some(10_000), 15), MAX_SEARCH_LIMIT);
    }

    #[test]
    fn status_messages_are_stable() {
        assert_eq!(CorpusStatus::Empty.message(), "No notes found. Please import.");
        assert_eq!(CorpusStatus::Ready.message(), "Ready to search!");
        assert_eq!(
            CorpusStatus::Unavailable {
                message: "boom".to_string()
            }
            .message(),
            "Error fetching notes. Please try again."
        );
    }
}
