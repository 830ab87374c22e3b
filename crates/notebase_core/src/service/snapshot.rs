//! Immutable corpus snapshots and atomic swap.
//!
//! # Responsibility
//! - Bundle one corpus with the tree and index derived from it.
//! - Publish new snapshots atomically and discard superseded refreshes.
//!
//! # Invariants
//! - Readers see either the previous or the next complete snapshot.
//! - A refresh result is installed only if its ticket is newer than the
//!   installed snapshot's generation.

use crate::config::IndexOptions;
use crate::model::corpus::Corpus;
use crate::search::index::{IndexBuildReport, SearchIndex};
use crate::search::projector::{project, ProjectedNote};
use crate::tree::path_tree::PathTree;
use log::{info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// One complete `(corpus, index, tree)` triple.
#[derive(Debug)]
pub struct Snapshot {
    generation: u64,
    corpus: Corpus,
    index: Option<SearchIndex>,
    tree: PathTree,
    report: IndexBuildReport,
}

impl Snapshot {
    /// Initial state before any corpus has been fetched; has no index.
    pub fn empty() -> Self {
        Self {
            generation: 0,
            corpus: Corpus::new(),
            index: None,
            tree: PathTree::default(),
            report: IndexBuildReport::default(),
        }
    }

    /// Derives tree and index from `corpus`.
    pub fn rebuild(generation: u64, corpus: Corpus, options: IndexOptions) -> Self {
        let empty_segment_keys = corpus.keys_with_empty_segments().len();
        if empty_segment_keys > 0 {
            warn!(
                "event=tree_build module=tree status=empty_segments generation={} keys={}",
                generation, empty_segment_keys
            );
        }

        let tree = PathTree::rebuild(&corpus);
        let (index, report) = SearchIndex::build(&corpus, options);
        Self {
            generation,
            corpus,
            index: Some(index),
            tree,
            report,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// `None` until the first corpus has been installed.
    pub fn index(&self) -> Option<&SearchIndex> {
        self.index.as_ref()
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn report(&self) -> &IndexBuildReport {
        &self.report
    }

    /// Runs a query against this snapshot.
    pub fn search(&self, query: Option<&str>, limit: usize) -> Vec<ProjectedNote<'_>> {
        project(query, self.index(), &self.corpus, limit)
    }
}

/// Ticket handed out when a refresh starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Result of trying to publish a snapshot.
#[derive(Debug, Clone)]
pub enum InstallOutcome {
    Installed(Arc<Snapshot>),
    /// A newer refresh already landed; the built snapshot was dropped.
    Superseded { current: Arc<Snapshot> },
}

impl InstallOutcome {
    /// The snapshot that is current after this install attempt.
    pub fn current(&self) -> &Arc<Snapshot> {
        match self {
            Self::Installed(snapshot) => snapshot,
            Self::Superseded { current } => current,
        }
    }
}

/// Holder of the current snapshot.
#[derive(Debug)]
pub struct SnapshotCell {
    current: RwLock<Arc<Snapshot>>,
    next_generation: AtomicU64,
}

impl Default for SnapshotCell {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotCell {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::empty())),
            next_generation: AtomicU64::new(1),
        }
    }

    /// Returns the current snapshot.
    pub fn load(&self) -> Arc<Snapshot> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Starts a refresh; later tickets win over earlier ones.
    pub fn begin_refresh(&self) -> RefreshTicket {
        RefreshTicket(self.next_generation.fetch_add(1, Ordering::SeqCst))
    }

    /// Builds a snapshot for `corpus` and publishes it unless superseded.
    ///
    /// The build runs outside the lock; only the pointer swap is guarded.
    pub fn install(
        &self,
        ticket: RefreshTicket,
        corpus: Corpus,
        options: IndexOptions,
    ) -> InstallOutcome {
        if let Some(current) = self.superseding(ticket) {
            return InstallOutcome::Superseded { current };
        }

        let snapshot = Arc::new(Snapshot::rebuild(ticket.generation(), corpus, options));

        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if guard.generation() >= ticket.generation() {
            info!(
                "event=snapshot_install module=service status=superseded ticket={} current={}",
                ticket.generation(),
                guard.generation()
            );
            return InstallOutcome::Superseded {
                current: Arc::clone(&guard),
            };
        }

        *guard = Arc::clone(&snapshot);
        info!(
            "event=snapshot_install module=service status=ok generation={} notes={}",
            snapshot.generation(),
            snapshot.corpus().len()
        );
        InstallOutcome::Installed(snapshot)
    }

    fn superseding(&self, ticket: RefreshTicket) -> Option<Arc<Snapshot>> {
        let current = self.load();
        (current.generation() >= ticket.generation()).then_some(current)
    }
}
