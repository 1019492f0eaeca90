//! The lifecycle of one search: configuration, traversal, cancellation and results.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::error::CoreError;
use super::metadata::{FsMetadata, MetadataProvider};
use super::scanner::{sort_for_display, DirectoryScanner};
use super::{SearchFilter, SelectedEntry};

/// Where a session is in its lifecycle.
///
/// `Idle → Running → {Completed, Cancelled}`. There is no way back; a new search
/// needs a new session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Idle,
    Running,
    Completed,
    Cancelled,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Completed => "completed",
            SessionStatus::Cancelled => "cancelled",
        };
        f.write_str(text)
    }
}

/// Everything a session needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub root: PathBuf,
    pub filter: SearchFilter,
    /// Keep the matches found so far when the search is cancelled.
    /// By default a cancelled search has no results.
    pub keep_partial_results: bool,
}

impl SearchConfig {
    pub fn new(root: impl Into<PathBuf>, filter: SearchFilter) -> Self {
        Self {
            root: root.into(),
            filter,
            keep_partial_results: false,
        }
    }

    pub fn keep_partial_results(mut self, keep: bool) -> Self {
        self.keep_partial_results = keep;
        self
    }
}

/// Messages from a launched session to its caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// Number of matches found so far.
    Progress(usize),
    /// Sent exactly once, after the last progress message.
    Finished {
        status: SessionStatus,
        matches: usize,
    },
}

/// One configured run of the search.
///
/// Shared as `Arc<SearchSession>`: the worker runs the traversal while any other
/// holder may call [`SearchSession::request_cancel`]. Results may only be read
/// once the session has left `Running`.
pub struct SearchSession {
    provider: Arc<dyn MetadataProvider>,
    config: Mutex<Option<SearchConfig>>,
    status: Mutex<SessionStatus>,
    results: Mutex<Vec<Arc<SelectedEntry>>>,
    cancel_requested: AtomicBool,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchSession {
    /// Creates an idle, unconfigured session reading metadata from the filesystem.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(FsMetadata))
    }

    pub fn with_provider(provider: Arc<dyn MetadataProvider>) -> Self {
        Self {
            provider,
            config: Mutex::new(None),
            status: Mutex::new(SessionStatus::Idle),
            results: Mutex::new(Vec::new()),
            cancel_requested: AtomicBool::new(false),
        }
    }

    /// Creates a session and applies `config` to it.
    pub fn from_config(config: SearchConfig) -> Result<Self, CoreError> {
        let session = Self::new();
        session.configure_with(config)?;
        Ok(session)
    }

    /// Sets root and filters. Fails if the root is missing or not a directory.
    pub fn configure(
        &self,
        root: impl AsRef<Path>,
        extension_filter: &str,
        name_filter: &str,
        case_sensitive: bool,
    ) -> Result<(), CoreError> {
        self.configure_with(SearchConfig::new(
            root.as_ref(),
            SearchFilter::new(extension_filter, name_filter, case_sensitive),
        ))
    }

    /// Applies a complete configuration. Only valid while the session is idle.
    pub fn configure_with(&self, mut config: SearchConfig) -> Result<(), CoreError> {
        // Held until the config is stored so `begin` cannot interleave.
        let status = lock(&self.status);
        if *status != SessionStatus::Idle {
            return Err(CoreError::InvalidState {
                operation: "configure",
                status: *status,
            });
        }

        config.root = validate_root(&config.root)?;
        tracing::info!(
            "Search configured: root {:?}, extension {:?}, name {:?}, case sensitive {}",
            config.root,
            config.filter.extension,
            config.filter.name,
            config.filter.case_sensitive
        );
        *lock(&self.config) = Some(config);
        Ok(())
    }

    pub fn config(&self) -> Option<SearchConfig> {
        lock(&self.config).clone()
    }

    pub fn status(&self) -> SessionStatus {
        *lock(&self.status)
    }

    /// Runs the traversal on the calling thread and returns the terminal status.
    ///
    /// `progress` receives the match count after every hundred matches.
    pub fn start<F>(&self, progress: F) -> Result<SessionStatus, CoreError>
    where
        F: FnMut(usize),
    {
        let config = self.begin()?;
        Ok(self.run(&config, progress))
    }

    /// Runs the traversal on a blocking worker of the current Tokio runtime.
    ///
    /// The transition to `Running` happens before this returns, so a session that
    /// cannot start fails here instead of on the worker. Progress and the single
    /// terminal `Finished` message are delivered on `events`. The channel is
    /// bounded: a worker whose consumer falls behind waits at its next progress
    /// message.
    pub fn launch(
        self: Arc<Self>,
        events: mpsc::Sender<SearchEvent>,
    ) -> Result<JoinHandle<SessionStatus>, CoreError> {
        let config = self.begin()?;

        Ok(tokio::task::spawn_blocking(move || {
            let status = self.run(&config, |count| {
                // A dropped receiver only means nobody is watching any more.
                let _ = events.blocking_send(SearchEvent::Progress(count));
            });
            let _ = events.blocking_send(SearchEvent::Finished {
                status,
                matches: self.result_count(),
            });
            status
        }))
    }

    /// Asks a running traversal to stop at its next entry. Idempotent.
    pub fn request_cancel(&self) {
        if !self.cancel_requested.swap(true, Ordering::AcqRel) {
            tracing::info!("Cancellation requested");
        }
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// The results in display order. Not available while the traversal runs.
    pub fn results(&self) -> Result<Vec<Arc<SelectedEntry>>, CoreError> {
        let status = self.status();
        if status == SessionStatus::Running {
            return Err(CoreError::InvalidState {
                operation: "read results",
                status,
            });
        }
        Ok(lock(&self.results).clone())
    }

    pub fn result_count(&self) -> usize {
        lock(&self.results).len()
    }

    /// `Idle → Running`, atomically, so a session is never started twice.
    fn begin(&self) -> Result<SearchConfig, CoreError> {
        let mut status = lock(&self.status);
        if *status != SessionStatus::Idle {
            return Err(CoreError::InvalidState {
                operation: "start",
                status: *status,
            });
        }
        let config = lock(&self.config).clone().ok_or(CoreError::NotConfigured)?;
        *status = SessionStatus::Running;
        Ok(config)
    }

    fn run<F>(&self, config: &SearchConfig, progress: F) -> SessionStatus
    where
        F: FnMut(usize),
    {
        tracing::info!("Starting search in {:?}", config.root);
        let mut scanner = DirectoryScanner::new(config.filter.clone(), self.provider.clone());
        let outcome = scanner.scan(&config.root, &self.cancel_requested, progress);

        let (status, mut entries) = if outcome.cancelled {
            let kept = if config.keep_partial_results {
                outcome.entries
            } else {
                Vec::new()
            };
            (SessionStatus::Cancelled, kept)
        } else {
            (SessionStatus::Completed, outcome.entries)
        };

        sort_for_display(&mut entries);
        tracing::info!("Search {}: {} files found", status, entries.len());

        // Results are in place before the status leaves `Running`.
        *lock(&self.results) = entries.into_iter().map(Arc::new).collect();
        *lock(&self.status) = status;
        status
    }
}

fn validate_root(root: &Path) -> Result<PathBuf, CoreError> {
    if !root.exists() {
        return Err(CoreError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(CoreError::NotADirectory(root.to_path_buf()));
    }
    std::fs::canonicalize(root).map_err(|e| CoreError::Io(e, root.to_path_buf()))
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::create_files;
    use std::fs;

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        create_files(dir.path(), &["a.txt", "b.csv", "sub/c.jpg"]).unwrap();
        dir
    }

    #[test]
    fn test_new_session_is_idle_and_unconfigured() {
        let session = SearchSession::new();
        assert_eq!(session.status(), SessionStatus::Idle);
        assert!(session.config().is_none());
        assert!(matches!(session.start(|_| {}), Err(CoreError::NotConfigured)));
        assert_eq!(session.status(), SessionStatus::Idle);
    }

    #[test]
    fn test_configure_rejects_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        let session = SearchSession::new();
        let err = session
            .configure(dir.path().join("missing"), "", "", false)
            .unwrap_err();
        assert!(matches!(err, CoreError::RootNotFound(_)));
    }

    #[test]
    fn test_configure_rejects_file_root() {
        let dir = project();
        let session = SearchSession::new();
        let err = session
            .configure(dir.path().join("a.txt"), "", "", false)
            .unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory(_)));
    }

    #[test]
    fn test_start_completes_with_sorted_results() {
        let dir = project();
        let session = SearchSession::new();
        session.configure(dir.path(), "", "", false).unwrap();

        let status = session.start(|_| {}).unwrap();
        assert_eq!(status, SessionStatus::Completed);

        let names: Vec<String> = session.results().unwrap().iter().map(|e| e.file_name()).collect();
        assert_eq!(names, vec!["a.txt", "b.csv", "c.jpg"]);
    }

    #[test]
    fn test_session_cannot_be_started_twice() {
        let dir = project();
        let session = SearchSession::new();
        session.configure(dir.path(), "txt", "", false).unwrap();
        session.start(|_| {}).unwrap();

        let err = session.start(|_| {}).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidState {
                operation: "start",
                status: SessionStatus::Completed
            }
        ));
        let err = session.configure(dir.path(), "", "", false).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { operation: "configure", .. }));
        assert_eq!(session.result_count(), 1);
    }

    #[test]
    fn test_cancel_before_start_discards_everything() {
        let dir = project();
        let session = SearchSession::new();
        session.configure(dir.path(), "", "", false).unwrap();
        session.request_cancel();
        session.request_cancel();

        assert_eq!(session.start(|_| {}).unwrap(), SessionStatus::Cancelled);
        assert!(session.results().unwrap().is_empty());
    }

    #[test]
    fn test_cancelled_session_can_keep_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..150 {
            fs::write(dir.path().join(format!("f{:03}.txt", i)), "x").unwrap();
        }
        let config = SearchConfig::new(dir.path(), SearchFilter::default()).keep_partial_results(true);
        let session = SearchSession::from_config(config).unwrap();

        let status = session.start(|_| session.request_cancel()).unwrap();
        assert_eq!(status, SessionStatus::Cancelled);
        assert_eq!(session.result_count(), 100);
    }
}
