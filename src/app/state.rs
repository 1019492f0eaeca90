//! Defines the central, mutable state of the application.

use crate::config::Settings;
use crate::core::{SearchSession, SelectedEntry, SessionStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Holds the complete, mutable state of the application.
///
/// This struct is wrapped in an `Arc<Mutex<...>>` to allow for safe, shared access
/// from the front end and the task that forwards search events.
pub struct AppState {
    /// The user's settings: last search, recent inputs and report columns.
    pub settings: Settings,
    /// Where settings are persisted. `None` keeps them in memory only.
    pub settings_path: Option<PathBuf>,
    /// Keep the matches found so far when a search is cancelled.
    pub keep_partial_results: bool,
    /// The session of the current or most recent search.
    pub session: Option<Arc<SearchSession>>,
    /// Incremented for every new session; events of older sessions are dropped.
    pub generation: u64,
    /// The task forwarding events of the current session.
    pub search_task: Option<JoinHandle<()>>,
    /// Matches found so far by the running search.
    pub progress: usize,
    /// Results of the last finished search, in display order.
    pub results: Vec<Arc<SelectedEntry>>,
    /// Terminal status of the last finished search.
    pub last_status: Option<SessionStatus>,
}

impl AppState {
    pub fn new(settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self {
            settings,
            settings_path,
            keep_partial_results: false,
            session: None,
            generation: 0,
            search_task: None,
            progress: 0,
            results: Vec::new(),
            last_status: None,
        }
    }

    /// `true` while a session is walking the tree.
    pub fn is_searching(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.status() == SessionStatus::Running)
    }

    /// Requests cancellation of the running search, if any.
    ///
    /// The session finishes on its own as `Cancelled`; its terminal event still
    /// arrives through the forwarding task.
    pub fn cancel_current_search(&mut self) {
        match &self.session {
            Some(session) if session.status() == SessionStatus::Running => {
                tracing::info!("Cancelling the running search.");
                session.request_cancel();
            }
            _ => tracing::debug!("cancel_current_search called, but no search is running."),
        }
    }

    /// Cancels any running search and forgets its session and results.
    pub fn reset_search_state(&mut self) {
        self.cancel_current_search();
        self.generation += 1;
        self.session = None;
        self.search_task = None;
        self.progress = 0;
        self.results.clear();
        self.last_status = None;
    }

    /// Persists the settings if a settings path is configured.
    pub fn save_settings(&self) {
        if let Some(path) = &self.settings_path {
            if let Err(e) = crate::config::settings::save_config(&self.settings, Some(path)) {
                tracing::warn!("Failed to save settings: {}", e);
            }
        }
    }
}

impl Default for AppState {
    /// Creates an `AppState` with settings loaded from the platform config file.
    fn default() -> Self {
        let settings_path = crate::config::settings::get_config_file_path();
        let settings = Settings::load().unwrap_or_default();
        Self::new(settings, settings_path)
    }
}
