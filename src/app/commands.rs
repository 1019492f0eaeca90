//! Contains the command handlers a front end calls in response to user actions.
//!
//! These handlers are responsible for interacting with the `AppState` and the `core`
//! logic, and for sending `UserEvent`s back to the front end.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::events::UserEvent;
use super::helpers::{lock_state, with_idle_state};
use super::proxy::EventProxy;
use super::state::AppState;
use super::tasks;
use crate::core::{FileSink, ReportColumn, ReportFormatter, ReportSink, SearchFilter};

/// Updates the filters of the next search.
pub fn update_filters(state: &Arc<Mutex<AppState>>, filter: SearchFilter) {
    let mut state_guard = lock_state(state);
    state_guard.settings.filter_extension = filter.extension;
    state_guard.settings.filter_filename = filter.name;
    state_guard.settings.filename_case_sensitive = filter.case_sensitive;
}

/// Sets the root directory of the next search.
pub fn select_directory(state: &Arc<Mutex<AppState>>, root: PathBuf) {
    lock_state(state).settings.root_directory = root;
}

/// Starts a search with the root and filters currently held in the settings.
pub fn start_search<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    let config = {
        let state_guard = lock_state(&state);
        state_guard
            .settings
            .search_config()
            .keep_partial_results(state_guard.keep_partial_results)
    };
    tasks::start_search(config, proxy, state);
}

/// Stops the running search. Its results are discarded.
pub fn cancel_search(state: &Arc<Mutex<AppState>>) {
    lock_state(state).cancel_current_search();
}

/// Replaces the report column list and persists it.
pub fn set_report_columns(state: &Arc<Mutex<AppState>>, columns: Vec<ReportColumn>) {
    let mut state_guard = lock_state(state);
    state_guard.settings.report_columns = columns;
    state_guard.settings.cleanup();
    state_guard.save_settings();
}

/// Formats the last results with the configured columns.
///
/// Returns `None` and notifies the front end if a search is still running.
pub fn build_report<P: EventProxy>(proxy: &P, state: &Arc<Mutex<AppState>>) -> Option<String> {
    with_idle_state(state, proxy, |s| {
        ReportFormatter::format(&s.results, &s.settings.report_columns)
    })
}

/// Builds the report and hands it to the front end for the clipboard.
pub fn copy_report<P: EventProxy>(proxy: P, state: Arc<Mutex<AppState>>) {
    if let Some(report) = build_report(&proxy, &state) {
        tracing::info!("Report with {} lines ready for the clipboard.", report.lines().count());
        proxy.send_event(UserEvent::ReportReady(report));
    }
}

/// Builds the report and writes it to `path`.
pub fn save_report<P: EventProxy>(path: PathBuf, proxy: P, state: Arc<Mutex<AppState>>) {
    let Some(report) = build_report(&proxy, &state) else {
        return;
    };

    let mut sink = FileSink::new(path.clone());
    match sink.deliver(&report) {
        Ok(()) => proxy.send_event(UserEvent::SaveComplete(true, path.display().to_string())),
        Err(e) => {
            tracing::error!("Failed to save report: {:#}", e);
            proxy.send_event(UserEvent::SaveComplete(false, path.display().to_string()));
        }
    }
}
