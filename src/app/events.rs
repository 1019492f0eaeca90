//! Defines the events sent from the search backend to whatever front end drives it.

use std::path::PathBuf;

use crate::core::SessionStatus;

/// Events sent from the backend to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserEvent {
    /// A new session began walking `root`.
    SearchStarted { root: PathBuf },
    /// Number of matches found so far by the running search.
    SearchProgress(usize),
    /// The running search reached a terminal state. Results are readable from now on.
    SearchFinished {
        status: SessionStatus,
        matches: usize,
    },
    /// An error message to be displayed to the user.
    ShowError(String),
    /// A formatted report, ready for the clipboard.
    ReportReady(String),
    /// The result of saving a report to a file.
    SaveComplete(bool, String),
}
