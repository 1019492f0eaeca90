//! Contains helper functions to reduce boilerplate code in other `app` modules.

use std::sync::{Arc, Mutex, MutexGuard};

use super::events::UserEvent;
use super::proxy::EventProxy;
use super::state::AppState;

/// Locks the `AppState`, recovering the guard if a previous holder panicked.
pub fn lock_state(state: &Arc<Mutex<AppState>>) -> MutexGuard<'_, AppState> {
    state.lock().unwrap_or_else(|poisoned| {
        tracing::warn!("AppState mutex was poisoned; continuing with the inner state.");
        poisoned.into_inner()
    })
}

/// Runs `update_fn` on the state unless a search is running, in which case the
/// user is told to wait.
///
/// Results and counters may only be touched while no traversal owns them.
pub fn with_idle_state<F, R, P: EventProxy>(
    state: &Arc<Mutex<AppState>>,
    proxy: &P,
    update_fn: F,
) -> Option<R>
where
    F: FnOnce(&mut AppState) -> R,
{
    let mut state_guard = lock_state(state);
    if state_guard.is_searching() {
        proxy.send_event(UserEvent::ShowError(
            "A search is still running. Wait for it to finish or stop it first.".to_string(),
        ));
        return None;
    }
    Some(update_fn(&mut state_guard))
}
