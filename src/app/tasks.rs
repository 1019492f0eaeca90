use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use super::events::UserEvent;
use super::helpers::lock_state;
use super::proxy::EventProxy;
use super::state::AppState;

use crate::core::{SearchConfig, SearchEvent, SearchSession};

/// Progress messages a search may queue before its worker waits for the forwarder.
const SEARCH_EVENT_BUFFER: usize = 64;

/// Starts a new search for `config` on a background worker.
///
/// A running search is cancelled first and its late events are ignored. Every call
/// builds a fresh session; sessions are never reused. Must be called from within a
/// Tokio runtime.
pub fn start_search<P: EventProxy>(config: SearchConfig, proxy: P, state: Arc<Mutex<AppState>>) {
    let session = match SearchSession::from_config(config) {
        Ok(session) => Arc::new(session),
        Err(e) => {
            tracing::warn!("Search could not start: {}", e);
            proxy.send_event(UserEvent::ShowError(e.to_string()));
            return;
        }
    };
    let Some(config) = session.config() else {
        proxy.send_event(UserEvent::ShowError("Search is not configured.".to_string()));
        return;
    };

    let mut state_guard = lock_state(&state);
    state_guard.reset_search_state();

    state_guard.settings.record_search(&config.root, &config.filter);
    state_guard.save_settings();

    let (event_tx, event_rx) = mpsc::channel(SEARCH_EVENT_BUFFER);
    if let Err(e) = session.clone().launch(event_tx) {
        tracing::error!("Failed to launch search: {}", e);
        proxy.send_event(UserEvent::ShowError(e.to_string()));
        return;
    }

    let generation = state_guard.generation;
    state_guard.session = Some(session.clone());

    proxy.send_event(UserEvent::SearchStarted {
        root: config.root.clone(),
    });

    tracing::info!("Spawning event forwarder for search #{}.", generation);
    let handle = tokio::spawn(forward_search_events(
        event_rx,
        session,
        generation,
        proxy,
        state.clone(),
    ));
    state_guard.search_task = Some(handle);
}

/// Relays a session's events to the front end and stores its results once it finishes.
async fn forward_search_events<P: EventProxy>(
    mut event_rx: mpsc::Receiver<SearchEvent>,
    session: Arc<SearchSession>,
    generation: u64,
    proxy: P,
    state: Arc<Mutex<AppState>>,
) {
    while let Some(event) = event_rx.recv().await {
        match event {
            SearchEvent::Progress(count) => {
                let mut state_guard = lock_state(&state);
                if state_guard.generation != generation {
                    continue;
                }
                state_guard.progress = count;
                proxy.send_event(UserEvent::SearchProgress(count));
            }
            SearchEvent::Finished { status, matches } => {
                let mut state_guard = lock_state(&state);
                if state_guard.generation != generation {
                    tracing::warn!("Search #{} was superseded. Discarding its results.", generation);
                    return;
                }

                // The session left `Running` before sending this event.
                match session.results() {
                    Ok(results) => state_guard.results = results,
                    Err(e) => {
                        tracing::error!("Could not read results of search #{}: {}", generation, e);
                        state_guard.results.clear();
                    }
                }
                state_guard.last_status = Some(status);
                state_guard.progress = matches;
                state_guard.search_task = None;
                tracing::info!("Search #{} {} with {} results.", generation, status, matches);
                proxy.send_event(UserEvent::SearchFinished { status, matches });
                return;
            }
        }
    }

    tracing::warn!("Search #{} ended without a terminal event.", generation);
}
